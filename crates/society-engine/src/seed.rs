//! Starter population for an empty repository.
//!
//! Two agents with contrasting temperaments, so the first conversation
//! has something to work with.

use society_core::Repository;
use society_types::{AgentRecord, Goal, Personality, RecordError};
use tracing::info;

use crate::error::EngineError;

/// The demo pair: a curious extravert and a cautious introvert.
pub fn demo_agents() -> Result<Vec<AgentRecord>, RecordError> {
    let ada = AgentRecord::new(
        "Ada",
        &Personality::new(0.8, 0.6, 0.7, 0.7, 0.3)
            .with_core_values(["curiosity", "kindness"])
            .with_quirks(["asks a follow-up question to everything"]),
    )?
    .with_goals(&[
        Goal::new("make a new friend", 0.8),
        Goal::new("learn something surprising", 0.5),
    ])?;

    let bo = AgentRecord::new(
        "Bo",
        &Personality::new(0.2, 0.8, 0.3, 0.5, 0.6)
            .with_core_values(["reliability", "privacy"])
            .with_quirks(["mentions the weather when nervous"]),
    )?
    .with_goals(&[Goal::new("keep the garden tidy", 0.7)])?;

    Ok(vec![ada, bo])
}

/// Insert the demo pair if the repository holds no agents at all.
///
/// Returns the number of agents created.
pub async fn seed_if_empty(repository: &dyn Repository) -> Result<usize, EngineError> {
    let existing = repository.list_agents().await?;
    if !existing.is_empty() {
        info!(agents = existing.len(), "Repository already populated, skipping seed");
        return Ok(0);
    }

    let agents = demo_agents()?;
    for agent in &agents {
        repository.create_agent(agent).await?;
        info!(agent_id = %agent.id, name = agent.name, "Seed agent created");
    }
    Ok(agents.len())
}
