//! Storage boundary used by the scheduler and the observer.
//!
//! [`Repository`] is object-safe (futures are boxed via `async_trait`) so
//! the engine can pick an implementation at startup and hand out
//! `Arc<dyn Repository>`. [`InMemoryRepository`] backs tests and the
//! database-less demo mode; the `PostgreSQL` implementation lives in
//! `society-db`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use society_types::{AgentId, AgentRecord, ConversationTurn, MoodSnapshot, RecordError, encode_document};

/// Errors returned by a [`Repository`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// No agent exists with the given id.
    #[error("agent not found")]
    NotFound,

    /// A stored document could not be encoded or decoded.
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a listing honors.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Pagination and activity filter for agent listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentFilter {
    /// 1-based page number.
    pub page: u32,
    /// Agents per page.
    pub limit: u32,
    /// Only agents whose active flag equals this, when set.
    pub active: Option<bool>,
}

impl Default for AgentFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            active: None,
        }
    }
}

impl AgentFilter {
    /// Clamp the page to at least 1 and the limit to `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
            active: self.active,
        }
    }

    /// Agents skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.limit))
    }

    /// Whether `record` passes the activity filter.
    pub fn matches(&self, record: &AgentRecord) -> bool {
        self.active.is_none_or(|active| record.active == active)
    }
}

/// One page of agents, oldest first.
#[derive(Debug, Clone, Default)]
pub struct AgentPage {
    /// Agents on this page.
    pub agents: Vec<AgentRecord>,
    /// Agents matching the filter across all pages.
    pub total: u64,
}

/// Agent and conversation persistence.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Up to `n` distinct active agents chosen uniformly at random.
    async fn random_active_agents(&self, n: usize) -> Result<Vec<AgentRecord>, RepositoryError>;

    /// Persist one conversation turn.
    async fn save_conversation_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError>;

    /// Look up an agent by id, active or not.
    async fn get_agent(&self, id: AgentId) -> Result<Option<AgentRecord>, RepositoryError>;

    /// Every agent, oldest first.
    async fn list_agents(&self) -> Result<Vec<AgentRecord>, RepositoryError>;

    /// One page of agents matching `filter`, oldest first.
    async fn list_agents_page(&self, filter: &AgentFilter) -> Result<AgentPage, RepositoryError>;

    /// Agents still taking part in conversations.
    async fn count_active_agents(&self) -> Result<u64, RepositoryError>;

    /// Turns the agent spoke or was addressed in.
    async fn count_turns_for_agent(&self, id: AgentId) -> Result<u64, RepositoryError>;

    /// Every persisted turn.
    async fn count_turns(&self) -> Result<u64, RepositoryError>;

    /// Store a new agent.
    async fn create_agent(&self, record: &AgentRecord) -> Result<(), RepositoryError>;

    /// Mark an agent inactive. Returns `false` if no such agent exists.
    async fn deactivate_agent(&self, id: AgentId) -> Result<bool, RepositoryError>;

    /// Replace an agent's stored mood.
    async fn save_mood(&self, id: AgentId, mood: &MoodSnapshot) -> Result<(), RepositoryError>;
}

#[derive(Debug, Default)]
struct Store {
    agents: Vec<AgentRecord>,
    turns: Vec<ConversationTurn>,
}

/// Process-local repository.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    fail_saves: AtomicBool,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `agents`.
    pub fn with_agents(agents: impl IntoIterator<Item = AgentRecord>) -> Self {
        let repo = Self::default();
        repo.lock().agents.extend(agents);
        repo
    }

    /// Make every subsequent turn save fail, to exercise best-effort paths.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Release);
    }

    /// Every saved turn, in save order.
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.lock().turns.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sample_active(&self, n: usize) -> Vec<AgentRecord> {
        let store = self.lock();
        let active: Vec<&AgentRecord> = store.agents.iter().filter(|a| a.active).collect();
        active
            .choose_multiple(&mut rand::rng(), n)
            .map(|a| (*a).clone())
            .collect()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn random_active_agents(&self, n: usize) -> Result<Vec<AgentRecord>, RepositoryError> {
        Ok(self.sample_active(n))
    }

    async fn save_conversation_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
        if self.fail_saves.load(Ordering::Acquire) {
            return Err(RepositoryError::Storage("turn storage unavailable".to_owned()));
        }
        self.lock().turns.push(turn.clone());
        Ok(())
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
        Ok(self.lock().agents.iter().find(|a| a.id == id).cloned())
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, RepositoryError> {
        Ok(self.lock().agents.clone())
    }

    async fn list_agents_page(&self, filter: &AgentFilter) -> Result<AgentPage, RepositoryError> {
        let filter = filter.normalized();
        let store = self.lock();
        let matching: Vec<&AgentRecord> =
            store.agents.iter().filter(|a| filter.matches(a)).collect();
        let agents = matching
            .iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .map(|a| (*a).clone())
            .collect();
        Ok(AgentPage {
            agents,
            total: count(matching.len()),
        })
    }

    async fn count_active_agents(&self) -> Result<u64, RepositoryError> {
        Ok(count(self.lock().agents.iter().filter(|a| a.active).count()))
    }

    async fn count_turns_for_agent(&self, id: AgentId) -> Result<u64, RepositoryError> {
        let store = self.lock();
        Ok(count(
            store
                .turns
                .iter()
                .filter(|t| t.speaker_id == id || t.target_id == id)
                .count(),
        ))
    }

    async fn count_turns(&self) -> Result<u64, RepositoryError> {
        Ok(count(self.lock().turns.len()))
    }

    async fn create_agent(&self, record: &AgentRecord) -> Result<(), RepositoryError> {
        let mut store = self.lock();
        if store.agents.iter().any(|a| a.id == record.id) {
            return Err(RepositoryError::Storage(format!(
                "agent {} already exists",
                record.id
            )));
        }
        store.agents.push(record.clone());
        Ok(())
    }

    async fn deactivate_agent(&self, id: AgentId) -> Result<bool, RepositoryError> {
        let mut store = self.lock();
        let Some(agent) = store.agents.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        agent.active = false;
        Ok(true)
    }

    async fn save_mood(&self, id: AgentId, mood: &MoodSnapshot) -> Result<(), RepositoryError> {
        let document = encode_document("mood", mood)?;
        let mut store = self.lock();
        let agent = store
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        agent.mood = Some(document);
        Ok(())
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use society_types::{MoodLabel, Personality};

    use super::*;

    fn agent(name: &str) -> AgentRecord {
        match AgentRecord::new(name, &Personality::default()) {
            Ok(record) => record,
            Err(e) => panic!("record encoding failed: {e}"),
        }
    }

    #[tokio::test]
    async fn random_agents_are_distinct_and_active() {
        let a = agent("Ada");
        let b = agent("Bo");
        let mut c = agent("Cy");
        c.active = false;
        let repo = InMemoryRepository::with_agents([a, b, c.clone()]);

        for _ in 0..20 {
            let picked = repo.random_active_agents(2).await.unwrap_or_default();
            assert_eq!(picked.len(), 2);
            let ids: HashSet<AgentId> = picked.iter().map(|r| r.id).collect();
            assert_eq!(ids.len(), 2);
            assert!(!ids.contains(&c.id));
        }
    }

    #[tokio::test]
    async fn random_agents_returns_fewer_when_population_small() {
        let repo = InMemoryRepository::with_agents([agent("Ada")]);
        let picked = repo.random_active_agents(2).await.unwrap_or_default();
        assert_eq!(picked.len(), 1);
    }

    #[tokio::test]
    async fn turn_saves_can_be_made_to_fail() {
        let repo = InMemoryRepository::new();
        let turn = ConversationTurn::new(AgentId::new(), AgentId::new(), "hi", 1);
        assert!(repo.save_conversation_turn(&turn).await.is_ok());
        repo.set_fail_saves(true);
        assert!(matches!(
            repo.save_conversation_turn(&turn).await,
            Err(RepositoryError::Storage(_))
        ));
        assert_eq!(repo.turns().len(), 1);
    }

    #[tokio::test]
    async fn deactivate_and_save_mood() {
        let ada = agent("Ada");
        let id = ada.id;
        let repo = InMemoryRepository::with_agents([ada]);

        let mut mood = MoodSnapshot::neutral();
        mood.label = MoodLabel::Happy;
        assert!(repo.save_mood(id, &mood).await.is_ok());
        let stored = repo.get_agent(id).await.ok().flatten();
        assert_eq!(stored.and_then(|r| r.mood().ok()).map(|m| m.label), Some(MoodLabel::Happy));

        assert!(matches!(repo.deactivate_agent(id).await, Ok(true)));
        assert!(matches!(repo.deactivate_agent(AgentId::new()).await, Ok(false)));
        assert!(repo.random_active_agents(2).await.unwrap_or_default().is_empty());

        assert!(matches!(
            repo.save_mood(AgentId::new(), &mood).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let repo = InMemoryRepository::new();
        let ada = agent("Ada");
        assert!(repo.create_agent(&ada).await.is_ok());
        assert!(repo.create_agent(&ada).await.is_err());
        assert_eq!(repo.list_agents().await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn pages_respect_filter_and_limit() {
        let mut agents: Vec<AgentRecord> = ["Ada", "Bo", "Cy", "Di", "Ed"]
            .into_iter()
            .map(agent)
            .collect();
        if let Some(last) = agents.last_mut() {
            last.active = false;
        }
        let repo = InMemoryRepository::with_agents(agents);

        let first = AgentFilter {
            page: 1,
            limit: 2,
            active: None,
        };
        let page = repo.list_agents_page(&first).await.unwrap_or_default();
        assert_eq!(page.total, 5);
        let names: Vec<&str> = page.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Ada", "Bo"]);

        let third = AgentFilter { page: 3, ..first };
        let page = repo.list_agents_page(&third).await.unwrap_or_default();
        let names: Vec<&str> = page.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Ed"]);

        let inactive = AgentFilter {
            active: Some(false),
            ..AgentFilter::default()
        };
        let page = repo.list_agents_page(&inactive).await.unwrap_or_default();
        assert_eq!(page.total, 1);
        assert!(page.agents.iter().all(|a| !a.active));

        let beyond = AgentFilter { page: 9, ..first };
        let page = repo.list_agents_page(&beyond).await.unwrap_or_default();
        assert!(page.agents.is_empty());
        assert_eq!(page.total, 5);

        assert!(matches!(repo.count_active_agents().await, Ok(4)));
    }

    #[test]
    fn filter_normalizes_out_of_range_values() {
        let filter = AgentFilter {
            page: 0,
            limit: 10_000,
            active: None,
        }
        .normalized();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_LIMIT);
        assert_eq!(filter.offset(), 0);

        let zero = AgentFilter {
            limit: 0,
            ..AgentFilter::default()
        };
        assert_eq!(zero.normalized().limit, 1);
    }

    #[tokio::test]
    async fn turn_counts_include_both_sides() {
        let ada = agent("Ada");
        let bo = agent("Bo");
        let cy = agent("Cy");
        let repo = InMemoryRepository::with_agents([ada.clone(), bo.clone(), cy.clone()]);

        for turn in [
            ConversationTurn::new(ada.id, bo.id, "hi", 1),
            ConversationTurn::new(bo.id, ada.id, "hello", 1),
            ConversationTurn::new(bo.id, cy.id, "hey", 2),
        ] {
            assert!(repo.save_conversation_turn(&turn).await.is_ok());
        }

        assert!(matches!(repo.count_turns_for_agent(ada.id).await, Ok(2)));
        assert!(matches!(repo.count_turns_for_agent(bo.id).await, Ok(3)));
        assert!(matches!(repo.count_turns_for_agent(cy.id).await, Ok(1)));
        assert!(matches!(repo.count_turns_for_agent(AgentId::new()).await, Ok(0)));
        assert!(matches!(repo.count_turns().await, Ok(3)));
    }
}
