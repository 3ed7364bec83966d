//! REST API endpoint handlers for the Observer server.
//!
//! Agent reads and writes go straight to the shared repository; message
//! injection goes to the hub, where the scheduler picks it up on the
//! agent's next turn.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/agents` | List agents (`?page=&limit=&active=`) |
//! | `POST` | `/api/agents` | Spawn an agent |
//! | `GET` | `/api/agents/{id}` | Get a single agent with its stats |
//! | `DELETE` | `/api/agents/{id}` | Deactivate an agent |
//! | `POST` | `/api/agents/{id}/inject` | Queue a message for an agent |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use rand::Rng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use society_core::{AgentFilter, DEFAULT_PAGE_LIMIT};
use society_types::{AgentId, AgentRecord, Goal, MoodSnapshot, Personality, RecordError};
use tracing::info;
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

/// Priority given to goals supplied at spawn time.
const SPAWN_GOAL_PRIORITY: f64 = 0.5;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/agents/{id}/inject`.
#[derive(Debug, Deserialize)]
pub struct InjectRequest {
    /// Message to show the agent on its next turn.
    #[serde(default)]
    pub content: String,
}

/// Query string for `GET /api/agents`.
#[derive(Debug, Default, Deserialize)]
pub struct ListAgentsQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Agents per page.
    pub limit: Option<u32>,
    /// Only active (`true`) or inactive (`false`) agents.
    pub active: Option<bool>,
}

impl From<ListAgentsQuery> for AgentFilter {
    fn from(query: ListAgentsQuery) -> Self {
        Self {
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            active: query.active,
        }
        .normalized()
    }
}

/// Pagination metadata returned with an agent listing.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Page returned.
    pub page: u32,
    /// Page size used.
    pub limit: u32,
    /// Agents matching the filter across all pages.
    pub total: u64,
}

/// Per-agent activity figures.
#[derive(Debug, Serialize)]
pub struct AgentStats {
    /// Turns the agent spoke or was addressed in.
    pub total_interactions: u64,
    /// Whole days since the agent was created.
    pub days_since_creation: i64,
}

/// Request body for `POST /api/agents`.
#[derive(Debug, Deserialize)]
pub struct SpawnAgentRequest {
    /// Display name.
    pub name: String,
    /// Personality. Traits are drawn uniformly from `[0, 1]` when absent.
    pub personality: Option<Personality>,
    /// Goal descriptions.
    #[serde(default)]
    pub goals: Vec<String>,
}

/// An agent with its documents decoded, as returned by the API.
#[derive(Debug, Serialize)]
pub struct AgentView {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Decoded personality.
    pub personality: Personality,
    /// Last saved mood, or neutral.
    pub mood: MoodSnapshot,
    /// Assigned goals.
    pub goals: Vec<Goal>,
    /// Whether the agent is still scheduled.
    pub active: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Activity figures; only on single-agent responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<AgentStats>,
}

impl TryFrom<&AgentRecord> for AgentView {
    type Error = RecordError;

    fn try_from(record: &AgentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            personality: record.personality()?,
            mood: record.mood()?,
            goals: record.goals()?,
            active: record.active,
            created_at: record.created_at.to_rfc3339(),
            stats: None,
        })
    }
}

/// Whole days between `created_at` and `now`, never negative.
pub fn days_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(created_at).num_days().max(0)
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing live counters and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tick = state.clock.current();
    let observers = state.hub.subscriber_count();
    let active = state.repository.count_active_agents().await.unwrap_or(0);
    let paused = state.operator.as_ref().is_some_and(|op| op.is_paused());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Agent Society Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ margin: 0.4rem 0; }}
    </style>
</head>
<body>
    <h1>Agent Society</h1>
    <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
    <div class="metric"><div class="label">Active agents</div><div class="value">{active}</div></div>
    <div class="metric"><div class="label">Observers</div><div class="value">{observers}</div></div>
    <div class="metric"><div class="label">Paused</div><div class="value">{paused}</div></div>
    <h2>API</h2>
    <ul>
        <li><code>GET</code> <a href="/api/agents">/api/agents</a></li>
        <li><code>GET</code> <a href="/api/operator/status">/api/operator/status</a></li>
        <li><code>WS</code> /ws/events</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// List one page of agents, oldest first.
///
/// Defaults to page 1 of 20. Out-of-range `page` and `limit` values are
/// clamped rather than rejected.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAgentsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let filter = AgentFilter::from(query);
    let page = state.repository.list_agents_page(&filter).await?;
    let agents = page
        .agents
        .iter()
        .map(AgentView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(serde_json::json!({
        "count": agents.len(),
        "agents": agents,
        "pagination": PaginationMeta {
            page: filter.page,
            limit: filter.limit,
            total: page.total,
        },
    })))
}

/// Get a single agent by id.
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let agent_id = parse_agent_id(&id_str)?;
    let record = state
        .repository
        .get_agent(agent_id)
        .await?
        .ok_or_else(|| ObserverError::NotFound(format!("agent {agent_id}")))?;

    let mut view = AgentView::try_from(&record)?;
    view.stats = Some(AgentStats {
        total_interactions: state.repository.count_turns_for_agent(agent_id).await?,
        days_since_creation: days_since(record.created_at, Utc::now()),
    });
    Ok(Json(view))
}

/// Create a new active agent.
pub async fn spawn_agent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpawnAgentRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ObserverError::BadRequest("name must not be empty".to_owned()));
    }

    let personality = body
        .personality
        .map_or_else(random_personality, Personality::clamped);
    let goals: Vec<Goal> = body
        .goals
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(|g| Goal::new(g, SPAWN_GOAL_PRIORITY))
        .collect();

    let record = AgentRecord::new(name, &personality)?.with_goals(&goals)?;
    state.repository.create_agent(&record).await?;

    info!(agent_id = %record.id, name, "agent spawned");
    Ok((StatusCode::CREATED, Json(AgentView::try_from(&record)?)))
}

/// Deactivate an agent so it is no longer scheduled.
///
/// Messages still queued for the agent are discarded along with its mind.
pub async fn deactivate_agent(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let agent_id = parse_agent_id(&id_str)?;
    if !state.repository.deactivate_agent(agent_id).await? {
        return Err(ObserverError::NotFound(format!("agent {agent_id}")));
    }
    if let Some(minds) = &state.minds {
        minds.forget(agent_id);
    }
    let discarded = state.hub.drain_injections(agent_id).len();

    info!(%agent_id, discarded, "agent deactivated");
    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Agent {agent_id} deactivated"),
    })))
}

/// Queue a human message for an agent's next turn.
///
/// Blank content is rejected before the agent is looked up. Unknown and
/// inactive agents both answer 404, since an inactive agent never speaks
/// again and the message would never be delivered.
pub async fn inject(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<InjectRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let agent_id = parse_agent_id(&id_str)?;
    let content = body.content.trim();
    if content.is_empty() {
        return Err(ObserverError::BadRequest("content must not be empty".to_owned()));
    }

    let known = state
        .repository
        .get_agent(agent_id)
        .await?
        .is_some_and(|a| a.active);
    if !known {
        return Err(ObserverError::NotFound(format!("agent {agent_id}")));
    }

    state.hub.inject(agent_id, content)?;

    info!(%agent_id, len = content.len(), "message injected");
    Ok(Json(serde_json::json!({
        "ok": true,
        "pending": state.hub.pending_injections(agent_id),
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID string into an [`AgentId`].
fn parse_agent_id(s: &str) -> Result<AgentId, ObserverError> {
    Uuid::parse_str(s)
        .map(AgentId::from)
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}

fn random_personality() -> Personality {
    let mut rng = rand::rng();
    Personality::new(
        rng.random_range(0.0..=1.0),
        rng.random_range(0.0..=1.0),
        rng.random_range(0.0..=1.0),
        rng.random_range(0.0..=1.0),
        rng.random_range(0.0..=1.0),
    )
}
