//! Engine binary for the agent society.
//!
//! Wires storage, the inference gateway, the event hub, the scheduler,
//! and the observer server together, then runs until `Ctrl-C` or an
//! operator stop.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `society-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Select the repository (`PostgreSQL` or in-memory) and seed it
//! 4. Build the inference gateway and prompt templates
//! 5. Create the hub, mind registry, operator state, and tick clock
//! 6. Start the Observer API server
//! 7. Run the scheduler
//! 8. Shut down the observer and log the result

mod error;
mod seed;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use society_core::{
    ConversationContext, Hub, InMemoryRepository, LogFormat, LoggingConfig, MindRegistry,
    OperatorState, Repository, Scheduler, SocietyConfig, TickClock,
};
use society_db::{PgRepository, PostgresPool};
use society_observer::AppState;
use society_runner::{InferenceGateway, PromptEngine};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

const CONFIG_PATH: &str = "society-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config().context("failed to load configuration")?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("society-engine starting");
    info!(
        tick_interval_ms = config.world.tick_interval_ms,
        turns_per_conversation = config.world.turns_per_conversation,
        participation = ?config.world.participation,
        backend = ?config.llm.backend,
        model = config.llm.model,
        max_concurrent_calls = config.llm.max_concurrent_calls,
        "Configuration loaded"
    );

    // 3. Repository.
    let repository = open_repository(&config).await?;
    let seeded = seed::seed_if_empty(repository.as_ref()).await?;
    info!(seeded, "Repository ready");

    // 4. Gateway and prompts.
    let gateway = Arc::new(InferenceGateway::new(&config.llm).map_err(EngineError::from)?);
    let prompts = Arc::new(load_prompts(&config).map_err(EngineError::from)?);
    info!(
        backend = gateway.backend_name(),
        max_concurrent = gateway.max_concurrent(),
        "Inference gateway initialized"
    );

    // 5. Shared components.
    let hub = Arc::new(Hub::new(config.hub.subscriber_capacity));
    let minds = Arc::new(MindRegistry::new(
        Arc::clone(&gateway),
        Arc::clone(&prompts),
        Arc::clone(&hub),
        config.brain,
        config.affect.clone(),
    ));
    let operator = Arc::new(OperatorState::new(config.world.tick_interval_ms));
    let clock = Arc::new(TickClock::new());

    // 6. Observer API server.
    let cancel = CancellationToken::new();
    let observer_shutdown = CancellationToken::new();
    let app_state = AppState::new(Arc::clone(&hub), Arc::clone(&repository), Arc::clone(&clock))
        .with_operator(Arc::clone(&operator))
        .with_minds(Arc::clone(&minds));
    let (observer_addr, observer_handle) = society_observer::spawn_observer(
        config.infrastructure.observer_port,
        Arc::new(app_state),
        observer_shutdown.clone(),
    )
    .await
    .map_err(EngineError::from)?;
    info!(%observer_addr, "Observer API server started");

    // 7. Scheduler.
    let scheduler = Scheduler::new(
        ConversationContext {
            hub,
            repository,
            minds,
            prompts,
        },
        Arc::clone(&operator),
        Arc::clone(&clock),
        &config.world,
    );

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, cancelling running conversations");
                ctrl_c.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    scheduler.run(cancel).await;

    // 8. Shut down.
    observer_shutdown.cancel();
    if let Err(e) = observer_handle.await {
        warn!(error = %e, "Observer task ended abnormally");
    }

    info!(
        ticks = clock.current(),
        elapsed_seconds = operator.elapsed_seconds(),
        "society-engine shutdown complete"
    );
    Ok(())
}

/// Load `society-config.yaml` relative to the working directory.
///
/// A missing file means defaults, with environment overrides still
/// applied.
fn load_config() -> Result<SocietyConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        return Ok(SocietyConfig::from_file(path)?);
    }
    let mut config = SocietyConfig::default();
    config.apply_overrides_from(|name| std::env::var(name).ok())?;
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Plain => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// `PostgreSQL` when a database URL is configured, otherwise the
/// in-memory demo store.
async fn open_repository(config: &SocietyConfig) -> Result<Arc<dyn Repository>, EngineError> {
    let Some(url) = config.infrastructure.database_url.as_deref() else {
        info!("No database configured, using in-memory repository");
        return Ok(Arc::new(InMemoryRepository::new()));
    };

    let pool = PostgresPool::connect_url(url).await?;
    pool.run_migrations().await?;
    info!("PostgreSQL connected and migrated");
    Ok(Arc::new(PgRepository::new(pool)))
}

fn load_prompts(config: &SocietyConfig) -> Result<PromptEngine, society_runner::GatewayError> {
    match config.prompts.template_dir.as_deref() {
        Some(dir) => {
            info!(template_dir = dir, "Loading prompt templates");
            PromptEngine::from_dir(dir)
        }
        None => PromptEngine::new(),
    }
}
