//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of engine startup so `main`
//! can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: society_core::ConfigError,
    },

    /// The inference gateway or prompt templates could not be built.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying gateway error.
        #[from]
        source: society_runner::GatewayError,
    },

    /// Database connection or migration failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: society_db::DbError,
    },

    /// Seeding or reading agents failed.
    #[error("repository error: {source}")]
    Repository {
        /// The underlying repository error.
        #[from]
        source: society_core::RepositoryError,
    },

    /// A seed agent record could not be encoded.
    #[error("record error: {source}")]
    Record {
        /// The underlying record error.
        #[from]
        source: society_types::RecordError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: society_observer::StartupError,
    },
}
