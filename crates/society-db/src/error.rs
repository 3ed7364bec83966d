//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors and the document decoding errors from
//! `society-types`.

use society_core::RepositoryError;
use society_types::RecordError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored agent document could not be encoded or decoded.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for RepositoryError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Record(inner) => Self::Record(inner),
            other => Self::Storage(other.to_string()),
        }
    }
}
