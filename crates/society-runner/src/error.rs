//! Error types for the inference gateway and the cognitive cycle.
//!
//! Cancellation and timeout get their own variants so callers can tell
//! "the scheduler gave up" apart from "the backend failed".

/// Errors that can occur while producing a reply.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response (connection refused,
    /// reset, DNS failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body could not be parsed.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The backend returned an empty reply.
    #[error("backend returned an empty reply")]
    EmptyResponse,

    /// The call exceeded the configured request timeout.
    #[error("inference call timed out after {after_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        after_ms: u64,
    },

    /// The caller cancelled the call.
    #[error("inference call cancelled")]
    Cancelled,

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// A prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),
}

impl GatewayError {
    /// Whether the call may succeed if simply tried again.
    ///
    /// Only transport failures and server-side (5xx) statuses qualify.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the error is a caller-initiated cancellation.
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
