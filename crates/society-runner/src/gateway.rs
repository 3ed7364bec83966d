//! Bounded-concurrency gateway to the inference backend.
//!
//! Every call goes through three guards, in order:
//!
//! 1. **Admission** -- a [`Semaphore`] caps the number of in-flight calls.
//!    Waiting for a permit is itself cancellable.
//! 2. **Timeout** -- each attempt is bounded by the configured request
//!    timeout.
//! 3. **Cancellation** -- each attempt races the caller's
//!    [`CancellationToken`]. Losing the race drops the HTTP future, which
//!    aborts the request.
//!
//! Retryable failures (transport errors, 5xx) are retried with a fixed
//! backoff up to `max_retries` extra attempts. The permit is held across
//! retries so a retrying caller does not jump the queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::llm::{BackendReply, ChatCall, CompletionRequest, CompletionResponse, LlmBackend, create_backend};

/// Shared entry point for all inference calls.
///
/// Safe to share behind an [`Arc`](std::sync::Arc) across tasks.
pub struct InferenceGateway {
    backend: LlmBackend,
    permits: Semaphore,
    max_concurrent: usize,
    in_flight: AtomicUsize,
    request_timeout: Duration,
    default_temperature: f64,
    default_max_tokens: u32,
    max_retries: u32,
    retry_backoff: Duration,
}

/// Decrements the in-flight counter when dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl InferenceGateway {
    /// Build a gateway from configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self::with_backend(create_backend(config), config))
    }

    /// Build a gateway around an explicit backend.
    pub fn with_backend(backend: LlmBackend, config: &GatewayConfig) -> Self {
        let max_concurrent = config.max_concurrent_calls.max(1);
        Self {
            backend,
            permits: Semaphore::new(max_concurrent),
            max_concurrent,
            in_flight: AtomicUsize::new(0),
            request_timeout: config.request_timeout(),
            default_temperature: config.default_temperature,
            default_max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        }
    }

    /// Produce one reply.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Cancelled`] if `cancel` fires at any point
    /// - [`GatewayError::Timeout`] if an attempt exceeds the request timeout
    /// - [`GatewayError::EmptyResponse`] if the reply is blank
    /// - transport, status, or parse errors from the backend
    pub async fn complete(
        &self,
        cancel: &CancellationToken,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, GatewayError> {
        let _permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(GatewayError::Cancelled),
            permit = self.permits.acquire() => permit
                .map_err(|e| GatewayError::Config(format!("admission semaphore closed: {e}")))?,
        };
        let _in_flight = InFlight::enter(&self.in_flight);

        let call = ChatCall {
            system: &request.system_prompt,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.default_temperature),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
        };

        let mut attempt: u32 = 0;
        loop {
            let started = Instant::now();
            let result = self.attempt(cancel, &call).await;

            match result {
                Ok(reply) => {
                    let duration = started.elapsed();
                    if reply.content.trim().is_empty() {
                        return Err(GatewayError::EmptyResponse);
                    }
                    debug!(
                        backend = self.backend.name(),
                        model = %reply.model,
                        elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                        attempt,
                        "inference call completed"
                    );
                    return Ok(CompletionResponse {
                        content: reply.content,
                        model: reply.model,
                        duration,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt = attempt.saturating_add(1);
                    warn!(
                        backend = self.backend.name(),
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        "inference call failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(GatewayError::Cancelled),
                        () = tokio::time::sleep(self.retry_backoff) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt, raced against cancellation and the timeout.
    async fn attempt(
        &self,
        cancel: &CancellationToken,
        call: &ChatCall<'_>,
    ) -> Result<BackendReply, GatewayError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GatewayError::Cancelled),
            outcome = tokio::time::timeout(self.request_timeout, self.backend.complete(call)) => {
                outcome.unwrap_or_else(|_| {
                    Err(GatewayError::Timeout {
                        after_ms: u64::try_from(self.request_timeout.as_millis())
                            .unwrap_or(u64::MAX),
                    })
                })
            }
        }
    }

    /// Calls currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Permits not currently held.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Size of the admission semaphore.
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Name of the configured backend.
    pub const fn backend_name(&self) -> &str {
        self.backend.name()
    }
}
