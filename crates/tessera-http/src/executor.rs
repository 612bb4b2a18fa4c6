//! Retrying request executor
//!
//! Wraps a single logical HTTP call in retry orchestration. Responses are
//! classified into: transport error (retry, default backoff), HTTP 429
//! (retry, throttling backoff), HTTP 5xx (retry, default backoff), and
//! everything else (return immediately). After the retry budget is
//! exhausted the last failed response or transport error is returned
//! unmasked. Cancellation short-circuits the loop at every point.
//!
//! The async and blocking paths share the classification and budget logic;
//! only the call and wait primitives differ.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tessera_core::{Error, Result};

use crate::backoff::{BackoffStrategy, DefaultBackoffStrategy, ThrottlingBackoffStrategy};
use crate::message::{HttpRequest, HttpResponse};
use crate::transport::HttpTransport;

/// Configuration for the request executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of retries after the initial attempt (default: 4).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Cap applied to both backoff strategies, in milliseconds (default: 20000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Base delay of the default strategy, in milliseconds (default: 600).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Base delay of the throttling strategy, in milliseconds (default: 1000).
    #[serde(default = "default_throttling_base_ms")]
    pub throttling_base_ms: u64,
}

fn default_max_retries() -> u32 {
    4
}

fn default_max_delay_ms() -> u64 {
    DefaultBackoffStrategy::DEFAULT_MAX_MS
}

fn default_base_delay_ms() -> u64 {
    DefaultBackoffStrategy::DEFAULT_BASE_MS
}

fn default_throttling_base_ms() -> u64 {
    ThrottlingBackoffStrategy::DEFAULT_BASE_MS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_delay_ms: default_max_delay_ms(),
            base_delay_ms: default_base_delay_ms(),
            throttling_base_ms: default_throttling_base_ms(),
        }
    }
}

impl ExecutorConfig {
    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff cap.
    #[must_use]
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }
}

/// Which strategy a retryable outcome uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryClass {
    /// Transport error or HTTP 5xx.
    Default,
    /// HTTP 429.
    Throttling,
}

/// Classification of one attempt's outcome.
enum Step {
    /// Terminal: return this outcome to the caller.
    Done(Result<HttpResponse>),
    /// Retryable: the outcome to return if the budget is exhausted.
    Retry(RetryClass, Result<HttpResponse>),
}

fn classify(outcome: Result<HttpResponse>) -> Step {
    match outcome {
        Err(Error::Cancelled) => Step::Done(Err(Error::Cancelled)),
        Err(error @ Error::Transport { .. }) => Step::Retry(RetryClass::Default, Err(error)),
        Err(error) => Step::Done(Err(error)),
        Ok(response) if response.is_throttled() => {
            Step::Retry(RetryClass::Throttling, Ok(response))
        }
        Ok(response) if response.is_server_error() => {
            Step::Retry(RetryClass::Default, Ok(response))
        }
        Ok(response) => Step::Done(Ok(response)),
    }
}

/// Retry wrapper around a single logical HTTP call.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    default_backoff: DefaultBackoffStrategy,
    throttling_backoff: ThrottlingBackoffStrategy,
    max_retries: u32,
}

impl RequestExecutor {
    /// Create an executor over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ExecutorConfig) -> Self {
        Self {
            transport,
            default_backoff: DefaultBackoffStrategy::with_base(
                config.base_delay_ms,
                config.max_delay_ms,
            ),
            throttling_backoff: ThrottlingBackoffStrategy::with_base(
                config.throttling_base_ms,
                config.max_delay_ms,
            ),
            max_retries: config.max_retries,
        }
    }

    fn delay_for(&self, class: RetryClass, attempt: u32) -> Duration {
        match class {
            RetryClass::Default => self.default_backoff.delay(attempt),
            RetryClass::Throttling => self.throttling_backoff.delay(attempt),
        }
    }

    /// Execute with retries, suspending between attempts.
    ///
    /// An already-cancelled token prevents any transport call from being
    /// issued; cancellation during a backoff wait or the in-flight call
    /// surfaces as [`Error::Cancelled`] without further retries.
    pub async fn execute(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        if !self.transport.supports_async() {
            return Err(Error::unsupported(
                "the configured transport has no async execution path",
            ));
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut attempt: u32 = 0;
        loop {
            let outcome = self.transport.execute(request, cancel).await;
            match classify(outcome) {
                Step::Done(outcome) => {
                    if attempt > 0 && outcome.is_ok() {
                        debug!(
                            uri = %request.uri,
                            attempts = attempt + 1,
                            "request succeeded after retries"
                        );
                    }
                    return outcome;
                }
                Step::Retry(class, last) => {
                    if attempt >= self.max_retries {
                        warn!(
                            uri = %request.uri,
                            attempts = attempt + 1,
                            "retry budget exhausted"
                        );
                        return last;
                    }
                    attempt += 1;
                    let delay = self.delay_for(class, attempt);
                    debug!(
                        uri = %request.uri,
                        attempt,
                        class = ?class,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after transient failure"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Execute with retries, blocking the calling thread between attempts.
    ///
    /// Requires a transport advertising a blocking path; the policy
    /// (classification, budget, delays) is identical to [`execute`].
    ///
    /// [`execute`]: RequestExecutor::execute
    pub fn execute_blocking(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if !self.transport.supports_blocking() {
            return Err(Error::unsupported(
                "the configured transport has no blocking execution path",
            ));
        }

        let mut attempt: u32 = 0;
        loop {
            let outcome = self.transport.execute_blocking(request);
            match classify(outcome) {
                Step::Done(outcome) => return outcome,
                Step::Retry(class, last) => {
                    if attempt >= self.max_retries {
                        warn!(
                            uri = %request.uri,
                            attempts = attempt + 1,
                            "retry budget exhausted"
                        );
                        return last;
                    }
                    attempt += 1;
                    let delay = self.delay_for(class, attempt);
                    debug!(
                        uri = %request.uri,
                        attempt,
                        class = ?class,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after transient failure"
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }
}
