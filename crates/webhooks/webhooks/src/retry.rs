//! Retry strategies and the retry coordinator.

use std::sync::Arc;
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::delivery::DeliveryOutcome;
use crate::envelope::DeliveryEnvelope;
use crate::error::WebhookResult;
use crate::executor::{DeliveryError, DeliveryExecutor};
use crate::signature::WebhookSigner;

/// Trait for retry strategies.
pub trait RetryStrategy: Send + Sync {
    /// Returns the delay after failed attempt `attempt` (1-based), or None
    /// if no further attempt should be made.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Returns the maximum number of attempts.
    fn max_attempts(&self) -> u32;

    /// Checks if another retry should be attempted.
    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }
}

/// Retry strategy driven by an explicit delay schedule.
///
/// The delay after attempt `n` is `delays[n - 1]`. When more attempts are
/// configured than the schedule has entries, the last entry repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelaySchedule {
    /// Delays between attempts.
    pub delays: Vec<Duration>,
    /// Maximum number of attempts.
    pub max_attempts: u32,
}

impl DelaySchedule {
    /// Creates a new schedule.
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            max_attempts: 3,
        }
    }

    /// Sets the maximum attempts. Zero is treated as one.
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    /// Builds the schedule described by a delivery configuration.
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self::new(config.retry_delays_ms.iter().map(|ms| Duration::from_millis(*ms)))
            .max_attempts(config.max_attempts)
    }
}

impl Default for DelaySchedule {
    fn default() -> Self {
        Self::from_config(&WebhookConfig::default())
    }
}

impl RetryStrategy for DelaySchedule {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }

        let idx = (attempt.saturating_sub(1) as usize).min(self.delays.len().saturating_sub(1));
        Some(self.delays.get(idx).copied().unwrap_or(Duration::ZERO))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// No retry strategy - a single attempt.
#[derive(Debug, Clone, Default)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn max_attempts(&self) -> u32 {
        1
    }
}

/// States of one logical delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to make attempt `n`.
    Attempting(u32),
    /// Attempt `attempts` got a 2xx response.
    Succeeded { attempts: u32, status_code: u16 },
    /// Every allowed attempt failed.
    ExhaustedFailed { attempts: u32, error: DeliveryError },
}

/// Runs the attempts of one logical delivery.
#[derive(Clone)]
pub struct RetryCoordinator {
    executor: Arc<dyn DeliveryExecutor>,
    strategy: Arc<dyn RetryStrategy>,
    attempt_timeout: Duration,
}

impl RetryCoordinator {
    /// Creates a new coordinator.
    pub fn new(
        executor: Arc<dyn DeliveryExecutor>,
        strategy: impl RetryStrategy + 'static,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            executor,
            strategy: Arc::new(strategy),
            attempt_timeout,
        }
    }

    /// Creates a coordinator following a delivery configuration.
    pub fn from_config(executor: Arc<dyn DeliveryExecutor>, config: &WebhookConfig) -> Self {
        Self::new(executor, DelaySchedule::from_config(config), config.attempt_timeout())
    }

    /// Returns a coordinator sharing this executor that makes a single attempt.
    pub fn single_attempt(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            strategy: Arc::new(NoRetry),
            attempt_timeout: self.attempt_timeout,
        }
    }

    /// Delivers an envelope, retrying failed attempts per the strategy.
    ///
    /// Attempt failures end up in the returned outcome. Only an unusable
    /// secret is returned as an error, before any request is made.
    pub async fn deliver_with_retry(
        &self,
        url: &str,
        envelope: &DeliveryEnvelope,
        secret: &str,
    ) -> WebhookResult<DeliveryOutcome> {
        let signed = WebhookSigner::new(secret)?.sign_envelope(envelope)?;

        let mut state = RetryState::Attempting(1);
        loop {
            state = match state {
                RetryState::Attempting(n) => {
                    match self.executor.attempt(url, &signed, self.attempt_timeout).await {
                        Ok(response) => RetryState::Succeeded {
                            attempts: n,
                            status_code: response.status_code,
                        },
                        Err(error) => match self.strategy.next_delay(n) {
                            Some(delay) => {
                                tracing::warn!(
                                    delivery_id = %envelope.delivery_id,
                                    event = %envelope.event,
                                    attempt = n,
                                    retry_in_ms = delay.as_millis() as u64,
                                    error = %error,
                                    "Webhook attempt failed, retrying"
                                );
                                tokio::time::sleep(delay).await;
                                RetryState::Attempting(n + 1)
                            }
                            None => RetryState::ExhaustedFailed { attempts: n, error },
                        },
                    }
                }
                RetryState::Succeeded {
                    attempts,
                    status_code,
                } => {
                    tracing::info!(
                        delivery_id = %envelope.delivery_id,
                        event = %envelope.event,
                        attempts,
                        status_code,
                        "Webhook delivered"
                    );
                    return Ok(DeliveryOutcome::success(&envelope.delivery_id, status_code, attempts));
                }
                RetryState::ExhaustedFailed { attempts, error } => {
                    tracing::error!(
                        delivery_id = %envelope.delivery_id,
                        event = %envelope.event,
                        attempts,
                        error = %error,
                        "Webhook delivery failed after all attempts"
                    );
                    return Ok(DeliveryOutcome::failure(&envelope.delivery_id, &error, attempts));
                }
            };
        }
    }
}
