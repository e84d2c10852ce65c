use async_trait::async_trait;
use std::time::Duration;

use crate::config::RetryConfig;
use super::error::TranslationError;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    RetryAfter(Duration),
    GiveUp,
}

/// Bounded exponential backoff for upstream calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            backoff_multiplier: 2,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_multiplier: config.backoff_multiplier.max(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based) before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.backoff_multiplier.saturating_pow(exponent);
        self.initial_delay.saturating_mul(factor)
    }

    /// Decide whether failed attempt `attempt` (1-based) is followed by another.
    pub fn next_action(&self, attempt: u32, error: &TranslationError) -> RetryAction {
        if error.is_retryable() && attempt < self.max_attempts {
            RetryAction::RetryAfter(self.delay_after(attempt))
        } else {
            RetryAction::GiveUp
        }
    }
}

/// Source of waiting, so backoff and pacing can be tested without a clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
