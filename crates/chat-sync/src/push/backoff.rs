//! Reconnect backoff policy for the push channel.

use std::time::Duration;

/// Linear backoff: the n-th retry waits `base_delay * n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay unit multiplied by the retry number.
    pub base_delay: Duration,
    /// Retries allowed after the initial attempt before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, duration: Duration) -> Self {
        self.base_delay = duration;
        self
    }

    /// Decide what follows a lost connection when `attempt` retries have
    /// already been made since the last successful open.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        let next = attempt + 1;
        RetryDecision::Retry {
            attempt: next,
            delay: self.delay_for(next),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp,
}
