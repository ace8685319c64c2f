//! Bounded waiting for host dependencies (the canvas element) at mount time.

use crate::api::error::{Result, SimError};

/// How often and how many times to look for a dependency before giving up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub interval_ms: u32,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_attempts: 50,
        }
    }
}

/// What the caller should do after a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Sleep this long, then check again.
    RetryAfter(u32),
}

/// Attempt counter for one wait.
#[derive(Debug, Clone)]
pub struct Retry {
    policy: RetryPolicy,
    attempts: u32,
}

impl Retry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Record one check. Fails with `DependencyTimeout` once the budget is spent.
    pub fn check(&mut self, ready: bool) -> Result<Readiness> {
        self.attempts += 1;
        if ready {
            return Ok(Readiness::Ready);
        }
        if self.attempts >= self.policy.max_attempts {
            log::error!("gave up waiting after {} attempts", self.attempts);
            return Err(SimError::DependencyTimeout { attempts: self.attempts });
        }
        Ok(Readiness::RetryAfter(self.policy.interval_ms))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
