//! Bounded polling loops shared by every wait in the processor.

use std::future::Future;
use std::time::Duration;

use crate::config::PollConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// How a poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polled {
    pub satisfied: bool,
    pub attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            config.max_attempts,
        )
    }

    /// Upper bound on time spent suspended.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// Runs up to `max_attempts` rounds of `act`, a suspension of `interval`,
    /// then `check`, stopping at the first round whose check holds.
    ///
    /// Errors from `act` or `check` end the poll immediately.
    pub async fn run<A, AF, C, CF, E>(&self, mut act: A, mut check: C) -> Result<Polled, E>
    where
        A: FnMut(u32) -> AF,
        AF: Future<Output = Result<(), E>>,
        C: FnMut(u32) -> CF,
        CF: Future<Output = Result<bool, E>>,
    {
        for attempt in 1..=self.max_attempts {
            act(attempt).await?;
            tokio::time::sleep(self.interval).await;
            if check(attempt).await? {
                return Ok(Polled {
                    satisfied: true,
                    attempts: attempt,
                });
            }
        }

        Ok(Polled {
            satisfied: false,
            attempts: self.max_attempts,
        })
    }

    /// Checks up to `max_attempts` times with `interval` between checks,
    /// stopping at the first check that holds. The first check is immediate.
    pub async fn until<C, CF, E>(&self, mut check: C) -> Result<Polled, E>
    where
        C: FnMut(u32) -> CF,
        CF: Future<Output = Result<bool, E>>,
    {
        for attempt in 1..=self.max_attempts {
            if check(attempt).await? {
                return Ok(Polled {
                    satisfied: true,
                    attempts: attempt,
                });
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(Polled {
            satisfied: false,
            attempts: self.max_attempts,
        })
    }
}
