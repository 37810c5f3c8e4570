//! Reconnect policy and the connection state machine.
//!
//! The machine is pure: the client task reports what happened
//! (connected, failed, dropped, polled) and reads back the status to
//! decide what to do next.
//!
//! ```text
//! Idle ─► Connecting ─► Connected
//!            ▲  │            │ drop
//!            │  │ fail       ▼
//!            │  └──────► Reconnecting{attempt, delay}
//!            │                 │ attempts exhausted
//!            │                 ▼
//!            └──(every N polls)── PollingFallback
//!
//! any ─► Closed
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential backoff between stream connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplier per attempt.
    pub factor: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based): `initial * factor^(attempt-1)`,
    /// capped at `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.max(1).checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(multiplier)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Connection status, published to observers of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Not started.
    Idle,
    /// Opening the push stream.
    Connecting {
        /// Consecutive attempt number, 1-based.
        attempt: u32,
    },
    /// Push stream open.
    Connected,
    /// Waiting before the next stream attempt.
    Reconnecting {
        /// Attempt that will follow the delay.
        attempt: u32,
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Stream given up for now; fetching snapshots over REST.
    PollingFallback {
        /// Polls since entering the fallback.
        polls: u32,
    },
    /// Disconnected for good.
    Closed,
}

impl ConnectionStatus {
    /// Whether live push data is flowing.
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Pure reconnect state machine.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    policy: BackoffPolicy,
    max_stream_attempts: u32,
    stream_retry_polls: u32,
    status: ConnectionStatus,
    failures: u32,
}

impl ConnectionMachine {
    /// Create an idle machine.
    ///
    /// After `max_stream_attempts` consecutive failed attempts the machine
    /// falls back to polling; every `stream_retry_polls` polls it tries the
    /// stream again.
    pub fn new(policy: BackoffPolicy, max_stream_attempts: u32, stream_retry_polls: u32) -> Self {
        Self {
            policy,
            max_stream_attempts: max_stream_attempts.max(1),
            stream_retry_polls: stream_retry_polls.max(1),
            status: ConnectionStatus::Idle,
            failures: 0,
        }
    }

    /// Current status.
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// `Idle` → `Connecting`.
    pub fn start(&mut self) {
        if self.status == ConnectionStatus::Idle {
            self.status = ConnectionStatus::Connecting { attempt: 1 };
        }
    }

    /// The stream opened.
    pub fn on_connected(&mut self) {
        if matches!(self.status, ConnectionStatus::Connecting { .. }) {
            self.failures = 0;
            self.status = ConnectionStatus::Connected;
        }
    }

    /// A connection attempt failed.
    pub fn on_failure(&mut self) {
        if !matches!(self.status, ConnectionStatus::Connecting { .. }) {
            return;
        }
        self.failures = self.failures.saturating_add(1);
        self.status = if self.failures >= self.max_stream_attempts {
            ConnectionStatus::PollingFallback { polls: 0 }
        } else {
            self.reconnecting()
        };
    }

    /// An open stream dropped.
    pub fn on_disconnected(&mut self) {
        if self.status == ConnectionStatus::Connected {
            self.failures = 0;
            self.status = self.reconnecting();
        }
    }

    /// The reconnect delay elapsed.
    pub fn on_delay_elapsed(&mut self) {
        if let ConnectionStatus::Reconnecting { attempt, .. } = self.status {
            self.status = ConnectionStatus::Connecting { attempt };
        }
    }

    /// A fallback poll completed. Every `stream_retry_polls` polls the
    /// stream gets one more attempt; failing it returns to polling.
    pub fn on_poll(&mut self) {
        if let ConnectionStatus::PollingFallback { polls } = self.status {
            let polls = polls.saturating_add(1);
            if polls >= self.stream_retry_polls {
                self.failures = self.max_stream_attempts.saturating_sub(1);
                self.status = ConnectionStatus::Connecting {
                    attempt: self.failures.saturating_add(1),
                };
            } else {
                self.status = ConnectionStatus::PollingFallback { polls };
            }
        }
    }

    /// Any state → `Closed`.
    pub fn close(&mut self) {
        self.status = ConnectionStatus::Closed;
    }

    fn reconnecting(&self) -> ConnectionStatus {
        let attempt = self.failures.saturating_add(1);
        let delay = self.policy.delay(self.failures.max(1));
        ConnectionStatus::Reconnecting {
            attempt,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(1000),
            factor: 2,
        }
    }

    #[test]
    fn delay_grows_and_caps() {
        let p = policy();
        assert_eq!(p.delay(1), Duration::from_millis(100));
        assert_eq!(p.delay(2), Duration::from_millis(200));
        assert_eq!(p.delay(4), Duration::from_millis(800));
        assert_eq!(p.delay(5), Duration::from_millis(1000));
        assert_eq!(p.delay(60), Duration::from_millis(1000));
    }

    #[test]
    fn failures_back_off_then_fall_back_to_polling() {
        let mut machine = ConnectionMachine::new(policy(), 3, 2);
        machine.start();
        assert_eq!(machine.status(), ConnectionStatus::Connecting { attempt: 1 });

        machine.on_failure();
        assert_eq!(
            machine.status(),
            ConnectionStatus::Reconnecting {
                attempt: 2,
                delay_ms: 100
            }
        );
        machine.on_delay_elapsed();
        machine.on_failure();
        assert_eq!(
            machine.status(),
            ConnectionStatus::Reconnecting {
                attempt: 3,
                delay_ms: 200
            }
        );
        machine.on_delay_elapsed();
        machine.on_failure();
        assert_eq!(machine.status(), ConnectionStatus::PollingFallback { polls: 0 });
    }

    #[test]
    fn polling_retries_the_stream_periodically() {
        let mut machine = ConnectionMachine::new(policy(), 1, 2);
        machine.start();
        machine.on_failure();
        machine.on_poll();
        assert_eq!(machine.status(), ConnectionStatus::PollingFallback { polls: 1 });
        machine.on_poll();
        assert!(matches!(machine.status(), ConnectionStatus::Connecting { .. }));
        machine.on_failure();
        assert_eq!(machine.status(), ConnectionStatus::PollingFallback { polls: 0 });
    }

    #[test]
    fn drop_after_connect_reconnects_with_fresh_budget() {
        let mut machine = ConnectionMachine::new(policy(), 3, 2);
        machine.start();
        machine.on_failure();
        machine.on_delay_elapsed();
        machine.on_connected();
        assert!(machine.status().is_live());
        machine.on_disconnected();
        assert_eq!(
            machine.status(),
            ConnectionStatus::Reconnecting {
                attempt: 1,
                delay_ms: 100
            }
        );
    }

    #[test]
    fn close_wins_everywhere() {
        let mut machine = ConnectionMachine::new(policy(), 3, 2);
        machine.start();
        machine.close();
        machine.on_connected();
        assert_eq!(machine.status(), ConnectionStatus::Closed);
    }
}
