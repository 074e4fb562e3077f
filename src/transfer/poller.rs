// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Confirmation Poller
//!
//! Bounded-retry polling of a submitted transfer until the network reports a
//! terminal status.
//!
//! ## Strategy
//!
//! Each attempt is one `get_status` call. A terminal answer (Confirmed or
//! Failed) ends polling immediately. When `max_attempts` answers have all been
//! Pending the poller returns [`Status::TimedOut`], which means "unknown, keep
//! watching" and never "failed".
//!
//! The whole poll is bounded by [`PollerConfig::wait_budget`], measured from
//! the first attempt. Attempts run on ticks fixed relative to that start, so a
//! slow status call delays the next attempt without pushing back the rest of
//! the schedule. A call still in flight at the deadline is abandoned and the
//! poll ends as TimedOut.
//!
//! A transport failure while querying consumes an attempt and is counted in
//! [`PollOutcome::query_failures`]. Any other query error aborts polling.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Cancellation is observed before
//! each attempt, while a status call is in flight, and during the delay
//! between attempts, and yields [`Status::Cancelled`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blockchain::ChainAdapter;
use crate::error::TransferError;
use crate::models::{Status, TransferHandle};

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default delay between attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    #[default]
    Fixed,
    /// Doubles after every attempt, capped by the total wait budget.
    Exponential,
}

impl FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!("unknown backoff '{other}' (expected fixed or exponential)")),
        }
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fixed => "fixed",
            Self::Exponential => "exponential",
        })
    }
}

/// Attempt budget and pacing for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    max_attempts: u32,
    poll_interval: Duration,
    backoff: Backoff,
}

impl PollerConfig {
    pub fn new(
        max_attempts: u32,
        poll_interval: Duration,
        backoff: Backoff,
    ) -> Result<Self, TransferError> {
        if max_attempts == 0 {
            return Err(TransferError::InvalidRequest(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if poll_interval.is_zero() {
            return Err(TransferError::InvalidRequest(
                "poll_interval must be positive".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            poll_interval,
            backoff,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Upper bound on the wall-clock time of one poll.
    pub fn wait_budget(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_attempts)
    }

    /// Scheduled sleep across all attempts; the last tick lands at least one
    /// interval before the deadline.
    fn sleep_budget(&self) -> Duration {
        self.poll_interval
            .saturating_mul(self.max_attempts.saturating_sub(1))
    }

    /// Delay after the 1-based `attempt`, given `slept` so far.
    fn delay_after(&self, attempt: u32, slept: Duration) -> Duration {
        let delay = match self.backoff {
            Backoff::Fixed => self.poll_interval,
            Backoff::Exponential => self
                .poll_interval
                .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1))),
        };
        delay.min(self.sleep_budget().saturating_sub(slept))
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            backoff: Backoff::Fixed,
        }
    }
}

/// Final state of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Confirmed, Failed, TimedOut or Cancelled.
    pub status: Status,
    /// Status queries started.
    pub attempts: u32,
    /// Attempts whose query failed at the transport level.
    pub query_failures: u32,
}

impl PollOutcome {
    /// Error equivalent of a non-final outcome, for callers that report
    /// through [`TransferError`].
    pub fn error(&self) -> Option<TransferError> {
        match self.status {
            Status::TimedOut => Some(TransferError::TimedOut),
            Status::Cancelled => Some(TransferError::Cancelled),
            _ => None,
        }
    }
}

/// Polls a chain adapter until a transfer reaches a terminal status.
pub struct ConfirmationPoller {
    config: PollerConfig,
}

impl ConfirmationPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll `handle` until terminal, out of attempts, or cancelled.
    pub async fn poll<A: ChainAdapter + ?Sized>(
        &self,
        adapter: &A,
        handle: &TransferHandle,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, TransferError> {
        let max_attempts = self.config.max_attempts;
        let network = adapter.network().slug;
        let start = Instant::now();
        let deadline = start + self.config.wait_budget();
        let mut next_attempt = start;
        let mut slept = Duration::ZERO;
        let mut query_failures = 0;

        debug!(
            tx_hash = %handle,
            network,
            max_attempts,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            backoff = %self.config.backoff,
            "Confirmation poller starting"
        );

        let cancelled = |attempts: u32, query_failures: u32| -> Result<PollOutcome, TransferError> {
            info!(tx_hash = %handle, attempts, "Confirmation polling cancelled");
            Ok(PollOutcome {
                status: Status::Cancelled,
                attempts,
                query_failures,
            })
        };

        let timed_out = |attempts: u32, query_failures: u32| -> Result<PollOutcome, TransferError> {
            warn!(
                tx_hash = %handle,
                network,
                attempts,
                query_failures,
                "No terminal status within wait budget; outcome still unknown"
            );
            Ok(PollOutcome {
                status: Status::TimedOut,
                attempts,
                query_failures,
            })
        };

        for attempt in 1..=max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(attempt - 1, query_failures),
                _ = sleep_until(next_attempt) => {},
            }
            if Instant::now() >= deadline {
                return timed_out(attempt - 1, query_failures);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(attempt, query_failures),
                result = timeout_at(deadline, adapter.get_status(handle)) => result,
            };

            let Ok(result) = result else {
                debug!(tx_hash = %handle, attempt, "Status query still in flight at deadline");
                return timed_out(attempt, query_failures);
            };

            match result {
                Ok(status) if status.is_terminal() => {
                    info!(
                        tx_hash = %handle,
                        network,
                        attempt,
                        status = status.as_str(),
                        "Transfer reached terminal status"
                    );
                    return Ok(PollOutcome {
                        status,
                        attempts: attempt,
                        query_failures,
                    });
                }
                Ok(_) => {
                    debug!(tx_hash = %handle, attempt, max_attempts, "Transfer still pending");
                }
                Err(TransferError::NetworkError(reason)) => {
                    query_failures += 1;
                    warn!(
                        tx_hash = %handle,
                        attempt,
                        max_attempts,
                        error = %reason,
                        "Status query failed"
                    );
                }
                Err(e) => {
                    warn!(tx_hash = %handle, attempt, error = %e, "Status query aborted polling");
                    return Err(e);
                }
            }

            if attempt == max_attempts {
                break;
            }

            let delay = self.config.delay_after(attempt, slept);
            slept += delay;
            next_attempt = start + slept;
        }

        timed_out(max_attempts, query_failures)
    }

    /// Poll on a background task; the outcome arrives on the returned receiver.
    ///
    /// ```rust,ignore
    /// let outcome = poller.spawn(adapter, handle, shutdown.clone()).await?;
    /// ```
    pub fn spawn(
        self,
        adapter: Arc<dyn ChainAdapter>,
        handle: TransferHandle,
        cancel: CancellationToken,
    ) -> oneshot::Receiver<Result<PollOutcome, TransferError>> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = self.poll(adapter.as_ref(), &handle, &cancel).await;
            // Receiver may have been dropped; nothing left to notify.
            let _ = tx.send(outcome);
        });
        rx
    }
}
