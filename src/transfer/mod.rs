// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer submission and confirmation.
//!
//! - [`precondition`]: balance and fee checks before signing
//! - [`executor`]: check, sign and submit exactly once
//! - [`poller`]: bounded polling to a terminal status

pub mod executor;
pub mod poller;
pub mod precondition;

#[cfg(test)]
pub(crate) mod mock;

pub use executor::{execute, TransferExecutor};
pub use poller::{Backoff, ConfirmationPoller, PollOutcome, PollerConfig};
