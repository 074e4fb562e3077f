// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain Transfer - Transaction Submission and Confirmation Core
//!
//! Submits single native-asset transfers on Solana and EVM networks: checks
//! the fee and balance preconditions, signs locally, submits exactly once and
//! polls for a terminal status.
//!
//! ## Modules
//!
//! - `blockchain` - Chain adapters (Solana JSON-RPC, EVM via alloy), network presets, keys
//! - `transfer` - Precondition checks, executor and confirmation poller
//! - `report` - Result reporters (tracing, JSON lines)
//! - `config` - Environment-driven configuration
//! - `logging` - Tracing subscriber setup

pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod transfer;

pub use blockchain::ChainAdapter;
pub use error::TransferError;
pub use models::{Account, AccountId, Status, TransferHandle, TransferRequest};
