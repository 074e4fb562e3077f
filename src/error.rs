// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for transfer submission and confirmation.
//!
//! Every core operation either succeeds or returns exactly one of these
//! kinds. Nothing here triggers a resubmission: the caller decides whether
//! and how to retry.

/// Errors produced by chain adapters, the executor and the poller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The account identifier or transaction handle is malformed for the network.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The request was rejected locally before contacting the network.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    /// The estimated fee is above the request's max-fee bound.
    #[error("Estimated fee {fee} exceeds limit {limit}")]
    FeeLimitExceeded { fee: u128, limit: u128 },

    /// Transport-level failure. Safe for the caller to retry.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The network answered and refused the transaction.
    #[error("Rejected by network: {reason}")]
    RejectedByNetwork { reason: String },

    /// Submission may or may not have landed.
    #[error("Submission outcome unknown: {reason}")]
    AmbiguousOutcome { reason: String },

    /// Confirmation was not observed within the polling budget. Produced from
    /// a `Status::TimedOut` poll outcome when it is reported.
    #[error("Timed out waiting for confirmation")]
    TimedOut,

    /// Polling was cancelled before a terminal status.
    #[error("Cancelled")]
    Cancelled,
}

impl TransferError {
    /// Whether the same call may simply be issued again.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::NetworkError(_))
    }

    /// Whether the caller must look the transaction up before resubmitting.
    pub fn requires_reconciliation(&self) -> bool {
        matches!(self, Self::AmbiguousOutcome { .. } | Self::TimedOut)
    }

    /// Short machine-readable kind, used in reports and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::FeeLimitExceeded { .. } => "fee_limit_exceeded",
            Self::NetworkError(_) => "network_error",
            Self::RejectedByNetwork { .. } => "rejected_by_network",
            Self::AmbiguousOutcome { .. } => "ambiguous_outcome",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}
