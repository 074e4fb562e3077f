// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transfer Data Model
//!
//! Types shared by the chain adapters, the executor and the poller.
//!
//! All amounts are integer base units (lamports, wei) held in `u128`.
//! Floating point never appears on the transfer path.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Accounts
// =============================================================================

/// Network-encoded account identifier (base58 public key, 0x address).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        AccountId(value)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        AccountId(value.to_string())
    }
}

/// Raw private key material.
///
/// Never printed: `Debug` is redacted and there is no `Display` or `Serialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED; {}])", self.0.len())
    }
}

/// An account the core may spend from: public identifier plus credential.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub secret: SecretKey,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, secret: SecretKey) -> Self {
        Self {
            id: id.into(),
            secret,
        }
    }
}

// =============================================================================
// Transfer Request
// =============================================================================

/// A single native-asset transfer. Immutable once built.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    request_id: Uuid,
    sender: Account,
    receiver: AccountId,
    amount: u128,
    max_fee: Option<u128>,
}

impl TransferRequest {
    pub fn new(sender: Account, receiver: impl Into<AccountId>, amount: u128) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            sender,
            receiver: receiver.into(),
            amount,
            max_fee: None,
        }
    }

    /// Reject submission when the estimated fee is above `max_fee`.
    pub fn with_max_fee(mut self, max_fee: u128) -> Self {
        self.max_fee = Some(max_fee);
        self
    }

    /// Correlation id for logs and reports.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn sender(&self) -> &Account {
        &self.sender
    }

    pub fn receiver(&self) -> &AccountId {
        &self.receiver
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    pub fn max_fee(&self) -> Option<u128> {
        self.max_fee
    }
}

// =============================================================================
// Fees and Anchors
// =============================================================================

/// Fee quote for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Total fee in base units.
    pub fee: u128,
    /// Per-unit price the fee was derived from (gas price on EVM), if any.
    /// Signing must use this exact price.
    pub unit_price: Option<u128>,
    pub fetched_at: Instant,
}

impl FeeEstimate {
    /// Fixed-cost quote with no unit price.
    pub fn flat(fee: u128) -> Self {
        Self {
            fee,
            unit_price: None,
            fetched_at: Instant::now(),
        }
    }

    pub fn priced(fee: u128, unit_price: u128) -> Self {
        Self {
            fee,
            unit_price: Some(unit_price),
            fetched_at: Instant::now(),
        }
    }
}

/// Short-lived value a transaction must embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// Recent block hash; the transaction expires after `last_valid_block_height`.
    Blockhash {
        hash: String,
        last_valid_block_height: u64,
    },
    /// Next account sequence number.
    Nonce(u64),
}

// =============================================================================
// Submission Handle and Status
// =============================================================================

/// Identifier the network returned for a submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TransferHandle(pub String);

impl TransferHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confirmation status of a submitted transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Status {
    Pending,
    Confirmed,
    Failed(String),
    /// The polling budget ran out. The transaction may still confirm.
    TimedOut,
    /// Polling was stopped by the caller.
    Cancelled,
}

impl Status {
    /// Confirmed and Failed never change once observed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Confirmed | Status::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Confirmed => "confirmed",
            Status::Failed(_) => "failed",
            Status::TimedOut => "timed_out",
            Status::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_key_debug_is_redacted() {
        let secret = SecretKey::from_bytes(vec![7u8; 32]);
        let account = Account::new("sender", secret);
        let rendered = format!("{account:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("7, 7"));
    }

    #[test]
    fn only_confirmed_and_failed_are_terminal() {
        assert!(Status::Confirmed.is_terminal());
        assert!(Status::Failed("reverted".into()).is_terminal());
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::TimedOut.is_terminal());
        assert!(!Status::Cancelled.is_terminal());
    }

    #[test]
    fn status_serializes_with_reason() {
        let json = serde_json::to_string(&Status::Failed("reverted".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"reverted"}"#);

        let json = serde_json::to_string(&Status::TimedOut).unwrap();
        assert_eq!(json, r#"{"status":"timed_out"}"#);
    }

    #[test]
    fn request_ids_are_unique() {
        let sender = Account::new("a", SecretKey::from_bytes(vec![1; 32]));
        let first = TransferRequest::new(sender.clone(), "b", 10);
        let second = TransferRequest::new(sender, "b", 10).with_max_fee(5);
        assert_ne!(first.request_id(), second.request_id());
        assert_eq!(first.max_fee(), None);
        assert_eq!(second.max_fee(), Some(5));
    }
}
