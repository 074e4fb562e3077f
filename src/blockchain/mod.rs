// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration.
//!
//! This module provides:
//! - The [`ChainAdapter`] capability set shared by every network
//! - One adapter per chain family ([`EvmAdapter`], [`SolanaAdapter`])
//! - Network presets, amount helpers and key material handling

use async_trait::async_trait;

use crate::error::TransferError;
use crate::models::{AccountId, Anchor, FeeEstimate, Status, TransferHandle, TransferRequest};

pub mod evm;
pub mod rpc;
pub mod signing;
pub mod solana;
pub mod types;

pub use evm::EvmAdapter;
pub use solana::SolanaAdapter;
pub use types::*;

/// Operations the transfer core needs from a network.
///
/// Every call is a single remote round trip; none of them retries or blocks
/// waiting for confirmation.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Network this adapter talks to.
    fn network(&self) -> &NetworkConfig;

    /// Balance of `account` in base units.
    async fn get_balance(&self, account: &AccountId) -> Result<u128, TransferError>;

    /// Fee the network will charge for `request`.
    async fn estimate_fee(&self, request: &TransferRequest) -> Result<FeeEstimate, TransferError>;

    /// Fresh anchor for a transaction sent by `sender`.
    async fn get_recent_anchor(&self, sender: &AccountId) -> Result<Anchor, TransferError>;

    /// Build and sign `request` locally. No network access.
    fn sign_transfer(
        &self,
        request: &TransferRequest,
        fee: &FeeEstimate,
        anchor: &Anchor,
    ) -> Result<Vec<u8>, TransferError>;

    /// Broadcast signed bytes once.
    ///
    /// Returns `RejectedByNetwork` when the node answers with an error and
    /// `NetworkError` when no answer was received.
    async fn submit(&self, signed_transaction: &[u8]) -> Result<TransferHandle, TransferError>;

    /// Point-in-time status of a submitted transaction.
    async fn get_status(&self, handle: &TransferHandle) -> Result<Status, TransferError>;
}

/// Build the adapter for `network`'s chain family, talking to `rpc_url`.
pub fn connect(
    network: NetworkConfig,
    rpc_url: &str,
) -> Result<std::sync::Arc<dyn ChainAdapter>, TransferError> {
    Ok(match network.family {
        ChainFamily::Evm => std::sync::Arc::new(EvmAdapter::new(network, rpc_url)?),
        ChainFamily::Solana => std::sync::Arc::new(SolanaAdapter::new(network, rpc_url)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_picks_adapter_by_family() {
        let solana = connect(SOLANA_DEVNET, SOLANA_DEVNET.rpc_url).unwrap();
        assert_eq!(solana.network().slug, "solana-devnet");

        let evm = connect(ETHEREUM_SEPOLIA, ETHEREUM_SEPOLIA.rpc_url).unwrap();
        assert_eq!(evm.network().family, ChainFamily::Evm);
    }

    #[test]
    fn connect_rejects_bad_endpoint() {
        assert!(connect(SOLANA_DEVNET, "::not a url::").is_err());
    }
}
