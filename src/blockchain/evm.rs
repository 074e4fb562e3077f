// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain adapter (nonce-based account model).
//!
//! Native transfers are legacy EIP-155 transactions with a fixed 21 000 gas
//! limit, signed locally and broadcast with `eth_sendRawTransaction`.

use std::str::FromStr;

use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    network::{Ethereum, TxSignerSync},
    primitives::{Address, Bytes, TxHash, TxKind, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    transports::{RpcError, TransportError, TransportErrorKind},
};
use async_trait::async_trait;
use tracing::debug;

use super::rpc::{decode_response, RpcCallError};
use super::signing::evm_signer;
use super::types::{ChainFamily, NetworkConfig};
use super::ChainAdapter;
use crate::error::TransferError;
use crate::models::{AccountId, Anchor, FeeEstimate, Status, TransferHandle, TransferRequest};

/// Gas used by a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Adapter for Ethereum and other EVM networks.
pub struct EvmAdapter {
    network: NetworkConfig,
    chain_id: u64,
    provider: HttpProvider,
}

impl EvmAdapter {
    /// Create an adapter for `network`, talking to `rpc_url`.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, TransferError> {
        if network.family != ChainFamily::Evm {
            return Err(TransferError::InvalidRequest(format!(
                "{} is not an EVM network",
                network.name
            )));
        }
        let chain_id = network.chain_id.ok_or_else(|| {
            TransferError::InvalidRequest(format!("{} has no chain id", network.name))
        })?;

        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            TransferError::InvalidRequest(format!("Invalid RPC URL: {e}"))
        })?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            network,
            chain_id,
            provider,
        })
    }

    /// Create an adapter using the network's default endpoint.
    pub fn with_default_endpoint(network: NetworkConfig) -> Result<Self, TransferError> {
        let rpc_url = network.rpc_url;
        Self::new(network, rpc_url)
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn get_balance(&self, account: &AccountId) -> Result<u128, TransferError> {
        let addr = parse_address(account.as_str())?;

        let balance = self
            .provider
            .get_balance(addr)
            .await
            .map_err(|e| read_error("eth_getBalance", e))?;

        Ok(u128::try_from(balance).unwrap_or(u128::MAX))
    }

    async fn estimate_fee(&self, _request: &TransferRequest) -> Result<FeeEstimate, TransferError> {
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| read_error("eth_gasPrice", e))?;

        let fee = gas_price
            .checked_mul(u128::from(TRANSFER_GAS_LIMIT))
            .ok_or_else(|| TransferError::NetworkError("gas price overflow".to_string()))?;

        debug!(gas_price, fee, network = self.network.slug, "Estimated transfer fee");
        Ok(FeeEstimate::priced(fee, gas_price))
    }

    async fn get_recent_anchor(&self, sender: &AccountId) -> Result<Anchor, TransferError> {
        let addr = parse_address(sender.as_str())?;

        let nonce = self
            .provider
            .get_transaction_count(addr)
            .pending()
            .await
            .map_err(|e| read_error("eth_getTransactionCount", e))?;

        Ok(Anchor::Nonce(nonce))
    }

    fn sign_transfer(
        &self,
        request: &TransferRequest,
        fee: &FeeEstimate,
        anchor: &Anchor,
    ) -> Result<Vec<u8>, TransferError> {
        let Anchor::Nonce(nonce) = anchor else {
            return Err(TransferError::InvalidRequest(
                "EVM transactions need a nonce anchor".to_string(),
            ));
        };
        let gas_price = fee.unit_price.ok_or_else(|| {
            TransferError::InvalidRequest("Fee estimate carries no gas price".to_string())
        })?;
        let to = parse_address(request.receiver().as_str())?;
        let signer = evm_signer(&request.sender().secret)?;
        if signer.address() != parse_address(request.sender().id.as_str())? {
            return Err(TransferError::InvalidRequest(
                "Sender credential does not match sender address".to_string(),
            ));
        }

        let mut tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: *nonce,
            gas_price,
            gas_limit: TRANSFER_GAS_LIMIT,
            to: TxKind::Call(to),
            value: U256::from(request.amount()),
            input: Bytes::new(),
        };

        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| TransferError::InvalidRequest(format!("Signing failed: {e}")))?;

        let envelope = TxEnvelope::from(tx.into_signed(signature));
        Ok(envelope.encoded_2718())
    }

    async fn submit(&self, signed_transaction: &[u8]) -> Result<TransferHandle, TransferError> {
        let pending = self
            .provider
            .send_raw_transaction(signed_transaction)
            .await
            .map_err(submit_error)?;

        Ok(TransferHandle(format!("{:#x}", pending.tx_hash())))
    }

    async fn get_status(&self, handle: &TransferHandle) -> Result<Status, TransferError> {
        let hash = TxHash::from_str(handle.as_str())
            .map_err(|e| TransferError::InvalidAddress(format!("Invalid tx hash: {e}")))?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| read_error("eth_getTransactionReceipt", e))?;

        Ok(receipt_status(receipt.map(|r| r.status())))
    }
}

fn parse_address(raw: &str) -> Result<Address, TransferError> {
    Address::from_str(raw).map_err(|e| TransferError::InvalidAddress(format!("{raw}: {e}")))
}

/// Read-only calls have no side effects, so any failure is retriable.
fn read_error(method: &str, err: TransportError) -> TransferError {
    TransferError::NetworkError(format!("{method} failed: {err}"))
}

/// Classify an `eth_sendRawTransaction` failure.
///
/// Nodes may pair a 4xx/5xx with a JSON-RPC error object in the body; that
/// object wins over the HTTP status, same as [`super::rpc::RpcClient`].
fn submit_error(err: TransportError) -> TransferError {
    match err {
        RpcError::ErrorResp(payload) => TransferError::RejectedByNetwork {
            reason: payload.message.to_string(),
        },
        RpcError::Transport(TransportErrorKind::HttpError(http)) => {
            match decode_response::<serde_json::Value>(http.body.as_bytes()) {
                Err(RpcCallError::Rpc { message, .. }) => {
                    TransferError::RejectedByNetwork { reason: message }
                }
                _ => TransferError::NetworkError(format!(
                    "eth_sendRawTransaction returned HTTP {}",
                    http.status
                )),
            }
        }
        other => TransferError::NetworkError(format!("eth_sendRawTransaction failed: {other}")),
    }
}

/// Map an optional receipt success flag to a status.
fn receipt_status(success: Option<bool>) -> Status {
    match success {
        None => Status::Pending,
        Some(true) => Status::Confirmed,
        Some(false) => Status::Failed("execution reverted".to_string()),
    }
}
