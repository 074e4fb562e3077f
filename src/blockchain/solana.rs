// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solana chain adapter (recent-blockhash / expiring transaction model).
//!
//! Transfers are legacy transactions holding one System Program `Transfer`
//! instruction, built and signed with `solana-sdk` and sent bincode-encoded
//! through the JSON-RPC client.

use std::str::FromStr;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use solana_sdk::{
    hash::Hash, message::Message, pubkey::Pubkey, signature::Signature, signature::Signer,
    system_instruction, transaction::Transaction,
};
use tracing::debug;

use super::rpc::{RpcCallError, RpcClient, INVALID_PARAMS};
use super::signing::solana_keypair;
use super::types::{ChainFamily, NetworkConfig};
use super::ChainAdapter;
use crate::error::TransferError;
use crate::models::{AccountId, Anchor, FeeEstimate, Status, TransferHandle, TransferRequest};

/// Base fee charged per transaction signature.
pub const LAMPORTS_PER_SIGNATURE: u128 = 5_000;

#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    #[serde(default)]
    err: Option<serde_json::Value>,
    #[serde(default)]
    confirmation_status: Option<String>,
}

/// Adapter for Solana clusters.
pub struct SolanaAdapter {
    network: NetworkConfig,
    rpc: RpcClient,
}

impl SolanaAdapter {
    /// Create an adapter for `network`, talking to `rpc_url`.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, TransferError> {
        if network.family != ChainFamily::Solana {
            return Err(TransferError::InvalidRequest(format!(
                "{} is not a Solana network",
                network.name
            )));
        }

        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            TransferError::InvalidRequest(format!("Invalid RPC URL: {e}"))
        })?;
        let rpc = RpcClient::new(url).map_err(|e| TransferError::InvalidRequest(e.to_string()))?;

        Ok(Self { network, rpc })
    }

    /// Create an adapter using the network's default endpoint.
    pub fn with_default_endpoint(network: NetworkConfig) -> Result<Self, TransferError> {
        let rpc_url = network.rpc_url;
        Self::new(network, rpc_url)
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn get_balance(&self, account: &AccountId) -> Result<u128, TransferError> {
        decode_pubkey(account.as_str())?;

        let balance: ContextValue<u64> = self
            .rpc
            .call(
                "getBalance",
                json!([account.as_str(), { "commitment": "confirmed" }]),
            )
            .await
            .map_err(|e| match e {
                RpcCallError::Rpc {
                    code: INVALID_PARAMS,
                    message,
                    ..
                } => TransferError::InvalidAddress(message),
                other => TransferError::NetworkError(format!("getBalance failed: {other}")),
            })?;

        Ok(u128::from(balance.value))
    }

    async fn estimate_fee(&self, _request: &TransferRequest) -> Result<FeeEstimate, TransferError> {
        Ok(FeeEstimate::flat(LAMPORTS_PER_SIGNATURE))
    }

    async fn get_recent_anchor(&self, _sender: &AccountId) -> Result<Anchor, TransferError> {
        let latest: ContextValue<LatestBlockhash> = self
            .rpc
            .call("getLatestBlockhash", json!([{ "commitment": "finalized" }]))
            .await
            .map_err(|e| TransferError::NetworkError(format!("getLatestBlockhash failed: {e}")))?;

        debug!(
            blockhash = %latest.value.blockhash,
            last_valid_block_height = latest.value.last_valid_block_height,
            "Fetched recent blockhash"
        );

        Ok(Anchor::Blockhash {
            hash: latest.value.blockhash,
            last_valid_block_height: latest.value.last_valid_block_height,
        })
    }

    fn sign_transfer(
        &self,
        request: &TransferRequest,
        _fee: &FeeEstimate,
        anchor: &Anchor,
    ) -> Result<Vec<u8>, TransferError> {
        let Anchor::Blockhash { hash, .. } = anchor else {
            return Err(TransferError::InvalidRequest(
                "Solana transactions need a blockhash anchor".to_string(),
            ));
        };

        let keypair = solana_keypair(&request.sender().secret)?;
        let from = keypair.pubkey();
        if from.to_string() != request.sender().id.as_str() {
            return Err(TransferError::InvalidRequest(
                "Sender credential does not match sender address".to_string(),
            ));
        }

        let to = decode_pubkey(request.receiver().as_str())?;
        if from == to {
            return Err(TransferError::InvalidRequest(
                "Sender and receiver must differ".to_string(),
            ));
        }

        let lamports = u64::try_from(request.amount()).map_err(|_| {
            TransferError::InvalidRequest(format!(
                "Amount {} exceeds the u64 lamport range",
                request.amount()
            ))
        })?;

        let blockhash = Hash::from_str(hash)
            .map_err(|e| TransferError::InvalidRequest(format!("Invalid blockhash {hash}: {e}")))?;

        let instruction = system_instruction::transfer(&from, &to, lamports);
        let message = Message::new_with_blockhash(&[instruction], Some(&from), &blockhash);
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&[&keypair], blockhash)
            .map_err(|e| TransferError::InvalidRequest(format!("Signing failed: {e}")))?;

        bincode::serialize(&tx)
            .map_err(|e| TransferError::InvalidRequest(format!("Failed to encode transaction: {e}")))
    }

    async fn submit(&self, signed_transaction: &[u8]) -> Result<TransferHandle, TransferError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(signed_transaction);

        let signature: String = self
            .rpc
            .call(
                "sendTransaction",
                json!([
                    encoded,
                    {
                        "skipPreflight": false,
                        "preflightCommitment": "processed",
                        "encoding": "base64",
                        "maxRetries": 3
                    }
                ]),
            )
            .await
            .map_err(submit_error)?;

        Ok(TransferHandle(signature))
    }

    async fn get_status(&self, handle: &TransferHandle) -> Result<Status, TransferError> {
        Signature::from_str(handle.as_str())
            .map_err(|e| TransferError::InvalidAddress(format!("Invalid signature: {e}")))?;

        let statuses: ContextValue<Vec<Option<SignatureStatus>>> = self
            .rpc
            .call(
                "getSignatureStatuses",
                json!([[handle.as_str()], { "searchTransactionHistory": true }]),
            )
            .await
            .map_err(|e| TransferError::NetworkError(format!("getSignatureStatuses failed: {e}")))?;

        Ok(signature_status(statuses.value.into_iter().next().flatten()))
    }
}

/// Map one `getSignatureStatuses` entry to a status.
fn signature_status(status: Option<SignatureStatus>) -> Status {
    let Some(status) = status else {
        return Status::Pending;
    };
    if let Some(err) = status.err {
        return Status::Failed(err.to_string());
    }
    match status.confirmation_status.as_deref() {
        Some("confirmed") | Some("finalized") => Status::Confirmed,
        _ => Status::Pending,
    }
}

/// Classify a `sendTransaction` failure.
///
/// An error object means the node answered and refused the transaction
/// (preflight failure, expired blockhash). Anything else leaves the outcome
/// unknown to the caller.
fn submit_error(err: RpcCallError) -> TransferError {
    match err {
        RpcCallError::Rpc { message, .. } => TransferError::RejectedByNetwork { reason: message },
        other => TransferError::NetworkError(format!("sendTransaction failed: {other}")),
    }
}

fn decode_pubkey(raw: &str) -> Result<Pubkey, TransferError> {
    Pubkey::from_str(raw)
        .map_err(|e| TransferError::InvalidAddress(format!("Invalid public key {raw}: {e}")))
}
