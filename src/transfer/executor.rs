// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transfer Executor
//!
//! Runs one transfer from request to submission handle:
//!
//! 1. Read balance and fee estimate concurrently.
//! 2. Enforce the optional fee bound and the balance precondition.
//! 3. Fetch a fresh anchor (blockhash or nonce) right before signing.
//! 4. Sign locally.
//! 5. Submit exactly once.
//!
//! Submission is never retried here. A transport failure during submit leaves
//! the outcome unknown and is reported as [`TransferError::AmbiguousOutcome`].

use tracing::{debug, info, warn};

use super::precondition;
use crate::blockchain::ChainAdapter;
use crate::error::TransferError;
use crate::models::{TransferHandle, TransferRequest};

/// Submits transfers through a single chain adapter.
pub struct TransferExecutor<'a, A: ChainAdapter + ?Sized> {
    adapter: &'a A,
}

impl<'a, A: ChainAdapter + ?Sized> TransferExecutor<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Check, sign and submit `request`.
    pub async fn execute(&self, request: &TransferRequest) -> Result<TransferHandle, TransferError> {
        let network = self.adapter.network().slug;
        let request_id = request.request_id();

        precondition::validate_request(request)?;

        let (balance, fee) = tokio::try_join!(
            self.adapter.get_balance(&request.sender().id),
            self.adapter.estimate_fee(request),
        )?;

        debug!(
            %request_id,
            network,
            balance,
            fee = fee.fee,
            amount = request.amount(),
            "Fetched balance and fee estimate"
        );

        precondition::check_fee_limit(request, &fee)?;
        if let Err(e) = precondition::check(request, &fee, balance) {
            warn!(%request_id, network, error = %e, "Transfer precondition failed");
            return Err(e);
        }

        let anchor = self.adapter.get_recent_anchor(&request.sender().id).await?;
        let signed = self.adapter.sign_transfer(request, &fee, &anchor)?;

        match self.adapter.submit(&signed).await {
            Ok(handle) => {
                info!(
                    %request_id,
                    network,
                    tx_hash = %handle,
                    receiver = %request.receiver(),
                    amount = request.amount(),
                    "Transfer submitted"
                );
                Ok(handle)
            }
            Err(TransferError::NetworkError(reason)) => {
                warn!(
                    %request_id,
                    network,
                    reason = %reason,
                    "Submission outcome unknown; reconcile before resubmitting"
                );
                Err(TransferError::AmbiguousOutcome { reason })
            }
            Err(e) => {
                warn!(%request_id, network, error = %e, "Transfer rejected");
                Err(e)
            }
        }
    }
}

/// Shorthand for `TransferExecutor::new(adapter).execute(request)`.
pub async fn execute<A: ChainAdapter + ?Sized>(
    adapter: &A,
    request: &TransferRequest,
) -> Result<TransferHandle, TransferError> {
    TransferExecutor::new(adapter).execute(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::mock::{request, MockChain, MOCK_HANDLE};

    #[tokio::test]
    async fn sufficient_balance_submits_once() {
        let chain = MockChain::new(1_000_000, 10_000);

        let handle = execute(&chain, &request(500_000)).await.unwrap();

        assert_eq!(handle.as_str(), MOCK_HANDLE);
        assert_eq!(chain.count("submit"), 1);
    }

    #[tokio::test]
    async fn insufficient_balance_never_submits() {
        let chain = MockChain::new(100, 10_000);

        let err = execute(&chain, &request(500_000)).await.unwrap_err();

        assert_eq!(
            err,
            TransferError::InsufficientFunds {
                needed: 510_000,
                available: 100
            }
        );
        assert_eq!(chain.count("get_recent_anchor"), 0);
        assert_eq!(chain.count("sign_transfer"), 0);
        assert_eq!(chain.count("submit"), 0);
    }

    #[tokio::test]
    async fn transport_failure_on_submit_is_ambiguous() {
        let chain = MockChain::new(1_000_000, 10_000)
            .with_submit_result(Err(TransferError::NetworkError("connection reset".into())));

        let err = execute(&chain, &request(500_000)).await.unwrap_err();

        assert_eq!(
            err,
            TransferError::AmbiguousOutcome {
                reason: "connection reset".into()
            }
        );
        assert!(err.requires_reconciliation());
        assert_eq!(chain.count("submit"), 1);
    }

    #[tokio::test]
    async fn rejection_is_surfaced_without_resubmitting() {
        let chain = MockChain::new(1_000_000, 10_000).with_submit_result(Err(
            TransferError::RejectedByNetwork {
                reason: "Blockhash not found".into(),
            },
        ));

        let err = execute(&chain, &request(500_000)).await.unwrap_err();

        assert!(matches!(err, TransferError::RejectedByNetwork { .. }));
        assert_eq!(chain.count("submit"), 1);
        assert_eq!(chain.count("get_recent_anchor"), 1);
    }

    #[tokio::test]
    async fn anchor_is_fetched_after_checks_and_right_before_signing() {
        let chain = MockChain::new(1_000_000, 10_000);

        execute(&chain, &request(500_000)).await.unwrap();

        let calls = chain.calls();
        assert_eq!(calls.len(), 5);
        assert!(calls[..2].contains(&"get_balance"));
        assert!(calls[..2].contains(&"estimate_fee"));
        assert_eq!(&calls[2..], &["get_recent_anchor", "sign_transfer", "submit"]);
    }

    #[tokio::test]
    async fn fee_above_limit_stops_before_signing() {
        let chain = MockChain::new(1_000_000, 10_000);
        let req = request(500_000).with_max_fee(9_999);

        let err = execute(&chain, &req).await.unwrap_err();

        assert_eq!(
            err,
            TransferError::FeeLimitExceeded {
                fee: 10_000,
                limit: 9_999
            }
        );
        assert_eq!(chain.count("sign_transfer"), 0);
        assert_eq!(chain.count("submit"), 0);
    }

    #[tokio::test]
    async fn zero_amount_makes_no_network_calls() {
        let chain = MockChain::new(1_000_000, 10_000);

        let err = execute(&chain, &request(0)).await.unwrap_err();

        assert!(matches!(err, TransferError::InvalidRequest(_)));
        assert!(chain.calls().is_empty());
    }
}
