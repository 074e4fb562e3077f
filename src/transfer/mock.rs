// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted in-memory chain used by the transfer tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::blockchain::{ChainAdapter, NetworkConfig, SOLANA_DEVNET};
use crate::error::TransferError;
use crate::models::{
    Account, AccountId, Anchor, FeeEstimate, SecretKey, Status, TransferHandle, TransferRequest,
};

pub const MOCK_HANDLE: &str = "mock-signature";

/// Chain whose answers are fixed up front and whose calls are recorded.
pub struct MockChain {
    balance: u128,
    fee: u128,
    submit_result: Result<TransferHandle, TransferError>,
    statuses: Mutex<VecDeque<Result<Status, TransferError>>>,
    last_status: Mutex<Option<Result<Status, TransferError>>>,
    status_delay: Duration,
    calls: Mutex<Vec<&'static str>>,
}

impl MockChain {
    pub fn new(balance: u128, fee: u128) -> Self {
        Self {
            balance,
            fee,
            submit_result: Ok(TransferHandle(MOCK_HANDLE.to_string())),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            status_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_submit_result(mut self, result: Result<TransferHandle, TransferError>) -> Self {
        self.submit_result = result;
        self
    }

    /// Answers for successive `get_status` calls; the last one repeats.
    pub fn with_statuses(self, statuses: Vec<Result<Status, TransferError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Each `get_status` call takes this long to answer.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn request(amount: u128) -> TransferRequest {
    let sender = Account::new("sender", SecretKey::from_bytes(vec![1; 32]));
    TransferRequest::new(sender, "receiver", amount)
}

#[async_trait]
impl ChainAdapter for MockChain {
    fn network(&self) -> &NetworkConfig {
        &SOLANA_DEVNET
    }

    async fn get_balance(&self, _account: &AccountId) -> Result<u128, TransferError> {
        self.record("get_balance");
        Ok(self.balance)
    }

    async fn estimate_fee(&self, _request: &TransferRequest) -> Result<FeeEstimate, TransferError> {
        self.record("estimate_fee");
        Ok(FeeEstimate::flat(self.fee))
    }

    async fn get_recent_anchor(&self, _sender: &AccountId) -> Result<Anchor, TransferError> {
        self.record("get_recent_anchor");
        Ok(Anchor::Nonce(0))
    }

    fn sign_transfer(
        &self,
        request: &TransferRequest,
        _fee: &FeeEstimate,
        _anchor: &Anchor,
    ) -> Result<Vec<u8>, TransferError> {
        self.record("sign_transfer");
        Ok(request.amount().to_le_bytes().to_vec())
    }

    async fn submit(&self, _signed_transaction: &[u8]) -> Result<TransferHandle, TransferError> {
        self.record("submit");
        self.submit_result.clone()
    }

    async fn get_status(&self, _handle: &TransferHandle) -> Result<Status, TransferError> {
        self.record("get_status");
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        let next = self.statuses.lock().unwrap().pop_front();
        let mut last = self.last_status.lock().unwrap();
        match next {
            Some(status) => {
                *last = Some(status.clone());
                status
            }
            None => last.clone().unwrap_or(Ok(Status::Pending)),
        }
    }
}
