// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local checks run before anything is signed.
//!
//! These are fast-fail checks against a balance snapshot. The balance can
//! still change before submission, so passing them does not guarantee the
//! network will accept the transfer.

use crate::error::TransferError;
use crate::models::{FeeEstimate, TransferRequest};

/// Reject requests no network would accept.
pub fn validate_request(request: &TransferRequest) -> Result<(), TransferError> {
    if request.amount() == 0 {
        return Err(TransferError::InvalidRequest(
            "Transfer amount must be greater than zero".to_string(),
        ));
    }
    if request.receiver().as_str().trim().is_empty() {
        return Err(TransferError::InvalidAddress(
            "Receiver address is empty".to_string(),
        ));
    }
    Ok(())
}

/// Enforce the request's optional max-fee bound.
pub fn check_fee_limit(request: &TransferRequest, fee: &FeeEstimate) -> Result<(), TransferError> {
    match request.max_fee() {
        Some(limit) if fee.fee > limit => Err(TransferError::FeeLimitExceeded {
            fee: fee.fee,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Require `current_balance >= amount + fee`.
pub fn check(
    request: &TransferRequest,
    fee: &FeeEstimate,
    current_balance: u128,
) -> Result<(), TransferError> {
    // An unrepresentable total can never be covered.
    let needed = request.amount().checked_add(fee.fee).unwrap_or(u128::MAX);

    if current_balance >= needed {
        Ok(())
    } else {
        Err(TransferError::InsufficientFunds {
            needed,
            available: current_balance,
        })
    }
}
