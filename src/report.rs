// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Result Reporting
//!
//! Turns the outcome of a transfer (handle or error, plus the final status)
//! into a [`TransferReport`] and hands it to a [`Reporter`]. Reporters own all
//! human-facing output; the transfer core never prints.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::blockchain::NetworkConfig;
use crate::error::TransferError;
use crate::models::{Status, TransferHandle};
use crate::transfer::PollOutcome;

/// Final record of one transfer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransferReport {
    pub network: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    /// Final status; absent when nothing was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub attempts: u32,
    pub query_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportedError>,
    /// The transfer may have landed; look it up before resubmitting.
    pub requires_reconciliation: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: &'static str,
    pub message: String,
}

impl From<&TransferError> for ReportedError {
    fn from(err: &TransferError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl TransferReport {
    /// Report for a submitted transfer whose polling finished.
    ///
    /// A timed-out or cancelled poll carries the matching [`TransferError`].
    pub fn polled(network: &NetworkConfig, handle: &TransferHandle, outcome: &PollOutcome) -> Self {
        let failure_reason = match &outcome.status {
            Status::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        Self {
            network: network.slug,
            handle: Some(handle.to_string()),
            explorer_url: Some(network.explorer_tx_url(handle)),
            status: Some(outcome.status.as_str()),
            failure_reason,
            attempts: outcome.attempts,
            query_failures: outcome.query_failures,
            error: outcome.error().as_ref().map(ReportedError::from),
            requires_reconciliation: !outcome.status.is_terminal(),
            completed_at: Utc::now(),
        }
    }

    /// Report for a transfer that ended in an error.
    ///
    /// `handle` is present when the error happened after submission (for
    /// example a malformed handle aborting the poll).
    pub fn errored(
        network: &NetworkConfig,
        handle: Option<&TransferHandle>,
        error: &TransferError,
    ) -> Self {
        Self {
            network: network.slug,
            handle: handle.map(ToString::to_string),
            explorer_url: handle.map(|h| network.explorer_tx_url(h)),
            status: None,
            failure_reason: None,
            attempts: 0,
            query_failures: 0,
            error: Some(error.into()),
            requires_reconciliation: handle.is_some() || error.requires_reconciliation(),
            completed_at: Utc::now(),
        }
    }

    /// Confirmed on chain.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status == Some(Status::Confirmed.as_str())
    }
}

/// Report output failures.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Consumer of final transfer outcomes.
pub trait Reporter {
    fn report(&mut self, report: &TransferReport) -> Result<(), ReportError>;
}

/// Emits reports as tracing events.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, report: &TransferReport) -> Result<(), ReportError> {
        let handle = report.handle.as_deref().unwrap_or("-");
        let status = report.status.unwrap_or("not_submitted");

        if report.is_success() {
            info!(
                network = report.network,
                tx_hash = handle,
                explorer_url = report.explorer_url.as_deref().unwrap_or("-"),
                attempts = report.attempts,
                "Transfer confirmed"
            );
        } else if let Some(err) = &report.error {
            warn!(
                network = report.network,
                tx_hash = handle,
                kind = err.kind,
                error = %err.message,
                requires_reconciliation = report.requires_reconciliation,
                "Transfer did not complete"
            );
        } else {
            warn!(
                network = report.network,
                tx_hash = handle,
                status,
                reason = report.failure_reason.as_deref().unwrap_or("-"),
                attempts = report.attempts,
                requires_reconciliation = report.requires_reconciliation,
                "Transfer not confirmed"
            );
        }
        Ok(())
    }
}

/// Writes each report as one JSON line.
pub struct JsonReporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, report: &TransferReport) -> Result<(), ReportError> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{ETHEREUM_SEPOLIA, SOLANA_DEVNET};

    fn outcome(status: Status, attempts: u32) -> PollOutcome {
        PollOutcome {
            status,
            attempts,
            query_failures: 0,
        }
    }

    #[test]
    fn confirmed_report() {
        let handle = TransferHandle("5sig".into());
        let report = TransferReport::polled(&SOLANA_DEVNET, &handle, &outcome(Status::Confirmed, 3));

        assert!(report.is_success());
        assert!(!report.requires_reconciliation);
        assert!(report.error.is_none());
        assert_eq!(
            report.explorer_url.as_deref(),
            Some("https://explorer.solana.com/tx/5sig?cluster=devnet")
        );
    }

    #[test]
    fn timed_out_report_needs_reconciliation() {
        let handle = TransferHandle("0xabc".into());
        let report = TransferReport::polled(&ETHEREUM_SEPOLIA, &handle, &outcome(Status::TimedOut, 5));

        assert!(!report.is_success());
        assert!(report.requires_reconciliation);
        assert_eq!(report.status, Some("timed_out"));
        assert_eq!(report.error.as_ref().unwrap().kind, "timed_out");
        assert_eq!(report.attempts, 5);
    }

    #[test]
    fn cancelled_report_carries_cancelled_error() {
        let handle = TransferHandle("5sig".into());
        let report = TransferReport::polled(&SOLANA_DEVNET, &handle, &outcome(Status::Cancelled, 2));

        assert!(!report.is_success());
        assert!(report.requires_reconciliation);
        assert_eq!(report.status, Some("cancelled"));
        assert_eq!(report.error.as_ref().unwrap().kind, "cancelled");
    }

    #[test]
    fn failed_report_keeps_reason() {
        let handle = TransferHandle("0xabc".into());
        let report = TransferReport::polled(
            &ETHEREUM_SEPOLIA,
            &handle,
            &outcome(Status::Failed("execution reverted".into()), 2),
        );

        assert!(!report.requires_reconciliation);
        assert_eq!(report.failure_reason.as_deref(), Some("execution reverted"));
    }

    #[test]
    fn error_report_without_handle() {
        let err = TransferError::InsufficientFunds {
            needed: 510_000,
            available: 100,
        };
        let report = TransferReport::errored(&SOLANA_DEVNET, None, &err);

        assert!(!report.is_success());
        assert!(!report.requires_reconciliation);
        assert!(report.explorer_url.is_none());
        assert_eq!(report.error.as_ref().unwrap().kind, "insufficient_funds");

        let ambiguous = TransferError::AmbiguousOutcome {
            reason: "reset".into(),
        };
        assert!(TransferReport::errored(&SOLANA_DEVNET, None, &ambiguous).requires_reconciliation);
    }

    #[test]
    fn json_reporter_writes_one_line_per_report() {
        let handle = TransferHandle("5sig".into());
        let mut reporter = JsonReporter::new(Vec::new());
        reporter
            .report(&TransferReport::polled(&SOLANA_DEVNET, &handle, &outcome(Status::Confirmed, 1)))
            .unwrap();
        reporter
            .report(&TransferReport::errored(
                &SOLANA_DEVNET,
                None,
                &TransferError::NetworkError("down".into()),
            ))
            .unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "confirmed");
        assert_eq!(lines[0]["handle"], "5sig");
        assert!(lines[0].get("error").is_none());
        assert_eq!(lines[1]["error"]["kind"], "network_error");
        assert!(lines[1].get("status").is_none());
    }

    #[test]
    fn log_reporter_accepts_every_shape() {
        let handle = TransferHandle("5sig".into());
        let mut reporter = LogReporter;
        for report in [
            TransferReport::polled(&SOLANA_DEVNET, &handle, &outcome(Status::Confirmed, 1)),
            TransferReport::polled(&SOLANA_DEVNET, &handle, &outcome(Status::Cancelled, 1)),
            TransferReport::errored(&SOLANA_DEVNET, Some(&handle), &TransferError::Cancelled),
        ] {
            assert!(reporter.report(&report).is_ok());
        }
    }
}
