// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network presets and base-unit amount helpers.

use crate::error::TransferError;
use crate::models::TransferHandle;

/// Account model of a chain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    /// Sequence-number (nonce) accounts, e.g. Ethereum.
    Evm,
    /// Transactions embed a recent blockhash and expire.
    Solana,
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Identifier used in configuration (`TRANSFER_NETWORK`)
    pub slug: &'static str,
    /// Network name for display
    pub name: &'static str,
    pub family: ChainFamily,
    /// EIP-155 chain ID (EVM only)
    pub chain_id: Option<u64>,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer base URL
    pub explorer_url: &'static str,
    /// Query string appended to explorer links (Solana cluster selector)
    pub explorer_query: &'static str,
    /// Native asset symbol
    pub symbol: &'static str,
    /// Decimals between the display unit and the base unit
    pub decimals: u8,
}

impl NetworkConfig {
    /// Block explorer link for a submitted transaction.
    pub fn explorer_tx_url(&self, handle: &TransferHandle) -> String {
        format!("{}/tx/{}{}", self.explorer_url, handle, self.explorer_query)
    }
}

/// Solana Devnet configuration.
pub const SOLANA_DEVNET: NetworkConfig = NetworkConfig {
    slug: "solana-devnet",
    name: "Solana Devnet",
    family: ChainFamily::Solana,
    chain_id: None,
    rpc_url: "https://api.devnet.solana.com",
    explorer_url: "https://explorer.solana.com",
    explorer_query: "?cluster=devnet",
    symbol: "SOL",
    decimals: 9,
};

/// Solana Mainnet Beta configuration.
pub const SOLANA_MAINNET: NetworkConfig = NetworkConfig {
    slug: "solana-mainnet",
    name: "Solana Mainnet Beta",
    family: ChainFamily::Solana,
    chain_id: None,
    rpc_url: "https://api.mainnet-beta.solana.com",
    explorer_url: "https://explorer.solana.com",
    explorer_query: "",
    symbol: "SOL",
    decimals: 9,
};

/// Ethereum Sepolia Testnet configuration.
pub const ETHEREUM_SEPOLIA: NetworkConfig = NetworkConfig {
    slug: "ethereum-sepolia",
    name: "Ethereum Sepolia Testnet",
    family: ChainFamily::Evm,
    chain_id: Some(11_155_111),
    rpc_url: "https://eth-sepolia.public.blastapi.io",
    explorer_url: "https://sepolia.etherscan.io",
    explorer_query: "",
    symbol: "ETH",
    decimals: 18,
};

/// Ethereum Mainnet configuration.
pub const ETHEREUM_MAINNET: NetworkConfig = NetworkConfig {
    slug: "ethereum-mainnet",
    name: "Ethereum Mainnet",
    family: ChainFamily::Evm,
    chain_id: Some(1),
    rpc_url: "https://eth.llamarpc.com",
    explorer_url: "https://etherscan.io",
    explorer_query: "",
    symbol: "ETH",
    decimals: 18,
};

/// All built-in presets.
pub const NETWORKS: [NetworkConfig; 4] =
    [SOLANA_DEVNET, SOLANA_MAINNET, ETHEREUM_SEPOLIA, ETHEREUM_MAINNET];

/// Look up a preset by slug (case-insensitive).
pub fn network_by_slug(raw: &str) -> Option<NetworkConfig> {
    let value = raw.trim().to_ascii_lowercase();
    NETWORKS.iter().find(|n| n.slug == value).cloned()
}

/// Parse a human-readable amount to base units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "0.001")
/// * `decimals` - Number of decimals (9 for SOL, 18 for ETH)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<u128, TransferError> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(TransferError::InvalidRequest(format!(
            "Invalid amount format: {amount:?}"
        )));
    }

    let whole = parts[0]
        .parse::<u128>()
        .map_err(|_| TransferError::InvalidRequest("Invalid whole number".to_string()))?;

    let decimal_part = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(TransferError::InvalidRequest(format!(
                "Too many decimal places (max {decimals})"
            )));
        }
        if dec_str.is_empty() {
            0u128
        } else {
            let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
            padded
                .parse::<u128>()
                .map_err(|_| TransferError::InvalidRequest("Invalid decimal".to_string()))?
        }
    } else {
        0u128
    };

    let multiplier = 10u128.pow(decimals as u32);
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or_else(|| TransferError::InvalidRequest("Amount overflow".to_string()))
}

/// Format base units as a human-readable amount.
pub fn format_amount(amount: u128, decimals: u8) -> String {
    if amount == 0 {
        return "0".to_string();
    }

    let divisor = 10u128.pow(decimals as u32);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder == 0 {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{whole}.{trimmed}")
    }
}
