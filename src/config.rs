// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`TransferConfig`] they
//! resolve into. Configuration is read once, only by commands that need it
//! (after an optional `.env` file has been loaded), and then passed
//! explicitly to constructors. The sender credential itself is loaded on
//! first use.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TRANSFER_NETWORK` | Network preset slug | `solana-devnet` |
//! | `RPC_ENDPOINT` | JSON-RPC endpoint override | Network preset |
//! | `TRANSFER_AMOUNT` | Amount in base units (lamports, wei) | Required for `transfer` |
//! | `MAX_FEE` | Upper bound on the estimated fee, base units | None |
//! | `MAX_ATTEMPTS` | Confirmation poll attempts | `30` |
//! | `POLL_INTERVAL_MS` | Delay between poll attempts | `1000` |
//! | `POLL_BACKOFF` | `fixed` or `exponential` | `fixed` |
//! | `SENDER_PRIVATE_KEY` | Sender credential (base58 for Solana, hex or PEM for EVM) | Required for `transfer` |
//! | `SENDER_PRIVATE_KEY_PATH` | File holding the sender credential | None |
//! | `RECEIVER_ADDRESS` | Receiver identifier | Required for `transfer` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::blockchain::signing::WalletPair;
use crate::blockchain::{network_by_slug, parse_amount, NetworkConfig, NETWORKS, SOLANA_DEVNET};
use crate::transfer::poller::{Backoff, PollerConfig, DEFAULT_MAX_ATTEMPTS};

/// Network preset slug.
pub const NETWORK_ENV: &str = "TRANSFER_NETWORK";

/// JSON-RPC endpoint override. Defaults to the preset's public endpoint.
pub const RPC_ENDPOINT_ENV: &str = "RPC_ENDPOINT";

/// Transfer amount in base units.
pub const AMOUNT_ENV: &str = "TRANSFER_AMOUNT";

/// Optional fee bound in base units.
pub const MAX_FEE_ENV: &str = "MAX_FEE";

pub const MAX_ATTEMPTS_ENV: &str = "MAX_ATTEMPTS";
pub const POLL_INTERVAL_MS_ENV: &str = "POLL_INTERVAL_MS";
pub const POLL_BACKOFF_ENV: &str = "POLL_BACKOFF";

/// Sender credential, inline.
///
/// Never logged. Literal `\n` sequences are expanded so PEM keys survive
/// single-line `.env` files.
pub const SENDER_KEY_ENV: &str = "SENDER_PRIVATE_KEY";

/// Sender credential, read from a file when [`SENDER_KEY_ENV`] is unset.
pub const SENDER_KEY_PATH_ENV: &str = "SENDER_PRIVATE_KEY_PATH";

pub const RECEIVER_ENV: &str = "RECEIVER_ADDRESS";

/// Logging format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Configuration problems, reported before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Unknown network '{0}' (expected one of: {known})", known = known_networks())]
    UnknownNetwork(String),

    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn known_networks() -> String {
    NETWORKS
        .iter()
        .map(|n| n.slug)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the sender credential comes from.
#[derive(Clone)]
enum SenderKeySource {
    Inline(String),
    File(PathBuf),
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct TransferConfig {
    pub network: NetworkConfig,
    pub rpc_endpoint: String,
    pub amount: Option<u128>,
    pub max_fee: Option<u128>,
    pub poller: PollerConfig,
    pub receiver: Option<String>,
    sender_key: Option<SenderKeySource>,
}

impl TransferConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let network = match env(NETWORK_ENV) {
            Some(slug) => network_by_slug(&slug).ok_or(ConfigError::UnknownNetwork(slug))?,
            None => SOLANA_DEVNET,
        };
        let rpc_endpoint = env(RPC_ENDPOINT_ENV).unwrap_or_else(|| network.rpc_url.to_string());

        let amount = env(AMOUNT_ENV)
            .map(|v| parse_number::<u128>(AMOUNT_ENV, &v))
            .transpose()?;
        let max_fee = env(MAX_FEE_ENV)
            .map(|v| parse_number::<u128>(MAX_FEE_ENV, &v))
            .transpose()?;

        let max_attempts = env(MAX_ATTEMPTS_ENV)
            .map(|v| parse_number::<u32>(MAX_ATTEMPTS_ENV, &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let poll_interval_ms = env(POLL_INTERVAL_MS_ENV)
            .map(|v| parse_number::<u64>(POLL_INTERVAL_MS_ENV, &v))
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        let backoff = env(POLL_BACKOFF_ENV)
            .map(|v| {
                v.parse::<Backoff>().map_err(|reason| ConfigError::Invalid {
                    name: POLL_BACKOFF_ENV,
                    reason,
                })
            })
            .transpose()?
            .unwrap_or_default();

        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: MAX_ATTEMPTS_ENV,
                reason: "must be at least 1".to_string(),
            });
        }
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: POLL_INTERVAL_MS_ENV,
                reason: "must be at least 1".to_string(),
            });
        }
        let poller = PollerConfig::new(
            max_attempts,
            Duration::from_millis(poll_interval_ms),
            backoff,
        )
        .map_err(|e| ConfigError::Invalid {
            name: MAX_ATTEMPTS_ENV,
            reason: e.to_string(),
        })?;

        let sender_key = match env(SENDER_KEY_ENV) {
            Some(key) => Some(SenderKeySource::Inline(key.replace("\\n", "\n"))),
            None => env(SENDER_KEY_PATH_ENV).map(|path| SenderKeySource::File(PathBuf::from(path))),
        };

        Ok(Self {
            network,
            rpc_endpoint,
            amount,
            max_fee,
            poller,
            receiver: env(RECEIVER_ENV),
            sender_key,
        })
    }

    /// Encoded sender credential, read from the key file if that is its source.
    pub fn sender_key(&self) -> Result<String, ConfigError> {
        match &self.sender_key {
            Some(SenderKeySource::Inline(key)) => Ok(key.clone()),
            Some(SenderKeySource::File(path)) => read_key_file(path.clone()),
            None => Err(ConfigError::Missing(SENDER_KEY_ENV)),
        }
    }

    pub fn has_sender_key(&self) -> bool {
        self.sender_key.is_some()
    }

    pub fn receiver(&self) -> Result<&str, ConfigError> {
        self.receiver.as_deref().ok_or(ConfigError::Missing(RECEIVER_ENV))
    }

    pub fn amount(&self) -> Result<u128, ConfigError> {
        self.amount.ok_or(ConfigError::Missing(AMOUNT_ENV))
    }

    /// Amount to send: a display-unit value from the command line wins over
    /// [`AMOUNT_ENV`].
    pub fn amount_with_override(&self, display_amount: Option<&str>) -> Result<u128, ConfigError> {
        match display_amount {
            Some(raw) => parse_amount(raw, self.network.decimals).map_err(|e| ConfigError::Invalid {
                name: "--amount-decimal",
                reason: e.to_string(),
            }),
            None => self.amount(),
        }
    }
}

/// Render a generated wallet pair as a `.env` file the CLI can load back.
pub fn render_env_file(pair: &WalletPair) -> String {
    format!(
        "# Generated {family} wallets. Keep this file private.\n\
         # Sender address: {sender}\n\
         {SENDER_KEY_ENV}={sender_key}\n\
         {RECEIVER_ENV}={receiver}\n",
        family = pair.network_family,
        sender = pair.sender.public_id,
        sender_key = pair.sender.private_key,
        receiver = pair.receiver.public_id,
    )
}

impl fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferConfig")
            .field("network", &self.network.slug)
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("amount", &self.amount)
            .field("max_fee", &self.max_fee)
            .field("poller", &self.poller)
            .field("receiver", &self.receiver)
            .field("sender_key", &self.sender_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("'{raw}': {e}"),
    })
}

fn read_key_file(path: PathBuf) -> Result<String, ConfigError> {
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(contents.trim().to_string()),
        Err(source) => Err(ConfigError::KeyFile { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ETHEREUM_SEPOLIA;
    use std::collections::HashMap;
    use std::io::Write;

    fn resolve(vars: &[(&str, &str)]) -> Result<TransferConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TransferConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.network, SOLANA_DEVNET);
        assert_eq!(config.rpc_endpoint, SOLANA_DEVNET.rpc_url);
        assert_eq!(config.poller.max_attempts(), 30);
        assert_eq!(config.poller.poll_interval(), Duration::from_millis(1_000));
        assert_eq!(config.poller.backoff(), Backoff::Fixed);
        assert!(config.amount.is_none());
        assert!(matches!(config.sender_key(), Err(ConfigError::Missing(SENDER_KEY_ENV))));
        assert!(matches!(config.receiver(), Err(ConfigError::Missing(RECEIVER_ENV))));
    }

    #[test]
    fn reads_all_options() {
        let config = resolve(&[
            (NETWORK_ENV, "ethereum-sepolia"),
            (RPC_ENDPOINT_ENV, "http://localhost:8545"),
            (AMOUNT_ENV, "1000000000000000"),
            (MAX_FEE_ENV, "42000"),
            (MAX_ATTEMPTS_ENV, "5"),
            (POLL_INTERVAL_MS_ENV, "250"),
            (POLL_BACKOFF_ENV, "exponential"),
            (SENDER_KEY_ENV, "0xabc"),
            (RECEIVER_ENV, " 0xdef "),
        ])
        .unwrap();

        assert_eq!(config.network, ETHEREUM_SEPOLIA);
        assert_eq!(config.rpc_endpoint, "http://localhost:8545");
        assert_eq!(config.amount().unwrap(), 1_000_000_000_000_000);
        assert_eq!(config.max_fee, Some(42_000));
        assert_eq!(config.poller.max_attempts(), 5);
        assert_eq!(config.poller.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.poller.backoff(), Backoff::Exponential);
        assert_eq!(config.sender_key().unwrap(), "0xabc");
        assert_eq!(config.receiver().unwrap(), "0xdef");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = resolve(&[(NETWORK_ENV, "  "), (MAX_ATTEMPTS_ENV, "")]).unwrap();
        assert_eq!(config.network, SOLANA_DEVNET);
        assert_eq!(config.poller.max_attempts(), 30);
    }

    #[test]
    fn rejects_zero_budget() {
        assert!(matches!(
            resolve(&[(MAX_ATTEMPTS_ENV, "0")]),
            Err(ConfigError::Invalid {
                name: MAX_ATTEMPTS_ENV,
                ..
            })
        ));
        assert!(matches!(
            resolve(&[(POLL_INTERVAL_MS_ENV, "0")]),
            Err(ConfigError::Invalid {
                name: POLL_INTERVAL_MS_ENV,
                ..
            })
        ));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(matches!(
            resolve(&[(AMOUNT_ENV, "0.5")]),
            Err(ConfigError::Invalid { name: AMOUNT_ENV, .. })
        ));
        assert!(matches!(
            resolve(&[(AMOUNT_ENV, "-1")]),
            Err(ConfigError::Invalid { name: AMOUNT_ENV, .. })
        ));
        assert!(resolve(&[(POLL_BACKOFF_ENV, "linear")]).is_err());
    }

    #[test]
    fn rejects_unknown_network() {
        let err = resolve(&[(NETWORK_ENV, "bitcoin")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNetwork(_)));
        assert!(err.to_string().contains("solana-devnet"));
    }

    #[test]
    fn inline_key_expands_escaped_newlines() {
        let config = resolve(&[(SENDER_KEY_ENV, "-----BEGIN\\nabc\\n-----END")]).unwrap();
        assert_eq!(config.sender_key().unwrap(), "-----BEGIN\nabc\n-----END");
    }

    #[test]
    fn key_file_is_used_when_inline_key_is_absent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "5KeyFromFile").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = resolve(&[(SENDER_KEY_PATH_ENV, path.as_str())]).unwrap();
        assert_eq!(config.sender_key().unwrap(), "5KeyFromFile");

        let config = resolve(&[(SENDER_KEY_ENV, "inline"), (SENDER_KEY_PATH_ENV, path.as_str())]).unwrap();
        assert_eq!(config.sender_key().unwrap(), "inline");
    }

    #[test]
    fn missing_key_file_is_reported_on_use() {
        let config = resolve(&[(SENDER_KEY_PATH_ENV, "/nonexistent/key")]).unwrap();
        assert!(config.has_sender_key());
        assert!(matches!(config.sender_key(), Err(ConfigError::KeyFile { .. })));
    }

    #[test]
    fn display_amount_overrides_configured_amount() {
        let config = resolve(&[(AMOUNT_ENV, "5000")]).unwrap();
        assert_eq!(config.amount_with_override(None).unwrap(), 5_000);
        assert_eq!(config.amount_with_override(Some("0.001")).unwrap(), 1_000_000);

        let unset = resolve(&[]).unwrap();
        assert_eq!(unset.amount_with_override(Some("1.5")).unwrap(), 1_500_000_000);
        assert!(matches!(
            unset.amount_with_override(None),
            Err(ConfigError::Missing(AMOUNT_ENV))
        ));
        assert!(matches!(
            unset.amount_with_override(Some("abc")),
            Err(ConfigError::Invalid { name: "--amount-decimal", .. })
        ));
    }

    #[test]
    fn env_file_loads_back_as_sender_and_receiver() {
        use crate::blockchain::signing::{account_from_encoded, generate_wallet_pair};
        use crate::blockchain::ChainFamily;

        for (family, network) in [(ChainFamily::Solana, "solana-devnet"), (ChainFamily::Evm, "ethereum-sepolia")] {
            let pair = generate_wallet_pair(family);
            let rendered = render_env_file(&pair);

            let mut vars: HashMap<String, String> = dotenvy::from_read_iter(rendered.as_bytes())
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(vars.len(), 2);
            vars.insert(NETWORK_ENV.to_string(), network.to_string());

            let config = TransferConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
            let sender = account_from_encoded(family, &config.sender_key().unwrap()).unwrap();
            assert_eq!(sender.id.as_str(), pair.sender.public_id);
            assert_eq!(config.receiver().unwrap(), pair.receiver.public_id);
        }
    }

    #[test]
    fn debug_redacts_sender_key() {
        let config = resolve(&[(SENDER_KEY_ENV, "super-secret")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
