// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain Transfer command line interface.
//!
//! Usage:
//!   chain-transfer generate [--family solana|evm|all] [--output FILE] [--env FILE [--force]]
//!   chain-transfer balance [ADDRESS...]
//!   chain-transfer transfer [--to ADDRESS] [--amount N | --amount-decimal X] [--json]
//!
//! Options not given on the command line come from the environment (see
//! `chain_transfer::config`), optionally loaded from a `.env` file.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chain_transfer::blockchain::signing::{account_from_encoded, generate_wallet_pair, WalletPair};
use chain_transfer::blockchain::{self, format_amount, ChainFamily};
use chain_transfer::config::{self, render_env_file, ConfigError, TransferConfig};
use chain_transfer::logging::{init_tracing, LogFormat};
use chain_transfer::models::{AccountId, TransferRequest};
use chain_transfer::report::{JsonReporter, LogReporter, Reporter, TransferReport};
use chain_transfer::transfer::{execute, ConfirmationPoller};

#[derive(Parser)]
#[command(name = "chain-transfer")]
#[command(about = "Submit native transfers on Solana and EVM networks and wait for confirmation")]
#[command(version)]
struct Cli {
    /// Network preset (solana-devnet, solana-mainnet, ethereum-sepolia, ethereum-mainnet)
    #[arg(long, global = true)]
    network: Option<String>,

    /// JSON-RPC endpoint override
    #[arg(long, global = true)]
    rpc_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate sender and receiver wallets for each network family
    Generate {
        #[arg(long, value_enum, default_value = "all")]
        family: KeyFamily,
        /// Also write the keys to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write SENDER_PRIVATE_KEY and RECEIVER_ADDRESS to this .env file
        #[arg(long)]
        env: Option<PathBuf>,
        /// Overwrite an existing --env file
        #[arg(long, requires = "env")]
        force: bool,
    },

    /// Show balances (defaults to the configured sender and receiver)
    Balance { addresses: Vec<String> },

    /// Transfer the native asset and wait for confirmation
    Transfer {
        /// Receiver address (overrides RECEIVER_ADDRESS)
        #[arg(long)]
        to: Option<String>,
        /// Amount in base units (overrides TRANSFER_AMOUNT)
        #[arg(long, conflicts_with = "amount_decimal")]
        amount: Option<u128>,
        /// Amount in display units, e.g. 0.001
        #[arg(long)]
        amount_decimal: Option<String>,
        /// Upper bound on the network fee, base units (overrides MAX_FEE)
        #[arg(long)]
        max_fee: Option<u128>,
        /// Print the final report as a JSON line on stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyFamily {
    Solana,
    Evm,
    All,
}

impl KeyFamily {
    fn families(self) -> &'static [ChainFamily] {
        match self {
            Self::Solana => &[ChainFamily::Solana],
            Self::Evm => &[ChainFamily::Evm],
            Self::All => &[ChainFamily::Solana, ChainFamily::Evm],
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A missing .env file is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();
    init_tracing(LogFormat::from_env());

    let cli = Cli::parse();

    let mut overrides = HashMap::new();
    if let Some(network) = &cli.network {
        overrides.insert(config::NETWORK_ENV, network.clone());
    }
    if let Some(endpoint) = &cli.rpc_endpoint {
        overrides.insert(config::RPC_ENDPOINT_ENV, endpoint.clone());
    }

    match cli.command {
        Commands::Generate {
            family,
            output,
            env,
            force,
        } => generate(family, output, env, force),
        Commands::Balance { addresses } => {
            let config = resolve_config(&overrides)?;
            balance(&config, addresses).await
        }
        Commands::Transfer {
            to,
            amount,
            amount_decimal,
            max_fee,
            json,
        } => {
            if let Some(to) = to {
                overrides.insert(config::RECEIVER_ENV, to);
            }
            if let Some(amount) = amount {
                overrides.insert(config::AMOUNT_ENV, amount.to_string());
            }
            if let Some(max_fee) = max_fee {
                overrides.insert(config::MAX_FEE_ENV, max_fee.to_string());
            }
            let config = resolve_config(&overrides)?;
            transfer(&config, amount_decimal, json).await
        }
    }
}

/// Command-line values first, then the environment.
fn resolve_config(overrides: &HashMap<&'static str, String>) -> anyhow::Result<TransferConfig> {
    TransferConfig::from_lookup(|name| {
        overrides
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    })
    .context("Invalid configuration")
}

fn generate(
    family: KeyFamily,
    output: Option<PathBuf>,
    env: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<ExitCode> {
    if env.is_some() && family == KeyFamily::All {
        bail!("--env needs a single --family (solana or evm)");
    }

    let pairs: Vec<WalletPair> = family
        .families()
        .iter()
        .map(|f| generate_wallet_pair(*f))
        .collect();
    let rendered = serde_json::to_string_pretty(&pairs)?;

    if let Some(path) = output {
        std::fs::write(&path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), count = pairs.len(), "Key backup written");
    }

    if let (Some(path), [pair]) = (env, pairs.as_slice()) {
        write_env_file(&path, pair, force)?;
        info!(
            path = %path.display(),
            family = pair.network_family,
            sender = %pair.sender.public_id,
            receiver = %pair.receiver.public_id,
            "Environment file written"
        );
    }

    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}

fn write_env_file(path: &Path, pair: &WalletPair, force: bool) -> anyhow::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options.open(path).with_context(|| {
        format!("Failed to create {} (use --force to overwrite)", path.display())
    })?;
    file.write_all(render_env_file(pair).as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Accounts shown by `balance` when none are given: the sender and receiver
/// that are configured.
fn default_balance_accounts(config: &TransferConfig) -> anyhow::Result<Vec<AccountId>> {
    let mut accounts = Vec::new();
    if config.has_sender_key() {
        let sender = account_from_encoded(config.network.family, &config.sender_key()?)?;
        accounts.push(sender.id);
    }
    if let Some(receiver) = &config.receiver {
        accounts.push(AccountId::from(receiver.as_str()));
    }
    if accounts.is_empty() {
        return Err(ConfigError::Missing(config::SENDER_KEY_ENV).into());
    }
    Ok(accounts)
}

async fn balance(config: &TransferConfig, addresses: Vec<String>) -> anyhow::Result<ExitCode> {
    let network = &config.network;
    let adapter = blockchain::connect(network.clone(), &config.rpc_endpoint)?;

    let accounts: Vec<AccountId> = if addresses.is_empty() {
        default_balance_accounts(config)?
    } else {
        addresses.into_iter().map(AccountId::from).collect()
    };

    let mut failed = false;
    for account in &accounts {
        match adapter.get_balance(account).await {
            Ok(amount) => println!(
                "{account}\t{amount}\t{} {}",
                format_amount(amount, network.decimals),
                network.symbol
            ),
            Err(e) => {
                warn!(address = %account, network = network.slug, error = %e, "Balance query failed");
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn transfer(
    config: &TransferConfig,
    amount_decimal: Option<String>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let network = &config.network;
    let sender = account_from_encoded(network.family, &config.sender_key()?)?;
    let receiver = config.receiver()?;
    let amount = config.amount_with_override(amount_decimal.as_deref())?;

    let mut request = TransferRequest::new(sender, receiver, amount);
    if let Some(max_fee) = config.max_fee {
        request = request.with_max_fee(max_fee);
    }

    info!(
        request_id = %request.request_id(),
        network = network.slug,
        sender = %request.sender().id,
        receiver = %request.receiver(),
        amount = %format_amount(amount, network.decimals),
        symbol = network.symbol,
        "Starting transfer"
    );

    let adapter = blockchain::connect(network.clone(), &config.rpc_endpoint)?;

    let report = match execute(adapter.as_ref(), &request).await {
        Ok(handle) => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            let outcome = ConfirmationPoller::new(config.poller)
                .spawn(adapter.clone(), handle.clone(), cancel)
                .await
                .context("Confirmation poller stopped unexpectedly")?;

            match outcome {
                Ok(outcome) => TransferReport::polled(network, &handle, &outcome),
                Err(e) => TransferReport::errored(network, Some(&handle), &e),
            }
        }
        Err(e) => TransferReport::errored(network, None, &e),
    };

    let mut reporter: Box<dyn Reporter> = if json {
        Box::new(JsonReporter::new(std::io::stdout()))
    } else {
        Box::new(LogReporter)
    };
    reporter.report(&report)?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
