// Configuration for both pipelines:
// - RPC endpoint URL, timeout and read commitment
// - History scan settings (address, page size, fetch delay, log marker, limit)
// - Transfer settings (sender key, destination, mint, amount, preflight)
//
// Values come from the environment (and an optional .env file) and are
// validated once, up front, so malformed input fails before any RPC call.

use crate::blockchain::paginator::MAX_PAGE_SIZE;
use crate::validation::{parse_address, parse_keypair, ValidationError};
use dotenv::dotenv;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_LOG_MARKER: &str = "InitializeMint2";
pub const DEFAULT_TRANSFER_AMOUNT: u64 = 1_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Invalid {var}: {source}")]
    Validation {
        var: &'static str,
        #[source]
        source: ValidationError,
    },
}

/// Base58 secret kept out of Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn to_keypair(&self) -> Result<Keypair, ValidationError> {
        parse_keypair(&self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    pub rpc_timeout: Duration,
    /// Commitment used for listing and fetching history.
    pub commitment: CommitmentConfig,
    pub scan_address: Option<Pubkey>,
    pub page_size: usize,
    /// Minimum spacing between two transaction fetches.
    pub fetch_delay: Duration,
    pub log_marker: String,
    pub max_records: Option<usize>,
    pub sender_key: Option<SecretKey>,
    pub destination: Option<Pubkey>,
    pub token_mint: Option<Pubkey>,
    pub transfer_amount: u64,
    pub skip_preflight: bool,
    pub preflight_commitment: CommitmentConfig,
}

/// The subset of [`Config`] the transfer command needs, all present.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub sender_key: SecretKey,
    pub destination: Pubkey,
    pub token_mint: Pubkey,
    pub amount: u64,
    pub skip_preflight: bool,
    pub preflight_commitment: CommitmentConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let solana_rpc_url = var("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        if !(solana_rpc_url.starts_with("http://") || solana_rpc_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: "SOLANA_RPC_URL",
                reason: format!("expected an http(s) URL, got {}", solana_rpc_url),
            });
        }

        let rpc_timeout = Duration::from_secs(parse_or(var("RPC_TIMEOUT_SECS"), "RPC_TIMEOUT_SECS", 30)?);

        let commitment = match var("SOLANA_COMMITMENT_LEVEL") {
            Some(level) => parse_commitment("SOLANA_COMMITMENT_LEVEL", &level)?,
            None => CommitmentConfig::confirmed(),
        };
        // Signature listing is only served at confirmed or finalized
        if commitment == CommitmentConfig::processed() {
            return Err(ConfigError::InvalidValue {
                var: "SOLANA_COMMITMENT_LEVEL",
                reason: "history requires confirmed or finalized".to_string(),
            });
        }

        let scan_address = var("SCAN_ADDRESS")
            .map(|a| parse_address(&a))
            .transpose()
            .map_err(|source| ConfigError::Validation { var: "SCAN_ADDRESS", source })?;

        let page_size = check_page_size(
            "SCAN_PAGE_SIZE",
            parse_or(var("SCAN_PAGE_SIZE"), "SCAN_PAGE_SIZE", MAX_PAGE_SIZE)?,
        )?;

        let fetch_delay = Duration::from_millis(parse_or(var("FETCH_DELAY_MS"), "FETCH_DELAY_MS", 10)?);

        let log_marker = var("LOG_MARKER").unwrap_or_else(|| DEFAULT_LOG_MARKER.to_string());

        let max_records = var("SCAN_MAX_RECORDS")
            .map(|v| parse_value::<usize>("SCAN_MAX_RECORDS", &v))
            .transpose()?;

        let destination = var("SOLANA_TO_PUBLIC_KEY")
            .map(|a| parse_address(&a))
            .transpose()
            .map_err(|source| ConfigError::Validation { var: "SOLANA_TO_PUBLIC_KEY", source })?;

        let token_mint = var("SPL_TOKEN_MINT")
            .map(|a| parse_address(&a))
            .transpose()
            .map_err(|source| ConfigError::Validation { var: "SPL_TOKEN_MINT", source })?;

        let transfer_amount = parse_or(var("TRANSFER_AMOUNT"), "TRANSFER_AMOUNT", DEFAULT_TRANSFER_AMOUNT)?;
        let skip_preflight = parse_or(var("SKIP_PREFLIGHT"), "SKIP_PREFLIGHT", false)?;
        let preflight_commitment = match var("PREFLIGHT_COMMITMENT") {
            Some(level) => parse_commitment("PREFLIGHT_COMMITMENT", &level)?,
            None => CommitmentConfig::finalized(),
        };

        Ok(Self {
            solana_rpc_url,
            rpc_timeout,
            commitment,
            scan_address,
            page_size,
            fetch_delay,
            log_marker,
            max_records,
            sender_key: var("SOLANA_FROM_PRIVATE_KEY").map(SecretKey::new),
            destination,
            token_mint,
            transfer_amount,
            skip_preflight,
            preflight_commitment,
        })
    }

    /// Transfer settings, failing on the first one that is missing.
    pub fn transfer(&self) -> Result<TransferConfig, ConfigError> {
        Ok(TransferConfig {
            sender_key: self
                .sender_key
                .clone()
                .ok_or(ConfigError::MissingVar("SOLANA_FROM_PRIVATE_KEY"))?,
            destination: self.destination.ok_or(ConfigError::MissingVar("SOLANA_TO_PUBLIC_KEY"))?,
            token_mint: self.token_mint.ok_or(ConfigError::MissingVar("SPL_TOKEN_MINT"))?,
            amount: self.transfer_amount,
            skip_preflight: self.skip_preflight,
            preflight_commitment: self.preflight_commitment,
        })
    }
}

/// Page sizes outside what the node serves are rejected rather than clamped.
pub fn check_page_size(var: &'static str, page_size: usize) -> Result<usize, ConfigError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::InvalidValue {
            var,
            reason: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, page_size),
        });
    }
    Ok(page_size)
}

pub fn parse_commitment(var: &'static str, level: &str) -> Result<CommitmentConfig, ConfigError> {
    match level.trim().to_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(ConfigError::InvalidValue {
            var,
            reason: format!("unknown commitment level {}", other),
        }),
    }
}

fn parse_value<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
    })
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(v) => parse_value(var, &v),
        None => Ok(default),
    }
}
