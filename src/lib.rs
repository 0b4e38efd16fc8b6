pub mod blockchain;
pub mod config;
pub mod models;
pub mod transfer;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use blockchain::{filter_logs, ClientError, HistoryScan, LedgerClient, ScanError, ScanOptions, SolanaClient};
pub use config::{Config, ConfigError};
pub use models::{LogMatch, SignatureListEntry, TransactionRecord, TransferIntent};
pub use transfer::{transfer_tokens, TransferError, TransferReceipt};
pub use validation::{parse_address, parse_keypair, parse_signature, validate_solana_address};
