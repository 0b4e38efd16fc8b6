pub mod client;
pub mod fetcher;
pub mod filter;
pub mod history;
pub mod models;
pub mod paginator;

// Re-exports for convenience
pub use client::{ClientError, LedgerClient, SolanaClient};
pub use filter::filter_logs;
pub use history::{HistoryScan, ScanError, ScanOptions, ScanStats};
pub use paginator::{next_page, Page, SignaturePaginator};
