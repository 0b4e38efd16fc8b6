use crate::blockchain::client::{ClientError, GetTransactionOptions, LedgerClient};
use crate::models::TransactionRecord;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use std::time::Duration;
use tracing::debug;

/// Highest transaction version we ask the node to return (legacy and v0).
pub const MAX_SUPPORTED_TRANSACTION_VERSION: u8 = 0;

/// Resolves signatures to records, spacing requests by a minimum delay.
pub struct TransactionFetcher {
    commitment: CommitmentConfig,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl TransactionFetcher {
    pub fn new(commitment: CommitmentConfig, min_delay: Duration) -> Self {
        // One cell per period with no burst: consecutive fetches are at least `min_delay` apart
        let limiter = Quota::with_period(min_delay).map(RateLimiter::direct);

        Self { commitment, limiter }
    }

    /// Fetch a record. `Ok(None)` means the node does not have it, which is not an error.
    pub async fn fetch<C>(&self, client: &C, signature: &Signature) -> Result<Option<TransactionRecord>, ClientError>
    where
        C: LedgerClient + ?Sized,
    {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let record = client
            .get_transaction(
                signature,
                GetTransactionOptions {
                    commitment: self.commitment,
                    max_supported_version: Some(MAX_SUPPORTED_TRANSACTION_VERSION),
                },
            )
            .await?;

        if record.is_none() {
            debug!("Transaction {} not found (maybe too old or pruned)", signature);
        }

        Ok(record)
    }
}
