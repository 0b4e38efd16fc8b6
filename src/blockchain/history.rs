//! Lazy, pull-based walk over an account's transaction history.
//!
//! [`HistoryScan`] pages through the signature index newest to oldest and
//! resolves each signature to a [`TransactionRecord`]. Records the node no
//! longer has, and records that fail to load, are skipped; a failure to list
//! signatures ends the scan. Consumers either pull with
//! [`HistoryScan::next_record`] or compose the [`Stream`] from
//! [`HistoryScan::into_stream`].

use crate::blockchain::client::{ClientError, LedgerClient};
use crate::blockchain::fetcher::TransactionFetcher;
use crate::blockchain::filter::filter_logs;
use crate::blockchain::paginator::SignaturePaginator;
use crate::config::Config;
use crate::models::{LogMatch, SignatureListEntry, TransactionRecord};
use futures::stream::{self, Stream, TryStreamExt};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Listing signatures for {address} failed: {source}")]
    Listing {
        address: Pubkey,
        #[source]
        source: ClientError,
    },

    #[error("Scan cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub page_size: usize,
    pub commitment: CommitmentConfig,
    pub fetch_delay: Duration,
    /// Stop after this many records have been yielded.
    pub max_records: Option<usize>,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            commitment: config.commitment,
            fetch_delay: config.fetch_delay,
            max_records: config.max_records,
        }
    }
}

/// Counters for one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub pages: usize,
    pub listed: usize,
    pub fetched: usize,
    pub absent: usize,
    pub failed: usize,
}

pub struct HistoryScan<'a, C: ?Sized> {
    client: &'a C,
    address: Pubkey,
    paginator: SignaturePaginator,
    fetcher: TransactionFetcher,
    pending: VecDeque<SignatureListEntry>,
    cancel: CancellationToken,
    max_records: Option<usize>,
    stats: ScanStats,
    finished: bool,
}

impl<'a, C> HistoryScan<'a, C>
where
    C: LedgerClient + ?Sized,
{
    pub fn new(client: &'a C, address: Pubkey, options: &ScanOptions, cancel: CancellationToken) -> Self {
        Self {
            client,
            address,
            paginator: SignaturePaginator::new(address, options.page_size, options.commitment),
            fetcher: TransactionFetcher::new(options.commitment, options.fetch_delay),
            pending: VecDeque::new(),
            cancel,
            max_records: options.max_records,
            stats: ScanStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// The next record in newest-to-oldest order, or `None` when history is exhausted.
    ///
    /// After an error is returned the scan is over and every later call yields `None`.
    pub async fn next_record(&mut self) -> Option<Result<TransactionRecord, ScanError>> {
        loop {
            if self.finished {
                return None;
            }

            if self.max_records.is_some_and(|limit| self.stats.fetched >= limit) {
                debug!("Record limit reached for {}", self.address);
                self.finish();
                return None;
            }

            let entry = match self.pending.pop_front() {
                Some(entry) => entry,
                None => {
                    if self.paginator.is_done() {
                        self.finish();
                        return None;
                    }
                    if self.cancel.is_cancelled() {
                        return Some(Err(self.cancelled()));
                    }

                    match self.paginator.next_page(self.client).await {
                        Ok(page) => {
                            self.stats.pages += 1;
                            self.stats.listed += page.entries.len();
                            self.pending.extend(page.entries);
                            continue;
                        }
                        Err(source) => {
                            error!("Error listing signatures for {}: {}", self.address, source);
                            self.finished = true;
                            return Some(Err(ScanError::Listing {
                                address: self.address,
                                source,
                            }));
                        }
                    }
                }
            };

            if self.cancel.is_cancelled() {
                return Some(Err(self.cancelled()));
            }

            match self.fetcher.fetch(self.client, &entry.signature).await {
                Ok(Some(record)) => {
                    self.stats.fetched += 1;
                    return Some(Ok(record));
                }
                Ok(None) => self.stats.absent += 1,
                Err(e) => {
                    self.stats.failed += 1;
                    warn!("Failed to get transaction {}: {}", entry.signature, e);
                }
            }
        }
    }

    /// Consume the scan as a stream. Not restartable.
    pub fn into_stream(self) -> impl Stream<Item = Result<TransactionRecord, ScanError>> + 'a
    where
        C: 'a,
    {
        stream::unfold(self, |mut scan| async move {
            let item = scan.next_record().await?;
            Some((item, scan))
        })
    }

    fn cancelled(&mut self) -> ScanError {
        info!("Scan of {} cancelled after {} records", self.address, self.stats.fetched);
        self.finished = true;
        ScanError::Cancelled
    }

    fn finish(&mut self) {
        self.finished = true;
        let s = self.stats;
        info!(
            "Scan of {} finished: {} pages, {} signatures, {} records, {} absent, {} failed",
            self.address, s.pages, s.listed, s.fetched, s.absent, s.failed
        );
    }
}

/// Flatten a record stream into the log lines matching `marker`.
pub fn log_matches<'a, S>(records: S, marker: &'a str) -> impl Stream<Item = Result<LogMatch, ScanError>> + 'a
where
    S: Stream<Item = Result<TransactionRecord, ScanError>> + 'a,
{
    records
        .map_ok(move |record| stream::iter(filter_logs(&record, marker).into_iter().map(Ok::<LogMatch, ScanError>)))
        .try_flatten()
}

/// Collect every match for `marker` in the account's history.
pub async fn find_log_matches<C>(
    client: &C,
    address: Pubkey,
    options: &ScanOptions,
    marker: &str,
    cancel: CancellationToken,
) -> Result<(Vec<LogMatch>, ScanStats), ScanError>
where
    C: LedgerClient + ?Sized,
{
    let mut scan = HistoryScan::new(client, address, options, cancel);
    let mut matches = Vec::new();

    while let Some(record) = scan.next_record().await {
        matches.extend(filter_logs(&record?, marker));
    }

    Ok((matches, scan.stats()))
}
