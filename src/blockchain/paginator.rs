//! Backward walk over an account's signature index.

use crate::blockchain::client::{ClientError, LedgerClient, ListSignaturesOptions};
use crate::models::SignatureListEntry;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{debug, warn};

/// Largest page a node will return for `getSignaturesForAddress`.
pub const MAX_PAGE_SIZE: usize = 1000;

/// One page of the index, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<SignatureListEntry>,
    /// Oldest signature seen so far; the `before` value for the next request.
    pub cursor: Option<Signature>,
    /// No more history after this page.
    pub done: bool,
}

/// Request the page of signatures older than `cursor` (or the newest page).
///
/// A short or empty page ends the history. Errors are returned as-is: there is
/// no retry here.
pub async fn next_page<C>(
    client: &C,
    address: &Pubkey,
    cursor: Option<Signature>,
    page_size: usize,
    commitment: CommitmentConfig,
) -> Result<Page, ClientError>
where
    C: LedgerClient + ?Sized,
{
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

    let entries = client
        .list_signatures(
            address,
            ListSignaturesOptions {
                limit: page_size,
                before: cursor,
                commitment,
            },
        )
        .await?;

    let done = entries.len() < page_size;
    let cursor = entries.last().map(|e| e.signature).or(cursor);

    Ok(Page { entries, cursor, done })
}

/// Cursor-owning wrapper around [`next_page`] for a single scan.
#[derive(Debug)]
pub struct SignaturePaginator {
    address: Pubkey,
    page_size: usize,
    commitment: CommitmentConfig,
    cursor: Option<Signature>,
    done: bool,
}

impl SignaturePaginator {
    pub fn new(address: Pubkey, page_size: usize, commitment: CommitmentConfig) -> Self {
        Self {
            address,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            commitment,
            cursor: None,
            done: false,
        }
    }

    pub fn cursor(&self) -> Option<Signature> {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page. Once done, returns an empty page without calling the node.
    pub async fn next_page<C>(&mut self, client: &C) -> Result<Page, ClientError>
    where
        C: LedgerClient + ?Sized,
    {
        if self.done {
            return Ok(Page {
                entries: Vec::new(),
                cursor: self.cursor,
                done: true,
            });
        }

        let sent = self.cursor;
        let mut page = next_page(client, &self.address, sent, self.page_size, self.commitment).await?;

        // The cursor must move backward every time or we would ask for the same page again
        if !page.done && sent.is_some() && page.cursor == sent {
            warn!(
                "Node returned a page ending at cursor {} for {}; stopping",
                sent.map(|s| s.to_string()).unwrap_or_default(),
                self.address
            );
            page.done = true;
        }

        debug!(
            "Page for {}: {} entries, done={}",
            self.address,
            page.entries.len(),
            page.done
        );

        self.cursor = page.cursor;
        self.done = page.done;
        Ok(page)
    }
}
