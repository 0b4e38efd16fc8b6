pub mod builder;
pub mod signer;
pub mod submitter;

use crate::blockchain::client::{LedgerClient, SubmitOptions};
use crate::models::TransferIntent;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use builder::{build, derive_associated_account, BuildError, UnsignedTransaction};
pub use signer::{keypair_resolver, sign, SignError, SignedTransaction};
pub use submitter::{submit, SubmitError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("sign error: {0}")]
    Sign(#[from] SignError),

    #[error("send error: {0}")]
    Submit(#[from] SubmitError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub signature: Signature,
    pub source_account: Pubkey,
    pub destination_account: Pubkey,
    pub amount: u64,
}

/// Move `amount` of `mint` from the sender's token account to the destination owner's.
///
/// The sender pays the fee and is the only signer. Nothing is sent unless the
/// transaction is fully signed and `cancel` has not fired.
pub async fn transfer_tokens<C>(
    client: &C,
    sender: &Keypair,
    destination: &Pubkey,
    mint: &Pubkey,
    amount: u64,
    options: SubmitOptions,
    cancel: &CancellationToken,
) -> Result<TransferReceipt, TransferError>
where
    C: LedgerClient + ?Sized,
{
    let payer = sender.pubkey();
    let intent = TransferIntent {
        source: payer,
        destination: *destination,
        mint: *mint,
        amount,
    };

    let unsigned = build(client, &intent, &payer, cancel).await?;
    let source_account = unsigned.source_account;
    let destination_account = unsigned.destination_account;

    let signed = sign(unsigned, |key| (*key == payer).then_some(sender))?;
    let signature = submit(client, &signed, options, cancel).await?;

    info!(
        "Transferred {} of {} from {} to {}: {}",
        amount, mint, source_account, destination_account, signature
    );

    Ok(TransferReceipt {
        signature,
        source_account,
        destination_account,
        amount,
    })
}
