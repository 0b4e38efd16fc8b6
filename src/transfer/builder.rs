use crate::blockchain::client::{ClientError, LedgerClient};
use crate::models::{Anchor, TransferIntent};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Program that owns associated token account derivation.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Failed to fetch recent blockhash: {0}")]
    Anchor(#[source] ClientError),

    #[error("Failed to build transfer instruction: {0}")]
    Instruction(String),

    #[error("Transfer cancelled before the transaction was built")]
    Cancelled,
}

/// A compiled transfer message waiting for signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    pub message: Message,
    /// Last block height at which the message's blockhash is accepted.
    pub last_valid_block_height: u64,
    pub source_account: Pubkey,
    pub destination_account: Pubkey,
}

impl UnsignedTransaction {
    /// Keys that must sign, fee payer first.
    pub fn required_signers(&self) -> &[Pubkey] {
        let count = self.message.header.num_required_signatures as usize;
        &self.message.account_keys[..count.min(self.message.account_keys.len())]
    }
}

/// Associated token account of `owner` for `mint`.
///
/// The address is the program derived address of `[owner, token program, mint]`
/// so it never needs an on-chain lookup.
pub fn derive_associated_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let seeds = &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()];
    let (address, _bump) = Pubkey::find_program_address(seeds, &ASSOCIATED_TOKEN_PROGRAM_ID);
    address
}

/// Fetch a finalized blockhash and assemble the transfer.
pub async fn build<C>(
    client: &C,
    intent: &TransferIntent,
    payer: &Pubkey,
    cancel: &CancellationToken,
) -> Result<UnsignedTransaction, BuildError>
where
    C: LedgerClient + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // Blockhashes expire quickly, so fetch right before assembling
    let anchor = client
        .get_latest_anchor(CommitmentConfig::finalized())
        .await
        .map_err(BuildError::Anchor)?;

    debug!(
        "Using blockhash {} (valid until height {})",
        anchor.blockhash, anchor.last_valid_block_height
    );

    assemble(intent, payer, &anchor)
}

/// Build the unsigned transfer against a known anchor.
pub fn assemble(intent: &TransferIntent, payer: &Pubkey, anchor: &Anchor) -> Result<UnsignedTransaction, BuildError> {
    let source_account = derive_associated_account(&intent.source, &intent.mint);
    let destination_account = derive_associated_account(&intent.destination, &intent.mint);

    let instruction = spl_token::instruction::transfer(
        &spl_token::ID,
        &source_account,
        &destination_account,
        &intent.source,
        &[],
        intent.amount,
    )
    .map_err(|e| BuildError::Instruction(e.to_string()))?;

    let message = Message::new_with_blockhash(&[instruction], Some(payer), &anchor.blockhash);

    Ok(UnsignedTransaction {
        message,
        last_valid_block_height: anchor.last_valid_block_height,
        source_account,
        destination_account,
    })
}
