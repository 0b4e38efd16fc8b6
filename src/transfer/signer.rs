use crate::transfer::builder::UnsignedTransaction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignError {
    #[error("No key available for required signer {0}")]
    MissingSigner(Pubkey),

    #[error("Key resolved for {expected} belongs to {actual}")]
    KeyMismatch { expected: Pubkey, actual: Pubkey },

    #[error("Signature for {0} failed verification")]
    InvalidSignature(Pubkey),
}

/// A transaction carrying a verified signature for every required signer.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    transaction: Transaction,
    last_valid_block_height: u64,
}

impl SignedTransaction {
    /// The fee payer's signature, which is also the transaction id.
    pub fn signature(&self) -> Signature {
        self.transaction.signatures[0]
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn last_valid_block_height(&self) -> u64 {
        self.last_valid_block_height
    }
}

/// Sign with the keys `resolve` hands out for each required signer.
pub fn sign<'k, F>(unsigned: UnsignedTransaction, resolve: F) -> Result<SignedTransaction, SignError>
where
    F: Fn(&Pubkey) -> Option<&'k Keypair>,
{
    let message_data = unsigned.message.serialize();
    let required = unsigned.required_signers();

    let mut signatures = Vec::with_capacity(required.len());
    for key in required {
        let keypair = resolve(key).ok_or(SignError::MissingSigner(*key))?;
        if keypair.pubkey() != *key {
            return Err(SignError::KeyMismatch {
                expected: *key,
                actual: keypair.pubkey(),
            });
        }

        let signature = keypair.sign_message(&message_data);
        if !signature.verify(key.as_ref(), &message_data) {
            return Err(SignError::InvalidSignature(*key));
        }
        signatures.push(signature);
    }

    Ok(SignedTransaction {
        transaction: Transaction {
            signatures,
            message: unsigned.message,
        },
        last_valid_block_height: unsigned.last_valid_block_height,
    })
}

/// Resolver over a fixed set of keypairs.
pub fn keypair_resolver<'k>(keypairs: &'k [&'k Keypair]) -> impl Fn(&Pubkey) -> Option<&'k Keypair> + 'k {
    move |key| keypairs.iter().copied().find(|kp| kp.pubkey() == *key)
}
