use bs58;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid Solana address format: {0}")]
    InvalidSolanaAddress(String),

    #[error("Address looks like an Ethereum address: {0}. Use a base58 Solana address")]
    ForeignAddress(String),

    #[error("Invalid transaction signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),
}

pub fn validate_solana_address(address: &str) -> Result<(), ValidationError> {
    parse_address(address).map(|_| ())
}

/// Parse a base58 account address, rejecting anything that is not 32 bytes.
pub fn parse_address(address: &str) -> Result<Pubkey, ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    if address.starts_with("0x") {
        return Err(ValidationError::ForeignAddress(address.to_string()));
    }

    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|_| ValidationError::InvalidSolanaAddress(address.to_string()))?;

    // Solana addresses are 32 bytes
    let bytes: [u8; 32] = decoded
        .try_into()
        .map_err(|_| ValidationError::InvalidSolanaAddress(address.to_string()))?;

    Ok(Pubkey::new_from_array(bytes))
}

pub fn parse_signature(signature: &str) -> Result<Signature, ValidationError> {
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(ValidationError::MissingParameter("signature".to_string()));
    }

    let decoded = bs58::decode(signature)
        .into_vec()
        .map_err(|_| ValidationError::InvalidSignature(signature.to_string()))?;

    let bytes: [u8; 64] = decoded
        .try_into()
        .map_err(|_| ValidationError::InvalidSignature(signature.to_string()))?;

    Ok(Signature::from(bytes))
}

/// Parse a base58 encoded 64 byte keypair (secret followed by public half).
pub fn parse_keypair(encoded: &str) -> Result<Keypair, ValidationError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ValidationError::MissingParameter("private key".to_string()));
    }

    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| ValidationError::InvalidKeypair("not valid base58".to_string()))?;

    if decoded.len() != 64 {
        return Err(ValidationError::InvalidKeypair(format!(
            "expected 64 bytes, got {}",
            decoded.len()
        )));
    }

    #[allow(deprecated)]
    let keypair = Keypair::from_bytes(&decoded)
        .map_err(|e| ValidationError::InvalidKeypair(e.to_string()))?;

    // from_bytes accepts a public half that does not belong to the secret
    if keypair.pubkey().to_bytes()[..] != decoded[32..] {
        return Err(ValidationError::InvalidKeypair(
            "public key does not match secret key".to_string(),
        ));
    }

    Ok(keypair)
}
