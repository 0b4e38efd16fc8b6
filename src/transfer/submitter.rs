use crate::blockchain::client::{ClientError, LedgerClient, SubmitOptions};
use crate::transfer::signer::SignedTransaction;
use solana_sdk::signature::Signature;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The node received the transaction and refused it.
    #[error("Node rejected transaction: {message}")]
    Rejected {
        code: Option<i64>,
        message: String,
        logs: Vec<String>,
    },

    /// No usable answer; the transaction may or may not have landed.
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Transfer cancelled before submission")]
    Cancelled,
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rpc { code, message, logs } => SubmitError::Rejected {
                code: Some(code),
                message,
                logs,
            },
            ClientError::Transaction(message) => SubmitError::Rejected {
                code: None,
                message,
                logs: Vec::new(),
            },
            ClientError::Transport(msg) => SubmitError::Transport(msg),
            ClientError::Decode(msg) => SubmitError::Transport(format!("unreadable response: {}", msg)),
        }
    }
}

impl SubmitError {
    /// Whether sending again could reasonably succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, SubmitError::Transport(_))
    }
}

/// Send a signed transaction once. Rejections are never retried.
pub async fn submit<C>(
    client: &C,
    signed: &SignedTransaction,
    options: SubmitOptions,
    cancel: &CancellationToken,
) -> Result<Signature, SubmitError>
where
    C: LedgerClient + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(SubmitError::Cancelled);
    }

    info!(
        "Submitting transaction {} (skip_preflight={}, preflight={:?})",
        signed.signature(),
        options.skip_preflight,
        options.preflight_commitment.commitment
    );

    match client.submit_transaction(signed.transaction(), options).await {
        Ok(signature) => Ok(signature),
        Err(e) => {
            let err = SubmitError::from(e);
            match &err {
                SubmitError::Rejected { code, message, logs } => {
                    error!("RPC rejected transaction ({:?}): {}", code, message);
                    for line in logs {
                        warn!("  preflight log: {}", line);
                    }
                }
                other => error!("Failed to submit transaction: {}", other),
            }
            Err(err)
        }
    }
}
