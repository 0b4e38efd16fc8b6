use crate::blockchain::models::decode_transaction;
use crate::config::Config;
use crate::models::{Anchor, SignatureListEntry, TransactionRecord};
use async_trait::async_trait;
use serde_json::{json, Value};
use solana_client::client_error::{ClientError as SolanaClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_client::rpc_request::{RpcError, RpcRequest, RpcResponseErrorData};
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Node error codes meaning the transaction's block is no longer (or not yet) served.
const BLOCK_NOT_AVAILABLE: i64 = -32004;
const SLOT_SKIPPED: i64 = -32007;
const LONG_TERM_STORAGE_SLOT_SKIPPED: i64 = -32009;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No usable response from the node (connection, timeout, HTTP failure).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        logs: Vec<String>,
    },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<SolanaClientError> for ClientError {
    fn from(err: SolanaClientError) -> Self {
        match err.kind() {
            ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, data }) => {
                let logs = match data {
                    RpcResponseErrorData::SendTransactionPreflightFailure(result) => {
                        result.logs.clone().unwrap_or_default()
                    }
                    _ => Vec::new(),
                };
                ClientError::Rpc {
                    code: *code,
                    message: message.clone(),
                    logs,
                }
            }
            ClientErrorKind::RpcError(RpcError::RpcRequestError(msg)) => ClientError::Transport(msg.clone()),
            ClientErrorKind::RpcError(RpcError::ParseError(msg)) => ClientError::Decode(msg.clone()),
            ClientErrorKind::RpcError(RpcError::ForUser(msg)) => ClientError::Decode(msg.clone()),
            ClientErrorKind::SerdeJson(e) => ClientError::Decode(e.to_string()),
            ClientErrorKind::TransactionError(e) => ClientError::Transaction(e.to_string()),
            _ => ClientError::Transport(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListSignaturesOptions {
    pub limit: usize,
    /// Only return signatures older than this one.
    pub before: Option<Signature>,
    pub commitment: CommitmentConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct GetTransactionOptions {
    pub commitment: CommitmentConfig,
    pub max_supported_version: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct SubmitOptions {
    pub skip_preflight: bool,
    pub preflight_commitment: CommitmentConfig,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            preflight_commitment: CommitmentConfig::finalized(),
        }
    }
}

/// The operations this service needs from a ledger node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Signatures involving `address`, newest first.
    async fn list_signatures(
        &self,
        address: &Pubkey,
        options: ListSignaturesOptions,
    ) -> Result<Vec<SignatureListEntry>, ClientError>;

    /// The decoded transaction, or `None` when the node does not have it.
    async fn get_transaction(
        &self,
        signature: &Signature,
        options: GetTransactionOptions,
    ) -> Result<Option<TransactionRecord>, ClientError>;

    async fn get_latest_anchor(&self, commitment: CommitmentConfig) -> Result<Anchor, ClientError>;

    async fn submit_transaction(
        &self,
        transaction: &Transaction,
        options: SubmitOptions,
    ) -> Result<Signature, ClientError>;
}

pub struct SolanaClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaClient {
    pub fn new(config: &Config) -> Self {
        let rpc_url = &config.solana_rpc_url;

        info!(
            "Initializing Solana client with RPC endpoint: {}, commitment: {:?}",
            rpc_url, config.commitment.commitment
        );

        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.clone(),
            config.rpc_timeout,
            config.commitment,
        );

        Self {
            rpc_client,
            commitment: config.commitment,
        }
    }

    /// Get the current slot
    pub async fn get_slot(&self) -> Result<u64, ClientError> {
        let slot = self.rpc_client.get_slot_with_commitment(self.commitment).await?;
        Ok(slot)
    }

    /// Raw `jsonParsed` payload for a signature, as the node returns it.
    pub async fn get_transaction_json(&self, signature: &Signature) -> Result<Option<Value>, ClientError> {
        let params = json!([
            signature.to_string(),
            {
                "encoding": "jsonParsed",
                "commitment": self.commitment.commitment,
                "maxSupportedTransactionVersion": 0,
            }
        ]);

        match self.rpc_client.send::<Option<Value>>(RpcRequest::GetTransaction, params).await {
            Ok(value) => Ok(value),
            Err(e) => not_found_as_none(e.into()),
        }
    }
}

#[async_trait]
impl LedgerClient for SolanaClient {
    async fn list_signatures(
        &self,
        address: &Pubkey,
        options: ListSignaturesOptions,
    ) -> Result<Vec<SignatureListEntry>, ClientError> {
        let statuses = self
            .rpc_client
            .get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    before: options.before,
                    until: None,
                    limit: Some(options.limit),
                    commitment: Some(options.commitment),
                },
            )
            .await?;

        debug!("Listed {} signatures for {}", statuses.len(), address);

        statuses.into_iter().map(list_entry).collect()
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
        options: GetTransactionOptions,
    ) -> Result<Option<TransactionRecord>, ClientError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(options.commitment),
            max_supported_transaction_version: options.max_supported_version,
        };

        // `send` with an Option target so a null result is not a decode failure
        let response = self
            .rpc_client
            .send::<Option<EncodedConfirmedTransactionWithStatusMeta>>(
                RpcRequest::GetTransaction,
                json!([signature.to_string(), config]),
            )
            .await;

        match response {
            Ok(Some(tx)) => decode_transaction(signature, &tx).map(Some),
            Ok(None) => Ok(None),
            Err(e) => not_found_as_none(e.into()),
        }
    }

    async fn get_latest_anchor(&self, commitment: CommitmentConfig) -> Result<Anchor, ClientError> {
        let (blockhash, last_valid_block_height) =
            self.rpc_client.get_latest_blockhash_with_commitment(commitment).await?;

        Ok(Anchor {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn submit_transaction(
        &self,
        transaction: &Transaction,
        options: SubmitOptions,
    ) -> Result<Signature, ClientError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(options.preflight_commitment.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSendTransactionConfig::default()
        };

        let signature = self.rpc_client.send_transaction_with_config(transaction, config).await?;
        Ok(signature)
    }
}

fn list_entry(status: RpcConfirmedTransactionStatusWithSignature) -> Result<SignatureListEntry, ClientError> {
    let signature = Signature::from_str(&status.signature)
        .map_err(|_| ClientError::Decode(format!("invalid signature in listing: {}", status.signature)))?;

    Ok(SignatureListEntry {
        signature,
        slot: status.slot,
        err: status.err.map(|e| format!("{:?}", e)),
        block_time: status.block_time,
        memo: status.memo,
    })
}

/// Pruned or skipped slots are reported as errors by the node; treat them as absent.
pub(crate) fn not_found_as_none<T>(err: ClientError) -> Result<Option<T>, ClientError> {
    match err {
        ClientError::Rpc { code, .. }
            if matches!(code, BLOCK_NOT_AVAILABLE | SLOT_SKIPPED | LONG_TERM_STORAGE_SLOT_SKIPPED) =>
        {
            Ok(None)
        }
        other => Err(other),
    }
}
