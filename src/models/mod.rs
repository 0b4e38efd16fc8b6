// Domain records shared by the read and write pipelines.
// Everything here is plain data: decoded from the node or supplied by the caller.

use serde::Serialize;
use serde_json::Value;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// One entry of an account's signature index, as listed by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureListEntry {
    #[serde(serialize_with = "display")]
    pub signature: Signature,
    pub slot: u64,
    pub err: Option<String>,
    pub block_time: Option<i64>,
    pub memo: Option<String>,
}

impl SignatureListEntry {
    pub fn new(signature: Signature, slot: u64) -> Self {
        Self {
            signature,
            slot,
            err: None,
            block_time: None,
            memo: None,
        }
    }
}

/// A fully resolved transaction with its status metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    #[serde(serialize_with = "display")]
    pub signature: Signature,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub success: bool,
    pub error: Option<String>,
    pub fee: u64,
    pub log_messages: Vec<String>,
    pub instructions: Option<Vec<DecodedInstruction>>,
    pub version: Option<String>,
}

impl TransactionRecord {
    /// Human readable status, `ok` or `err:<reason>`.
    pub fn status(&self) -> String {
        match &self.error {
            Some(err) => format!("err:{}", err),
            None => "ok".to_string(),
        }
    }
}

/// Instruction as decoded by the node's `jsonParsed` encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedInstruction {
    pub program_id: Option<String>,
    /// Program name when the node knows it (`spl-token`, `system`, ...)
    pub program: Option<String>,
    /// Parsed instruction type, e.g. `transfer` or `initializeMint2`
    pub instruction_type: Option<String>,
    pub info: Option<Value>,
}

/// A log line that contained the scanned marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogMatch {
    #[serde(serialize_with = "display")]
    pub signature: Signature,
    pub slot: u64,
    pub line_index: usize,
    pub line: String,
}

/// A caller's request to move tokens between two owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    /// Owner of the source token account; must sign.
    pub source: Pubkey,
    /// Owner of the destination token account.
    pub destination: Pubkey,
    pub mint: Pubkey,
    /// Amount in the token's smallest unit.
    pub amount: u64,
}

/// Recent blockhash plus the last block height at which it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

fn display<T: std::fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
