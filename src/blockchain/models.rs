use crate::blockchain::client::ClientError;
use crate::models::{DecodedInstruction, TransactionRecord};
use serde_json::Value;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInstruction, UiMessage,
};
use tracing::warn;

/// Convert a node transaction payload into our record model
pub fn decode_transaction(
    signature: &Signature,
    tx_data: &EncodedConfirmedTransactionWithStatusMeta,
) -> Result<TransactionRecord, ClientError> {
    let transaction_with_meta = &tx_data.transaction;

    let meta = transaction_with_meta.meta.as_ref().ok_or_else(|| {
        ClientError::Decode(format!("transaction {} has no status metadata", signature))
    })?;

    let log_messages = match &meta.log_messages {
        OptionSerializer::Some(logs) => logs.clone(),
        _ => Vec::new(),
    };

    let error = meta.err.as_ref().map(|e| format!("{:?}", e));

    let instructions = match &transaction_with_meta.transaction {
        EncodedTransaction::Json(tx) => Some(decode_instructions(&tx.message)),
        _ => {
            warn!("Transaction {} is not JSON encoded, instructions unavailable", signature);
            None
        }
    };

    let version = transaction_with_meta
        .version
        .as_ref()
        .and_then(|v| serde_json::to_value(v).ok())
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        });

    Ok(TransactionRecord {
        signature: *signature,
        slot: tx_data.slot,
        block_time: tx_data.block_time,
        success: error.is_none(),
        error,
        fee: meta.fee,
        log_messages,
        instructions,
        version,
    })
}

fn decode_instructions(message: &UiMessage) -> Vec<DecodedInstruction> {
    match message {
        UiMessage::Parsed(parsed) => {
            let account_keys: Vec<&str> = parsed.account_keys.iter().map(|k| k.pubkey.as_str()).collect();
            parsed
                .instructions
                .iter()
                .map(|instr| decode_instruction(instr, &account_keys))
                .collect()
        }
        UiMessage::Raw(raw) => {
            let account_keys: Vec<&str> = raw.account_keys.iter().map(String::as_str).collect();
            raw.instructions
                .iter()
                .map(|compiled| DecodedInstruction {
                    program_id: account_keys
                        .get(compiled.program_id_index as usize)
                        .map(|k| k.to_string()),
                    program: None,
                    instruction_type: None,
                    info: None,
                })
                .collect()
        }
    }
}

fn decode_instruction(instruction: &UiInstruction, account_keys: &[&str]) -> DecodedInstruction {
    if let UiInstruction::Compiled(compiled) = instruction {
        return DecodedInstruction {
            program_id: account_keys
                .get(compiled.program_id_index as usize)
                .map(|k| k.to_string()),
            program: None,
            instruction_type: None,
            info: None,
        };
    }

    // Parsed and partially decoded instructions are easiest to read as JSON
    let value = serde_json::to_value(instruction).unwrap_or(Value::Null);
    let field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);
    let parsed = value.get("parsed");

    DecodedInstruction {
        program_id: field("programId"),
        program: field("program"),
        instruction_type: parsed
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
            .map(str::to_string),
        info: parsed.and_then(|p| p.get("info")).cloned(),
    }
}
