use crate::models::{LogMatch, TransactionRecord};

/// Every log line of `record` containing `marker`, in log order.
pub fn filter_logs(record: &TransactionRecord, marker: &str) -> Vec<LogMatch> {
    record
        .log_messages
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(marker))
        .map(|(line_index, line)| LogMatch {
            signature: record.signature,
            slot: record.slot,
            line_index,
            line: line.clone(),
        })
        .collect()
}
