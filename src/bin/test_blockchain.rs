use chain_history_service::{
    blockchain::{
        client::{LedgerClient, SolanaClient},
        fetcher::TransactionFetcher,
        filter_logs,
        paginator::SignaturePaginator,
        HistoryScan, ScanOptions,
    },
    config::Config,
    transfer::derive_associated_account,
    validation::parse_address,
};
use solana_sdk::commitment_config::CommitmentConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting blockchain integration test...");

    // 1. Setup
    let config = Config::from_env()?;
    let client = SolanaClient::new(&config);

    // 2. Test RPC Client
    info!("Testing RPC client connection...");
    let slot = client.get_slot().await?;
    info!("✅ Current slot: {}", slot);

    // 3. Test getting a recent blockhash
    let anchor = client.get_latest_anchor(CommitmentConfig::finalized()).await?;
    info!(
        "✅ Blockhash {} valid until height {}",
        anchor.blockhash, anchor.last_valid_block_height
    );

    // 4. Test one page of signatures
    let test_address = match config.scan_address {
        Some(address) => address,
        None => parse_address("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")?,
    };
    info!("Testing address signature retrieval for {}...", test_address);

    let mut paginator = SignaturePaginator::new(test_address, 5, config.commitment);
    let page = paginator.next_page(&client).await?;
    if page.entries.is_empty() {
        error!("❌ No signatures found for address {}", test_address);
    } else {
        info!("✅ Retrieved {} signatures (done={})", page.entries.len(), page.done);
        for entry in &page.entries {
            info!("   Signature: {} slot {}", entry.signature, entry.slot);
        }
    }

    // 5. Test transaction retrieval
    let fetcher = TransactionFetcher::new(config.commitment, config.fetch_delay);
    for entry in page.entries.iter().take(2) {
        match fetcher.fetch(&client, &entry.signature).await {
            Ok(Some(record)) => info!(
                "✅ {} slot={} status={} fee={} logs={}",
                record.signature,
                record.slot,
                record.status(),
                record.fee,
                record.log_messages.len()
            ),
            Ok(None) => warn!("Transaction {} not found (pruned?)", entry.signature),
            Err(e) => error!("❌ Failed to get transaction {}: {}", entry.signature, e),
        }
    }

    // 6. Test a short scan with the log filter
    info!("Testing short scan for marker \"{}\"...", config.log_marker);
    let options = ScanOptions {
        page_size: 10,
        max_records: Some(10),
        ..ScanOptions::from_config(&config)
    };
    let mut scan = HistoryScan::new(&client, test_address, &options, CancellationToken::new());
    while let Some(record) = scan.next_record().await {
        for found in filter_logs(&record?, &config.log_marker) {
            info!("   sig={} slot={} log: {}", found.signature, found.slot, found.line);
        }
    }
    info!("✅ Scan stats: {:?}", scan.stats());

    // 7. Associated account derivation for the configured mint
    if let Some(mint) = config.token_mint {
        let ata = derive_associated_account(&test_address, &mint);
        info!("✅ Associated account of {} for mint {}: {}", test_address, mint, ata);
    }

    info!("All blockchain integration tests completed!");
    Ok(())
}
