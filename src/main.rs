// Load configuration
// Set up logging
// Create the RPC client
// Run the requested command: history scan, single transaction lookup or token transfer

use chain_history_service::{
    blockchain::{
        client::SubmitOptions, fetcher::TransactionFetcher, filter_logs, HistoryScan, ScanOptions, SolanaClient,
    },
    config::{check_page_size, Config},
    models::TransactionRecord,
    transfer, validation,
};

use clap::{Parser, Subcommand};
use solana_sdk::signer::Signer;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chain-history-service", about = "Solana transaction history scanner and SPL token sender")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk an account's history and print log lines containing a marker
    Scan {
        /// Account to scan (defaults to SCAN_ADDRESS)
        #[arg(long)]
        address: Option<String>,
        /// Marker substring (defaults to LOG_MARKER)
        #[arg(long)]
        marker: Option<String>,
        #[arg(long)]
        page_size: Option<usize>,
        /// Stop after this many transactions
        #[arg(long)]
        limit: Option<usize>,
        /// Print matches as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Fetch a single transaction by signature
    Tx {
        signature: String,
        /// Print the node's jsonParsed payload instead of the decoded record
        #[arg(long)]
        raw: bool,
    },
    /// Send SPL tokens from SOLANA_FROM_PRIVATE_KEY to SOLANA_TO_PUBLIC_KEY
    Transfer {
        /// Amount in the token's smallest unit (defaults to TRANSFER_AMOUNT)
        #[arg(long)]
        amount: Option<u64>,
        #[arg(long)]
        skip_preflight: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config);

    // Ctrl-C stops the scan or transfer before its next RPC call
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    match cli.command {
        Command::Scan {
            address,
            marker,
            page_size,
            limit,
            json,
        } => {
            if let Some(page_size) = page_size {
                config.page_size = check_page_size("--page-size", page_size)?;
            }
            if limit.is_some() {
                config.max_records = limit;
            }
            let address = match address {
                Some(a) => validation::parse_address(&a)?,
                None => config
                    .scan_address
                    .ok_or("no address given: pass --address or set SCAN_ADDRESS")?,
            };
            let marker = marker.unwrap_or_else(|| config.log_marker.clone());
            if marker.is_empty() {
                return Err("log marker must not be empty".into());
            }

            let client = SolanaClient::new(&config);
            run_scan(&client, &config, address, &marker, json, cancel).await?;
        }
        Command::Tx { signature, raw } => {
            let signature = validation::parse_signature(&signature)?;
            let client = SolanaClient::new(&config);

            if raw {
                match client.get_transaction_json(&signature).await? {
                    Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                    None => println!("Transaction not found (maybe too old or pruned)."),
                }
            } else {
                let fetcher = TransactionFetcher::new(config.commitment, config.fetch_delay);
                match fetcher.fetch(&client, &signature).await? {
                    Some(record) => print_record(&record),
                    None => println!("Transaction not found (maybe too old or pruned)."),
                }
            }
        }
        Command::Transfer { amount, skip_preflight } => {
            let settings = config.transfer()?;
            let sender = settings.sender_key.to_keypair()?;
            let amount = amount.unwrap_or(settings.amount);
            let options = SubmitOptions {
                skip_preflight: skip_preflight || settings.skip_preflight,
                preflight_commitment: settings.preflight_commitment,
            };

            info!("Sending {} of {} from {} to {}", amount, settings.token_mint, sender.pubkey(), settings.destination);

            let client = SolanaClient::new(&config);
            match transfer::transfer_tokens(
                &client,
                &sender,
                &settings.destination,
                &settings.token_mint,
                amount,
                options,
                &cancel,
            )
            .await
            {
                Ok(receipt) => println!("Token transfer success! Tx Signature: {}", receipt.signature),
                Err(e) => {
                    error!("Transfer failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

async fn run_scan(
    client: &SolanaClient,
    config: &Config,
    address: solana_sdk::pubkey::Pubkey,
    marker: &str,
    json: bool,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let started = chrono::Utc::now();
    info!("Scanning {} for \"{}\" (page size {})", address, marker, config.page_size);

    let mut scan = HistoryScan::new(client, address, &ScanOptions::from_config(config), cancel);
    let mut total_matches = 0usize;

    while let Some(record) = scan.next_record().await {
        let record = record?;
        for found in filter_logs(&record, marker) {
            total_matches += 1;
            if json {
                println!("{}", serde_json::to_string(&found)?);
            } else {
                println!("sig={} slot={} log: {}", found.signature, found.slot, found.line);
            }
        }
    }

    let stats = scan.stats();
    info!(
        "Found {} matching lines in {} transactions ({} absent, {} failed) in {}s",
        total_matches,
        stats.fetched,
        stats.absent,
        stats.failed,
        (chrono::Utc::now() - started).num_seconds()
    );
    Ok(())
}

fn print_record(record: &TransactionRecord) {
    println!("\n=== Transaction {} ===", record.signature);
    let time = record
        .block_time
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    println!("Slot: {} | Time: {} | Status: {}", record.slot, time, record.status());
    println!("Fee: {} lamports", record.fee);
    if let Some(version) = &record.version {
        println!("Version: {}", version);
    }

    if let Some(instructions) = &record.instructions {
        println!("Instructions:");
        for (i, ix) in instructions.iter().enumerate() {
            println!(
                "  ix[{}]: {} {}",
                i,
                ix.program.as_deref().or(ix.program_id.as_deref()).unwrap_or("?"),
                ix.instruction_type.as_deref().unwrap_or("")
            );
        }
    }

    if !record.log_messages.is_empty() {
        println!("Logs:");
        for (i, line) in record.log_messages.iter().enumerate() {
            println!("  log[{}]: {}", i, line);
        }
    }
    println!("=============================");
}
