use clap::Parser;
use escrow_settlement::application::engine::SettlementEngine;
use escrow_settlement::domain::ports::SettlementStoreRef;
use escrow_settlement::infrastructure::in_memory::InMemoryStore;
#[cfg(feature = "storage-rocksdb")]
use escrow_settlement::infrastructure::rocksdb::RocksDbStore;
use escrow_settlement::interfaces::csv::wallet_writer::WalletWriter;
use escrow_settlement::interfaces::json::api::SettlementApi;
use escrow_settlement::interfaces::json::command_reader::CommandReader;
use escrow_settlement::interfaces::json::seed::SeedFile;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settlement commands file (JSON Lines, one release/refund per line)
    commands: PathBuf,

    /// Seed file with vendors, orders and escrows to load before processing
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Stdout carries response envelopes and the wallet report; logs go to
    // stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[cfg(feature = "storage-rocksdb")]
fn build_store(cli: &Cli) -> Result<SettlementStoreRef> {
    match &cli.db_path {
        Some(db_path) => Ok(Arc::new(RocksDbStore::open(db_path).into_diagnostic()?)),
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_store(_cli: &Cli) -> Result<SettlementStoreRef> {
    Ok(Arc::new(InMemoryStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store = build_store(&cli)?;

    if let Some(seed_path) = &cli.seed {
        let file = File::open(seed_path).into_diagnostic()?;
        let seed = SeedFile::from_reader(file).into_diagnostic()?;
        seed.load_into(store.as_ref()).await.into_diagnostic()?;
    }

    let api = SettlementApi::new(SettlementEngine::new(store.clone()));

    let file = File::open(&cli.commands).into_diagnostic()?;
    let reader = CommandReader::new(BufReader::new(file));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for command in reader.commands() {
        match command {
            Ok(command) => {
                let response = api.handle(command).await;
                serde_json::to_writer(&mut out, &response).into_diagnostic()?;
                writeln!(out).into_diagnostic()?;
            }
            Err(err) => {
                tracing::error!("Error reading command: {err}");
            }
        }
    }

    // Final wallet state, one row per vendor.
    let vendors = store.all_vendors().await.into_diagnostic()?;
    let mut writer = WalletWriter::new(out);
    writer.write_wallets(vendors).into_diagnostic()?;

    Ok(())
}
