use clap::{Parser, ValueEnum};
use coinshop::application::engine::{EngineConfig, TransactionEngine};
use coinshop::application::runner::CommandRunner;
use coinshop::domain::catalog::Catalog;
use coinshop::domain::identity::Identity;
use coinshop::domain::ports::{AccountStore, StorageHandle};
use coinshop::infrastructure::identity::{DEFAULT_HASH_MEMORY_KIB, PasswordIdentityProvider};
use coinshop::infrastructure::in_memory::InMemoryStore;
use coinshop::interfaces::csv::account_writer::AccountWriter;
use coinshop::interfaces::csv::operation_reader::OperationReader;
use coinshop::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// `name,balance` rows
    Csv,
    /// Balance, inventory and coin history per employee
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "COINSHOP_DB_PATH")]
    db_path: Option<PathBuf>,

    /// JSON object mapping item names to prices. Defaults to the merch list.
    #[arg(long, env = "COINSHOP_CATALOG")]
    catalog: Option<PathBuf>,

    /// Upper bound for a single transfer or purchase, in milliseconds.
    #[arg(
        long,
        env = "COINSHOP_OP_TIMEOUT_MS",
        default_value_t = 5000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    op_timeout_ms: u64,

    /// Argon2 memory cost used when hashing new passwords, in KiB.
    #[arg(long, env = "COINSHOP_HASH_MEMORY_KIB", default_value_t = DEFAULT_HASH_MEMORY_KIB)]
    hash_memory_kib: u32,

    /// Final report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let storage = open_storage(cli.db_path.as_ref())?;
    let catalog = match &cli.catalog {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            Catalog::from_json_reader(file)?
        }
        None => Catalog::merch(),
    };
    info!(items = catalog.len(), "catalog loaded");

    let config = EngineConfig {
        op_timeout: Duration::from_millis(cli.op_timeout_ms),
    };
    let engine = TransactionEngine::with_config(storage.clone(), Arc::new(catalog), config);
    let identity = PasswordIdentityProvider::with_memory_cost(storage.clone(), cli.hash_memory_kib)?;
    let runner = CommandRunner::new(engine, Box::new(identity));

    // Process operations
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for (index, command) in reader.commands().enumerate() {
        let row = index + 1;
        match command {
            Ok(command) => {
                let employee = command.credentials().name.clone();
                if let Err(e) = runner.execute(command).await {
                    if e.is_internal() {
                        error!(row, employee, "Error processing operation: {e}");
                    } else {
                        warn!(row, employee, "Operation rejected: {e}");
                    }
                }
            }
            Err(e) => {
                error!(row, "Error reading operation: {e}");
            }
        }
    }

    // Output final state
    let accounts = storage.all_accounts().await?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    match cli.format {
        ReportFormat::Csv => writer.write_accounts(&accounts)?,
        ReportFormat::Json => {
            let mut infos = Vec::with_capacity(accounts.len());
            for account in &accounts {
                let info = runner.engine().info(&Identity::new(&account.name)).await?;
                infos.push((account.name.clone(), info));
            }
            writer.write_infos(&infos)?;
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_storage(db_path: Option<&PathBuf>) -> Result<StorageHandle> {
    use coinshop::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            info!(path = %path.display(), "opening persistent storage");
            Ok(Arc::new(RocksDBStore::open(path)?))
        }
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_storage(db_path: Option<&PathBuf>) -> Result<StorageHandle> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(Arc::new(InMemoryStore::new()))
}
