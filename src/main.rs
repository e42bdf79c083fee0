use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payflow::application::accounts::AccountService;
use payflow::application::engine::TransferEngine;
use payflow::domain::account::Balance;
use payflow::domain::ports::{AccountStoreBox, TransferStore, TransferStoreBox};
use payflow::infrastructure::in_memory::InMemoryStore;
#[cfg(feature = "storage-rocksdb")]
use payflow::infrastructure::rocksdb::RocksDbStore;
use payflow::interfaces::http::{AppState, router};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to serve the HTTP API on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Balance granted to newly registered accounts
    #[arg(long, default_value = "1000.00")]
    starting_balance: Decimal,
}

fn build_state<S>(store: S, starting_balance: Balance) -> AppState
where
    S: TransferStore + Clone + 'static,
{
    let account_store: AccountStoreBox = Box::new(store.clone());
    let transfer_store: TransferStoreBox = Box::new(store);
    AppState {
        engine: TransferEngine::new(transfer_store),
        accounts: AccountService::new(account_store, starting_balance),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let starting_balance = Balance::new(cli.starting_balance).into_diagnostic()?;

    let state = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            let store = RocksDbStore::open(db_path).into_diagnostic()?;
            build_state(store, starting_balance)
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => miette::bail!(
            "this build has no persistent storage; rebuild with --features storage-rocksdb"
        ),
        None => build_state(InMemoryStore::new(), starting_balance),
    };

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(cli.bind).await.into_diagnostic()?;
    tracing::info!(addr = %cli.bind, "payflow listening");
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
