pub mod ai;
pub mod chat;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod extraction;
pub mod history;
pub mod ledger;
pub mod models;
pub mod reconcile;
pub mod speech;

use commands::AppState;
use config::AppConfig;
use tracing_subscriber::EnvFilter;

pub fn run() {
    // Load .env file - current dir first, then the parent
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // Initialize tracing with RUST_LOG env filter
    // Default: warn for most crates, info for our app
    // Use RUST_LOG=debug for verbose provider logs
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,statement_ledger=info")),
        )
        .init();

    let config = AppConfig::from_env();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let state = AppState::from_config(&config);

        if let Err(e) = console::run_console(state).await {
            tracing::error!("Console I/O failed: {}", e);
            std::process::exit(1);
        }
    });
}
