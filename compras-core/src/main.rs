//! compras - purchase order numbering and creation
//!
//! Loads `.env`, connects to the configured store (applying migrations),
//! runs one command and prints its JSON result.

use clap::Parser;
use compras_core::cli::{self, Cli};
use compras_core::core::{AppState, BoxError, Config};
use compras_core::utils::logger;
use shared::AppError;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let database_url = cli.database_url.clone();
    let config = Config::from_lookup(|name| match (name, &database_url) {
        ("DATABASE_URL", Some(url)) => Some(url.clone()),
        _ => std::env::var(name).ok(),
    })?;

    logger::init_logger(
        &config.log_level,
        config.is_production(),
        config.log_dir.as_deref(),
    );
    tracing::info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting compras"
    );

    let state = AppState::initialize(&config).await?;
    let result = cli::execute(cli.command, &state).await;
    state.shutdown().await;

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            if let Some(app_error) = e.downcast_ref::<AppError>() {
                eprintln!("{}", serde_json::to_string_pretty(app_error)?);
            }
            Err(e)
        }
    }
}
