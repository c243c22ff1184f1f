mod config;
mod error;
mod fonts;
mod generator;
mod pdf;
mod render;
mod roster;
mod state;
mod storage;
mod style;

use std::sync::Mutex;
use tracing_subscriber::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config::log_file_path(|key| std::env::var(key).ok()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certificados=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let config = config::Config::from_env().inspect_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
    })?;

    crate::storage::ensure_dirs(&config.folders())?;

    let roster = roster::ExcelRoster::new(&config.roster_path, &config.name_column, &config.id_column);
    let ctx = state::RunContext::new(config)?;

    let summary = generator::generate_all(&ctx, &roster).inspect_err(|e| {
        tracing::error!("Certificate generation aborted: {}", e);
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
