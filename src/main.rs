//! Entry point for the Payroll Engine binary.
//!
//! Running this binary starts an HTTP server that exposes the payroll
//! engine.  Settings come from the environment:
//!
//! * `PAYROLL_BIND_ADDR` - listen address, default `127.0.0.1:3000`
//! * `PAYROLL_RULES_FILE` - rule book file or directory; the built-in
//!   default rules are used when unset
//! * `PAYROLL_CONFIG_FILE` - calculation config; defaults when unset
//! * `RUST_LOG` - log filter, default `payroll_engine=info`

use payroll_engine::api::{serve, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "payroll_engine=info".into()),
        )
        .init();

    let rules_path = std::env::var_os("PAYROLL_RULES_FILE").map(PathBuf::from);
    let config_path = std::env::var_os("PAYROLL_CONFIG_FILE").map(PathBuf::from);
    let addr = std::env::var("PAYROLL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    let state = AppState::load(rules_path.as_deref(), config_path.as_deref())?;
    if let Err(err) = serve(&addr, Arc::new(state)).await {
        tracing::error!(error = %err, "server stopped");
        return Err(err);
    }
    Ok(())
}
