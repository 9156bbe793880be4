//! # cinelog-server
//!
//! REST backend for the cinelog movie-review catalog.
//!
//! This binary provides:
//! - **Account endpoints**: signup with salted password hashing, signin
//!   issuing a signed bearer token
//! - **Catalog endpoints**: movie CRUD and review creation/listing, with
//!   an average-rating aggregation on the movie listing
//! - **Access gate**: token-verifying middleware in front of the
//!   protected routes
//! - **SQLite persistence** via the `cinelog-store` crate

mod api;
mod auth;
mod config;
mod error;
mod extract;
mod password;
mod token;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cinelog_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::token::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cinelog_server=debug")),
        )
        .init();

    info!("Starting cinelog API server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Catalog database (runs migrations on open)
    let db = Database::open_at(&config.database_path)?;

    // Token service, constructed once from the process-wide secret
    let tokens = TokenService::new(&config.token_secret);

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        tokens: Arc::new(tokens),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
