//! # Event Listing Server
//!
//! REST backend for an event-listing platform, built with Axum and Tokio.
//!
//! ## Features
//! - Registration and login with Argon2 password hashes
//! - Signed, time-bounded bearer tokens, accepted from the `user-token`
//!   cookie or an `Authorization: Bearer` header
//! - Event CRUD with owner-only updates and deletes
//! - Paginated, filterable event listings
//! - Per-user event tracking
//!
//! ## Architecture
//! - `server`: router assembly, shared state, startup
//! - `config`: environment configuration
//! - `auth`: token service, request authenticator, password hashing
//! - `database`: `Store` trait with PostgreSQL and in-memory backends
//! - `routes`: HTTP handlers grouped by resource
//!
//! ## Running the Server
//! ```bash
//! JWT_SECRET=change-me cargo run
//! ```
//!
//! Without `DATABASE_URL` the server keeps everything in memory.
//! The server listens on `http://0.0.0.0:5000` by default.

mod auth;
mod config;
mod database;
mod error;
mod routes;
mod server;
mod state_structs;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting event listing server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };
    tracing::debug!("Loaded configuration: {:?}", config);

    server::start(config).await
}
