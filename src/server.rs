//! # Server Module
//!
//! HTTP server setup and route configuration for the event listing server.

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use chrono::Duration;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthMiddleware, TokenService};
use crate::config::Config;
use crate::database::{self, DatabaseConfig, DatabaseConnection, MemoryStore, Store};
use crate::routes::{auth, events, health, tracking};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService>,
    pub store: Arc<dyn Store>,
    /// Whether the auth cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

/// Build the full router, with the authenticator in front of protected routes.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/all-users", get(auth::all_users))
        .route("/create-event", post(events::create_event))
        .route("/my-events", get(events::my_events))
        .route("/update-event/{id}", put(events::update_event))
        .route("/delete-event/{id}", delete(events::delete_event))
        .route("/track-event/{event_id}", post(tracking::track_event))
        .route("/untrack-event/{event_id}", delete(tracking::untrack_event))
        .route("/my-tracked-events", get(tracking::my_tracked_events))
        .route_layer(middleware::from_fn_with_state(
            state.token_service.clone(),
            AuthMiddleware::validate_token,
        ));

    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/all-events/{page_no}/{per_page}", get(events::all_events))
        .route("/single-event/{id}", get(events::single_event));

    Router::new()
        .route("/", get(health::root))
        .route("/ping", get(health::ping))
        .nest("/api/v1", public.merge(protected))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| o.parse::<HeaderValue>().with_context(|| format!("invalid CORS origin {o:?}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true))
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match &config.database {
        Some(settings) => {
            let db_config = DatabaseConfig::from_url(&settings.url, settings.max_connections)?;
            let db = DatabaseConnection::new(db_config).await?;
            database::migrations::run_migrations(db.pool()).await?;
            Ok(Arc::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Starts the HTTP server and runs until the process is stopped.
pub async fn start(config: Config) -> Result<()> {
    let ttl = Duration::try_seconds(config.auth.token_ttl_secs)
        .with_context(|| format!("token TTL of {}s is out of range", config.auth.token_ttl_secs))?;
    let token_service = TokenService::new(&config.auth.jwt_secret, ttl)?;

    let state = AppState {
        token_service: Arc::new(token_service),
        store: open_store(&config).await?,
        cookie_secure: config.auth.cookie_secure,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.server.cors_origins)?),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Event listing server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("📅 API available at http://{}/api/v1/*", addr);

    axum::serve(listener, app).await.context("Server terminated unexpectedly")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_rejects_malformed_origin() {
        assert!(cors_layer(&["https://ok.example".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
