//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! This module provides the main server setup function that creates the Axum router,
//! registers all routes, applies middleware, and starts the HTTP server.

// region: --- Imports
use crate::handlers;
use crate::middleware::{log_requests, require_auth, stamp_req, RequestStamp};
use crate::services::{CompletionClient, OpenAiClient, PdfTextSource, PdfUploadStash, SidecarPdf};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use lib_core::config::init_config;
use lib_core::model::store::MIGRATOR;
use lib_core::{create_pool, Config, DbPool};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub llm: Arc<dyn CompletionClient>,
    pub pdf: Arc<dyn PdfTextSource>,
    pub uploads: PdfUploadStash,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CompletionClient> {
    fn from_ref(state: &AppState) -> Self {
        state.llm.clone()
    }
}

impl FromRef<AppState> for Arc<dyn PdfTextSource> {
    fn from_ref(state: &AppState) -> Self {
        state.pdf.clone()
    }
}

impl FromRef<AppState> for PdfUploadStash {
    fn from_ref(state: &AppState) -> Self {
        state.uploads.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080")
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
fn init_tracing() -> String {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {
            tracing_subscriber::EnvFilter::new(&log_level)
        }
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    // Already installed when embedded in another binary or test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();

    log_level
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - Database connection fails
/// - Database migrations fail
/// - The HTTP client cannot be built
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let log_level = init_tracing();
    info!("TALLYBOOK BACKEND STARTING");
    info!("Log level: {}", log_level);

    dotenvy::dotenv().ok();

    info!("Loading configuration...");
    let app_config = init_config().map_err(|e| anyhow::anyhow!(e))?.clone();
    info!("Environment: {}", app_config.environment);
    info!("Database URL: {}", app_config.database_url);
    if app_config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, extraction endpoints will fail");
    }

    info!("Connecting to database...");
    let pool = create_pool(&app_config.database_url).await?;

    info!("Running embedded database migrations...");
    MIGRATOR.run(&pool).await?;
    info!("Migrations complete");

    let llm = OpenAiClient::new(&app_config.llm)?;
    let pdf = SidecarPdf::new(app_config.pdf.clone());

    let state = AppState {
        db: pool,
        config: app_config,
        llm: Arc::new(llm),
        pdf: Arc::new(pdf),
        uploads: PdfUploadStash::default(),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    info!("SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Create the main application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.max_upload_bytes;

    info!("[ROUTE SETUP] Registering HTTP routes...");

    let protected = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/security-questions", post(handlers::auth::security_questions))
        .route("/api/account/profile", put(handlers::account::update_profile))
        .route("/api/account/password", post(handlers::account::reset_password))
        .route("/api/account", delete(handlers::account::delete_account))
        .route(
            "/api/receipts",
            get(handlers::receipts::list_receipts)
                .post(handlers::receipts::save_receipt)
                .delete(handlers::receipts::delete_receipts),
        )
        .route("/api/receipts/upload", post(handlers::receipts::upload_receipt))
        .route("/api/receipts/export", post(handlers::receipts::export_receipts))
        .route("/api/receipts/{id}", get(handlers::receipts::get_receipt))
        .route("/api/statements/page-count", post(handlers::statements::page_count))
        .route("/api/statements/extract", post(handlers::statements::extract_statement))
        .route("/api/statements", post(handlers::statements::save_statement))
        .route("/api/transactions", get(handlers::statements::list_transactions))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(protected)
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        // Tower HTTP trace layer for spans
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri().path(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE]"
                        );
                    },
                ),
        )
        .layer(from_fn(log_requests))
        // Outside logging and tracing so both see the request id
        .layer(from_fn(stamp_req))
        .layer(CookieManagerLayer::new())
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" AUTH:");
    info!("   • POST /api/auth/signup | /api/auth/login | /api/auth/logout");
    info!("   • GET  /api/auth/me");
    info!("   • POST /api/auth/security-questions");
    info!(" ACCOUNT:");
    info!("   • PUT  /api/account/profile");
    info!("   • POST /api/account/password");
    info!("   • DELETE /api/account");
    info!(" RECEIPTS:");
    info!("   • POST /api/receipts/upload (multipart image)");
    info!("   • GET|POST|DELETE /api/receipts");
    info!("   • GET  /api/receipts/{{id}}");
    info!("   • POST /api/receipts/export");
    info!(" STATEMENTS:");
    info!("   • POST /api/statements/page-count | /api/statements/extract (multipart)");
    info!("   • POST /api/statements");
    info!("   • GET  /api/transactions");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
