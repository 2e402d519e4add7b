//! Relay HTTP server
//!
//! Serves the chat endpoint, liveness probes and the widget payloads, with
//! permissive CORS so the widget can be embedded on any origin.

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::chat::chat_handler;
use super::prompts::build_instructions;
use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::upstream::{CompletionApi, ResponsesClient};
use crate::widget::{HTML_CONTENT_TYPE, JAVASCRIPT_CONTENT_TYPE, WidgetAssets};

/// Shared application state for all handlers
///
/// Built once at startup and never mutated.
pub struct AppState {
    /// Configuration snapshot
    pub config: Config,
    /// Upstream API key, if one was configured
    pub api_key: Option<String>,
    /// Completion API used for every chat turn
    pub upstream: Arc<dyn CompletionApi>,
    /// System instructions sent with every turn
    pub instructions: String,
    /// Rendered widget payloads
    pub widget: WidgetAssets,
}

impl AppState {
    pub fn new(config: Config, api_key: Option<String>, upstream: Arc<dyn CompletionApi>) -> Self {
        let instructions = build_instructions(&config.assistant);
        let widget = WidgetAssets::render(&config);

        Self {
            config,
            api_key,
            upstream,
            instructions,
            widget,
        }
    }
}

/// The relay server
pub struct RelayServer {
    config: Config,
    api_key: Option<String>,
}

impl RelayServer {
    /// Create a relay server; the key is read by the caller at startup
    pub fn new(config: Config, api_key: Option<String>) -> Self {
        Self { config, api_key }
    }

    /// Bind the listen address and serve until Ctrl+C or SIGTERM
    pub async fn serve(&self) -> Result<()> {
        let upstream = ResponsesClient::new(&self.config.upstream)?;

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| RelayError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting relay server on {addr}");
        tracing::info!(
            "Upstream: {} (model {})",
            upstream.api_url(),
            self.config.upstream.model
        );
        if self.api_key.is_none() {
            tracing::warn!(
                "{} is not set; /chat will answer with a configuration error",
                self.config.upstream.api_key_env
            );
        }

        let state = Arc::new(AppState::new(
            self.config.clone(),
            self.api_key.clone(),
            Arc::new(upstream),
        ));
        let app = create_router(state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| RelayError::Server(format!("Server error: {e}")))?;

        tracing::info!("Relay server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/widget.js", get(widget_handler))
        .route("/test", get(test_page_handler))
        .route("/widget-demo", get(demo_page_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler(State(state): State<Arc<AppState>>) -> String {
    format!("{} chat server OK", state.config.assistant.name)
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn widget_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, JAVASCRIPT_CONTENT_TYPE)],
        state.widget.script().to_string(),
    )
}

async fn test_page_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
        state.widget.test_page().to_string(),
    )
}

async fn demo_page_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
        state.widget.demo_page().to_string(),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
