//! Application wiring: builds the provider client, the router and runs the server.

use crate::ai::{GeminiClient, GenerationService};
use crate::gateway::Gateway;
use crate::handlers;
use crate::models::{Config, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_STATIC_DIR};
use crate::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The gateway's HTTP application.
pub struct App {
    gateway: Arc<Gateway>,
    static_dir: PathBuf,
    max_upload_bytes: usize,
}

impl App {
    /// Build an app around any generation backend.
    ///
    /// This is primarily useful for integration tests that inject mocks.
    pub fn with_service(service: Arc<dyn GenerationService>) -> Self {
        Self {
            gateway: Arc::new(Gateway::new(service)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_static_dir(mut self, static_dir: PathBuf) -> Self {
        self.static_dir = static_dir;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Construct the app from startup configuration, backed by Gemini.
    pub fn from_config(config: &Config) -> Self {
        let mut client =
            GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())
                .with_timeout(config.request_timeout);
        if let Some(base_url) = &config.gemini_base_url {
            client = client.with_base_url(base_url.clone());
        }
        info!("Generation provider: Gemini (model: {})", client.model());

        Self::with_service(Arc::new(client))
            .with_static_dir(config.static_dir.clone())
            .with_max_upload_bytes(config.max_upload_bytes)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/generate-text", post(handlers::generate_text))
            .route("/generate-from-image", post(handlers::generate_from_image))
            .route(
                "/generate-from-document",
                post(handlers::generate_from_document),
            )
            .route("/generate-from-audio", post(handlers::generate_from_audio))
            .route("/api/chat", post(handlers::chat))
            .fallback_service(ServeDir::new(&self.static_dir))
            .layer(DefaultBodyLimit::max(self.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(self.gateway.clone())
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Serving static files from {}", self.static_dir.display());
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
