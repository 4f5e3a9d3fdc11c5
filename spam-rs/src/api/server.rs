//! API Server - HTTP server for predictions

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::handlers::{self, ApiError, AppState};
use super::model::ModelHandle;

/// API Server configuration
pub struct ApiServer {
    state: Arc<AppState>,
    addr: String,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Create a server around an already-loaded model
    pub fn new(model: ModelHandle, addr: String) -> Self {
        Self {
            state: Arc::new(AppState { model }),
            addr,
            static_dir: None,
        }
    }

    /// Serve files from `dir` for every route not handled by the API
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin);

        let mut router = Router::new()
            .route("/predict", post(handlers::predict))
            .route("/health", get(handlers::health));

        if let Some(ref dir) = self.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        router
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Start the API server and run until Ctrl-C
    pub async fn run(&self) -> std::io::Result<()> {
        let router = self.router();

        info!(
            "Starting prediction server on {} ({} model)",
            self.addr,
            self.state.model.model_kind()
        );

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Prediction server stopped");
        Ok(())
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("Internal server error")),
    )
        .into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
