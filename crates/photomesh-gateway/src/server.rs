use crate::handlers::{
    edit_model_handler, generate_initial_handler, health_handler, history_handler,
    static_handler, upload_handler,
};
use crate::middleware::cors_middleware;
use crate::storage::ArtifactStorage;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use photomesh_workflow::WorkflowController;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub controller: Arc<WorkflowController>,
    pub storage: Arc<ArtifactStorage>,
}

/// Tunables for the HTTP surface.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Largest accepted request body, which bounds uploaded image size.
    pub max_upload_bytes: usize,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router with default options.
    pub fn build(controller: Arc<WorkflowController>, storage: Arc<ArtifactStorage>) -> Router {
        Self::build_with_options(controller, storage, GatewayOptions::default())
    }

    pub fn build_with_options(
        controller: Arc<WorkflowController>,
        storage: Arc<ArtifactStorage>,
        options: GatewayOptions,
    ) -> Router {
        let state = Arc::new(AppState {
            controller,
            storage,
        });

        Router::new()
            .route("/upload", post(upload_handler))
            .route("/generate_initial", post(generate_initial_handler))
            .route("/edit_model", post(edit_model_handler))
            .route("/history/{session_id}", get(history_handler))
            .route("/static/{*path}", get(static_handler))
            .route("/health", get(health_handler))
            .layer(DefaultBodyLimit::max(options.max_upload_bytes))
            .layer(axum_mw::from_fn(cors_middleware))
            .with_state(state)
    }
}
