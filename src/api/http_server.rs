use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health::health_handler;
use super::process_image::process_image_handler;
use crate::config::{ServiceConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::pipeline::ImagePipeline;
use crate::vision::annotation::ShapeAnnotator;
use crate::vision::model_manager::VisionModelManager;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: ImagePipeline,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: ImagePipeline, max_upload_bytes: usize) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
        }
    }

    /// State with no learned models and the default annotator
    pub fn new_for_test() -> Self {
        let pipeline = ImagePipeline::new(
            Arc::new(VisionModelManager::without_models()),
            ShapeAnnotator::default(),
        );
        Self::new(pipeline, DEFAULT_MAX_UPLOAD_BYTES)
    }
}

/// CORS for any origin, method and header, with credentials
///
/// Wildcards cannot be combined with credentials, so the request's own
/// origin, method and headers are echoed back instead.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Liveness
        .route("/health", get(health_handler))
        // Upload analysis
        .route("/process-image", post(process_image_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

pub async fn start_server(config: &ServiceConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_app(Arc::new(state));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("🌐 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
