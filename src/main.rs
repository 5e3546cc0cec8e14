// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use ocr_ml_node::{
    api::{start_server, AppState},
    config::ServiceConfig,
    pipeline::ImagePipeline,
    version,
    vision::{ShapeAnnotator, VisionModelManager},
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging (RUST_LOG, default info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🚀 Starting OCR ML Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = ServiceConfig::parse();
    tracing::debug!("Configuration: {:?}", config);

    // Learned models: a missing model disables only its own sub-service
    println!("🖼️  Loading vision models...");
    let manager = VisionModelManager::new(config.vision_config()).await?;
    for model in manager.list_models() {
        let marker = if model.available { "✅" } else { "⚠️ " };
        println!("   {} {} ({})", marker, model.name, model.model_type);
    }
    if !manager.has_recognizer() || !manager.has_detector() {
        tracing::warn!("⚠️ Some vision models are unavailable; their results will be empty");
    }

    let pipeline = ImagePipeline::new(Arc::new(manager), ShapeAnnotator::default());
    let state = AppState::new(pipeline, config.max_upload_bytes);

    println!("\n🌐 Serving on http://{}:{}", config.host, config.port);
    println!("   POST /process-image");
    println!("   GET  /health\n");

    start_server(&config, state).await?;

    println!("👋 OCR ML Node stopped");
    Ok(())
}
