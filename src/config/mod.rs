// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from command-line flags and environment variables

use clap::Parser;
use std::net::SocketAddr;

use crate::vision::model_manager::VisionModelConfig;

/// Default request body cap (20 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// OCR/ML image analysis node
#[derive(Parser, Debug, Clone)]
#[command(name = "ocr-ml-node")]
#[command(version)]
#[command(about = "Handwriting, shape and object analysis over uploaded images", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory holding the handwriting encoder, decoder and tokenizer
    #[arg(
        long,
        env = "HANDWRITING_MODEL_DIR",
        default_value = "./models/trocr-base-handwritten-onnx"
    )]
    pub handwriting_model_dir: String,

    /// Object detection ONNX file
    #[arg(
        long,
        env = "DETECTION_MODEL_PATH",
        default_value = "./models/fasterrcnn-resnet50-fpn/model.onnx"
    )]
    pub detection_model_path: String,

    /// Detections must score strictly above this
    #[arg(long, env = "DETECTION_SCORE_THRESHOLD", default_value_t = 0.5)]
    pub detection_score_threshold: f32,

    /// Maximum tokens generated per handwriting image
    #[arg(long, env = "RECOGNIZER_MAX_TOKENS", default_value_t = 64)]
    pub recognizer_max_tokens: usize,

    /// ONNX Runtime intra-op threads per model session
    #[arg(long, env = "ONNX_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Socket address from host and port
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }

    /// Model loading settings derived from this configuration
    pub fn vision_config(&self) -> VisionModelConfig {
        VisionModelConfig {
            handwriting_model_dir: Some(self.handwriting_model_dir.clone()),
            detection_model_path: Some(self.detection_model_path.clone()),
            detection_score_threshold: self.detection_score_threshold,
            recognizer_max_tokens: self.recognizer_max_tokens,
            intra_threads: self.intra_threads,
        }
    }
}
