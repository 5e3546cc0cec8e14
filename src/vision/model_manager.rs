// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading and sharing the recognizer and detector

use serde::Serialize;
use std::sync::Arc;

use crate::vision::detection::{ObjectDetector, DEFAULT_SCORE_THRESHOLD};
use crate::vision::handwriting::{HandwritingRecognizer, RecognizerOptions};

/// Configuration for loading vision models
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    /// Path to the handwriting recognizer directory (optional)
    pub handwriting_model_dir: Option<String>,
    /// Path to the object detection ONNX file (optional)
    pub detection_model_path: Option<String>,
    /// Detections must score strictly above this
    pub detection_score_threshold: f32,
    /// Token cap for handwriting generation
    pub recognizer_max_tokens: usize,
    /// ONNX Runtime intra-op threads per session
    pub intra_threads: usize,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            handwriting_model_dir: Some("./models/trocr-base-handwritten-onnx".to_string()),
            detection_model_path: Some("./models/fasterrcnn-resnet50-fpn/model.onnx".to_string()),
            detection_score_threshold: DEFAULT_SCORE_THRESHOLD,
            recognizer_max_tokens: RecognizerOptions::default().max_tokens,
            intra_threads: 4,
        }
    }
}

/// Availability of one model, as reported by `/health`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type (handwriting, detection)
    pub model_type: String,
    /// Whether the model is available
    pub available: bool,
}

/// Manager for the learned vision models
///
/// Models load once at startup and are shared read-only afterwards. A model
/// that fails to load is left absent; the service keeps running without it.
#[derive(Debug, Default)]
pub struct VisionModelManager {
    recognizer: Option<Arc<HandwritingRecognizer>>,
    detector: Option<Arc<ObjectDetector>>,
}

impl VisionModelManager {
    /// Create a new VisionModelManager with the given configuration
    ///
    /// Missing model files are handled gracefully: a warning is logged and
    /// the capability is reported unavailable.
    pub async fn new(config: VisionModelConfig) -> anyhow::Result<Self> {
        let recognizer = if let Some(ref dir) = config.handwriting_model_dir {
            let options = RecognizerOptions {
                max_tokens: config.recognizer_max_tokens,
                intra_threads: config.intra_threads,
            };
            match HandwritingRecognizer::new(dir, options).await {
                Ok(model) => {
                    tracing::info!("✅ Handwriting recognizer loaded from {}", dir);
                    Some(Arc::new(model))
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to load handwriting model from {}: {:#}", dir, e);
                    None
                }
            }
        } else {
            None
        };

        let detector = if let Some(ref path) = config.detection_model_path {
            match ObjectDetector::new(path, config.intra_threads).await {
                Ok(model) => {
                    tracing::info!("✅ Object detector loaded from {}", path);
                    Some(Arc::new(model.with_score_threshold(config.detection_score_threshold)))
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to load detection model from {}: {:#}", path, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            recognizer,
            detector,
        })
    }

    /// Manager with no learned models loaded
    pub fn without_models() -> Self {
        Self::default()
    }

    /// Get the handwriting recognizer if available
    pub fn recognizer(&self) -> Option<Arc<HandwritingRecognizer>> {
        self.recognizer.clone()
    }

    /// Get the object detector if available
    pub fn detector(&self) -> Option<Arc<ObjectDetector>> {
        self.detector.clone()
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    /// List all vision models and whether each is loaded
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![
            VisionModelInfo {
                name: "trocr-base-handwritten".to_string(),
                model_type: "handwriting".to_string(),
                available: self.recognizer.is_some(),
            },
            VisionModelInfo {
                name: "fasterrcnn-resnet50-fpn".to_string(),
                model_type: "detection".to_string(),
                available: self.detector.is_some(),
            },
        ]
    }
}
