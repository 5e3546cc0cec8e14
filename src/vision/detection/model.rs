// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Two-stage object detector (Faster R-CNN ONNX export)
//!
//! The graph takes one [3, H, W] image and returns `boxes [N, 4]`,
//! `labels [N]` and `scores [N]`. Only detections scoring strictly above the
//! threshold are reported.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::Ix2;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use super::labels::label_name;
use super::preprocessing::image_to_tensor;

/// Default minimum score; detections must score strictly above it
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// A labeled, scored box in original image pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `[x1, y1, x2, y2]`
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    pub score: f32,
    pub label: String,
}

/// Detector output for one image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Mean score of `detections`; 0.0 when there are none
    pub confidence: f32,
    pub detections: Vec<Detection>,
    /// Set only when detection failed and this report is a stand-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionReport {
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        let confidence = if detections.is_empty() {
            0.0
        } else {
            detections.iter().map(|d| d.score).sum::<f32>() / detections.len() as f32
        };
        Self {
            confidence,
            detections,
            error: None,
        }
    }

    /// Zero-confidence report carrying the failure message
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            confidence: 0.0,
            detections: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Keep predictions scoring above `threshold`, naming their labels
///
/// Rows beyond the shortest of the three outputs are ignored.
pub fn filter_predictions(
    boxes: &[[f32; 4]],
    labels: &[i64],
    scores: &[f32],
    threshold: f32,
) -> Vec<Detection> {
    boxes
        .iter()
        .zip(labels)
        .zip(scores)
        .filter(|(_, score)| **score > threshold)
        .map(|((bbox, &label), &score)| Detection {
            bbox: *bbox,
            score,
            label: label_name(label).to_string(),
        })
        .collect()
}

/// Faster R-CNN object detector (ONNX, CPU)
#[derive(Clone)]
pub struct ObjectDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    input_name: String,
    score_threshold: f32,
    model_path: String,
}

impl std::fmt::Debug for ObjectDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDetector")
            .field("input_name", &self.input_name)
            .field("score_threshold", &self.score_threshold)
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

impl ObjectDetector {
    /// Load the detector from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing, ONNX Runtime rejects it, or the
    /// graph does not have the three expected outputs.
    pub async fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading object detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detection model from {}",
                model_path.display()
            ))?;

        if session.outputs.len() < 3 {
            anyhow::bail!(
                "Detection model has {} outputs, expected boxes, labels and scores",
                session.outputs.len()
            );
        }

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!("Detection model input: {}", input_name);
        info!("✅ Object detection model loaded (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            model_path: model_path.to_string_lossy().to_string(),
        })
    }

    /// Set the score threshold
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Detect objects in an image
    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionReport> {
        let start = Instant::now();

        let input = Value::from_array(image_to_tensor(image)).context("Failed to create input tensor")?;

        let (boxes, labels, scores) = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .context("Detection inference failed")?;

            let boxes = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract boxes")?;
            let labels = outputs[1]
                .try_extract_array::<i64>()
                .context("Failed to extract labels")?;
            let scores = outputs[2]
                .try_extract_array::<f32>()
                .context("Failed to extract scores")?;

            let boxes = boxes
                .into_dimensionality::<Ix2>()
                .context("Boxes output is not [N, 4]")?;
            if boxes.ncols() != 4 {
                anyhow::bail!("Unexpected boxes shape: {:?}", boxes.shape());
            }

            let boxes: Vec<[f32; 4]> = boxes
                .outer_iter()
                .map(|row| [row[0], row[1], row[2], row[3]])
                .collect();
            let labels: Vec<i64> = labels.iter().copied().collect();
            let scores: Vec<f32> = scores.iter().copied().collect();
            (boxes, labels, scores)
        };

        let detections = filter_predictions(&boxes, &labels, &scores, self.score_threshold);
        let report = DetectionReport::from_detections(detections);

        info!(
            "Object detection: {} of {} candidates kept, confidence {:.3}, {}ms",
            report.detections.len(),
            scores.len(),
            report.confidence,
            start.elapsed().as_millis()
        );

        Ok(report)
    }
}
