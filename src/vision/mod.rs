// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based image analysis
//!
//! This module provides:
//! - Handwriting recognition via an ONNX encoder/decoder model
//! - Classical circle, rectangle and text-region annotation
//! - Object detection via a Faster R-CNN ONNX export
//!
//! All inference runs on CPU.

pub mod annotation;
pub mod detection;
pub mod handwriting;
pub mod image_utils;
pub mod model_manager;

pub use annotation::{Annotation, AnnotationKind, AnnotatorConfig, Coordinates, ShapeAnnotator};
pub use detection::{Detection, DetectionReport, ObjectDetector};
pub use handwriting::{HandwritingRecognizer, RecognitionResult};
pub use image_utils::{decode_image_bytes, detect_format, encode_png, ImageError, ImageInfo};
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
