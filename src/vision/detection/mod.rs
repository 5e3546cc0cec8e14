// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection over the 80 COCO categories

pub mod labels;
pub mod model;
pub mod preprocessing;

pub use labels::{label_name, COCO_NAMES};
pub use model::{filter_predictions, Detection, DetectionReport, ObjectDetector, DEFAULT_SCORE_THRESHOLD};
