// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classical shape and region annotation
//!
//! Finds circles, rotated rectangles and text-like regions in an image with
//! no learned model:
//! - Grayscale, Gaussian smoothing and adaptive thresholding
//! - Hough-gradient circle transform over the binary image
//! - External contours for rectangles and text-region candidates

pub mod circles;
pub mod contours;
pub mod detector;
pub mod geometry;
pub mod preprocessing;

use serde::{Deserialize, Serialize};

pub use circles::{Circle, HoughCircleParams};
pub use contours::TextRegionFilter;
pub use detector::{AnnotatorConfig, ShapeAnnotator};

/// Geometry family of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Circle,
    Rectangle,
    Text,
}

/// Geometry-specific coordinates, serialized as bare arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    /// `[x, y, r]`: centre and radius
    Circle([f32; 3]),
    /// Four corner points of a rotated box
    Rectangle([[i32; 2]; 4]),
    /// `[x, y, w, h]`: upright box
    Region([u32; 4]),
}

/// A detected geometric region with a confidence in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub coordinates: Coordinates,
    pub confidence: f32,
}
