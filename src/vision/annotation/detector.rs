// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shape/region annotator over raw upload bytes

use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

use super::circles::{detect_circles, HoughCircleParams};
use super::contours::{find_external_contours, rectangles_from_contours, text_regions_from_contours, TextRegionFilter};
use super::preprocessing::{binarize, SMOOTHING_SIGMA, THRESHOLD_BLOCK_SIGMA, THRESHOLD_OFFSET};
use super::{Annotation, AnnotationKind, Coordinates};
use crate::vision::image_utils::{decode_image_bytes, ImageError};

/// Calibration constants for the annotation pass
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorConfig {
    /// Sigma of the pre-threshold smoothing
    pub smoothing_sigma: f32,
    /// Sigma of the adaptive threshold's weighting window
    pub threshold_block_sigma: f32,
    /// How far below the local mean a pixel must be to count as ink
    pub threshold_offset: i32,
    pub circles: HoughCircleParams,
    /// Fixed confidence reported for every circle
    pub circle_confidence: f32,
    /// Contour area that maps to full rectangle confidence
    pub rectangle_area_scale: f64,
    pub text_filter: TextRegionFilter,
    /// Box area that maps to full text-region confidence
    pub text_area_scale: f64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            smoothing_sigma: SMOOTHING_SIGMA,
            threshold_block_sigma: THRESHOLD_BLOCK_SIGMA,
            threshold_offset: THRESHOLD_OFFSET,
            circles: HoughCircleParams::default(),
            circle_confidence: 0.8,
            rectangle_area_scale: 1000.0,
            text_filter: TextRegionFilter::default(),
            text_area_scale: 1000.0,
        }
    }
}

/// Classical annotator: circles, then rectangles, then text regions
///
/// Stateless apart from its configuration; safe to share between requests.
#[derive(Debug, Clone, Default)]
pub struct ShapeAnnotator {
    config: AnnotatorConfig,
}

impl ShapeAnnotator {
    pub fn new(config: AnnotatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Decode `bytes` and annotate the image
    ///
    /// # Errors
    /// Returns `ImageError` if the bytes are not a decodable image.
    pub fn detect_annotations(&self, bytes: &[u8]) -> Result<Vec<Annotation>, ImageError> {
        let (image, info) = decode_image_bytes(bytes)?;
        debug!(
            "Annotating {}x{} {:?} image ({} bytes)",
            info.width, info.height, info.format, info.size_bytes
        );
        Ok(self.annotate(&image))
    }

    /// Annotate an already-decoded image
    pub fn annotate(&self, image: &DynamicImage) -> Vec<Annotation> {
        let start = Instant::now();
        let cfg = &self.config;

        let binary = binarize(
            image,
            cfg.smoothing_sigma,
            cfg.threshold_block_sigma,
            cfg.threshold_offset,
        );

        let circles: Vec<Annotation> = detect_circles(&binary, &cfg.circles)
            .into_iter()
            .map(|c| Annotation {
                kind: AnnotationKind::Circle,
                coordinates: Coordinates::Circle([c.x, c.y, c.radius]),
                confidence: cfg.circle_confidence,
            })
            .collect();

        let contours = find_external_contours(&binary);
        let rectangles = rectangles_from_contours(&contours, cfg.rectangle_area_scale);
        let text_regions = text_regions_from_contours(&contours, &cfg.text_filter, cfg.text_area_scale);

        info!(
            circles = circles.len(),
            rectangles = rectangles.len(),
            text_regions = text_regions.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Annotation pass complete"
        );

        let mut annotations = circles;
        annotations.extend(rectangles);
        annotations.extend(text_regions);
        annotations
    }
}
