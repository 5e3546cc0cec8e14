// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! External contour extraction and the rectangle / text-region passes

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use tracing::debug;

use super::geometry::{bounding_rect, compress_chain, contour_area, min_area_rect, PixelRect};
use super::{Annotation, AnnotationKind, Coordinates};

/// An outer boundary of a foreground region, chain-compressed
#[derive(Debug, Clone)]
pub struct ExternalContour {
    /// Direction-change points of the boundary
    pub points: Vec<Point<i32>>,
    /// Enclosed area (shoelace)
    pub area: f64,
    /// Upright bounding box
    pub bounds: PixelRect,
}

/// Find the outermost contours of the foreground (non-zero) pixels
///
/// Holes and contours nested inside other regions are skipped. Order is the
/// raster order in which each region is first met.
pub fn find_external_contours(binary: &GrayImage) -> Vec<ExternalContour> {
    let contours = find_contours::<i32>(binary);
    let total = contours.len();

    let external: Vec<ExternalContour> = contours
        .into_iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .filter_map(|c| {
            let points = compress_chain(&c.points);
            let bounds = bounding_rect(&points)?;
            Some(ExternalContour {
                area: contour_area(&points),
                points,
                bounds,
            })
        })
        .collect();

    debug!("{} contours found, {} external", total, external.len());
    external
}

/// One rectangle annotation per contour: its minimum-area rotated box
///
/// Confidence is the contour area scaled by `area_scale`, capped at 1.0.
pub fn rectangles_from_contours(contours: &[ExternalContour], area_scale: f64) -> Vec<Annotation> {
    contours
        .iter()
        .filter_map(|contour| {
            let corners = min_area_rect(&contour.points)?;
            let confidence = (contour.area / area_scale).min(1.0) as f32;
            Some(Annotation {
                kind: AnnotationKind::Rectangle,
                coordinates: Coordinates::Rectangle(corners.map(|p| [p.x, p.y])),
                confidence,
            })
        })
        .collect()
}

/// Bounds on the upright boxes that count as text-like
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRegionFilter {
    /// Exclusive lower bound on width / height
    pub min_aspect: f64,
    /// Exclusive upper bound on width / height
    pub max_aspect: f64,
    /// Width must exceed this
    pub min_width: i32,
    /// Height must exceed this
    pub min_height: i32,
}

impl Default for TextRegionFilter {
    fn default() -> Self {
        Self {
            min_aspect: 0.1,
            max_aspect: 10.0,
            min_width: 20,
            min_height: 20,
        }
    }
}

impl TextRegionFilter {
    pub fn accepts(&self, rect: &PixelRect) -> bool {
        let aspect = rect.aspect_ratio();
        aspect > self.min_aspect
            && aspect < self.max_aspect
            && rect.width > self.min_width
            && rect.height > self.min_height
    }
}

/// Text-region annotations from the contour bounding boxes that pass `filter`
///
/// Confidence is the box area scaled by `area_scale`, capped at 1.0.
pub fn text_regions_from_contours(
    contours: &[ExternalContour],
    filter: &TextRegionFilter,
    area_scale: f64,
) -> Vec<Annotation> {
    contours
        .iter()
        .map(|c| c.bounds)
        .filter(|rect| filter.accepts(rect))
        .map(|rect| Annotation {
            kind: AnnotationKind::Text,
            coordinates: Coordinates::Region([
                rect.x.max(0) as u32,
                rect.y.max(0) as u32,
                rect.width as u32,
                rect.height as u32,
            ]),
            confidence: (rect.area() as f64 / area_scale).min(1.0) as f32,
        })
        .collect()
}
