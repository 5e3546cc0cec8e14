// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hough-gradient circle detection
//!
//! Every Canny edge pixel votes for candidate centres along its gradient
//! direction (both ways, since the edge polarity is unknown). Gradients are
//! taken on a smoothed copy: on hard 0/255 steps Sobel directions snap to
//! multiples of 45 degrees and the votes miss the centre. Accumulator
//! peaks become centres; each centre takes the radius supported by the most
//! edge pixels.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::debug;

/// Smoothing applied before taking gradient directions (Canny's own sigma)
pub const GRADIENT_SIGMA: f32 = 1.4;

/// Parameters of the circle transform (accumulator resolution is fixed at 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughCircleParams {
    /// Minimum distance between accepted centres
    pub min_center_distance: f32,
    /// Upper Canny threshold; the lower one is half of it
    pub canny_high_threshold: f32,
    /// Votes a centre (and its radius) needs
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Default for HoughCircleParams {
    fn default() -> Self {
        Self {
            min_center_distance: 50.0,
            canny_high_threshold: 50.0,
            accumulator_threshold: 30,
            min_radius: 10,
            max_radius: 100,
        }
    }
}

/// A detected circle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Find circles in a grayscale (typically binarized) image
///
/// Circles come back strongest centre first.
pub fn detect_circles(image: &GrayImage, params: &HoughCircleParams) -> Vec<Circle> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || params.min_radius > params.max_radius {
        return Vec::new();
    }

    let edges = canny(
        image,
        params.canny_high_threshold / 2.0,
        params.canny_high_threshold,
    );
    let smoothed = gaussian_blur_f32(image, GRADIENT_SIGMA);
    let gx = horizontal_sobel(&smoothed);
    let gy = vertical_sobel(&smoothed);

    let (w, h) = (width as i64, height as i64);
    let mut accumulator = vec![0u32; (width * height) as usize];
    let mut edge_points: Vec<(f32, f32)> = Vec::new();

    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude == 0.0 {
            continue;
        }
        edge_points.push((x as f32, y as f32));

        let (ux, uy) = (dx / magnitude, dy / magnitude);
        for sign in [1.0f32, -1.0] {
            for r in params.min_radius..=params.max_radius {
                let cx = (x as f32 + sign * r as f32 * ux).round() as i64;
                let cy = (y as f32 + sign * r as f32 * uy).round() as i64;
                if cx < 0 || cy < 0 || cx >= w || cy >= h {
                    break;
                }
                accumulator[(cy * w + cx) as usize] += 1;
            }
        }
    }

    if edge_points.is_empty() {
        return Vec::new();
    }

    let mut centers = local_maxima(&accumulator, width as usize, height as usize, params.accumulator_threshold);
    centers.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)).then(a.0.cmp(&b.0)));

    debug!(
        "{} edge pixels, {} circle centre candidates",
        edge_points.len(),
        centers.len()
    );

    let min_dist_sq = params.min_center_distance * params.min_center_distance;
    let mut circles: Vec<Circle> = Vec::new();

    for (cx, cy, _) in centers {
        let (cx, cy) = (cx as f32, cy as f32);
        let too_close = circles.iter().any(|c| {
            let (ddx, ddy) = (c.x - cx, c.y - cy);
            ddx * ddx + ddy * ddy < min_dist_sq
        });
        if too_close {
            continue;
        }

        if let Some((radius, support)) = best_radius(&edge_points, cx, cy, params) {
            if support > params.accumulator_threshold {
                circles.push(Circle { x: cx, y: cy, radius });
            }
        }
    }

    circles
}

/// Accumulator cells above `threshold` that dominate their 4-neighbourhood
fn local_maxima(acc: &[u32], width: usize, height: usize, threshold: u32) -> Vec<(usize, usize, u32)> {
    let mut peaks = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let v = acc[y * width + x];
            if v <= threshold {
                continue;
            }
            let left = if x > 0 { acc[y * width + x - 1] } else { 0 };
            let right = if x + 1 < width { acc[y * width + x + 1] } else { 0 };
            let up = if y > 0 { acc[(y - 1) * width + x] } else { 0 };
            let down = if y + 1 < height { acc[(y + 1) * width + x] } else { 0 };
            if v > left && v >= right && v > up && v >= down {
                peaks.push((x, y, v));
            }
        }
    }
    peaks
}

/// Most-supported radius around a centre, with its edge-pixel count
fn best_radius(edge_points: &[(f32, f32)], cx: f32, cy: f32, params: &HoughCircleParams) -> Option<(f32, u32)> {
    let span = (params.max_radius - params.min_radius + 1) as usize;
    let mut histogram = vec![0u32; span];

    for &(x, y) in edge_points {
        let r = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt().round() as i64;
        if r < params.min_radius as i64 || r > params.max_radius as i64 {
            continue;
        }
        histogram[(r - params.min_radius as i64) as usize] += 1;
    }

    // Ties keep the smaller radius
    let (offset, &count) = histogram
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, &u32)>, (i, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((i, c)),
        })?;

    if count == 0 {
        return None;
    }
    Some(((params.min_radius as usize + offset) as f32, count))
}
