// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Grayscale, smoothing and adaptive binarization for the annotator

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Sigma of a 5-tap Gaussian kernel
pub const SMOOTHING_SIGMA: f32 = 1.1;

/// Sigma of the Gaussian weighting over an 11x11 threshold block
pub const THRESHOLD_BLOCK_SIGMA: f32 = 2.0;

/// Amount a pixel must sit below its local mean to count as ink
pub const THRESHOLD_OFFSET: i32 = 2;

/// Convert to single-channel luma
///
/// Already-gray images are copied through untouched.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Gaussian smoothing ahead of thresholding
pub fn smooth(gray: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(gray, sigma)
}

/// Adaptive Gaussian-weighted threshold
///
/// Each pixel is compared against the Gaussian-weighted mean of its
/// neighbourhood. Pixels at least `offset` darker than that mean become
/// foreground (255), everything else background (0), so uniform areas of
/// any brightness produce no foreground at all.
pub fn adaptive_threshold(gray: &GrayImage, block_sigma: f32, offset: i32) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, block_sigma);

    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y)[0] as i32;
        let value = if pixel[0] as i32 - mean <= -offset { 255 } else { 0 };
        binary.put_pixel(x, y, Luma([value]));
    }
    binary
}

/// Full preprocessing chain: grayscale, smoothing, adaptive threshold
pub fn binarize(image: &DynamicImage, smoothing_sigma: f32, block_sigma: f32, offset: i32) -> GrayImage {
    let gray = to_grayscale(image);
    let blurred = smooth(&gray, smoothing_sigma);
    adaptive_threshold(&blurred, block_sigma, offset)
}
