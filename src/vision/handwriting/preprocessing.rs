// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the handwriting recognizer

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Square input size of the recognizer's vision encoder
pub const RECOGNIZER_INPUT_SIZE: u32 = 384;

/// Per-channel normalization mean
pub const MEAN: [f32; 3] = [0.5, 0.5, 0.5];

/// Per-channel normalization std
pub const STD: [f32; 3] = [0.5, 0.5, 0.5];

/// Preprocess an image for the recognizer encoder
///
/// Steps:
/// 1. Convert to 3-channel RGB
/// 2. Stretch to RECOGNIZER_INPUT_SIZE x RECOGNIZER_INPUT_SIZE (bilinear)
/// 3. Normalize: (pixel/255 - mean) / std, giving values in [-1, 1]
/// 4. Lay out as NCHW [1, 3, H, W]
pub fn preprocess_for_recognizer(image: &DynamicImage) -> Array4<f32> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8())
        .resize_exact(RECOGNIZER_INPUT_SIZE, RECOGNIZER_INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let size = RECOGNIZER_INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    tensor
}
