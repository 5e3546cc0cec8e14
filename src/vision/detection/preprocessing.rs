// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image to tensor conversion for the object detector
//!
//! The detection graph resizes and normalizes internally, so the image keeps
//! its own size and is only rescaled to [0, 1].

use image::DynamicImage;
use ndarray::Array3;

/// Convert to a CHW [3, H, W] tensor with values in [0, 1]
pub fn image_to_tensor(image: &DynamicImage) -> Array3<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut tensor = Array3::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}
