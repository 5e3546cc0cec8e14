// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image processing endpoint (POST /process-image)

pub mod handler;
pub mod request;

pub use handler::process_image_handler;
pub use request::{read_upload, FILE_FIELD};
