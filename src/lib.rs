// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod pipeline;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{create_app, AppState};
pub use config::ServiceConfig;
pub use pipeline::{ImagePipeline, ProcessedImageResult};
pub use vision::{Annotation, AnnotationKind, Coordinates, VisionModelManager};
