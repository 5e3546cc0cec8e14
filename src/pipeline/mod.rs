// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-request orchestration of the vision sub-services

pub mod orchestrator;
pub mod outcome;
pub mod services;

pub use orchestrator::{HealthReport, ImagePipeline, PipelineError, PipelineReport, ProcessedImageResult};
pub use outcome::{Degrade, FailureKind, ServiceFailure, ServiceOutcome};
