// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Typed results of the three sub-services
//!
//! A sub-service never fails the request. It either completes or reports a
//! typed failure, and the orchestrator swaps a failure for that service's
//! empty value so the response shape stays fixed.

use std::fmt;
use thiserror::Error;

use crate::vision::detection::DetectionReport;
use crate::vision::image_utils::ImageError;

/// Why a sub-service produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Upload bytes are not a decodable image
    Decode,
    /// The model this service needs is not loaded
    ModelUnavailable,
    /// The model or library failed while processing
    Inference,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::ModelUnavailable => "model_unavailable",
            Self::Inference => "inference",
        };
        f.write_str(name)
    }
}

/// A failure reason plus a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn model_unavailable(model: &str) -> Self {
        Self::new(FailureKind::ModelUnavailable, format!("{model} model is not loaded"))
    }

    /// Keep the whole context chain of a model error
    pub fn inference(error: &anyhow::Error) -> Self {
        Self::new(FailureKind::Inference, format!("{error:#}"))
    }
}

impl From<ImageError> for ServiceFailure {
    fn from(error: ImageError) -> Self {
        Self::new(FailureKind::Decode, error.to_string())
    }
}

/// Value a service reports in place of a failed result
pub trait Degrade: Sized {
    fn degraded(failure: &ServiceFailure) -> Self;
}

impl<T> Degrade for Vec<T> {
    fn degraded(_failure: &ServiceFailure) -> Self {
        Vec::new()
    }
}

impl Degrade for DetectionReport {
    fn degraded(failure: &ServiceFailure) -> Self {
        DetectionReport::degraded(failure.message.clone())
    }
}

/// Result of one sub-service run
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutcome<T> {
    Completed(T),
    Failed(ServiceFailure),
}

impl<T> ServiceOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed(_) => None,
        }
    }
}

impl<T: Degrade> ServiceOutcome<T> {
    /// The completed value, or the service's degraded stand-in
    pub fn into_degraded(self) -> T {
        match self {
            Self::Completed(value) => value,
            Self::Failed(failure) => T::degraded(&failure),
        }
    }
}

impl<T, E: Into<ServiceFailure>> From<Result<T, E>> for ServiceOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(error) => Self::Failed(error.into()),
        }
    }
}
