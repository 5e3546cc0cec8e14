// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::http_server::AppState;
use crate::pipeline::HealthReport;

/// GET /health - liveness plus model availability
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.pipeline.health_check())
}
