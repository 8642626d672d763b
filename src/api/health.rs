// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::ledger::Network;
use crate::state::AppState;
use crate::storage::{IssuerRepository, TokenRepository};

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// Data directory availability.
    pub data_dir: String,
    /// Database read check.
    pub database: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Service configuration summary.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub network: Network,
    /// Whether seed-based endpoints are open on this network.
    pub seed_operations_enabled: bool,
    pub issuer_initialized: bool,
    pub issuer_cold: Option<String>,
    pub signing_provider: String,
    pub token_count: u64,
}

fn check(ok: bool, failure: &str) -> String {
    if ok { "ok" } else { failure }.to_string()
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let data_ok = state.config.data_dir.exists();
    let db_ok = IssuerRepository::new(&state.db).current().is_ok();
    let all_ok = data_ok && db_ok;

    let response = ReadyResponse {
        status: check(all_ok, "degraded"),
        checks: HealthChecks {
            service: "ok".to_string(),
            data_dir: check(data_ok, "missing"),
            database: check(db_ok, "unavailable"),
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "Health",
    responses(
        (status = 200, description = "Service status", body = StatusResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let issuer = IssuerRepository::new(&state.db).current()?;
    let token_count = TokenRepository::new(&state.db).count()?;
    let network = state.ledger.network();

    Ok(Json(StatusResponse {
        network,
        seed_operations_enabled: !network.is_production(),
        issuer_initialized: issuer.is_some(),
        issuer_cold: issuer.map(|i| i.cold_address),
        signing_provider: state.signing.name().to_string(),
        token_count,
    }))
}
