// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trustline request endpoints.
//!
//! A request is bookkeeping only. Approving it does not touch the ledger;
//! the holder still opens the line, typically through `/onboard/trustline`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    custody::CustodyError,
    error::ApiError,
    ledger::{amount::validate_value, keys::decode_address},
    state::AppState,
    storage::{TokenRepository, TrustlineRequest, TrustlineRequestRepository, TrustlineStatus},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrustlineRequest {
    pub space_id: String,
    pub address: String,
    pub token_id: String,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TrustlineListQuery {
    /// `pending` (default), `approved` or `rejected`.
    pub status: Option<TrustlineStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrustlineListResponse {
    pub requests: Vec<TrustlineRequest>,
    pub total: usize,
}

#[utoipa::path(
    post,
    path = "/trustline-requests",
    tag = "Trustlines",
    request_body = CreateTrustlineRequest,
    responses(
        (status = 201, description = "Request created", body = TrustlineRequest),
        (status = 400, description = "Invalid address or limit"),
        (status = 404, description = "Token not found")
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    Json(request): Json<CreateTrustlineRequest>,
) -> Result<(StatusCode, Json<TrustlineRequest>), ApiError> {
    if request.space_id.trim().is_empty() {
        return Err(ApiError::bad_request("spaceId is required"));
    }
    decode_address(&request.address)?;
    if let Some(limit) = &request.limit {
        validate_value(limit)?;
    }
    TokenRepository::new(&state.db)
        .get(&request.token_id)?
        .ok_or_else(|| CustodyError::TokenNotFound(request.token_id.clone()))?;

    let created = TrustlineRequest::new(
        request.space_id.trim(),
        &request.address,
        &request.token_id,
        request.limit,
    );
    TrustlineRequestRepository::new(&state.db).create(&created)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/trustline-requests",
    tag = "Trustlines",
    params(TrustlineListQuery),
    responses(
        (status = 200, description = "Requests with the given status", body = TrustlineListResponse)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<TrustlineListQuery>,
) -> Result<Json<TrustlineListResponse>, ApiError> {
    let requests = TrustlineRequestRepository::new(&state.db)
        .list_by_status(query.status.unwrap_or_default())?;
    let total = requests.len();
    Ok(Json(TrustlineListResponse { requests, total }))
}

#[utoipa::path(
    post,
    path = "/trustline-requests/{id}/approve",
    tag = "Trustlines",
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved", body = TrustlineRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already decided")
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrustlineRequest>, ApiError> {
    decide(&state, &id, TrustlineStatus::Approved)
}

#[utoipa::path(
    post,
    path = "/trustline-requests/{id}/reject",
    tag = "Trustlines",
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected", body = TrustlineRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already decided")
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrustlineRequest>, ApiError> {
    decide(&state, &id, TrustlineStatus::Rejected)
}

fn decide(
    state: &AppState,
    id: &str,
    decision: TrustlineStatus,
) -> Result<Json<TrustlineRequest>, ApiError> {
    let decided = TrustlineRequestRepository::new(&state.db).decide(id, decision)?;
    tracing::info!(request_id = %id, status = ?decided.status, "Trustline request decided");
    Ok(Json(decided))
}
