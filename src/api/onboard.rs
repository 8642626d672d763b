// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-app signing endpoints.
//!
//! These are the only way to move funds on the production network. The
//! server builds the transaction, the user signs it in their wallet app, and
//! the result endpoints log the signed transaction once per transaction id.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    signing::{
        await_resolution, CreatedPayload, PollOutcome, SigningRequest, SigningResult,
        DEFAULT_POLL_INTERVAL,
    },
    state::AppState,
};

/// Longest a result request may block waiting for a signature.
pub const MAX_RESULT_WAIT_SECS: u64 = 60;

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub provider: String,
    #[schema(value_type = Object)]
    pub result: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenericPayloadRequest {
    /// Transaction JSON with at least a `TransactionType`.
    #[schema(value_type = Object)]
    pub txjson: Value,
    /// Let the wallet app submit after signing.
    #[serde(default)]
    pub submit: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardTrustlineRequest {
    /// Account expected to sign. Left to the wallet app when absent.
    pub account: Option<String>,
    pub token_id: String,
    /// Defaults to 1000000.
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardIssueRequest {
    pub token_id: String,
    pub destination: String,
    pub value: String,
    #[serde(default)]
    pub memos: Vec<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuery {
    /// Block up to this many seconds (max 60) for the payload to resolve.
    pub wait_seconds: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/xumm/ping",
    tag = "Signing",
    responses(
        (status = 200, description = "Provider reachable", body = PingResponse),
        (status = 502, description = "Provider error")
    )
)]
pub async fn ping(State(state): State<AppState>) -> Result<Json<PingResponse>, ApiError> {
    let result = state.signing.ping().await?;
    Ok(Json(PingResponse {
        provider: state.signing.name().to_string(),
        result,
    }))
}

#[utoipa::path(
    post,
    path = "/xumm/payload",
    tag = "Signing",
    request_body = GenericPayloadRequest,
    responses(
        (status = 201, description = "Payload created", body = CreatedPayload),
        (status = 400, description = "txjson has no TransactionType"),
        (status = 502, description = "Provider error")
    )
)]
pub async fn create_payload(
    State(state): State<AppState>,
    Json(request): Json<GenericPayloadRequest>,
) -> Result<(StatusCode, Json<CreatedPayload>), ApiError> {
    create(
        &state,
        SigningRequest::Generic {
            txjson: request.txjson,
            submit: request.submit,
        },
    )
    .await
}

#[utoipa::path(
    get,
    path = "/xumm/payload/{uuid}",
    tag = "Signing",
    params(("uuid" = String, Path, description = "Payload UUID")),
    responses(
        (status = 200, description = "Payload state", body = SigningResult),
        (status = 404, description = "Unknown payload")
    )
)]
pub async fn get_payload(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<SigningResult>, ApiError> {
    Ok(Json(state.gateway().poll(&uuid).await?))
}

#[utoipa::path(
    post,
    path = "/onboard/start",
    tag = "Signing",
    responses(
        (status = 201, description = "Sign-in payload created", body = CreatedPayload),
        (status = 502, description = "Provider error")
    )
)]
pub async fn start(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreatedPayload>), ApiError> {
    create(&state, SigningRequest::SignIn).await
}

#[utoipa::path(
    post,
    path = "/onboard/trustline",
    tag = "Signing",
    request_body = OnboardTrustlineRequest,
    responses(
        (status = 201, description = "TrustSet payload created", body = CreatedPayload),
        (status = 400, description = "Invalid account or limit"),
        (status = 404, description = "Token not found")
    )
)]
pub async fn trustline(
    State(state): State<AppState>,
    Json(request): Json<OnboardTrustlineRequest>,
) -> Result<(StatusCode, Json<CreatedPayload>), ApiError> {
    create(
        &state,
        SigningRequest::Trustline {
            account: request.account,
            token_id: request.token_id,
            limit: request.limit,
        },
    )
    .await
}

#[utoipa::path(
    post,
    path = "/onboard/issue",
    tag = "Signing",
    request_body = OnboardIssueRequest,
    responses(
        (status = 201, description = "Issuance payload created", body = CreatedPayload),
        (status = 400, description = "Invalid destination or value"),
        (status = 404, description = "Token not found")
    )
)]
pub async fn issue(
    State(state): State<AppState>,
    Json(request): Json<OnboardIssueRequest>,
) -> Result<(StatusCode, Json<CreatedPayload>), ApiError> {
    create(
        &state,
        SigningRequest::Issue {
            token_id: request.token_id,
            destination: request.destination,
            value: request.value,
            memos: request.memos,
        },
    )
    .await
}

/// Poll a payload, optionally blocking until it resolves.
///
/// When the wait runs out the latest unresolved state is returned.
#[utoipa::path(
    get,
    path = "/onboard/result/{uuid}",
    tag = "Signing",
    params(("uuid" = String, Path, description = "Payload UUID"), ResultQuery),
    responses(
        (status = 200, description = "Payload state", body = SigningResult),
        (status = 404, description = "Unknown payload"),
        (status = 503, description = "Server shutting down")
    )
)]
pub async fn result(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ResultQuery>,
) -> Result<Json<SigningResult>, ApiError> {
    let gateway = state.gateway();
    let wait = query.wait_seconds.unwrap_or(0).min(MAX_RESULT_WAIT_SECS);
    if wait == 0 {
        return Ok(Json(gateway.poll(&uuid).await?));
    }

    let outcome = await_resolution(
        &gateway,
        &uuid,
        DEFAULT_POLL_INTERVAL,
        Duration::from_secs(wait),
        &state.shutdown,
    )
    .await?;
    match outcome {
        PollOutcome::Resolved(result) => Ok(Json(result)),
        PollOutcome::TimedOut => Ok(Json(gateway.poll(&uuid).await?)),
        PollOutcome::Cancelled => Err(ApiError::service_unavailable("Server is shutting down")),
    }
}

async fn create(
    state: &AppState,
    request: SigningRequest,
) -> Result<(StatusCode, Json<CreatedPayload>), ApiError> {
    let created = state.gateway().create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
