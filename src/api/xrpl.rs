// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger reads and direct, seed-based ledger operations.
//!
//! Reads are open on every network. The seed-based routes sit behind the
//! production gate in [`super::gate`], which rejects them on mainnet before
//! the request body is read.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    custody::{CustodyError, IssueRequest, RedeemRequest},
    error::ApiError,
    ledger::{
        currency::encode_currency,
        keys::decode_address,
        queries::{holders_from_lines, AccountState, Holder, TrustLine},
        Network, TxOutcome,
    },
    state::AppState,
    storage::IssuerRepository,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct NetworkResponse {
    pub network: Network,
    pub endpoint: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrustLinesResponse {
    pub address: String,
    pub lines: Vec<TrustLine>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct HoldersQuery {
    /// Human currency code to filter by.
    pub currency: Option<String>,
    /// Include holders with a zero balance.
    #[serde(default)]
    pub include_zero: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HoldersResponse {
    pub issuer_cold: String,
    pub holders: Vec<Holder>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FaucetRequest {
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaucetResponse {
    pub address: String,
    /// Faucet response as returned.
    #[schema(value_type = Object)]
    pub result: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub secret: String,
    pub destination: String,
    /// Amount of XRP in drops.
    pub drops: String,
    #[serde(default)]
    pub memos: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrustlineRequestBody {
    pub secret: String,
    pub currency: String,
    pub issuer: String,
    /// Defaults to 1000000000.
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueBody {
    pub token_id: String,
    pub destination: String,
    pub value: String,
    /// Seed of the hot account.
    pub secret: String,
    #[serde(default)]
    pub memos: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemBody {
    pub token_id: String,
    /// Seed of the holder.
    pub secret: String,
    pub value: String,
    #[serde(default)]
    pub memos: Vec<String>,
}

// =============================================================================
// Reads
// =============================================================================

#[utoipa::path(
    get,
    path = "/xrpl/network",
    tag = "Ledger",
    responses(
        (status = 200, description = "Active network", body = NetworkResponse)
    )
)]
pub async fn network(State(state): State<AppState>) -> Json<NetworkResponse> {
    let network = state.ledger.network();
    Json(NetworkResponse {
        network,
        endpoint: state.config.endpoints.url(network).to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/xrpl/account/{address}",
    tag = "Ledger",
    params(("address" = String, Path, description = "Classic address")),
    responses(
        (status = 200, description = "Account state", body = AccountState),
        (status = 400, description = "Invalid address"),
        (status = 502, description = "Ledger error, e.g. account not found")
    )
)]
pub async fn account(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AccountState>, ApiError> {
    decode_address(&address)?;
    Ok(Json(state.ledger.account_state(address).await?))
}

#[utoipa::path(
    get,
    path = "/xrpl/lines/{address}",
    tag = "Ledger",
    params(("address" = String, Path, description = "Classic address")),
    responses(
        (status = 200, description = "Trust lines with decoded currencies", body = TrustLinesResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn lines(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<TrustLinesResponse>, ApiError> {
    decode_address(&address)?;
    let lines = state.ledger.trust_lines(address.clone(), None).await?;
    Ok(Json(TrustLinesResponse { address, lines }))
}

/// Holders of the current issuer's tokens, from the holders' side.
pub(crate) async fn load_holders(
    state: &AppState,
    currency: Option<&str>,
    include_zero: bool,
) -> Result<(String, Vec<Holder>), ApiError> {
    let issuer = IssuerRepository::new(&state.db)
        .current()?
        .ok_or(CustodyError::IssuerNotInitialized)?;
    if let Some(code) = currency {
        encode_currency(code)?;
    }
    let lines = state
        .ledger
        .trust_lines(issuer.cold_address.clone(), None)
        .await?;
    let holders = holders_from_lines(&lines, currency, include_zero)?;
    Ok((issuer.cold_address, holders))
}

#[utoipa::path(
    get,
    path = "/holders",
    tag = "Ledger",
    params(HoldersQuery),
    responses(
        (status = 200, description = "Token holders", body = HoldersResponse),
        (status = 400, description = "Issuer not initialized or invalid currency")
    )
)]
pub async fn holders(
    State(state): State<AppState>,
    Query(query): Query<HoldersQuery>,
) -> Result<Json<HoldersResponse>, ApiError> {
    let (issuer_cold, holders) =
        load_holders(&state, query.currency.as_deref(), query.include_zero).await?;
    Ok(Json(HoldersResponse {
        issuer_cold,
        holders,
    }))
}

// =============================================================================
// Seed-based operations
// =============================================================================

#[utoipa::path(
    post,
    path = "/faucet",
    tag = "Ledger",
    request_body = FaucetRequest,
    responses(
        (status = 200, description = "Account funded", body = FaucetResponse),
        (status = 403, description = "No faucet on the production network"),
        (status = 502, description = "Faucet error")
    )
)]
pub async fn faucet(
    State(state): State<AppState>,
    Json(request): Json<FaucetRequest>,
) -> Result<Json<FaucetResponse>, ApiError> {
    let result = state.operations().fund(&request.address).await?;
    Ok(Json(FaucetResponse {
        address: request.address,
        result,
    }))
}

#[utoipa::path(
    post,
    path = "/xrpl/payment",
    tag = "Ledger",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Submitted", body = TxOutcome),
        (status = 400, description = "Invalid secret, address or amount"),
        (status = 403, description = "Disabled on the production network")
    )
)]
pub async fn payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<TxOutcome>, ApiError> {
    let outcome = state
        .operations()
        .payment(
            &request.secret,
            &request.destination,
            &request.drops,
            request.memos,
        )
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/xrpl/trustline",
    tag = "Ledger",
    request_body = TrustlineRequestBody,
    responses(
        (status = 200, description = "Submitted", body = TxOutcome),
        (status = 400, description = "Invalid secret, currency or issuer"),
        (status = 403, description = "Disabled on the production network")
    )
)]
pub async fn trustline(
    State(state): State<AppState>,
    Json(request): Json<TrustlineRequestBody>,
) -> Result<Json<TxOutcome>, ApiError> {
    let outcome = state
        .operations()
        .trustline(
            &request.secret,
            &request.currency,
            &request.issuer,
            request.limit.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/xrpl/issue",
    tag = "Ledger",
    request_body = IssueBody,
    responses(
        (status = 200, description = "Submitted", body = TxOutcome),
        (status = 400, description = "Invalid input or signer is not the issuer's hot account"),
        (status = 403, description = "Disabled on the production network"),
        (status = 404, description = "Token not found")
    )
)]
pub async fn issue(
    State(state): State<AppState>,
    Json(body): Json<IssueBody>,
) -> Result<Json<TxOutcome>, ApiError> {
    let outcome = state
        .custody()
        .issue(IssueRequest {
            token_id: body.token_id,
            destination: body.destination,
            value: body.value,
            secret: body.secret,
            memos: body.memos,
        })
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/xrpl/redeem",
    tag = "Ledger",
    request_body = RedeemBody,
    responses(
        (status = 200, description = "Submitted", body = TxOutcome),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Disabled on the production network"),
        (status = 404, description = "Token not found")
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    Json(body): Json<RedeemBody>,
) -> Result<Json<TxOutcome>, ApiError> {
    let outcome = state
        .custody()
        .redeem(RedeemRequest {
            token_id: body.token_id,
            secret: body.secret,
            value: body.value,
            memos: body.memos,
        })
        .await?;
    Ok(Json(outcome))
}
