// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token registry endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    custody::CustodyError,
    error::ApiError,
    state::AppState,
    storage::{
        record_best_effort, Event, EventType, IssuerRepository, StoredToken, TokenRepository,
    },
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTokenRequest {
    /// Currency code as entered: 3-character standard code or up to 20 bytes.
    pub code: String,
    pub name: String,
    /// Display decimals, 0 to 15. Defaults to 6.
    pub precision: Option<u8>,
}

/// A token with its ledger wire currency.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(flatten)]
    pub token: StoredToken,
    pub wire_currency: String,
}

impl TryFrom<StoredToken> for TokenResponse {
    type Error = ApiError;

    fn try_from(token: StoredToken) -> Result<Self, Self::Error> {
        let wire_currency = token.wire_currency()?;
        Ok(Self {
            token,
            wire_currency,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenResponse>,
    pub total: usize,
}

/// Register a token under the current issuer.
#[utoipa::path(
    post,
    path = "/tokens",
    tag = "Tokens",
    request_body = CreateTokenRequest,
    responses(
        (status = 201, description = "Token registered", body = TokenResponse),
        (status = 400, description = "Invalid token or issuer not initialized")
    )
)]
pub async fn create_token(
    State(state): State<AppState>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let issuer = IssuerRepository::new(&state.db)
        .current()?
        .ok_or(CustodyError::IssuerNotInitialized)?;

    let token = StoredToken::new(&issuer.id, &request.code, &request.name, request.precision)?;
    TokenRepository::new(&state.db).create(&token)?;

    record_best_effort(
        &state.db,
        &Event::new(EventType::TokenCreated)
            .with_route("/tokens")
            .with_account(&issuer.cold_address)
            .with_token(&token.id, &issuer.cold_address, &token.code),
    );
    tracing::info!(token_id = %token.id, code = %token.code, "Token registered");

    Ok((StatusCode::CREATED, Json(TokenResponse::try_from(token)?)))
}

/// All tokens, newest first.
#[utoipa::path(
    get,
    path = "/tokens",
    tag = "Tokens",
    responses(
        (status = 200, description = "Tokens", body = TokenListResponse)
    )
)]
pub async fn list_tokens(State(state): State<AppState>) -> Result<Json<TokenListResponse>, ApiError> {
    let tokens = TokenRepository::new(&state.db)
        .list()?
        .into_iter()
        .map(TokenResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let total = tokens.len();
    Ok(Json(TokenListResponse { tokens, total }))
}
