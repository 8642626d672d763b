// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issuer lifecycle endpoints.

use std::fmt::Write as _;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    custody::InitializedIssuer,
    error::ApiError,
    ledger::Network,
    state::AppState,
    storage::{IssuerRepository, StoredIssuer, StoredToken, TokenRepository},
};

/// Request to create the issuer account pair.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InitIssuerRequest {
    /// Organization name, at least 3 characters.
    pub org: String,
    /// Domain published in the cold account's xrp-ledger.toml.
    pub domain: Option<String>,
}

/// Create and configure a cold/hot issuer pair.
///
/// The response carries both seeds. They are shown once and never stored.
#[utoipa::path(
    post,
    path = "/issuer/init",
    tag = "Issuer",
    request_body = InitIssuerRequest,
    responses(
        (status = 201, description = "Issuer created", body = InitializedIssuer),
        (status = 400, description = "Invalid organization name"),
        (status = 502, description = "A required setup step failed on the ledger"),
        (status = 503, description = "Ledger unavailable")
    )
)]
pub async fn init_issuer(
    State(state): State<AppState>,
    Json(request): Json<InitIssuerRequest>,
) -> Result<(StatusCode, Json<InitializedIssuer>), ApiError> {
    let initialized = state
        .custody()
        .initialize_issuer(&request.org, request.domain.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(initialized)))
}

/// The current issuer.
#[utoipa::path(
    get,
    path = "/issuer",
    tag = "Issuer",
    responses(
        (status = 200, description = "Current issuer", body = StoredIssuer),
        (status = 404, description = "No issuer has been initialized")
    )
)]
pub async fn get_issuer(State(state): State<AppState>) -> Result<Json<StoredIssuer>, ApiError> {
    IssuerRepository::new(&state.db)
        .current()?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Issuer not initialized"))
}

/// Issuer attestation file for wallets and explorers.
#[utoipa::path(
    get,
    path = "/.well-known/xrp-ledger.toml",
    tag = "Issuer",
    responses(
        (status = 200, description = "xrp-ledger.toml", body = String, content_type = "text/plain")
    )
)]
pub async fn xrp_ledger_toml(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let issuer = IssuerRepository::new(&state.db).current()?;
    let tokens = match &issuer {
        Some(issuer) => TokenRepository::new(&state.db).list_for_issuer(&issuer.id)?,
        None => Vec::new(),
    };
    let body = render_toml(state.ledger.network(), issuer.as_ref(), &tokens);
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

fn render_toml(network: Network, issuer: Option<&StoredIssuer>, tokens: &[StoredToken]) -> String {
    let mut out = String::from("# XRPL TOML\n");
    let _ = writeln!(out, "NETWORK = {}", quote(network.as_str()));

    let Some(issuer) = issuer else {
        return out;
    };

    let _ = write!(
        out,
        "\n[[ACCOUNTS]]\naddress = {}\ndesc = \"Cold issuing account\"\n",
        quote(&issuer.cold_address)
    );
    let _ = write!(
        out,
        "\n[[ACCOUNTS]]\naddress = {}\ndesc = \"Hot operational account\"\n",
        quote(&issuer.hot_address)
    );
    let _ = write!(
        out,
        "\n[[ISSUERS]]\naddress = {}\nname = {}\n",
        quote(&issuer.cold_address),
        quote(&issuer.org_name)
    );
    if let Some(domain) = &issuer.domain {
        let _ = writeln!(out, "domain = {}", quote(domain));
    }

    for token in tokens {
        let _ = write!(
            out,
            "\n[[TOKENS]]\nissuer = {}\ncurrency = {}\nname = {}\ndisplay_decimals = {}\n",
            quote(&issuer.cold_address),
            quote(&token.code),
            quote(&token.name),
            token.precision
        );
    }
    out
}

/// TOML basic string.
fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
