// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet generation and bookkeeping endpoints.
//!
//! Generated seeds are returned exactly once in the creation response and
//! never written to the database.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    ledger::{
        assert_not_production,
        keys::{generate_wallet, GeneratedWallet, KeyAlgorithm},
        GatedOperation,
    },
    state::AppState,
    storage::{record_best_effort, Event, EventType, StoredWallet, WalletRepository},
};

/// Request to generate a new wallet.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub space_id: Option<String>,
    pub user_id: Option<String>,
    /// Fund the new account from the faucet. Test networks only.
    #[serde(default)]
    pub fund: bool,
    #[serde(default)]
    pub algorithm: KeyAlgorithm,
}

/// Response after generating a wallet.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletResponse {
    pub wallet: StoredWallet,
    /// Keys of the new account. Store the seed now; it is not kept.
    pub keys: GeneratedWallet,
    pub funded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub faucet: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fund_error: Option<String>,
}

/// Response containing a list of wallets.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletListResponse {
    pub wallets: Vec<StoredWallet>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WalletListQuery {
    /// Only wallets in this space.
    pub space_id: Option<String>,
}

/// Generate a wallet and record it.
///
/// A faucet failure does not undo the wallet; it is reported in `fundError`.
#[utoipa::path(
    post,
    path = "/wallets",
    tag = "Wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = CreateWalletResponse),
        (status = 403, description = "Funding requested on the production network"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<CreateWalletResponse>), ApiError> {
    if request.fund {
        assert_not_production(state.ledger.network(), GatedOperation::Faucet)?;
    }

    let keys = generate_wallet(request.algorithm)?;
    let wallet = StoredWallet::new(&keys.address, request.space_id, request.user_id);
    WalletRepository::new(&state.db).create(&wallet)?;

    record_best_effort(
        &state.db,
        &Event::new(EventType::WalletCreated)
            .with_route("/wallets")
            .with_account(&wallet.address)
            .with_raw(json!({
                "walletId": wallet.id,
                "spaceId": wallet.space_id,
                "algorithm": keys.algorithm,
            })),
    );

    let (funded, faucet, fund_error) = if request.fund {
        match state.operations().fund(&wallet.address).await {
            Ok(response) => (true, Some(response), None),
            Err(e) => {
                tracing::warn!(error = %e, address = %wallet.address, "Faucet funding failed");
                (false, None, Some(e.to_string()))
            }
        }
    } else {
        (false, None, None)
    };

    tracing::info!(wallet_id = %wallet.id, address = %wallet.address, funded, "Wallet created");

    Ok((
        StatusCode::CREATED,
        Json(CreateWalletResponse {
            wallet,
            keys,
            funded,
            faucet,
            fund_error,
        }),
    ))
}

/// List recorded wallets, newest first.
#[utoipa::path(
    get,
    path = "/wallets",
    tag = "Wallets",
    params(WalletListQuery),
    responses(
        (status = 200, description = "Wallets", body = WalletListResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_wallets(
    State(state): State<AppState>,
    Query(query): Query<WalletListQuery>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let wallets = WalletRepository::new(&state.db).list(query.space_id.as_deref())?;
    let total = wallets.len();
    Ok(Json(WalletListResponse { wallets, total }))
}
