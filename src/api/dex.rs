// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    ledger::{
        queries::{BookOffer, BookSide, DEFAULT_BOOK_LIMIT, MAX_BOOK_LIMIT},
        TxOutcome,
    },
    operations::OfferAmount,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfferCreateRequest {
    pub secret: String,
    pub taker_gets: OfferAmount,
    pub taker_pays: OfferAmount,
    pub flags: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfferCancelRequest {
    pub secret: String,
    /// Sequence of the offer to cancel, at least 1.
    pub offer_sequence: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookQuery {
    /// `XRP` or `CODE:issuer`.
    pub base: String,
    /// `XRP` or `CODE:issuer`.
    pub quote: String,
    /// 1 to 200, default 20.
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookResponse {
    pub base: String,
    pub quote: String,
    pub offers: Vec<BookOffer>,
}

#[utoipa::path(
    post,
    path = "/dex/offers",
    tag = "DEX",
    request_body = OfferCreateRequest,
    responses(
        (status = 200, description = "Submitted", body = TxOutcome),
        (status = 400, description = "Invalid secret or amount"),
        (status = 403, description = "Disabled on the production network")
    )
)]
pub async fn create_offer(
    State(state): State<AppState>,
    Json(request): Json<OfferCreateRequest>,
) -> Result<Json<TxOutcome>, ApiError> {
    let outcome = state
        .operations()
        .offer_create(
            &request.secret,
            &request.taker_gets,
            &request.taker_pays,
            request.flags,
        )
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/dex/offers/cancel",
    tag = "DEX",
    request_body = OfferCancelRequest,
    responses(
        (status = 200, description = "Submitted", body = TxOutcome),
        (status = 400, description = "Invalid secret or offer sequence"),
        (status = 403, description = "Disabled on the production network")
    )
)]
pub async fn cancel_offer(
    State(state): State<AppState>,
    Json(request): Json<OfferCancelRequest>,
) -> Result<Json<TxOutcome>, ApiError> {
    let outcome = state
        .operations()
        .offer_cancel(&request.secret, request.offer_sequence)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/dex/book",
    tag = "DEX",
    params(BookQuery),
    responses(
        (status = 200, description = "Offers selling base for quote", body = BookResponse),
        (status = 400, description = "Invalid book side or limit")
    )
)]
pub async fn book(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> Result<Json<BookResponse>, ApiError> {
    let base = BookSide::parse(&query.base)?;
    let quote = BookSide::parse(&query.quote)?;
    let limit = query.limit.unwrap_or(DEFAULT_BOOK_LIMIT);
    if !(1..=MAX_BOOK_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_BOOK_LIMIT}"
        )));
    }

    let offers = state.ledger.book_offers(base, quote, limit).await?;
    Ok(Json(BookResponse {
        base: query.base,
        quote: query.quote,
        offers,
    }))
}
