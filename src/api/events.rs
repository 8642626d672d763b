// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Event log queries and CSV reports.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    ledger::queries::Holder,
    state::AppState,
    storage::{
        events::{DEFAULT_EVENT_LIMIT, MAX_EVENT_LIMIT},
        Event, EventLog, EventQuery, EventType,
    },
};

use super::xrpl::load_holders;

/// Rows in one transaction report.
pub const MAX_REPORT_ROWS: usize = 5_000;

const TX_CSV_HEADER: [&str; 12] = [
    "timestamp",
    "type",
    "route",
    "account",
    "destination",
    "tokenId",
    "issuerCold",
    "currency",
    "value",
    "hash",
    "engineResult",
    "memos",
];

const HOLDERS_CSV_HEADER: [&str; 4] = ["holder", "currency", "balance", "limit"];

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    /// 1 to 1000, default 100.
    pub limit: Option<usize>,
    /// Event type, e.g. `issue` or `xumm_signed`.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub account: Option<String>,
    pub token_id: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub since: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub until: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TxReportQuery {
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub from: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub to: Option<String>,
    pub token_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub account: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct HoldersReportQuery {
    pub currency: Option<String>,
    #[serde(default)]
    pub include_zero: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    pub events: Vec<Event>,
    pub total: usize,
}

fn parse_event_type(raw: Option<&str>) -> Result<Option<EventType>, ApiError> {
    raw.filter(|t| !t.is_empty())
        .map(|t| {
            EventType::parse(t).ok_or_else(|| ApiError::bad_request(format!("Unknown event type '{t}'")))
        })
        .transpose()
}

/// Parse a query timestamp. A bare date means midnight UTC.
fn parse_time(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| ApiError::bad_request(format!("{field} must be an RFC 3339 timestamp or a date")))
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Events, newest first", body = EventListResponse),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let filter = EventQuery {
        limit: query
            .limit
            .unwrap_or(DEFAULT_EVENT_LIMIT)
            .clamp(1, MAX_EVENT_LIMIT),
        event_type: parse_event_type(query.event_type.as_deref())?,
        account: query.account,
        token_id: query.token_id,
        since: parse_time("since", query.since.as_deref())?,
        until: parse_time("until", query.until.as_deref())?,
    };
    let events = EventLog::new(&state.db).query(&filter)?;
    let total = events.len();
    Ok(Json(EventListResponse { events, total }))
}

#[utoipa::path(
    get,
    path = "/reports/tx.csv",
    tag = "Events",
    params(TxReportQuery),
    responses(
        (status = 200, description = "Transaction report", body = String, content_type = "text/csv"),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn tx_report(
    State(state): State<AppState>,
    Query(query): Query<TxReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = EventQuery {
        limit: MAX_REPORT_ROWS,
        event_type: parse_event_type(query.event_type.as_deref())?,
        account: query.account,
        token_id: query.token_id,
        since: parse_time("from", query.from.as_deref())?,
        until: parse_time("to", query.to.as_deref())?,
    };
    let events = EventLog::new(&state.db).query(&filter)?;
    Ok(csv_response("tx.csv", tx_csv(&events)?))
}

#[utoipa::path(
    get,
    path = "/reports/holders.csv",
    tag = "Events",
    params(HoldersReportQuery),
    responses(
        (status = 200, description = "Holder report", body = String, content_type = "text/csv"),
        (status = 400, description = "Issuer not initialized or invalid currency")
    )
)]
pub async fn holders_report(
    State(state): State<AppState>,
    Query(query): Query<HoldersReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, holders) = load_holders(&state, query.currency.as_deref(), query.include_zero).await?;
    Ok(csv_response("holders.csv", holders_csv(&holders)?))
}

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

fn tx_csv(events: &[Event]) -> Result<String, ApiError> {
    let mut writer = csv_writer();
    writer.write_record(TX_CSV_HEADER).map_err(ApiError::internal)?;
    for event in events {
        let memos = if event.memos.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&event.memos).map_err(ApiError::internal)?
        };
        let timestamp = event.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer
            .write_record([
                timestamp.as_str(),
                event.event_type.as_str(),
                opt(&event.route),
                opt(&event.account),
                opt(&event.destination),
                opt(&event.token_id),
                opt(&event.issuer_cold),
                opt(&event.currency),
                opt(&event.value),
                opt(&event.tx_hash),
                opt(&event.engine_result),
                memos.as_str(),
            ])
            .map_err(ApiError::internal)?;
    }
    finish(writer)
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn holders_csv(holders: &[Holder]) -> Result<String, ApiError> {
    let mut writer = csv_writer();
    writer.write_record(HOLDERS_CSV_HEADER).map_err(ApiError::internal)?;
    for h in holders {
        writer
            .write_record([&h.holder, &h.currency, &h.balance, &h.limit])
            .map_err(ApiError::internal)?;
    }
    finish(writer)
}

/// RFC 4180 quoting, `\n` line endings.
fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ApiError> {
    let bytes = writer.into_inner().map_err(ApiError::internal)?;
    String::from_utf8(bytes).map_err(ApiError::internal)
}
