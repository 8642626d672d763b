// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Event log for every ledger-affecting action, plus the TxLog dedup guard.
//!
//! Events are append-only. Writing one is always best-effort from the point
//! of view of the operation that produced it: by the time an event is
//! recorded the transaction is already on its way to the ledger, so a failed
//! write is logged and dropped ([`record_best_effort`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::database::{DbResult, IssuerDatabase};
use crate::ledger::TxOutcome;

/// Types of recorded events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Ledger transactions
    Payment,
    Trustline,
    Issue,
    Redeem,
    OfferCreate,
    OfferCancel,
    Faucet,

    // Wallet-app signing
    #[serde(rename = "signin")]
    SignIn,
    XummSigned,

    // Issuer lifecycle
    IssuerInit,
    TokenCreated,
    WalletCreated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Trustline => "trustline",
            Self::Issue => "issue",
            Self::Redeem => "redeem",
            Self::OfferCreate => "offer_create",
            Self::OfferCancel => "offer_cancel",
            Self::Faucet => "faucet",
            Self::SignIn => "signin",
            Self::XummSigned => "xumm_signed",
            Self::IssuerInit => "issuer_init",
            Self::TokenCreated => "token_created",
            Self::WalletCreated => "wallet_created",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_value(Value::String(raw.to_string())).ok()
    }
}

/// An immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// API route that produced the event.
    pub route: Option<String>,
    pub account: Option<String>,
    pub destination: Option<String>,
    pub token_id: Option<String>,
    /// Cold address of the token's issuer.
    pub issuer_cold: Option<String>,
    /// Currency as entered, never the wire form.
    pub currency: Option<String>,
    pub value: Option<String>,
    pub tx_hash: Option<String>,
    pub engine_result: Option<String>,
    /// Raw ledger or provider response.
    #[schema(value_type = Option<Object>)]
    pub raw: Option<Value>,
    #[serde(default)]
    pub memos: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            route: None,
            account: None,
            destination: None,
            token_id: None,
            issuer_cold: None,
            currency: None,
            value: None,
            tx_hash: None,
            engine_result: None,
            raw: None,
            memos: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set the token reference, its issuer and its currency together.
    pub fn with_token(
        mut self,
        token_id: impl Into<String>,
        issuer_cold: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        self.token_id = Some(token_id.into());
        self.issuer_cold = Some(issuer_cold.into());
        self.currency = Some(currency.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Copy hash, engine result and raw response from a submit outcome.
    pub fn with_outcome(mut self, outcome: &TxOutcome) -> Self {
        self.tx_hash = outcome.transaction_hash.clone();
        self.engine_result = outcome.engine_result.clone();
        self.raw = Some(outcome.raw_response.clone());
        self
    }

    pub fn with_memos(mut self, memos: &[String]) -> Self {
        self.memos = memos.to_vec();
        self
    }
}

/// One externally signed transaction that has been logged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TxLogEntry {
    pub tx_hash: String,
    pub payload_uuid: Option<String>,
    pub account: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TxLogEntry {
    pub fn new(tx_hash: &str, payload_uuid: Option<&str>, account: Option<&str>) -> Self {
        Self {
            tx_hash: tx_hash.to_string(),
            payload_uuid: payload_uuid.map(str::to_string),
            account: account.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

pub const DEFAULT_EVENT_LIMIT: usize = 100;
pub const MAX_EVENT_LIMIT: usize = 1_000;

/// Event filter. All set fields must match.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub limit: usize,
    pub event_type: Option<EventType>,
    pub account: Option<String>,
    pub token_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_EVENT_LIMIT,
            event_type: None,
            account: None,
            token_id: None,
            since: None,
            until: None,
        }
    }
}

impl EventQuery {
    fn matches(&self, event: &Event) -> bool {
        self.event_type.is_none_or(|t| event.event_type == t)
            && self
                .account
                .as_deref()
                .is_none_or(|a| event.account.as_deref() == Some(a))
            && self
                .token_id
                .as_deref()
                .is_none_or(|t| event.token_id.as_deref() == Some(t))
            && self.until.is_none_or(|until| event.created_at <= until)
    }
}

/// Repository for the event log.
pub struct EventLog<'a> {
    db: &'a IssuerDatabase,
}

impl<'a> EventLog<'a> {
    pub fn new(db: &'a IssuerDatabase) -> Self {
        Self { db }
    }

    pub fn record(&self, event: &Event) -> DbResult<()> {
        self.db.insert_event(event)
    }

    /// Events matching `query`, newest first.
    pub fn query(&self, query: &EventQuery) -> DbResult<Vec<Event>> {
        let mut out = Vec::new();
        if query.limit == 0 {
            return Ok(out);
        }
        self.db.scan_events(|event| {
            if query.since.is_some_and(|since| event.created_at < since) {
                return false;
            }
            if query.matches(&event) {
                out.push(event);
            }
            out.len() < query.limit
        })?;
        Ok(out)
    }

    /// Log an externally signed transaction exactly once.
    ///
    /// Returns `true` when `event` was written, `false` when the transaction
    /// hash was already logged.
    pub fn record_signed_once(&self, entry: &TxLogEntry, event: &Event) -> DbResult<bool> {
        self.db.record_signed_once(entry, event)
    }

    pub fn tx_log_entry(&self, tx_hash: &str) -> DbResult<Option<TxLogEntry>> {
        self.db.tx_log_entry(tx_hash)
    }
}

/// Record `event`, logging instead of failing if the write does not succeed.
pub fn record_best_effort(db: &IssuerDatabase, event: &Event) {
    if let Err(e) = EventLog::new(db).record(event) {
        tracing::warn!(
            error = %e,
            event_type = event.event_type.as_str(),
            tx_hash = event.tx_hash.as_deref().unwrap_or("-"),
            "Failed to record event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_db;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn event_type_wire_names() {
        assert_eq!(serde_json::to_value(EventType::SignIn).unwrap(), "signin");
        assert_eq!(serde_json::to_value(EventType::OfferCreate).unwrap(), "offer_create");
        assert_eq!(EventType::parse("xumm_signed"), Some(EventType::XummSigned));
        assert_eq!(EventType::parse("signin"), Some(EventType::SignIn));
        assert_eq!(EventType::parse("bogus"), None);
        for t in [EventType::Issue, EventType::Faucet, EventType::IssuerInit] {
            assert_eq!(EventType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn builder_copies_outcome() {
        let outcome = crate::ledger::submit::normalize_outcome(json!({
            "engine_result": "tesSUCCESS",
            "tx_json": { "hash": "H1" }
        }));
        let event = Event::new(EventType::Payment)
            .with_route("/xrpl/payment")
            .with_account("rA")
            .with_destination("rB")
            .with_value("5")
            .with_memos(&["hello".to_string()])
            .with_outcome(&outcome);

        assert_eq!(event.tx_hash.as_deref(), Some("H1"));
        assert_eq!(event.engine_result.as_deref(), Some("tesSUCCESS"));
        assert_eq!(event.memos, vec!["hello"]);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "payment");
        assert_eq!(value["engineResult"], "tesSUCCESS");
    }

    #[test]
    fn query_filters_and_orders_newest_first() {
        let (_dir, db) = temp_db();
        let log = EventLog::new(&db);
        let now = Utc::now();

        let mut old = Event::new(EventType::Issue).with_account("rA");
        old.created_at = now - Duration::hours(2);
        let mut mid = Event::new(EventType::Payment).with_account("rB");
        mid.created_at = now - Duration::hours(1);
        let mut new = Event::new(EventType::Issue).with_account("rA");
        new.token_id = Some("tok".into());
        new.created_at = now;

        for e in [&old, &mid, &new] {
            log.record(e).unwrap();
        }

        let all = log.query(&EventQuery::default()).unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![new.id.as_str(), mid.id.as_str(), old.id.as_str()]);

        let issues = log
            .query(&EventQuery {
                event_type: Some(EventType::Issue),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(issues.len(), 2);

        let by_account = log
            .query(&EventQuery {
                account: Some("rB".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_account.len(), 1);
        assert_eq!(by_account[0].id, mid.id);

        let by_token = log
            .query(&EventQuery {
                token_id: Some("tok".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_token.len(), 1);

        let window = log
            .query(&EventQuery {
                since: Some(now - Duration::minutes(90)),
                until: Some(now - Duration::minutes(30)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, mid.id);

        let limited = log
            .query(&EventQuery {
                limit: 2,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn record_best_effort_never_panics() {
        let (_dir, db) = temp_db();
        record_best_effort(&db, &Event::new(EventType::SignIn));
        let events = EventLog::new(&db).query(&EventQuery::default()).unwrap();
        assert_eq!(events.len(), 1);
    }
}
