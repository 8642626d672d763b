// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing requests brokered through a [`SigningProvider`].
//!
//! ```text
//! create()  ──► Created ──► AwaitingSignature ──► Resolved { signed, account, txid }
//!                               ▲        │
//!                               └─poll()─┘
//! ```
//!
//! There is no cancel: a caller that stops polling abandons the payload and
//! the provider expires it on its own.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::provider::SigningProvider;
use super::SigningError;
use crate::custody::token_with_issuer;
use crate::ledger::amount::{validate_value, Amount};
use crate::ledger::keys::decode_address;
use crate::ledger::transaction::TxIntent;
use crate::ledger::LedgerError;
use crate::storage::{
    record_best_effort, DbResult, Event, EventLog, EventType, IssuerDatabase, TxLogEntry,
};

/// Trust limit proposed to wallet-app users when none is given.
pub const ONBOARD_TRUST_LIMIT: &str = "1000000";

/// What the wallet app is asked to sign.
#[derive(Debug, Clone)]
pub enum SigningRequest {
    /// Prove control of an account without moving funds.
    SignIn,
    /// Open a trust line to a token's issuer.
    Trustline {
        account: Option<String>,
        token_id: String,
        limit: Option<String>,
    },
    /// Issue a token from its cold account; the wallet app submits.
    Issue {
        token_id: String,
        destination: String,
        value: String,
        memos: Vec<String>,
    },
    /// Arbitrary transaction JSON.
    Generic { txjson: Value, submit: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SigningState {
    Created,
    AwaitingSignature,
    Resolved,
}

/// A registered payload and the transaction it carries.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPayload {
    pub uuid: String,
    pub next: Option<String>,
    pub qr_png: Option<String>,
    pub state: SigningState,
    pub submit: bool,
    #[schema(value_type = Object)]
    pub txjson: Value,
}

/// Result of one poll.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SigningResult {
    pub uuid: String,
    pub state: SigningState,
    pub signed: bool,
    pub account: Option<String>,
    pub txid: Option<String>,
    /// True when this poll wrote the audit entry for `txid`.
    pub logged: bool,
    #[schema(value_type = Object)]
    pub raw: Value,
}

impl SigningResult {
    pub fn is_resolved(&self) -> bool {
        self.state == SigningState::Resolved
    }
}

/// Creates and polls signing payloads, keeping the event log in step.
pub struct SigningGateway<'a> {
    provider: &'a dyn SigningProvider,
    db: &'a IssuerDatabase,
}

impl<'a> SigningGateway<'a> {
    pub fn new(provider: &'a dyn SigningProvider, db: &'a IssuerDatabase) -> Self {
        Self { provider, db }
    }

    /// Register a signing request with the provider.
    ///
    /// Input is validated before the provider is contacted.
    pub async fn create(&self, request: SigningRequest) -> Result<CreatedPayload, SigningError> {
        let (txjson, submit, event) = self.prepare(request)?;
        let payload = self.provider.create_payload(txjson.clone(), submit).await?;

        if let Some(event) = event {
            let event = event.with_raw(json!({
                "uuid": payload.uuid,
                "next": payload.next,
                "txjson": txjson,
            }));
            record_best_effort(self.db, &event);
        }
        info!(
            provider = self.provider.name(),
            uuid = %payload.uuid,
            submit,
            "Signing payload created"
        );

        Ok(CreatedPayload {
            uuid: payload.uuid,
            next: payload.next,
            qr_png: payload.qr_png,
            state: SigningState::Created,
            submit,
            txjson,
        })
    }

    fn prepare(&self, request: SigningRequest) -> Result<(Value, bool, Option<Event>), SigningError> {
        match request {
            SigningRequest::SignIn => Ok((
                json!({ "TransactionType": "SignIn" }),
                false,
                Some(Event::new(EventType::SignIn).with_route("/onboard/start")),
            )),
            SigningRequest::Trustline {
                account,
                token_id,
                limit,
            } => {
                if let Some(account) = &account {
                    decode_address(account)?;
                }
                let limit = limit.unwrap_or_else(|| ONBOARD_TRUST_LIMIT.to_string());
                let (token, issuer) = token_with_issuer(self.db, &token_id)?;
                let amount = Amount::issued(&token.code, &issuer.cold_address, &limit)?;
                let txjson = TxIntent::trust_set(amount)?.to_json(account.as_deref())?;

                let mut event = Event::new(EventType::Trustline)
                    .with_route("/onboard/trustline")
                    .with_token(&token.id, &issuer.cold_address, &token.code)
                    .with_value(limit);
                event.account = account;
                Ok((txjson, false, Some(event)))
            }
            SigningRequest::Issue {
                token_id,
                destination,
                value,
                memos,
            } => {
                validate_value(&value)?;
                decode_address(&destination)?;
                let (token, issuer) = token_with_issuer(self.db, &token_id)?;
                let amount = Amount::issued(&token.code, &issuer.cold_address, &value)?;
                let txjson = TxIntent::payment(&destination, amount, memos.clone())?
                    .to_json(Some(&issuer.cold_address))?;

                let event = Event::new(EventType::Issue)
                    .with_route("/onboard/issue")
                    .with_account(&issuer.cold_address)
                    .with_destination(&destination)
                    .with_token(&token.id, &issuer.cold_address, &token.code)
                    .with_value(&value)
                    .with_memos(&memos);
                Ok((txjson, true, Some(event)))
            }
            SigningRequest::Generic { txjson, submit } => {
                let has_type = txjson
                    .get("TransactionType")
                    .and_then(Value::as_str)
                    .is_some_and(|t| !t.is_empty());
                if !has_type {
                    return Err(LedgerError::Validation(
                        "txjson must be an object with a TransactionType".to_string(),
                    )
                    .into());
                }
                Ok((txjson, submit, None))
            }
        }
    }

    /// Read the payload's current state.
    ///
    /// A signed payload that carries a transaction id is logged exactly once
    /// per id, however many times it is polled. A failed log write is reported
    /// as `logged: false` and never hides the provider's answer.
    pub async fn poll(&self, uuid: &str) -> Result<SigningResult, SigningError> {
        let status = self.provider.get_payload(uuid).await?;
        let state = if status.resolved {
            SigningState::Resolved
        } else {
            SigningState::AwaitingSignature
        };

        let mut logged = false;
        if let (true, Some(txid)) = (status.signed, status.txid.as_deref()) {
            let entry = TxLogEntry::new(txid, Some(uuid), status.account.as_deref());
            let mut event = Event::new(EventType::XummSigned)
                .with_route("/onboard/result")
                .with_tx_hash(txid)
                .with_raw(status.raw.clone());
            event.account = status.account.clone();

            logged = audit_outcome(
                uuid,
                txid,
                EventLog::new(self.db).record_signed_once(&entry, &event),
            );
        }

        Ok(SigningResult {
            uuid: status.uuid,
            state,
            signed: status.signed,
            account: status.account,
            txid: status.txid,
            logged,
            raw: status.raw,
        })
    }
}

fn audit_outcome(uuid: &str, txid: &str, written: DbResult<bool>) -> bool {
    match written {
        Ok(true) => {
            info!(uuid, txid, "Recorded wallet-signed transaction");
            true
        }
        Ok(false) => false,
        Err(e) => {
            warn!(uuid, txid, error = %e, "Failed to record wallet-signed transaction");
            false
        }
    }
}
