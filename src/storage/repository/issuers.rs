// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issuer repository.
//!
//! Exactly one issuer is current per deployment: the most recently created.
//! Cold and hot addresses are written once and never updated. Secrets are
//! never part of the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{DbResult, IssuerDatabase, ISSUERS};
use crate::ledger::Network;

/// A token-issuing identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredIssuer {
    pub id: String,
    pub org_name: String,
    pub domain: Option<String>,
    /// Treasury account holding supply and trust.
    pub cold_address: String,
    /// Operational signer.
    pub hot_address: String,
    /// Address the cold account delegates signing to via its regular key.
    pub delegates_to: String,
    /// Whether the regular-key grant was confirmed at creation.
    pub delegation_confirmed: bool,
    pub network: Network,
    pub created_at: DateTime<Utc>,
}

/// Repository for issuers.
pub struct IssuerRepository<'a> {
    db: &'a IssuerDatabase,
}

impl<'a> IssuerRepository<'a> {
    pub fn new(db: &'a IssuerDatabase) -> Self {
        Self { db }
    }

    /// Store a new issuer and make it current.
    pub fn create(&self, issuer: &StoredIssuer) -> DbResult<()> {
        self.db.insert_current_issuer(&issuer.id, issuer)
    }

    pub fn get(&self, id: &str) -> DbResult<Option<StoredIssuer>> {
        self.db.get_json(ISSUERS, id)
    }

    /// The current issuer, if one was ever initialized.
    pub fn current(&self) -> DbResult<Option<StoredIssuer>> {
        match self.db.current_issuer_id()? {
            Some(id) => self.get(&id),
            None => Ok(None),
        }
    }
}
