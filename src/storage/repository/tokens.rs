// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token registry.
//!
//! Codes are stored exactly as entered. The ledger wire form is computed on
//! demand by the currency codec.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{DbResult, IssuerDatabase, TOKENS};
use crate::ledger::currency::encode_currency;
use crate::ledger::LedgerError;

pub const DEFAULT_PRECISION: u8 = 6;
pub const MAX_PRECISION: u8 = 15;

/// A fungible token scoped to one issuer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    pub id: String,
    pub issuer_id: String,
    /// Currency code as entered.
    pub code: String,
    pub name: String,
    pub precision: u8,
    pub created_at: DateTime<Utc>,
}

impl StoredToken {
    /// Validate and build a new token for `issuer_id`.
    pub fn new(
        issuer_id: &str,
        code: &str,
        name: &str,
        precision: Option<u8>,
    ) -> Result<Self, LedgerError> {
        let name = name.trim();
        if code.trim() != code {
            return Err(LedgerError::Validation(
                "code must not start or end with whitespace".to_string(),
            ));
        }
        if code.chars().count() < 3 {
            return Err(LedgerError::Validation(
                "code must be at least 3 characters".to_string(),
            ));
        }
        encode_currency(code)?;
        if name.chars().count() < 2 {
            return Err(LedgerError::Validation(
                "name must be at least 2 characters".to_string(),
            ));
        }
        let precision = precision.unwrap_or(DEFAULT_PRECISION);
        if precision > MAX_PRECISION {
            return Err(LedgerError::Validation(format!(
                "precision must be between 0 and {MAX_PRECISION}"
            )));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            issuer_id: issuer_id.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            precision,
            created_at: Utc::now(),
        })
    }

    /// Ledger wire form of the code.
    pub fn wire_currency(&self) -> Result<String, LedgerError> {
        encode_currency(&self.code)
    }
}

/// Repository for tokens.
pub struct TokenRepository<'a> {
    db: &'a IssuerDatabase,
}

impl<'a> TokenRepository<'a> {
    pub fn new(db: &'a IssuerDatabase) -> Self {
        Self { db }
    }

    pub fn create(&self, token: &StoredToken) -> DbResult<()> {
        self.db.insert_new(TOKENS, &token.id, token)
    }

    pub fn get(&self, id: &str) -> DbResult<Option<StoredToken>> {
        self.db.get_json(TOKENS, id)
    }

    /// All tokens, newest first.
    pub fn list(&self) -> DbResult<Vec<StoredToken>> {
        let mut tokens: Vec<StoredToken> = self.db.list_json(TOKENS)?;
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    /// Tokens of one issuer, newest first.
    pub fn list_for_issuer(&self, issuer_id: &str) -> DbResult<Vec<StoredToken>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.issuer_id == issuer_id)
            .collect())
    }

    pub fn count(&self) -> DbResult<u64> {
        self.db.count(TOKENS)
    }
}
