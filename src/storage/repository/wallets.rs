// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet bookkeeping.
//!
//! Address-only records. Seeds are returned to the caller once at generation
//! time and are never written here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{DbResult, IssuerDatabase, WALLETS};

/// A ledger account known to the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredWallet {
    pub id: String,
    pub address: String,
    /// Opaque organizational space identifier.
    pub space_id: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredWallet {
    pub fn new(address: &str, space_id: Option<String>, user_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            address: address.to_string(),
            space_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Repository for wallet records.
pub struct WalletRepository<'a> {
    db: &'a IssuerDatabase,
}

impl<'a> WalletRepository<'a> {
    pub fn new(db: &'a IssuerDatabase) -> Self {
        Self { db }
    }

    pub fn create(&self, wallet: &StoredWallet) -> DbResult<()> {
        self.db.insert_new(WALLETS, &wallet.id, wallet)
    }

    /// All wallets, newest first, optionally restricted to one space.
    pub fn list(&self, space_id: Option<&str>) -> DbResult<Vec<StoredWallet>> {
        let mut wallets: Vec<StoredWallet> = self.db.list_json(WALLETS)?;
        if let Some(space) = space_id {
            wallets.retain(|w| w.space_id.as_deref() == Some(space));
        }
        wallets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(wallets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_db;

    #[test]
    fn create_and_list_by_space() {
        let (_dir, db) = temp_db();
        let repo = WalletRepository::new(&db);

        repo.create(&StoredWallet::new("rA", Some("space-1".into()), None))
            .unwrap();
        repo.create(&StoredWallet::new("rB", Some("space-2".into()), Some("u1".into())))
            .unwrap();
        repo.create(&StoredWallet::new("rC", None, None)).unwrap();

        assert_eq!(repo.list(None).unwrap().len(), 3);
        let space = repo.list(Some("space-2")).unwrap();
        assert_eq!(space.len(), 1);
        assert_eq!(space[0].address, "rB");
        assert_eq!(space[0].user_id.as_deref(), Some("u1"));
    }
}
