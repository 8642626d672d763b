// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trustline requests.
//!
//! A request starts `pending` and transitions exactly once, to `approved` or
//! `rejected`. Both are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{DbError, DbResult, IssuerDatabase, TRUSTLINE_REQUESTS};

/// Trustline request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrustlineStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TrustlineStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A request by an address to hold a token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrustlineRequest {
    pub id: String,
    pub space_id: String,
    pub address: String,
    pub token_id: String,
    pub limit: Option<String>,
    pub status: TrustlineStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl TrustlineRequest {
    pub fn new(space_id: &str, address: &str, token_id: &str, limit: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            space_id: space_id.to_string(),
            address: address.to_string(),
            token_id: token_id.to_string(),
            limit,
            status: TrustlineStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
        }
    }
}

/// Repository for trustline requests.
pub struct TrustlineRequestRepository<'a> {
    db: &'a IssuerDatabase,
}

impl<'a> TrustlineRequestRepository<'a> {
    pub fn new(db: &'a IssuerDatabase) -> Self {
        Self { db }
    }

    pub fn create(&self, request: &TrustlineRequest) -> DbResult<()> {
        self.db.insert_new(TRUSTLINE_REQUESTS, &request.id, request)
    }

    pub fn get(&self, id: &str) -> DbResult<Option<TrustlineRequest>> {
        self.db.get_json(TRUSTLINE_REQUESTS, id)
    }

    /// Requests in `status`, oldest first.
    pub fn list_by_status(&self, status: TrustlineStatus) -> DbResult<Vec<TrustlineRequest>> {
        let mut requests: Vec<TrustlineRequest> = self.db.list_json(TRUSTLINE_REQUESTS)?;
        requests.retain(|r| r.status == status);
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(requests)
    }

    /// Move a pending request to `decision`.
    ///
    /// Fails with [`DbError::Conflict`] if the request is already decided,
    /// and with [`DbError::NotFound`] if it does not exist.
    pub fn decide(&self, id: &str, decision: TrustlineStatus) -> DbResult<TrustlineRequest> {
        if !decision.is_terminal() {
            return Err(DbError::Conflict(
                "a request can only be approved or rejected".to_string(),
            ));
        }
        self.db
            .update_json(TRUSTLINE_REQUESTS, id, |request: &mut TrustlineRequest| {
                if request.status.is_terminal() {
                    return Err(DbError::Conflict(format!(
                        "trustline request {id} is already {:?}",
                        request.status
                    )));
                }
                request.status = decision;
                request.decided_at = Some(Utc::now());
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_db;

    #[test]
    fn pending_transitions_once() {
        let (_dir, db) = temp_db();
        let repo = TrustlineRequestRepository::new(&db);

        let request = TrustlineRequest::new("space", "rHolder", "token", None);
        repo.create(&request).unwrap();
        assert_eq!(repo.list_by_status(TrustlineStatus::Pending).unwrap().len(), 1);

        let approved = repo.decide(&request.id, TrustlineStatus::Approved).unwrap();
        assert_eq!(approved.status, TrustlineStatus::Approved);
        assert!(approved.decided_at.is_some());

        let err = repo.decide(&request.id, TrustlineStatus::Rejected).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        let stored = repo.get(&request.id).unwrap().unwrap();
        assert_eq!(stored.status, TrustlineStatus::Approved);
        assert_eq!(stored.decided_at, approved.decided_at);

        assert!(repo.list_by_status(TrustlineStatus::Pending).unwrap().is_empty());
        assert_eq!(repo.list_by_status(TrustlineStatus::Approved).unwrap().len(), 1);
    }

    #[test]
    fn cannot_decide_back_to_pending_or_unknown() {
        let (_dir, db) = temp_db();
        let repo = TrustlineRequestRepository::new(&db);
        let request = TrustlineRequest::new("space", "rHolder", "token", Some("100".into()));
        repo.create(&request).unwrap();

        assert!(matches!(
            repo.decide(&request.id, TrustlineStatus::Pending),
            Err(DbError::Conflict(_))
        ));
        assert!(matches!(
            repo.decide("missing", TrustlineStatus::Approved),
            Err(DbError::NotFound(_))
        ));
    }
}
