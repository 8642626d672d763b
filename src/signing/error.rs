// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::custody::CustodyError;
use crate::ledger::LedgerError;
use crate::storage::DbError;

/// Errors raised while brokering wallet-app signatures.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Signing provider not configured")]
    NotConfigured,

    #[error("Signing provider error: {0}")]
    Provider(String),

    #[error("Signing provider response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Signing payload not found: {0}")]
    PayloadNotFound(String),

    #[error("Signing payload already resolved: {0}")]
    AlreadyResolved(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}
