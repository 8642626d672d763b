// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::ledger::LedgerError;
use crate::storage::DbError;

/// Errors raised by issuer custody operations.
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The supplied secret does not belong to the token's hot signer.
    #[error("Signer mismatch: token {currency} issuer is {issuer} (hot {expected}), but you signed as {actual}")]
    SignerMismatch {
        currency: String,
        issuer: String,
        expected: String,
        actual: String,
    },

    #[error("Issuer not initialized")]
    IssuerNotInitialized,

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// A mandatory setup step failed; nothing was persisted.
    #[error("Issuer setup failed at {step}: {detail}")]
    SetupFailed { step: String, detail: String },

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}
