// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single embedded redb database file under
//! `DATA_DIR`.
//!
//! ## What is stored
//!
//! ```text
//! issuers              # cold/hot addresses, never secrets
//! tokens               # codes as entered, wire form computed on demand
//! wallets              # address-only bookkeeping
//! trustline_requests   # pending → approved | rejected
//! events               # append-only audit log, newest first
//! tx_log               # dedup guard for wallet-signed transactions
//! ```
//!
//! ## Important Notes
//!
//! - Seeds and private keys are NEVER written to storage
//! - Event writes are best-effort; see [`events::record_best_effort`]

pub mod database;
pub mod events;
pub mod repository;

pub use database::{DbError, DbResult, IssuerDatabase};
pub use events::{record_best_effort, Event, EventLog, EventQuery, EventType, TxLogEntry};
pub use repository::{
    IssuerRepository, StoredIssuer, StoredToken, StoredWallet, TokenRepository, TrustlineRequest,
    TrustlineRequestRepository, TrustlineStatus, WalletRepository,
};
