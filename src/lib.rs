// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! XRPL Issuer Server - Issuer Custody & Transaction Submission
//!
//! Builds, signs and submits XRP Ledger transactions for a cold/hot issuer
//! pair on test networks, and hands signing to the user's wallet app on the
//! production network.
//!
//! ## Modules
//!
//! - `ledger` - Currency codec, sessions, transaction building and signing
//! - `custody` - Issuer lifecycle: initialization, issuance, redemption
//! - `operations` - Seed-based payments, trust lines and DEX offers
//! - `signing` - Wallet-app signing gateway (Xumm)
//! - `storage` - redb database, repositories and the event log
//! - `api` - HTTP API handlers (Axum)

pub mod api;
pub mod config;
pub mod custody;
pub mod error;
pub mod ledger;
pub mod operations;
pub mod signing;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
