// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the issuer database.
//!
//! Each repository provides create/read/update operations for one entity
//! type, using [`IssuerDatabase`](super::IssuerDatabase) for all I/O.

pub mod issuers;
pub mod tokens;
pub mod trustlines;
pub mod wallets;

pub use issuers::{IssuerRepository, StoredIssuer};
pub use tokens::{StoredToken, TokenRepository};
pub use trustlines::{TrustlineRequest, TrustlineRequestRepository, TrustlineStatus};
pub use wallets::{StoredWallet, WalletRepository};
