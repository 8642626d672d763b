// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet-App Signing
//!
//! On the production network the server never handles secrets. Instead it
//! proposes a transaction to a signing provider, the user approves it in
//! their own wallet app, and the server polls for the result.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `provider` | [`SigningProvider`] trait, the Xumm client and the unconfigured stand-in |
//! | `memory` | In-process provider for development and tests |
//! | `gateway` | Request construction, polling, audit logging |
//! | `poller` | Caller-owned wait loop with timeout and cancellation |

mod error;
pub mod gateway;
pub mod memory;
pub mod poller;
pub mod provider;

pub use error::SigningError;
pub use gateway::{
    CreatedPayload, SigningGateway, SigningRequest, SigningResult, SigningState,
    ONBOARD_TRUST_LIMIT,
};
pub use memory::{InMemoryProvider, PayloadSweeper};
pub use poller::{await_resolution, PollOutcome, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
pub use provider::{
    PayloadRef, PayloadStatus, SigningProvider, UnconfiguredProvider, XummClient, XummConfig,
};
