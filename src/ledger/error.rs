// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use super::network::{GatedOperation, Network};

/// Errors raised by the ledger layer.
///
/// Validation variants are always raised before any network round-trip.
/// None of the messages carry secret material.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid secret: not a valid family seed")]
    InvalidSecret,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Currency code is {0} bytes, the maximum is 20")]
    CodeTooLong(usize),

    #[error("{0}")]
    Validation(String),

    #[error("{operation} is disabled on {network}. Use the Xumm signing flow (/onboard/*) or a KMS signer.")]
    OperationDisabled {
        network: Network,
        operation: GatedOperation,
    },

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger RPC error: {0}")]
    Rpc(String),

    #[error("Faucet error: {0}")]
    Faucet(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl LedgerError {
    /// True for errors detected locally, before anything was sent to the ledger.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSecret
                | Self::InvalidAmount(_)
                | Self::InvalidAddress(_)
                | Self::CodeTooLong(_)
                | Self::Validation(_)
        )
    }
}
