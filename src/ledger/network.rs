// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network identifiers, endpoint resolution and the production gate.
//!
//! Every seed-based mutating operation calls [`assert_not_production`] before
//! it builds a transaction. On mainnet those paths fail closed and callers are
//! pointed at the delegated signing flow instead.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use super::LedgerError;

pub const DEFAULT_DEVNET_RPC: &str = "https://s.devnet.rippletest.net:51234";
pub const DEFAULT_TESTNET_RPC: &str = "https://s.altnet.rippletest.net:51234";
pub const DEFAULT_MAINNET_RPC: &str = "https://s1.ripple.com:51234";

/// Ledger network the service is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Whether this is the production ledger where real value moves.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Mainnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = LedgerError;

    /// Unknown identifiers are an error, never a fallback to devnet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(LedgerError::Validation(format!(
                "Unknown network '{other}' (expected devnet, testnet or mainnet)"
            ))),
        }
    }
}

/// Seed-based operations that are only permitted off production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedOperation {
    Faucet,
    Payment,
    Trustline,
    Issue,
    Redeem,
    OfferCreate,
    OfferCancel,
}

impl fmt::Display for GatedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Faucet => "Faucet funding",
            Self::Payment => "Direct seed-based payment",
            Self::Trustline => "Direct seed-based trustline",
            Self::Issue => "Direct seed-based issuance",
            Self::Redeem => "Direct seed-based redemption",
            Self::OfferCreate => "Direct seed-based offer creation",
            Self::OfferCancel => "Direct seed-based offer cancellation",
        };
        f.write_str(label)
    }
}

/// Fail with [`LedgerError::OperationDisabled`] when `network` is production.
pub fn assert_not_production(network: Network, operation: GatedOperation) -> Result<(), LedgerError> {
    if network.is_production() {
        tracing::warn!(%network, %operation, "Blocked seed-based operation on production network");
        return Err(LedgerError::OperationDisabled { network, operation });
    }
    Ok(())
}

/// JSON-RPC endpoint per network, each independently configurable.
#[derive(Debug, Clone)]
pub struct NetworkEndpoints {
    pub devnet: Url,
    pub testnet: Url,
    pub mainnet: Url,
}

impl NetworkEndpoints {
    pub fn new(devnet: &str, testnet: &str, mainnet: &str) -> Result<Self, LedgerError> {
        Ok(Self {
            devnet: parse_url(devnet)?,
            testnet: parse_url(testnet)?,
            mainnet: parse_url(mainnet)?,
        })
    }

    /// Public rippled JSON-RPC endpoints.
    pub fn public() -> Result<Self, LedgerError> {
        Self::new(DEFAULT_DEVNET_RPC, DEFAULT_TESTNET_RPC, DEFAULT_MAINNET_RPC)
    }

    pub fn url(&self, network: Network) -> &Url {
        match network {
            Network::Devnet => &self.devnet,
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        }
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, LedgerError> {
    Url::parse(raw).map_err(|e| LedgerError::Validation(format!("Invalid URL '{raw}': {e}")))
}
