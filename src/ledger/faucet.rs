// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test-network account funding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

use super::network::{assert_not_production, parse_url, GatedOperation, Network};
use super::LedgerError;

pub const DEFAULT_DEVNET_FAUCET: &str = "https://faucet.devnet.rippletest.net/accounts";
pub const DEFAULT_TESTNET_FAUCET: &str = "https://faucet.altnet.rippletest.net/accounts";

/// XRP requested per funding call.
pub const FAUCET_XRP_AMOUNT: &str = "20";

/// Funds accounts on a test network.
#[async_trait]
pub trait Faucet: Send + Sync {
    /// Fund `address`, returning the faucet's raw response.
    async fn fund(&self, network: Network, address: &str) -> Result<Value, LedgerError>;
}

/// The public rippled test-network faucets.
pub struct HttpFaucet {
    http: Client,
    devnet: Url,
    testnet: Url,
}

impl HttpFaucet {
    pub fn new(devnet: &str, testnet: &str) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LedgerError::Faucet(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            devnet: parse_url(devnet)?,
            testnet: parse_url(testnet)?,
        })
    }

    fn url_for(&self, network: Network) -> Result<&Url, LedgerError> {
        assert_not_production(network, GatedOperation::Faucet)?;
        Ok(match network {
            Network::Testnet => &self.testnet,
            _ => &self.devnet,
        })
    }
}

#[async_trait]
impl Faucet for HttpFaucet {
    async fn fund(&self, network: Network, address: &str) -> Result<Value, LedgerError> {
        let url = self.url_for(network)?;
        let body = json!({
            "destination": address,
            "xrpAmount": FAUCET_XRP_AMOUNT,
            "userAgent": concat!("xrpl-issuer-server/", env!("CARGO_PKG_VERSION")),
        });

        let response = self
            .http
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("faucet request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Faucet(format!("faucet returned {status}: {text}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Faucet(format!("faucet returned invalid JSON: {e}")))?;
        info!(%network, %address, "Funded account from faucet");
        Ok(payload)
    }
}
