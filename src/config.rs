// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup. Values that
//! are empty after trimming count as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `ledger.redb` | `./data` |
//! | `XRPL_NETWORK` | `devnet`, `testnet` or `mainnet` | `devnet` |
//! | `XRPL_RPC_DEVNET` | Devnet JSON-RPC URL | public devnet |
//! | `XRPL_RPC_TESTNET` | Testnet JSON-RPC URL | public testnet |
//! | `XRPL_RPC_MAINNET` | Mainnet JSON-RPC URL | `s1.ripple.com` |
//! | `XRPL_FAUCET_DEVNET` | Devnet faucet URL | public devnet faucet |
//! | `XRPL_FAUCET_TESTNET` | Testnet faucet URL | public testnet faucet |
//! | `ISSUER_STRICT_DELEGATION` | Fail issuer setup if the regular key is not granted | `false` |
//! | `ISSUER_DEFAULT_RIPPLE` | Enable rippling on new cold accounts | `true` |
//! | `ISSUER_REQUIRE_AUTH` | Set RequireAuth on new cold accounts | `false` |
//! | `XUMM_API_KEY` / `XAMANAPI` | Xumm API key | unset |
//! | `XUMM_API_SECRET` / `XAMANKEY` | Xumm API secret | unset |
//! | `XUMM_API_BASE_URL` | Xumm API base URL | `https://xumm.app/api/v1` |
//! | `SIGNING_PROVIDER` | `xumm`, `memory` or `none` | `xumm` when keys are set, else `none` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! An unrecognized `XRPL_NETWORK` stops startup. Falling back to a test
//! network would re-open the seed endpoints under a mistyped production name.
//!
//! The in-memory signing provider is only used when asked for, and never on
//! mainnet. Without Xumm keys the signing endpoints answer 503.

use std::path::PathBuf;

use crate::custody::IssuerPolicy;
use crate::ledger::faucet::{DEFAULT_DEVNET_FAUCET, DEFAULT_TESTNET_FAUCET};
use crate::ledger::network::{DEFAULT_DEVNET_RPC, DEFAULT_MAINNET_RPC, DEFAULT_TESTNET_RPC};
use crate::ledger::{Network, NetworkEndpoints};
use crate::signing::provider::DEFAULT_XUMM_BASE_URL;
use crate::signing::XummConfig;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const NETWORK_ENV: &str = "XRPL_NETWORK";

/// File name of the database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "ledger.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which signing provider backs the wallet-app flow.
#[derive(Debug, Clone)]
pub enum SigningBackend {
    Xumm(XummConfig),
    Memory,
    /// No provider; signing endpoints report "not configured".
    Disabled,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub network: Network,
    pub endpoints: NetworkEndpoints,
    pub faucet_devnet: String,
    pub faucet_testnet: String,
    pub issuer_policy: IssuerPolicy,
    pub signing: SigningBackend,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Used directly by tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &'static str, default: bool| match get(key) {
            None => Ok(default),
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                var: key,
                reason: format!("expected true or false, got '{v}'"),
            }),
        };

        let port = match get("PORT") {
            None => 8080,
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                reason: format!("not a port number: '{v}'"),
            })?,
        };

        let network = or_default(NETWORK_ENV, "devnet")
            .parse::<Network>()
            .map_err(|e| ConfigError::Invalid {
                var: NETWORK_ENV,
                reason: e.to_string(),
            })?;

        let endpoints = NetworkEndpoints::new(
            &or_default("XRPL_RPC_DEVNET", DEFAULT_DEVNET_RPC),
            &or_default("XRPL_RPC_TESTNET", DEFAULT_TESTNET_RPC),
            &or_default("XRPL_RPC_MAINNET", DEFAULT_MAINNET_RPC),
        )
        .map_err(|e| ConfigError::Invalid {
            var: "XRPL_RPC_*",
            reason: e.to_string(),
        })?;

        let issuer_policy = IssuerPolicy {
            strict_delegation: flag("ISSUER_STRICT_DELEGATION", false)?,
            default_ripple: flag("ISSUER_DEFAULT_RIPPLE", true)?,
            require_auth: flag("ISSUER_REQUIRE_AUTH", false)?,
        };

        let api_key = get("XUMM_API_KEY").or_else(|| get("XAMANAPI"));
        let api_secret = get("XUMM_API_SECRET").or_else(|| get("XAMANKEY"));
        let xumm = match (api_key, api_secret) {
            (Some(api_key), Some(api_secret)) => Some(XummConfig {
                api_key,
                api_secret,
                base_url: or_default("XUMM_API_BASE_URL", DEFAULT_XUMM_BASE_URL),
            }),
            _ => None,
        };
        let signing = match get("SIGNING_PROVIDER").map(|v| v.to_ascii_lowercase()).as_deref() {
            None => xumm.map_or(SigningBackend::Disabled, SigningBackend::Xumm),
            Some("xumm") => SigningBackend::Xumm(xumm.ok_or(ConfigError::Missing(
                "XUMM_API_KEY and XUMM_API_SECRET",
            ))?),
            Some("memory") if network.is_production() => {
                return Err(ConfigError::Invalid {
                    var: "SIGNING_PROVIDER",
                    reason: "the in-memory provider cannot sign on mainnet".to_string(),
                })
            }
            Some("memory") => SigningBackend::Memory,
            Some("none") => SigningBackend::Disabled,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SIGNING_PROVIDER",
                    reason: format!("expected xumm, memory or none, got '{other}'"),
                })
            }
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: or_default("HOST", "0.0.0.0"),
            port,
            data_dir: PathBuf::from(or_default(DATA_DIR_ENV, "./data")),
            network,
            endpoints,
            faucet_devnet: or_default("XRPL_FAUCET_DEVNET", DEFAULT_DEVNET_FAUCET),
            faucet_testnet: or_default("XRPL_FAUCET_TESTNET", DEFAULT_TESTNET_FAUCET),
            issuer_policy,
            signing,
            log_format,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
