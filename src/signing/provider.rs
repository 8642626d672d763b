// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-app signing providers.
//!
//! A provider holds signing payloads on our behalf: we register the
//! transaction JSON, the user scans a QR code or follows a deep link in their
//! wallet app, and we poll the payload until it resolves. Raw secrets never
//! pass through this path.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use utoipa::ToSchema;

use super::SigningError;

pub const DEFAULT_XUMM_BASE_URL: &str = "https://xumm.app/api/v1";

/// Handle to a freshly registered payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayloadRef {
    pub uuid: String,
    /// Deep link that opens the payload in the wallet app.
    pub next: Option<String>,
    /// QR code image URL for the same link.
    pub qr_png: Option<String>,
}

/// Resolution state of a payload as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadStatus {
    pub uuid: String,
    pub resolved: bool,
    /// True only when the payload is resolved and the user signed it.
    pub signed: bool,
    pub account: Option<String>,
    pub txid: Option<String>,
    pub raw: Value,
}

/// A service that holds payloads for out-of-band signing.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// Short identifier used in logs and health output.
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<Value, SigningError>;

    /// Register `txjson` for signing. With `submit` the wallet app submits
    /// the signed transaction itself.
    async fn create_payload(&self, txjson: Value, submit: bool) -> Result<PayloadRef, SigningError>;

    async fn get_payload(&self, uuid: &str) -> Result<PayloadStatus, SigningError>;
}

/// Stand-in when no wallet signing provider is configured.
///
/// Every call fails with [`SigningError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl SigningProvider for UnconfiguredProvider {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn ping(&self) -> Result<Value, SigningError> {
        Err(SigningError::NotConfigured)
    }

    async fn create_payload(&self, _txjson: Value, _submit: bool) -> Result<PayloadRef, SigningError> {
        Err(SigningError::NotConfigured)
    }

    async fn get_payload(&self, _uuid: &str) -> Result<PayloadStatus, SigningError> {
        Err(SigningError::NotConfigured)
    }
}

// =============================================================================
// Xumm
// =============================================================================

/// Credentials for the Xumm platform API.
#[derive(Debug, Clone)]
pub struct XummConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

/// Client for the Xumm platform API.
#[derive(Debug, Clone)]
pub struct XummClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    http: Client,
}

impl XummClient {
    pub fn new(config: &XummConfig) -> Result<Self, SigningError> {
        if config.api_key.trim().is_empty() || config.api_secret.trim().is_empty() {
            return Err(SigningError::NotConfigured);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SigningError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, uuid: Option<&str>) -> Result<Value, SigningError> {
        let response = request
            .header("X-API-Key", &self.api_key)
            .header("X-API-Secret", &self.api_secret)
            .send()
            .await
            .map_err(|e| SigningError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(uuid) = uuid {
                return Err(SigningError::PayloadNotFound(uuid.to_string()));
            }
        }
        let body = response
            .text()
            .await
            .map_err(|e| SigningError::Provider(format!("failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(SigningError::Provider(format!("HTTP {status}: {body}")));
        }
        serde_json::from_str(&body)
            .map_err(|e| SigningError::InvalidResponse(format!("response was not JSON: {e}")))
    }
}

#[async_trait]
impl SigningProvider for XummClient {
    fn name(&self) -> &'static str {
        "xumm"
    }

    async fn ping(&self) -> Result<Value, SigningError> {
        self.send(self.http.get(self.url("/platform/ping")), None).await
    }

    async fn create_payload(&self, txjson: Value, submit: bool) -> Result<PayloadRef, SigningError> {
        let body = json!({ "txjson": txjson, "options": { "submit": submit } });
        let response = self
            .send(self.http.post(self.url("/platform/payload")).json(&body), None)
            .await?;
        let payload = parse_created(&response)?;
        debug!(uuid = %payload.uuid, submit, "Xumm payload created");
        Ok(payload)
    }

    async fn get_payload(&self, uuid: &str) -> Result<PayloadStatus, SigningError> {
        let response = self
            .send(
                self.http.get(self.url(&format!("/platform/payload/{uuid}"))),
                Some(uuid),
            )
            .await?;
        Ok(parse_status(uuid, response))
    }
}

/// Extract the payload handle from a create response.
fn parse_created(response: &Value) -> Result<PayloadRef, SigningError> {
    let uuid = response
        .get("uuid")
        .and_then(Value::as_str)
        .ok_or_else(|| SigningError::InvalidResponse("missing payload uuid".to_string()))?;
    let next = response
        .pointer("/next/always")
        .and_then(Value::as_str)
        .map(str::to_string);
    let qr_png = response
        .pointer("/refs/qr_png")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(PayloadRef {
        uuid: uuid.to_string(),
        next,
        qr_png,
    })
}

/// Interpret a payload lookup. A payload counts as signed only once it is
/// also resolved. Expired and cancelled payloads are resolved unsigned.
fn parse_status(uuid: &str, raw: Value) -> PayloadStatus {
    let flag = |pointer: &str| raw.pointer(pointer).and_then(Value::as_bool).unwrap_or(false);
    let text = |pointer: &str| {
        raw.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let resolved = flag("/meta/resolved") || flag("/meta/expired") || flag("/meta/cancelled");
    PayloadStatus {
        uuid: uuid.to_string(),
        resolved,
        signed: resolved && flag("/meta/signed"),
        account: text("/response/account"),
        txid: text("/response/txid"),
        raw,
    }
}
