// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process signing provider.
//!
//! Payloads live in memory and are resolved by calling [`InMemoryProvider::resolve`]
//! or [`InMemoryProvider::reject`] directly. Used in tests and, with
//! `SIGNING_PROVIDER=memory`, for local development off mainnet. A [`PayloadSweeper`]
//! evicts payloads that nobody came back for.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::provider::{PayloadRef, PayloadStatus, SigningProvider};
use super::SigningError;

/// Payloads older than this are evicted by the sweeper.
pub const DEFAULT_PAYLOAD_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Pending,
    Signed {
        account: String,
        txid: Option<String>,
    },
    Rejected,
}

#[derive(Debug, Clone)]
struct MemoryPayload {
    txjson: Value,
    submit: bool,
    created_at: DateTime<Utc>,
    resolution: Resolution,
}

/// Provider that keeps payloads in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    payloads: RwLock<HashMap<String, MemoryPayload>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a pending payload as signed by `account`.
    pub async fn resolve(
        &self,
        uuid: &str,
        account: &str,
        txid: Option<&str>,
    ) -> Result<(), SigningError> {
        self.settle(
            uuid,
            Resolution::Signed {
                account: account.to_string(),
                txid: txid.map(str::to_string),
            },
        )
        .await
    }

    /// Mark a pending payload as declined by the user.
    pub async fn reject(&self, uuid: &str) -> Result<(), SigningError> {
        self.settle(uuid, Resolution::Rejected).await
    }

    async fn settle(&self, uuid: &str, resolution: Resolution) -> Result<(), SigningError> {
        let mut payloads = self.payloads.write().await;
        let payload = payloads
            .get_mut(uuid)
            .ok_or_else(|| SigningError::PayloadNotFound(uuid.to_string()))?;
        if payload.resolution != Resolution::Pending {
            return Err(SigningError::AlreadyResolved(uuid.to_string()));
        }
        payload.resolution = resolution;
        Ok(())
    }

    /// Remove every payload created more than `age` ago. Returns how many
    /// were removed.
    pub async fn delete_older_than(&self, age: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(age) {
            Ok(age) => Utc::now() - age,
            Err(_) => return 0,
        };
        let mut payloads = self.payloads.write().await;
        let before = payloads.len();
        payloads.retain(|_, payload| payload.created_at > cutoff);
        before - payloads.len()
    }

    pub async fn payload_count(&self) -> usize {
        self.payloads.read().await.len()
    }
}

#[async_trait]
impl SigningProvider for InMemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<Value, SigningError> {
        Ok(json!({
            "pong": true,
            "provider": self.name(),
            "payloads": self.payload_count().await,
        }))
    }

    async fn create_payload(&self, txjson: Value, submit: bool) -> Result<PayloadRef, SigningError> {
        let uuid = Uuid::new_v4().to_string();
        self.payloads.write().await.insert(
            uuid.clone(),
            MemoryPayload {
                txjson,
                submit,
                created_at: Utc::now(),
                resolution: Resolution::Pending,
            },
        );
        Ok(PayloadRef {
            next: Some(format!("memory://sign/{uuid}")),
            qr_png: None,
            uuid,
        })
    }

    async fn get_payload(&self, uuid: &str) -> Result<PayloadStatus, SigningError> {
        let payloads = self.payloads.read().await;
        let payload = payloads
            .get(uuid)
            .ok_or_else(|| SigningError::PayloadNotFound(uuid.to_string()))?;

        let (resolved, signed, account, txid) = match &payload.resolution {
            Resolution::Pending => (false, false, None, None),
            Resolution::Rejected => (true, false, None, None),
            Resolution::Signed { account, txid } => (true, true, Some(account.clone()), txid.clone()),
        };
        let raw = json!({
            "meta": { "uuid": uuid, "resolved": resolved, "signed": signed, "submit": payload.submit },
            "payload": { "request_json": payload.txjson, "created_at": payload.created_at },
            "response": { "account": account, "txid": txid },
        });

        Ok(PayloadStatus {
            uuid: uuid.to_string(),
            resolved,
            signed,
            account,
            txid,
            raw,
        })
    }
}

// =============================================================================
// Sweeper
// =============================================================================

/// Background task that evicts stale in-memory payloads.
pub struct PayloadSweeper {
    provider: Arc<InMemoryProvider>,
    max_age: Duration,
    interval: Duration,
}

impl PayloadSweeper {
    pub fn new(provider: Arc<InMemoryProvider>) -> Self {
        Self {
            provider,
            max_age: DEFAULT_PAYLOAD_TTL,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            max_age_secs = self.max_age.as_secs(),
            "Payload sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Payload sweeper shutting down");
                    return;
                }
            }

            let removed = self.provider.delete_older_than(self.max_age).await;
            if removed > 0 {
                debug!(removed, "Evicted stale signing payloads");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_once() {
        let provider = InMemoryProvider::new();
        let payload = provider
            .create_payload(json!({ "TransactionType": "SignIn" }), false)
            .await
            .unwrap();

        let pending = provider.get_payload(&payload.uuid).await.unwrap();
        assert!(!pending.resolved);

        provider.resolve(&payload.uuid, "rSigner", Some("AB12")).await.unwrap();
        let status = provider.get_payload(&payload.uuid).await.unwrap();
        assert!(status.signed);
        assert_eq!(status.account.as_deref(), Some("rSigner"));
        assert_eq!(status.txid.as_deref(), Some("AB12"));
        assert_eq!(status.raw["payload"]["request_json"]["TransactionType"], "SignIn");

        let again = provider.reject(&payload.uuid).await.unwrap_err();
        assert!(matches!(again, SigningError::AlreadyResolved(_)));
    }

    #[tokio::test]
    async fn rejected_payload_is_resolved_but_unsigned() {
        let provider = InMemoryProvider::new();
        let payload = provider.create_payload(json!({}), false).await.unwrap();
        provider.reject(&payload.uuid).await.unwrap();

        let status = provider.get_payload(&payload.uuid).await.unwrap();
        assert!(status.resolved);
        assert!(!status.signed);
        assert!(status.account.is_none());
    }

    #[tokio::test]
    async fn unknown_payload_is_not_found() {
        let provider = InMemoryProvider::new();
        let err = provider.get_payload("missing").await.unwrap_err();
        assert!(matches!(err, SigningError::PayloadNotFound(_)));
    }

    #[tokio::test]
    async fn delete_older_than_keeps_recent_payloads() {
        let provider = InMemoryProvider::new();
        provider.create_payload(json!({}), false).await.unwrap();
        provider.create_payload(json!({}), true).await.unwrap();

        assert_eq!(provider.delete_older_than(Duration::from_secs(3600)).await, 0);
        assert_eq!(provider.payload_count().await, 2);
        assert_eq!(provider.delete_older_than(Duration::ZERO).await, 2);
        assert_eq!(provider.payload_count().await, 0);
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let provider = Arc::new(InMemoryProvider::new());
        provider.create_payload(json!({}), false).await.unwrap();

        let shutdown = CancellationToken::new();
        let sweeper = PayloadSweeper::new(provider.clone())
            .with_max_age(Duration::ZERO)
            .with_interval(Duration::from_millis(10));
        let handle = tokio::spawn(sweeper.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(provider.payload_count().await, 0);
    }
}
