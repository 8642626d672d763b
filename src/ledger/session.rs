// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Session Manager
//!
//! One session per unit of work. [`SessionManager::with_session`] opens a
//! session for the requested network, runs the caller's work against it and
//! closes it on every exit path. Close failures are logged and swallowed.
//! Sessions are never pooled or shared across invocations.
//!
//! The production transport is rippled's JSON-RPC over HTTPS
//! ([`JsonRpcConnector`]); tests plug in their own [`LedgerConnector`].

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::network::{Network, NetworkEndpoints};
use super::LedgerError;

/// Default per-request timeout for the JSON-RPC transport.
const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);

/// Boxed future returned by the unit of work passed to
/// [`SessionManager::with_session`].
pub type SessionFuture<'s, T, E = LedgerError> =
    Pin<Box<dyn Future<Output = Result<T, E>> + Send + 's>>;

/// A live connection to a ledger node.
#[async_trait]
pub trait LedgerSession: Send + Sync {
    /// Issue one RPC command and return its `result` object.
    async fn request(&self, method: &str, params: Value) -> Result<Value, LedgerError>;

    /// Tear the session down.
    async fn close(&self) -> Result<(), LedgerError>;

    fn network(&self) -> Network;
}

/// Opens sessions.
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    async fn connect(&self, network: Network) -> Result<Box<dyn LedgerSession>, LedgerError>;
}

/// Scoped access to ledger sessions.
#[derive(Clone)]
pub struct SessionManager {
    connector: Arc<dyn LedgerConnector>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn LedgerConnector>) -> Self {
        Self { connector }
    }

    /// Run `work` against a fresh session and always close it afterwards.
    ///
    /// A failure to connect is returned as is. An error from `work` is
    /// returned after the session is closed.
    pub async fn with_session<T, E, F>(&self, network: Network, work: F) -> Result<T, E>
    where
        E: From<LedgerError>,
        F: for<'s> FnOnce(&'s dyn LedgerSession) -> SessionFuture<'s, T, E>,
    {
        let session = self.connector.connect(network).await?;
        let result = work(session.as_ref()).await;
        if let Err(e) = session.close().await {
            debug!(%network, error = %e, "Ignoring ledger session close failure");
        }
        result
    }
}

// =============================================================================
// JSON-RPC transport
// =============================================================================

/// Connects to rippled's JSON-RPC endpoint for each network.
pub struct JsonRpcConnector {
    endpoints: NetworkEndpoints,
    timeout: Duration,
}

impl JsonRpcConnector {
    pub fn new(endpoints: NetworkEndpoints) -> Self {
        Self {
            endpoints,
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LedgerConnector for JsonRpcConnector {
    async fn connect(&self, network: Network) -> Result<Box<dyn LedgerSession>, LedgerError> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        let session = JsonRpcSession {
            http,
            url: self.endpoints.url(network).clone(),
            network,
            closed: AtomicBool::new(false),
        };

        // An HTTP endpoint has no handshake; a ping proves it is reachable.
        session.request("ping", json!({})).await?;
        debug!(%network, url = %session.url, "Ledger session opened");
        Ok(Box::new(session))
    }
}

struct JsonRpcSession {
    http: Client,
    url: Url,
    network: Network,
    closed: AtomicBool,
}

#[async_trait]
impl LedgerSession for JsonRpcSession {
    async fn request(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LedgerError::Unavailable("session already closed".to_string()));
        }

        let body = json!({ "method": method, "params": [params] });
        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("{method} failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(LedgerError::Unavailable(format!(
                "{method} returned {status}"
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rpc(format!("{method} returned {status}: {text}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{method} returned invalid JSON: {e}")))?;

        extract_result(method, payload)
    }

    async fn close(&self) -> Result<(), LedgerError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(LedgerError::Unavailable("session already closed".to_string()));
        }
        debug!(network = %self.network, "Ledger session closed");
        Ok(())
    }

    fn network(&self) -> Network {
        self.network
    }
}

/// Unwrap a JSON-RPC envelope, turning `status: "error"` into an error.
pub(crate) fn extract_result(method: &str, payload: Value) -> Result<Value, LedgerError> {
    let result = payload
        .get("result")
        .cloned()
        .ok_or_else(|| LedgerError::Rpc(format!("{method} response has no result")))?;

    if result.get("status").and_then(Value::as_str) == Some("error") {
        let code = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let message = result
            .get("error_message")
            .and_then(Value::as_str)
            .unwrap_or(code);
        return Err(LedgerError::Rpc(format!("{method}: {code}: {message}")));
    }
    Ok(result)
}

/// True when an RPC error is the ledger reporting an unknown account.
pub fn is_account_not_found(err: &LedgerError) -> bool {
    matches!(err, LedgerError::Rpc(msg) if msg.contains("actNotFound"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLedger;

    #[tokio::test]
    async fn session_is_closed_after_success() {
        let mock = MockLedger::new();
        let sessions = SessionManager::new(Arc::new(mock.clone()));

        let value: u32 = sessions
            .with_session(Network::Devnet, |session| {
                Box::pin(async move {
                    session.request("ping", json!({})).await?;
                    Ok::<_, LedgerError>(7)
                })
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(mock.connects(), 1);
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn session_is_closed_exactly_once_when_work_fails() {
        let mock = MockLedger::new();
        let sessions = SessionManager::new(Arc::new(mock.clone()));

        let result: Result<(), LedgerError> = sessions
            .with_session(Network::Devnet, |_session| {
                Box::pin(async move { Err(LedgerError::Rpc("boom".to_string())) })
            })
            .await;

        assert!(matches!(result, Err(LedgerError::Rpc(msg)) if msg == "boom"));
        assert_eq!(mock.connects(), 1);
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn close_failure_is_swallowed() {
        let mock = MockLedger::new();
        mock.fail_close(true);
        let sessions = SessionManager::new(Arc::new(mock.clone()));

        let result: Result<&str, LedgerError> = sessions
            .with_session(Network::Testnet, |_session| Box::pin(async move { Ok("done") }))
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn connect_failure_propagates_without_close() {
        let mock = MockLedger::new();
        mock.fail_connect(true);
        let sessions = SessionManager::new(Arc::new(mock.clone()));

        let result: Result<(), LedgerError> = sessions
            .with_session(Network::Devnet, |_session| Box::pin(async move { Ok(()) }))
            .await;

        assert!(matches!(result, Err(LedgerError::Unavailable(_))));
        assert_eq!(mock.closes(), 0);
    }

    #[tokio::test]
    async fn each_invocation_gets_its_own_session() {
        let mock = MockLedger::new();
        let sessions = SessionManager::new(Arc::new(mock.clone()));

        for _ in 0..3 {
            let _: () = sessions
                .with_session(Network::Devnet, |_session| Box::pin(async move { Ok::<_, LedgerError>(()) }))
                .await
                .unwrap();
        }
        assert_eq!(mock.connects(), 3);
        assert_eq!(mock.closes(), 3);
    }

    #[test]
    fn extract_result_maps_error_status() {
        let err = extract_result(
            "account_info",
            json!({ "result": { "status": "error", "error": "actNotFound", "error_message": "Account not found." } }),
        )
        .unwrap_err();
        assert!(is_account_not_found(&err));
        assert!(err.to_string().contains("Account not found."));
    }

    #[test]
    fn extract_result_requires_result_object() {
        assert!(extract_result("ping", json!({})).is_err());
        let ok = extract_result("ping", json!({ "result": { "status": "success" } })).unwrap();
        assert_eq!(ok["status"], "success");
    }
}
