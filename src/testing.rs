// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles shared by unit tests across the crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::ledger::codec;
use crate::ledger::faucet::Faucet;
use crate::ledger::session::{LedgerConnector, LedgerSession};
use crate::ledger::{Ledger, LedgerError, Network};
use crate::signing::InMemoryProvider;
use crate::state::AppState;
use crate::storage::IssuerDatabase;

/// Validated ledger index reported by [`MockLedger`].
pub const MOCK_LEDGER_INDEX: u32 = 1_000;

/// Drops credited by the mock faucet (20 XRP).
pub const MOCK_FAUCET_DROPS: u64 = 20_000_000;

/// A transaction blob accepted by the mock `submit` command.
#[derive(Debug, Clone)]
pub struct SubmittedTx {
    pub hash: String,
    pub tx_blob: String,
}

#[derive(Default)]
struct MockState {
    connects: usize,
    closes: usize,
    fund_calls: usize,
    requests: HashMap<String, usize>,
    fail_connect: bool,
    fail_close: bool,
    fail_submit: bool,
    engine_result: Option<String>,
    accounts: HashMap<String, u64>,
    lines: HashMap<String, Vec<Value>>,
    offers: Vec<Value>,
    submitted: Vec<SubmittedTx>,
}

/// In-process ledger and faucet that records every interaction.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`Ledger`] wired to this mock for both sessions and faucet.
    pub fn ledger(&self, network: Network) -> Ledger {
        Ledger::new(network, Arc::new(self.clone()), Arc::new(self.clone()))
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn fund_calls(&self) -> usize {
        self.state.lock().unwrap().fund_calls
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    /// Every RPC command issued, plus connects and faucet calls.
    pub fn network_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.connects + state.fund_calls + state.requests.values().sum::<usize>()
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.lock().unwrap().fail_close = fail;
    }

    pub fn fail_submit(&self, fail: bool) {
        self.state.lock().unwrap().fail_submit = fail;
    }

    /// Engine result returned by `submit` (default `tesSUCCESS`).
    pub fn set_engine_result(&self, result: &str) {
        self.state.lock().unwrap().engine_result = Some(result.to_string());
    }

    pub fn seed_account(&self, address: &str, drops: u64) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(address.to_string(), drops);
    }

    pub fn balance(&self, address: &str) -> Option<u64> {
        self.state.lock().unwrap().accounts.get(address).copied()
    }

    pub fn set_lines(&self, account: &str, lines: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .lines
            .insert(account.to_string(), lines);
    }

    pub fn set_offers(&self, offers: Vec<Value>) {
        self.state.lock().unwrap().offers = offers;
    }

    pub fn submitted(&self) -> Vec<SubmittedTx> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn handle(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let mut state = self.state.lock().unwrap();
        *state.requests.entry(method.to_string()).or_default() += 1;

        match method {
            "ping" => Ok(json!({ "status": "success" })),
            "account_info" => {
                let account = params["account"].as_str().unwrap_or_default().to_string();
                match state.accounts.get(&account) {
                    Some(balance) => Ok(json!({
                        "account_data": {
                            "Account": account,
                            "Balance": balance.to_string(),
                            "Sequence": 1,
                            "OwnerCount": 0,
                            "Flags": 0
                        },
                        "ledger_current_index": MOCK_LEDGER_INDEX,
                        "status": "success"
                    })),
                    None => Err(LedgerError::Rpc(
                        "account_info: actNotFound: Account not found.".to_string(),
                    )),
                }
            }
            "fee" => Ok(json!({
                "drops": { "base_fee": "10", "open_ledger_fee": "12" },
                "status": "success"
            })),
            "ledger_current" => Ok(json!({
                "ledger_current_index": MOCK_LEDGER_INDEX,
                "status": "success"
            })),
            "submit" => {
                if state.fail_submit {
                    return Err(LedgerError::Unavailable("submit failed: connection reset".to_string()));
                }
                let tx_blob = params["tx_blob"].as_str().unwrap_or_default().to_string();
                let bytes = hex::decode(&tx_blob)
                    .map_err(|e| LedgerError::Rpc(format!("submit: invalidTransaction: {e}")))?;
                let hash = codec::transaction_id(&bytes);
                state.submitted.push(SubmittedTx {
                    hash: hash.clone(),
                    tx_blob: tx_blob.clone(),
                });
                let engine_result = state
                    .engine_result
                    .clone()
                    .unwrap_or_else(|| "tesSUCCESS".to_string());
                Ok(json!({
                    "engine_result": engine_result,
                    "tx_blob": tx_blob,
                    "tx_json": { "hash": hash },
                    "status": "success"
                }))
            }
            "account_lines" => {
                let account = params["account"].as_str().unwrap_or_default();
                let lines = state.lines.get(account).cloned().unwrap_or_default();
                Ok(json!({ "account": account, "lines": lines, "status": "success" }))
            }
            "book_offers" => Ok(json!({ "offers": state.offers.clone(), "status": "success" })),
            other => Err(LedgerError::Rpc(format!("{other}: unknownCmd: Unknown method."))),
        }
    }
}

#[async_trait]
impl LedgerConnector for MockLedger {
    async fn connect(&self, network: Network) -> Result<Box<dyn LedgerSession>, LedgerError> {
        {
            let mut state = self.state.lock().unwrap();
            state.connects += 1;
            if state.fail_connect {
                return Err(LedgerError::Unavailable("connection refused".to_string()));
            }
        }
        Ok(Box::new(MockSession {
            ledger: self.clone(),
            network,
        }))
    }
}

#[async_trait]
impl Faucet for MockLedger {
    async fn fund(&self, _network: Network, address: &str) -> Result<Value, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.fund_calls += 1;
        *state.accounts.entry(address.to_string()).or_default() += MOCK_FAUCET_DROPS;
        Ok(json!({ "account": { "classicAddress": address }, "amount": 20 }))
    }
}

struct MockSession {
    ledger: MockLedger,
    network: Network,
}

#[async_trait]
impl LedgerSession for MockSession {
    async fn request(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        self.ledger.handle(method, params)
    }

    async fn close(&self) -> Result<(), LedgerError> {
        let mut state = self.ledger.state.lock().unwrap();
        state.closes += 1;
        if state.fail_close {
            return Err(LedgerError::Unavailable("close failed".to_string()));
        }
        Ok(())
    }

    fn network(&self) -> Network {
        self.network
    }
}

/// A fresh database in a temporary directory. Keep the `TempDir` alive.
pub fn temp_db() -> (TempDir, Arc<IssuerDatabase>) {
    let dir = TempDir::new().unwrap();
    let db = IssuerDatabase::open(&dir.path().join("ledger.redb")).unwrap();
    (dir, Arc::new(db))
}

/// An [`AppState`] over a [`MockLedger`], an in-memory signing provider and
/// a throwaway database.
pub struct TestApp {
    pub dir: TempDir,
    pub mock: MockLedger,
    pub provider: Arc<InMemoryProvider>,
    pub state: AppState,
}

impl TestApp {
    pub fn new(network: Network) -> Self {
        let (dir, db) = temp_db();
        let mock = MockLedger::new();
        let provider = Arc::new(InMemoryProvider::new());

        let mut config = Config::from_lookup(|_| None).unwrap();
        config.network = network;
        config.data_dir = dir.path().to_path_buf();

        let state = AppState::new(config, mock.ledger(network), db, provider.clone());
        Self {
            dir,
            mock,
            provider,
            state,
        }
    }
}
