// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Autofill, sign and submit, plus result normalization.
//!
//! ## Result normalization
//!
//! Submit responses come in a handful of shapes depending on the RPC method
//! and whether the caller passes the whole envelope or just `result`.
//! [`normalize_outcome`] reads them in a fixed priority order:
//!
//! | Field | Priority |
//! |-------|----------|
//! | engine result | `/result/engine_result`, `/engine_result`, `/result/meta/TransactionResult`, `/meta/TransactionResult` |
//! | transaction hash | `/result/tx_json/hash`, `/result/hash`, `/tx_json/hash`, `/hash` |
//!
//! When nothing matches the field is `None`. That is an ambiguous outcome,
//! not an error: the transaction may still have been accepted.
//!
//! Submission is never retried here. A blind resubmit after an ambiguous
//! result can race the original with a different sequence number.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use utoipa::ToSchema;

use super::keys::Keypair;
use super::session::LedgerSession;
use super::transaction::{SignedTransaction, Transaction};
use super::LedgerError;

/// Ledgers of headroom given to `LastLedgerSequence`.
pub const LEDGER_OFFSET: u32 = 20;
/// Fee used when the node reports none.
pub const DEFAULT_FEE_DROPS: u64 = 12;
/// Upper bound on autofilled fees (2 XRP).
pub const MAX_FEE_DROPS: u64 = 2_000_000;

const ENGINE_RESULT_POINTERS: [&str; 4] = [
    "/result/engine_result",
    "/engine_result",
    "/result/meta/TransactionResult",
    "/meta/TransactionResult",
];

const HASH_POINTERS: [&str; 4] = [
    "/result/tx_json/hash",
    "/result/hash",
    "/tx_json/hash",
    "/hash",
];

/// Normalized outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TxOutcome {
    /// Provisional engine result, e.g. `tesSUCCESS`.
    pub engine_result: Option<String>,
    pub transaction_hash: Option<String>,
    /// The response as returned by the node.
    #[schema(value_type = Object)]
    pub raw_response: Value,
}

impl TxOutcome {
    pub fn is_success(&self) -> bool {
        self.engine_result.as_deref() == Some("tesSUCCESS")
    }

    /// Neither an engine result nor a hash could be found.
    pub fn is_ambiguous(&self) -> bool {
        self.engine_result.is_none() && self.transaction_hash.is_none()
    }
}

/// Extract `(engine_result, hash)` from any known response shape.
pub fn normalize_outcome(raw: Value) -> TxOutcome {
    TxOutcome {
        engine_result: first_string(&raw, &ENGINE_RESULT_POINTERS),
        transaction_hash: first_string(&raw, &HASH_POINTERS),
        raw_response: raw,
    }
}

fn first_string(raw: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .find_map(|p| raw.pointer(p).and_then(Value::as_str))
        .map(str::to_string)
}

// =============================================================================
// Autofill
// =============================================================================

/// Fill `Sequence`, `Fee` and `LastLedgerSequence` from the network.
pub async fn autofill(session: &dyn LedgerSession, tx: &mut Transaction) -> Result<(), LedgerError> {
    if tx.sequence.is_none() {
        let info = session
            .request(
                "account_info",
                json!({ "account": tx.account, "ledger_index": "current" }),
            )
            .await?;
        let sequence = info
            .pointer("/account_data/Sequence")
            .and_then(Value::as_u64)
            .and_then(|s| u32::try_from(s).ok())
            .ok_or_else(|| LedgerError::Rpc("account_info response has no Sequence".to_string()))?;
        tx.sequence = Some(sequence);
    }

    if tx.fee_drops.is_none() {
        let fee = session.request("fee", json!({})).await?;
        tx.fee_drops = Some(fee_from_response(&fee));
    }

    if tx.last_ledger_sequence.is_none() {
        let current = session.request("ledger_current", json!({})).await?;
        let index = current
            .get("ledger_current_index")
            .and_then(Value::as_u64)
            .and_then(|s| u32::try_from(s).ok())
            .ok_or_else(|| {
                LedgerError::Rpc("ledger_current response has no ledger_current_index".to_string())
            })?;
        tx.last_ledger_sequence = Some(index.saturating_add(LEDGER_OFFSET));
    }

    Ok(())
}

/// Pick the higher of base and open-ledger fee, clamped to [`MAX_FEE_DROPS`].
fn fee_from_response(fee: &Value) -> u64 {
    let read = |pointer: &str| {
        fee.pointer(pointer)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
    };
    let base = read("/drops/base_fee");
    let open = read("/drops/open_ledger_fee");
    let chosen = match (base, open) {
        (Some(b), Some(o)) => b.max(o),
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => DEFAULT_FEE_DROPS,
    };
    chosen.min(MAX_FEE_DROPS)
}

// =============================================================================
// Submit
// =============================================================================

/// Submit a signed blob and return the provisional outcome.
pub async fn submit_signed(
    session: &dyn LedgerSession,
    signed: &SignedTransaction,
) -> Result<TxOutcome, LedgerError> {
    let raw = session
        .request("submit", json!({ "tx_blob": signed.tx_blob }))
        .await?;
    let outcome = normalize_outcome(raw);

    if outcome.is_ambiguous() {
        debug!(local_hash = %signed.hash, "Submit response had no engine result or hash");
    }
    info!(
        network = %session.network(),
        hash = outcome.transaction_hash.as_deref().unwrap_or("-"),
        engine_result = outcome.engine_result.as_deref().unwrap_or("-"),
        "Transaction submitted"
    );
    Ok(outcome)
}

/// Autofill, sign locally with `keypair`, and submit.
pub async fn sign_and_submit(
    session: &dyn LedgerSession,
    mut tx: Transaction,
    keypair: &Keypair,
) -> Result<TxOutcome, LedgerError> {
    autofill(session, &mut tx).await?;
    let signed = tx.sign(keypair)?;
    debug!(
        tx_type = tx.intent.transaction_type().as_str(),
        account = %tx.account,
        sequence = ?tx.sequence,
        "Signed transaction"
    );
    submit_signed(session, &signed).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{amount::Amount, network::Network, transaction::TxIntent};
    use crate::testing::{MockLedger, MOCK_LEDGER_INDEX};
    use crate::ledger::session::LedgerConnector;

    const GENESIS_SEED: &str = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb";
    const GENESIS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const OTHER: &str = "rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1";

    #[test]
    fn normalize_prefers_result_engine_result() {
        let outcome = normalize_outcome(json!({
            "result": {
                "engine_result": "tesSUCCESS",
                "meta": { "TransactionResult": "tecNO_DST" },
                "tx_json": { "hash": "AAA" },
                "hash": "BBB"
            },
            "engine_result": "terQUEUED"
        }));
        assert_eq!(outcome.engine_result.as_deref(), Some("tesSUCCESS"));
        assert_eq!(outcome.transaction_hash.as_deref(), Some("AAA"));
    }

    #[test]
    fn normalize_reads_bare_result_shape() {
        let outcome = normalize_outcome(json!({
            "engine_result": "tesSUCCESS",
            "tx_json": { "hash": "CCC" }
        }));
        assert_eq!(outcome.engine_result.as_deref(), Some("tesSUCCESS"));
        assert_eq!(outcome.transaction_hash.as_deref(), Some("CCC"));
        assert!(outcome.is_success());
    }

    #[test]
    fn normalize_falls_back_to_validated_meta() {
        let outcome = normalize_outcome(json!({
            "result": { "meta": { "TransactionResult": "tecPATH_DRY" }, "hash": "DDD" }
        }));
        assert_eq!(outcome.engine_result.as_deref(), Some("tecPATH_DRY"));
        assert_eq!(outcome.transaction_hash.as_deref(), Some("DDD"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn normalize_unknown_shape_is_ambiguous_not_error() {
        let outcome = normalize_outcome(json!({ "accepted": true }));
        assert!(outcome.is_ambiguous());
        assert_eq!(outcome.raw_response["accepted"], true);
    }

    #[test]
    fn fee_takes_max_and_clamps() {
        assert_eq!(
            fee_from_response(&json!({ "drops": { "base_fee": "10", "open_ledger_fee": "15" } })),
            15
        );
        assert_eq!(
            fee_from_response(&json!({ "drops": { "open_ledger_fee": "99999999" } })),
            MAX_FEE_DROPS
        );
        assert_eq!(fee_from_response(&json!({})), DEFAULT_FEE_DROPS);
    }

    #[tokio::test]
    async fn autofill_sets_sequence_fee_and_ledger_bound() {
        let mock = MockLedger::new();
        mock.seed_account(GENESIS, 50_000_000);
        let session = mock.connect(Network::Devnet).await.unwrap();

        let intent = TxIntent::payment(OTHER, Amount::Drops(10), vec![]).unwrap();
        let mut tx = Transaction::new(GENESIS, intent);
        autofill(session.as_ref(), &mut tx).await.unwrap();

        assert_eq!(tx.sequence, Some(1));
        assert_eq!(tx.fee_drops, Some(12));
        assert_eq!(tx.last_ledger_sequence, Some(MOCK_LEDGER_INDEX + LEDGER_OFFSET));
    }

    #[tokio::test]
    async fn autofill_surfaces_unknown_account() {
        let mock = MockLedger::new();
        let session = mock.connect(Network::Devnet).await.unwrap();

        let intent = TxIntent::payment(OTHER, Amount::Drops(10), vec![]).unwrap();
        let mut tx = Transaction::new(GENESIS, intent);
        let err = autofill(session.as_ref(), &mut tx).await.unwrap_err();
        assert!(crate::ledger::session::is_account_not_found(&err));
    }

    #[tokio::test]
    async fn sign_and_submit_returns_normalized_outcome() {
        let mock = MockLedger::new();
        mock.seed_account(GENESIS, 50_000_000);
        let session = mock.connect(Network::Devnet).await.unwrap();
        let keypair = Keypair::from_secret(GENESIS_SEED).unwrap();

        let intent = TxIntent::payment(OTHER, Amount::Drops(10), vec![]).unwrap();
        let outcome = sign_and_submit(session.as_ref(), Transaction::new(GENESIS, intent), &keypair)
            .await
            .unwrap();

        assert!(outcome.is_success());
        let submitted = mock.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(outcome.transaction_hash.as_deref(), Some(submitted[0].hash.as_str()));
    }

    #[tokio::test]
    async fn submit_is_not_retried_on_transport_failure() {
        let mock = MockLedger::new();
        mock.seed_account(GENESIS, 50_000_000);
        mock.fail_submit(true);
        let session = mock.connect(Network::Devnet).await.unwrap();
        let keypair = Keypair::from_secret(GENESIS_SEED).unwrap();

        let intent = TxIntent::payment(OTHER, Amount::Drops(10), vec![]).unwrap();
        let err = sign_and_submit(session.as_ref(), Transaction::new(GENESIS, intent), &keypair)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Unavailable(_)));
        assert_eq!(mock.request_count("submit"), 1);
    }
}
