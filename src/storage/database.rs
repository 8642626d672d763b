// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded issuer database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `issuers`: issuer_id → serialized StoredIssuer
//! - `tokens`: token_id → serialized StoredToken
//! - `wallets`: wallet_id → serialized StoredWallet
//! - `trustline_requests`: request_id → serialized TrustlineRequest
//! - `events`: composite key (!timestamp_be|event_id) → serialized Event
//! - `tx_log`: tx_hash → serialized TxLogEntry
//! - `meta`: key → value (e.g. `current_issuer`)
//!
//! redb allows a single writer at a time, so a read-then-insert inside one
//! write transaction is an atomic "insert if absent".

use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableHandle,
};
use serde::{de::DeserializeOwned, Serialize};

use super::events::{Event, TxLogEntry};

// =============================================================================
// Table Definitions
// =============================================================================

/// Entity table: string id → JSON bytes.
pub(crate) type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

pub(crate) const ISSUERS: JsonTable = TableDefinition::new("issuers");
pub(crate) const TOKENS: JsonTable = TableDefinition::new("tokens");
pub(crate) const WALLETS: JsonTable = TableDefinition::new("wallets");
pub(crate) const TRUSTLINE_REQUESTS: JsonTable = TableDefinition::new("trustline_requests");

/// Append-only event log, newest first when scanned forward.
const EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("events");

/// Dedup guard for externally signed transactions: tx_hash → TxLogEntry.
const TX_LOG: JsonTable = TableDefinition::new("tx_log");

/// Small key/value settings.
const META: TableDefinition<&str, &str> = TableDefinition::new("meta");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Event Key Helpers
// =============================================================================

/// Build the events table key: `inverted_timestamp_micros_be | event_id`.
///
/// The inverted timestamp gives newest-first ordering on a forward scan.
fn make_event_key(timestamp_micros: i64, event_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 1 + event_id.len());
    key.extend_from_slice(&(!(timestamp_micros as u64)).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(event_id.as_bytes());
    key
}

// =============================================================================
// IssuerDatabase
// =============================================================================

/// Embedded ACID store for issuer state and the audit log.
pub struct IssuerDatabase {
    db: Database,
}

impl IssuerDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ISSUERS)?;
            let _ = write_txn.open_table(TOKENS)?;
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(TRUSTLINE_REQUESTS)?;
            let _ = write_txn.open_table(EVENTS)?;
            let _ = write_txn.open_table(TX_LOG)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Entity tables
    // =========================================================================

    /// Insert a new record. Fails with [`DbError::Conflict`] if the id exists.
    pub(crate) fn insert_new<T: Serialize>(
        &self,
        table: JsonTable,
        id: &str,
        value: &T,
    ) -> DbResult<()> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            let exists = t.get(id)?.is_some();
            if exists {
                drop(t);
                write_txn.abort()?;
                return Err(DbError::Conflict(format!("{} {id} already exists", table.name())));
            }
            t.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        id: &str,
    ) -> DbResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        match t.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub(crate) fn list_json<T: DeserializeOwned>(&self, table: JsonTable) -> DbResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in t.iter()? {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(value.value())?);
        }
        Ok(out)
    }

    pub(crate) fn count(&self, table: JsonTable) -> DbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        Ok(t.len()?)
    }

    /// Read, modify and write back one record inside a single write
    /// transaction. If `update` fails nothing is written.
    pub(crate) fn update_json<T, F>(&self, table: JsonTable, id: &str, update: F) -> DbResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> DbResult<()>,
    {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut t = write_txn.open_table(table)?;
            let existing = {
                let guard = t.get(id)?;
                guard.map(|v| v.value().to_vec())
            };
            match existing {
                None => Err(DbError::NotFound(format!("{} {id}", table.name()))),
                Some(bytes) => {
                    let mut record: T = serde_json::from_slice(&bytes)?;
                    match update(&mut record) {
                        Ok(()) => {
                            let json = serde_json::to_vec(&record)?;
                            t.insert(id, json.as_slice())?;
                            Ok(record)
                        }
                        Err(e) => Err(e),
                    }
                }
            }
        };
        match result {
            Ok(record) => {
                write_txn.commit()?;
                Ok(record)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Issuers
    // =========================================================================

    /// Store an issuer record and make it the current issuer.
    pub(crate) fn insert_current_issuer<T: Serialize>(&self, id: &str, issuer: &T) -> DbResult<()> {
        let json = serde_json::to_vec(issuer)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut issuers = write_txn.open_table(ISSUERS)?;
            issuers.insert(id, json.as_slice())?;
            let mut meta = write_txn.open_table(META)?;
            meta.insert("current_issuer", id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub(crate) fn current_issuer_id(&self) -> DbResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let meta = read_txn.open_table(META)?;
        Ok(meta.get("current_issuer")?.map(|v| v.value().to_string()))
    }

    // =========================================================================
    // Events & TxLog
    // =========================================================================

    pub(crate) fn insert_event(&self, event: &Event) -> DbResult<()> {
        let json = serde_json::to_vec(event)?;
        let key = make_event_key(event.created_at.timestamp_micros(), &event.id);
        let write_txn = self.db.begin_write()?;
        {
            let mut events = write_txn.open_table(EVENTS)?;
            events.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Visit events newest first until `visit` returns `false`.
    pub(crate) fn scan_events<F>(&self, mut visit: F) -> DbResult<()>
    where
        F: FnMut(Event) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let events = read_txn.open_table(EVENTS)?;
        for entry in events.iter()? {
            let (_, value) = entry?;
            let event: Event = serde_json::from_slice(value.value())?;
            if !visit(event) {
                break;
            }
        }
        Ok(())
    }

    /// Write a TxLog row and its Event in one transaction, only if the
    /// transaction hash has not been logged before.
    ///
    /// Returns `false`, writing nothing, when the hash is already present.
    pub(crate) fn record_signed_once(&self, entry: &TxLogEntry, event: &Event) -> DbResult<bool> {
        let entry_json = serde_json::to_vec(entry)?;
        let event_json = serde_json::to_vec(event)?;
        let key = make_event_key(event.created_at.timestamp_micros(), &event.id);

        let write_txn = self.db.begin_write()?;
        {
            let mut tx_log = write_txn.open_table(TX_LOG)?;
            let exists = tx_log.get(entry.tx_hash.as_str())?.is_some();
            if exists {
                drop(tx_log);
                write_txn.abort()?;
                return Ok(false);
            }
            tx_log.insert(entry.tx_hash.as_str(), entry_json.as_slice())?;

            let mut events = write_txn.open_table(EVENTS)?;
            events.insert(key.as_slice(), event_json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    pub(crate) fn tx_log_entry(&self, tx_hash: &str) -> DbResult<Option<TxLogEntry>> {
        self.get_json(TX_LOG, tx_hash)
    }

    pub(crate) fn tx_log_len(&self) -> DbResult<u64> {
        self.count(TX_LOG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::events::EventType;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        n: u32,
    }

    fn setup() -> (TempDir, IssuerDatabase) {
        let temp = TempDir::new().unwrap();
        let db = IssuerDatabase::open(&temp.path().join("nested").join("ledger.redb")).unwrap();
        (temp, db)
    }

    #[test]
    fn event_keys_sort_newest_first() {
        let older = make_event_key(1_000, "a");
        let newer = make_event_key(2_000, "b");
        assert!(newer < older);
    }

    #[test]
    fn insert_new_rejects_duplicates() {
        let (_temp, db) = setup();
        db.insert_new(TOKENS, "t1", &Row { n: 1 }).unwrap();
        let err = db.insert_new(TOKENS, "t1", &Row { n: 2 }).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let row: Row = db.get_json(TOKENS, "t1").unwrap().unwrap();
        assert_eq!(row.n, 1);
        assert_eq!(db.count(TOKENS).unwrap(), 1);
    }

    #[test]
    fn update_json_leaves_record_untouched_on_error() {
        let (_temp, db) = setup();
        db.insert_new(WALLETS, "w1", &Row { n: 1 }).unwrap();

        let err = db
            .update_json::<Row, _>(WALLETS, "w1", |row| {
                row.n = 99;
                Err(DbError::Conflict("nope".into()))
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        let row: Row = db.get_json(WALLETS, "w1").unwrap().unwrap();
        assert_eq!(row.n, 1);

        let updated = db
            .update_json::<Row, _>(WALLETS, "w1", |row| {
                row.n = 2;
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.n, 2);

        assert!(matches!(
            db.update_json::<Row, _>(WALLETS, "missing", |_| Ok(())),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn current_issuer_is_latest_inserted() {
        let (_temp, db) = setup();
        assert_eq!(db.current_issuer_id().unwrap(), None);
        db.insert_current_issuer("first", &Row { n: 1 }).unwrap();
        db.insert_current_issuer("second", &Row { n: 2 }).unwrap();
        assert_eq!(db.current_issuer_id().unwrap().as_deref(), Some("second"));
        assert_eq!(db.count(ISSUERS).unwrap(), 2);
    }

    #[test]
    fn record_signed_once_is_idempotent() {
        let (_temp, db) = setup();
        let entry = TxLogEntry::new("ABC123", Some("payload-1"), Some("rAccount"));

        let first = Event::new(EventType::XummSigned).with_tx_hash("ABC123");
        let second = Event::new(EventType::XummSigned).with_tx_hash("ABC123");

        assert!(db.record_signed_once(&entry, &first).unwrap());
        assert!(!db.record_signed_once(&entry, &second).unwrap());

        let mut events = Vec::new();
        db.scan_events(|e| {
            events.push(e);
            true
        })
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, first.id);
        assert_eq!(db.tx_log_len().unwrap(), 1);
        assert!(db.tx_log_entry("ABC123").unwrap().is_some());
    }
}
