// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical binary serialization of transactions.
//!
//! Only the field types this service writes are supported. Fields are emitted
//! in canonical order: by type code, then by field code.

use sha2::{Digest, Sha512};

use super::LedgerError;

/// `STX\0`, prepended to the serialized fields when signing.
pub const SIGNING_PREFIX: [u8; 4] = [0x53, 0x54, 0x58, 0x00];
/// `TXN\0`, prepended to the signed blob to compute the transaction id.
pub const TRANSACTION_ID_PREFIX: [u8; 4] = [0x54, 0x58, 0x4E, 0x00];

// =============================================================================
// Field Definitions
// =============================================================================

const TYPE_UINT16: u8 = 1;
const TYPE_UINT32: u8 = 2;
const TYPE_AMOUNT: u8 = 6;
const TYPE_BLOB: u8 = 7;
const TYPE_ACCOUNT_ID: u8 = 8;
const TYPE_OBJECT: u8 = 14;
const TYPE_ARRAY: u8 = 15;

/// A serialized field identity. Ordering is canonical ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Field {
    type_code: u8,
    nth: u8,
    name: &'static str,
}

impl Field {
    const fn new(type_code: u8, nth: u8, name: &'static str) -> Self {
        Self {
            type_code,
            nth,
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field id header bytes.
    pub fn header(&self) -> Vec<u8> {
        let (t, n) = (self.type_code, self.nth);
        match (t < 16, n < 16) {
            (true, true) => vec![(t << 4) | n],
            (true, false) => vec![t << 4, n],
            (false, true) => vec![n, t],
            (false, false) => vec![0, t, n],
        }
    }
}

pub const TRANSACTION_TYPE: Field = Field::new(TYPE_UINT16, 2, "TransactionType");
pub const FLAGS: Field = Field::new(TYPE_UINT32, 2, "Flags");
pub const SEQUENCE: Field = Field::new(TYPE_UINT32, 4, "Sequence");
pub const OFFER_SEQUENCE: Field = Field::new(TYPE_UINT32, 25, "OfferSequence");
pub const LAST_LEDGER_SEQUENCE: Field = Field::new(TYPE_UINT32, 27, "LastLedgerSequence");
pub const SET_FLAG: Field = Field::new(TYPE_UINT32, 33, "SetFlag");
pub const AMOUNT: Field = Field::new(TYPE_AMOUNT, 1, "Amount");
pub const LIMIT_AMOUNT: Field = Field::new(TYPE_AMOUNT, 3, "LimitAmount");
pub const TAKER_PAYS: Field = Field::new(TYPE_AMOUNT, 4, "TakerPays");
pub const TAKER_GETS: Field = Field::new(TYPE_AMOUNT, 5, "TakerGets");
pub const FEE: Field = Field::new(TYPE_AMOUNT, 8, "Fee");
pub const SIGNING_PUB_KEY: Field = Field::new(TYPE_BLOB, 3, "SigningPubKey");
pub const TXN_SIGNATURE: Field = Field::new(TYPE_BLOB, 4, "TxnSignature");
pub const MEMO_DATA: Field = Field::new(TYPE_BLOB, 13, "MemoData");
pub const ACCOUNT: Field = Field::new(TYPE_ACCOUNT_ID, 1, "Account");
pub const DESTINATION: Field = Field::new(TYPE_ACCOUNT_ID, 3, "Destination");
pub const REGULAR_KEY: Field = Field::new(TYPE_ACCOUNT_ID, 8, "RegularKey");
pub const MEMO: Field = Field::new(TYPE_OBJECT, 10, "Memo");
pub const MEMOS: Field = Field::new(TYPE_ARRAY, 9, "Memos");
const OBJECT_END: Field = Field::new(TYPE_OBJECT, 1, "ObjectEndMarker");
const ARRAY_END: Field = Field::new(TYPE_ARRAY, 1, "ArrayEndMarker");

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    UInt16(u16),
    UInt32(u32),
    /// Already-encoded amount bytes.
    Amount(Vec<u8>),
    Blob(Vec<u8>),
    AccountId([u8; 20]),
    /// Each entry is the `MemoData` of one `Memo`.
    Memos(Vec<Vec<u8>>),
}

// =============================================================================
// Serialization
// =============================================================================

/// Serialize fields in canonical order.
pub fn serialize(fields: &[(Field, FieldValue)]) -> Result<Vec<u8>, LedgerError> {
    let mut sorted: Vec<&(Field, FieldValue)> = fields.iter().collect();
    sorted.sort_by_key(|(field, _)| *field);

    let mut out = Vec::with_capacity(256);
    for (field, value) in sorted {
        out.extend_from_slice(&field.header());
        write_value(&mut out, value)?;
    }
    Ok(out)
}

fn write_value(out: &mut Vec<u8>, value: &FieldValue) -> Result<(), LedgerError> {
    match value {
        FieldValue::UInt16(v) => out.extend_from_slice(&v.to_be_bytes()),
        FieldValue::UInt32(v) => out.extend_from_slice(&v.to_be_bytes()),
        FieldValue::Amount(bytes) => out.extend_from_slice(bytes),
        FieldValue::Blob(bytes) => {
            out.extend_from_slice(&encode_length(bytes.len())?);
            out.extend_from_slice(bytes);
        }
        FieldValue::AccountId(id) => {
            out.extend_from_slice(&encode_length(id.len())?);
            out.extend_from_slice(id);
        }
        FieldValue::Memos(memos) => {
            for data in memos {
                out.extend_from_slice(&MEMO.header());
                out.extend_from_slice(&MEMO_DATA.header());
                out.extend_from_slice(&encode_length(data.len())?);
                out.extend_from_slice(data);
                out.extend_from_slice(&OBJECT_END.header());
            }
            out.extend_from_slice(&ARRAY_END.header());
        }
    }
    Ok(())
}

/// Variable-length prefix for blobs and account ids.
pub fn encode_length(len: usize) -> Result<Vec<u8>, LedgerError> {
    if len <= 192 {
        Ok(vec![len as u8])
    } else if len <= 12_480 {
        let l = len - 193;
        Ok(vec![193 + (l >> 8) as u8, (l & 0xFF) as u8])
    } else if len <= 918_744 {
        let l = len - 12_481;
        Ok(vec![
            241 + (l >> 16) as u8,
            ((l >> 8) & 0xFF) as u8,
            (l & 0xFF) as u8,
        ])
    } else {
        Err(LedgerError::Validation(format!(
            "field of {len} bytes exceeds the maximum encodable length"
        )))
    }
}

// =============================================================================
// Hashing
// =============================================================================

/// First 32 bytes of SHA-512.
pub fn sha512_half(data: &[u8]) -> [u8; 32] {
    let digest = Sha512::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// Bytes a signer signs: `STX\0 || fields-without-signature`.
pub fn signing_data(fields: &[(Field, FieldValue)]) -> Result<Vec<u8>, LedgerError> {
    let unsigned: Vec<(Field, FieldValue)> = fields
        .iter()
        .filter(|(field, _)| *field != TXN_SIGNATURE)
        .cloned()
        .collect();
    let mut data = SIGNING_PREFIX.to_vec();
    data.extend_from_slice(&serialize(&unsigned)?);
    Ok(data)
}

/// Transaction id (uppercase hex) of a signed blob.
pub fn transaction_id(signed_blob: &[u8]) -> String {
    let mut data = TRANSACTION_ID_PREFIX.to_vec();
    data.extend_from_slice(signed_blob);
    hex::encode_upper(sha512_half(&data))
}
