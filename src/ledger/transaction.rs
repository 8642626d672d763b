// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction intents and their JSON / binary forms.

use serde_json::{json, Map, Value};

use super::amount::Amount;
use super::codec::{self, Field, FieldValue};
use super::keys::{decode_address, Keypair};
use super::LedgerError;

/// `asfRequireAuth`
pub const ASF_REQUIRE_AUTH: u32 = 2;
/// `asfDefaultRipple`
pub const ASF_DEFAULT_RIPPLE: u32 = 8;

/// Default trust limit for direct trustlines.
pub const DEFAULT_TRUST_LIMIT: &str = "1000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Payment,
    AccountSet,
    SetRegularKey,
    OfferCreate,
    OfferCancel,
    TrustSet,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::AccountSet => "AccountSet",
            Self::SetRegularKey => "SetRegularKey",
            Self::OfferCreate => "OfferCreate",
            Self::OfferCancel => "OfferCancel",
            Self::TrustSet => "TrustSet",
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Payment => 0,
            Self::AccountSet => 3,
            Self::SetRegularKey => 5,
            Self::OfferCreate => 7,
            Self::OfferCancel => 8,
            Self::TrustSet => 20,
        }
    }
}

/// A validated request to change ledger state, independent of who signs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxIntent {
    Payment {
        destination: String,
        amount: Amount,
        memos: Vec<String>,
    },
    TrustSet {
        /// Must be an issued amount.
        limit: Amount,
    },
    OfferCreate {
        taker_gets: Amount,
        taker_pays: Amount,
        flags: Option<u32>,
    },
    OfferCancel {
        offer_sequence: u32,
    },
    SetRegularKey {
        /// `None` removes the regular key.
        regular_key: Option<String>,
    },
    AccountSet {
        set_flag: Option<u32>,
    },
}

impl TxIntent {
    pub fn payment(destination: &str, amount: Amount, memos: Vec<String>) -> Result<Self, LedgerError> {
        decode_address(destination)?;
        Ok(Self::Payment {
            destination: destination.to_string(),
            amount,
            memos,
        })
    }

    pub fn trust_set(limit: Amount) -> Result<Self, LedgerError> {
        if !matches!(limit, Amount::Issued(_)) {
            return Err(LedgerError::Validation(
                "TrustSet limit must be an issued-currency amount".to_string(),
            ));
        }
        Ok(Self::TrustSet { limit })
    }

    pub fn offer_cancel(offer_sequence: u32) -> Result<Self, LedgerError> {
        if offer_sequence == 0 {
            return Err(LedgerError::Validation(
                "offerSequence must be at least 1".to_string(),
            ));
        }
        Ok(Self::OfferCancel { offer_sequence })
    }

    pub fn set_regular_key(regular_key: Option<&str>) -> Result<Self, LedgerError> {
        if let Some(key) = regular_key {
            decode_address(key)?;
        }
        Ok(Self::SetRegularKey {
            regular_key: regular_key.map(str::to_string),
        })
    }

    pub fn offer_create(
        taker_gets: Amount,
        taker_pays: Amount,
        flags: Option<u32>,
    ) -> Result<Self, LedgerError> {
        if matches!((&taker_gets, &taker_pays), (Amount::Drops(_), Amount::Drops(_))) {
            return Err(LedgerError::Validation(
                "an offer cannot trade XRP for XRP".to_string(),
            ));
        }
        Ok(Self::OfferCreate {
            taker_gets,
            taker_pays,
            flags,
        })
    }

    pub fn account_set(set_flag: u32) -> Self {
        Self::AccountSet {
            set_flag: Some(set_flag),
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Payment { .. } => TransactionType::Payment,
            Self::TrustSet { .. } => TransactionType::TrustSet,
            Self::OfferCreate { .. } => TransactionType::OfferCreate,
            Self::OfferCancel { .. } => TransactionType::OfferCancel,
            Self::SetRegularKey { .. } => TransactionType::SetRegularKey,
            Self::AccountSet { .. } => TransactionType::AccountSet,
        }
    }

    /// Transaction JSON for this intent. `Account` is omitted when `account`
    /// is `None`, which lets an external wallet fill in its own address.
    pub fn to_json(&self, account: Option<&str>) -> Result<Value, LedgerError> {
        let mut tx = Map::new();
        tx.insert(
            "TransactionType".into(),
            Value::String(self.transaction_type().as_str().into()),
        );
        if let Some(account) = account {
            tx.insert("Account".into(), Value::String(account.into()));
        }

        match self {
            Self::Payment {
                destination,
                amount,
                memos,
            } => {
                tx.insert("Destination".into(), Value::String(destination.clone()));
                tx.insert("Amount".into(), amount.to_json()?);
                if !memos.is_empty() {
                    let entries: Vec<Value> = memos
                        .iter()
                        .map(|m| json!({ "Memo": { "MemoData": hex::encode_upper(m.as_bytes()) } }))
                        .collect();
                    tx.insert("Memos".into(), Value::Array(entries));
                }
            }
            Self::TrustSet { limit } => {
                tx.insert("LimitAmount".into(), limit.to_json()?);
            }
            Self::OfferCreate {
                taker_gets,
                taker_pays,
                flags,
            } => {
                tx.insert("TakerGets".into(), taker_gets.to_json()?);
                tx.insert("TakerPays".into(), taker_pays.to_json()?);
                if let Some(flags) = flags {
                    tx.insert("Flags".into(), json!(flags));
                }
            }
            Self::OfferCancel { offer_sequence } => {
                tx.insert("OfferSequence".into(), json!(offer_sequence));
            }
            Self::SetRegularKey { regular_key } => {
                if let Some(key) = regular_key {
                    tx.insert("RegularKey".into(), Value::String(key.clone()));
                }
            }
            Self::AccountSet { set_flag } => {
                if let Some(flag) = set_flag {
                    tx.insert("SetFlag".into(), json!(flag));
                }
            }
        }
        Ok(Value::Object(tx))
    }

    fn fields(&self) -> Result<Vec<(Field, FieldValue)>, LedgerError> {
        let mut fields = vec![(
            codec::TRANSACTION_TYPE,
            FieldValue::UInt16(self.transaction_type().code()),
        )];
        match self {
            Self::Payment {
                destination,
                amount,
                memos,
            } => {
                fields.push((
                    codec::DESTINATION,
                    FieldValue::AccountId(decode_address(destination)?),
                ));
                fields.push((codec::AMOUNT, FieldValue::Amount(amount.to_bytes()?)));
                if !memos.is_empty() {
                    let data = memos.iter().map(|m| m.as_bytes().to_vec()).collect();
                    fields.push((codec::MEMOS, FieldValue::Memos(data)));
                }
            }
            Self::TrustSet { limit } => {
                fields.push((codec::LIMIT_AMOUNT, FieldValue::Amount(limit.to_bytes()?)));
            }
            Self::OfferCreate {
                taker_gets,
                taker_pays,
                flags,
            } => {
                fields.push((codec::TAKER_GETS, FieldValue::Amount(taker_gets.to_bytes()?)));
                fields.push((codec::TAKER_PAYS, FieldValue::Amount(taker_pays.to_bytes()?)));
                if let Some(flags) = flags {
                    fields.push((codec::FLAGS, FieldValue::UInt32(*flags)));
                }
            }
            Self::OfferCancel { offer_sequence } => {
                fields.push((codec::OFFER_SEQUENCE, FieldValue::UInt32(*offer_sequence)));
            }
            Self::SetRegularKey { regular_key } => {
                if let Some(key) = regular_key {
                    fields.push((codec::REGULAR_KEY, FieldValue::AccountId(decode_address(key)?)));
                }
            }
            Self::AccountSet { set_flag } => {
                if let Some(flag) = set_flag {
                    fields.push((codec::SET_FLAG, FieldValue::UInt32(*flag)));
                }
            }
        }
        Ok(fields)
    }
}

/// An intent bound to the account it acts on, plus the autofilled fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub account: String,
    pub intent: TxIntent,
    pub sequence: Option<u32>,
    pub fee_drops: Option<u64>,
    pub last_ledger_sequence: Option<u32>,
}

/// A signed, ready-to-submit transaction.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// Uppercase hex of the serialized signed transaction.
    pub tx_blob: String,
    /// Locally computed transaction id.
    pub hash: String,
    pub tx_json: Value,
}

impl Transaction {
    pub fn new(account: impl Into<String>, intent: TxIntent) -> Self {
        Self {
            account: account.into(),
            intent,
            sequence: None,
            fee_drops: None,
            last_ledger_sequence: None,
        }
    }

    pub fn is_autofilled(&self) -> bool {
        self.sequence.is_some() && self.fee_drops.is_some()
    }

    pub fn to_json(&self) -> Result<Value, LedgerError> {
        let mut tx = self.intent.to_json(Some(&self.account))?;
        if let Value::Object(map) = &mut tx {
            if let Some(seq) = self.sequence {
                map.insert("Sequence".into(), json!(seq));
            }
            if let Some(fee) = self.fee_drops {
                map.insert("Fee".into(), Value::String(fee.to_string()));
            }
            if let Some(lls) = self.last_ledger_sequence {
                map.insert("LastLedgerSequence".into(), json!(lls));
            }
        }
        Ok(tx)
    }

    /// Sign locally. The signing key may belong to `account` itself or to its
    /// regular key.
    pub fn sign(&self, keypair: &Keypair) -> Result<SignedTransaction, LedgerError> {
        let (Some(sequence), Some(fee)) = (self.sequence, self.fee_drops) else {
            return Err(LedgerError::Validation(
                "transaction must be autofilled before signing".to_string(),
            ));
        };

        let public_key = keypair.public_key();
        let mut fields = self.intent.fields()?;
        fields.push((codec::ACCOUNT, FieldValue::AccountId(decode_address(&self.account)?)));
        fields.push((codec::SEQUENCE, FieldValue::UInt32(sequence)));
        fields.push((codec::FEE, FieldValue::Amount(Amount::Drops(fee).to_bytes()?)));
        if let Some(lls) = self.last_ledger_sequence {
            fields.push((codec::LAST_LEDGER_SEQUENCE, FieldValue::UInt32(lls)));
        }
        fields.push((codec::SIGNING_PUB_KEY, FieldValue::Blob(public_key.clone())));

        let signature = keypair.sign(&codec::signing_data(&fields)?)?;
        fields.push((codec::TXN_SIGNATURE, FieldValue::Blob(signature.clone())));

        let blob = codec::serialize(&fields)?;
        let hash = codec::transaction_id(&blob);

        let mut tx_json = self.to_json()?;
        if let Value::Object(map) = &mut tx_json {
            map.insert("SigningPubKey".into(), Value::String(hex::encode_upper(&public_key)));
            map.insert("TxnSignature".into(), Value::String(hex::encode_upper(&signature)));
            map.insert("hash".into(), Value::String(hash.clone()));
        }

        Ok(SignedTransaction {
            tx_blob: hex::encode_upper(&blob),
            hash,
            tx_json,
        })
    }
}
