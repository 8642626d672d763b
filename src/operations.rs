// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Direct, seed-based ledger operations for development networks.
//!
//! Every operation here takes a raw secret, so every operation passes the
//! production gate before it parses input, derives keys or opens a session.
//! On mainnet the only way to move funds is the wallet-app signing flow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::ledger::amount::{xrp_to_drops, Amount};
use crate::ledger::keys::Keypair;
use crate::ledger::transaction::{Transaction, TxIntent, DEFAULT_TRUST_LIMIT};
use crate::ledger::{assert_not_production, GatedOperation, Ledger, LedgerError, TxOutcome};
use crate::storage::{record_best_effort, Event, EventType, IssuerDatabase};

/// One side of an offer as clients send it: an XRP decimal amount, or an
/// issued amount.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum OfferAmount {
    /// XRP as a decimal string, e.g. `"12.5"`.
    Xrp(String),
    Issued {
        currency: String,
        issuer: String,
        value: String,
    },
}

impl OfferAmount {
    pub fn to_amount(&self) -> Result<Amount, LedgerError> {
        match self {
            Self::Xrp(value) => Ok(Amount::Drops(xrp_to_drops(value)?)),
            Self::Issued {
                currency,
                issuer,
                value,
            } => Amount::issued(currency, issuer, value),
        }
    }
}

/// Seed-based operations, each recorded in the event log.
pub struct DirectOperations<'a> {
    ledger: &'a Ledger,
    db: &'a IssuerDatabase,
}

impl<'a> DirectOperations<'a> {
    pub fn new(ledger: &'a Ledger, db: &'a IssuerDatabase) -> Self {
        Self { ledger, db }
    }

    fn gate(&self, operation: GatedOperation) -> Result<(), LedgerError> {
        assert_not_production(self.ledger.network(), operation)
    }

    /// Send XRP.
    pub async fn payment(
        &self,
        secret: &str,
        destination: &str,
        drops: &str,
        memos: Vec<String>,
    ) -> Result<TxOutcome, LedgerError> {
        self.gate(GatedOperation::Payment)?;
        let amount = Amount::drops(drops)?;
        let intent = TxIntent::payment(destination, amount, memos.clone())?;
        let keypair = Keypair::from_secret(secret)?;
        let account = keypair.address();

        let outcome = self
            .ledger
            .submit(Transaction::new(&account, intent), keypair)
            .await?;

        record_best_effort(
            self.db,
            &Event::new(EventType::Payment)
                .with_route("/xrpl/payment")
                .with_account(&account)
                .with_destination(destination)
                .with_currency("XRP")
                .with_value(drops)
                .with_memos(&memos)
                .with_outcome(&outcome),
        );
        Ok(outcome)
    }

    /// Open or update a trust line to `issuer` for `currency`.
    pub async fn trustline(
        &self,
        secret: &str,
        currency: &str,
        issuer: &str,
        limit: Option<&str>,
    ) -> Result<TxOutcome, LedgerError> {
        self.gate(GatedOperation::Trustline)?;
        let limit = limit.unwrap_or(DEFAULT_TRUST_LIMIT);
        let intent = TxIntent::trust_set(Amount::issued(currency, issuer, limit)?)?;
        let keypair = Keypair::from_secret(secret)?;
        let account = keypair.address();

        let outcome = self
            .ledger
            .submit(Transaction::new(&account, intent), keypair)
            .await?;

        let mut event = Event::new(EventType::Trustline)
            .with_route("/xrpl/trustline")
            .with_account(&account)
            .with_currency(currency)
            .with_value(limit)
            .with_outcome(&outcome);
        event.issuer_cold = Some(issuer.to_string());
        record_best_effort(self.db, &event);
        Ok(outcome)
    }

    /// Place a DEX offer.
    pub async fn offer_create(
        &self,
        secret: &str,
        taker_gets: &OfferAmount,
        taker_pays: &OfferAmount,
        flags: Option<u32>,
    ) -> Result<TxOutcome, LedgerError> {
        self.gate(GatedOperation::OfferCreate)?;
        let intent = TxIntent::offer_create(taker_gets.to_amount()?, taker_pays.to_amount()?, flags)?;
        let keypair = Keypair::from_secret(secret)?;
        let account = keypair.address();

        let outcome = self
            .ledger
            .submit(Transaction::new(&account, intent), keypair)
            .await?;

        record_best_effort(
            self.db,
            &Event::new(EventType::OfferCreate)
                .with_route("/dex/offers")
                .with_account(&account)
                .with_outcome(&outcome),
        );
        Ok(outcome)
    }

    /// Cancel one of the signer's offers.
    pub async fn offer_cancel(
        &self,
        secret: &str,
        offer_sequence: u32,
    ) -> Result<TxOutcome, LedgerError> {
        self.gate(GatedOperation::OfferCancel)?;
        let intent = TxIntent::offer_cancel(offer_sequence)?;
        let keypair = Keypair::from_secret(secret)?;
        let account = keypair.address();

        let outcome = self
            .ledger
            .submit(Transaction::new(&account, intent), keypair)
            .await?;

        record_best_effort(
            self.db,
            &Event::new(EventType::OfferCancel)
                .with_route("/dex/offers/cancel")
                .with_account(&account)
                .with_value(offer_sequence.to_string())
                .with_outcome(&outcome),
        );
        Ok(outcome)
    }

    /// Fund `address` from the faucet.
    pub async fn fund(&self, address: &str) -> Result<Value, LedgerError> {
        self.gate(GatedOperation::Faucet)?;
        let response = self.ledger.fund(address).await?;
        record_best_effort(
            self.db,
            &Event::new(EventType::Faucet)
                .with_route("/faucet")
                .with_destination(address)
                .with_raw(response.clone()),
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::keys::derive_address;
    use crate::ledger::Network;
    use crate::storage::{EventLog, EventQuery};
    use crate::testing::{temp_db, MockLedger};
    use serde_json::json;

    const SEED: &str = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb";
    const ISSUER: &str = "rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1";

    fn all_events(db: &IssuerDatabase) -> Vec<Event> {
        EventLog::new(db).query(&EventQuery::default()).unwrap()
    }

    #[tokio::test]
    async fn every_operation_is_disabled_on_mainnet_without_network_calls() {
        let mock = MockLedger::new();
        let (_dir, db) = temp_db();
        let ledger = mock.ledger(Network::Mainnet);
        let ops = DirectOperations::new(&ledger, &db);
        let xrp = OfferAmount::Xrp("1".into());
        let usd = OfferAmount::Issued {
            currency: "USD".into(),
            issuer: ISSUER.into(),
            value: "1".into(),
        };

        let results = vec![
            ops.payment(SEED, ISSUER, "10", vec![]).await.map(|_| ()),
            ops.trustline(SEED, "USD", ISSUER, None).await.map(|_| ()),
            ops.offer_create(SEED, &xrp, &usd, None).await.map(|_| ()),
            ops.offer_cancel(SEED, 3).await.map(|_| ()),
            ops.fund(ISSUER).await.map(|_| ()),
        ];
        for result in results {
            assert!(matches!(result, Err(LedgerError::OperationDisabled { .. })));
        }

        // Malformed input on mainnet still reports the gate first.
        let err = ops.payment("not-a-seed", "nope", "x", vec![]).await.unwrap_err();
        assert!(matches!(err, LedgerError::OperationDisabled { .. }));

        assert_eq!(mock.network_calls(), 0);
        assert!(all_events(&db).is_empty());
    }

    #[tokio::test]
    async fn payment_submits_and_records_memos() {
        let mock = MockLedger::new();
        let account = derive_address(SEED).unwrap();
        mock.seed_account(&account, 100_000_000);
        let (_dir, db) = temp_db();
        let ledger = mock.ledger(Network::Devnet);
        let ops = DirectOperations::new(&ledger, &db);

        let outcome = ops
            .payment(SEED, ISSUER, "1500000", vec!["invoice 7".into()])
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(mock.request_count("submit"), 1);

        let events = all_events(&db);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Payment);
        assert_eq!(events[0].account.as_deref(), Some(account.as_str()));
        assert_eq!(events[0].value.as_deref(), Some("1500000"));
        assert_eq!(events[0].memos, vec!["invoice 7"]);
    }

    #[tokio::test]
    async fn payment_rejects_fractional_drops_before_network() {
        let mock = MockLedger::new();
        let (_dir, db) = temp_db();
        let ledger = mock.ledger(Network::Devnet);
        let ops = DirectOperations::new(&ledger, &db);

        let err = ops.payment(SEED, ISSUER, "1.5", vec![]).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
        assert_eq!(mock.network_calls(), 0);
    }

    #[tokio::test]
    async fn trustline_uses_default_limit() {
        let mock = MockLedger::new();
        mock.seed_account(&derive_address(SEED).unwrap(), 100_000_000);
        let (_dir, db) = temp_db();
        let ledger = mock.ledger(Network::Testnet);
        let ops = DirectOperations::new(&ledger, &db);

        ops.trustline(SEED, "Unykorn", ISSUER, None).await.unwrap();
        let events = all_events(&db);
        assert_eq!(events[0].event_type, EventType::Trustline);
        assert_eq!(events[0].value.as_deref(), Some(DEFAULT_TRUST_LIMIT));
        assert_eq!(events[0].issuer_cold.as_deref(), Some(ISSUER));
        assert_eq!(events[0].currency.as_deref(), Some("Unykorn"));
    }

    #[tokio::test]
    async fn offers_create_and_cancel() {
        let mock = MockLedger::new();
        mock.seed_account(&derive_address(SEED).unwrap(), 100_000_000);
        let (_dir, db) = temp_db();
        let ledger = mock.ledger(Network::Devnet);
        let ops = DirectOperations::new(&ledger, &db);

        let gets: OfferAmount = serde_json::from_value(json!("2.5")).unwrap();
        let pays: OfferAmount =
            serde_json::from_value(json!({ "currency": "USD", "issuer": ISSUER, "value": "5" }))
                .unwrap();
        assert_eq!(gets.to_amount().unwrap(), Amount::Drops(2_500_000));

        ops.offer_create(SEED, &gets, &pays, None).await.unwrap();
        ops.offer_cancel(SEED, 9).await.unwrap();

        let err = ops.offer_cancel(SEED, 0).await.unwrap_err();
        assert!(err.is_validation());

        let xrp_for_xrp = ops.offer_create(SEED, &gets, &gets, None).await.unwrap_err();
        assert!(xrp_for_xrp.is_validation());

        let types: Vec<_> = all_events(&db).iter().map(|e| e.event_type).collect();
        assert_eq!(types.len(), 2);
        assert!(types.contains(&EventType::OfferCreate));
        assert!(types.contains(&EventType::OfferCancel));
        assert_eq!(mock.request_count("submit"), 2);
    }

    #[tokio::test]
    async fn fund_records_faucet_event() {
        let mock = MockLedger::new();
        let (_dir, db) = temp_db();
        let ledger = mock.ledger(Network::Devnet);
        let ops = DirectOperations::new(&ledger, &db);

        ops.fund(ISSUER).await.unwrap();
        assert_eq!(mock.fund_calls(), 1);
        let events = all_events(&db);
        assert_eq!(events[0].event_type, EventType::Faucet);
        assert_eq!(events[0].destination.as_deref(), Some(ISSUER));
    }
}
