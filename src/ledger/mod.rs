// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # XRP Ledger Integration
//!
//! Everything that talks to, or produces bytes for, the XRP Ledger.
//!
//! ## Layers
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`currency`] | human currency codes ↔ 160-bit wire codes |
//! | [`keys`] | family seeds, keypairs, classic addresses |
//! | [`amount`] | drops and issued-currency amounts |
//! | [`codec`] | canonical binary serialization and hashing |
//! | [`transaction`] | transaction intents and their JSON form |
//! | [`network`] | network identifiers, endpoints, production gate |
//! | [`session`] | one scoped ledger session per unit of work |
//! | [`submit`] | autofill, local signing, submit, result normalization |
//! | [`queries`] | account, trust line and order book reads |
//! | [`faucet`] | test-network funding |
//!
//! Signing is always local. Secrets are parsed into a [`keys::Keypair`] for
//! the duration of one call and never stored.

pub mod amount;
pub mod codec;
pub mod currency;
pub mod error;
pub mod faucet;
pub mod keys;
pub mod network;
pub mod queries;
pub mod session;
pub mod submit;
pub mod transaction;

use std::sync::Arc;

use serde_json::Value;

pub use error::LedgerError;
pub use network::{assert_not_production, GatedOperation, Network, NetworkEndpoints};
pub use submit::TxOutcome;

use faucet::Faucet;
use keys::Keypair;
use queries::{AccountState, BookOffer, BookSide, TrustLine};
use session::{LedgerConnector, SessionManager};
use transaction::Transaction;

/// The active network plus the means to reach it.
#[derive(Clone)]
pub struct Ledger {
    network: Network,
    sessions: SessionManager,
    faucet: Arc<dyn Faucet>,
}

impl Ledger {
    pub fn new(
        network: Network,
        connector: Arc<dyn LedgerConnector>,
        faucet: Arc<dyn Faucet>,
    ) -> Self {
        Self {
            network,
            sessions: SessionManager::new(connector),
            faucet,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Autofill, sign and submit `tx` in a session of its own.
    pub async fn submit(&self, tx: Transaction, keypair: Keypair) -> Result<TxOutcome, LedgerError> {
        self.sessions
            .with_session(self.network, move |session| {
                Box::pin(async move { submit::sign_and_submit(session, tx, &keypair).await })
            })
            .await
    }

    /// Fund `address` from the test-network faucet. Gated on production.
    pub async fn fund(&self, address: &str) -> Result<Value, LedgerError> {
        assert_not_production(self.network, GatedOperation::Faucet)?;
        keys::decode_address(address)?;
        self.faucet.fund(self.network, address).await
    }

    pub async fn account_state(&self, address: String) -> Result<AccountState, LedgerError> {
        self.sessions
            .with_session(self.network, move |session| {
                Box::pin(async move { queries::account_state(session, &address).await })
            })
            .await
    }

    pub async fn trust_lines(
        &self,
        address: String,
        peer: Option<String>,
    ) -> Result<Vec<TrustLine>, LedgerError> {
        self.sessions
            .with_session(self.network, move |session| {
                Box::pin(async move {
                    queries::trust_lines(session, &address, peer.as_deref()).await
                })
            })
            .await
    }

    pub async fn book_offers(
        &self,
        base: BookSide,
        quote: BookSide,
        limit: u32,
    ) -> Result<Vec<BookOffer>, LedgerError> {
        self.sessions
            .with_session(self.network, move |session| {
                Box::pin(async move { queries::book_offers(session, &base, &quote, limit).await })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::amount::Amount;
    use crate::ledger::transaction::TxIntent;
    use crate::testing::MockLedger;

    const GENESIS_SEED: &str = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb";
    const GENESIS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const OTHER: &str = "rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1";

    #[tokio::test]
    async fn submit_uses_one_session_and_closes_it() {
        let mock = MockLedger::new();
        mock.seed_account(GENESIS, 100_000_000);
        let ledger = mock.ledger(Network::Devnet);

        let intent = TxIntent::payment(OTHER, Amount::Drops(1_000), vec![]).unwrap();
        let keypair = Keypair::from_secret(GENESIS_SEED).unwrap();
        let outcome = ledger.submit(Transaction::new(GENESIS, intent), keypair).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(mock.connects(), 1);
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn fund_is_gated_on_mainnet() {
        let mock = MockLedger::new();
        let ledger = mock.ledger(Network::Mainnet);

        let err = ledger.fund(OTHER).await.unwrap_err();
        assert!(matches!(err, LedgerError::OperationDisabled { .. }));
        assert_eq!(mock.fund_calls(), 0);
        assert_eq!(mock.connects(), 0);
    }

    #[tokio::test]
    async fn fund_credits_the_account_on_devnet() {
        let mock = MockLedger::new();
        let ledger = mock.ledger(Network::Devnet);

        ledger.fund(OTHER).await.unwrap();
        let state = ledger.account_state(OTHER.to_string()).await.unwrap();
        assert!(state.balance_drops > 0);
        assert_eq!(mock.fund_calls(), 1);
    }
}
