// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::custody::IssuerCustody;
use crate::ledger::Ledger;
use crate::operations::DirectOperations;
use crate::signing::{SigningGateway, SigningProvider};
use crate::storage::IssuerDatabase;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Ledger,
    pub db: Arc<IssuerDatabase>,
    pub signing: Arc<dyn SigningProvider>,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        ledger: Ledger,
        db: Arc<IssuerDatabase>,
        signing: Arc<dyn SigningProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            ledger,
            db,
            signing,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn custody(&self) -> IssuerCustody<'_> {
        IssuerCustody::new(&self.ledger, &self.db, self.config.issuer_policy)
    }

    pub fn operations(&self) -> DirectOperations<'_> {
        DirectOperations::new(&self.ledger, &self.db)
    }

    pub fn gateway(&self) -> SigningGateway<'_> {
        SigningGateway::new(self.signing.as_ref(), &self.db)
    }
}
