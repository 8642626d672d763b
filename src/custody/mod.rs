// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Issuer Custody
//!
//! An issuer is a pair of accounts:
//!
//! - **cold**: treasury. Holds the trust lines and is the `issuer` of every
//!   token amount. Signs only during setup.
//! - **hot**: operational signer. Receives regular-key authority over the
//!   cold account, then signs issuance on its behalf.
//!
//! [`IssuerCustody::issue`] checks that the supplied secret resolves to the
//! token's hot address before anything is sent. The ledger verifies the
//! signature independently; this check catches the wrong organization's key
//! or a holder key used by mistake.
//!
//! Secrets generated by [`IssuerCustody::initialize_issuer`] are returned
//! once in [`InitializedIssuer`] and never persisted.

mod error;

pub use error::CustodyError;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::ledger::amount::{validate_value, Amount};
use crate::ledger::keys::{decode_address, generate_wallet, KeyAlgorithm, Keypair};
use crate::ledger::queries::wait_for_account;
use crate::ledger::transaction::{
    Transaction, TxIntent, ASF_DEFAULT_RIPPLE, ASF_REQUIRE_AUTH,
};
use crate::ledger::{assert_not_production, GatedOperation, Ledger, LedgerError, TxOutcome};
use crate::storage::{
    record_best_effort, Event, EventType, IssuerDatabase, IssuerRepository, StoredIssuer,
    StoredToken, TokenRepository,
};

/// Attempts made while waiting for a funded account to appear.
const ACCOUNT_WAIT_ATTEMPTS: u32 = 10;
const ACCOUNT_WAIT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

// =============================================================================
// Types
// =============================================================================

/// How issuer initialization treats its optional steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerPolicy {
    /// Abort initialization when the regular-key grant fails.
    pub strict_delegation: bool,
    /// Enable rippling on the cold account.
    pub default_ripple: bool,
    /// Require authorization for trust lines to the cold account.
    pub require_auth: bool,
}

impl Default for IssuerPolicy {
    fn default() -> Self {
        Self {
            strict_delegation: false,
            default_ripple: true,
            require_auth: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

/// Outcome of one issuer setup step.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupStep {
    pub name: String,
    pub status: StepStatus,
    pub detail: Option<String>,
    pub tx_hash: Option<String>,
    pub engine_result: Option<String>,
}

impl SetupStep {
    fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Ok,
            detail: None,
            tx_hash: None,
            engine_result: None,
        }
    }

    fn skipped(name: &str, detail: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Skipped,
            detail: Some(detail.into()),
            ..Self::ok(name)
        }
    }

    fn failed(name: &str, detail: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            detail: Some(detail.into()),
            ..Self::ok(name)
        }
    }

    /// Step from a submitted transaction; anything but `tesSUCCESS` fails it.
    fn from_submit(name: &str, result: Result<TxOutcome, LedgerError>) -> Self {
        match result {
            Ok(outcome) => {
                let mut step = if outcome.is_success() {
                    Self::ok(name)
                } else {
                    Self::failed(
                        name,
                        format!(
                            "engine result {}",
                            outcome.engine_result.as_deref().unwrap_or("unknown")
                        ),
                    )
                };
                step.tx_hash = outcome.transaction_hash;
                step.engine_result = outcome.engine_result;
                step
            }
            Err(e) => Self::failed(name, e.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StepStatus::Ok
    }
}

/// Seeds of a freshly created issuer. Shown once, never stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerSecrets {
    pub cold_seed: String,
    pub hot_seed: String,
}

/// Result of [`IssuerCustody::initialize_issuer`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InitializedIssuer {
    pub issuer: StoredIssuer,
    pub secrets: IssuerSecrets,
    pub steps: Vec<SetupStep>,
}

/// Issue tokens from the cold account, signed by the hot key.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub token_id: String,
    pub destination: String,
    pub value: String,
    pub secret: String,
    pub memos: Vec<String>,
}

/// Send tokens back to the cold account, signed by the holder.
#[derive(Debug, Clone)]
pub struct RedeemRequest {
    pub token_id: String,
    pub secret: String,
    pub value: String,
    pub memos: Vec<String>,
}

// =============================================================================
// IssuerCustody
// =============================================================================

/// Issuer lifecycle operations over a ledger and the issuer database.
pub struct IssuerCustody<'a> {
    ledger: &'a Ledger,
    db: &'a IssuerDatabase,
    policy: IssuerPolicy,
}

impl<'a> IssuerCustody<'a> {
    pub fn new(ledger: &'a Ledger, db: &'a IssuerDatabase, policy: IssuerPolicy) -> Self {
        Self { ledger, db, policy }
    }

    /// Create a cold/hot account pair and make it the current issuer.
    ///
    /// Funding is mandatory off production and skipped on production. The
    /// regular-key grant and flag changes are best-effort unless
    /// [`IssuerPolicy::strict_delegation`] is set; every step's outcome is
    /// reported in [`InitializedIssuer::steps`].
    pub async fn initialize_issuer(
        &self,
        org_name: &str,
        domain: Option<&str>,
    ) -> Result<InitializedIssuer, CustodyError> {
        let org_name = org_name.trim();
        if org_name.chars().count() < 3 {
            return Err(LedgerError::Validation("org must be at least 3 characters".to_string()).into());
        }
        let domain = domain.map(str::trim).filter(|d| !d.is_empty());

        let cold = generate_wallet(KeyAlgorithm::default())?;
        let hot = generate_wallet(KeyAlgorithm::default())?;
        let network = self.ledger.network();
        let mut steps = Vec::new();

        if network.is_production() {
            steps.push(SetupStep::skipped("fund_cold", "No faucet on mainnet"));
            steps.push(SetupStep::skipped("fund_hot", "No faucet on mainnet"));
            steps.push(SetupStep::skipped(
                "set_regular_key",
                "Accounts are unfunded; grant the regular key through the signing flow",
            ));
        } else {
            for (name, address) in [("fund_cold", &cold.address), ("fund_hot", &hot.address)] {
                self.fund_and_wait(address)
                    .await
                    .map_err(|e| CustodyError::SetupFailed {
                        step: name.to_string(),
                        detail: e.to_string(),
                    })?;
                steps.push(SetupStep::ok(name));
            }

            let cold_key = Keypair::from_secret(&cold.seed)?;
            let grant = Transaction::new(&cold.address, TxIntent::set_regular_key(Some(&hot.address))?);
            let step = SetupStep::from_submit("set_regular_key", self.ledger.submit(grant, cold_key.clone()).await);
            if !step.is_ok() {
                if self.policy.strict_delegation {
                    return Err(CustodyError::SetupFailed {
                        step: step.name,
                        detail: step.detail.unwrap_or_default(),
                    });
                }
                warn!(
                    cold = %cold.address,
                    hot = %hot.address,
                    detail = step.detail.as_deref().unwrap_or("-"),
                    "Regular key grant failed; cold account must sign for itself until repaired"
                );
            }
            steps.push(step);

            for (name, enabled, flag) in [
                ("set_default_ripple", self.policy.default_ripple, ASF_DEFAULT_RIPPLE),
                ("set_require_auth", self.policy.require_auth, ASF_REQUIRE_AUTH),
            ] {
                if !enabled {
                    continue;
                }
                let tx = Transaction::new(&cold.address, TxIntent::account_set(flag));
                let step = SetupStep::from_submit(name, self.ledger.submit(tx, cold_key.clone()).await);
                if !step.is_ok() {
                    warn!(cold = %cold.address, step = name, detail = step.detail.as_deref().unwrap_or("-"), "Issuer flag not set");
                }
                steps.push(step);
            }
        }

        let delegation_confirmed = steps
            .iter()
            .any(|s| s.name == "set_regular_key" && s.is_ok());
        let issuer = StoredIssuer {
            id: uuid::Uuid::new_v4().to_string(),
            org_name: org_name.to_string(),
            domain: domain.map(str::to_string),
            cold_address: cold.address.clone(),
            hot_address: hot.address.clone(),
            delegates_to: hot.address.clone(),
            delegation_confirmed,
            network,
            created_at: Utc::now(),
        };
        IssuerRepository::new(self.db).create(&issuer)?;

        record_best_effort(
            self.db,
            &Event::new(EventType::IssuerInit)
                .with_route("/issuer/init")
                .with_account(&issuer.cold_address)
                .with_destination(&issuer.hot_address)
                .with_raw(serde_json::to_value(&steps).unwrap_or_default()),
        );
        info!(
            issuer_id = %issuer.id,
            cold = %issuer.cold_address,
            hot = %issuer.hot_address,
            %network,
            delegation_confirmed,
            "Issuer initialized"
        );

        Ok(InitializedIssuer {
            issuer,
            secrets: IssuerSecrets {
                cold_seed: cold.seed,
                hot_seed: hot.seed,
            },
            steps,
        })
    }

    async fn fund_and_wait(&self, address: &str) -> Result<(), LedgerError> {
        self.ledger.fund(address).await?;
        let address = address.to_string();
        self.ledger
            .sessions()
            .with_session(self.ledger.network(), move |session| {
                Box::pin(async move {
                    wait_for_account(session, &address, ACCOUNT_WAIT_ATTEMPTS, ACCOUNT_WAIT_INTERVAL).await
                })
            })
            .await
    }

    /// Issue `value` of a token to `destination`.
    pub async fn issue(&self, request: IssueRequest) -> Result<TxOutcome, CustodyError> {
        assert_not_production(self.ledger.network(), GatedOperation::Issue)?;
        validate_value(&request.value)?;
        decode_address(&request.destination)?;

        let (token, issuer) = self.token_with_issuer(&request.token_id)?;
        let keypair = Keypair::from_secret(&request.secret)?;
        let signer = keypair.address();
        if signer != issuer.delegates_to {
            return Err(CustodyError::SignerMismatch {
                currency: token.code,
                issuer: issuer.cold_address,
                expected: issuer.delegates_to,
                actual: signer,
            });
        }

        let amount = Amount::issued(&token.code, &issuer.cold_address, &request.value)?;
        let intent = TxIntent::payment(&request.destination, amount, request.memos.clone())?;
        let outcome = self
            .ledger
            .submit(Transaction::new(&issuer.cold_address, intent), keypair)
            .await?;

        record_best_effort(
            self.db,
            &Event::new(EventType::Issue)
                .with_route("/xrpl/issue")
                .with_account(&issuer.cold_address)
                .with_destination(&request.destination)
                .with_token(&token.id, &issuer.cold_address, &token.code)
                .with_value(&request.value)
                .with_memos(&request.memos)
                .with_outcome(&outcome),
        );
        Ok(outcome)
    }

    /// Return `value` of a token from the holder to the cold account.
    pub async fn redeem(&self, request: RedeemRequest) -> Result<TxOutcome, CustodyError> {
        assert_not_production(self.ledger.network(), GatedOperation::Redeem)?;
        validate_value(&request.value)?;

        let (token, issuer) = self.token_with_issuer(&request.token_id)?;
        let keypair = Keypair::from_secret(&request.secret)?;
        let holder = keypair.address();

        let amount = Amount::issued(&token.code, &issuer.cold_address, &request.value)?;
        let intent = TxIntent::payment(&issuer.cold_address, amount, request.memos.clone())?;
        let outcome = self
            .ledger
            .submit(Transaction::new(&holder, intent), keypair)
            .await?;

        record_best_effort(
            self.db,
            &Event::new(EventType::Redeem)
                .with_route("/xrpl/redeem")
                .with_account(&holder)
                .with_destination(&issuer.cold_address)
                .with_token(&token.id, &issuer.cold_address, &token.code)
                .with_value(&request.value)
                .with_memos(&request.memos)
                .with_outcome(&outcome),
        );
        Ok(outcome)
    }

    fn token_with_issuer(&self, token_id: &str) -> Result<(StoredToken, StoredIssuer), CustodyError> {
        token_with_issuer(self.db, token_id)
    }
}

/// Look up a token together with the issuer that owns it.
pub(crate) fn token_with_issuer(
    db: &IssuerDatabase,
    token_id: &str,
) -> Result<(StoredToken, StoredIssuer), CustodyError> {
    let token = TokenRepository::new(db)
        .get(token_id)?
        .ok_or_else(|| CustodyError::TokenNotFound(token_id.to_string()))?;
    let issuer = IssuerRepository::new(db)
        .get(&token.issuer_id)?
        .ok_or(CustodyError::IssuerNotInitialized)?;
    Ok((token, issuer))
}
