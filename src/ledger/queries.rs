// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only ledger queries: accounts, trust lines, holders and order books.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::amount::format_drops;
use super::currency::{decode_currency, encode_currency};
use super::keys::decode_address;
use super::session::{is_account_not_found, LedgerSession};
use super::LedgerError;

/// Hard cap on `account_lines` pages followed per query.
const MAX_LINE_PAGES: usize = 20;
pub const DEFAULT_BOOK_LIMIT: u32 = 20;
pub const MAX_BOOK_LIMIT: u32 = 200;

/// Native balance and counters of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub address: String,
    pub balance_drops: u64,
    /// Balance in XRP, formatted for display.
    pub balance_xrp: String,
    pub sequence: u32,
    pub owner_count: u32,
    pub flags: u32,
}

/// One trust line as seen from the queried account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrustLine {
    /// Counterparty account.
    pub account: String,
    /// Human readable currency.
    pub currency: String,
    /// Wire currency as returned by the ledger.
    pub currency_wire: String,
    pub balance: String,
    pub limit: String,
    pub limit_peer: String,
}

/// A holder of the issuer's token, from the holder's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Holder {
    pub holder: String,
    pub currency: String,
    pub balance: String,
    pub limit: String,
}

pub async fn account_state(
    session: &dyn LedgerSession,
    address: &str,
) -> Result<AccountState, LedgerError> {
    decode_address(address)?;
    let result = session
        .request(
            "account_info",
            json!({ "account": address, "ledger_index": "validated" }),
        )
        .await?;
    let data = result
        .get("account_data")
        .ok_or_else(|| LedgerError::Rpc("account_info response has no account_data".to_string()))?;

    let balance_drops = data
        .get("Balance")
        .and_then(Value::as_str)
        .and_then(|b| b.parse::<u64>().ok())
        .ok_or_else(|| LedgerError::Rpc("account_info response has no Balance".to_string()))?;
    let read_u32 = |key: &str| {
        data.get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    };

    Ok(AccountState {
        address: address.to_string(),
        balance_drops,
        balance_xrp: format_drops(balance_drops),
        sequence: read_u32("Sequence"),
        owner_count: read_u32("OwnerCount"),
        flags: read_u32("Flags"),
    })
}

/// Poll until `address` exists on the current ledger.
///
/// Faucet funding lands a few ledgers after the faucet responds.
pub async fn wait_for_account(
    session: &dyn LedgerSession,
    address: &str,
    attempts: u32,
    interval: Duration,
) -> Result<(), LedgerError> {
    for attempt in 0..attempts {
        let result = session
            .request(
                "account_info",
                json!({ "account": address, "ledger_index": "current" }),
            )
            .await;
        match result {
            Ok(_) => return Ok(()),
            Err(e) if is_account_not_found(&e) => {
                if attempt + 1 < attempts {
                    tokio::time::sleep(interval).await;
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(LedgerError::Rpc(format!(
        "account {address} not found after {attempts} attempts"
    )))
}

/// All trust lines of `address`, optionally restricted to one peer.
pub async fn trust_lines(
    session: &dyn LedgerSession,
    address: &str,
    peer: Option<&str>,
) -> Result<Vec<TrustLine>, LedgerError> {
    decode_address(address)?;
    let mut lines = Vec::new();
    let mut marker: Option<Value> = None;

    for _ in 0..MAX_LINE_PAGES {
        let mut params = json!({ "account": address, "ledger_index": "validated", "limit": 400 });
        if let Some(peer) = peer {
            params["peer"] = Value::String(peer.to_string());
        }
        if let Some(m) = marker.take() {
            params["marker"] = m;
        }

        let result = session.request("account_lines", params).await?;
        if let Some(page) = result.get("lines").and_then(Value::as_array) {
            lines.extend(page.iter().filter_map(parse_line));
        }

        match result.get("marker") {
            Some(m) if !m.is_null() => marker = Some(m.clone()),
            _ => break,
        }
    }
    Ok(lines)
}

fn parse_line(line: &Value) -> Option<TrustLine> {
    let text = |key: &str| line.get(key).and_then(Value::as_str).map(str::to_string);
    let currency_wire = text("currency")?;
    Some(TrustLine {
        account: text("account")?,
        currency: decode_currency(&currency_wire).human,
        currency_wire,
        balance: text("balance").unwrap_or_else(|| "0".to_string()),
        limit: text("limit").unwrap_or_else(|| "0".to_string()),
        limit_peer: text("limit_peer").unwrap_or_else(|| "0".to_string()),
    })
}

/// Project the issuer's trust lines into holder balances.
///
/// `lines` are the cold account's lines, where a holder's balance shows up
/// negated. `currency` filters by human code.
pub fn holders_from_lines(
    lines: &[TrustLine],
    currency: Option<&str>,
    include_zero: bool,
) -> Result<Vec<Holder>, LedgerError> {
    let wanted = currency.map(encode_currency).transpose()?;

    Ok(lines
        .iter()
        .filter(|line| wanted.as_deref().is_none_or(|w| line.currency_wire == w))
        .map(|line| Holder {
            holder: line.account.clone(),
            currency: line.currency.clone(),
            balance: negate_decimal(&line.balance),
            limit: line.limit_peer.clone(),
        })
        .filter(|h| include_zero || !is_zero_decimal(&h.balance))
        .collect())
}

fn negate_decimal(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else if is_zero_decimal(value) {
        "0".to_string()
    } else if let Some(stripped) = value.strip_prefix('-') {
        stripped.to_string()
    } else {
        format!("-{value}")
    }
}

/// Ledger balances may use exponent notation (`1e-15`). Anything that is not
/// a finite number counts as non-zero so it stays visible.
fn is_zero_decimal(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|v| v.is_finite() && v == 0.0)
}

// =============================================================================
// Order book
// =============================================================================

/// One side of an order book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookSide {
    Xrp,
    Issued { currency: String, issuer: String },
}

impl BookSide {
    /// Parse `XRP` or `CODE:issuer`.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("XRP") {
            return Ok(Self::Xrp);
        }
        let (currency, issuer) = raw.split_once(':').ok_or_else(|| {
            LedgerError::Validation(format!(
                "book side must be 'XRP' or 'CODE:issuer', got '{raw}'"
            ))
        })?;
        encode_currency(currency)?;
        decode_address(issuer)?;
        Ok(Self::Issued {
            currency: currency.to_string(),
            issuer: issuer.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<Value, LedgerError> {
        match self {
            Self::Xrp => Ok(json!({ "currency": "XRP" })),
            Self::Issued { currency, issuer } => Ok(json!({
                "currency": encode_currency(currency)?,
                "issuer": issuer,
            })),
        }
    }
}

/// An offer on the book with currencies decoded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookOffer {
    pub account: String,
    pub sequence: u32,
    #[schema(value_type = Object)]
    pub taker_gets: Value,
    #[schema(value_type = Object)]
    pub taker_pays: Value,
    pub quality: Option<String>,
}

/// Offers that sell `base` for `quote`.
pub async fn book_offers(
    session: &dyn LedgerSession,
    base: &BookSide,
    quote: &BookSide,
    limit: u32,
) -> Result<Vec<BookOffer>, LedgerError> {
    if !(1..=MAX_BOOK_LIMIT).contains(&limit) {
        return Err(LedgerError::Validation(format!(
            "limit must be between 1 and {MAX_BOOK_LIMIT}"
        )));
    }
    let result = session
        .request(
            "book_offers",
            json!({
                "taker_gets": base.to_json()?,
                "taker_pays": quote.to_json()?,
                "limit": limit,
                "ledger_index": "validated",
            }),
        )
        .await?;

    let offers = result
        .get("offers")
        .and_then(Value::as_array)
        .map(|offers| offers.iter().filter_map(parse_offer).collect())
        .unwrap_or_default();
    Ok(offers)
}

fn parse_offer(offer: &Value) -> Option<BookOffer> {
    Some(BookOffer {
        account: offer.get("Account")?.as_str()?.to_string(),
        sequence: u32::try_from(offer.get("Sequence")?.as_u64()?).ok()?,
        taker_gets: decode_amount(offer.get("TakerGets")?),
        taker_pays: decode_amount(offer.get("TakerPays")?),
        quality: offer.get("quality").and_then(Value::as_str).map(str::to_string),
    })
}

/// Replace a wire currency inside an amount object with its human form.
fn decode_amount(amount: &Value) -> Value {
    let mut amount = amount.clone();
    if let Some(currency) = amount.get("currency").and_then(Value::as_str) {
        let decoded = decode_currency(currency).human;
        amount["currency"] = Value::String(decoded);
    }
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::network::Network;
    use crate::ledger::session::LedgerConnector;
    use crate::testing::MockLedger;

    const COLD: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const HOLDER: &str = "rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1";
    const OTHER: &str = "rLUEXYuLiQptky37CqLcm9USQpPiz5rkpD";

    fn line(account: &str, currency: &str, balance: &str, limit_peer: &str) -> TrustLine {
        TrustLine {
            account: account.into(),
            currency: decode_currency(currency).human,
            currency_wire: currency.into(),
            balance: balance.into(),
            limit: "0".into(),
            limit_peer: limit_peer.into(),
        }
    }

    #[tokio::test]
    async fn account_state_formats_balance() {
        let mock = MockLedger::new();
        mock.seed_account(COLD, 20_500_000);
        let session = mock.connect(Network::Devnet).await.unwrap();

        let state = account_state(session.as_ref(), COLD).await.unwrap();
        assert_eq!(state.balance_drops, 20_500_000);
        assert_eq!(state.balance_xrp, "20.5");
        assert_eq!(state.sequence, 1);
    }

    #[tokio::test]
    async fn account_state_rejects_bad_address_before_request() {
        let mock = MockLedger::new();
        let session = mock.connect(Network::Devnet).await.unwrap();
        assert!(account_state(session.as_ref(), "nope").await.is_err());
        assert_eq!(mock.request_count("account_info"), 0);
    }

    #[tokio::test]
    async fn trust_lines_are_decoded() {
        let mock = MockLedger::new();
        mock.set_lines(
            COLD,
            vec![json!({
                "account": HOLDER,
                "currency": "556E796B6F726E00000000000000000000000000",
                "balance": "-10",
                "limit": "0",
                "limit_peer": "1000000"
            })],
        );
        let session = mock.connect(Network::Devnet).await.unwrap();

        let lines = trust_lines(session.as_ref(), COLD, None).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].currency, "Unykorn");
        assert_eq!(lines[0].balance, "-10");
    }

    #[test]
    fn holders_negate_and_filter() {
        let lines = vec![
            line(HOLDER, "USD", "-10", "1000"),
            line(OTHER, "USD", "0", "500"),
            line(HOLDER, "556E796B6F726E00000000000000000000000000", "-2.5", "100"),
        ];

        let usd = holders_from_lines(&lines, Some("USD"), false).unwrap();
        assert_eq!(usd.len(), 1);
        assert_eq!(usd[0].holder, HOLDER);
        assert_eq!(usd[0].balance, "10");
        assert_eq!(usd[0].limit, "1000");

        let with_zero = holders_from_lines(&lines, Some("USD"), true).unwrap();
        assert_eq!(with_zero.len(), 2);
        assert_eq!(with_zero[1].balance, "0");

        let unykorn = holders_from_lines(&lines, Some("Unykorn"), false).unwrap();
        assert_eq!(unykorn.len(), 1);
        assert_eq!(unykorn[0].currency, "Unykorn");
        assert_eq!(unykorn[0].balance, "2.5");

        assert_eq!(holders_from_lines(&lines, None, false).unwrap().len(), 2);
    }

    #[test]
    fn zero_filter_understands_ledger_number_forms() {
        let lines = vec![
            line(HOLDER, "USD", "-1e-15", "1000"),
            line(OTHER, "USD", "-0.000", "500"),
            line(HOLDER, "EUR", "", "10"),
        ];

        let holders = holders_from_lines(&lines, None, false).unwrap();
        assert_eq!(holders.len(), 2);
        assert_eq!(holders[0].balance, "1e-15");
        assert_eq!(holders[1].currency, "EUR");
        assert_eq!(holders[1].balance, "");

        assert!(is_zero_decimal("0"));
        assert!(is_zero_decimal("-0.0"));
        assert!(is_zero_decimal("0e5"));
        assert!(!is_zero_decimal(""));
        assert!(!is_zero_decimal("1E-81"));
        assert!(!is_zero_decimal("NaN"));
    }

    #[test]
    fn book_side_parsing() {
        assert_eq!(BookSide::parse("xrp").unwrap(), BookSide::Xrp);
        let side = BookSide::parse(&format!("USD:{COLD}")).unwrap();
        assert_eq!(
            side.to_json().unwrap(),
            json!({ "currency": "USD", "issuer": COLD })
        );
        assert!(BookSide::parse("USD").is_err());
        assert!(BookSide::parse("USD:nope").is_err());
    }

    #[tokio::test]
    async fn book_offers_decodes_currencies_and_checks_limit() {
        let mock = MockLedger::new();
        mock.set_offers(vec![json!({
            "Account": HOLDER,
            "Sequence": 5,
            "TakerGets": { "currency": "556E796B6F726E00000000000000000000000000", "issuer": COLD, "value": "10" },
            "TakerPays": "1000000",
            "quality": "100000"
        })]);
        let session = mock.connect(Network::Devnet).await.unwrap();

        let base = BookSide::Issued {
            currency: "Unykorn".into(),
            issuer: COLD.into(),
        };
        let offers = book_offers(session.as_ref(), &base, &BookSide::Xrp, 20)
            .await
            .unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].taker_gets["currency"], "Unykorn");
        assert_eq!(offers[0].taker_pays, "1000000");
        assert_eq!(offers[0].sequence, 5);

        assert!(book_offers(session.as_ref(), &base, &BookSide::Xrp, 0).await.is_err());
        assert!(book_offers(session.as_ref(), &base, &BookSide::Xrp, 201).await.is_err());
    }
}
