// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Currency codec: human symbols to and from the ledger's 160-bit currency.
//!
//! Three-character uppercase alphanumeric codes use the standard form and pass
//! through unchanged. Anything else is stored on the ledger as 20 raw bytes
//! (UTF-8, zero padded) written as 40 uppercase hex characters.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::LedgerError;

/// Maximum encodable length of a non-standard code, in bytes.
pub const MAX_CODE_BYTES: usize = 20;

/// Result of decoding a wire currency for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DecodedCurrency {
    /// Human readable symbol.
    pub human: String,
    /// The 40-char hex form when the input was non-standard.
    pub hex: Option<String>,
}

/// `^[A-Z0-9]{3}$`
pub fn is_standard_code(code: &str) -> bool {
    code.len() == 3
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// `^[0-9A-Fa-f]{40}$`
pub fn is_hex_currency(wire: &str) -> bool {
    wire.len() == 40 && wire.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encode a human code into its wire representation.
pub fn encode_currency(code: &str) -> Result<String, LedgerError> {
    if is_standard_code(code) {
        return Ok(code.to_string());
    }
    let bytes = code.as_bytes();
    if bytes.is_empty() {
        return Err(LedgerError::Validation(
            "Currency code must not be empty".to_string(),
        ));
    }
    if bytes.len() > MAX_CODE_BYTES {
        return Err(LedgerError::CodeTooLong(bytes.len()));
    }
    let mut padded = [0u8; MAX_CODE_BYTES];
    padded[..bytes.len()].copy_from_slice(bytes);
    Ok(hex::encode_upper(padded))
}

/// Decode a wire currency for display. Never fails.
pub fn decode_currency(wire: &str) -> DecodedCurrency {
    if !is_hex_currency(wire) {
        return DecodedCurrency {
            human: wire.to_string(),
            hex: None,
        };
    }
    match hex::decode(wire) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            DecodedCurrency {
                human: text.trim_end_matches('\0').to_string(),
                hex: Some(wire.to_string()),
            }
        }
        Err(_) => DecodedCurrency {
            human: wire.to_string(),
            hex: None,
        },
    }
}

/// The 20-byte binary currency field for an issued amount.
///
/// Accepts either a human code or an already-encoded 40-hex wire value.
pub(crate) fn currency_bytes(code: &str) -> Result<[u8; 20], LedgerError> {
    if code == "XRP" {
        return Err(LedgerError::Validation(
            "XRP cannot be used as an issued currency code".to_string(),
        ));
    }
    let wire = if is_hex_currency(code) {
        code.to_ascii_uppercase()
    } else {
        encode_currency(code)?
    };

    let mut out = [0u8; 20];
    if is_standard_code(&wire) {
        out[12..15].copy_from_slice(wire.as_bytes());
    } else {
        let bytes = hex::decode(&wire)
            .map_err(|e| LedgerError::Validation(format!("Invalid currency hex: {e}")))?;
        out.copy_from_slice(&bytes);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn standard_code_is_unchanged() {
        assert_eq!(encode_currency("USD").unwrap(), "USD");
        assert_eq!(encode_currency("EU1").unwrap(), "EU1");
    }

    #[test]
    fn long_code_is_hex_padded() {
        let wire = encode_currency("Unykorn").unwrap();
        assert_eq!(wire, "556E796B6F726E00000000000000000000000000");
        assert_eq!(wire.len(), 40);
        assert!(wire.ends_with("00000000000000000000000000"));

        let decoded = decode_currency(&wire);
        assert_eq!(decoded.human, "Unykorn");
        assert_eq!(decoded.hex.as_deref(), Some(wire.as_str()));
    }

    #[test]
    fn lowercase_three_char_code_is_not_standard() {
        assert_eq!(
            encode_currency("usd").unwrap(),
            "7573640000000000000000000000000000000000"
        );
        assert_eq!(
            encode_currency("USDX").unwrap(),
            "5553445800000000000000000000000000000000"
        );
    }

    #[test]
    fn twenty_bytes_is_accepted_and_twenty_one_is_too_long() {
        assert!(encode_currency(&"A".repeat(20)).is_ok());
        let err = encode_currency(&"A".repeat(21)).unwrap_err();
        assert!(matches!(err, LedgerError::CodeTooLong(21)));
    }

    #[test]
    fn multibyte_length_counts_bytes_not_chars() {
        // 11 chars, 21 bytes
        let err = encode_currency("ééééééééééa").unwrap_err();
        assert!(matches!(err, LedgerError::CodeTooLong(21)));
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(matches!(
            encode_currency("").unwrap_err(),
            LedgerError::Validation(_)
        ));
    }

    #[test]
    fn decode_passes_through_non_hex() {
        let decoded = decode_currency("USD");
        assert_eq!(decoded.human, "USD");
        assert_eq!(decoded.hex, None);

        let decoded = decode_currency("not-forty-hex");
        assert_eq!(decoded.human, "not-forty-hex");
        assert_eq!(decoded.hex, None);
    }

    #[test]
    fn currency_bytes_standard_layout() {
        let bytes = currency_bytes("USD").unwrap();
        assert_eq!(&bytes[..12], &[0u8; 12]);
        assert_eq!(&bytes[12..15], b"USD");
        assert_eq!(&bytes[15..], &[0u8; 5]);
    }

    #[test]
    fn currency_bytes_accepts_wire_hex_and_rejects_xrp() {
        let from_human = currency_bytes("Unykorn").unwrap();
        let from_wire = currency_bytes("556e796b6f726e00000000000000000000000000").unwrap();
        assert_eq!(from_human, from_wire);
        assert!(currency_bytes("XRP").is_err());
    }

    proptest! {
        #[test]
        fn round_trip_printable_ascii(code in "[ -~]{1,20}") {
            prop_assume!(!is_standard_code(&code));
            let wire = encode_currency(&code).unwrap();
            prop_assert_eq!(decode_currency(&wire).human, code);
        }
    }
}
