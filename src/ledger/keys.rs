// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Family seeds, keypair derivation and classic addresses.
//!
//! Supports both key types the ledger accepts:
//!
//! - **secp256k1**: root key from `SHA512Half(entropy || seq)`, account key
//!   is `root + SHA512Half(root_pub || 0 || subseq)` (mod n). Signatures are
//!   DER-encoded, low-S, over `SHA512Half(message)`.
//! - **ed25519**: private key is `SHA512Half(entropy)`, public key is
//!   `0xED || A`. Signatures cover the full message.
//!
//! Seeds and addresses use base58check with the ripple alphabet.

use std::fmt;

use ed25519_dalek::Signer as _;
use k256::{
    ecdsa::signature::hazmat::PrehashSigner,
    elliptic_curve::sec1::ToEncodedPoint,
    NonZeroScalar,
};
use rand::RngCore;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use utoipa::ToSchema;

use super::codec::sha512_half;
use super::LedgerError;

const ACCOUNT_ID_PREFIX: u8 = 0x00;
const SECP256K1_SEED_PREFIX: [u8; 1] = [0x21];
const ED25519_SEED_PREFIX: [u8; 3] = [0x01, 0xE1, 0x4B];
const ED25519_PUBKEY_PREFIX: u8 = 0xED;

/// Signature scheme of a keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    #[default]
    Ed25519,
    Secp256k1,
}

/// 16 bytes of seed entropy plus the key type it derives.
#[derive(Clone)]
pub struct Seed {
    entropy: [u8; 16],
    algorithm: KeyAlgorithm,
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("algorithm", &self.algorithm)
            .field("entropy", &"<redacted>")
            .finish()
    }
}

impl Seed {
    /// Fresh seed from the operating system RNG.
    pub fn random(algorithm: KeyAlgorithm) -> Self {
        let mut entropy = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        Self::from_entropy(entropy, algorithm)
    }

    pub fn from_entropy(entropy: [u8; 16], algorithm: KeyAlgorithm) -> Self {
        Self { entropy, algorithm }
    }

    /// Parse an encoded family seed (`s...` or `sEd...`).
    pub fn parse(encoded: &str) -> Result<Self, LedgerError> {
        let payload = bs58::decode(encoded.trim())
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check(None)
            .into_vec()
            .map_err(|_| LedgerError::InvalidSecret)?;

        let (algorithm, entropy) = match payload.len() {
            17 if payload[..1] == SECP256K1_SEED_PREFIX => {
                (KeyAlgorithm::Secp256k1, &payload[1..])
            }
            19 if payload[..3] == ED25519_SEED_PREFIX => (KeyAlgorithm::Ed25519, &payload[3..]),
            _ => return Err(LedgerError::InvalidSecret),
        };

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(entropy);
        Ok(Self::from_entropy(bytes, algorithm))
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Base58check encoding of the seed.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(19);
        match self.algorithm {
            KeyAlgorithm::Secp256k1 => payload.extend_from_slice(&SECP256K1_SEED_PREFIX),
            KeyAlgorithm::Ed25519 => payload.extend_from_slice(&ED25519_SEED_PREFIX),
        }
        payload.extend_from_slice(&self.entropy);
        bs58::encode(payload)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check()
            .into_string()
    }

    pub fn derive_keypair(&self) -> Result<Keypair, LedgerError> {
        match self.algorithm {
            KeyAlgorithm::Secp256k1 => derive_secp256k1(&self.entropy),
            KeyAlgorithm::Ed25519 => {
                let secret = sha512_half(&self.entropy);
                Ok(Keypair::Ed25519(ed25519_dalek::SigningKey::from_bytes(
                    &secret,
                )))
            }
        }
    }
}

/// A signing keypair derived from a seed.
#[derive(Clone)]
pub enum Keypair {
    Secp256k1(k256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

impl Keypair {
    /// Parse a family seed and derive its keypair.
    pub fn from_secret(secret: &str) -> Result<Self, LedgerError> {
        Seed::parse(secret)?.derive_keypair()
    }

    /// 33-byte public key as the ledger expects it in `SigningPubKey`.
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Self::Secp256k1(key) => k256::PublicKey::from(key.verifying_key())
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
            Self::Ed25519(key) => {
                let mut out = Vec::with_capacity(33);
                out.push(ED25519_PUBKEY_PREFIX);
                out.extend_from_slice(key.verifying_key().as_bytes());
                out
            }
        }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode_upper(self.public_key())
    }

    pub fn account_id(&self) -> [u8; 20] {
        account_id_from_public_key(&self.public_key())
    }

    /// Classic `r...` address of this keypair.
    pub fn address(&self) -> String {
        encode_account_id(&self.account_id())
    }

    /// Sign already-prefixed signing data.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, LedgerError> {
        match self {
            Self::Secp256k1(key) => {
                let digest = sha512_half(message);
                let signature: k256::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .map_err(|e| LedgerError::Signing(e.to_string()))?;
                let signature = signature.normalize_s().unwrap_or(signature);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::Ed25519(key) => Ok(key.sign(message).to_bytes().to_vec()),
        }
    }
}

/// A freshly generated account. The seed is handed out once and never stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWallet {
    pub address: String,
    pub public_key: String,
    pub seed: String,
    pub algorithm: KeyAlgorithm,
}

pub fn generate_wallet(algorithm: KeyAlgorithm) -> Result<GeneratedWallet, LedgerError> {
    let seed = Seed::random(algorithm);
    let keypair = seed.derive_keypair()?;
    Ok(GeneratedWallet {
        address: keypair.address(),
        public_key: keypair.public_key_hex(),
        seed: seed.encode(),
        algorithm,
    })
}

/// Resolve a family seed to the address it controls.
pub fn derive_address(secret: &str) -> Result<String, LedgerError> {
    Ok(Keypair::from_secret(secret)?.address())
}

pub fn account_id_from_public_key(public_key: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(public_key);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

pub fn encode_account_id(account_id: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(ACCOUNT_ID_PREFIX);
    payload.extend_from_slice(account_id);
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}

/// Decode a classic address into its 20-byte account id.
pub fn decode_address(address: &str) -> Result<[u8; 20], LedgerError> {
    let payload = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(None)
        .into_vec()
        .map_err(|_| LedgerError::InvalidAddress(address.to_string()))?;
    if payload.len() != 21 || payload[0] != ACCOUNT_ID_PREFIX {
        return Err(LedgerError::InvalidAddress(address.to_string()));
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&payload[1..]);
    Ok(out)
}

pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

fn derive_secp256k1(entropy: &[u8; 16]) -> Result<Keypair, LedgerError> {
    let root = derive_scalar(entropy, None)?;
    let root_public = k256::PublicKey::from_secret_scalar(&root).to_encoded_point(true);
    let intermediate = derive_scalar(root_public.as_bytes(), Some(0))?;

    let account_scalar = *root + *intermediate;
    let account: Option<NonZeroScalar> = NonZeroScalar::new(account_scalar).into();
    let account = account.ok_or(LedgerError::InvalidSecret)?;
    Ok(Keypair::Secp256k1(k256::ecdsa::SigningKey::from(account)))
}

/// First `SHA512Half(bytes || [discriminator] || seq)` that is a valid scalar.
fn derive_scalar(bytes: &[u8], discriminator: Option<u32>) -> Result<NonZeroScalar, LedgerError> {
    for seq in 0..=u32::MAX {
        let mut hasher = Sha512::new();
        hasher.update(bytes);
        if let Some(d) = discriminator {
            hasher.update(d.to_be_bytes());
        }
        hasher.update(seq.to_be_bytes());
        let digest = hasher.finalize();

        let mut candidate = [0u8; 32];
        candidate.copy_from_slice(&digest[..32]);
        let scalar: Option<NonZeroScalar> = NonZeroScalar::from_repr(candidate.into()).into();
        if let Some(scalar) = scalar {
            return Ok(scalar);
        }
    }
    Err(LedgerError::InvalidSecret)
}
