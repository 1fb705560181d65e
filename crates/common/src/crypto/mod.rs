//! Cryptographic primitives for blinded community-server identities
//!
//! This module provides the cryptographic foundation for authenticating to
//! semi-trusted servers without handing them a permanent identity:
//!
//! - **Root Identity**: one Ed25519 keypair (`KeyPair`) per account
//! - **Blinding**: a per-server scalar `k` turns the root scalar `a` into a
//!   pseudonymous keypair `(ka, kA)` that only that server sees
//! - **Blinded Signatures**: an EdDSA variant signed with `ka` that verifies
//!   as a plain Ed25519 signature under `kA`
//! - **Version Blinding**: a server-independent pseudonym for file server
//!   version checks
//! - **Sealed Payloads**: XChaCha20-Poly1305 for transport payloads
//!
//! # Blinding Protocol
//!
//! For a server with public key `S` and a root key with scalar `a`:
//! 1. `k = reduce(BLAKE2b-512(S))`
//! 2. `ka = k * a mod ℓ`
//! 3. `kA = ka·B` (no clamping)
//!
//! Anyone holding a standard account id and `S` can recompute `kA` up to the
//! sign of the point, which is how blinded ids are matched back to root ids
//! (see [`crate::identity::matches`]).
//!
//! All curve and hash operations go through an explicit [`Primitives`]
//! handle so that every failure of the underlying library surfaces as a
//! [`CryptoError`] rather than an absent value.

mod blind_sign;
mod blinding;
mod keys;
mod primitives;
mod sealed;
mod version;

pub use blind_sign::{sign as blind_sign, verify as blind_verify};
pub use blinding::{
    derive_blinded_key_pair, derive_blinding_factor, derive_blinding_factor_hex,
    derive_private_scalar, BlindedKeyPair, BlindingFactor,
};
pub use ed25519_dalek::Signature;
pub use keys::{KeyPair, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SEED_SIZE};
pub use primitives::{Primitives, SCALAR_SIZE, WIDE_HASH_SIZE};
pub use sealed::{
    decrypt, encrypt, SealingKey, SEALING_KEY_SIZE, SEALING_NONCE_SIZE, SEALING_TAG_SIZE,
};
pub use version::{version_key_pair, version_sign, version_sign_request, Platform};

/// Size of an Ed25519 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Errors produced by key handling, blinding, signing and sealing
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The server public key is not 32 bytes (or not valid hex)
    #[error("invalid server public key")]
    InvalidServerKey,
    /// A key, nonce or scalar argument has the wrong length
    #[error("invalid {what} length, expected {expected}, got {got}")]
    InvalidKeyLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// A scalar reduced to zero or a curve operation produced a degenerate point
    #[error("degenerate crypto result: {0}")]
    CryptoDegenerate(&'static str),
    /// AEAD tag mismatch, or ciphertext shorter than the tag
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("key error: {0}")]
    Key(#[from] anyhow::Error),
}

impl CryptoError {
    pub(crate) fn length(what: &'static str, expected: usize, got: usize) -> Self {
        CryptoError::InvalidKeyLength {
            what,
            expected,
            got,
        }
    }
}
