//! Ed25519 signatures under a blinded key
//!
//! The construction is ordinary EdDSA with the blinded scalar `ka` as the
//! signing scalar, except that the nonce is derived from the *root* key and
//! `kA` is hashed into both the nonce and the challenge. Signatures made for
//! one server's `kA` therefore never verify under another server's `kA`
//! derived from the same root key. Verifiers need nothing beyond standard
//! Ed25519 verification against `kA`.

use super::keys::{KeyPair, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use super::primitives::{is_zero, Primitives, SCALAR_SIZE};
use super::{CryptoError, Signature, SIGNATURE_SIZE};

/// Sign `message` with the blinded keypair `(ka, kA)` of `root_secret_key`
///
/// 1. `H_rh = SHA-512(root_sk)[32..]`
/// 2. `r = reduce(SHA-512(H_rh || kA || message))`
/// 3. `R = r·B`
/// 4. `HRAM = reduce(SHA-512(R || kA || message))`
/// 5. `s = r + HRAM * ka`
///
/// Output is `R || s`.
///
/// # Errors
///
/// `InvalidKeyLength` for a root key that is not 64 bytes, and
/// `CryptoDegenerate` if any intermediate scalar is zero. A zero `HRAM * ka`
/// means the blinded key itself is degenerate.
pub fn sign(
    ops: &Primitives,
    message: &[u8],
    root_secret_key: &[u8],
    blinded_secret_scalar: &[u8; SCALAR_SIZE],
    blinded_public_key: &[u8; PUBLIC_KEY_SIZE],
) -> Result<[u8; SIGNATURE_SIZE], CryptoError> {
    if root_secret_key.len() != SECRET_KEY_SIZE {
        return Err(CryptoError::length(
            "secret key",
            SECRET_KEY_SIZE,
            root_secret_key.len(),
        ));
    }

    let digest = ops.sha512(root_secret_key);
    let h_rh = &digest[32..];

    let r = ops.scalar_reduce(&ops.sha512_multipart(&[h_rh, blinded_public_key, message]));
    if is_zero(&r) {
        return Err(CryptoError::CryptoDegenerate("signature nonce is zero"));
    }

    let sig_r = ops.scalar_mult_base_noclamp(&r)?;

    let hram = ops.scalar_reduce(&ops.sha512_multipart(&[&sig_r, blinded_public_key, message]));
    if is_zero(&hram) {
        return Err(CryptoError::CryptoDegenerate("signature challenge is zero"));
    }

    let s_term = ops.scalar_mul(&hram, blinded_secret_scalar);
    if is_zero(&s_term) {
        return Err(CryptoError::CryptoDegenerate("blinded secret scalar is degenerate"));
    }

    let sig_s = ops.scalar_add(&r, &s_term);
    if is_zero(&sig_s) {
        return Err(CryptoError::CryptoDegenerate("signature scalar is zero"));
    }

    let mut signature = [0u8; SIGNATURE_SIZE];
    signature[..32].copy_from_slice(&sig_r);
    signature[32..].copy_from_slice(&sig_s);
    Ok(signature)
}

/// Verify a blinded signature as a standard Ed25519 signature under `kA`
pub fn verify(
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
    blinded_public_key: &[u8; PUBLIC_KEY_SIZE],
) -> Result<(), ed25519_dalek::SignatureError> {
    KeyPair::verify(
        blinded_public_key,
        message,
        &Signature::from_bytes(signature),
    )
}
