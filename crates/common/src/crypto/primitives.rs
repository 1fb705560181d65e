//! Thin handle over the curve, hash and AEAD primitives
//!
//! Everything above this module speaks in fixed-size byte arrays, the way
//! the wire formats do. Conversions into `curve25519-dalek` types happen
//! here and nowhere else.

use blake2::digest::consts::U32;
use blake2::digest::Mac;
use blake2::{Blake2b512, Blake2bMac, Digest};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use ed25519_dalek::SigningKey;
use sha2::Sha512;

use super::keys::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use super::CryptoError;

/// Size of a reduced Ed25519 scalar in bytes
pub const SCALAR_SIZE: usize = 32;
/// Size of the wide (pre-reduction) hash output in bytes
pub const WIDE_HASH_SIZE: usize = 64;

/// Handle to the primitive operations used by blinding, signing and sealing
///
/// Constructed once by the caller and passed by reference into the
/// components that need it. The handle carries no state of its own, so it
/// is `Copy` and can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Primitives {
    _private: (),
}

impl Primitives {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Unkeyed BLAKE2b with a 64-byte digest
    pub fn generic_hash_wide(&self, data: &[u8]) -> [u8; WIDE_HASH_SIZE] {
        wide(&Blake2b512::digest(data))
    }

    /// Keyed BLAKE2b with a 32-byte digest
    pub fn generic_hash_keyed(&self, key: &[u8], data: &[u8]) -> Result<[u8; 32], CryptoError> {
        let mut mac = Blake2bMac::<U32>::new_with_salt_and_personal(key, &[], &[])
            .map_err(|_| CryptoError::CryptoDegenerate("blake2b key rejected"))?;
        Mac::update(&mut mac, data);
        Ok(mac.finalize().into_bytes().into())
    }

    pub fn sha512(&self, data: &[u8]) -> [u8; 64] {
        wide(&Sha512::digest(data))
    }

    /// SHA-512 over the concatenation of `parts`, fed incrementally
    pub fn sha512_multipart(&self, parts: &[&[u8]]) -> [u8; 64] {
        let mut hasher = Sha512::new();
        for part in parts {
            hasher.update(part);
        }
        wide(&hasher.finalize())
    }

    /// Reduce a 64-byte value modulo the group order ℓ
    pub fn scalar_reduce(&self, value: &[u8; WIDE_HASH_SIZE]) -> [u8; SCALAR_SIZE] {
        Scalar::from_bytes_mod_order_wide(value).to_bytes()
    }

    /// `a * b mod ℓ`
    pub fn scalar_mul(&self, a: &[u8; SCALAR_SIZE], b: &[u8; SCALAR_SIZE]) -> [u8; SCALAR_SIZE] {
        (Scalar::from_bytes_mod_order(*a) * Scalar::from_bytes_mod_order(*b)).to_bytes()
    }

    /// `a + b mod ℓ`
    pub fn scalar_add(&self, a: &[u8; SCALAR_SIZE], b: &[u8; SCALAR_SIZE]) -> [u8; SCALAR_SIZE] {
        (Scalar::from_bytes_mod_order(*a) + Scalar::from_bytes_mod_order(*b)).to_bytes()
    }

    /// `s·B` without clamping `s`
    ///
    /// Fails when the result is the identity point, which only happens for a
    /// zero scalar (mod ℓ).
    pub fn scalar_mult_base_noclamp(
        &self,
        scalar: &[u8; SCALAR_SIZE],
    ) -> Result<[u8; PUBLIC_KEY_SIZE], CryptoError> {
        let point = EdwardsPoint::mul_base(&unclamped_scalar(scalar));
        if point.is_identity() {
            return Err(CryptoError::CryptoDegenerate("base multiplication gave identity"));
        }
        Ok(point.compress().to_bytes())
    }

    /// `s·P` without clamping `s`
    ///
    /// `P` must decode to a point of the prime-order subgroup: small-order
    /// points and points carrying a torsion component are rejected.
    pub fn scalar_mult_noclamp(
        &self,
        scalar: &[u8; SCALAR_SIZE],
        point: &[u8; PUBLIC_KEY_SIZE],
    ) -> Result<[u8; PUBLIC_KEY_SIZE], CryptoError> {
        let point = decompress(point)?;
        let product = unclamped_scalar(scalar) * point;
        if product.is_identity() {
            return Err(CryptoError::CryptoDegenerate("point multiplication gave identity"));
        }
        Ok(product.compress().to_bytes())
    }

    /// Extract the secret scalar `a` of an Ed25519 secret key
    ///
    /// This is the X25519 secret key derived from the signing key: the
    /// clamped low half of `SHA-512(seed)`. Both representations share the
    /// same scalar, so this is the simplest way to get `a` out of a
    /// `seed || pk` secret key.
    pub fn ed25519_sk_to_x25519_scalar(
        &self,
        secret_key: &[u8],
    ) -> Result<[u8; SCALAR_SIZE], CryptoError> {
        let bytes: &[u8; SECRET_KEY_SIZE] = secret_key
            .try_into()
            .map_err(|_| CryptoError::length("secret key", SECRET_KEY_SIZE, secret_key.len()))?;
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| CryptoError::CryptoDegenerate("secret key does not match its public half"))?;

        let expanded = self.sha512(signing_key.as_bytes());
        let mut scalar = [0u8; SCALAR_SIZE];
        scalar.copy_from_slice(&expanded[..SCALAR_SIZE]);
        scalar[0] &= 248;
        scalar[31] &= 127;
        scalar[31] |= 64;
        Ok(scalar)
    }

    /// Convert an Ed25519 public key into its X25519 (Montgomery) form
    pub fn ed25519_pk_to_x25519(
        &self,
        public_key: &[u8; PUBLIC_KEY_SIZE],
    ) -> Result<[u8; PUBLIC_KEY_SIZE], CryptoError> {
        Ok(decompress(public_key)?.to_montgomery().to_bytes())
    }

    /// Convert an X25519 public key into the Ed25519 point with a clear sign bit
    ///
    /// An X25519 key only fixes the point up to sign; this always returns the
    /// "positive" one. The negative one differs only in the top bit of the
    /// last byte.
    pub fn x25519_pk_to_ed25519(
        &self,
        public_key: &[u8; PUBLIC_KEY_SIZE],
    ) -> Result<[u8; PUBLIC_KEY_SIZE], CryptoError> {
        MontgomeryPoint(*public_key)
            .to_edwards(0)
            .map(|point| point.compress().to_bytes())
            .ok_or(CryptoError::CryptoDegenerate("x25519 key has no edwards form"))
    }

    /// XChaCha20-Poly1305 (IETF) encryption, tag appended to the ciphertext
    pub fn aead_encrypt(
        &self,
        key: &[u8; 32],
        nonce: &[u8; 24],
        message: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
        cipher
            .encrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: message,
                    aad: associated_data,
                },
            )
            .map_err(|_| CryptoError::CryptoDegenerate("aead encryption failed"))
    }

    /// XChaCha20-Poly1305 (IETF) decryption of `ciphertext || tag`
    pub fn aead_decrypt(
        &self,
        key: &[u8; 32],
        nonce: &[u8; 24],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
        cipher
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: associated_data,
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}

fn wide(digest: &[u8]) -> [u8; WIDE_HASH_SIZE] {
    let mut out = [0u8; WIDE_HASH_SIZE];
    out.copy_from_slice(digest);
    out
}

/// True when every byte is zero
pub(crate) fn is_zero(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| *b == 0)
}

// Top bit cleared, then reduced. Inputs here are already reduced scalars, so
// this only guards against callers handing in raw 256-bit values.
fn unclamped_scalar(bytes: &[u8; SCALAR_SIZE]) -> Scalar {
    let mut bytes = *bytes;
    bytes[31] &= 127;
    Scalar::from_bytes_mod_order(bytes)
}

fn decompress(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Result<EdwardsPoint, CryptoError> {
    let point = CompressedEdwardsY(*bytes)
        .decompress()
        .ok_or(CryptoError::CryptoDegenerate("point does not decompress"))?;
    if point.is_small_order() {
        return Err(CryptoError::CryptoDegenerate("point has small order"));
    }
    if !point.is_torsion_free() {
        return Err(CryptoError::CryptoDegenerate("point not in prime-order subgroup"));
    }
    Ok(point)
}
