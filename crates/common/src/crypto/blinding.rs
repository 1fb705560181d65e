//! Per-server key blinding
//!
//! A community server with public key `S` never sees the account's root key.
//! Instead the client presents `kA`, where `k` is a scalar every party can
//! derive from `S` alone and `A` is the root public key. The matching secret
//! is `ka = k * a`, which signs as an ordinary (unclamped) Ed25519 scalar.

use super::keys::{KeyPair, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use super::primitives::{is_zero, Primitives, SCALAR_SIZE};
use super::CryptoError;

/// Per-server blinding scalar `k`, never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlindingFactor([u8; SCALAR_SIZE]);

impl BlindingFactor {
    pub fn as_bytes(&self) -> &[u8; SCALAR_SIZE] {
        &self.0
    }
}

/// Blinded keypair `(ka, kA)` for one server
///
/// Derived fresh on demand and never persisted here. A caller caching these
/// must drop the cache whenever the root key changes.
#[derive(Clone, PartialEq, Eq)]
pub struct BlindedKeyPair {
    secret_scalar: [u8; SCALAR_SIZE],
    public_key: [u8; PUBLIC_KEY_SIZE],
}

impl std::fmt::Debug for BlindedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlindedKeyPair")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

impl BlindedKeyPair {
    /// The blinded secret scalar `ka`
    pub fn secret_scalar(&self) -> &[u8; SCALAR_SIZE] {
        &self.secret_scalar
    }

    /// The blinded public key `kA`
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }
}

/// Derive the blinding factor for a server public key
///
/// `k = reduce(BLAKE2b-512(server_pk))`
///
/// # Errors
///
/// - `InvalidServerKey` if the key is not exactly 32 bytes
/// - `CryptoDegenerate` if the reduced scalar is zero
pub fn derive_blinding_factor(
    ops: &Primitives,
    server_public_key: &[u8],
) -> Result<BlindingFactor, CryptoError> {
    if server_public_key.len() != PUBLIC_KEY_SIZE {
        return Err(CryptoError::InvalidServerKey);
    }
    let hash = ops.generic_hash_wide(server_public_key);
    let k = ops.scalar_reduce(&hash);
    if is_zero(&k) {
        tracing::error!("blinding factor reduced to zero");
        return Err(CryptoError::CryptoDegenerate("blinding factor is zero"));
    }
    Ok(BlindingFactor(k))
}

/// Derive the blinding factor from a hex encoded server public key
///
/// Malformed hex is reported as `InvalidServerKey`, like a wrong length.
pub fn derive_blinding_factor_hex(
    ops: &Primitives,
    server_public_key_hex: &str,
) -> Result<BlindingFactor, CryptoError> {
    let bytes = decode_server_key(server_public_key_hex)?;
    derive_blinding_factor(ops, &bytes)
}

/// Extract the root secret scalar `a` from a 64-byte Ed25519 secret key
pub fn derive_private_scalar(
    ops: &Primitives,
    root_secret_key: &[u8],
) -> Result<[u8; SCALAR_SIZE], CryptoError> {
    if root_secret_key.len() != SECRET_KEY_SIZE {
        return Err(CryptoError::length(
            "secret key",
            SECRET_KEY_SIZE,
            root_secret_key.len(),
        ));
    }
    ops.ed25519_sk_to_x25519_scalar(root_secret_key)
}

/// Derive the blinded keypair `(ka, kA)` of `root` for one server
///
/// `ka = k * a`, `kA = ka·B` with no clamping. The result is deterministic
/// in `(server_public_key, root)`.
pub fn derive_blinded_key_pair(
    ops: &Primitives,
    server_public_key: &[u8],
    root: &KeyPair,
) -> Result<BlindedKeyPair, CryptoError> {
    let k = derive_blinding_factor(ops, server_public_key)?;
    let a = derive_private_scalar(ops, &root.secret_key())?;

    let ka = ops.scalar_mul(k.as_bytes(), &a);
    if is_zero(&ka) {
        return Err(CryptoError::CryptoDegenerate("blinded scalar is zero"));
    }
    let k_a = ops.scalar_mult_base_noclamp(&ka)?;
    if is_zero(&k_a) {
        return Err(CryptoError::CryptoDegenerate("blinded public key is zero"));
    }

    tracing::debug!(
        server_key = %hex::encode(server_public_key),
        blinded_key = %hex::encode(k_a),
        "derived blinded keypair"
    );

    Ok(BlindedKeyPair {
        secret_scalar: ka,
        public_key: k_a,
    })
}

pub(crate) fn decode_server_key(hex_key: &str) -> Result<[u8; PUBLIC_KEY_SIZE], CryptoError> {
    let mut buff = [0u8; PUBLIC_KEY_SIZE];
    hex::decode_to_slice(hex_key.trim(), &mut buff).map_err(|_| CryptoError::InvalidServerKey)?;
    Ok(buff)
}

#[cfg(test)]
mod test {
    use super::*;

    const SERVER_KEY: [u8; 32] = [0x42; 32];

    #[test]
    fn test_blinding_deterministic() {
        let ops = Primitives::new();
        let root = KeyPair::from([1u8; 32]);

        let first = derive_blinded_key_pair(&ops, &SERVER_KEY, &root).unwrap();
        let second = derive_blinded_key_pair(&ops, &SERVER_KEY, &root).unwrap();

        assert_eq!(first, second, "Blinding must be deterministic");
    }

    #[test]
    fn test_blinding_varies_by_server() {
        let ops = Primitives::new();
        let root = KeyPair::from([1u8; 32]);

        let first = derive_blinded_key_pair(&ops, &SERVER_KEY, &root).unwrap();
        let second = derive_blinded_key_pair(&ops, &[0x43; 32], &root).unwrap();

        assert_ne!(first.public_key(), second.public_key());
    }

    #[test]
    fn test_blinded_secret_matches_public() {
        let ops = Primitives::new();
        let root = KeyPair::from([42u8; 32]);

        let blinded = derive_blinded_key_pair(&ops, &SERVER_KEY, &root).unwrap();
        let derived = ops.scalar_mult_base_noclamp(blinded.secret_scalar()).unwrap();

        assert_eq!(&derived, blinded.public_key());
    }

    #[test]
    fn test_blinded_key_is_k_times_root_key() {
        let ops = Primitives::new();
        let root = KeyPair::from([5u8; 32]);

        let k = derive_blinding_factor(&ops, &SERVER_KEY).unwrap();
        let blinded = derive_blinded_key_pair(&ops, &SERVER_KEY, &root).unwrap();
        let expected = ops.scalar_mult_noclamp(k.as_bytes(), &root.public_key()).unwrap();

        assert_eq!(&expected, blinded.public_key());
    }

    #[test]
    fn test_malformed_server_key() {
        let ops = Primitives::new();
        let root = KeyPair::from([1u8; 32]);

        for bad in [&[][..], &[1u8; 31][..], &[1u8; 33][..]] {
            assert!(matches!(
                derive_blinding_factor(&ops, bad),
                Err(CryptoError::InvalidServerKey)
            ));
            assert!(matches!(
                derive_blinded_key_pair(&ops, bad, &root),
                Err(CryptoError::InvalidServerKey)
            ));
        }
        assert!(matches!(
            derive_blinding_factor_hex(&ops, "not hex at all"),
            Err(CryptoError::InvalidServerKey)
        ));
    }

    #[test]
    fn test_private_scalar_rejects_short_key() {
        let ops = Primitives::new();
        assert!(matches!(
            derive_private_scalar(&ops, &[0u8; 32]),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }
}
