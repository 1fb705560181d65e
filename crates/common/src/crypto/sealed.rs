//! Payload sealing using XChaCha20-Poly1305
//!
//! Used for payloads exchanged over the transport layer. The raw codec
//! (`encrypt` / `decrypt`) takes an explicit 24-byte nonce and produces
//! `ciphertext || tag`; [`SealingKey`] adds random nonces and a
//! self-contained `nonce || ciphertext || tag` framing on top.

use std::ops::Deref;

use super::primitives::Primitives;
use super::CryptoError;

/// Size of an XChaCha20-Poly1305 key in bytes (256 bits)
pub const SEALING_KEY_SIZE: usize = 32;
/// Size of an XChaCha20-Poly1305 nonce in bytes (192 bits)
pub const SEALING_NONCE_SIZE: usize = 24;
/// Size of the Poly1305 authentication tag in bytes
pub const SEALING_TAG_SIZE: usize = 16;

/// Encrypt `message`, returning `ciphertext || tag`
///
/// # Errors
///
/// `InvalidKeyLength` if the key is not 32 bytes or the nonce is not 24 bytes.
pub fn encrypt(
    ops: &Primitives,
    message: &[u8],
    key: &[u8],
    nonce: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    let (key, nonce) = key_and_nonce(key, nonce)?;
    ops.aead_encrypt(key, nonce, message, associated_data.unwrap_or_default())
}

/// Decrypt `ciphertext || tag`
///
/// Fails closed: any tag mismatch, or an input shorter than the tag, is
/// `AuthenticationFailed` and no plaintext is returned.
pub fn decrypt(
    ops: &Primitives,
    ciphertext: &[u8],
    key: &[u8],
    nonce: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    let (key, nonce) = key_and_nonce(key, nonce)?;
    if ciphertext.len() < SEALING_TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }
    ops.aead_decrypt(key, nonce, ciphertext, associated_data.unwrap_or_default())
}

fn key_and_nonce<'a>(
    key: &'a [u8],
    nonce: &'a [u8],
) -> Result<(&'a [u8; SEALING_KEY_SIZE], &'a [u8; SEALING_NONCE_SIZE]), CryptoError> {
    let key = key
        .try_into()
        .map_err(|_| CryptoError::length("sealing key", SEALING_KEY_SIZE, key.len()))?;
    let nonce = nonce
        .try_into()
        .map_err(|_| CryptoError::length("sealing nonce", SEALING_NONCE_SIZE, nonce.len()))?;
    Ok((key, nonce))
}

/// A 256-bit symmetric key for sealing transport payloads
///
/// # Examples
///
/// ```ignore
/// let ops = Primitives::new();
/// let key = SealingKey::generate();
///
/// let sealed = key.seal(&ops, b"payload", None)?;
/// let opened = key.open(&ops, &sealed, None)?;
/// assert_eq!(opened, b"payload");
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SealingKey([u8; SEALING_KEY_SIZE]);

impl Deref for SealingKey {
    type Target = [u8; SEALING_KEY_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SEALING_KEY_SIZE]> for SealingKey {
    fn from(bytes: [u8; SEALING_KEY_SIZE]) -> Self {
        SealingKey(bytes)
    }
}

impl SealingKey {
    /// Generate a new random key using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SEALING_KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SEALING_KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SEALING_KEY_SIZE] = data
            .try_into()
            .map_err(|_| CryptoError::length("sealing key", SEALING_KEY_SIZE, data.len()))?;
        Ok(bytes.into())
    }

    /// Seal `message` under a fresh random nonce
    ///
    /// The output format is: `nonce (24 bytes) || ciphertext || tag (16 bytes)`.
    pub fn seal(
        &self,
        ops: &Primitives,
        message: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; SEALING_NONCE_SIZE];
        getrandom::getrandom(&mut nonce)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;

        let ciphertext = encrypt(ops, message, &self.0, &nonce, associated_data)?;

        let mut out = Vec::with_capacity(SEALING_NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a `nonce || ciphertext || tag` blob produced by [`SealingKey::seal`]
    pub fn open(
        &self,
        ops: &Primitives,
        sealed: &[u8],
        associated_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < SEALING_NONCE_SIZE + SEALING_TAG_SIZE {
            return Err(CryptoError::AuthenticationFailed);
        }
        let (nonce, ciphertext) = sealed.split_at(SEALING_NONCE_SIZE);
        decrypt(ops, ciphertext, &self.0, nonce, associated_data)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let ops = Primitives::new();
        let key = [7u8; SEALING_KEY_SIZE];
        let nonce = [1u8; SEALING_NONCE_SIZE];
        let data = b"hello world, this is a test message for encryption";

        let encrypted = encrypt(&ops, data, &key, &nonce, None).unwrap();
        assert_eq!(encrypted.len(), data.len() + SEALING_TAG_SIZE);

        let decrypted = decrypt(&ops, &encrypted, &key, &nonce, None).unwrap();
        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_associated_data_is_authenticated() {
        let ops = Primitives::new();
        let key = [7u8; SEALING_KEY_SIZE];
        let nonce = [1u8; SEALING_NONCE_SIZE];

        let encrypted = encrypt(&ops, b"body", &key, &nonce, Some(b"header")).unwrap();
        assert!(decrypt(&ops, &encrypted, &key, &nonce, Some(b"header")).is_ok());
        assert!(matches!(
            decrypt(&ops, &encrypted, &key, &nonce, Some(b"other")),
            Err(CryptoError::AuthenticationFailed)
        ));
        assert!(matches!(
            decrypt(&ops, &encrypted, &key, &nonce, None),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_short_ciphertext_fails_closed() {
        let ops = Primitives::new();
        let key = [7u8; SEALING_KEY_SIZE];
        let nonce = [1u8; SEALING_NONCE_SIZE];

        for len in [0, 1, SEALING_TAG_SIZE - 1] {
            assert!(matches!(
                decrypt(&ops, &vec![0u8; len], &key, &nonce, None),
                Err(CryptoError::AuthenticationFailed)
            ));
        }
    }

    #[test]
    fn test_wrong_lengths_rejected() {
        let ops = Primitives::new();
        assert!(matches!(
            encrypt(&ops, b"x", &[0u8; 16], &[0u8; 24], None),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
        assert!(matches!(
            encrypt(&ops, b"x", &[0u8; 32], &[0u8; 12], None),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_seal_open() {
        let ops = Primitives::new();
        let key = SealingKey::generate();

        let sealed = key.seal(&ops, b"payload", None).unwrap();
        assert_eq!(
            sealed.len(),
            SEALING_NONCE_SIZE + b"payload".len() + SEALING_TAG_SIZE
        );
        assert_eq!(key.open(&ops, &sealed, None).unwrap(), b"payload");

        let other = SealingKey::generate();
        assert!(other.open(&ops, &sealed, None).is_err());
    }

    #[test]
    fn test_seal_uses_fresh_nonces() {
        let ops = Primitives::new();
        let key = SealingKey::generate();

        let first = key.seal(&ops, b"same", None).unwrap();
        let second = key.seal(&ops, b"same", None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_empty_message() {
        let ops = Primitives::new();
        let key = SealingKey::from_slice(&[3u8; SEALING_KEY_SIZE]).unwrap();

        let sealed = key.seal(&ops, b"", None).unwrap();
        assert_eq!(key.open(&ops, &sealed, None).unwrap(), Vec::<u8>::new());
        assert!(SealingKey::from_slice(&[3u8; 16]).is_err());
    }
}
