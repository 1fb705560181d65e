use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

use super::primitives::Primitives;
use super::{CryptoError, Signature};
use crate::identity::{AccountId, IdPrefix};

/// Size of an Ed25519 seed in bytes
pub const SEED_SIZE: usize = 32;
/// Size of an Ed25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Size of an Ed25519 secret key (`seed || public key`) in bytes
pub const SECRET_KEY_SIZE: usize = 64;

const PEM_TAG: &str = "PRIVATE KEY";

/// Root Ed25519 identity of an account
///
/// The secret key is exposed in the 64-byte `seed || public key` layout
/// that the blinding and signing routines consume. The keypair is created
/// once (at account creation or restore) and handed to this crate by
/// reference; nothing here persists it except the explicit PEM helpers.
///
/// # Examples
///
/// ```ignore
/// let keypair = KeyPair::generate();
/// let account = keypair.account_id(&Primitives::new())?;
///
/// // Persist to PEM format
/// std::fs::write("key.pem", keypair.to_pem())?;
/// let recovered = KeyPair::from_pem(&std::fs::read_to_string("key.pem")?)?;
/// assert_eq!(keypair.public_key(), recovered.public_key());
/// ```
#[derive(Clone)]
pub struct KeyPair(SigningKey);

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

impl From<[u8; SEED_SIZE]> for KeyPair {
    fn from(seed: [u8; SEED_SIZE]) -> Self {
        Self(SigningKey::from_bytes(&seed))
    }
}

impl TryFrom<&[u8]> for KeyPair {
    type Error = CryptoError;

    /// Accepts either a 32-byte seed or a 64-byte `seed || public key`
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            SEED_SIZE => {
                let mut seed = [0u8; SEED_SIZE];
                seed.copy_from_slice(bytes);
                Ok(Self::from(seed))
            }
            SECRET_KEY_SIZE => {
                let mut buff = [0u8; SECRET_KEY_SIZE];
                buff.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&buff)
                    .map(Self)
                    .map_err(|_| anyhow::anyhow!("public half does not match seed").into())
            }
            got => Err(CryptoError::length("secret key", SECRET_KEY_SIZE, got)),
        }
    }
}

impl KeyPair {
    /// Generate a new random keypair using the OS RNG
    pub fn generate() -> Self {
        let mut seed = [0u8; SEED_SIZE];
        getrandom::getrandom(&mut seed).expect("failed to generate random bytes");
        Self::from(seed)
    }

    /// Parse a keypair from a hex encoded seed or secret key
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|_| anyhow::anyhow!("secret key hex decode error"))?;
        Self::try_from(bytes.as_slice())
    }

    /// Hex encoding of the 32-byte seed
    pub fn to_hex(&self) -> String {
        hex::encode(self.seed())
    }

    /// Encode the seed in PEM format for storage
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PEM_TAG, self.seed().to_vec()))
    }

    /// Parse a keypair from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PRIVATE KEY"
    /// - The contents are not a 32-byte seed
    pub fn from_pem(pem_str: &str) -> Result<Self, CryptoError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        if pem.tag() != PEM_TAG {
            return Err(anyhow::anyhow!("invalid PEM tag, expected {}", PEM_TAG).into());
        }

        let contents = pem.contents();
        if contents.len() != SEED_SIZE {
            return Err(CryptoError::length("PEM seed", SEED_SIZE, contents.len()));
        }
        Self::try_from(contents)
    }

    pub fn seed(&self) -> [u8; SEED_SIZE] {
        self.0.to_bytes()
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.verifying_key().to_bytes()
    }

    /// The 64-byte `seed || public key` secret key
    pub fn secret_key(&self) -> [u8; SECRET_KEY_SIZE] {
        self.0.to_keypair_bytes()
    }

    /// Sign a message with the root key (plain Ed25519)
    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.0.sign(msg)
    }

    /// Strictly verify an Ed25519 signature against an arbitrary public key
    pub fn verify(
        public_key: &[u8; PUBLIC_KEY_SIZE],
        msg: &[u8],
        signature: &Signature,
    ) -> Result<(), ed25519_dalek::SignatureError> {
        VerifyingKey::from_bytes(public_key)?.verify_strict(msg, signature)
    }

    /// Standard (`05`) account id: the X25519 form of the public key
    pub fn account_id(&self, ops: &Primitives) -> Result<AccountId, CryptoError> {
        let x25519 = ops.ed25519_pk_to_x25519(&self.public_key())?;
        Ok(AccountId::new(IdPrefix::Standard, x25519))
    }

    /// Unblinded (`00`) account id: the raw Ed25519 public key
    pub fn unblinded_id(&self) -> AccountId {
        AccountId::new(IdPrefix::Unblinded, self.public_key())
    }
}
