use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::PUBLIC_KEY_SIZE;

/// Length of the textual form: 2 hex chars of prefix + 64 of key
pub const ACCOUNT_ID_HEX_LEN: usize = 2 + PUBLIC_KEY_SIZE * 2;

/// Errors that can occur while parsing an account id
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("invalid account id length, expected 66, got {0}")]
    InvalidLength(usize),
    #[error("account id is not valid hex")]
    InvalidHex,
    #[error("unknown account id prefix {0:02x}")]
    UnknownPrefix(u8),
}

/// The kind of key an account id carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdPrefix {
    /// Root identity, X25519 form of the Ed25519 key
    Standard,
    /// Blinded for one community server
    Blinded,
    /// Second-generation blinding
    BlindedV2,
    /// Raw Ed25519 key for servers that do not require blinding
    Unblinded,
    /// Group identity
    Group,
    /// Blinded for file server version checks
    VersionBlinded,
}

impl IdPrefix {
    pub const fn byte(self) -> u8 {
        match self {
            IdPrefix::Standard => 0x05,
            IdPrefix::Blinded => 0x15,
            IdPrefix::BlindedV2 => 0x25,
            IdPrefix::Unblinded => 0x00,
            IdPrefix::Group => 0x03,
            IdPrefix::VersionBlinded => 0x07,
        }
    }
}

impl TryFrom<u8> for IdPrefix {
    type Error = AccountIdError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x05 => IdPrefix::Standard,
            0x15 => IdPrefix::Blinded,
            0x25 => IdPrefix::BlindedV2,
            0x00 => IdPrefix::Unblinded,
            0x03 => IdPrefix::Group,
            0x07 => IdPrefix::VersionBlinded,
            other => return Err(AccountIdError::UnknownPrefix(other)),
        })
    }
}

/// A prefixed 32-byte public key, written as 66 lowercase hex characters
///
/// ```ignore
/// let id: AccountId = "05d2ad010eeb72d72e561d9de7bd7b6989af77dcabffa03a5111a6c859ae5c3a72".parse()?;
/// assert_eq!(id.prefix(), IdPrefix::Standard);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId {
    prefix: IdPrefix,
    public_key: [u8; PUBLIC_KEY_SIZE],
}

impl AccountId {
    pub fn new(prefix: IdPrefix, public_key: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self { prefix, public_key }
    }

    pub fn prefix(&self) -> IdPrefix {
        self.prefix
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }

    pub fn to_hex(&self) -> String {
        let hex = format!(
            "{:02x}{}",
            self.prefix.byte(),
            hex::encode(self.public_key)
        );
        debug_assert_eq!(hex.len(), ACCOUNT_ID_HEX_LEN);
        hex
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ACCOUNT_ID_HEX_LEN {
            return Err(AccountIdError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 1 + PUBLIC_KEY_SIZE];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| AccountIdError::InvalidHex)?;

        let prefix = IdPrefix::try_from(bytes[0])?;
        let mut public_key = [0u8; PUBLIC_KEY_SIZE];
        public_key.copy_from_slice(&bytes[1..]);
        Ok(Self::new(prefix, public_key))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
