//! Version-check blinding for the file server
//!
//! The file server's version endpoint wants a stable pseudonym that does not
//! depend on any server key. The pseudonym is a plain Ed25519 keypair whose
//! seed is a keyed BLAKE2b hash of the root seed, presented with the `07`
//! prefix.

use std::fmt;

use super::keys::KeyPair;
use super::primitives::Primitives;
use super::{CryptoError, SIGNATURE_SIZE};

const VERSION_BLINDING_KEY: &[u8] = b"VersionCheckKey_sig";
const VERSION_PATH: &str = "/session_version";

/// Client platform reported to the version endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Android,
    Desktop,
    Ios,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Android => "android",
            Platform::Desktop => "desktop",
            Platform::Ios => "ios",
        })
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "desktop" => Ok(Platform::Desktop),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

impl Platform {
    /// Request path (with query) of the version endpoint for this platform
    pub fn version_path(&self) -> String {
        format!("{}?platform={}", VERSION_PATH, self)
    }
}

/// Derive the version-blinded keypair of `root`
pub fn version_key_pair(ops: &Primitives, root: &KeyPair) -> Result<KeyPair, CryptoError> {
    let seed = ops.generic_hash_keyed(VERSION_BLINDING_KEY, &root.seed())?;
    Ok(KeyPair::from(seed))
}

/// Sign a version check for `platform` at `timestamp` (seconds)
///
/// The signed message is `timestamp || "GET" || "/session_version?platform=<p>"`.
pub fn version_sign(
    ops: &Primitives,
    root: &KeyPair,
    platform: Platform,
    timestamp: u64,
) -> Result<[u8; SIGNATURE_SIZE], CryptoError> {
    version_sign_request(ops, root, timestamp, "GET", &platform.version_path(), None)
}

/// Sign an arbitrary file server request with the version-blinded key
///
/// The signed message is `timestamp || method || path || body`.
pub fn version_sign_request(
    ops: &Primitives,
    root: &KeyPair,
    timestamp: u64,
    method: &str,
    path: &str,
    body: Option<&[u8]>,
) -> Result<[u8; SIGNATURE_SIZE], CryptoError> {
    let keypair = version_key_pair(ops, root)?;

    let timestamp = timestamp.to_string();
    let body = body.unwrap_or_default();
    let mut message =
        Vec::with_capacity(timestamp.len() + method.len() + path.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(method.as_bytes());
    message.extend_from_slice(path.as_bytes());
    message.extend_from_slice(body);

    Ok(keypair.sign(&message).to_bytes())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::Signature;

    #[test]
    fn test_version_key_is_stable_and_distinct() {
        let ops = Primitives::new();
        let root = KeyPair::generate();

        let first = version_key_pair(&ops, &root).unwrap();
        let second = version_key_pair(&ops, &root).unwrap();
        assert_eq!(first.public_key(), second.public_key());
        assert_ne!(first.public_key(), root.public_key());
    }

    #[test]
    fn test_version_signature_verifies() {
        let ops = Primitives::new();
        let root = KeyPair::generate();
        let timestamp = 1_700_000_000;

        let signature = version_sign(&ops, &root, Platform::Desktop, timestamp).unwrap();
        let public_key = version_key_pair(&ops, &root).unwrap().public_key();
        let message = b"1700000000GET/session_version?platform=desktop";

        assert!(KeyPair::verify(&public_key, message, &Signature::from_bytes(&signature)).is_ok());
    }

    #[test]
    fn test_platform_parsing() {
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!(Platform::Ios.version_path(), "/session_version?platform=ios");
        assert!("beos".parse::<Platform>().is_err());
    }
}
