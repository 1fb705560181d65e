use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderMap, HeaderName, HeaderValue};

use common::crypto::{Primitives, SIGNATURE_SIZE};
use common::identity::AccountId;

use super::AuthError;

pub const NONCE_HEADER: &str = "X-SOGS-Nonce";
pub const TIMESTAMP_HEADER: &str = "X-SOGS-Timestamp";
pub const PUBKEY_HEADER: &str = "X-SOGS-Pubkey";
pub const SIGNATURE_HEADER: &str = "X-SOGS-Signature";

pub const NONCE_SIZE: usize = 16;

/// Authentication material attached to one outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub nonce: [u8; NONCE_SIZE],
    pub timestamp: u64,
    /// `15` blinded id or `00` unblinded id the signature verifies under
    pub public_id: AccountId,
    pub signature: [u8; SIGNATURE_SIZE],
}

impl AuthHeaders {
    /// Header name/value pairs in the order they are attached
    pub fn pairs(&self) -> [(&'static str, String); 4] {
        [
            (NONCE_HEADER, STANDARD.encode(self.nonce)),
            (TIMESTAMP_HEADER, self.timestamp.to_string()),
            (PUBKEY_HEADER, self.public_id.to_hex()),
            (SIGNATURE_HEADER, STANDARD.encode(self.signature)),
        ]
    }

    /// Insert the headers, replacing any existing values
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        for (name, value) in self.pairs() {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| AuthError::InvalidHeader(name.to_string()))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|_| AuthError::InvalidHeader(name.to_string()))?;
            headers.insert(header, value);
        }
        Ok(())
    }
}

/// BLAKE2b-512 of the request body; an absent or empty body has an empty digest
pub fn body_digest(ops: &Primitives, body: Option<&[u8]>) -> Vec<u8> {
    match body {
        Some(bytes) if !bytes.is_empty() => ops.generic_hash_wide(bytes).to_vec(),
        _ => Vec::new(),
    }
}

/// Bytes covered by the request signature
///
/// `server_pk || nonce || ascii(timestamp) || method || path || body_digest`
pub fn signing_message(
    server_public_key: &[u8],
    nonce: &[u8; NONCE_SIZE],
    timestamp: u64,
    method: &str,
    path: &str,
    body_digest: &[u8],
) -> Vec<u8> {
    let timestamp = timestamp.to_string();
    let mut message = Vec::with_capacity(
        server_public_key.len()
            + NONCE_SIZE
            + timestamp.len()
            + method.len()
            + path.len()
            + body_digest.len(),
    );
    message.extend_from_slice(server_public_key);
    message.extend_from_slice(nonce);
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(method.as_bytes());
    message.extend_from_slice(path.as_bytes());
    message.extend_from_slice(body_digest);
    message
}
