//! File server version checks
//!
//! The file server authenticates version checks with a version-blinded key
//! (`07` prefix) derived from the root identity. Unlike the per-server
//! blinding used for community servers, the version key is the same for
//! every file server, so it only links version checks to each other.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Deserialize;
use url::Url;

use common::crypto::{version_key_pair, version_sign, KeyPair, Platform, Primitives, SIGNATURE_SIZE};
use common::identity::{AccountId, IdPrefix};

use crate::auth::{AuthError, SignedRequest};
use crate::clock::Clock;
use crate::transport::{Destination, Response, Transport, TransportError};

pub const FS_PUBKEY_HEADER: &str = "X-FS-Pubkey";
pub const FS_TIMESTAMP_HEADER: &str = "X-FS-Timestamp";
pub const FS_SIGNATURE_HEADER: &str = "X-FS-Signature";

#[derive(Debug, thiserror::Error)]
pub enum FileServerError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Headers authenticating one file server request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileServerHeaders {
    /// `07` prefixed version key
    pub public_id: AccountId,
    pub timestamp: u64,
    pub signature: [u8; SIGNATURE_SIZE],
}

impl FileServerHeaders {
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            (FS_PUBKEY_HEADER, self.public_id.to_hex()),
            (FS_TIMESTAMP_HEADER, self.timestamp.to_string()),
            (FS_SIGNATURE_HEADER, STANDARD.encode(self.signature)),
        ]
    }

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

/// Latest client release as reported by the file server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VersionData {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default, rename = "result")]
    pub version: String,
    /// Release time in seconds since the epoch
    #[serde(default)]
    pub updated: f64,
}

impl VersionData {
    pub fn from_response(response: &Response) -> Result<Self, TransportError> {
        response.json()
    }
}

pub struct FileServerAuth {
    ops: Primitives,
    server_url: Url,
    root: KeyPair,
    clock: Arc<dyn Clock>,
}

impl FileServerAuth {
    pub fn new(server_url: Url, root: KeyPair, clock: Arc<dyn Clock>) -> Self {
        Self {
            ops: Primitives::new(),
            server_url,
            root,
            clock,
        }
    }

    /// The `07` id version checks are signed under
    pub fn version_public_id(&self) -> Result<AccountId, AuthError> {
        let keypair = version_key_pair(&self.ops, &self.root)?;
        Ok(AccountId::new(IdPrefix::VersionBlinded, keypair.public_key()))
    }

    pub fn version_check_headers(&self, platform: Platform) -> Result<FileServerHeaders, AuthError> {
        let timestamp = self.clock.now_seconds();
        let signature = version_sign(&self.ops, &self.root, platform, timestamp)?;
        Ok(FileServerHeaders {
            public_id: self.version_public_id()?,
            timestamp,
            signature,
        })
    }

    /// `GET /session_version?platform=<p>` with version-check headers attached
    pub fn version_check_request(&self, platform: Platform) -> Result<SignedRequest, AuthError> {
        let url = self.server_url.join(&platform.version_path())?;
        let mut headers = HeaderMap::new();
        self.version_check_headers(platform)?.apply(&mut headers)?;

        Ok(SignedRequest {
            method: Method::GET,
            url,
            headers,
            body: None,
            auth: None,
        })
    }

    /// Ask the file server for the latest client version
    pub async fn fetch_version(
        &self,
        transport: &dyn Transport,
        server_x25519_key: &str,
        platform: Platform,
    ) -> Result<VersionData, FileServerError> {
        let request = self.version_check_request(platform)?;
        let destination = Destination {
            host: self.server_url.host_str().unwrap_or_default().to_string(),
            x25519_public_key: server_x25519_key.to_string(),
        };

        let response = match transport.send(request, &destination).await {
            Ok(response) => response,
            Err(e) => {
                e.log("file server request");
                return Err(e.into());
            }
        };
        Ok(VersionData::from_response(&response)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::Clock;
    use common::crypto::Signature;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_seconds(&self) -> u64 {
            self.0
        }
    }

    fn auth() -> FileServerAuth {
        let root = KeyPair::from_hex(
            "0123456789abcdef0123456789abcdef00000000000000000000000000000000",
        )
        .unwrap();
        FileServerAuth::new(
            Url::parse("http://filev2.example.org").unwrap(),
            root,
            Arc::new(FixedClock(1_700_000_000)),
        )
    }

    #[test]
    fn test_version_check_request() {
        let auth = auth();
        let request = auth.version_check_request(Platform::Android).unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(
            request.url.as_str(),
            "http://filev2.example.org/session_version?platform=android"
        );
        assert_eq!(
            request.headers[FS_PUBKEY_HEADER],
            "07ab92099a2c017644c98414f11a178d21ce46529a0c4055c59e193bcd560b110e"
        );
        assert_eq!(request.headers[FS_TIMESTAMP_HEADER], "1700000000");

        let signature = STANDARD
            .decode(request.headers[FS_SIGNATURE_HEADER].as_bytes())
            .unwrap();
        let signature = Signature::from_slice(&signature).unwrap();
        let public_id = auth.version_public_id().unwrap();
        assert!(KeyPair::verify(
            public_id.public_key(),
            b"1700000000GET/session_version?platform=android",
            &signature
        )
        .is_ok());
    }

    #[test]
    fn test_version_data_parsing() {
        let data: VersionData =
            serde_json::from_str(r#"{"status_code":200,"result":"1.20.3","updated":1700000000.5}"#)
                .unwrap();
        assert_eq!(data.status_code, 200);
        assert_eq!(data.version, "1.20.3");
        assert_eq!(data.updated, 1_700_000_000.5);

        let empty: VersionData = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.status_code, 0);
        assert_eq!(empty.version, "");
    }
}
