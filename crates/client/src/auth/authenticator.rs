use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::header::HeaderMap;
use http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use common::crypto::{blind_sign, derive_blinded_key_pair, CryptoError, KeyPair, Primitives};
use common::identity::{AccountId, IdPrefix};

use super::headers::{body_digest, signing_message, AuthHeaders, NONCE_SIZE};
use super::{AuthError, SignedCall};
use crate::clock::Clock;
use crate::transport::{Destination, Transport};

/// Which identity requests are signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Key blinded for the server, `15` id
    Blinded,
    /// Root Ed25519 key, `00` id
    #[default]
    Unblinded,
}

impl fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityMode::Blinded => write!(f, "blinded"),
            IdentityMode::Unblinded => write!(f, "unblinded"),
        }
    }
}

impl FromStr for IdentityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blinded" => Ok(IdentityMode::Blinded),
            "unblinded" => Ok(IdentityMode::Unblinded),
            other => Err(format!("unknown identity mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// A request as the caller builds it, before authentication
#[derive(Debug, Clone)]
pub struct UnsignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl UnsignedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_body(mut self, bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        self.body = Some(RequestBody {
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        });
        self
    }

    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.with_body(bytes, Some("application/json")))
    }
}

/// A request ready for the transport
///
/// `auth` is `None` when the authenticator is configured not to sign.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub auth: Option<AuthHeaders>,
}

impl SignedRequest {
    fn passthrough(request: &UnsignedRequest) -> Self {
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            auth: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    /// Base url of the server; calls are only created for this host and port
    pub server_url: Url,
    /// Hex encoded 32-byte public key of the server
    pub server_public_key: String,
    /// Forward requests unchanged when false
    pub sign_requests: bool,
    pub identity_mode: IdentityMode,
}

/// Signs requests for one community server and creates calls to it
///
/// Cheap to clone; clones share the identity mode.
#[derive(Clone)]
pub struct RequestAuthenticator {
    inner: Arc<Inner>,
}

struct Inner {
    ops: Primitives,
    server_url: Url,
    server_public_key: [u8; 32],
    server_public_key_hex: String,
    root: KeyPair,
    clock: Arc<dyn Clock>,
    transport: Arc<dyn Transport>,
    sign_requests: bool,
    blinded: AtomicBool,
}

impl fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("server_url", &self.inner.server_url.as_str())
            .field("server_public_key", &self.inner.server_public_key_hex)
            .field("sign_requests", &self.inner.sign_requests)
            .field("identity_mode", &self.identity_mode())
            .finish_non_exhaustive()
    }
}

impl RequestAuthenticator {
    pub fn new(
        config: AuthenticatorConfig,
        root: KeyPair,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, AuthError> {
        let server_public_key: [u8; 32] = hex::decode(config.server_public_key.trim())
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(CryptoError::InvalidServerKey)?;

        Ok(Self {
            inner: Arc::new(Inner {
                ops: Primitives::new(),
                server_url: config.server_url,
                server_public_key,
                server_public_key_hex: hex::encode(server_public_key),
                root,
                clock,
                transport,
                sign_requests: config.sign_requests,
                blinded: AtomicBool::new(config.identity_mode == IdentityMode::Blinded),
            }),
        })
    }

    pub fn identity_mode(&self) -> IdentityMode {
        if self.inner.blinded.load(Ordering::Acquire) {
            IdentityMode::Blinded
        } else {
            IdentityMode::Unblinded
        }
    }

    /// Switch identities, e.g. once the server advertises blinding support
    ///
    /// Calls that have already signed their request keep their signature.
    pub fn set_identity_mode(&self, mode: IdentityMode) {
        tracing::debug!(%mode, server = %self.inner.server_url, "identity mode changed");
        self.inner
            .blinded
            .store(mode == IdentityMode::Blinded, Ordering::Release);
    }

    pub fn server_url(&self) -> &Url {
        &self.inner.server_url
    }

    pub fn destination(&self) -> Destination {
        Destination {
            host: self.inner.server_url.host_str().unwrap_or_default().to_string(),
            x25519_public_key: self.inner.server_public_key_hex.clone(),
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// The id requests are currently signed under
    pub fn public_id(&self) -> Result<AccountId, AuthError> {
        match self.identity_mode() {
            IdentityMode::Blinded => {
                let blinded = derive_blinded_key_pair(
                    &self.inner.ops,
                    &self.inner.server_public_key,
                    &self.inner.root,
                )?;
                Ok(AccountId::new(IdPrefix::Blinded, *blinded.public_key()))
            }
            IdentityMode::Unblinded => Ok(self.inner.root.unblinded_id()),
        }
    }

    /// Create a call for `request`, which must target the configured server
    pub fn new_call(&self, request: UnsignedRequest) -> Result<SignedCall, AuthError> {
        let expected = &self.inner.server_url;
        if request.url.host_str() != expected.host_str()
            || request.url.port_or_known_default() != expected.port_or_known_default()
        {
            return Err(AuthError::ServerMismatch {
                expected: host_and_port(expected),
                got: host_and_port(&request.url),
            });
        }
        Ok(SignedCall::new(self.clone(), request))
    }

    /// Sign `request` with a fresh random nonce
    pub fn sign(&self, request: &UnsignedRequest) -> Result<SignedRequest, AuthError> {
        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce)
            .map_err(|e| CryptoError::Key(anyhow::anyhow!("failed to generate nonce: {}", e)))?;
        self.sign_with_nonce(request, nonce)
    }

    /// Sign `request` with a caller-chosen nonce
    pub fn sign_with_nonce(
        &self,
        request: &UnsignedRequest,
        nonce: [u8; NONCE_SIZE],
    ) -> Result<SignedRequest, AuthError> {
        if !self.inner.sign_requests {
            return Ok(SignedRequest::passthrough(request));
        }

        let body = rebuild_body(&request.method, request.body.as_ref())?;

        let timestamp = self.inner.clock.now_seconds();
        let auth = self.auth_headers(
            request.method.as_str(),
            request.url.path(),
            request.body.as_ref().map(|b| b.bytes.as_ref()),
            nonce,
            timestamp,
        )?;

        let mut headers = request.headers.clone();
        auth.apply(&mut headers)?;

        Ok(SignedRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers,
            body,
            auth: Some(auth),
        })
    }

    /// Compute the authentication headers for one request
    ///
    /// `path` is the percent-encoded path without the query string.
    pub fn auth_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
        nonce: [u8; NONCE_SIZE],
        timestamp: u64,
    ) -> Result<AuthHeaders, AuthError> {
        let ops = &self.inner.ops;
        let root = &self.inner.root;

        let digest = body_digest(ops, body);
        let message = signing_message(
            &self.inner.server_public_key,
            &nonce,
            timestamp,
            method,
            path,
            &digest,
        );

        let mode = self.identity_mode();
        let (public_id, signature) = match mode {
            IdentityMode::Blinded => {
                let blinded =
                    derive_blinded_key_pair(ops, &self.inner.server_public_key, root)?;
                let signature = blind_sign(
                    ops,
                    &message,
                    &root.secret_key(),
                    blinded.secret_scalar(),
                    blinded.public_key(),
                )?;
                (
                    AccountId::new(IdPrefix::Blinded, *blinded.public_key()),
                    signature,
                )
            }
            IdentityMode::Unblinded => (root.unblinded_id(), root.sign(&message).to_bytes()),
        };

        tracing::debug!(%mode, method, path, timestamp, "signed request");

        Ok(AuthHeaders {
            nonce,
            timestamp,
            public_id,
            signature,
        })
    }
}

/// The body a signed request is sent with
///
/// GET never carries a body; methods other than POST, PUT, PATCH and DELETE
/// cannot carry one.
fn rebuild_body(
    method: &Method,
    body: Option<&RequestBody>,
) -> Result<Option<RequestBody>, AuthError> {
    let Some(body) = body else {
        return Ok(None);
    };

    let method = method.as_str();
    if ["POST", "PUT", "PATCH", "DELETE"]
        .iter()
        .any(|m| method.eq_ignore_ascii_case(m))
    {
        Ok(Some(body.clone()))
    } else if method.eq_ignore_ascii_case("GET") {
        Ok(None)
    } else {
        Err(AuthError::UnsupportedMethod(method.to_string()))
    }
}

fn host_and_port(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_identity_mode_parse() {
        assert_eq!("blinded".parse::<IdentityMode>().unwrap(), IdentityMode::Blinded);
        assert_eq!("Unblinded".parse::<IdentityMode>().unwrap(), IdentityMode::Unblinded);
        assert!("both".parse::<IdentityMode>().is_err());
        assert_eq!(IdentityMode::default(), IdentityMode::Unblinded);
    }

    #[test]
    fn test_rebuild_body() {
        let body = RequestBody {
            bytes: Bytes::from_static(b"{}"),
            content_type: Some("application/json".to_string()),
        };

        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert_eq!(rebuild_body(&method, Some(&body)).unwrap(), Some(body.clone()));
        }
        assert_eq!(rebuild_body(&Method::GET, Some(&body)).unwrap(), None);
        assert_eq!(rebuild_body(&Method::HEAD, None).unwrap(), None);
        assert!(matches!(
            rebuild_body(&Method::HEAD, Some(&body)),
            Err(AuthError::UnsupportedMethod(m)) if m == "HEAD"
        ));
    }

    #[test]
    fn test_host_and_port_uses_default_port() {
        let url = Url::parse("https://open.example.org/room/lobby").unwrap();
        assert_eq!(host_and_port(&url), "open.example.org:443");
    }
}
