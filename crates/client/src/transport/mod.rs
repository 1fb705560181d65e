//! Delivery of signed requests to their destination server
//!
//! The authenticator never talks to the network itself. It hands a
//! [`SignedRequest`] and the [`Destination`] it is bound for to a
//! [`Transport`], which in production is an onion-routed path and in
//! development can be plain HTTP ([`HttpTransport`]).
//!
//! Cancellation is dropping the future returned by [`Transport::send`].

mod http;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::auth::SignedRequest;

pub use self::http::HttpTransport;

/// Where a signed request is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Host of the server the request is addressed to
    pub host: String,
    /// Hex encoded X25519 public key of that server
    pub x25519_public_key: String,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Deserialize the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(|e| TransportError::Other(e.into()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status
    #[error("HTTP status {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// Whether the failure is an ordinary server answer rather than a fault
    pub fn is_expected(&self) -> bool {
        matches!(self, TransportError::Http { .. })
    }

    /// Log at a level matching how surprising the failure is
    ///
    /// Server answers are logged at `warn` with just the message; anything
    /// else is logged at `error` with its full chain.
    pub fn log(&self, context: &str) {
        if self.is_expected() {
            tracing::warn!("{} failed: {}", context, self);
        } else {
            tracing::error!("{} failed: {:?}", context, self);
        }
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: SignedRequest,
        destination: &Destination,
    ) -> Result<Response, TransportError>;
}
