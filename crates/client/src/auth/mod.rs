//! Request signing for community servers
//!
//! Every request to a community server carries four headers proving which
//! identity sent it: a random nonce, a timestamp, the sender's id and a
//! signature over
//!
//! ```text
//! server_pk || nonce || timestamp || method || path || BLAKE2b-512(body)
//! ```
//!
//! Depending on what the server advertises, the id is either the account's
//! raw Ed25519 key (`00` prefix) or a key blinded for that server (`15`
//! prefix), so the server never learns the account's root identity.
//!
//! [`RequestAuthenticator`] signs requests and creates [`SignedCall`]s, which
//! dispatch a signed request over a [`crate::transport::Transport`] exactly
//! once and can be cancelled while in flight.

mod authenticator;
mod call;
mod headers;

pub use authenticator::{
    AuthenticatorConfig, IdentityMode, RequestAuthenticator, RequestBody, SignedRequest,
    UnsignedRequest,
};
pub use call::{CallState, SignedCall};
pub use headers::{
    body_digest, signing_message, AuthHeaders, NONCE_HEADER, NONCE_SIZE, PUBKEY_HEADER,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

use common::crypto::CryptoError;

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("requests can only be sent to {expected}, got {got}")]
    ServerMismatch { expected: String, got: String },
    #[error("unsupported HTTP method for a request with a body: {0}")]
    UnsupportedMethod(String),
    #[error("invalid header value for {0}")]
    InvalidHeader(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("call already executed, signed calls can only be executed once")]
    AlreadyExecuted,
    #[error("call cancelled")]
    Cancelled,
    #[error("signed calls cannot be executed synchronously")]
    SynchronousUnsupported,
    #[error("signed calls must be enqueued from within a tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
