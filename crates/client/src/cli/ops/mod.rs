pub mod blind;
pub mod id;
pub mod init;
pub mod matches;
pub mod send;
pub mod sign;
pub mod version;
pub mod version_check;

pub use blind::Blind;
pub use id::Id;
pub use init::Init;
pub use matches::Match;
pub use send::SendRequest;
pub use sign::SignRequest;
pub use version::Version;
pub use version_check::VersionCheck;

use std::sync::Arc;

use anyhow::Context;
use http::Method;
use url::Url;

use blindauth_client::auth::{IdentityMode, RequestAuthenticator, UnsignedRequest};
use blindauth_client::clock::SystemClock;
use blindauth_client::transport::HttpTransport;

use crate::cli::op::OpContext;

/// Build an authenticator from the config directory
///
/// `blinded` forces blinded signing regardless of the configured mode.
pub(crate) fn load_authenticator(
    ctx: &OpContext,
    server_pubkey: Option<&str>,
    blinded: bool,
) -> anyhow::Result<RequestAuthenticator> {
    let (state, key) = ctx.state_and_key().context("failed to load config directory")?;
    let config = state.config.authenticator_config(server_pubkey)?;
    let transport = HttpTransport::new().context("failed to build HTTP client")?;

    let authenticator =
        RequestAuthenticator::new(config, key, Arc::new(SystemClock), Arc::new(transport))?;
    if blinded {
        authenticator.set_identity_mode(IdentityMode::Blinded);
    }
    Ok(authenticator)
}

/// Build a request against the authenticator's server
pub(crate) fn build_request(
    authenticator: &RequestAuthenticator,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> anyhow::Result<UnsignedRequest> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method {}", method))?;
    let url: Url = authenticator
        .server_url()
        .join(path)
        .with_context(|| format!("invalid request path {}", path))?;

    let request = UnsignedRequest::new(method, url);
    Ok(match body {
        Some(body) => request.with_body(body.to_string(), Some("application/json")),
        None => request,
    })
}
