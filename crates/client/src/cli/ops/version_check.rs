use clap::Args;

use blindauth_client::clock::SystemClock;
use blindauth_client::file_server::{FileServerAuth, FileServerError};
use blindauth_client::state::StateError;
use blindauth_client::transport::{HttpTransport, TransportError};
use blindauth_client::AuthError;
use common::crypto::Platform;

#[derive(Args, Debug, Clone)]
pub struct VersionCheck {
    /// Platform to ask about: android, desktop or ios
    #[arg(long, default_value = "android")]
    pub platform: Platform,

    /// Send the check to the configured file server instead of printing headers
    #[arg(long)]
    pub fetch: bool,

    /// Hex encoded X25519 key of the file server
    #[arg(long, default_value = "")]
    pub file_server_pubkey: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionCheckError {
    #[error("{0}")]
    State(#[from] StateError),
    #[error("Version check failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Version check failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Version check failed: {0}")]
    FileServer(#[from] FileServerError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for VersionCheck {
    type Error = VersionCheckError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, key) = ctx.state_and_key()?;
        let auth = FileServerAuth::new(
            state.config.file_server_url.clone(),
            key,
            std::sync::Arc::new(SystemClock),
        );

        if self.fetch {
            let transport = HttpTransport::new()?;
            let data = auth
                .fetch_version(&transport, &self.file_server_pubkey, self.platform)
                .await?;
            return Ok(format!(
                "version: {}\nupdated: {}\nstatus:  {}",
                data.version, data.updated, data.status_code
            ));
        }

        let headers = auth.version_check_headers(self.platform)?;
        let mut lines = vec![format!("GET {}", self.platform.version_path())];
        lines.extend(
            headers
                .pairs()
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value)),
        );
        Ok(lines.join("\n"))
    }
}
