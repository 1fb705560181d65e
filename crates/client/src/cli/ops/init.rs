use clap::Args;
use url::Url;

use blindauth_client::auth::IdentityMode;
use blindauth_client::state::{AppConfig, AppState, StateError};
use common::crypto::{CryptoError, KeyPair};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Base url of the community server
    #[arg(long)]
    pub server_url: Option<Url>,

    /// Hex encoded public key of the community server
    #[arg(long)]
    pub server_pubkey: Option<String>,

    /// Restore an existing identity from its hex encoded seed
    #[arg(long)]
    pub seed_hex: Option<String>,

    /// Identity to sign with: blinded or unblinded
    #[arg(long)]
    pub identity_mode: Option<IdentityMode>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Init failed: {0}")]
    State(#[from] StateError),
    #[error("Key error: {0}")]
    Crypto(#[from] CryptoError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::default();
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        config.server_pubkey = self.server_pubkey.clone();
        if let Some(mode) = self.identity_mode {
            config.identity_mode = mode;
        }

        let key = self.seed_hex.as_deref().map(KeyPair::from_hex).transpose()?;

        let state = AppState::init(ctx.config_path.clone(), Some(config), key)?;
        let account = state.load_key()?.account_id(&ctx.ops)?;

        Ok(format!(
            "Initialized {}\nAccount ID: {}",
            state.config_dir.display(),
            account
        ))
    }
}
