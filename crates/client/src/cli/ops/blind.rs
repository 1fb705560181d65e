use clap::Args;

use blindauth_client::state::StateError;
use common::crypto::{derive_blinded_key_pair, CryptoError};
use common::identity::{AccountId, IdPrefix};

#[derive(Args, Debug, Clone)]
pub struct Blind {
    /// Hex encoded server public key (defaults to the configured one)
    #[arg(long)]
    pub server_pubkey: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BlindError {
    #[error("{0}")]
    State(#[from] StateError),
    #[error("Blinding failed: {0}")]
    Crypto(#[from] CryptoError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Blind {
    type Error = BlindError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, key) = ctx.state_and_key()?;
        let server_pubkey = self
            .server_pubkey
            .clone()
            .or(state.config.server_pubkey)
            .ok_or(StateError::MissingServerKey)?;

        let server_key = hex::decode(server_pubkey.trim()).map_err(|_| CryptoError::InvalidServerKey)?;
        let blinded = derive_blinded_key_pair(&ctx.ops, &server_key, &key)?;

        Ok(AccountId::new(IdPrefix::Blinded, *blinded.public_key()).to_string())
    }
}
