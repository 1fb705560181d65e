use clap::Args;

use blindauth_client::state::StateError;
use common::crypto::CryptoError;

#[derive(Args, Debug, Clone)]
pub struct Id;

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("{0}")]
    State(#[from] StateError),
    #[error("Failed to derive account id: {0}")]
    Crypto(#[from] CryptoError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Id {
    type Error = IdError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, key) = ctx.state_and_key()?;

        Ok(format!(
            "standard:  {}\nunblinded: {}",
            key.account_id(&ctx.ops)?,
            key.unblinded_id()
        ))
    }
}
