use clap::Args;

use blindauth_client::state::StateError;
use common::identity::matches;

#[derive(Args, Debug, Clone)]
pub struct Match {
    /// Standard (05) account id
    pub standard_id: String,

    /// Blinded (15) account id
    pub blinded_id: String,

    /// Hex encoded server public key (defaults to the configured one)
    #[arg(long)]
    pub server_pubkey: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("{0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Match {
    type Error = MatchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let server_pubkey = match &self.server_pubkey {
            Some(key) => key.clone(),
            None => ctx
                .state()?
                .config
                .server_pubkey
                .ok_or(StateError::MissingServerKey)?,
        };

        if matches(&ctx.ops, &self.standard_id, &self.blinded_id, &server_pubkey) {
            Ok("match".to_string())
        } else {
            Ok("no match".to_string())
        }
    }
}
