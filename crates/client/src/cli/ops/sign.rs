use clap::Args;

use super::{build_request, load_authenticator};

#[derive(Args, Debug, Clone)]
pub struct SignRequest {
    /// HTTP method
    pub method: String,

    /// Request path, e.g. /room/lobby
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Sign with the blinded key regardless of the configured mode
    #[arg(long)]
    pub blinded: bool,

    /// Hex encoded server public key (defaults to the configured one)
    #[arg(long)]
    pub server_pubkey: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SignRequest {
    type Error = SignError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let authenticator =
            load_authenticator(ctx, self.server_pubkey.as_deref(), self.blinded)?;
        let request = build_request(
            &authenticator,
            &self.method,
            &self.path,
            self.body.as_deref(),
        )?;

        let signed = authenticator.sign(&request).map_err(anyhow::Error::from)?;
        let Some(auth) = signed.auth else {
            return Ok("request signing is disabled".to_string());
        };

        let lines: Vec<String> = auth
            .pairs()
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        Ok(lines.join("\n"))
    }
}
