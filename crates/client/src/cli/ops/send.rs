use clap::Args;

use super::{build_request, load_authenticator};

#[derive(Args, Debug, Clone)]
pub struct SendRequest {
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
pub enum SendError {
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendRequest {
    type Error = SendError;
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

        let call = authenticator.new_call(request).map_err(anyhow::Error::from)?;
        let response = call.send().await.map_err(anyhow::Error::from)?;

        Ok(format!(
            "{}\n{}",
            response.status,
            String::from_utf8_lossy(&response.body)
        ))
    }
}
