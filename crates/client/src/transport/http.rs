use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::{Destination, Response, Transport, TransportError};
use crate::auth::SignedRequest;

/// Direct HTTP delivery, bypassing the onion path
///
/// Only meant for development against a local server: the destination sees
/// the client's network address.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Other(e.into()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        tracing::warn!("using direct HTTP transport, requests are not onion routed");
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: SignedRequest,
        destination: &Destination,
    ) -> Result<Response, TransportError> {
        tracing::debug!(
            host = %destination.host,
            method = %request.method,
            url = %request.url,
            "sending request"
        );

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            if let Some(content_type) = body.content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Other(e.into()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(e.into()))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
