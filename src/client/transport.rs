use async_trait::async_trait;
use crate::client::ClientError;
use crate::error::ErrorEnvelope;
use crate::models::chat::{ RelayRequest, RelayResponse };
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Carries one relay request to the server.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, ClientError>;
}

pub struct HttpTransport {
    http: HttpClient,
    endpoint: String,
}

impl HttpTransport {
    /// `timeout` of `None` waits for the server indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: format!("{}/api/main", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl RelayTransport for HttpTransport {
    async fn send(&self, request: &RelayRequest) -> Result<RelayResponse, ClientError> {
        let resp = self.http.post(&self.endpoint).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(ClientError::Status { status: status.as_u16(), message });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
