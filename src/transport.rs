//! HTTP transport for the XML service.

use crate::client::QrzXmlClientConfig;
use crate::error::{QrzXmlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Performs one GET against a fully built request URL and returns the body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, failing on any non-success status
    async fn get(&self, url: &Url) -> Result<String>;
}

/// [`Transport`] backed by a reqwest [`Client`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    /// Build the HTTP client from the user agent and timeout in `config`
    pub fn new(config: &QrzXmlClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            http_client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String> {
        // The query string holds credentials; only the endpoint is logged.
        debug!(
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            "Making request to QRZ.com"
        );

        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(QrzXmlError::transport(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown status"),
            ));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let config = QrzXmlClientConfig {
            timeout_seconds: Some(5),
            ..QrzXmlClientConfig::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
        assert!(HttpTransport::new(&QrzXmlClientConfig::default()).is_ok());
    }
}
