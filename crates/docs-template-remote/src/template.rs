use std::time::Duration;

use async_trait::async_trait;
use docs_template_config::TemplateSettings;
use docs_template_core::{FetchError, TemplateSource};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Fetches the canonical template with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    url: String,
    client: Client,
}

impl HttpTemplateSource {
    /// `timeout` bounds the whole request; `None` leaves it unbounded.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| FetchError::Transport(err.into()))?;
        Ok(Self::with_client(url, client))
    }

    pub fn from_settings(settings: &TemplateSettings) -> Result<Self, FetchError> {
        Self::new(settings.url.clone(), settings.timeout)
    }

    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        debug!(url = %self.url, "fetching template");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.into()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.into()))?;
        debug!(bytes = body.len(), "template fetched");
        Ok(body)
    }
}
