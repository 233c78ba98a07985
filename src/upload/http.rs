use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

use super::{HttpResponse, MultipartPart, Transport, TransportError};
use crate::config::UploadConfig;

/// Transport that posts multipart forms with reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Create a transport using the configured request timeout
    pub fn from_config(config: &UploadConfig) -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(config.request_timeout_seconds))
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_form(parts: &[MultipartPart]) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                MultipartPart::File {
                    name,
                    filename,
                    content_type,
                    bytes,
                } => {
                    let file = Part::bytes(bytes.clone())
                        .file_name(filename.clone())
                        .mime_str(content_type)
                        .map_err(|e| TransportError::Request(e.to_string()))?;
                    form.part(name.clone(), file)
                }
                MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_multipart(&self, url: &str, parts: &[MultipartPart]) -> Result<HttpResponse, TransportError> {
        let form = Self::build_form(parts)?;
        debug!(url = %url, parts = parts.len(), "Posting multipart form");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        debug!(status, "Multipart response received");

        Ok(HttpResponse { status, body })
    }
}
