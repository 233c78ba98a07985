//! Upload dispatcher
//!
//! Packages a captured photo and its coordinates into a multipart body and
//! submits it once to the photo endpoint.

pub mod http;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::storage::Storage;
use crate::types::{CapturedImage, Coordinates, UploadResult, JPEG_MIME};

pub use http::ReqwestTransport;

/// Upload host baked in at build time (`GEO_SNAP_ENDPOINT_HOST`)
pub const DEFAULT_ENDPOINT_HOST: &str = match option_env!("GEO_SNAP_ENDPOINT_HOST") {
    Some(host) => host,
    None => "http://172.25.0.3",
};

pub const PHOTOS_PATH: &str = "/api/photos";
pub const PHOTO_FIELD: &str = "photo";
pub const PHOTO_FILENAME: &str = "photo.jpg";
pub const LATITUDE_FIELD: &str = "latitude";
pub const LONGITUDE_FIELD: &str = "longitude";

/// One part of a multipart/form-data body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
    Text {
        name: String,
        value: String,
    },
}

impl MultipartPart {
    pub fn name(&self) -> &str {
        match self {
            MultipartPart::File { name, .. } | MultipartPart::Text { name, .. } => name,
        }
    }
}

/// Raw HTTP answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("invalid request: {0}")]
    Request(String),
}

/// HTTP transport used for the upload
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_multipart(&self, url: &str, parts: &[MultipartPart]) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("captured image missing on storage: {path}")]
    ResourceMissing { path: String },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("network error: {0}")]
    Connection(String),
    #[error("server responded with status {status}")]
    Status { status: u16, body: String },
    #[error("malformed server response: {0}")]
    MalformedResponse(String),
}

impl From<TransportError> for TransferError {
    fn from(err: TransportError) -> Self {
        TransferError::Connection(err.to_string())
    }
}

/// Where photos are posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEndpoint {
    pub host: String,
    pub path: String,
}

impl UploadEndpoint {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.path)
    }
}

impl Default for UploadEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT_HOST, PHOTOS_PATH)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoResponse {
    photo_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Build the three-part payload: photo file, latitude, longitude
pub fn build_parts(bytes: Vec<u8>, coords: &Coordinates) -> Vec<MultipartPart> {
    vec![
        MultipartPart::File {
            name: PHOTO_FIELD.to_string(),
            filename: PHOTO_FILENAME.to_string(),
            content_type: JPEG_MIME.to_string(),
            bytes,
        },
        MultipartPart::Text {
            name: LATITUDE_FIELD.to_string(),
            value: coords.latitude.to_string(),
        },
        MultipartPart::Text {
            name: LONGITUDE_FIELD.to_string(),
            value: coords.longitude.to_string(),
        },
    ]
}

/// Parse the server answer into an [`UploadResult`]
pub fn parse_response(response: HttpResponse) -> Result<UploadResult, TransferError> {
    if !response.is_success() {
        return Err(TransferError::Status {
            status: response.status,
            body: response.body,
        });
    }

    let parsed: PhotoResponse = serde_json::from_str(&response.body)
        .map_err(|e| TransferError::MalformedResponse(e.to_string()))?;

    match parsed.photo_url {
        Some(photo_url) if !photo_url.trim().is_empty() => Ok(UploadResult {
            photo_url,
            error: parsed.error,
        }),
        _ => Err(TransferError::MalformedResponse(
            "response has no photoUrl".to_string(),
        )),
    }
}

pub struct UploadDispatcher {
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    endpoint: UploadEndpoint,
}

impl UploadDispatcher {
    pub fn new(storage: Arc<dyn Storage>, transport: Arc<dyn Transport>, endpoint: UploadEndpoint) -> Self {
        Self {
            storage,
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &UploadEndpoint {
        &self.endpoint
    }

    /// Upload one photo with its coordinates. Exactly one attempt.
    pub async fn send(&self, image: &CapturedImage, coords: &Coordinates) -> Result<UploadResult, TransferError> {
        let stat = self
            .storage
            .stat(image.path())
            .await
            .map_err(|e| TransferError::Storage(e.to_string()))?;
        if !stat.exists {
            error!(path = %image.path(), "File access error: captured image is gone");
            return Err(TransferError::ResourceMissing {
                path: image.path().to_string(),
            });
        }
        debug!(path = %stat.path, uri = %image.uri(), "Captured image present on storage");

        let bytes = self
            .storage
            .read(&stat.path)
            .await
            .map_err(|e| TransferError::Storage(e.to_string()))?;
        let size = bytes.len();
        let parts = build_parts(bytes, coords);

        let url = self.endpoint.url();
        info!(url = %url, bytes = size, latitude = coords.latitude, longitude = coords.longitude, "Sending photo and location");

        let response = self.transport.post_multipart(&url, &parts).await.map_err(|e| {
            error!(error = %e, "Error sending photo and location");
            TransferError::from(e)
        })?;

        match parse_response(response) {
            Ok(result) => {
                if let Some(server_error) = &result.error {
                    warn!(error = %server_error, "Server accepted photo but reported a problem");
                }
                info!(photo_url = %result.photo_url, "Photo and location sent successfully");
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "Upload rejected");
                Err(e)
            }
        }
    }
}
