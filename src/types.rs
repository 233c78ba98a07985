// Core data types shared by the capture workflow stages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type of every photo produced by the capture controller
pub const JPEG_MIME: &str = "image/jpeg";

/// Handle to a photo written to local storage by the camera
///
/// The workflow never holds the image bytes; the upload dispatcher reads them
/// through the storage collaborator when it builds the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    path: String,
}

impl CapturedImage {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    /// `file://` form of the local path, as handed to native image viewers
    pub fn uri(&self) -> String {
        if self.path.starts_with("file://") {
            self.path.clone()
        } else {
            format!("file://{}", self.path)
        }
    }
}

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Raw answer from the location provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coords: Coordinates,
    pub taken_at: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(coords: Coordinates, taken_at: DateTime<Utc>) -> Self {
        Self { coords, taken_at }
    }

    /// A fix taken right now
    pub fn fresh(coords: Coordinates) -> Self {
        Self::new(coords, Utc::now())
    }

    /// Age of the fix relative to `now`, clamped at zero for clock skew
    pub fn age_ms(&self, now: DateTime<Utc>) -> u64 {
        now.signed_duration_since(self.taken_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

/// Server answer to a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Display URL of the stored photo
    pub photo_url: String,
    /// Non-fatal problem the server reported alongside the URL
    pub error: Option<String>,
}
