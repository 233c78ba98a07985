// What the host shell should render for the current session

use serde::Serialize;

use crate::types::Coordinates;

pub const PERMISSION_REQUEST_TEXT: &str = "Requesting for camera permission";
pub const GRANT_PERMISSION_LABEL: &str = "Grant Permission";
pub const NO_CAMERA_TEXT: &str = "No camera device found.";
pub const TAKE_PICTURE_LABEL: &str = "Take Picture";
pub const TAKE_ANOTHER_LABEL: &str = "Take Another Photo";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum View {
    /// Camera access not granted; offers the "Grant Permission" action
    PermissionRequest,
    /// No camera hardware; nothing else is possible this session
    NoCamera,
    /// Live preview with the capture trigger
    Camera { trigger_enabled: bool },
    /// Photo taken, locating and uploading
    Uploading,
    /// Server-confirmed photo with the coordinates it was tagged with
    Review {
        photo_url: String,
        coordinates: Option<Coordinates>,
    },
    /// Cycle failed; offers "Take Another Photo"
    Error { message: String },
}

impl View {
    pub fn message(&self) -> Option<String> {
        match self {
            View::PermissionRequest => Some(PERMISSION_REQUEST_TEXT.to_string()),
            View::NoCamera => Some(NO_CAMERA_TEXT.to_string()),
            View::Review {
                coordinates: Some(coords),
                ..
            } => Some(format!(
                "Latitude: {}, Longitude: {}",
                coords.latitude, coords.longitude
            )),
            View::Error { message } => Some(message.clone()),
            View::Camera { .. } | View::Uploading | View::Review { .. } => None,
        }
    }

    /// Label of the single action button, if any
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            View::PermissionRequest => Some(GRANT_PERMISSION_LABEL),
            View::Camera { .. } => Some(TAKE_PICTURE_LABEL),
            View::Review { .. } | View::Error { .. } => Some(TAKE_ANOTHER_LABEL),
            View::NoCamera | View::Uploading => None,
        }
    }
}
