//! Capture controller and the camera collaborator traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::types::CapturedImage;

/// Which side of the device the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    #[default]
    Back,
}

/// Camera hardware found by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub position: CameraPosition,
}

/// File written by the camera for one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no active camera session")]
    NoActiveSession,
    #[error("a capture is already in progress")]
    Busy,
    #[error("camera hardware failure: {0}")]
    Hardware(String),
}

/// Device enumeration and binding
#[async_trait]
pub trait CameraDevices: Send + Sync {
    fn enumerate_device(&self, position: CameraPosition) -> Option<CameraDevice>;

    async fn bind(&self, device: &CameraDevice) -> Result<Box<dyn CameraSession>, CaptureError>;
}

/// A bound, previewing camera
#[async_trait]
pub trait CameraSession: Send + Sync {
    /// Take one photo and write it to local storage
    async fn capture_photo(&self) -> Result<PhotoFile, CaptureError>;

    /// Pause or resume the live preview
    fn set_active(&self, active: bool);
}

/// Triggers single captures on a bound camera session
pub struct CaptureController {
    session: Option<Box<dyn CameraSession>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path
struct TriggerGuard<'a>(&'a AtomicBool);

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CaptureController {
    pub fn new(session: Box<dyn CameraSession>) -> Self {
        Self {
            session: Some(session),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Controller with nothing bound; every capture fails
    pub fn unbound() -> Self {
        Self {
            session: None,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the capture trigger is currently disabled
    pub fn is_capturing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        if let Some(session) = &self.session {
            debug!(active, "Camera preview toggled");
            session.set_active(active);
        }
    }

    /// Capture one photo
    ///
    /// Camera permission is not re-checked here; the workflow only builds a
    /// controller after the gate passed.
    pub async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        let session = self.session.as_ref().ok_or(CaptureError::NoActiveSession)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Capture trigger pressed while disabled, ignoring");
            return Err(CaptureError::Busy);
        }
        let _guard = TriggerGuard(&self.in_flight);

        match session.capture_photo().await {
            Ok(file) => {
                info!(path = %file.path, "Photo captured");
                Ok(CapturedImage::new(file.path))
            }
            Err(e) => {
                error!(error = %e, "Error taking photo");
                Err(e)
            }
        }
    }
}
