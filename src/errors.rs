// Error taxonomy for the capture workflow

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::camera::CaptureError;
use crate::location::LocationError;
use crate::upload::TransferError;
use crate::workflow::TransitionError;

/// Device permission the workflow depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Camera,
    Location,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Camera => write!(f, "camera"),
            Permission::Location => write!(f, "location"),
        }
    }
}

/// Failure reported by a device collaborator (permission or location provider)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("permission denied by the platform")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("provider timed out")]
    Timeout,
    #[error("provider failure: {0}")]
    Other(String),
}

/// Top-level error for workflow actions
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{permission} permission denied (permanent: {permanent})")]
    PermissionDenied { permission: Permission, permanent: bool },

    #[error("no camera device found")]
    NoDeviceAvailable,

    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("location failed: {0}")]
    Location(#[from] LocationError),

    #[error("upload failed: {0}")]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

/// Coarse classification used for reporting and view selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    NoDeviceAvailable,
    Capture,
    Location,
    Transfer,
    InvalidTransition,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            WorkflowError::NoDeviceAvailable => ErrorKind::NoDeviceAvailable,
            WorkflowError::Capture(_) => ErrorKind::Capture,
            WorkflowError::Location(_) => ErrorKind::Location,
            WorkflowError::Transfer(_) => ErrorKind::Transfer,
            WorkflowError::InvalidTransition(_) => ErrorKind::InvalidTransition,
        }
    }
}

/// Failure recorded in the workflow state when a cycle ends in `Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&WorkflowError> for FailureReport {
    fn from(err: &WorkflowError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
