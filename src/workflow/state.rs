// Workflow state and its transition table

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::errors::FailureReport;
use crate::types::Coordinates;

/// Transitions kept for audit logging
const HISTORY_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    AwaitingPermission,
    Capturing,
    LocatingAndUploading,
    Reviewing,
    Error,
}

/// Inputs that move the workflow between modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    CameraPermissionGranted,
    PhotoCaptured,
    UploadConfirmed {
        photo_url: String,
        coordinates: Coordinates,
    },
    Failed(FailureReport),
    TakeAnotherPhoto,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("invalid transition: {event:?} not allowed in {mode:?}")]
    InvalidTransition { mode: Mode, event: WorkflowEvent },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: Mode,
    pub to: Mode,
    pub event: WorkflowEvent,
    pub timestamp: DateTime<Utc>,
}

/// The single mutable state of a capture session
///
/// Fields are only written by [`WorkflowState::apply`], which keeps
/// `confirmed_photo_url` set exactly while the mode is `Reviewing`.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    mode: Mode,
    confirmed_photo_url: Option<String>,
    last_coordinates: Option<Coordinates>,
    last_failure: Option<FailureReport>,
    history: VecDeque<TransitionRecord>,
}

impl WorkflowState {
    pub fn new(camera_granted: bool) -> Self {
        Self {
            mode: if camera_granted {
                Mode::Capturing
            } else {
                Mode::AwaitingPermission
            },
            confirmed_photo_url: None,
            last_coordinates: None,
            last_failure: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn confirmed_photo_url(&self) -> Option<&str> {
        self.confirmed_photo_url.as_deref()
    }

    pub fn last_coordinates(&self) -> Option<&Coordinates> {
        self.last_coordinates.as_ref()
    }

    pub fn last_failure(&self) -> Option<&FailureReport> {
        self.last_failure.as_ref()
    }

    /// Oldest first
    pub fn history(&self) -> &VecDeque<TransitionRecord> {
        &self.history
    }

    pub fn invariant_holds(&self) -> bool {
        self.confirmed_photo_url.is_some() == (self.mode == Mode::Reviewing)
    }

    /// Apply an event; on error the state is left untouched
    pub fn apply(&mut self, event: WorkflowEvent) -> Result<Mode, TransitionError> {
        let from = self.mode;

        let to = match (from, &event) {
            (Mode::AwaitingPermission, WorkflowEvent::CameraPermissionGranted) => Mode::Capturing,

            (Mode::Capturing, WorkflowEvent::PhotoCaptured) => Mode::LocatingAndUploading,

            (Mode::LocatingAndUploading, WorkflowEvent::UploadConfirmed { photo_url, coordinates }) => {
                self.confirmed_photo_url = Some(photo_url.clone());
                self.last_coordinates = Some(*coordinates);
                Mode::Reviewing
            }

            (Mode::Capturing | Mode::LocatingAndUploading, WorkflowEvent::Failed(report)) => {
                error!(kind = ?report.kind, message = %report.message, "Capture cycle failed");
                self.last_failure = Some(report.clone());
                Mode::Error
            }

            (Mode::Reviewing | Mode::Error, WorkflowEvent::TakeAnotherPhoto) => {
                self.confirmed_photo_url = None;
                self.last_failure = None;
                Mode::Capturing
            }

            (mode, event) => {
                error!(mode = ?mode, event = ?event, "Invalid workflow transition");
                return Err(TransitionError::InvalidTransition {
                    mode,
                    event: event.clone(),
                });
            }
        };

        self.record_transition(from, to, event);
        debug_assert!(self.invariant_holds());
        Ok(to)
    }

    fn record_transition(&mut self, from: Mode, to: Mode, event: WorkflowEvent) {
        info!(from = ?from, to = ?to, "Workflow transition");
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from,
            to,
            event,
            timestamp: Utc::now(),
        });
        self.mode = to;
    }
}
