// Async driver for the capture -> locate -> upload cycle

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

use crate::camera::{CameraDevices, CameraPosition, CaptureController};
use crate::config::GeoSnapConfig;
use crate::errors::{FailureReport, Permission, WorkflowError};
use crate::location::{GeolocationFetcher, LocationProvider};
use crate::permissions::{Effect, PermissionGate, PermissionProvider};
use crate::storage::Storage;
use crate::telemetry::{create_capture_span, generate_correlation_id};
use crate::types::{CapturedImage, Coordinates, UploadResult};
use crate::upload::{Transport, UploadDispatcher, UploadEndpoint};

use super::state::{Mode, WorkflowEvent, WorkflowState};
use super::view::View;

/// Host-provided implementations of every device collaborator
#[derive(Clone)]
pub struct Collaborators {
    pub cameras: Arc<dyn CameraDevices>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub location: Arc<dyn LocationProvider>,
    pub storage: Arc<dyn Storage>,
    pub transport: Arc<dyn Transport>,
}

/// Tunables the driver reads from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub camera_position: CameraPosition,
    pub location_timeout: Duration,
    pub location_max_age: Duration,
    pub endpoint: UploadEndpoint,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&GeoSnapConfig::default())
    }
}

impl From<&GeoSnapConfig> for WorkflowSettings {
    fn from(config: &GeoSnapConfig) -> Self {
        Self {
            camera_position: config.camera.position,
            location_timeout: Duration::from_millis(config.location.timeout_ms),
            location_max_age: Duration::from_millis(config.location.maximum_age_ms),
            endpoint: UploadEndpoint::new(config.upload.host.clone(), config.upload.path.clone()),
        }
    }
}

/// One capture session: owns the workflow state and drives the components
pub struct CaptureWorkflow {
    state: WorkflowState,
    settings: WorkflowSettings,
    cameras: Arc<dyn CameraDevices>,
    device_found: bool,
    controller: CaptureController,
    gate: PermissionGate,
    locator: GeolocationFetcher,
    dispatcher: UploadDispatcher,
    effects: Vec<Effect>,
}

impl CaptureWorkflow {
    /// Enumerate the camera, read the camera grant and bind when allowed
    pub async fn start(collaborators: Collaborators, settings: WorkflowSettings) -> Self {
        let gate = PermissionGate::new(collaborators.permissions);
        let device_found = collaborators
            .cameras
            .enumerate_device(settings.camera_position)
            .is_some();
        let camera_granted = gate.check_camera_permission();

        let mut workflow = Self {
            state: WorkflowState::new(camera_granted),
            cameras: collaborators.cameras,
            device_found,
            controller: CaptureController::unbound(),
            gate,
            locator: GeolocationFetcher::new(collaborators.location),
            dispatcher: UploadDispatcher::new(
                collaborators.storage,
                collaborators.transport,
                settings.endpoint.clone(),
            ),
            settings,
            effects: Vec::new(),
        };

        if !device_found {
            error!(position = ?workflow.settings.camera_position, "No camera device found");
        } else if camera_granted {
            workflow.bind_camera().await;
        } else {
            info!("Camera permission not granted, awaiting user");
        }

        workflow
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Whether the capture trigger accepts a press right now
    pub fn trigger_enabled(&self) -> bool {
        self.device_found
            && self.state.mode() == Mode::Capturing
            && self.controller.has_session()
            && !self.controller.is_capturing()
    }

    /// Project the state onto the screen to render
    pub fn view(&self) -> View {
        if !self.device_found {
            return View::NoCamera;
        }
        match self.state.mode() {
            Mode::AwaitingPermission => View::PermissionRequest,
            Mode::Capturing => View::Camera {
                trigger_enabled: self.trigger_enabled(),
            },
            Mode::LocatingAndUploading => View::Uploading,
            Mode::Reviewing => View::Review {
                photo_url: self.state.confirmed_photo_url().unwrap_or_default().to_string(),
                coordinates: self.state.last_coordinates().copied(),
            },
            Mode::Error => View::Error {
                message: self
                    .state
                    .last_failure()
                    .map(|f| f.message.clone())
                    .unwrap_or_else(|| "Something went wrong".to_string()),
            },
        }
    }

    /// Effects declared since the last drain, for the host shell to render
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// User chose "Open Settings" on a permission notice
    pub fn open_settings(&self) {
        self.gate.open_settings();
    }

    /// User pressed "Grant Permission"
    pub async fn request_camera_permission(&mut self) -> Result<Mode, WorkflowError> {
        self.ensure_device()?;
        if self.state.mode() != Mode::AwaitingPermission {
            return Ok(self.state.mode());
        }
        if !self.gate.request_camera_permission().await {
            warn!("Camera permission denied");
            return Err(WorkflowError::PermissionDenied {
                permission: Permission::Camera,
                permanent: false,
            });
        }
        let mode = self.state.apply(WorkflowEvent::CameraPermissionGranted)?;
        self.bind_camera().await;
        Ok(mode)
    }

    /// User pressed "Take Picture"
    ///
    /// `Err` means the press was rejected before anything ran. Once a capture
    /// is attempted the outcome is recorded in the state and `Ok` carries the
    /// resulting mode (`Reviewing` or `Error`).
    pub async fn take_picture(&mut self) -> Result<Mode, WorkflowError> {
        self.ensure_device()?;
        match self.state.mode() {
            Mode::Capturing => {}
            Mode::AwaitingPermission => {
                return Err(WorkflowError::PermissionDenied {
                    permission: Permission::Camera,
                    permanent: false,
                })
            }
            mode => {
                warn!(mode = ?mode, "Capture trigger pressed outside capture mode");
                return Err(WorkflowError::InvalidTransition(
                    super::state::TransitionError::InvalidTransition {
                        mode,
                        event: WorkflowEvent::PhotoCaptured,
                    },
                ));
            }
        }

        let cycle_id = generate_correlation_id();
        let span = create_capture_span("take_picture", &cycle_id);
        self.run_cycle().instrument(span).await
    }

    async fn run_cycle(&mut self) -> Result<Mode, WorkflowError> {
        let image = match self.controller.capture().await {
            Ok(image) => image,
            Err(e) => return Ok(self.fail(WorkflowError::Capture(e))),
        };

        self.state.apply(WorkflowEvent::PhotoCaptured)?;
        self.controller.set_active(false);

        match self.locate_and_upload(&image).await {
            Ok((result, coordinates)) => {
                let mode = self.state.apply(WorkflowEvent::UploadConfirmed {
                    photo_url: result.photo_url,
                    coordinates,
                })?;
                Ok(mode)
            }
            Err(e) => Ok(self.fail(e)),
        }
        // `image` is dropped here whether the upload succeeded or not
    }

    /// Location permission, then one fix, then one upload. Strictly in order.
    async fn locate_and_upload(&mut self, image: &CapturedImage) -> Result<(UploadResult, Coordinates), WorkflowError> {
        let outcome = self.gate.request_location_permission().await;
        self.effects.extend(outcome.effects);
        if !outcome.granted {
            return Err(WorkflowError::PermissionDenied {
                permission: Permission::Location,
                permanent: outcome.permanent_denial,
            });
        }

        let coordinates = self
            .locator
            .fetch_once(self.settings.location_timeout, self.settings.location_max_age)
            .await?;

        let result = self.dispatcher.send(image, &coordinates).await?;
        Ok((result, coordinates))
    }

    /// User pressed "Take Another Photo"
    pub async fn take_another_photo(&mut self) -> Result<Mode, WorkflowError> {
        self.ensure_device()?;
        let mode = self.state.apply(WorkflowEvent::TakeAnotherPhoto)?;
        if self.controller.has_session() {
            self.controller.set_active(true);
        } else {
            self.bind_camera().await;
        }
        Ok(mode)
    }

    fn ensure_device(&self) -> Result<(), WorkflowError> {
        if self.device_found {
            Ok(())
        } else {
            Err(WorkflowError::NoDeviceAvailable)
        }
    }

    /// Record a chain failure and move to `Error`
    fn fail(&mut self, err: WorkflowError) -> Mode {
        error!(error = %err, kind = ?err.kind(), "Capture cycle aborted");
        self.controller.set_active(false);
        let report = FailureReport::from(&err);
        match self.state.apply(WorkflowEvent::Failed(report)) {
            Ok(mode) => mode,
            Err(e) => {
                error!(error = %e, "Failure could not be recorded");
                self.state.mode()
            }
        }
    }

    async fn bind_camera(&mut self) {
        let Some(device) = self.cameras.enumerate_device(self.settings.camera_position) else {
            self.device_found = false;
            error!("Camera disappeared before binding");
            return;
        };
        match self.cameras.bind(&device).await {
            Ok(session) => {
                info!(device = %device.id, "Camera session bound");
                session.set_active(true);
                self.controller = CaptureController::new(session);
            }
            Err(e) => {
                // Leaves the controller unbound; the next capture reports it
                error!(device = %device.id, error = %e, "Failed to bind camera session");
            }
        }
    }
}
