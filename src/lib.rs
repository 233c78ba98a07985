// Geo-Snap Library - camera capture, geolocation and photo upload workflow
// The host shell supplies the device collaborators; this crate drives them.

pub mod camera;
pub mod config;
pub mod errors;
pub mod location;
pub mod permissions;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod upload;
pub mod workflow;

// Re-export key types for easy access
pub use camera::{CameraDevice, CameraDevices, CameraPosition, CameraSession, CaptureController, CaptureError, PhotoFile};
pub use config::{config, init_config, GeoSnapConfig};
pub use errors::{ErrorKind, FailureReport, Permission, ProviderError, WorkflowError};
pub use location::{GeolocationFetcher, LocationError, LocationProvider, PositionOptions};
pub use permissions::{Effect, LocationGrant, PermissionGate, PermissionOutcome, PermissionProvider};
pub use storage::{FileStat, LocalStorage, Storage};
pub use telemetry::{create_capture_span, generate_correlation_id, init_telemetry};
pub use types::{CapturedImage, Coordinates, PositionFix, UploadResult};
pub use upload::{
    HttpResponse, MultipartPart, ReqwestTransport, TransferError, Transport, TransportError,
    UploadDispatcher, UploadEndpoint,
};
pub use workflow::{
    CaptureWorkflow, Collaborators, Mode, TransitionError, TransitionRecord, View, WorkflowEvent,
    WorkflowSettings, WorkflowState,
};
