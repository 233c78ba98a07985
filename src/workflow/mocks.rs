// Fake collaborators for testing - no hardware, no network

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::camera::{CameraDevice, CameraDevices, CameraPosition, CameraSession, CaptureError, PhotoFile};
use crate::errors::ProviderError;
use crate::location::{LocationProvider, PositionOptions};
use crate::permissions::{LocationGrant, PermissionProvider};
use crate::storage::{FileStat, Storage};
use crate::types::{Coordinates, PositionFix};
use crate::upload::{HttpResponse, MultipartPart, Transport, TransportError};

use super::session::{CaptureWorkflow, Collaborators, WorkflowSettings};

/// Collaborator call, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnumerateDevice,
    Bind,
    Capture,
    SetActive(bool),
    RequestCameraGrant,
    RequestLocationGrant,
    OpenSettings,
    GetPosition,
    Stat(String),
    Read(String),
    Post(String),
}

/// Call log shared by every fake of one harness
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(pred)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub const TEST_PHOTO_PATH: &str = "/cache/capture-1.jpg";
pub const TEST_PHOTO_URL: &str = "https://host/img/123.jpg";

#[derive(Debug)]
struct SessionInner {
    path: String,
    fail: Mutex<Option<CaptureError>>,
    delay: Mutex<Option<Duration>>,
    captures: AtomicUsize,
    active: AtomicBool,
    log: CallLog,
}

/// Camera session that "writes" a fixed path
#[derive(Debug, Clone)]
pub struct FakeCameraSession {
    inner: Arc<SessionInner>,
}

impl FakeCameraSession {
    pub fn new(path: &str) -> Self {
        Self::with_log(path, CallLog::default())
    }

    pub fn with_log(path: &str, log: CallLog) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                path: path.to_string(),
                fail: Mutex::new(None),
                delay: Mutex::new(None),
                captures: AtomicUsize::new(0),
                active: AtomicBool::new(false),
                log,
            }),
        }
    }

    pub fn fail_with(&self, err: CaptureError) {
        *self.inner.fail.lock().unwrap() = Some(err);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    pub fn captures(&self) -> usize {
        self.inner.captures.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraSession for FakeCameraSession {
    async fn capture_photo(&self) -> Result<PhotoFile, CaptureError> {
        self.inner.log.record(Call::Capture);
        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.inner.fail.lock().unwrap().clone();
        if let Some(err) = failure {
            return Err(err);
        }
        self.inner.captures.fetch_add(1, Ordering::SeqCst);
        Ok(PhotoFile {
            path: self.inner.path.clone(),
        })
    }

    fn set_active(&self, active: bool) {
        self.inner.log.record(Call::SetActive(active));
        self.inner.active.store(active, Ordering::SeqCst);
    }
}

/// Camera enumeration that returns one back camera, or none
#[derive(Debug)]
pub struct FakeCameraDevices {
    device: Mutex<Option<CameraDevice>>,
    session: FakeCameraSession,
    bind_failure: Mutex<Option<CaptureError>>,
    binds: AtomicUsize,
    log: CallLog,
}

impl FakeCameraDevices {
    pub fn with_session(session: FakeCameraSession, log: CallLog) -> Self {
        Self {
            device: Mutex::new(Some(CameraDevice {
                id: "back-0".to_string(),
                position: CameraPosition::Back,
            })),
            session,
            bind_failure: Mutex::new(None),
            binds: AtomicUsize::new(0),
            log,
        }
    }

    pub fn remove_device(&self) {
        *self.device.lock().unwrap() = None;
    }

    pub fn fail_bind(&self, err: CaptureError) {
        *self.bind_failure.lock().unwrap() = Some(err);
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevices for FakeCameraDevices {
    fn enumerate_device(&self, position: CameraPosition) -> Option<CameraDevice> {
        self.log.record(Call::EnumerateDevice);
        self.device
            .lock()
            .unwrap()
            .clone()
            .filter(|d| d.position == position)
    }

    async fn bind(&self, _device: &CameraDevice) -> Result<Box<dyn CameraSession>, CaptureError> {
        self.log.record(Call::Bind);
        let failure = self.bind_failure.lock().unwrap().clone();
        if let Some(err) = failure {
            return Err(err);
        }
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.session.clone()))
    }
}

#[derive(Debug)]
pub struct FakePermissions {
    camera_granted: AtomicBool,
    camera_grant_on_request: AtomicBool,
    location_grant: Mutex<Result<LocationGrant, ProviderError>>,
    location_requests: AtomicUsize,
    settings_opened: AtomicUsize,
    log: CallLog,
}

impl FakePermissions {
    fn build(camera: bool, log: CallLog) -> Self {
        Self {
            camera_granted: AtomicBool::new(camera),
            camera_grant_on_request: AtomicBool::new(true),
            location_grant: Mutex::new(Ok(LocationGrant::Granted)),
            location_requests: AtomicUsize::new(0),
            settings_opened: AtomicUsize::new(0),
            log,
        }
    }

    pub fn granted() -> Self {
        Self::build(true, CallLog::default())
    }

    pub fn camera_denied() -> Self {
        let permissions = Self::build(false, CallLog::default());
        permissions.set_camera_grant_on_request(false);
        permissions
    }

    pub fn with_log(camera: bool, log: CallLog) -> Self {
        Self::build(camera, log)
    }

    pub fn set_camera_granted(&self, granted: bool) {
        self.camera_granted.store(granted, Ordering::SeqCst);
    }

    pub fn set_camera_grant_on_request(&self, grant: bool) {
        self.camera_grant_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn set_location_grant(&self, grant: Result<LocationGrant, ProviderError>) {
        *self.location_grant.lock().unwrap() = grant;
    }

    pub fn location_requests(&self) -> usize {
        self.location_requests.load(Ordering::SeqCst)
    }

    pub fn settings_opened(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for FakePermissions {
    fn query_camera_granted(&self) -> bool {
        self.camera_granted.load(Ordering::SeqCst)
    }

    async fn request_camera_grant(&self) -> bool {
        self.log.record(Call::RequestCameraGrant);
        if self.camera_grant_on_request.load(Ordering::SeqCst) {
            self.camera_granted.store(true, Ordering::SeqCst);
        }
        self.camera_granted.load(Ordering::SeqCst)
    }

    async fn request_location_grant(&self) -> Result<LocationGrant, ProviderError> {
        self.log.record(Call::RequestLocationGrant);
        self.location_requests.fetch_add(1, Ordering::SeqCst);
        self.location_grant.lock().unwrap().clone()
    }

    fn open_settings(&self) {
        self.log.record(Call::OpenSettings);
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
    }
}

/// One scripted answer from [`FakeLocation`]
#[derive(Debug, Clone)]
pub enum LocationStep {
    Fix { coords: Coordinates, age: ChronoDuration },
    Fail(ProviderError),
    /// Never answers
    Hang,
}

#[derive(Debug)]
pub struct FakeLocation {
    steps: Mutex<VecDeque<LocationStep>>,
    fallback: Option<Coordinates>,
    requests: Mutex<Vec<PositionOptions>>,
    log: CallLog,
}

impl FakeLocation {
    /// Always answers with a fresh fix at the given position
    pub fn fixed(latitude: f64, longitude: f64) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback: Some(Coordinates::new(latitude, longitude)),
            requests: Mutex::new(Vec::new()),
            log: CallLog::default(),
        }
    }

    /// Answers from the script, then fails with `Unavailable`
    pub fn scripted(steps: Vec<LocationStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            log: CallLog::default(),
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn push_step(&self, step: LocationStep) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn requests(&self) -> Vec<PositionOptions> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    async fn get_current_position(&self, options: PositionOptions) -> Result<PositionFix, ProviderError> {
        self.log.record(Call::GetPosition);
        self.requests.lock().unwrap().push(options);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(LocationStep::Fix { coords, age }) => Ok(PositionFix::new(coords, Utc::now() - age)),
            Some(LocationStep::Fail(err)) => Err(err),
            Some(LocationStep::Hang) => std::future::pending().await,
            None => match self.fallback {
                Some(coords) => Ok(PositionFix::fresh(coords)),
                None => Err(ProviderError::Unavailable("script exhausted".to_string())),
            },
        }
    }
}

/// In-memory file table
#[derive(Debug, Default)]
pub struct FakeStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    log: CallLog,
}

impl FakeStorage {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            log,
        }
    }

    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.files.lock().unwrap().insert(path.to_string(), bytes.to_vec());
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().unwrap().remove(path);
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn stat(&self, path: &str) -> anyhow::Result<FileStat> {
        self.log.record(Call::Stat(path.to_string()));
        Ok(FileStat {
            path: path.to_string(),
            exists: self.files.lock().unwrap().contains_key(path),
        })
    }

    async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.log.record(Call::Read(path.to_string()));
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {path}"))
    }
}

/// Transport that answers from a queue and records every post
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    posts: Mutex<Vec<(String, Vec<MultipartPart>)>>,
    log: CallLog,
}

impl FakeTransport {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            posts: Mutex::new(Vec::new()),
            log,
        }
    }

    pub fn respond(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn respond_json(&self, status: u16, body: &str) {
        self.respond(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn posts(&self) -> Vec<(String, Vec<MultipartPart>)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_multipart(&self, url: &str, parts: &[MultipartPart]) -> Result<HttpResponse, TransportError> {
        self.log.record(Call::Post(url.to_string()));
        self.posts.lock().unwrap().push((url.to_string(), parts.to_vec()));
        let queued = self.responses.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                body: format!(r#"{{"photoUrl":"{TEST_PHOTO_URL}"}}"#),
            })
        })
    }
}

/// All fakes wired to one call log
///
/// Defaults: back camera present, camera and location granted, fix at
/// 37.7749, -122.4194, photo file present, server answers with
/// [`TEST_PHOTO_URL`].
pub struct Harness {
    pub log: CallLog,
    pub session: FakeCameraSession,
    pub cameras: Arc<FakeCameraDevices>,
    pub permissions: Arc<FakePermissions>,
    pub location: Arc<FakeLocation>,
    pub storage: Arc<FakeStorage>,
    pub transport: Arc<FakeTransport>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_location(FakeLocation::fixed(37.7749, -122.4194))
    }

    pub fn with_location(location: FakeLocation) -> Self {
        let log = CallLog::default();
        let session = FakeCameraSession::with_log(TEST_PHOTO_PATH, log.clone());
        let storage = FakeStorage::with_log(log.clone());
        storage.put(TEST_PHOTO_PATH, b"\xFF\xD8fake-jpeg");

        Self {
            cameras: Arc::new(FakeCameraDevices::with_session(session.clone(), log.clone())),
            permissions: Arc::new(FakePermissions::with_log(true, log.clone())),
            location: Arc::new(location.with_log(log.clone())),
            storage: Arc::new(storage),
            transport: Arc::new(FakeTransport::with_log(log.clone())),
            session,
            log,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            cameras: self.cameras.clone(),
            permissions: self.permissions.clone(),
            location: self.location.clone(),
            storage: self.storage.clone(),
            transport: self.transport.clone(),
        }
    }

    pub async fn start(&self) -> CaptureWorkflow {
        CaptureWorkflow::start(self.collaborators(), WorkflowSettings::default()).await
    }
}
