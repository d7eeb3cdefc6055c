//! Capture backend abstraction.
//!
//! The session drives real camera hardware through the [`CaptureBackend`]
//! trait: device discovery, authorization, input plumbing, and the running
//! state of the platform pipeline. Detection results flow back through an
//! installed [`MetadataSink`]. [`MockBackend`] provides a scriptable
//! implementation for tests and the demo binary.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::metadata::{MetadataObject, Symbology};
use crate::capture::position::CameraPosition;

/// Camera authorization state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    /// The user has not yet been asked for camera access.
    NotDetermined,
    /// Access is blocked by system policy and cannot be granted.
    Restricted,
    /// The user explicitly denied access.
    Denied,
    /// The user granted access.
    Authorized,
}

impl AuthorizationStatus {
    /// Returns the status name in the external event vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDetermined => "notDetermined",
            Self::Restricted => "restricted",
            Self::Denied => "denied",
            Self::Authorized => "authorized",
        }
    }
}

/// Identity of a physical capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    id: String,
    name: String,
    position: CameraPosition,
}

impl DeviceDescriptor {
    /// Creates a descriptor.
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: CameraPosition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
        }
    }

    /// Returns the unique device identifier.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable device name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns which side of the hardware the device faces.
    #[inline]
    pub fn position(&self) -> CameraPosition {
        self.position
    }
}

/// An opened connection from a capture device into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    device: DeviceDescriptor,
}

impl DeviceInput {
    /// Wraps an opened device.
    pub fn new(device: DeviceDescriptor) -> Self {
        Self { device }
    }

    /// Returns the device this input reads from.
    #[inline]
    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }
}

/// Failures surfaced by the platform capture stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The device is no longer attached.
    #[error("device {0} is not connected")]
    NotConnected(String),
    /// Another client holds the device.
    #[error("device {0} is in use by another client")]
    DeviceInUse(String),
    /// The application lacks camera authorization.
    #[error("application is not authorized to use the capture device")]
    NotAuthorized,
    /// The system media services were torn down and restarted.
    #[error("media services were reset")]
    MediaServicesReset,
    /// Any other pipeline failure.
    #[error("capture pipeline failure: {0}")]
    Pipeline(String),
}

/// Receiver for asynchronous pipeline output.
///
/// Implementations must tolerate being called from the backend's delivery
/// thread and must not call back into the backend.
pub trait MetadataSink: Send {
    /// Called with the metadata objects recognized in a frame.
    fn metadata_received(&self, objects: Vec<MetadataObject>);

    /// Called when the running pipeline fails.
    fn runtime_error(&self, error: BackendError);
}

/// Platform capture stack the session drives.
pub trait CaptureBackend: Send {
    /// Returns the current camera authorization status.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompts the user for camera access.
    ///
    /// The completion receives whether access was granted; it may be
    /// invoked from an arbitrary thread.
    fn request_authorization(&self, completion: Box<dyn FnOnce(bool) + Send>);

    /// Returns the default device facing `position`, if one exists.
    ///
    /// [`CameraPosition::Unspecified`] matches any device.
    fn default_device(&self, position: CameraPosition) -> Option<DeviceDescriptor>;

    /// Opens a device for capture.
    fn open_input(&self, device: &DeviceDescriptor) -> Result<DeviceInput, BackendError>;

    /// Whether the pipeline can accept this input right now.
    fn can_add_input(&self, input: &DeviceInput) -> bool {
        let _ = input;
        true
    }

    /// Returns the symbologies the vision pipeline can recognize.
    fn available_symbologies(&self) -> Vec<Symbology>;

    /// Installs the sink that receives metadata and runtime errors.
    ///
    /// Replaces any previously installed sink.
    fn install_sink(&self, sink: Box<dyn MetadataSink>);

    /// Removes the installed sink, if any.
    fn clear_sink(&self);

    /// Starts frame delivery.
    fn start_running(&self) -> Result<(), BackendError>;

    /// Stops frame delivery.
    fn stop_running(&self);
}

struct MockState {
    devices: Vec<DeviceDescriptor>,
    authorization: AuthorizationStatus,
    grant_on_request: bool,
    veto_inputs: bool,
    fail_next_open: Option<BackendError>,
    fail_next_start: Option<BackendError>,
    symbologies: Vec<Symbology>,
    sink: Option<Box<dyn MetadataSink>>,
    running: bool,
    open_calls: u32,
    start_calls: u32,
    stop_calls: u32,
}

/// Scriptable in-memory backend.
///
/// Clones share state, so a test can keep one handle to adjust behavior
/// and emit frames while the session owns another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Creates a backend with one back camera and granted authorization.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                devices: vec![DeviceDescriptor::new(
                    "mock-back-0",
                    "Mock Wide Camera",
                    CameraPosition::Back,
                )],
                authorization: AuthorizationStatus::Authorized,
                grant_on_request: true,
                veto_inputs: false,
                fail_next_open: None,
                fail_next_start: None,
                symbologies: vec![
                    Symbology::Qr,
                    Symbology::Aztec,
                    Symbology::DataMatrix,
                    Symbology::Pdf417,
                ],
                sink: None,
                running: false,
                open_calls: 0,
                start_calls: 0,
                stop_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the device table.
    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        self.lock().devices = devices;
    }

    /// Sets the reported authorization status.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        self.lock().authorization = status;
    }

    /// Controls whether a pending authorization prompt is granted.
    pub fn set_grant_on_request(&self, grant: bool) {
        self.lock().grant_on_request = grant;
    }

    /// Makes the pipeline reject all inputs.
    pub fn set_veto_inputs(&self, veto: bool) {
        self.lock().veto_inputs = veto;
    }

    /// Makes the next `open_input` call fail with `error`.
    pub fn fail_next_open(&self, error: BackendError) {
        self.lock().fail_next_open = Some(error);
    }

    /// Makes the next `start_running` call fail with `error`.
    pub fn fail_next_start(&self, error: BackendError) {
        self.lock().fail_next_start = Some(error);
    }

    /// Restricts which symbologies the pipeline reports as available.
    pub fn set_symbologies(&self, symbologies: Vec<Symbology>) {
        self.lock().symbologies = symbologies;
    }

    /// Whether frame delivery is active.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// How many times `open_input` was called.
    pub fn open_calls(&self) -> u32 {
        self.lock().open_calls
    }

    /// How many times `start_running` was called.
    pub fn start_calls(&self) -> u32 {
        self.lock().start_calls
    }

    /// How many times `stop_running` was called.
    pub fn stop_calls(&self) -> u32 {
        self.lock().stop_calls
    }

    /// Whether a sink is currently installed.
    pub fn has_sink(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// Delivers metadata objects to the installed sink.
    pub fn emit_metadata(&self, objects: Vec<MetadataObject>) {
        if let Some(sink) = &self.lock().sink {
            sink.metadata_received(objects);
        }
    }

    /// Delivers a runtime error to the installed sink.
    ///
    /// Frame delivery stops before the sink is notified; a session
    /// hearing about the error has to start the pipeline again.
    pub fn emit_runtime_error(&self, error: BackendError) {
        let mut state = self.lock();
        state.running = false;
        if let Some(sink) = &state.sink {
            sink.runtime_error(error);
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockBackend")
            .field("devices", &state.devices.len())
            .field("authorization", &state.authorization)
            .field("running", &state.running)
            .field("start_calls", &state.start_calls)
            .field("stop_calls", &state.stop_calls)
            .finish()
    }
}

impl CaptureBackend for MockBackend {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.lock().authorization
    }

    fn request_authorization(&self, completion: Box<dyn FnOnce(bool) + Send>) {
        let granted = {
            let mut state = self.lock();
            match state.authorization {
                AuthorizationStatus::NotDetermined => {
                    state.authorization = if state.grant_on_request {
                        AuthorizationStatus::Authorized
                    } else {
                        AuthorizationStatus::Denied
                    };
                    state.grant_on_request
                }
                AuthorizationStatus::Authorized => true,
                _ => false,
            }
        };
        completion(granted);
    }

    fn default_device(&self, position: CameraPosition) -> Option<DeviceDescriptor> {
        self.lock()
            .devices
            .iter()
            .find(|d| position == CameraPosition::Unspecified || d.position() == position)
            .cloned()
    }

    fn open_input(&self, device: &DeviceDescriptor) -> Result<DeviceInput, BackendError> {
        let mut state = self.lock();
        state.open_calls += 1;
        if let Some(error) = state.fail_next_open.take() {
            return Err(error);
        }
        Ok(DeviceInput::new(device.clone()))
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        !self.lock().veto_inputs
    }

    fn available_symbologies(&self) -> Vec<Symbology> {
        self.lock().symbologies.clone()
    }

    fn install_sink(&self, sink: Box<dyn MetadataSink>) {
        self.lock().sink = Some(sink);
    }

    fn clear_sink(&self) {
        self.lock().sink = None;
    }

    fn start_running(&self) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.start_calls += 1;
        if let Some(error) = state.fail_next_start.take() {
            return Err(error);
        }
        state.running = true;
        Ok(())
    }

    fn stop_running(&self) {
        let mut state = self.lock();
        state.stop_calls += 1;
        state.running = false;
    }
}
