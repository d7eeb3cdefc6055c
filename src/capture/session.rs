//! Capture session lifecycle and metadata pipeline.
//!
//! [`CaptureSession`] is a synchronous state machine over a
//! [`CaptureBackend`]: it wires device inputs and the metadata output,
//! starts and stops frame delivery, filters detections down to valid QR
//! codes, and reports to a [`SessionObserver`]. It performs no locking and
//! no dispatch of its own; the session queue owns an instance and feeds it
//! commands in issue order.

use std::sync::Weak;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::capture::backend::{AuthorizationStatus, BackendError, CaptureBackend, DeviceInput};
use crate::capture::metadata::{MetadataObject, Symbology};
use crate::capture::orientation::{InterfaceOrientation, VideoOrientation};
use crate::capture::position::CameraPosition;
use crate::capture::preview::PreviewSurface;
use crate::config::RestartPolicy;

/// Coarse lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, never configured.
    Uninitialized,
    /// Configured (or mid-configuration) but not yet delivering frames.
    Configuring,
    /// Frame delivery active.
    Running,
    /// Paused by the host; resumable.
    Suspended,
    /// Torn down; terminal.
    Stopped,
}

/// Failures raised while arming the capture pipeline.
///
/// These never escape the session worker; they are logged and reported to
/// the observer, leaving the view mounted but blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No physical device exists at the requested position.
    #[error("no capture device available facing {0}")]
    NoCaptureDevice(CameraPosition),
    /// A device was found but could not be opened for capture.
    #[error("could not open capture device input: {0}")]
    NoCaptureDeviceInput(#[source] BackendError),
    /// Camera authorization has not been granted.
    #[error("camera permission denied")]
    PermissionDenied,
}

/// Listener for session events.
///
/// Held weakly by the session; callbacks run on the session worker.
pub trait SessionObserver: Send + Sync {
    /// The pipeline started delivering frames.
    fn ready(&self);

    /// Arming the pipeline failed; the session stays mounted but idle.
    fn mount_error(&self, error: &SessionError);

    /// Valid QR codes were detected, geometry already in view coordinates.
    fn codes_detected(&self, codes: &[MetadataObject]);
}

/// The metadata output attached to the pipeline.
///
/// Tracks which symbologies the backend can recognize and which subset
/// this session accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOutput {
    available: Vec<Symbology>,
    accepted: Vec<Symbology>,
}

impl MetadataOutput {
    /// Creates an output that accepts nothing yet.
    pub fn new(available: Vec<Symbology>) -> Self {
        Self {
            available,
            accepted: Vec::new(),
        }
    }

    /// Restricts the output to the wanted symbologies the backend supports.
    pub fn restrict(&mut self, wanted: &[Symbology]) {
        self.accepted = wanted
            .iter()
            .copied()
            .filter(|s| self.available.contains(s))
            .collect();
    }

    /// Whether this output delivers objects of the given symbology.
    #[inline]
    pub fn accepts(&self, symbology: Symbology) -> bool {
        self.accepted.contains(&symbology)
    }

    /// Returns the accepted symbologies.
    #[inline]
    pub fn accepted(&self) -> &[Symbology] {
        &self.accepted
    }
}

/// Point-in-time view of session state, for inspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle position.
    pub phase: SessionPhase,
    /// Requested camera position.
    pub position: CameraPosition,
    /// Whether the backend is delivering frames.
    pub running: bool,
    /// Whether the host suspended the session.
    pub paused: bool,
    /// Attached device inputs.
    pub input_count: usize,
    /// Attached metadata outputs.
    pub output_count: usize,
    /// Restart attempts consumed since the observer was last armed.
    pub restart_attempts: u32,
    /// Whether the runtime-error observer will schedule restarts.
    pub observer_armed: bool,
}

/// Owns the camera pipeline for one scanner view.
pub struct CaptureSession<B: CaptureBackend> {
    backend: B,
    preview: PreviewSurface,
    restart_policy: RestartPolicy,
    observer: Option<Weak<dyn SessionObserver>>,
    position: CameraPosition,
    interface_orientation: InterfaceOrientation,
    inputs: Vec<DeviceInput>,
    outputs: Vec<MetadataOutput>,
    phase: SessionPhase,
    configuring: bool,
    running: bool,
    paused: bool,
    observer_armed: bool,
    restart_attempts: u32,
}

impl<B: CaptureBackend> CaptureSession<B> {
    /// Creates an unconfigured session over `backend`.
    pub fn new(backend: B, preview: PreviewSurface, restart_policy: RestartPolicy) -> Self {
        Self {
            backend,
            preview,
            restart_policy,
            observer: None,
            position: CameraPosition::default(),
            interface_orientation: InterfaceOrientation::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            phase: SessionPhase::Uninitialized,
            configuring: false,
            running: false,
            paused: false,
            observer_armed: false,
            restart_attempts: 0,
        }
    }

    /// Sets the event listener.
    pub fn set_observer(&mut self, observer: Weak<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    /// Returns the device behind the active input, if one is attached.
    pub fn active_device(&self) -> Option<&crate::capture::backend::DeviceDescriptor> {
        self.inputs.first().map(DeviceInput::device)
    }

    /// Returns a snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            position: self.position,
            running: self.running,
            paused: self.paused,
            input_count: self.inputs.len(),
            output_count: self.outputs.len(),
            restart_attempts: self.restart_attempts,
            observer_armed: self.observer_armed,
        }
    }

    /// Arms the capture pipeline for the current position.
    ///
    /// Idempotent when the active input already matches the requested
    /// position. Otherwise resolves a device, swaps it in atomically with
    /// a fresh metadata output, and starts frame delivery if authorization
    /// and position allow. Failures are reported through the observer.
    pub fn initialize(&mut self, orientation: InterfaceOrientation) {
        if self.phase == SessionPhase::Stopped {
            debug!("initialize ignored; session is stopped");
            return;
        }
        self.interface_orientation = orientation;

        if self
            .inputs
            .iter()
            .any(|input| input.device().position() == self.position)
        {
            debug!(position = %self.position, "capture input already attached");
            return;
        }

        let Some(device) = self.backend.default_device(self.position) else {
            self.fail_mount(SessionError::NoCaptureDevice(self.position));
            return;
        };
        let input = match self.backend.open_input(&device) {
            Ok(input) => input,
            Err(cause) => {
                self.fail_mount(SessionError::NoCaptureDeviceInput(cause));
                return;
            }
        };

        self.begin_configuration();
        self.inputs.clear();
        if self.backend.can_add_input(&input) {
            info!(
                device = input.device().id(),
                position = %self.position,
                "attached capture input"
            );
            self.inputs.push(input);
            self.apply_preview_orientation();
        } else {
            warn!(device = input.device().id(), "pipeline rejected capture input");
        }
        self.configure_output();
        self.commit_configuration();

        self.start_pipeline();
    }

    /// Switches the camera and rebuilds the input. No-op if unchanged.
    pub fn change_camera_position(
        &mut self,
        position: CameraPosition,
        orientation: InterfaceOrientation,
    ) {
        if self.phase == SessionPhase::Stopped {
            debug!("position change ignored; session is stopped");
            return;
        }
        if position == self.position {
            debug!(position = %position, "camera position unchanged");
            return;
        }
        info!(from = %self.position, to = %position, "switching camera position");
        self.position = position;
        self.initialize(orientation);
    }

    /// Applies a new interface orientation to the preview connection.
    pub fn change_preview_orientation(&mut self, orientation: InterfaceOrientation) {
        if self.phase == SessionPhase::Stopped {
            debug!("orientation change ignored; session is stopped");
            return;
        }
        self.interface_orientation = orientation;
        self.apply_preview_orientation();
    }

    /// Restarts frame delivery after a `suspend`. Does not re-emit ready.
    pub fn resume(&mut self) {
        if self.phase == SessionPhase::Stopped {
            debug!("resume ignored; session is stopped");
            return;
        }
        if !self.paused {
            trace!("resume ignored; session not suspended");
            return;
        }
        self.paused = false;
        match self.backend.start_running() {
            Ok(()) => {
                self.running = true;
                if self.phase == SessionPhase::Suspended {
                    self.phase = SessionPhase::Running;
                }
                info!("capture session resumed");
            }
            Err(error) => error!(error = %error, "failed to resume capture pipeline"),
        }
    }

    /// Pauses frame delivery. Idempotent; ignored unless running.
    pub fn suspend(&mut self) {
        if self.phase == SessionPhase::Stopped {
            debug!("suspend ignored; session is stopped");
            return;
        }
        if self.paused {
            trace!("suspend ignored; session already suspended");
            return;
        }
        if !self.running {
            trace!("suspend ignored; session never started");
            return;
        }
        self.paused = true;
        self.backend.stop_running();
        self.running = false;
        if self.phase == SessionPhase::Running {
            self.phase = SessionPhase::Suspended;
        }
        info!("capture session suspended");
    }

    /// Tears the pipeline down. Terminal: later operations are ignored.
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Stopped {
            debug!("session already stopped");
            return;
        }
        self.preview.detach();
        self.commit_configuration();
        self.backend.stop_running();
        self.running = false;
        self.backend.clear_sink();
        self.inputs.clear();
        self.outputs.clear();
        self.observer_armed = false;
        self.phase = SessionPhase::Stopped;
        info!("capture session stopped");
    }

    /// Feeds a batch of detected metadata objects through the pipeline.
    ///
    /// Objects are dropped wholesale outside the running state (open
    /// configuration bracket, suspended, stopped). Surviving objects are
    /// filtered to accepted symbologies with valid QR descriptors and
    /// mapped into view coordinates before reaching the observer.
    pub fn handle_metadata(&mut self, objects: Vec<MetadataObject>) {
        if self.configuring || self.phase != SessionPhase::Running || !self.running {
            trace!(
                count = objects.len(),
                phase = ?self.phase,
                "dropping metadata outside running state"
            );
            return;
        }

        let codes: Vec<MetadataObject> = objects
            .iter()
            .filter(|object| {
                object
                    .symbology()
                    .is_some_and(|s| self.outputs.iter().any(|out| out.accepts(s)))
            })
            .filter(|object| object.qr_descriptor().is_some())
            .map(|object| self.preview.transform_metadata(object))
            .collect();

        if codes.is_empty() {
            return;
        }
        debug!(count = codes.len(), "qr codes detected");
        self.notify(|observer| observer.codes_detected(&codes));
    }

    /// Reacts to a pipeline runtime error.
    ///
    /// Returns the delay after which a restart should be attempted, or
    /// `None` when the restart budget is exhausted, the observer is
    /// disarmed, or the session is suspended or stopped.
    pub fn handle_runtime_error(&mut self, error: BackendError) -> Option<Duration> {
        if self.phase == SessionPhase::Stopped {
            debug!(error = %error, "runtime error after teardown; ignoring");
            return None;
        }
        error!(error = %error, "capture pipeline runtime error");
        self.running = false;

        if !self.observer_armed {
            debug!("auto-restart disarmed; not scheduling");
            return None;
        }
        if self.paused {
            debug!("session suspended; not scheduling restart");
            return None;
        }
        if self.restart_attempts >= self.restart_policy.max_attempts {
            self.observer_armed = false;
            warn!(
                attempts = self.restart_attempts,
                "restart attempts exhausted; disarming auto-restart"
            );
            return None;
        }

        self.restart_attempts += 1;
        info!(
            attempt = self.restart_attempts,
            max_attempts = self.restart_policy.max_attempts,
            "scheduling capture session restart"
        );
        Some(self.restart_policy.delay())
    }

    /// Executes a previously scheduled restart.
    pub fn attempt_restart(&mut self) {
        if self.phase == SessionPhase::Stopped {
            debug!("restart aborted; session is stopped");
            return;
        }
        if !self.observer_armed {
            debug!("restart aborted; auto-restart disarmed");
            return;
        }
        if self.paused {
            debug!("restart skipped while suspended");
            return;
        }
        if self.running {
            trace!("restart unnecessary; session already running");
            return;
        }
        match self.backend.start_running() {
            Ok(()) => {
                self.running = true;
                self.phase = SessionPhase::Running;
                info!("capture session restarted");
                self.notify(|observer| observer.ready());
            }
            Err(error) => error!(error = %error, "capture session restart failed"),
        }
    }

    fn start_pipeline(&mut self) {
        if self.running {
            self.phase = SessionPhase::Running;
            return;
        }
        if self.backend.authorization_status() != AuthorizationStatus::Authorized {
            self.fail_mount(SessionError::PermissionDenied);
            return;
        }
        if self.position == CameraPosition::Unspecified {
            debug!("camera position unspecified; leaving session idle");
            return;
        }

        self.observer_armed = true;
        self.restart_attempts = 0;
        match self.backend.start_running() {
            Ok(()) => {
                self.running = true;
                self.paused = false;
                self.phase = SessionPhase::Running;
                info!("capture session running");
                self.notify(|observer| observer.ready());
            }
            Err(error) => error!(error = %error, "failed to start capture pipeline"),
        }
    }

    fn begin_configuration(&mut self) {
        self.configuring = true;
        self.phase = SessionPhase::Configuring;
        trace!("configuration bracket opened");
    }

    fn commit_configuration(&mut self) {
        self.configuring = false;
        trace!("configuration bracket committed");
    }

    fn configure_output(&mut self) {
        self.outputs.clear();
        let mut output = MetadataOutput::new(self.backend.available_symbologies());
        output.restrict(&[Symbology::Qr]);
        self.outputs.push(output);
    }

    fn apply_preview_orientation(&mut self) {
        self.preview
            .set_orientation(VideoOrientation::for_interface(self.interface_orientation));
    }

    fn fail_mount(&mut self, error: SessionError) {
        error!(error = %error, "camera could not be started");
        self.notify(|observer| observer.mount_error(&error));
    }

    fn notify(&self, f: impl FnOnce(&dyn SessionObserver)) {
        if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
            f(&*observer);
        }
    }
}

impl<B: CaptureBackend> std::fmt::Debug for CaptureSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("phase", &self.phase)
            .field("position", &self.position)
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}
