//! Scanner view controller.
//!
//! [`ScannerView`] bridges a host UI component to the capture session: it
//! owns the session queue and the preview surface, feeds host lifecycle
//! hooks (layout, rotation, foreground/background) into the session, and
//! turns session callbacks into [`ScanEvent`]s on the host's
//! [`EventSink`]. Sink callbacks run on the session worker; sink
//! implementations are responsible for marshalling onto their UI context.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::capture::{
    CameraPosition, CaptureBackend, InterfaceOrientation, MetadataObject, PreviewSurface,
    SessionError, SessionObserver, SessionQueue, SessionSnapshot,
};
use crate::config::ScannerConfig;
use crate::geometry::Rect;
use crate::scanner::event::ScanEvent;

/// Receiver for the two host-facing events.
pub trait EventSink: Send + Sync {
    /// The camera started delivering frames.
    fn camera_ready(&self);

    /// A QR code was scanned.
    fn qr_scanned(&self, event: ScanEvent);
}

/// Camera selection as the host expresses it.
///
/// Hosts speak either a facing name (`"front"`/`"back"`) or a platform
/// numeric position code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraFacing {
    /// A facing name.
    Named(String),
    /// A platform position code.
    Code(i32),
}

impl From<&str> for CameraFacing {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for CameraFacing {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<i32> for CameraFacing {
    fn from(code: i32) -> Self {
        Self::Code(code)
    }
}

/// Unknown names are logged and ignored; unknown codes fall back to the
/// unspecified position.
fn resolve_position(facing: &CameraFacing) -> Option<CameraPosition> {
    match facing {
        CameraFacing::Named(name) => match name.as_str() {
            "front" => Some(CameraPosition::Front),
            "back" => Some(CameraPosition::Back),
            other => {
                warn!(value = other, "ignoring unknown camera facing");
                None
            }
        },
        CameraFacing::Code(code) => {
            Some(CameraPosition::from_code(*code).unwrap_or(CameraPosition::Unspecified))
        }
    }
}

struct ViewInner {
    sink: Box<dyn EventSink>,
    mount_error: Mutex<Option<SessionError>>,
}

impl SessionObserver for ViewInner {
    fn ready(&self) {
        debug!("camera ready");
        self.sink.camera_ready();
    }

    fn mount_error(&self, error: &SessionError) {
        debug!(error = %error, "session reported mount error");
        let mut slot = self
            .mount_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(error.clone());
    }

    fn codes_detected(&self, codes: &[MetadataObject]) {
        for object in codes {
            if let Some(event) = ScanEvent::from_detection(object) {
                self.sink.qr_scanned(event);
            }
        }
    }
}

/// A mounted QR scanner view.
///
/// Dropping the view shuts the session worker down; call
/// [`unmount`](Self::unmount) first for an orderly teardown.
pub struct ScannerView {
    queue: SessionQueue,
    preview: PreviewSurface,
    orientation: InterfaceOrientation,
    inner: Arc<ViewInner>,
}

impl ScannerView {
    /// Mounts the view and asynchronously arms the capture session.
    ///
    /// Session-level mounting failures (missing device, permission) are
    /// logged and recorded, not returned; the view stays mounted with a
    /// blank preview. The only hard failure is the worker thread itself.
    pub fn mount<B>(
        backend: B,
        sink: Box<dyn EventSink>,
        orientation: InterfaceOrientation,
        config: ScannerConfig,
    ) -> io::Result<Self>
    where
        B: CaptureBackend + 'static,
    {
        let preview = PreviewSurface::new();
        preview.attach();

        let inner = Arc::new(ViewInner {
            sink,
            mount_error: Mutex::new(None),
        });
        let observer: Arc<dyn SessionObserver> = inner.clone();
        let queue = SessionQueue::spawn(
            backend,
            preview.clone(),
            config.restart,
            Arc::downgrade(&observer),
        )?;

        queue.change_camera_position(config.position, orientation);
        queue.initialize(orientation);
        info!(position = %config.position, "scanner view mounted");

        Ok(Self {
            queue,
            preview,
            orientation,
            inner,
        })
    }

    /// Applies the host's camera-facing property.
    pub fn set_camera_facing(&self, facing: impl Into<CameraFacing>) {
        let facing = facing.into();
        let Some(position) = resolve_position(&facing) else {
            return;
        };
        self.queue.change_camera_position(position, self.orientation);
    }

    /// Tracks a device rotation.
    pub fn orientation_changed(&mut self, orientation: InterfaceOrientation) {
        self.orientation = orientation;
        self.queue.change_preview_orientation(orientation);
    }

    /// Reacts to the app returning to the foreground.
    ///
    /// Re-applies the stored orientation, then resumes the session.
    pub fn app_became_active(&self) {
        self.queue.change_preview_orientation(self.orientation);
        self.queue.resume();
    }

    /// Reacts to the app entering the background.
    pub fn app_entered_background(&self) {
        self.queue.suspend();
    }

    /// Synchronizes the preview surface with the view's bounds.
    ///
    /// Call on every layout pass; the surface stays attached and hosts
    /// paint [`BACKGROUND_RGBA`](crate::capture::BACKGROUND_RGBA) behind
    /// it until the first frame arrives.
    pub fn layout(&self, bounds: Rect) {
        self.preview.attach();
        self.preview.set_frame(bounds);
    }

    /// Tears the capture session down.
    pub fn unmount(&self) {
        self.queue.stop();
        info!("scanner view unmounted");
    }

    /// Returns the preview surface the host renders.
    #[inline]
    pub fn preview(&self) -> &PreviewSurface {
        &self.preview
    }

    /// Returns session state after all previously issued operations.
    pub fn session_snapshot(&self) -> Option<SessionSnapshot> {
        self.queue.snapshot()
    }

    /// Returns the most recent session mounting failure, if any.
    pub fn last_mount_error(&self) -> Option<SessionError> {
        self.inner
            .mount_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for ScannerView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerView")
            .field("orientation", &self.orientation)
            .field("queue", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{
        DeviceDescriptor, ErrorCorrectionLevel, MockBackend, QrDescriptor, SessionPhase, Symbology,
    };

    struct JournalSink {
        entries: Arc<Mutex<Vec<String>>>,
    }

    impl EventSink for JournalSink {
        fn camera_ready(&self) {
            self.entries.lock().unwrap().push("ready".into());
        }

        fn qr_scanned(&self, event: ScanEvent) {
            let data = event.data.as_deref().unwrap_or("").to_owned();
            self.entries.lock().unwrap().push(format!("scan:{data}"));
        }
    }

    struct CaptureSink {
        events: Arc<Mutex<Vec<ScanEvent>>>,
    }

    impl EventSink for CaptureSink {
        fn camera_ready(&self) {}

        fn qr_scanned(&self, event: ScanEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn two_camera_backend() -> MockBackend {
        let backend = MockBackend::new();
        backend.set_devices(vec![
            DeviceDescriptor::new("back-0", "Back Camera", CameraPosition::Back),
            DeviceDescriptor::new("front-0", "Front Camera", CameraPosition::Front),
        ]);
        backend
    }

    fn qr_with_payload(value: &str, payload: Vec<u8>) -> MetadataObject {
        let bounds = Rect::new(0.25, 0.25, 0.5, 0.5);
        MetadataObject::code(
            Symbology::Qr,
            Some(value.into()),
            QrDescriptor::new(payload, 4, 0, ErrorCorrectionLevel::M),
            bounds.corners().to_vec(),
            bounds,
        )
    }

    #[test]
    fn test_ready_fires_once_before_first_scan() {
        let backend = two_camera_backend();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend.clone(),
            Box::new(JournalSink {
                entries: entries.clone(),
            }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();
        view.layout(Rect::new(0.0, 0.0, 320.0, 480.0));

        let _ = view.session_snapshot();
        backend.emit_metadata(vec![qr_with_payload("part", vec![0x31, 0x20])]);
        let _ = view.session_snapshot();

        assert_eq!(
            *entries.lock().unwrap(),
            vec!["ready".to_string(), "scan:part".to_string()]
        );
    }

    #[test]
    fn test_scan_event_in_view_coordinates_with_append_fields() {
        let backend = two_camera_backend();
        let events = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend.clone(),
            Box::new(CaptureSink {
                events: events.clone(),
            }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();
        view.layout(Rect::new(0.0, 0.0, 100.0, 200.0));

        let _ = view.session_snapshot();
        backend.emit_metadata(vec![qr_with_payload("part", vec![0x31, 0x20])]);
        let _ = view.session_snapshot();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.data.as_deref(), Some("part"));
        assert_eq!(event.structured_append_index, Some(1));
        assert_eq!(event.structured_append_total, Some(3));
        assert_eq!(event.corner_points.len(), 4);

        // Sensor rect (0.25, 0.25)..(0.75, 0.75) rotated into a portrait
        // 100x200 frame.
        assert!((event.bounds.origin.x - 25.0).abs() < 1e-9);
        assert!((event.bounds.origin.y - 50.0).abs() < 1e-9);
        assert!((event.bounds.size.width - 50.0).abs() < 1e-9);
        assert!((event.bounds.size.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_facing_accepts_names_and_codes() {
        let backend = two_camera_backend();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend.clone(),
            Box::new(JournalSink { entries }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();

        view.set_camera_facing("front");
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.position, CameraPosition::Front);

        view.set_camera_facing(1);
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.position, CameraPosition::Back);
    }

    #[test]
    fn test_unknown_facing_name_is_ignored() {
        let backend = two_camera_backend();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend.clone(),
            Box::new(JournalSink { entries }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();
        let _ = view.session_snapshot();
        let opened = backend.open_calls();

        view.set_camera_facing("sideways");
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.position, CameraPosition::Back);
        assert_eq!(backend.open_calls(), opened);
    }

    #[test]
    fn test_unknown_code_falls_back_to_unspecified() {
        let backend = two_camera_backend();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend,
            Box::new(JournalSink { entries }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();

        view.set_camera_facing(9);
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.position, CameraPosition::Unspecified);
    }

    #[test]
    fn test_background_suspends_foreground_resumes() {
        let backend = two_camera_backend();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend,
            Box::new(JournalSink {
                entries: entries.clone(),
            }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();

        view.app_entered_background();
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Suspended);
        assert!(snapshot.paused);

        view.app_became_active();
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Running);

        // Resuming must not re-announce readiness.
        assert_eq!(*entries.lock().unwrap(), vec!["ready".to_string()]);
    }

    #[test]
    fn test_unmount_tears_down_session_and_preview() {
        let backend = two_camera_backend();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend,
            Box::new(JournalSink { entries }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();
        view.layout(Rect::new(0.0, 0.0, 100.0, 100.0));

        view.unmount();
        let snapshot = view.session_snapshot().unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Stopped);
        assert_eq!(snapshot.input_count, 0);
        assert_eq!(snapshot.output_count, 0);
        assert!(!view.preview().is_attached());
    }

    #[test]
    fn test_mount_failure_is_recorded_not_thrown() {
        let backend = MockBackend::new();
        backend.set_devices(Vec::new());
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend,
            Box::new(JournalSink {
                entries: entries.clone(),
            }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();

        let _ = view.session_snapshot();
        assert_eq!(
            view.last_mount_error(),
            Some(SessionError::NoCaptureDevice(CameraPosition::Back))
        );
        assert!(entries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_facing_change_failure_recorded_like_mounting() {
        let backend = MockBackend::new();
        let entries = Arc::new(Mutex::new(Vec::new()));
        let view = ScannerView::mount(
            backend,
            Box::new(JournalSink { entries }),
            InterfaceOrientation::Portrait,
            ScannerConfig::default(),
        )
        .unwrap();

        view.set_camera_facing("front");
        let _ = view.session_snapshot();
        assert_eq!(
            view.last_mount_error(),
            Some(SessionError::NoCaptureDevice(CameraPosition::Front))
        );
    }
}
