//! Camera capture pipeline.
//!
//! This module owns the session side of the scanner: resolving a device,
//! wiring inputs and the metadata output, running the platform pipeline
//! through the [`CaptureBackend`] seam, and serializing every mutation on
//! the session worker. Detection results leave through a
//! [`SessionObserver`]; the view layer turns them into scan events.

mod backend;
mod metadata;
mod orientation;
mod position;
mod preview;
mod queue;
mod session;

pub use backend::{
    AuthorizationStatus, BackendError, CaptureBackend, DeviceDescriptor, DeviceInput,
    MetadataSink, MockBackend,
};
pub use metadata::{ErrorCorrectionLevel, MetadataObject, MetadataPayload, QrDescriptor, Symbology};
pub use orientation::{InterfaceOrientation, VideoOrientation};
pub use position::CameraPosition;
pub use preview::{PreviewSurface, VideoGravity, BACKGROUND_RGBA};
pub use queue::SessionQueue;
pub use session::{
    CaptureSession, MetadataOutput, SessionError, SessionObserver, SessionPhase, SessionSnapshot,
};
