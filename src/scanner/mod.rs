//! Host-facing scanner layer.
//!
//! Sits on top of the capture module: [`ScannerView`] owns a session
//! queue and a preview surface, feeds host lifecycle hooks into the
//! session, and turns detections into [`ScanEvent`]s on the host's
//! [`EventSink`], filling the structured-append fields from the QR
//! codeword payload.

mod event;
mod structured_append;
mod view;

pub use event::ScanEvent;
pub use structured_append::StructuredAppend;
pub use view::{CameraFacing, EventSink, ScannerView};
