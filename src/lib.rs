//! QR Scanner View Library
//!
//! Exposes a device camera as a QR-code scanning view to a host UI
//! layer. Provides the capture-session lifecycle and the metadata
//! pipeline that turns detections into scan events, including multi-part
//! ("structured append") QR symbols.
//!
//! # Architecture
//!
//! The system follows an explicit control flow:
//!
//! ```text
//! host hooks → ScannerView → SessionQueue → CaptureSession → CaptureBackend
//!      ↑                                           ↓
//!  scan events  ←  structured-append parse  ←  QR metadata
//! ```
//!
//! # Design Principles
//!
//! - **One worker**: every session mutation runs on the session queue
//!   thread, in issue order
//! - **Mount never throws**: device and permission failures are logged,
//!   the view stays mounted and blank
//! - **QR only**: other symbologies are recognized but never decoded
//! - **Host owns presentation**: the crate emits geometry and payload
//!   data, no UI chrome
//!
//! # Example
//!
//! ```no_run
//! use qr_scanner_view::{
//!     capture::{InterfaceOrientation, MockBackend},
//!     config::ScannerConfig,
//!     geometry::Rect,
//!     scanner::{EventSink, ScanEvent, ScannerView},
//! };
//!
//! struct PrintSink;
//!
//! impl EventSink for PrintSink {
//!     fn camera_ready(&self) {
//!         println!("camera ready");
//!     }
//!
//!     fn qr_scanned(&self, event: ScanEvent) {
//!         println!("scanned: {:?}", event.data);
//!     }
//! }
//!
//! // Mount the view; the session arms itself asynchronously
//! let view = ScannerView::mount(
//!     MockBackend::new(),
//!     Box::new(PrintSink),
//!     InterfaceOrientation::Portrait,
//!     ScannerConfig::default(),
//! )
//! .unwrap();
//!
//! // Keep the preview sized on every layout pass
//! view.layout(Rect::new(0.0, 0.0, 320.0, 480.0));
//!
//! // Host lifecycle hooks
//! view.app_entered_background();
//! view.app_became_active();
//!
//! view.unmount();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod geometry;
pub mod scanner;

// Re-export commonly used types at crate root
pub use capture::{
    AuthorizationStatus, CameraPosition, CaptureBackend, InterfaceOrientation, MockBackend,
    PreviewSurface,
};
pub use config::{FileConfig, RestartPolicy, ScannerConfig};
pub use geometry::{Point, Rect, Size};
pub use scanner::{CameraFacing, EventSink, ScanEvent, ScannerView};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
