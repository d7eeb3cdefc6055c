//! QR Scanner Demo CLI
//!
//! Command-line interface for demonstrating the scanner view against
//! the mock capture backend.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use qr_scanner_view::{
    capture::{
        CameraPosition, DeviceDescriptor, ErrorCorrectionLevel, InterfaceOrientation,
        MetadataObject, MockBackend, QrDescriptor, Symbology,
    },
    config::FileConfig,
    geometry::Rect,
    scanner::{EventSink, ScanEvent, ScannerView},
};
use tracing::{info, warn};

/// Scans synthetic QR codes through the mock capture backend.
#[derive(Parser)]
#[command(name = "qr-scanner-demo")]
#[command(about = "Demonstrates the QR scanner view over a mock camera")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera facing to request after mounting ("front" or "back")
    #[arg(long)]
    camera: Option<String>,

    /// Number of synthetic scans to emit
    #[arg(short, long)]
    scans: Option<u32>,

    /// Keep scanning until interrupted
    #[arg(long)]
    continuous: bool,
}

struct PrintSink;

impl EventSink for PrintSink {
    fn camera_ready(&self) {
        info!("Camera ready");
    }

    fn qr_scanned(&self, event: ScanEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to encode scan event: {}", e),
        }
    }
}

/// Builds a detection the way the platform pipeline would report it.
///
/// `header` carries the first two codeword bytes, enough for the
/// structured-append parse.
fn synthetic_scan(value: &str, header: [u8; 2]) -> MetadataObject {
    let bounds = Rect::new(0.25, 0.25, 0.5, 0.5);
    MetadataObject::code(
        Symbology::Qr,
        Some(value.to_owned()),
        QrDescriptor::new(header.to_vec(), 4, 0, ErrorCorrectionLevel::M),
        bounds.corners().to_vec(),
        bounds,
    )
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("QR Scanner Demo v{}", qr_scanner_view::VERSION);
    info!("This is a demonstration using mock camera input");

    // Load configuration
    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(scans) = args.scans {
        config.demo.scan_count = scans;
    }
    if args.continuous {
        config.demo.continuous = true;
    }
    if let Err(e) = config.demo.validate() {
        eprintln!("Invalid demo configuration: {}", e);
        std::process::exit(1);
    }

    // Mock camera hardware
    let backend = MockBackend::new();
    backend.set_devices(vec![
        DeviceDescriptor::new("demo-back-0", "Demo Back Camera", CameraPosition::Back),
        DeviceDescriptor::new("demo-front-0", "Demo Front Camera", CameraPosition::Front),
    ]);

    let view = match ScannerView::mount(
        backend.clone(),
        Box::new(PrintSink),
        InterfaceOrientation::Portrait,
        config.scanner.clone(),
    ) {
        Ok(view) => view,
        Err(e) => {
            eprintln!("Failed to mount scanner view: {}", e);
            std::process::exit(1);
        }
    };
    view.layout(Rect::new(0.0, 0.0, 320.0, 480.0));

    if let Some(camera) = &args.camera {
        view.set_camera_facing(camera.as_str());
    }

    let _ = view.session_snapshot();
    if let Some(error) = view.last_mount_error() {
        warn!("Session failed to arm: {}", error);
    }

    // Synthetic scans: a three-part structured-append message followed
    // by a stand-alone code.
    let catalog = [
        ("part-1", [0x30, 0x20]),
        ("part-2", [0x31, 0x20]),
        ("part-3", [0x32, 0x20]),
        ("stand-alone", [0x40, 0x0A]),
    ];

    let running = Arc::new(AtomicBool::new(true));
    if config.demo.continuous {
        let flag = running.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
            eprintln!("Failed to install interrupt handler: {}", e);
            std::process::exit(1);
        }
        info!("Scanning continuously; press Ctrl-C to stop");
    } else {
        info!("Emitting {} synthetic scans...", config.demo.scan_count);
    }

    let interval = Duration::from_millis(config.demo.scan_interval_ms);
    let mut emitted: u32 = 0;
    while running.load(Ordering::SeqCst) {
        if !config.demo.continuous && emitted >= config.demo.scan_count {
            break;
        }
        let (value, header) = catalog[(emitted as usize) % catalog.len()];
        backend.emit_metadata(vec![synthetic_scan(value, header)]);
        emitted = emitted.wrapping_add(1);
        std::thread::sleep(interval);
    }

    // Drain the worker before tearing down
    let _ = view.session_snapshot();
    view.unmount();

    info!("Done. Emitted {} scans", emitted);
}
