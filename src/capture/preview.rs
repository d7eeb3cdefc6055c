//! Preview surface shared between the host view and the capture session.
//!
//! The surface models the video preview layer the host renders into: its
//! frame in view coordinates, its video orientation, and whether it is
//! currently attached to a view hierarchy. The session configures it while
//! arming the pipeline; the host updates its frame on layout passes. Both
//! sides hold the same cloneable handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::capture::metadata::MetadataObject;
use crate::capture::orientation::VideoOrientation;
use crate::geometry::{Point, Rect};

/// How video is scaled to fit the surface frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoGravity {
    /// Preserve aspect ratio, letterboxing as needed.
    ResizeAspect,
    /// Preserve aspect ratio, cropping to fill the frame.
    #[default]
    ResizeAspectFill,
    /// Stretch to fill the frame.
    Resize,
}

/// Background color painted behind the video, as RGBA bytes.
pub const BACKGROUND_RGBA: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug)]
struct PreviewState {
    frame: Rect,
    orientation: VideoOrientation,
    gravity: VideoGravity,
    attached: bool,
    orientation_supported: bool,
}

/// Shared handle to the preview layer state.
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    state: Arc<Mutex<PreviewState>>,
}

impl PreviewSurface {
    /// Creates a detached surface with a zero frame.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PreviewState {
                frame: Rect::default(),
                orientation: VideoOrientation::default(),
                gravity: VideoGravity::default(),
                attached: false,
                orientation_supported: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attaches the surface to the host view hierarchy.
    pub fn attach(&self) {
        self.lock().attached = true;
    }

    /// Detaches the surface from the host view hierarchy.
    pub fn detach(&self) {
        self.lock().attached = false;
    }

    /// Returns whether the surface is attached.
    pub fn is_attached(&self) -> bool {
        self.lock().attached
    }

    /// Sets the frame, in host view coordinates.
    pub fn set_frame(&self, frame: Rect) {
        self.lock().frame = frame;
    }

    /// Returns the frame, in host view coordinates.
    pub fn frame(&self) -> Rect {
        self.lock().frame
    }

    /// Sets the video orientation.
    ///
    /// Ignored when the underlying connection does not support orientation
    /// changes.
    pub fn set_orientation(&self, orientation: VideoOrientation) {
        let mut state = self.lock();
        if state.orientation_supported {
            state.orientation = orientation;
        }
    }

    /// Returns the current video orientation.
    pub fn orientation(&self) -> VideoOrientation {
        self.lock().orientation
    }

    /// Marks whether the connection supports orientation changes.
    pub fn set_orientation_supported(&self, supported: bool) {
        self.lock().orientation_supported = supported;
    }

    /// Returns the video gravity.
    pub fn gravity(&self) -> VideoGravity {
        self.lock().gravity
    }

    /// Maps a metadata object from normalized sensor space into the
    /// surface's view coordinates.
    ///
    /// Corners are rotated per the current video orientation and scaled
    /// onto the frame; bounds are recomputed as the axis-aligned hull of
    /// the rotated bounds corners. The mapping assumes the video fills the
    /// frame, which matches the default fill gravity.
    pub fn transform_metadata(&self, object: &MetadataObject) -> MetadataObject {
        let (frame, orientation) = {
            let state = self.lock();
            (state.frame, state.orientation)
        };

        let project = |p: Point| -> Point {
            let rotated = orientation.apply_to_normalized(p);
            Point {
                x: frame.origin.x + rotated.x * frame.size.width,
                y: frame.origin.y + rotated.y * frame.size.height,
            }
        };

        let corners: Vec<Point> = object.corners().iter().copied().map(project).collect();
        let hull: Vec<Point> = object.bounds().corners().iter().copied().map(project).collect();

        object.with_geometry(corners, Rect::bounding(&hull))
    }
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::metadata::Symbology;

    fn code_at(bounds: Rect) -> MetadataObject {
        MetadataObject::code(
            Symbology::Qr,
            Some("test".into()),
            None,
            bounds.corners().to_vec(),
            bounds,
        )
    }

    #[test]
    fn test_orientation_ignored_when_unsupported() {
        let surface = PreviewSurface::new();
        surface.set_orientation_supported(false);
        surface.set_orientation(VideoOrientation::LandscapeLeft);
        assert_eq!(surface.orientation(), VideoOrientation::Portrait);
    }

    #[test]
    fn test_attach_detach_round_trip() {
        let surface = PreviewSurface::new();
        assert!(!surface.is_attached());
        surface.attach();
        assert!(surface.is_attached());
        surface.detach();
        assert!(!surface.is_attached());
    }

    #[test]
    fn test_portrait_transform_rotates_into_frame() {
        let surface = PreviewSurface::new();
        surface.set_frame(Rect::new(0.0, 0.0, 100.0, 200.0));
        surface.set_orientation(VideoOrientation::Portrait);

        let mapped = surface.transform_metadata(&code_at(Rect::new(0.0, 0.0, 0.5, 0.5)));

        // Sensor-space (0, 0) lands at the top-right of a portrait frame.
        assert_eq!(mapped.corners()[0], Point { x: 100.0, y: 0.0 });
        let bounds = mapped.bounds();
        assert!((bounds.origin.x - 50.0).abs() < 1e-9);
        assert!((bounds.origin.y - 0.0).abs() < 1e-9);
        assert!((bounds.size.width - 50.0).abs() < 1e-9);
        assert!((bounds.size.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_landscape_right_transform_is_scale_only() {
        let surface = PreviewSurface::new();
        surface.set_frame(Rect::new(10.0, 20.0, 200.0, 100.0));
        surface.set_orientation(VideoOrientation::LandscapeRight);

        let mapped = surface.transform_metadata(&code_at(Rect::new(0.25, 0.5, 0.5, 0.25)));

        let bounds = mapped.bounds();
        assert!((bounds.origin.x - 60.0).abs() < 1e-9);
        assert!((bounds.origin.y - 70.0).abs() < 1e-9);
        assert!((bounds.size.width - 100.0).abs() < 1e-9);
        assert!((bounds.size.height - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_upside_down_transform_is_reverse_quarter_turn() {
        let surface = PreviewSurface::new();
        surface.set_frame(Rect::new(0.0, 0.0, 100.0, 200.0));
        surface.set_orientation(VideoOrientation::PortraitUpsideDown);

        let mapped = surface.transform_metadata(&code_at(Rect::new(0.0, 0.0, 0.5, 0.25)));

        // Sensor-space (0, 0) lands at the bottom-left of the frame.
        assert_eq!(mapped.corners()[0], Point { x: 0.0, y: 200.0 });
        let bounds = mapped.bounds();
        assert!((bounds.origin.x - 0.0).abs() < 1e-9);
        assert!((bounds.origin.y - 100.0).abs() < 1e-9);
        assert!((bounds.size.width - 25.0).abs() < 1e-9);
        assert!((bounds.size.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_landscape_left_transform_is_half_turn() {
        let surface = PreviewSurface::new();
        surface.set_frame(Rect::new(10.0, 20.0, 200.0, 100.0));
        surface.set_orientation(VideoOrientation::LandscapeLeft);

        let mapped = surface.transform_metadata(&code_at(Rect::new(0.125, 0.25, 0.25, 0.25)));

        // Sensor-space (0.125, 0.25) lands mirrored through the frame
        // center.
        assert_eq!(mapped.corners()[0], Point { x: 185.0, y: 95.0 });
        let bounds = mapped.bounds();
        assert!((bounds.origin.x - 135.0).abs() < 1e-9);
        assert!((bounds.origin.y - 70.0).abs() < 1e-9);
        assert!((bounds.size.width - 50.0).abs() < 1e-9);
        assert!((bounds.size.height - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_preserves_payload() {
        let surface = PreviewSurface::new();
        surface.set_frame(Rect::new(0.0, 0.0, 50.0, 50.0));

        let object = code_at(Rect::new(0.1, 0.1, 0.3, 0.3));
        let mapped = surface.transform_metadata(&object);

        assert_eq!(mapped.payload(), object.payload());
        assert_eq!(mapped.corners().len(), object.corners().len());
    }
}
