//! Interface and video orientation handling.
//!
//! The host UI reports its logical rotation as an interface orientation;
//! the capture pipeline speaks video orientations. The mapping is total:
//! anything that is not one of the four cardinal orientations falls back
//! to portrait.

use crate::geometry::Point;

/// Logical rotation of the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceOrientation {
    /// Orientation could not be determined.
    Unknown,
    /// Device upright.
    #[default]
    Portrait,
    /// Device upside down.
    PortraitUpsideDown,
    /// Device rotated with the top to the left.
    LandscapeLeft,
    /// Device rotated with the top to the right.
    LandscapeRight,
}

/// Rotation applied to the capture pipeline's video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoOrientation {
    /// Upright video.
    #[default]
    Portrait,
    /// Video rotated 180 degrees.
    PortraitUpsideDown,
    /// Video rotated for a top-to-the-left device.
    LandscapeLeft,
    /// Video rotated for a top-to-the-right device.
    LandscapeRight,
}

impl VideoOrientation {
    /// Maps an interface orientation onto a video orientation.
    ///
    /// Each cardinal orientation maps to its namesake; anything else
    /// defaults to portrait.
    pub fn for_interface(orientation: InterfaceOrientation) -> Self {
        match orientation {
            InterfaceOrientation::Portrait => Self::Portrait,
            InterfaceOrientation::PortraitUpsideDown => Self::PortraitUpsideDown,
            InterfaceOrientation::LandscapeLeft => Self::LandscapeLeft,
            InterfaceOrientation::LandscapeRight => Self::LandscapeRight,
            _ => Self::Portrait,
        }
    }

    /// Rotates a point in normalized sensor space into this orientation.
    ///
    /// Sensor geometry arrives normalized to [0,1]×[0,1] in the sensor's
    /// native landscape-right space. All four mappings are proper
    /// rotations, so the cyclic (clockwise) order of corner sequences is
    /// preserved.
    pub fn apply_to_normalized(&self, p: Point) -> Point {
        match self {
            Self::LandscapeRight => p,
            Self::Portrait => Point::new(1.0 - p.y, p.x),
            Self::LandscapeLeft => Point::new(1.0 - p.x, 1.0 - p.y),
            Self::PortraitUpsideDown => Point::new(p.y, 1.0 - p.x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_orientations_map_to_namesakes() {
        assert_eq!(
            VideoOrientation::for_interface(InterfaceOrientation::Portrait),
            VideoOrientation::Portrait
        );
        assert_eq!(
            VideoOrientation::for_interface(InterfaceOrientation::PortraitUpsideDown),
            VideoOrientation::PortraitUpsideDown
        );
        assert_eq!(
            VideoOrientation::for_interface(InterfaceOrientation::LandscapeLeft),
            VideoOrientation::LandscapeLeft
        );
        assert_eq!(
            VideoOrientation::for_interface(InterfaceOrientation::LandscapeRight),
            VideoOrientation::LandscapeRight
        );
    }

    #[test]
    fn test_unknown_defaults_to_portrait() {
        assert_eq!(
            VideoOrientation::for_interface(InterfaceOrientation::Unknown),
            VideoOrientation::Portrait
        );
    }

    #[test]
    fn test_landscape_right_is_identity() {
        let p = Point::new(0.25, 0.75);
        assert_eq!(VideoOrientation::LandscapeRight.apply_to_normalized(p), p);
    }

    #[test]
    fn test_portrait_rotates_quarter_turn() {
        // Sensor top-left lands at the display top-right under a 90° turn
        let corner = Point::new(0.0, 0.0);
        assert_eq!(
            VideoOrientation::Portrait.apply_to_normalized(corner),
            Point::new(1.0, 0.0)
        );
    }

    #[test]
    fn test_half_turn_composes_two_quarter_turns() {
        let p = Point::new(0.2, 0.6);
        // LandscapeLeft is the half turn relative to the sensor's native
        // landscape-right space
        let half = VideoOrientation::LandscapeLeft.apply_to_normalized(p);
        let two_quarters = VideoOrientation::Portrait
            .apply_to_normalized(VideoOrientation::Portrait.apply_to_normalized(p));

        assert_eq!(half, two_quarters);
    }

    #[test]
    fn test_rotations_stay_in_unit_square() {
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 0.5),
            Point::new(0.1, 0.9),
        ];
        let orientations = [
            VideoOrientation::Portrait,
            VideoOrientation::PortraitUpsideDown,
            VideoOrientation::LandscapeLeft,
            VideoOrientation::LandscapeRight,
        ];

        for orientation in orientations {
            for p in samples {
                let rotated = orientation.apply_to_normalized(p);
                assert!((0.0..=1.0).contains(&rotated.x));
                assert!((0.0..=1.0).contains(&rotated.y));
            }
        }
    }
}
