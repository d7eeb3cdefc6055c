//! Camera position (device facing).

use serde::{Deserialize, Serialize};

/// Which physical camera a session should read from.
///
/// Mirrors the platform position codes: 0 = unspecified, 1 = back,
/// 2 = front. `Unspecified` configures a session without starting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    /// No particular device; the session configures but does not start.
    Unspecified,
    /// Rear-facing camera (the default for scanning).
    #[default]
    Back,
    /// Front-facing camera.
    Front,
}

impl CameraPosition {
    /// Resolves a platform numeric position code.
    ///
    /// Returns `None` for codes with no known position.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unspecified),
            1 => Some(Self::Back),
            2 => Some(Self::Front),
            _ => None,
        }
    }

    /// Returns the platform numeric code for this position.
    #[inline]
    pub fn code(&self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Back => 1,
            Self::Front => 2,
        }
    }

    /// Returns the lowercase position name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Back => "back",
            Self::Front => "front",
        }
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
