//! Detected-code metadata delivered by the platform vision pipeline.
//!
//! A backend reports each recognized region of a frame as a
//! [`MetadataObject`]: geometry plus, for machine-readable codes, the
//! decoded contents. Only QR descriptors carry symbol-level detail; other
//! symbologies are recognized but never decoded by this crate.

use crate::geometry::{Point, Rect};

/// Machine-readable symbologies a vision pipeline may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    /// QR Code (the only symbology this crate decodes).
    Qr,
    /// Aztec Code.
    Aztec,
    /// Data Matrix.
    DataMatrix,
    /// PDF417.
    Pdf417,
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrectionLevel {
    /// Low (~7% recovery capacity).
    L,
    /// Medium (~15% recovery capacity).
    M,
    /// Quartile (~25% recovery capacity).
    Q,
    /// High (~30% recovery capacity).
    H,
}

/// Symbol-level detail for a decoded QR code.
///
/// Carries the error-corrected codeword payload along with the symbol
/// parameters the decoder recovered. The payload bytes are the raw
/// codeword stream, mode indicators included, which is what
/// structured-append parsing reads.
#[derive(Clone, PartialEq)]
pub struct QrDescriptor {
    error_corrected_payload: Vec<u8>,
    symbol_version: u8,
    mask_pattern: u8,
    error_correction: ErrorCorrectionLevel,
}

impl QrDescriptor {
    /// Builds a descriptor, validating the symbol parameters.
    ///
    /// Returns `None` for versions outside 1–40 or mask patterns outside
    /// 0–7; a pipeline reporting those handed us a malformed descriptor.
    pub fn new(
        error_corrected_payload: Vec<u8>,
        symbol_version: u8,
        mask_pattern: u8,
        error_correction: ErrorCorrectionLevel,
    ) -> Option<Self> {
        if symbol_version == 0 || symbol_version > 40 {
            return None;
        }
        if mask_pattern > 7 {
            return None;
        }

        Some(Self {
            error_corrected_payload,
            symbol_version,
            mask_pattern,
            error_correction,
        })
    }

    /// Returns the error-corrected codeword payload.
    #[inline]
    pub fn error_corrected_payload(&self) -> &[u8] {
        &self.error_corrected_payload
    }

    /// Returns the symbol version (1–40).
    #[inline]
    pub fn symbol_version(&self) -> u8 {
        self.symbol_version
    }

    /// Returns the mask pattern (0–7).
    #[inline]
    pub fn mask_pattern(&self) -> u8 {
        self.mask_pattern
    }

    /// Returns the error correction level.
    #[inline]
    pub fn error_correction(&self) -> ErrorCorrectionLevel {
        self.error_correction
    }
}

impl std::fmt::Debug for QrDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrDescriptor")
            .field("payload_bytes", &self.error_corrected_payload.len())
            .field("symbol_version", &self.symbol_version)
            .field("mask_pattern", &self.mask_pattern)
            .field("error_correction", &self.error_correction)
            .finish()
    }
}

/// Contents of a detected region.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataPayload {
    /// A machine-readable code with its decoded contents.
    Code {
        /// The recognized symbology.
        symbology: Symbology,
        /// Decoded display string, when the pipeline could produce one.
        string_value: Option<String>,
        /// Symbol-level detail; present only for well-formed QR codes.
        descriptor: Option<QrDescriptor>,
    },
    /// A detected region with no decodable content (faces, bodies, …).
    Region,
}

/// A region of a video frame recognized by the platform vision pipeline.
///
/// Geometry is normalized to the sensor's native landscape space until
/// mapped through the preview transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataObject {
    bounds: Rect,
    corners: Vec<Point>,
    payload: MetadataPayload,
}

impl MetadataObject {
    /// Creates a machine-readable code object.
    ///
    /// `corners` are expected to be the four symbol corners, clockwise.
    pub fn code(
        symbology: Symbology,
        string_value: Option<String>,
        descriptor: Option<QrDescriptor>,
        corners: Vec<Point>,
        bounds: Rect,
    ) -> Self {
        Self {
            bounds,
            corners,
            payload: MetadataPayload::Code {
                symbology,
                string_value,
                descriptor,
            },
        }
    }

    /// Creates a non-code detection (e.g. a face region).
    pub fn region(bounds: Rect) -> Self {
        Self {
            bounds,
            corners: Vec::new(),
            payload: MetadataPayload::Region,
        }
    }

    /// Returns the bounding rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns the corner points, clockwise.
    #[inline]
    pub fn corners(&self) -> &[Point] {
        &self.corners
    }

    /// Returns the payload classification.
    #[inline]
    pub fn payload(&self) -> &MetadataPayload {
        &self.payload
    }

    /// Returns the symbology for machine-readable codes.
    pub fn symbology(&self) -> Option<Symbology> {
        match self.payload {
            MetadataPayload::Code { symbology, .. } => Some(symbology),
            MetadataPayload::Region => None,
        }
    }

    /// Returns the decoded display string, if any.
    pub fn string_value(&self) -> Option<&str> {
        match &self.payload {
            MetadataPayload::Code { string_value, .. } => string_value.as_deref(),
            MetadataPayload::Region => None,
        }
    }

    /// Returns the QR descriptor for valid QR code objects.
    ///
    /// `None` for non-code regions, non-QR symbologies, and codes whose
    /// descriptor was malformed.
    pub fn qr_descriptor(&self) -> Option<&QrDescriptor> {
        match &self.payload {
            MetadataPayload::Code {
                symbology: Symbology::Qr,
                descriptor: Some(descriptor),
                ..
            } => Some(descriptor),
            _ => None,
        }
    }

    /// Returns a copy of this object with new geometry.
    ///
    /// Used by the preview transform; the payload is untouched.
    pub fn with_geometry(&self, corners: Vec<Point>, bounds: Rect) -> Self {
        Self {
            bounds,
            corners,
            payload: self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(payload: Vec<u8>) -> QrDescriptor {
        QrDescriptor::new(payload, 2, 3, ErrorCorrectionLevel::M).unwrap()
    }

    #[test]
    fn test_descriptor_rejects_bad_version() {
        assert!(QrDescriptor::new(vec![0x40], 0, 0, ErrorCorrectionLevel::L).is_none());
        assert!(QrDescriptor::new(vec![0x40], 41, 0, ErrorCorrectionLevel::L).is_none());
    }

    #[test]
    fn test_descriptor_rejects_bad_mask() {
        assert!(QrDescriptor::new(vec![0x40], 1, 8, ErrorCorrectionLevel::L).is_none());
    }

    #[test]
    fn test_descriptor_accepts_valid_parameters() {
        let d = QrDescriptor::new(vec![0x40, 0x01], 40, 7, ErrorCorrectionLevel::H);
        assert!(d.is_some());
    }

    #[test]
    fn test_qr_descriptor_only_for_valid_qr_codes() {
        let bounds = Rect::new(0.1, 0.1, 0.2, 0.2);

        let region = MetadataObject::region(bounds);
        assert!(region.qr_descriptor().is_none());

        let aztec = MetadataObject::code(Symbology::Aztec, None, None, Vec::new(), bounds);
        assert!(aztec.qr_descriptor().is_none());

        let missing =
            MetadataObject::code(Symbology::Qr, Some("x".into()), None, Vec::new(), bounds);
        assert!(missing.qr_descriptor().is_none());

        let valid = MetadataObject::code(
            Symbology::Qr,
            Some("x".into()),
            Some(descriptor(vec![0x40])),
            Vec::new(),
            bounds,
        );
        assert!(valid.qr_descriptor().is_some());
    }

    #[test]
    fn test_with_geometry_preserves_payload() {
        let original = MetadataObject::code(
            Symbology::Qr,
            Some("payload".into()),
            Some(descriptor(vec![0x31, 0x20])),
            Rect::new(0.0, 0.0, 1.0, 1.0).corners().to_vec(),
            Rect::new(0.0, 0.0, 1.0, 1.0),
        );

        let moved = original.with_geometry(
            Rect::new(10.0, 10.0, 50.0, 50.0).corners().to_vec(),
            Rect::new(10.0, 10.0, 50.0, 50.0),
        );

        assert_eq!(moved.payload(), original.payload());
        assert_eq!(moved.bounds(), Rect::new(10.0, 10.0, 50.0, 50.0));
    }
}
