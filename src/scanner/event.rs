//! Host-facing scan event payload.

use serde::Serialize;

use crate::capture::MetadataObject;
use crate::geometry::{Point, Rect};
use crate::scanner::structured_append::StructuredAppend;

/// One detected QR code, enriched for the host UI.
///
/// Serializes to the wire contract the host consumes: camelCase keys,
/// `data` present even when null, structured-append fields omitted for
/// stand-alone symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    /// Decoded display string, when the pipeline produced one.
    pub data: Option<String>,
    /// Symbol corners in view coordinates, clockwise.
    pub corner_points: Vec<Point>,
    /// Bounding rectangle in view coordinates.
    pub bounds: Rect,
    /// Zero-based position within a multi-symbol message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_append_index: Option<u8>,
    /// Number of symbols in the multi-symbol message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_append_total: Option<u8>,
}

impl ScanEvent {
    /// Builds an event from a detected metadata object.
    ///
    /// Returns `None` unless the object carries a valid QR descriptor.
    /// The structured-append fields are filled from the descriptor's
    /// codeword payload when its header is present.
    pub fn from_detection(object: &MetadataObject) -> Option<Self> {
        let descriptor = object.qr_descriptor()?;
        let header = StructuredAppend::parse(descriptor.error_corrected_payload());

        Some(Self {
            data: object.string_value().map(str::to_owned),
            corner_points: object.corners().to_vec(),
            bounds: object.bounds(),
            structured_append_index: header.map(|h| h.index()),
            structured_append_total: header.map(|h| h.total()),
        })
    }
}
