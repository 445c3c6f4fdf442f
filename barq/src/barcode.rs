// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Barcode`: a located, decoded (or attempted) symbol, the public result type of `read_barcode`
//! and `read_barcodes`.

use barq_core::{Content, ContentType, Error, ErrorKind, PointI, Quadrilateral, TextMode};

use crate::format::BarcodeFormat;

/// Structured Append sequence info surfaced on a public `Barcode`, a plain-data mirror of
/// `barq_core::StructuredAppendInfo` (kept separate so `barq_core` has no public dependency on
/// this crate's naming).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceInfo {
    pub index: u8,
    pub count: u8,
    pub id: Option<String>,
}

impl SequenceInfo {
    pub fn is_part_of_sequence(&self) -> bool {
        self.count > 1
    }
}

/// A single decoded (or partially located) barcode.
#[derive(Debug, Clone)]
pub struct Barcode {
    pub format: BarcodeFormat,
    content: Content,
    error: Error,
    /// The four corners of the symbol in the original (pre-rotation, pre-downscale) image, in
    /// pixel coordinates.
    pub position: [PointI; 4],
    /// Rotation, in degrees clockwise, applied to the image before this symbol was found.
    pub orientation: u32,
    pub is_mirrored: bool,
    pub is_inverted: bool,
    pub sequence: SequenceInfo,
    /// Corroborating row-scan count for 1D symbologies; always 0 for 2D symbologies.
    pub line_count: u32,
    pub ec_level: Option<String>,
    /// The AIM symbology identifier, e.g. `]Q1` for a model 1 QR code.
    pub symbology_identifier: Option<String>,
    pub reader_init: bool,
}

impl Barcode {
    pub(crate) fn new(
        format: BarcodeFormat,
        content: Content,
        error: Error,
        position: Quadrilateral,
        orientation: u32,
        symbology_identifier: Option<String>,
    ) -> Self {
        Barcode {
            format,
            content,
            error,
            position: position.to_points_i32(),
            orientation,
            is_mirrored: false,
            is_inverted: false,
            sequence: SequenceInfo::default(),
            line_count: 0,
            ec_level: None,
            symbology_identifier,
            reader_init: false,
        }
    }

    pub(crate) fn with_inverted(mut self, value: bool) -> Self {
        self.is_inverted = value;
        self
    }

    pub(crate) fn with_mirrored(mut self, value: bool) -> Self {
        self.is_mirrored = value;
        self
    }

    pub(crate) fn with_sequence(mut self, sequence: SequenceInfo) -> Self {
        self.sequence = sequence;
        self
    }

    pub(crate) fn with_line_count(mut self, count: u32) -> Self {
        self.line_count = count;
        self
    }

    pub(crate) fn with_ec_level(mut self, level: Option<String>) -> Self {
        self.ec_level = level;
        self
    }

    pub(crate) fn with_reader_init(mut self, value: bool) -> Self {
        self.reader_init = value;
        self
    }

    /// `true` when decoding succeeded with no error of any kind.
    pub fn is_valid(&self) -> bool {
        self.error.kind() == ErrorKind::None
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn error_message(&self) -> &'static str {
        self.error.message()
    }

    /// The decoded payload rendered as text, per `mode`.
    pub fn text(&self, mode: TextMode) -> barq_core::Result<String> {
        self.content.text(mode)
    }

    /// The raw decoded byte payload, with no character-set interpretation applied.
    pub fn bytes(&self) -> Vec<u8> {
        self.content.bytes()
    }

    pub fn content_type(&self) -> ContentType {
        self.content.content_type()
    }

    pub fn is_gs1(&self) -> bool {
        matches!(self.content_type(), ContentType::Gs1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barq_core::PointF;

    fn quad() -> Quadrilateral {
        Quadrilateral::new(
            PointF::new(0.0, 0.0),
            PointF::new(10.0, 0.0),
            PointF::new(10.0, 10.0),
            PointF::new(0.0, 10.0),
        )
    }

    #[test]
    fn a_fresh_barcode_from_a_none_error_is_valid() {
        let barcode =
            Barcode::new(BarcodeFormat::QR_CODE, Content::new(), Error::none(), quad(), 0, None);
        assert!(barcode.is_valid());
    }

    #[test]
    fn a_format_error_makes_the_barcode_invalid() {
        let barcode = Barcode::new(
            BarcodeFormat::QR_CODE,
            Content::new(),
            Error::format("bad"),
            quad(),
            0,
            None,
        );
        assert!(!barcode.is_valid());
        assert_eq!(barcode.error_kind(), ErrorKind::Format);
    }
}
