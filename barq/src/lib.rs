// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Barq reads Aztec, Data Matrix, MaxiCode, PDF417, QR (and its Micro/rMQR siblings), and the
//! common 1D symbologies from a decoded image.
//!
//! [`read_barcode`] and [`read_barcodes`] are the two entry points most callers need; both take a
//! borrowed [`ImageView`] over the caller's own pixel buffer and a [`ReaderOptions`]. For
//! per-frame reuse (e.g. a video pipeline), construct a [`MultiFormatReader`] once and call
//! [`MultiFormatReader::read`]/[`MultiFormatReader::read_multiple`] directly instead, which skips
//! re-parsing the options on every frame.
//!
//! ```no_run
//! use barq::{read_barcode, BarcodeFormat, ReaderOptions};
//! use barq_core::{ImageView, PixelFormat};
//!
//! let pixels: Vec<u8> = vec![0; 100 * 100];
//! let image = ImageView::new(&pixels, 100, 100, 100, PixelFormat::Lum);
//! let options = ReaderOptions::new().with_formats(BarcodeFormat::QR_CODE);
//! if let Some(barcode) = read_barcode(&image, &options) {
//!     println!("found a {} symbol", barcode.format);
//! }
//! ```

mod barcode;
mod format;
mod gs1;
mod options;
mod reader;

pub use barcode::{Barcode, SequenceInfo};
pub use format::BarcodeFormat;
pub use gs1::{parse as parse_gs1, to_hri as gs1_to_hri, ApplicationIdentifier};
pub use options::ReaderOptions;
pub use reader::MultiFormatReader;

use std::collections::HashMap;

use barq_core::{Content, Eci, Error, ImageView, PointF, Quadrilateral};

/// Decode the first valid barcode found in `image`, per `options`.
pub fn read_barcode(image: &ImageView<'_>, options: &ReaderOptions) -> Option<Barcode> {
    MultiFormatReader::new(*options).read(image)
}

/// Decode every barcode found in `image`, per `options`.
pub fn read_barcodes(image: &ImageView<'_>, options: &ReaderOptions) -> Vec<Barcode> {
    MultiFormatReader::new(*options).read_multiple(image)
}

/// Concatenate Structured Append sequence members reported by [`read_barcodes`] into a single
/// `Barcode` per complete sequence, in `sequence.index` order. Barcodes that aren't part of a
/// sequence pass through unchanged; a sequence missing one or more of its members (fewer decoded
/// barcodes share its `(format, id, count)` than `count` calls for) is left unmerged, its members
/// returned individually rather than guessed at.
pub fn merge_structured_append_sequences(barcodes: Vec<Barcode>) -> Vec<Barcode> {
    let mut result = Vec::new();
    let mut groups: HashMap<(BarcodeFormat, Option<String>, u8), Vec<Barcode>> = HashMap::new();

    for barcode in barcodes {
        if barcode.sequence.is_part_of_sequence() {
            let key = (barcode.format, barcode.sequence.id.clone(), barcode.sequence.count);
            groups.entry(key).or_default().push(barcode);
        } else {
            result.push(barcode);
        }
    }

    for ((_, _, count), mut members) in groups {
        if members.len() as u8 != count {
            result.extend(members);
            continue;
        }
        members.sort_by_key(|b| b.sequence.index);

        let mut content = Content::new();
        for member in &members {
            content.push_bytes(Eci::Default, &member.bytes());
        }
        if members.iter().any(|b| b.is_gs1()) {
            content.mark_gs1();
        }

        let first = members.first().expect("count > 0 checked above");
        let corners = first.position;
        let position = Quadrilateral::new(
            PointF::new(corners[0].x as f32, corners[0].y as f32),
            PointF::new(corners[1].x as f32, corners[1].y as f32),
            PointF::new(corners[2].x as f32, corners[2].y as f32),
            PointF::new(corners[3].x as f32, corners[3].y as f32),
        );
        let merged = Barcode::new(
            first.format,
            content,
            Error::none(),
            position,
            first.orientation,
            first.symbology_identifier.clone(),
        )
        .with_inverted(first.is_inverted)
        .with_mirrored(first.is_mirrored)
        .with_ec_level(first.ec_level.clone());
        result.push(merged);
    }

    result.sort_by_key(|b| (b.position[0].y, b.position[0].x));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use barcode::SequenceInfo;

    fn quad() -> Quadrilateral {
        Quadrilateral::new(
            PointF::new(0.0, 0.0),
            PointF::new(10.0, 0.0),
            PointF::new(10.0, 10.0),
            PointF::new(0.0, 10.0),
        )
    }

    fn member(index: u8, count: u8, id: &str, text: &[u8]) -> Barcode {
        let mut content = Content::new();
        content.push_bytes(Eci::Default, text);
        Barcode::new(BarcodeFormat::QR_CODE, content, Error::none(), quad(), 0, None)
            .with_sequence(SequenceInfo { index, count, id: Some(id.to_string()) })
    }

    #[test]
    fn a_complete_sequence_is_concatenated_in_index_order() {
        let barcodes = vec![member(1, 2, "s", b"world"), member(0, 2, "s", b"hello ")];
        let merged = merge_structured_append_sequences(barcodes);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bytes(), b"hello world");
    }

    #[test]
    fn a_partial_sequence_is_left_unmerged() {
        let barcodes = vec![member(0, 3, "s", b"a"), member(1, 3, "s", b"b")];
        let merged = merge_structured_append_sequences(barcodes);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn barcodes_outside_a_sequence_pass_through_unchanged() {
        let mut content = Content::new();
        content.push_bytes(Eci::Default, b"solo");
        let solo = Barcode::new(BarcodeFormat::QR_CODE, content, Error::none(), quad(), 0, None);
        let merged = merge_structured_append_sequences(vec![solo]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bytes(), b"solo");
    }
}
