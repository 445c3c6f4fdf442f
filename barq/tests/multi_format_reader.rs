// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end `MultiFormatReader` tests: a hand-built pixel buffer for a linear symbology, run
//! through binarization, row-scanning, and decoding exactly as a real caller would.

use barq::{read_barcode, read_barcodes, BarcodeFormat, ReaderOptions};
use barq_core::{BinarizerKind, ImageView, PixelFormat};

/// Code39's `(character, narrow/wide pattern)` table mirrored here only to build a pixel-accurate
/// test fixture; not used by any production code path.
const CODE39_NARROW: u32 = 2;
const CODE39_WIDE: u32 = 6;

fn code39_pattern(c: u8) -> [bool; 9] {
    match c {
        b'C' => [true, false, true, false, false, true, false, false, false],
        b'O' => [true, false, false, false, false, true, false, true, false],
        b'D' => [false, false, false, false, true, true, false, false, true],
        b'E' => [true, false, false, false, true, true, false, false, false],
        b'3' => [true, false, true, true, false, false, false, false, false],
        b'9' => [false, false, true, true, false, false, true, false, false],
        b'*' => [false, true, false, false, true, false, true, false, false],
        _ => panic!("fixture only covers the characters CODE39 needs"),
    }
}

/// Build a single-row luminance buffer (0 = black, 255 = white) encoding `text` as Code39, framed
/// by `*` start/stop characters and a quiet zone on each side.
fn code39_pixel_row(text: &[u8]) -> Vec<u8> {
    let mut row = Vec::new();
    let mut push_run = |black: bool, width: u32| {
        let value = if black { 0u8 } else { 255u8 };
        row.extend(std::iter::repeat(value).take(width as usize));
    };

    push_run(false, 20); // quiet zone
    let chars: Vec<u8> = std::iter::once(b'*').chain(text.iter().copied()).chain(std::iter::once(b'*')).collect();
    for (i, &c) in chars.iter().enumerate() {
        for (element, &wide) in code39_pattern(c).iter().enumerate() {
            let black = element % 2 == 0;
            push_run(black, if wide { CODE39_WIDE } else { CODE39_NARROW });
        }
        if i + 1 < chars.len() {
            push_run(false, CODE39_NARROW); // inter-character gap
        }
    }
    push_run(false, 20); // quiet zone

    row
}

/// Replicate a single pixel row `height` times into a full `ImageView`-compatible buffer.
fn replicate_rows(row: &[u8], height: u32) -> (Vec<u8>, u32, u32) {
    let width = row.len() as u32;
    let mut data = Vec::with_capacity(row.len() * height as usize);
    for _ in 0..height {
        data.extend_from_slice(row);
    }
    (data, width, height)
}

#[test]
fn reads_a_code39_symbol_end_to_end_from_raw_pixels() {
    let row = code39_pixel_row(b"CODE39");
    let (data, width, height) = replicate_rows(&row, 10);
    let image = ImageView::new(&data, width, height, width as usize, PixelFormat::Lum);

    let options = ReaderOptions::new()
        .with_formats(BarcodeFormat::CODE39)
        .with_binarizer(BinarizerKind::FixedThreshold(127))
        .with_try_rotate(false)
        .with_try_invert(false);

    let barcode = read_barcode(&image, &options).expect("a code39 symbol should be found");
    assert_eq!(barcode.format, BarcodeFormat::CODE39);
    assert_eq!(barcode.bytes(), b"CODE39");
    assert!(barcode.is_valid());
    assert_eq!(barcode.symbology_identifier.as_deref(), Some("]A0"));
}

#[test]
fn an_image_with_no_symbol_yields_no_barcodes() {
    let (data, width, height) = (vec![255u8; 200 * 10], 200, 10);
    let image = ImageView::new(&data, width, height, width as usize, PixelFormat::Lum);
    let options = ReaderOptions::new().with_try_rotate(false).with_try_invert(false);

    assert!(read_barcode(&image, &options).is_none());
    assert!(read_barcodes(&image, &options).is_empty());
}

#[test]
fn restricting_formats_excludes_a_symbol_of_a_different_format() {
    let row = code39_pixel_row(b"CODE39");
    let (data, width, height) = replicate_rows(&row, 10);
    let image = ImageView::new(&data, width, height, width as usize, PixelFormat::Lum);

    let options = ReaderOptions::new()
        .with_formats(BarcodeFormat::QR_CODE)
        .with_binarizer(BinarizerKind::FixedThreshold(127))
        .with_try_rotate(false)
        .with_try_invert(false);

    assert!(read_barcode(&image, &options).is_none());
}
