// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `MultiFormatReader`: the orchestrator that binarizes an `ImageView`, dispatches to every
//! enabled 2D detector/decoder and 1D `RowReader`, and assembles the results into `Barcode`s.

use std::collections::HashMap;

use barq_core::{
    BitMatrix, Binarizer, DecoderResult, ErrorKind, ImageView, PatternRow, PixelFormat,
    Quadrilateral, Result,
};
use barq_oned::{OneDFormat, RowReader};

use crate::barcode::{Barcode, SequenceInfo};
use crate::format::BarcodeFormat;
use crate::options::ReaderOptions;

type TwoDEntry = (BarcodeFormat, fn(&BitMatrix) -> Result<(DecoderResult, Quadrilateral)>);

const TWO_D_READERS: &[TwoDEntry] = &[
    (BarcodeFormat::QR_CODE, barq_qr::detect_and_decode),
    (BarcodeFormat::MICRO_QR_CODE, barq_qr::micro::detect_and_decode),
    (BarcodeFormat::RMQR_CODE, barq_qr::rmqr::detect_and_decode),
    (BarcodeFormat::DATA_MATRIX, barq_datamatrix::detect_and_decode),
    (BarcodeFormat::AZTEC, barq_aztec::detect_and_decode),
    (BarcodeFormat::PDF417, barq_pdf417::detect_and_decode),
    (BarcodeFormat::MAXICODE, barq_maxicode::detect_and_decode),
];

/// Maps a `OneDFormat` to the `BarcodeFormat` bit it corresponds to.
fn one_d_to_barcode_format(format: OneDFormat) -> BarcodeFormat {
    match format {
        OneDFormat::Codabar => BarcodeFormat::CODABAR,
        OneDFormat::Code39 => BarcodeFormat::CODE39,
        OneDFormat::Code93 => BarcodeFormat::CODE93,
        OneDFormat::Code128 => BarcodeFormat::CODE128,
        OneDFormat::DataBar => BarcodeFormat::DATA_BAR,
        OneDFormat::DataBarExpanded => BarcodeFormat::DATA_BAR_EXPANDED,
        OneDFormat::DataBarLimited => BarcodeFormat::DATA_BAR_LIMITED,
        OneDFormat::Ean8 => BarcodeFormat::EAN8,
        OneDFormat::Ean13 => BarcodeFormat::EAN13,
        OneDFormat::Itf => BarcodeFormat::ITF,
        OneDFormat::UpcA => BarcodeFormat::UPC_A,
        OneDFormat::UpcE => BarcodeFormat::UPC_E,
        OneDFormat::DxFilmEdge => BarcodeFormat::DX_FILM_EDGE,
    }
}

/// `barq-oned` readers never set a `symbology_identifier` on their `DecoderResult` (only the 2D
/// crates do, since theirs varies with version/model); synthesize the AIM identifier here instead.
fn one_d_aim_identifier(format: OneDFormat) -> &'static str {
    match format {
        OneDFormat::Codabar => "]F0",
        OneDFormat::Code39 => "]A0",
        OneDFormat::Code93 => "]G0",
        OneDFormat::Code128 => "]C0",
        OneDFormat::DataBar | OneDFormat::DataBarExpanded | OneDFormat::DataBarLimited => "]e0",
        OneDFormat::Ean8 | OneDFormat::Ean13 | OneDFormat::UpcA | OneDFormat::UpcE => "]E0",
        OneDFormat::Itf => "]I0",
        OneDFormat::DxFilmEdge => "]X0",
    }
}

/// The 2D formats currently supported out of `BarcodeFormat::MATRIX_CODES`, intersected against
/// `options.effective_formats()` before a detector ever runs.
fn enabled_two_d_readers(options: &ReaderOptions) -> impl Iterator<Item = TwoDEntry> + '_ {
    let enabled = options.effective_formats();
    TWO_D_READERS.iter().copied().filter(move |(format, _)| enabled.contains(*format))
}

fn enabled_one_d_readers(options: &ReaderOptions) -> Vec<Box<dyn RowReader>> {
    let enabled = options.effective_formats();
    let mut readers: Vec<Box<dyn RowReader>> = Vec::new();
    if enabled.contains(BarcodeFormat::CODABAR) {
        readers.push(Box::new(barq_oned::codabar::CodabarReader));
    }
    if enabled.contains(BarcodeFormat::CODE39) {
        readers.push(Box::new(barq_oned::code39::Code39Reader { extended_mode: options.try_code39_extended_mode }));
    }
    if enabled.contains(BarcodeFormat::CODE93) {
        readers.push(Box::new(barq_oned::code93::Code93Reader));
    }
    if enabled.contains(BarcodeFormat::CODE128) {
        readers.push(Box::new(barq_oned::code128::Code128Reader));
    }
    if enabled.contains(BarcodeFormat::ITF) {
        readers.push(Box::new(barq_oned::itf::ItfReader));
    }
    if enabled.contains(BarcodeFormat::DX_FILM_EDGE) {
        readers.push(Box::new(barq_oned::dxfilmedge::DxFilmEdgeReader));
    }
    if enabled.contains(BarcodeFormat::DATA_BAR) {
        readers.push(Box::new(barq_oned::databar::DataBarReader));
    }
    if enabled.contains(BarcodeFormat::DATA_BAR_EXPANDED) {
        readers.push(Box::new(barq_oned::databar::DataBarExpandedReader));
    }
    if enabled.contains(BarcodeFormat::DATA_BAR_LIMITED) {
        readers.push(Box::new(barq_oned::databar::DataBarLimitedReader));
    }
    if enabled.intersects(BarcodeFormat::EAN8 | BarcodeFormat::EAN13 | BarcodeFormat::UPC_A | BarcodeFormat::UPC_E) {
        readers.push(Box::new(barq_oned::upcean::UpcEanReader { add_on_mode: options.ean_add_on_symbol }));
    }
    readers
}

/// Row indices to scan, ordered from the vertical center outward, `try_harder` expanding the
/// sampled fraction of rows. A symbol known to be `is_pure` (rendered directly, no surrounding
/// scene) needs no multi-row corroboration, so only the center row is sampled.
fn scan_rows(height: u32, try_harder: bool, is_pure: bool) -> Vec<u32> {
    if height == 0 {
        return Vec::new();
    }
    if is_pure {
        return vec![height / 2];
    }
    let sample_count = if try_harder { 15 } else { 7 };
    let mut offsets: Vec<i64> = Vec::new();
    let center = height as i64 / 2;
    offsets.push(0);
    for step in 1..=sample_count / 2 {
        let delta = (height as i64 * step as i64) / (sample_count as i64 + 1);
        offsets.push(delta);
        offsets.push(-delta);
    }
    let mut rows: Vec<u32> = offsets
        .into_iter()
        .map(|o| center + o)
        .filter(|&y| y >= 0 && (y as u32) < height)
        .map(|y| y as u32)
        .collect();
    rows.dedup();
    rows
}

/// Builds an owned, nearest-neighbor-sampled luminance buffer at `1 / factor` of `image`'s
/// dimensions. `ImageView` only ever borrows, so the downscaled pass needs its own backing
/// storage rather than a derived view.
fn downscale_luminance(image: &ImageView<'_>, factor: u32) -> (Vec<u8>, u32, u32) {
    let factor = factor.max(1);
    let width = image.width() / factor;
    let height = image.height() / factor;
    let mut buffer = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            buffer.push(image.luminance_at(x * factor, y * factor));
        }
    }
    (buffer, width, height)
}

/// Orchestrates every registered detector/decoder against a single `ImageView`. Constructed once
/// and reused across frames; cheap to build (no state beyond a copy of `ReaderOptions`).
pub struct MultiFormatReader {
    options: ReaderOptions,
}

impl MultiFormatReader {
    pub fn new(options: ReaderOptions) -> Self {
        MultiFormatReader { options }
    }

    /// Decode the first valid barcode found, trying rotations and inversion per `ReaderOptions`.
    /// Mirrors the reference implementation's `MultiFormatReader::read`: try every reader in turn,
    /// return on the first valid result.
    pub fn read(&self, image: &ImageView<'_>) -> Option<Barcode> {
        self.read_multiple(image).into_iter().next()
    }

    /// Decode every barcode found in the image, sorted top-to-bottom, left-to-right. Each
    /// `Barcode`'s `sequence` field reports its Structured Append position if it has one; this
    /// does not itself concatenate a sequence's members into one combined payload.
    pub fn read_multiple(&self, image: &ImageView<'_>) -> Vec<Barcode> {
        let mut found = Vec::new();

        // Large images are downscaled for the first pass (cheaper detector/binarizer work);
        // only the full-resolution image is tried if that comes up empty. `is_pure` symbols are
        // assumed to be exactly one tightly-cropped code, so neither heuristic applies to them.
        if !self.options.is_pure
            && self.options.try_downscale
            && image.width().min(image.height()) > self.options.downscale_threshold
        {
            let factor = self.options.downscale_factor.max(1);
            let (buffer, width, height) = downscale_luminance(image, factor);
            if width > 0 && height > 0 {
                let downscaled = ImageView::new(&buffer, width, height, width as usize, PixelFormat::Lum);
                self.scan_orientation(&downscaled, 0, &mut found);
                for barcode in found.iter_mut() {
                    for point in barcode.position.iter_mut() {
                        point.x *= factor as i32;
                        point.y *= factor as i32;
                    }
                }
            }
        }

        if found.is_empty() {
            self.scan_orientation(image, 0, &mut found);
        }

        if found.is_empty() && self.options.try_rotate && !self.options.is_pure {
            for (turns, degrees) in [(1u8, 90u32), (2, 180), (3, 270)] {
                let rotated = image.rotated(turns);
                self.scan_orientation(&rotated, degrees, &mut found);
                if !found.is_empty() {
                    break;
                }
            }
        }

        if let Some(max) = self.options.max_number_of_symbols {
            found.truncate(max as usize);
        }

        found.sort_by_key(|b| (b.position[0].y, b.position[0].x));
        found
    }

    fn scan_orientation(&self, image: &ImageView<'_>, orientation: u32, found: &mut Vec<Barcode>) {
        self.scan_binarized(image, orientation, false, found);
        if found.is_empty() && self.options.try_invert && !self.options.is_pure {
            self.scan_binarized(image, orientation, true, found);
        }
    }

    fn scan_binarized(&self, image: &ImageView<'_>, orientation: u32, invert: bool, found: &mut Vec<Barcode>) {
        let binarizer = Binarizer::new(image, self.options.binarizer);
        let mut matrix = match binarizer.to_bit_matrix() {
            Ok(m) => m,
            Err(_) => return,
        };
        if invert {
            matrix.flip_all();
        }

        for (format, detect_and_decode) in enabled_two_d_readers(&self.options) {
            match detect_and_decode(&matrix) {
                Ok((result, quad)) => {
                    found.push(self.build_two_d_barcode(format, result, quad, orientation, invert));
                    if self.at_symbol_limit(found) {
                        return;
                    }
                }
                Err(e) if self.options.return_errors && e.kind() != ErrorKind::Unsupported => {
                    found.push(Barcode::new(
                        format,
                        barq_core::Content::new(),
                        e,
                        Quadrilateral::new(
                            barq_core::PointF::new(0.0, 0.0),
                            barq_core::PointF::new(0.0, 0.0),
                            barq_core::PointF::new(0.0, 0.0),
                            barq_core::PointF::new(0.0, 0.0),
                        ),
                        orientation,
                        None,
                    ));
                }
                Err(_) => {}
            }
        }

        // `PatternRow` extraction thresholds luminance directly rather than going through the
        // `BitMatrix` this function just (possibly) inverted, so the inverted pass only covers the
        // 2D detectors above; 1D symbologies are not retried against an inverted scan.
        if !invert {
            let one_d_readers = enabled_one_d_readers(&self.options);
            if !one_d_readers.is_empty() {
                self.scan_one_d(image, &one_d_readers, orientation, invert, found);
            }
        }
    }

    fn scan_one_d(
        &self,
        image: &ImageView<'_>,
        readers: &[Box<dyn RowReader>],
        orientation: u32,
        invert: bool,
        found: &mut Vec<Barcode>,
    ) {
        let binarizer = Binarizer::new(image, self.options.binarizer);
        // key: (format, decoded bytes) -> (hit count, first match's result/row)
        let mut hits: HashMap<(OneDFormat, Vec<u8>), (u32, DecoderResult, u32)> = HashMap::new();

        for y in scan_rows(image.height(), self.options.try_harder, self.options.is_pure) {
            let row: PatternRow = match binarizer.pattern_row(y) {
                Ok(row) => row,
                Err(_) => continue,
            };
            for reader in readers {
                if let Some(Ok(row_result)) = reader.decode_row(&row) {
                    let key = (row_result.format, row_result.decoder_result.content.bytes());
                    let entry = hits.entry(key).or_insert((0, row_result.decoder_result, y));
                    entry.0 += 1;
                }
            }
        }

        // A pure symbol only ever gets the one center-row sample scan_rows produced above, so
        // the usual multi-row corroboration requirement would reject every hit; a single read
        // is trusted instead.
        let required_count = if self.options.is_pure { 1 } else { self.options.min_line_count };
        for ((format, _bytes), (count, result, y)) in hits {
            if count < required_count {
                continue;
            }
            let barcode_format = one_d_to_barcode_format(format);
            let width = image.width() as f32;
            let quad = Quadrilateral::new(
                barq_core::PointF::new(0.0, y as f32),
                barq_core::PointF::new(width, y as f32),
                barq_core::PointF::new(width, y as f32),
                barq_core::PointF::new(0.0, y as f32),
            );
            let symbology_identifier = Some(one_d_aim_identifier(format).to_string());
            let barcode = Barcode::new(barcode_format, result.content, result.error.unwrap_or_default(), quad, orientation, symbology_identifier)
                .with_inverted(invert)
                .with_line_count(count)
                .with_ec_level(result.ec_level);
            found.push(barcode);
            if self.at_symbol_limit(found) {
                return;
            }
        }
    }

    fn build_two_d_barcode(
        &self,
        format: BarcodeFormat,
        result: DecoderResult,
        quad: Quadrilateral,
        orientation: u32,
        invert: bool,
    ) -> Barcode {
        let symbology_identifier = result.symbology_identifier.clone();
        Barcode::new(format, result.content, result.error.clone().unwrap_or_default(), quad, orientation, symbology_identifier)
            .with_inverted(invert)
            .with_ec_level(result.ec_level.clone())
            .with_reader_init(result.reader_init)
            .with_sequence(SequenceInfo {
                index: result.structured_append.index,
                count: result.structured_append.count,
                id: result.structured_append.id.clone(),
            })
    }

    fn at_symbol_limit(&self, found: &[Barcode]) -> bool {
        matches!(self.options.max_number_of_symbols, Some(max) if found.len() as u32 >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_rows_always_includes_the_vertical_center() {
        let rows = scan_rows(100, false, false);
        assert!(rows.contains(&50));
    }

    #[test]
    fn scan_rows_is_empty_for_a_zero_height_image() {
        assert!(scan_rows(0, false, false).is_empty());
    }

    #[test]
    fn try_harder_samples_more_rows() {
        assert!(scan_rows(1000, true, false).len() > scan_rows(1000, false, false).len());
    }

    #[test]
    fn is_pure_samples_only_the_center_row() {
        let rows = scan_rows(1000, true, true);
        assert_eq!(rows, vec![500]);
    }
}
