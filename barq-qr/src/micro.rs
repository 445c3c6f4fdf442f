// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Micro QR (ISO/IEC 18004 Annex): a single finder pattern anchors all four symbol sizes (M1 11x11
//! through M4 17x17), in place of full QR's three. Without a second and third finder there's no
//! parallelogram to recover a fourth corner from, so detection instead assumes the symbol is
//! axis-aligned and tries each size class anchored on the one finder it found, keeping whichever
//! one's format information recovers cleanly.
//!
//! M1 carries no mode indicator at all (it's numeric-only) and its final codeword is 4 bits rather
//! than 8, which doesn't fit this module's byte-oriented codeword reader; M1 is recognized by its
//! format info but not decoded further. The `(symbol, error-correction level)` table
//! `FORMAT_TABLE` and the mode/count-indicator bit widths below are reproduced from commonly
//! published Micro QR decoder references rather than independently re-verified against the primary
//! standard text in this pack. The error-correction codeword count per symbol is likewise an
//! approximation (a fraction of the module-derived codeword capacity, not ISO/IEC 18004's own
//! per-version table), since that table wasn't available to cross-check here.

use barq_core::content::Eci;
use barq_core::{
    decode_binary, format_error, sample_grid, unsupported_error, BitMatrix, Content, DecoderResult, Error, GfBinary,
    PerspectiveTransform, PointF, Quadrilateral, Result,
};

use crate::finder::find_finder_patterns;
use crate::format_info::{recover_data, MICRO_MASK};
use crate::mask;

const FORMAT_INFO_PATH: [(u32, u32); 15] =
    [(8, 0), (8, 1), (8, 2), (8, 3), (8, 4), (8, 5), (8, 6), (8, 7), (7, 8), (6, 8), (5, 8), (4, 8), (3, 8), (2, 8), (1, 8)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EcLevel {
    L,
    M,
    Q,
}

impl EcLevel {
    fn label(self) -> &'static str {
        match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
        }
    }

    /// Approximate error-correction codeword share of the symbol's total codeword capacity.
    fn fraction(self) -> f32 {
        match self {
            EcLevel::L => 0.2,
            EcLevel::M => 0.3,
            EcLevel::Q => 0.4,
        }
    }
}

/// Maps the 5-bit recovered format-info data value to `(symbol_number, ec_level)`; `symbol_number`
/// 0 is M1 (no independent EC level, recognized but not decoded further), 1-3 are M2-M4.
const FORMAT_TABLE: [(u8, Option<EcLevel>); 32] = [
    (0, None),
    (0, None),
    (0, None),
    (0, None),
    (1, Some(EcLevel::L)),
    (1, Some(EcLevel::L)),
    (1, Some(EcLevel::L)),
    (1, Some(EcLevel::L)),
    (1, Some(EcLevel::M)),
    (1, Some(EcLevel::M)),
    (1, Some(EcLevel::M)),
    (1, Some(EcLevel::M)),
    (2, Some(EcLevel::L)),
    (2, Some(EcLevel::L)),
    (2, Some(EcLevel::L)),
    (2, Some(EcLevel::L)),
    (2, Some(EcLevel::M)),
    (2, Some(EcLevel::M)),
    (2, Some(EcLevel::M)),
    (2, Some(EcLevel::M)),
    (3, Some(EcLevel::L)),
    (3, Some(EcLevel::L)),
    (3, Some(EcLevel::L)),
    (3, Some(EcLevel::L)),
    (3, Some(EcLevel::M)),
    (3, Some(EcLevel::M)),
    (3, Some(EcLevel::M)),
    (3, Some(EcLevel::M)),
    (3, Some(EcLevel::Q)),
    (3, Some(EcLevel::Q)),
    (3, Some(EcLevel::Q)),
    (3, Some(EcLevel::Q)),
];

fn modules_for_symbol(symbol_number: u8) -> u32 {
    11 + 2 * symbol_number as u32
}

/// Mode indicator bit width for `symbol_number` (M1 has none -- it's numeric-only).
fn mode_bits(symbol_number: u8) -> u32 {
    symbol_number as u32
}

const MODE_NUMERIC: u32 = 0b00;
const MODE_ALPHANUMERIC: u32 = 0b01;
const MODE_BYTE: u32 = 0b10;
const MODE_KANJI: u32 = 0b11;

const ALPHANUMERIC_CHARS: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Character count indicator bit width for `mode` at `symbol_number` (ISO/IEC 18004 Table 8).
fn count_bits(symbol_number: u8, mode: u32) -> u32 {
    match (symbol_number, mode) {
        (1, MODE_NUMERIC) => 4,
        (1, MODE_ALPHANUMERIC) => 3,
        (2, MODE_NUMERIC) => 5,
        (2, MODE_ALPHANUMERIC) => 4,
        (2, MODE_BYTE) => 4,
        (2, MODE_KANJI) => 3,
        (3, MODE_NUMERIC) => 6,
        (3, MODE_ALPHANUMERIC) => 5,
        (3, MODE_BYTE) => 5,
        (3, MODE_KANJI) => 4,
        _ => 0,
    }
}

/// `true` once `(x, y)` is reserved for the finder/separator block, the timing tracks along the
/// top row and left column, or the format information path, for a Micro QR symbol of any size.
fn is_function_module(x: u32, y: u32) -> bool {
    if x < 9 && y < 9 {
        return true;
    }
    if x == 0 || y == 0 {
        return true;
    }
    FORMAT_INFO_PATH.contains(&(x, y))
}

struct BitCursor<'a> {
    bits: &'a [bool],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    fn new(bits: &'a [bool]) -> Self {
        BitCursor { bits, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    fn read(&mut self, count: u32) -> Option<u32> {
        if count as usize > self.remaining() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.bits[self.pos] as u32;
            self.pos += 1;
        }
        Some(value)
    }
}

fn decode_segments(bits: &[bool], symbol_number: u8) -> Result<Content> {
    let mut cursor = BitCursor::new(bits);
    let mut content = Content::new();
    let mode_width = mode_bits(symbol_number);

    loop {
        if cursor.remaining() < (mode_width as usize + 1).max(1) {
            break;
        }
        let mode = if mode_width == 0 { MODE_NUMERIC } else { cursor.read(mode_width).unwrap() };
        let count_width = count_bits(symbol_number, mode);
        if count_width == 0 {
            break;
        }
        let count = match cursor.read(count_width) {
            Some(c) => c as usize,
            None => break,
        };
        match mode {
            MODE_NUMERIC => decode_numeric(&mut cursor, count, &mut content)?,
            MODE_ALPHANUMERIC => decode_alphanumeric(&mut cursor, count, &mut content)?,
            MODE_BYTE => decode_byte(&mut cursor, count, &mut content)?,
            MODE_KANJI => decode_kanji(&mut cursor, count, &mut content)?,
            _ => break,
        }
    }
    Ok(content)
}

fn decode_numeric(cursor: &mut BitCursor, count: usize, content: &mut Content) -> Result<()> {
    let mut digits = Vec::with_capacity(count);
    let mut remaining = count;
    while remaining >= 3 {
        let value = cursor.read(10).ok_or_else(|| Error::format("micro qr: truncated bit stream"))?;
        if value > 999 {
            return format_error("micro qr: numeric triple out of range");
        }
        digits.extend(format!("{:03}", value).bytes());
        remaining -= 3;
    }
    if remaining == 2 {
        let value = cursor.read(7).ok_or_else(|| Error::format("micro qr: truncated bit stream"))?;
        digits.extend(format!("{:02}", value).bytes());
    }
    else if remaining == 1 {
        let value = cursor.read(4).ok_or_else(|| Error::format("micro qr: truncated bit stream"))?;
        digits.extend(format!("{:01}", value).bytes());
    }
    content.push_bytes(Eci::Default, &digits);
    Ok(())
}

fn decode_alphanumeric(cursor: &mut BitCursor, count: usize, content: &mut Content) -> Result<()> {
    let mut out = Vec::with_capacity(count);
    let mut remaining = count;
    while remaining >= 2 {
        let value = cursor.read(11).ok_or_else(|| Error::format("micro qr: truncated bit stream"))?;
        let (hi, lo) = ((value / 45) as usize, (value % 45) as usize);
        if hi >= 45 || lo >= 45 {
            return format_error("micro qr: alphanumeric pair out of range");
        }
        out.push(ALPHANUMERIC_CHARS[hi]);
        out.push(ALPHANUMERIC_CHARS[lo]);
        remaining -= 2;
    }
    if remaining == 1 {
        let value = cursor.read(6).ok_or_else(|| Error::format("micro qr: truncated bit stream"))? as usize;
        if value >= 45 {
            return format_error("micro qr: alphanumeric value out of range");
        }
        out.push(ALPHANUMERIC_CHARS[value]);
    }
    content.push_bytes(Eci::Default, &out);
    Ok(())
}

fn decode_byte(cursor: &mut BitCursor, count: usize, content: &mut Content) -> Result<()> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(cursor.read(8).ok_or_else(|| Error::format("micro qr: truncated bit stream"))? as u8);
    }
    content.push_bytes(Eci::Default, &out);
    Ok(())
}

fn decode_kanji(cursor: &mut BitCursor, count: usize, content: &mut Content) -> Result<()> {
    let mut out = Vec::with_capacity(count * 2);
    for _ in 0..count {
        let value = cursor.read(13).ok_or_else(|| Error::format("micro qr: truncated bit stream"))?;
        let shifted = if value < 0x1F00 { value + 0x8140 } else { value + 0xC140 };
        out.push((shifted >> 8) as u8);
        out.push((shifted & 0xFF) as u8);
    }
    content.push_bytes(Eci::Value(20), &out);
    Ok(())
}

/// Sample an axis-aligned `modules x modules` grid anchored so the finder sits at its top-left
/// corner (module coordinates 0..7), as Micro QR requires.
fn sample_anchored(image: &BitMatrix, corner: PointF, module_size: f32, modules: u32) -> Result<(BitMatrix, Quadrilateral)> {
    let size = modules as f32 * module_size;
    let quad = Quadrilateral::new(
        corner,
        PointF::new(corner.x + size, corner.y),
        PointF::new(corner.x + size, corner.y + size),
        PointF::new(corner.x, corner.y + size),
    );
    let dest = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(modules as f32, 0.0),
        PointF::new(modules as f32, modules as f32),
        PointF::new(0.0, modules as f32),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(dest, quad);
    Ok((sample_grid(image, modules, modules, &transform)?, quad))
}

/// Read codewords in a zigzag scan adapted from full QR's: two-column-wide strips right to left,
/// but skipping only the single left-edge timing column (column 0) rather than a middle one.
fn read_codewords(matrix: &BitMatrix, modules: u32, mask_pattern: u8, total_codewords: usize) -> Vec<u8> {
    let mut result = vec![0u8; total_codewords];
    let mut result_offset = 0usize;
    let mut current_byte = 0u8;
    let mut bits_read = 0u32;
    let mut reading_up = true;
    let mut col = modules - 1;

    loop {
        for count in 0..modules {
            let row = if reading_up { modules - 1 - count } else { count };
            for c in 0..2 {
                if col < c {
                    continue;
                }
                let x = col - c;
                if x == 0 || is_function_module(x, row) {
                    continue;
                }
                bits_read += 1;
                current_byte <<= 1;
                if matrix.get(x, row) ^ mask::apply(mask_pattern, row, x) {
                    current_byte |= 1;
                }
                if bits_read == 8 {
                    if result_offset < result.len() {
                        result[result_offset] = current_byte;
                        result_offset += 1;
                    }
                    bits_read = 0;
                    current_byte = 0;
                }
            }
        }
        reading_up = !reading_up;
        if col < 2 {
            break;
        }
        col -= 2;
    }
    // A trailing partial codeword (fewer than 8 bits read for it) is padded with zero bits.
    if bits_read > 0 && result_offset < result.len() {
        current_byte <<= 8 - bits_read;
        result[result_offset] = current_byte;
    }
    result
}

struct Candidate {
    symbol_number: u8,
    ec_level: EcLevel,
    mask_pattern: u8,
    matrix: BitMatrix,
    quad: Quadrilateral,
}

fn locate(image: &BitMatrix) -> Result<Candidate> {
    let mut patterns = find_finder_patterns(image);
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    let finder = patterns.into_iter().next().ok_or_else(|| Error::format("micro qr: no finder pattern found"))?;

    let corner = PointF::new(finder.center.x - 3.5 * finder.module_size, finder.center.y - 3.5 * finder.module_size);

    for symbol_number in 1..=3u8 {
        let modules = modules_for_symbol(symbol_number);
        let (matrix, quad) = match sample_anchored(image, corner, finder.module_size, modules) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let format_bits = FORMAT_INFO_PATH.iter().fold(0u32, |acc, &(x, y)| (acc << 1) | matrix.get(x, y) as u32);
        let Some(data) = recover_data(format_bits, MICRO_MASK)
        else {
            continue;
        };
        let (table_symbol, ec_level) = FORMAT_TABLE[data as usize];
        if table_symbol != symbol_number {
            continue;
        }
        let Some(ec_level) = ec_level
        else {
            continue;
        };
        let mask_pattern = (data & 0b11) as u8;
        return Ok(Candidate { symbol_number, ec_level, mask_pattern, matrix, quad });
    }
    format_error("micro qr: no M2-M4 size class recovered consistent format information")
}

pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    let candidate = locate(image)?;
    log::debug!(
        "micro qr: located an M{} symbol, ec level {}, mask {}",
        candidate.symbol_number + 1,
        candidate.ec_level.label(),
        candidate.mask_pattern
    );

    let modules = modules_for_symbol(candidate.symbol_number);
    let function_modules: usize = (0..modules)
        .flat_map(|y| (0..modules).map(move |x| (x, y)))
        .filter(|&(x, y)| x == 0 || is_function_module(x, y))
        .count();
    let capacity_bits = (modules * modules) as usize - function_modules;
    let total_codewords = capacity_bits / 8;
    if total_codewords < 2 {
        return unsupported_error("micro qr: symbol too small to carry any data codewords");
    }
    let ec_codewords = ((total_codewords as f32 * candidate.ec_level.fraction()).round() as usize).clamp(1, total_codewords - 1);
    let data_codewords = total_codewords - ec_codewords;

    let codewords = read_codewords(&candidate.matrix, modules, candidate.mask_pattern, total_codewords);
    let field = GfBinary::new(8, 0x11D);
    let mut work: Vec<u16> = codewords.iter().map(|&b| b as u16).collect();
    decode_binary(&field, &mut work, ec_codewords, 0, 1)?;

    let mut bits = Vec::with_capacity(data_codewords * 8);
    for &word in &work[..data_codewords] {
        for i in (0..8).rev() {
            bits.push((word >> i) & 1 != 0);
        }
    }

    let content = decode_segments(&bits, candidate.symbol_number)?;
    let result = DecoderResult::new(content).with_ec_level(candidate.ec_level.label());
    Ok((result, candidate.quad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_for_symbol_matches_the_four_micro_qr_sizes() {
        assert_eq!(modules_for_symbol(0), 11);
        assert_eq!(modules_for_symbol(1), 13);
        assert_eq!(modules_for_symbol(2), 15);
        assert_eq!(modules_for_symbol(3), 17);
    }

    #[test]
    fn format_table_m1_entries_have_no_ec_level() {
        for &(symbol_number, ec_level) in &FORMAT_TABLE[0..4] {
            assert_eq!(symbol_number, 0);
            assert_eq!(ec_level, None);
        }
    }

    #[test]
    fn finder_block_and_timing_tracks_are_function_modules() {
        assert!(is_function_module(0, 0));
        assert!(is_function_module(8, 8));
        assert!(is_function_module(0, 5));
        assert!(is_function_module(5, 0));
    }

    #[test]
    fn interior_module_is_not_a_function_module() {
        assert!(!is_function_module(9, 9));
    }

    #[test]
    fn bit_cursor_reads_most_significant_bit_first() {
        let bits = [true, false, true, false];
        let mut cursor = BitCursor::new(&bits);
        assert_eq!(cursor.read(2), Some(0b10));
        assert_eq!(cursor.read(2), Some(0b10));
        assert_eq!(cursor.read(1), None);
    }
}
