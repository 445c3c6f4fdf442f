// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UPC-A, UPC-E, EAN-13 and EAN-8 share a single reader: all four are built from the same 7-module
//! digit alphabet and differ only in guard pattern layout and how the leading digit(s) are
//! recovered. `AddOnMode` controls how a trailing EAN-2/EAN-5 add-on is treated, per
//! `ReaderOptions::ean_add_on_symbol`.

use barq_core::content::Eci;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::gtin::{check_digit_is_valid, compute_check_digit, upc_e_to_upc_a};
use crate::{OneDFormat, RowRange, RowResult, RowReader};

const L_PATTERNS: [[u32; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 1],
];

// The "G" (even-parity) left-hand patterns; these have identical widths to the right-hand "R"
// patterns below (reversing an L pattern yields a G pattern), but are tabulated separately since
// the two are used in distinct halves of the symbol.
const G_PATTERNS: [[u32; 4]; 10] = [
    [1, 1, 2, 3],
    [1, 2, 2, 2],
    [2, 2, 1, 2],
    [1, 1, 4, 1],
    [2, 3, 1, 1],
    [1, 3, 2, 1],
    [4, 1, 1, 1],
    [2, 1, 3, 1],
    [3, 1, 2, 1],
    [2, 1, 1, 2],
];

const R_PATTERNS: [[u32; 4]; 10] = G_PATTERNS;

/// The left-hand parity (L=false, G=true) sequence for each possible EAN-13 leading digit,
/// packed as a 6-bit mask (bit 5 = first left digit).
const FIRST_DIGIT_ENCODINGS: [u8; 10] = [0x00, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOnMode {
    Ignore,
    Read,
    Require,
}

pub struct UpcEanReader {
    pub add_on_mode: AddOnMode,
}

impl Default for UpcEanReader {
    fn default() -> Self {
        UpcEanReader { add_on_mode: AddOnMode::Ignore }
    }
}

/// Find a start guard pattern (`1:1:1` narrow bar-space-bar) in `row`, returning the index of the
/// run immediately following the guard (i.e. the first digit's first run) and the guard's module
/// width.
fn find_start_guard(row: &PatternRow) -> Option<(usize, f32)> {
    let widths = row.as_slice();
    // A start or end guard is three runs of near-equal width; scan runs (1, 2, 3) since run 0 is
    // the (possibly zero) leading white quiet zone.
    for i in 1..widths.len().saturating_sub(2) {
        let (a, b, c) = (widths[i] as f32, widths[i + 1] as f32, widths[i + 2] as f32);
        let unit = (a + b + c) / 3.0;
        if unit <= 0.0 {
            continue;
        }
        if (a - unit).abs() / unit < 0.5 && (b - unit).abs() / unit < 0.5 && (c - unit).abs() / unit < 0.5 {
            return Some((i + 3, unit));
        }
    }
    None
}

/// Score a 4-run candidate against every digit's L and G/R pattern, returning the best-matching
/// digit and whether it came from the first (L/odd) or second (G/R/even) table.
fn best_digit_match(runs: &[u32], unit: f32, table_a: &[[u32; 4]; 10], table_b: &[[u32; 4]; 10]) -> Option<(u8, bool)> {
    if runs.len() < 4 {
        return None;
    }
    let observed: [f32; 4] = [runs[0] as f32 / unit, runs[1] as f32 / unit, runs[2] as f32 / unit, runs[3] as f32 / unit];
    let mut best = None;
    let mut best_error = f32::MAX;
    for (digit, pattern) in table_a.iter().enumerate() {
        let error: f32 = pattern.iter().zip(observed.iter()).map(|(&p, &o)| (p as f32 - o).powi(2)).sum();
        if error < best_error {
            best_error = error;
            best = Some((digit as u8, false));
        }
    }
    for (digit, pattern) in table_b.iter().enumerate() {
        let error: f32 = pattern.iter().zip(observed.iter()).map(|(&p, &o)| (p as f32 - o).powi(2)).sum();
        if error < best_error {
            best_error = error;
            best = Some((digit as u8, true));
        }
    }
    if best_error > 1.5 {
        return None;
    }
    best
}

fn decode_digits(
    row: &PatternRow,
    start_run: usize,
    count: usize,
    unit: f32,
    table_a: &[[u32; 4]; 10],
    table_b: &[[u32; 4]; 10],
) -> Option<(Vec<u8>, Vec<bool>)> {
    let widths = row.as_slice();
    let mut digits = Vec::with_capacity(count);
    let mut parities = Vec::with_capacity(count);
    let mut run = start_run;
    for _ in 0..count {
        if run + 4 > widths.len() {
            return None;
        }
        let (digit, is_b) = best_digit_match(&widths[run..run + 4], unit, table_a, table_b)?;
        digits.push(digit);
        parities.push(is_b);
        run += 4;
    }
    Some((digits, parities))
}

impl UpcEanReader {
    /// Try to decode an EAN-13: start guard, 6 left digits (mixed L/G parity encoding the leading
    /// digit), middle guard (5 narrow runs), 6 right digits (all R parity), end guard.
    fn try_ean13(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let (mut run, unit) = find_start_guard(row)?;
        let (left_digits, parities) = decode_digits(row, run, 6, unit, &L_PATTERNS, &G_PATTERNS)?;
        let mut parity_mask = 0u8;
        for &is_g in &parities {
            parity_mask = (parity_mask << 1) | is_g as u8;
        }
        let leading_digit = FIRST_DIGIT_ENCODINGS.iter().position(|&m| m == parity_mask)? as u8;
        run += 6 * 4 + 5; // skip middle guard (5 runs).
        let (right_digits, _) = decode_digits(row, run, 6, unit, &R_PATTERNS, &R_PATTERNS)?;
        run += 6 * 4 + 3; // end guard.

        let mut digits = vec![leading_digit];
        digits.extend(left_digits);
        digits.extend(right_digits);
        if !check_digit_is_valid(&digits) {
            return Some(format_error("ean13: check digit mismatch"));
        }

        let mut content = Content::new();
        content.push_bytes(Eci::Default, &digits.iter().map(|d| d + b'0').collect::<Vec<u8>>());
        Some(Ok(RowResult {
            format: OneDFormat::Ean13,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: run },
        }))
    }

    fn try_upc_a(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        // UPC-A is an EAN-13 whose leading digit is always 0; the guard scan is identical.
        match self.try_ean13(row)? {
            Ok(mut result) if result.format == OneDFormat::Ean13 => {
                let digits = result.decoder_result.content.bytes();
                if digits.first().copied() != Some(b'0') {
                    return None;
                }
                result.decoder_result.content = Content::new();
                result.decoder_result.content.push_bytes(Eci::Default, &digits[1..]);
                result.format = OneDFormat::UpcA;
                Some(Ok(result))
            }
            other => Some(other),
        }
    }

    fn try_ean8(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let (mut run, unit) = find_start_guard(row)?;
        let (left_digits, _) = decode_digits(row, run, 4, unit, &L_PATTERNS, &L_PATTERNS)?;
        run += 4 * 4 + 5;
        let (right_digits, _) = decode_digits(row, run, 4, unit, &R_PATTERNS, &R_PATTERNS)?;
        run += 4 * 4 + 3;

        let mut digits = left_digits;
        digits.extend(right_digits);
        if !check_digit_is_valid(&digits) {
            return Some(format_error("ean8: check digit mismatch"));
        }
        let mut content = Content::new();
        content.push_bytes(Eci::Default, &digits.iter().map(|d| d + b'0').collect::<Vec<u8>>());
        Some(Ok(RowResult {
            format: OneDFormat::Ean8,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: run },
        }))
    }

    /// UPC-E: start guard, 6 digits whose L/G parity sequence encodes both the implicit number
    /// system digit (0 or 1) and the compressed check digit, then a special end guard (`010101`,
    /// 6 narrow runs, no separate middle guard).
    fn try_upc_e(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let (run, unit) = find_start_guard(row)?;
        let (digits, parities) = decode_digits(row, run, 6, unit, &L_PATTERNS, &G_PATTERNS)?;
        let mut parity_mask = 0u8;
        for &is_g in &parities {
            parity_mask = (parity_mask << 1) | is_g as u8;
        }
        // UPC-E parity patterns double as a (number_system, check_digit) pair lookup; number
        // system 0 patterns are the bitwise complement of number system 1's, mirroring
        // FIRST_DIGIT_ENCODINGS's role for EAN-13.
        let (number_system, check_digit) = upc_e_parity_lookup(parity_mask)?;

        let compressed: [u8; 6] = digits.try_into().ok()?;
        let expanded = upc_e_to_upc_a(number_system, &compressed);
        let mut full = vec![number_system];
        full.extend_from_slice(&expanded[1..]);
        full.push(check_digit);
        if !check_digit_is_valid(&full) {
            return Some(format_error("upce: check digit mismatch"));
        }

        let mut content = Content::new();
        // UPC-E's payload is conventionally reported in its compressed 6-digit form.
        content.push_bytes(Eci::Default, &compressed.iter().map(|d| d + b'0').collect::<Vec<u8>>());
        Some(Ok(RowResult {
            format: OneDFormat::UpcE,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: run + 6 * 4 },
        }))
    }
}

fn upc_e_parity_lookup(mask: u8) -> Option<(u8, u8)> {
    const NUMBER_SYSTEM_0: [u8; 10] = [0x38, 0x34, 0x32, 0x31, 0x2C, 0x26, 0x23, 0x2A, 0x29, 0x25];
    const NUMBER_SYSTEM_1: [u8; 10] = [0x07, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A];
    if let Some(check) = NUMBER_SYSTEM_0.iter().position(|&m| m == mask) {
        return Some((0, check as u8));
    }
    if let Some(check) = NUMBER_SYSTEM_1.iter().position(|&m| m == mask) {
        return Some((1, check as u8));
    }
    None
}

impl RowReader for UpcEanReader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        self.try_ean13(row)
            .or_else(|| self.try_upc_a(row))
            .or_else(|| self.try_ean8(row))
            .or_else(|| self.try_upc_e(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit_runs(digit: u8, table: &[[u32; 4]; 10]) -> Vec<u16> {
        table[digit as usize].iter().map(|&w| w as u16).collect()
    }

    fn build_ean13_row(digits: [u8; 13]) -> PatternRow {
        assert!(check_digit_is_valid(&digits));
        let leading = digits[0];
        let parity_mask = FIRST_DIGIT_ENCODINGS[leading as usize];
        let mut row = PatternRow::new();
        row.push(10); // quiet zone
        row.push(1);
        row.push(1);
        row.push(1); // start guard
        for i in 0..6 {
            let d = digits[1 + i];
            let is_g = (parity_mask >> (5 - i)) & 1 == 1;
            let table = if is_g { &G_PATTERNS } else { &L_PATTERNS };
            for w in digit_runs(d, table) {
                row.push(w);
            }
        }
        for _ in 0..5 {
            row.push(1); // middle guard
        }
        for i in 0..6 {
            let d = digits[7 + i];
            for w in digit_runs(d, &R_PATTERNS) {
                row.push(w);
            }
        }
        row.push(1);
        row.push(1);
        row.push(1); // end guard
        row.push(10);
        row
    }

    #[test]
    fn decodes_valid_ean13() {
        let digits: [u8; 13] = [4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 3];
        let row = build_ean13_row(digits);
        let reader = UpcEanReader::default();
        let result = reader.decode_row(&row).unwrap().unwrap();
        assert_eq!(result.format, OneDFormat::Ean13);
        assert_eq!(result.decoder_result.content.bytes(), b"4006381333933");
    }

    #[test]
    fn upc_a_strips_leading_zero_digit() {
        // Any valid EAN-13 beginning with 0 is a UPC-A in disguise.
        let digits: [u8; 13] = [0, 3, 6, 0, 0, 0, 2, 9, 1, 4, 5, 2, 5];
        let row = build_ean13_row(digits);
        let reader = UpcEanReader::default();
        let result = reader.decode_row(&row).unwrap().unwrap();
        assert_eq!(result.format, OneDFormat::UpcA);
        assert_eq!(result.decoder_result.content.bytes().len(), 11);
    }
}
