// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interleaved 2 of 5 (ITF): digits are encoded two at a time, one in the bar widths and the next
//! in the interleaved space widths, each digit using 5 elements of which 2 are wide. Only an even
//! number of digits can be represented; an odd-length message is padded with a leading zero by
//! the encoder (decoding simply requires an even count).

use barq_core::content::Eci;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::{OneDFormat, RowRange, RowResult, RowReader};

/// Wide-element pattern per digit, 5 elements.
const DIGIT_PATTERNS: [[bool; 5]; 10] = [
    [false, false, true, true, false],
    [true, false, false, false, true],
    [false, true, false, false, true],
    [true, true, false, false, false],
    [false, false, true, false, true],
    [true, false, true, false, false],
    [false, true, true, false, false],
    [false, false, false, true, true],
    [true, false, false, true, false],
    [false, true, false, true, false],
];

const START_PATTERN: [u32; 4] = [1, 1, 1, 1];
const STOP_PATTERN: [u32; 3] = [2, 1, 1];

fn classify_pair(bar_widths: &[u32; 5], space_widths: &[u32; 5]) -> Option<(u8, u8)> {
    let all: Vec<u32> = bar_widths.iter().chain(space_widths.iter()).copied().collect();
    let min = *all.iter().min()?;
    let max = *all.iter().max()?;
    if min == 0 {
        return None;
    }
    let threshold = ((min + max) / 2).max(min + 1);

    let bar_pattern: [bool; 5] = std::array::from_fn(|i| bar_widths[i] >= threshold);
    let space_pattern: [bool; 5] = std::array::from_fn(|i| space_widths[i] >= threshold);

    let bar_digit = DIGIT_PATTERNS.iter().position(|p| *p == bar_pattern)? as u8;
    let space_digit = DIGIT_PATTERNS.iter().position(|p| *p == space_pattern)? as u8;
    Some((bar_digit, space_digit))
}

fn matches_ratio(observed: &[u32], expected: &[u32]) -> bool {
    if observed.len() != expected.len() {
        return false;
    }
    let total_observed: u32 = observed.iter().sum();
    let total_expected: u32 = expected.iter().sum();
    if total_observed == 0 {
        return false;
    }
    let scale = total_observed as f32 / total_expected as f32;
    observed.iter().zip(expected.iter()).all(|(&o, &e)| {
        let predicted = e as f32 * scale;
        (o as f32 - predicted).abs() / predicted.max(1.0) < 0.5
    })
}

pub struct ItfReader;

impl RowReader for ItfReader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let widths = row.as_slice();
        if widths.len() < 1 + 4 + 10 + 3 {
            return None;
        }

        let mut start = 1usize;
        loop {
            if start + 4 > widths.len() {
                return None;
            }
            let observed: Vec<u32> = widths[start..start + 4].iter().map(|&w| w as u32).collect();
            if matches_ratio(&observed, &START_PATTERN) {
                break;
            }
            start += 1;
            if start > 3 {
                return None;
            }
        }

        let mut cursor = start + 4;
        let mut digits = Vec::new();
        loop {
            if cursor + 3 <= widths.len() {
                let tail: Vec<u32> = widths[cursor..cursor + 3].iter().map(|&w| w as u32).collect();
                if matches_ratio(&tail, &STOP_PATTERN) {
                    cursor += 3;
                    break;
                }
            }
            if cursor + 10 > widths.len() {
                return Some(format_error("itf: ended before stop pattern"));
            }
            let bar: [u32; 5] = std::array::from_fn(|i| widths[cursor + i * 2] as u32);
            let space: [u32; 5] = std::array::from_fn(|i| widths[cursor + i * 2 + 1] as u32);
            match classify_pair(&bar, &space) {
                Some((b, s)) => {
                    digits.push(b);
                    digits.push(s);
                }
                None => return Some(format_error("itf: unrecognized digit pair")),
            }
            cursor += 10;
            if digits.len() > 80 {
                return Some(format_error("itf: symbol too long"));
            }
        }

        if digits.is_empty() {
            return Some(format_error("itf: empty symbol"));
        }

        let mut content = Content::new();
        content.push_bytes(Eci::Default, &digits.iter().map(|d| d + b'0').collect::<Vec<u8>>());
        Some(Ok(RowResult {
            format: OneDFormat::Itf,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: cursor },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_row(digits: &[u8]) -> PatternRow {
        assert_eq!(digits.len() % 2, 0);
        let mut row = PatternRow::new();
        row.push(10);
        for w in START_PATTERN {
            row.push(w as u16);
        }
        for pair in digits.chunks(2) {
            let bar = DIGIT_PATTERNS[pair[0] as usize];
            let space = DIGIT_PATTERNS[pair[1] as usize];
            for i in 0..5 {
                row.push(if bar[i] { 3 } else { 1 });
                row.push(if space[i] { 3 } else { 1 });
            }
        }
        for w in STOP_PATTERN {
            row.push(w as u16);
        }
        row.push(10);
        row
    }

    #[test]
    fn decodes_even_length_digit_string() {
        let row = build_row(&[1, 2, 3, 4]);
        let reader = ItfReader;
        let result = reader.decode_row(&row).unwrap().unwrap();
        assert_eq!(result.decoder_result.content.bytes(), b"1234");
    }
}
