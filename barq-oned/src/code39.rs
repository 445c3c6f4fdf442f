// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Code39: each character is nine alternating bar/space elements, three of which are "wide"
//! relative to the other six "narrow" ones (a "3 of 9" code). `*` is both the start and stop
//! character and is never part of the decoded payload. With `extended_mode` enabled, `$`/`%`/`/`/`+`
//! shift pairs are folded back into full ASCII per the AIM USS-39 extension.

use barq_core::content::Eci;
use barq_core::pattern::narrow_wide_threshold;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::{OneDFormat, RowRange, RowResult, RowReader};

/// `(character, narrow/wide pattern)` for the 9 bar/space elements, narrow = `false`, wide =
/// `true`, in bar,space,bar,space,... order. `*` is the start/stop sentinel.
const ALPHABET: [(u8, [bool; 9]); 44] = [
    (b'0', [false, false, false, true, true, false, true, false, false]),
    (b'1', [true, false, false, true, false, false, false, false, true]),
    (b'2', [false, false, true, true, false, false, false, false, true]),
    (b'3', [true, false, true, true, false, false, false, false, false]),
    (b'4', [false, false, false, true, true, false, false, false, true]),
    (b'5', [true, false, false, true, true, false, false, false, false]),
    (b'6', [false, false, true, true, true, false, false, false, false]),
    (b'7', [false, false, false, true, false, false, true, false, true]),
    (b'8', [true, false, false, true, false, false, true, false, false]),
    (b'9', [false, false, true, true, false, false, true, false, false]),
    (b'A', [true, false, false, false, false, true, false, false, true]),
    (b'B', [false, false, true, false, false, true, false, false, true]),
    (b'C', [true, false, true, false, false, true, false, false, false]),
    (b'D', [false, false, false, false, true, true, false, false, true]),
    (b'E', [true, false, false, false, true, true, false, false, false]),
    (b'F', [false, false, true, false, true, true, false, false, false]),
    (b'G', [false, false, false, false, false, true, true, false, true]),
    (b'H', [true, false, false, false, false, true, true, false, false]),
    (b'I', [false, false, true, false, false, true, true, false, false]),
    (b'J', [false, false, false, false, true, true, true, false, false]),
    (b'K', [true, false, false, false, false, false, false, true, true]),
    (b'L', [false, false, true, false, false, false, false, true, true]),
    (b'M', [true, false, true, false, false, false, false, true, false]),
    (b'N', [false, false, false, false, false, true, false, true, true]),
    (b'O', [true, false, false, false, false, true, false, true, false]),
    (b'P', [false, false, true, false, false, true, false, true, false]),
    (b'Q', [false, false, false, false, false, false, true, true, true]),
    (b'R', [true, false, false, false, false, false, true, true, false]),
    (b'S', [false, false, true, false, false, false, true, true, false]),
    (b'T', [false, false, false, false, false, true, true, true, false]),
    (b'U', [true, true, false, false, false, false, false, false, true]),
    (b'V', [false, true, true, false, false, false, false, false, true]),
    (b'W', [true, true, true, false, false, false, false, false, false]),
    (b'X', [false, true, false, false, true, false, false, false, true]),
    (b'Y', [true, true, false, false, true, false, false, false, false]),
    (b'Z', [false, true, true, false, true, false, false, false, false]),
    (b'-', [false, true, false, false, false, false, true, false, true]),
    (b'.', [true, true, false, false, false, false, true, false, false]),
    (b' ', [false, true, true, false, false, false, true, false, false]),
    (b'$', [false, true, false, true, false, true, false, false, false]),
    (b'/', [false, true, false, true, false, false, false, true, false]),
    (b'+', [false, true, false, false, false, true, false, true, false]),
    (b'%', [false, false, false, true, false, true, false, true, false]),
    (b'*', [false, true, false, false, true, false, true, false, false]),
];

pub struct Code39Reader {
    pub extended_mode: bool,
}

impl Default for Code39Reader {
    fn default() -> Self {
        Code39Reader { extended_mode: false }
    }
}

fn classify_pattern(runs: &[u32], threshold: u32) -> [bool; 9] {
    let mut pattern = [false; 9];
    for (i, &w) in runs.iter().enumerate() {
        pattern[i] = w >= threshold;
    }
    pattern
}

fn lookup(pattern: &[bool; 9]) -> Option<u8> {
    ALPHABET.iter().find(|(_, p)| p == pattern).map(|(c, _)| *c)
}

impl RowReader for Code39Reader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let widths = row.as_slice();
        if widths.len() < 1 + 9 {
            return None;
        }

        // Find the leading `*` start character at the first plausible offset.
        let mut start = 1usize;
        let threshold;
        loop {
            if start + 9 > widths.len() {
                return None;
            }
            let runs: Vec<u32> = widths[start..start + 9].iter().map(|&w| w as u32).collect();
            if let Some(t) = narrow_wide_threshold(&runs) {
                let pattern = classify_pattern(&runs, t);
                if lookup(&pattern) == Some(b'*') {
                    threshold = t;
                    break;
                }
            }
            start += 1;
            if start > 3 {
                return None;
            }
        }

        let mut cursor = start + 9 + 1; // inter-character gap run.
        let mut chars = Vec::new();
        loop {
            if cursor + 9 > widths.len() {
                return Some(format_error("code39: ended before stop character"));
            }
            let runs: Vec<u32> = widths[cursor..cursor + 9].iter().map(|&w| w as u32).collect();
            let pattern = classify_pattern(&runs, threshold);
            match lookup(&pattern) {
                Some(b'*') => break,
                Some(c) => chars.push(c),
                None => return Some(format_error("code39: unrecognized character")),
            }
            cursor += 9 + 1;
        }
        cursor += 9;

        let decoded = if self.extended_mode { extended_decode(&chars) } else { Ok(chars) };
        let bytes = match decoded {
            Ok(b) => b,
            Err(_) => return Some(format_error("code39: invalid extended-mode shift sequence")),
        };

        let mut content = Content::new();
        content.push_bytes(Eci::Default, &bytes);
        Some(Ok(RowResult {
            format: OneDFormat::Code39,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: cursor },
        }))
    }
}

/// Fold `$`/`%`/`/`/`+` shift-pair sequences back into full ASCII per the USS-39 extended-mode
/// convention: each shift character is followed by a letter whose position in the alphabet
/// selects the target ASCII value.
fn extended_decode(chars: &[u8]) -> std::result::Result<Vec<u8>, ()> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            b'$' | b'%' | b'/' | b'+' => {
                let next = *chars.get(i + 1).ok_or(())?;
                if !next.is_ascii_uppercase() {
                    return Err(());
                }
                let offset = (next - b'A') as i16;
                let value = match c {
                    b'$' => offset, // control characters 0x00-0x19
                    b'%' => offset + 26,
                    b'/' => offset + b'/' as i16 + 1,
                    b'+' => offset + b'a' as i16 - b'A' as i16,
                    _ => unreachable!(),
                };
                out.push((value & 0xFF) as u8);
                i += 2;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_runs(c: u8) -> [u16; 9] {
        let (_, pattern) = ALPHABET.iter().find(|(ch, _)| *ch == c).unwrap();
        let mut runs = [0u16; 9];
        for (i, &wide) in pattern.iter().enumerate() {
            runs[i] = if wide { 3 } else { 1 };
        }
        runs
    }

    fn build_row(text: &[u8]) -> PatternRow {
        let mut row = PatternRow::new();
        row.push(10);
        for &c in std::iter::once(&b'*').chain(text.iter()).chain(std::iter::once(&b'*')) {
            for w in pattern_runs(c) {
                row.push(w);
            }
            row.push(1); // inter-character gap
        }
        row
    }

    #[test]
    fn decodes_plain_alphanumeric() {
        let row = build_row(b"CODE39");
        let reader = Code39Reader::default();
        let result = reader.decode_row(&row).unwrap().unwrap();
        assert_eq!(result.decoder_result.content.bytes(), b"CODE39");
    }

    #[test]
    fn rejects_unrecognized_character_pattern() {
        let mut row = PatternRow::new();
        row.push(10);
        for w in pattern_runs(b'*') {
            row.push(w);
        }
        row.push(1);
        // garbage character pattern.
        for w in [1u16, 1, 1, 1, 1, 1, 1, 1, 1] {
            row.push(w);
        }
        row.push(1);
        for w in pattern_runs(b'*') {
            row.push(w);
        }
        let reader = Code39Reader::default();
        assert!(reader.decode_row(&row).unwrap().is_err());
    }
}
