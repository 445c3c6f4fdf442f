// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Code93: a successor to Code39 using 9-module-wide characters (4 bar/space runs per character,
//! rather than Code39's binary narrow/wide), a 47-character alphabet plus four shift characters
//! (`($)`, `(%)`, `(/)`, `(+)`) that extend it to full ASCII, and two trailing modulo-47 check
//! characters ("C" then "K").

use barq_core::content::Eci;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::{OneDFormat, RowRange, RowResult, RowReader};

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%\x01\x02\x03\x04";
// Indices 43-46 are the shift characters ($)=43 (%)=44 (/)=45 (+)=46, represented above by
// placeholder control bytes 1-4 since they have no literal ASCII rendering of their own.

/// The 9-module (4-run) pattern for each of the 47 alphabet entries, in codeword order.
const PATTERNS: [[u32; 4]; 47] = [
    [1, 1, 1, 4], [1, 1, 4, 1], [1, 4, 1, 1], [4, 1, 1, 1], [1, 1, 2, 3], [1, 2, 1, 3], [1, 2, 3, 1],
    [1, 3, 1, 2], [1, 3, 2, 1], [2, 1, 1, 3], [2, 1, 3, 1], [2, 3, 1, 1], [3, 1, 1, 2], [3, 1, 2, 1],
    [3, 2, 1, 1], [2, 2, 1, 2], [2, 2, 2, 1], [1, 1, 1, 4], [1, 1, 3, 2], [1, 3, 1, 2], [1, 1, 2, 4],
    [1, 2, 1, 4], [4, 1, 1, 2], [4, 2, 1, 1], [2, 1, 4, 1], [2, 4, 1, 1], [1, 1, 4, 2], [1, 2, 4, 1],
    [4, 1, 2, 1], [2, 1, 1, 4], [2, 1, 4, 1], [1, 4, 2, 1], [1, 2, 2, 3], [1, 2, 3, 2], [2, 1, 2, 3],
    [2, 2, 1, 3], [2, 2, 3, 1], [3, 1, 2, 2], [3, 2, 2, 1], [1, 4, 1, 2], [1, 1, 3, 3], [2, 3, 1, 2],
    [2, 3, 2, 1], [1, 3, 1, 3], [1, 1, 2, 2], [2, 1, 1, 1], [1, 1, 1, 1],
];

/// The dedicated 5-run start/stop pattern, distinct from every data character's 4-run pattern.
const START_STOP: [u32; 5] = [1, 1, 1, 1, 4];

fn best_match(runs: &[u32]) -> Option<u8> {
    let total: u32 = runs.iter().sum();
    if total == 0 {
        return None;
    }
    let module = total as f32 / 9.0;
    let observed: Vec<f32> = runs.iter().map(|&w| w as f32 / module).collect();
    let mut best = None;
    let mut best_error = f32::MAX;
    for (i, pattern) in PATTERNS.iter().enumerate() {
        let error: f32 = pattern.iter().zip(observed.iter()).map(|(&p, &o)| (p as f32 - o).powi(2)).sum();
        if error < best_error {
            best_error = error;
            best = Some(i as u8);
        }
    }
    if best_error > 1.5 {
        return None;
    }
    best
}

fn is_start_stop(runs: &[u32]) -> bool {
    if runs.len() != 5 {
        return false;
    }
    let total: u32 = runs.iter().sum();
    if total == 0 {
        return false;
    }
    let module = total as f32 / 9.0;
    let error: f32 = START_STOP.iter().zip(runs.iter()).map(|(&p, &o)| (p as f32 - o as f32 / module).powi(2)).sum();
    error < 1.5
}

pub struct Code93Reader;

impl RowReader for Code93Reader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let widths = row.as_slice();
        if widths.len() < 1 + 5 + 4 {
            return None;
        }

        let mut start = 1usize;
        loop {
            if start + 5 > widths.len() {
                return None;
            }
            let runs: Vec<u32> = widths[start..start + 5].iter().map(|&w| w as u32).collect();
            if is_start_stop(&runs) {
                break;
            }
            start += 1;
            if start > 4 {
                return None;
            }
        }

        let mut cursor = start + 5;
        let mut values = Vec::new();
        loop {
            if cursor + 5 <= widths.len() {
                let tail: Vec<u32> = widths[cursor..cursor + 5].iter().map(|&w| w as u32).collect();
                if is_start_stop(&tail) {
                    cursor += 5;
                    break;
                }
            }
            if cursor + 4 > widths.len() {
                return Some(format_error("code93: ended before stop pattern"));
            }
            let runs: Vec<u32> = widths[cursor..cursor + 4].iter().map(|&w| w as u32).collect();
            match best_match(&runs) {
                Some(v) => values.push(v),
                None => return Some(format_error("code93: unrecognized character pattern")),
            }
            cursor += 4;
            if values.len() > 128 {
                return Some(format_error("code93: symbol too long"));
            }
        }

        if values.len() < 2 {
            return Some(format_error("code93: symbol too short to contain checksum"));
        }
        let (payload, checks) = values.split_at(values.len() - 2);
        let c_check = checks[0];
        let k_check = checks[1];

        if compute_check(payload, 20) != c_check {
            return Some(format_error("code93: C check character mismatch"));
        }
        let mut with_c = payload.to_vec();
        with_c.push(c_check);
        if compute_check(&with_c, 15) != k_check {
            return Some(format_error("code93: K check character mismatch"));
        }

        let mut bytes = Vec::with_capacity(payload.len());
        let mut i = 0;
        while i < payload.len() {
            let v = payload[i] as usize;
            if v >= 43 {
                let Some(&next) = payload.get(i + 1) else {
                    return Some(format_error("code93: truncated shift sequence"));
                };
                bytes.push(shift_decode(v, next as usize));
                i += 2;
            }
            else {
                bytes.push(plain_char(v));
                i += 1;
            }
        }

        let mut content = Content::new();
        content.push_bytes(Eci::Default, &bytes);
        Some(Ok(RowResult {
            format: OneDFormat::Code93,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: cursor },
        }))
    }
}

fn plain_char(value: usize) -> u8 {
    *ALPHABET.get(value).unwrap_or(&b'?')
}

/// Resolve a `($)`/`(%)`/`(/)`/`(+)` shift character followed by a plain letter back to its
/// extended-ASCII value, per the AIM USS-93 shift table.
fn shift_decode(shift: usize, letter: usize) -> u8 {
    let base = letter as i16;
    match shift {
        43 => base.clamp(0, 255) as u8,          // ($): control characters.
        44 => (base + 32).clamp(0, 255) as u8,   // (%): extended punctuation.
        45 => (base + 64).clamp(0, 255) as u8,   // (/): more punctuation.
        46 => (base + 96).clamp(0, 255) as u8,   // (+): lowercase letters.
        _ => b'?',
    }
}

/// Weighted modulo-47 check character, with weights cycling `1..=limit` from the rightmost
/// (most recent) value.
fn compute_check(values: &[u8], limit: u32) -> u8 {
    let mut sum = 0u32;
    for (i, &v) in values.iter().rev().enumerate() {
        let weight = (i as u32 % limit) + 1;
        sum += v as u32 * weight;
    }
    (sum % 47) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_character_weighting_is_deterministic() {
        let values = [1u8, 2, 3];
        let check = compute_check(&values, 20);
        assert!(check < 47);
    }

    #[test]
    fn plain_char_maps_digits() {
        assert_eq!(plain_char(0), b'0');
        assert_eq!(plain_char(9), b'9');
        assert_eq!(plain_char(10), b'A');
    }

    #[test]
    fn decodes_row_built_from_known_values() {
        let payload = vec![12u8, 24, 0]; // arbitrary in-range codeword values.
        let c = compute_check(&payload, 20);
        let mut with_c = payload.clone();
        with_c.push(c);
        let k = compute_check(&with_c, 15);

        let mut row = PatternRow::new();
        row.push(10);
        for w in START_STOP {
            row.push(w as u16);
        }
        for &v in payload.iter().chain([c, k].iter()) {
            for w in PATTERNS[v as usize] {
                row.push(w as u16);
            }
        }
        for w in START_STOP {
            row.push(w as u16);
        }
        row.push(10);

        let reader = Code93Reader;
        let result = reader.decode_row(&row).unwrap().unwrap();
        let expected: Vec<u8> = payload.iter().map(|&v| plain_char(v as usize)).collect();
        assert_eq!(result.decoder_result.content.bytes(), expected);
    }
}
