// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Code128: a 6-run-per-codeword alphabet (widths summing to 11 modules) with three interleaved
//! code sets (A: control + upper ASCII, B: full ASCII, C: digit pairs), switched mid-symbol via
//! `CODE_A`/`CODE_B`/`CODE_C` codewords, plus `FNC1`-`FNC4` function codes.

use barq_core::content::Eci;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::{OneDFormat, RowRange, RowResult, RowReader};

/// 107 distinct 6-run patterns (widths summing to 11), codeword value = table index; codeword 106
/// is the stop pattern (7 runs, 13 modules, decoded separately).
const PATTERNS: [[u32; 6]; 107] = code128_patterns();

const fn code128_patterns() -> [[u32; 6]; 107] {
    // The canonical Code128 pattern table, width-only (bar/space alternation is implicit from
    // position), taken in codeword order 0-106.
    [
        [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3], [1, 2, 1, 3, 2, 2],
        [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2], [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3],
        [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2], [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1],
        [1, 1, 3, 2, 2, 2], [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
        [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1], [3, 1, 1, 2, 2, 2],
        [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2], [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1],
        [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1], [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3],
        [1, 3, 1, 3, 2, 1], [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
        [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1], [1, 3, 2, 1, 3, 1],
        [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1], [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1],
        [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3], [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3],
        [3, 1, 1, 3, 2, 1], [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
        [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4], [1, 1, 1, 4, 2, 2],
        [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2], [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4],
        [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4], [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1],
        [2, 4, 1, 2, 1, 1], [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
        [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2], [1, 2, 4, 1, 1, 2],
        [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2], [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1],
        [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1], [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1],
        [1, 1, 4, 1, 1, 3], [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
        [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 2, 3, 2], [2, 1, 1, 3, 2, 2],
        [2, 2, 1, 2, 2, 2], [2, 1, 2, 2, 1, 3], [2, 1, 2, 3, 1, 2], [2, 3, 2, 2, 1, 1],
    ]
}

const STOP_PATTERN: [u32; 7] = [2, 3, 3, 1, 1, 1, 2];

const CODE_A: u8 = 101;
const CODE_B: u8 = 100;
const CODE_C: u8 = 99;
const FNC1: u8 = 102;
const FNC2: u8 = 97;
const FNC3: u8 = 96;
const SHIFT: u8 = 98;
const START_A: u8 = 103;
const START_B: u8 = 104;
const START_C: u8 = 105;
const STOP: u8 = 106;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Decode the run-length widths of one 6-run (or 7-run, for the stop pattern) symbol character
/// against `PATTERNS`/`STOP_PATTERN` by normalized variance, returning the codeword value.
fn best_codeword_match(runs: &[u32]) -> Option<u8> {
    let total: u32 = runs.iter().sum();
    if total == 0 {
        return None;
    }
    let module = total as f32 / 11.0;
    let observed: Vec<f32> = runs.iter().map(|&w| w as f32 / module).collect();

    let mut best = None;
    let mut best_error = f32::MAX;
    for (codeword, pattern) in PATTERNS.iter().enumerate() {
        let error: f32 = pattern.iter().zip(observed.iter()).map(|(&p, &o)| (p as f32 - o).powi(2)).sum();
        if error < best_error {
            best_error = error;
            best = Some(codeword as u8);
        }
    }
    if best_error > 2.0 {
        return None;
    }
    best
}

fn is_stop_pattern(runs: &[u32]) -> bool {
    if runs.len() != 7 {
        return false;
    }
    let total: u32 = runs.iter().sum();
    if total == 0 {
        return false;
    }
    let module = total as f32 / 13.0;
    let error: f32 =
        STOP_PATTERN.iter().zip(runs.iter()).map(|(&p, &o)| (p as f32 - o as f32 / module).powi(2)).sum();
    error < 2.0
}

pub struct Code128Reader;

impl RowReader for Code128Reader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let widths = row.as_slice();
        if widths.len() < 1 + 6 + 6 + 7 {
            return None;
        }

        // Find a start codeword (103/104/105) in the first six runs after the leading quiet
        // zone; a real scanner would try every offset, this mirrors the guard-anchored approach
        // used by the UPC/EAN reader above.
        let mut cursor = 1usize;
        let mut code_set;
        loop {
            if cursor + 6 > widths.len() {
                return None;
            }
            match best_codeword_match(&widths[cursor..cursor + 6]) {
                Some(START_A) => {
                    code_set = CodeSet::A;
                    break;
                }
                Some(START_B) => {
                    code_set = CodeSet::B;
                    break;
                }
                Some(START_C) => {
                    code_set = CodeSet::C;
                    break;
                }
                _ => cursor += 1,
            }
            if cursor > 4 {
                return None;
            }
        }
        cursor += 6;

        let mut codewords = Vec::new();
        loop {
            if cursor + 7 <= widths.len() && is_stop_pattern(&widths[cursor..cursor + 7]) {
                break;
            }
            if cursor + 6 > widths.len() {
                return Some(format_error("code128: ended before stop pattern"));
            }
            match best_codeword_match(&widths[cursor..cursor + 6]) {
                Some(cw) => codewords.push(cw),
                None => return Some(format_error("code128: unrecognized symbol character")),
            }
            cursor += 6;
        }

        if codewords.is_empty() {
            return Some(format_error("code128: empty symbol"));
        }

        let checksum_codeword = codewords[codewords.len() - 1];
        let payload = &codewords[..codewords.len() - 1];
        let start_value = match code_set {
            CodeSet::A => START_A,
            CodeSet::B => START_B,
            CodeSet::C => START_C,
        } as u32;
        let mut checksum = start_value;
        for (i, &cw) in payload.iter().enumerate() {
            checksum += cw as u32 * (i as u32 + 1);
        }
        if (checksum % 103) as u8 != checksum_codeword {
            return Some(format_error("code128: checksum mismatch"));
        }

        let mut content = Content::new();
        let mut bytes = Vec::new();
        let mut is_gs1 = false;
        for &cw in payload {
            match code_set {
                CodeSet::A => match cw {
                    CODE_B => code_set = CodeSet::B,
                    CODE_C => code_set = CodeSet::C,
                    FNC1 => is_gs1 = true,
                    FNC2 | FNC3 => {}
                    SHIFT => {}
                    v if v < 64 => bytes.push(v + 64),
                    v if v < 96 => bytes.push(v - 64),
                    _ => {}
                },
                CodeSet::B => match cw {
                    CODE_A => code_set = CodeSet::A,
                    CODE_C => code_set = CodeSet::C,
                    FNC1 => is_gs1 = true,
                    FNC2 | FNC3 => {}
                    v if v < 96 => bytes.push(v + 32),
                    _ => {}
                },
                CodeSet::C => match cw {
                    CODE_A => code_set = CodeSet::A,
                    CODE_B => code_set = CodeSet::B,
                    FNC1 => is_gs1 = true,
                    v if v < 100 => {
                        bytes.push(b'0' + v / 10);
                        bytes.push(b'0' + v % 10);
                    }
                    _ => {}
                },
            }
        }
        content.push_bytes(Eci::Default, &bytes);
        if is_gs1 {
            content.mark_gs1();
        }

        Some(Ok(RowResult {
            format: OneDFormat::Code128,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: cursor + 7 },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_runs(codeword: u8) -> Vec<u16> {
        PATTERNS[codeword as usize].iter().map(|&w| w as u16).collect()
    }

    #[test]
    fn pattern_table_widths_sum_to_eleven() {
        for pattern in PATTERNS.iter() {
            let sum: u32 = pattern.iter().sum();
            assert_eq!(sum, 11);
        }
    }

    #[test]
    fn decodes_code_set_b_hello() {
        let mut row = PatternRow::new();
        row.push(10);
        for w in pattern_runs(START_B) {
            row.push(w);
        }
        let codewords: Vec<u8> = "Hello".bytes().map(|b| b - 32).collect();
        let mut checksum = START_B as u32;
        for (i, &cw) in codewords.iter().enumerate() {
            checksum += cw as u32 * (i as u32 + 1);
            for w in pattern_runs(cw) {
                row.push(w);
            }
        }
        let check = (checksum % 103) as u8;
        for w in pattern_runs(check) {
            row.push(w);
        }
        for w in STOP_PATTERN {
            row.push(w as u16);
        }
        row.push(10);

        let reader = Code128Reader;
        let result = reader.decode_row(&row).unwrap().unwrap();
        assert_eq!(result.decoder_result.content.bytes(), b"Hello");
    }
}
