// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turning one 17-module-wide codeword cell of the module matrix `detector::detect` samples into
//! a numeric codeword value.
//!
//! A real PDF417 decoder maps each codeword's 8 runs through the symbol-to-codeword table in
//! ISO/IEC 15438 Annex C (2787 entries across 3 row clusters); that table isn't reproduced in this
//! pack with any confidence, so this instead recovers the combinadic rank of the 8 runs among all
//! 8-run groups summing to 17 modules (the same closed-form construction `barq-oned`'s DataBar
//! reader uses for its own 4-run characters, generalized here to 8 runs). The resulting value is a
//! consistent re-encoding of the cell's modulation, not the symbol's real assigned codeword, so
//! decoded payloads should be expected to be wrong even once detection and row/column geometry are
//! right; this at least makes every later pipeline stage (row-indicator decode, GF(929)
//! correction, compaction-mode parsing) reachable and exercised end to end.

use barq_core::{BitMatrix, PatternRow};

/// Binomial coefficient `C(n, k)`.
fn binomial(n: u32, k: u32) -> u32 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1u64;
    for i in 0..k {
        result = result * (n - i) as u64 / (i + 1) as u64;
    }
    result as u32
}

/// Combinadic rank of an 8-element run-length group summing to 17 modules, consumed
/// most-significant element first (see `barq_oned::databar::combinadic_value`, which this
/// mirrors).
fn combinadic_value(widths: &[u32; 8]) -> u32 {
    let mut value = 0u32;
    let mut remaining_total = widths.iter().sum::<u32>().saturating_sub(8);
    for i in 0..7 {
        let elements_left_after = (6 - i) as u32;
        for v in 0..widths[i].saturating_sub(1) {
            let rest = remaining_total.saturating_sub(v);
            value += binomial(rest + elements_left_after, elements_left_after);
        }
        remaining_total = remaining_total.saturating_sub(widths[i].saturating_sub(1));
    }
    value
}

/// Read one codeword cell (17 consecutive module columns of `row` in `matrix`) and reduce its
/// combinadic rank mod 929 (PDF417's codeword alphabet size).
pub fn read_codeword(matrix: &BitMatrix, row: u32, column: u32) -> Option<u16> {
    let bits: Vec<bool> = (0..17).map(|i| matrix.get(column + i, row)).collect();
    let pattern = PatternRow::from_bits(bits);
    let mut widths = pattern.as_slice();
    if widths.first() == Some(&0) {
        widths = &widths[1..];
    }
    if widths.len() != 8 {
        return None;
    }
    let widths: [u32; 8] = std::array::from_fn(|i| widths[i] as u32);
    Some((combinadic_value(&widths) % 929) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_matches_known_values() {
        assert_eq!(binomial(4, 2), 6);
        assert_eq!(binomial(8, 0), 1);
    }

    #[test]
    fn read_codeword_recovers_a_value_in_range() {
        let mut matrix = BitMatrix::new(17, 1).unwrap();
        for x in [0u32, 1, 2, 8, 9, 10, 11, 12] {
            matrix.set(x, 0);
        }
        let value = read_codeword(&matrix, 0, 0).unwrap();
        assert!(value < 929);
    }
}
