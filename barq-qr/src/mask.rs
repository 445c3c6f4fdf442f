// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The eight QR data-masking patterns (ISO/IEC 18004 Table 10), each a simple function of a
//! module's row/column that XORs with the underlying bit to even out light/dark module
//! distribution.

/// Evaluate mask pattern `pattern` (0-7) at module coordinates `(row, col)`.
pub fn apply(pattern: u8, row: u32, col: u32) -> bool {
    let (r, c) = (row as i64, col as i64);
    match pattern {
        0 => (r + c) % 2 == 0,
        1 => r % 2 == 0,
        2 => c % 3 == 0,
        3 => (r + c) % 3 == 0,
        4 => ((r / 2) + (c / 3)) % 2 == 0,
        5 => (r * c) % 2 + (r * c) % 3 == 0,
        6 => ((r * c) % 2 + (r * c) % 3) % 2 == 0,
        7 => ((r + c) % 2 + (r * c) % 3) % 2 == 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_zero_checkerboards_on_parity() {
        assert!(apply(0, 0, 0));
        assert!(!apply(0, 0, 1));
    }

    #[test]
    fn every_pattern_is_a_pure_function_of_position() {
        for p in 0..8 {
            assert_eq!(apply(p, 3, 4), apply(p, 3, 4));
        }
    }
}
