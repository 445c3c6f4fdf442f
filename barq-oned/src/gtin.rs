// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GTIN check digit computation and validation, shared by every UPC/EAN/DataBar family reader.
//! The algorithm alternates odd/even position weights of 3 and 1 starting from the digit just
//! before the check digit, matching the GS1 General Specifications check digit algorithm.

/// Compute the check digit for `digits`, which must NOT already include a check digit.
pub fn compute_check_digit(digits: &[u8]) -> u8 {
    let mut sum = 0u32;
    // Weight alternates 3,1 starting from the rightmost (last) digit of the payload, since that
    // digit sits immediately to the left of the (not yet appended) check digit.
    for (i, &d) in digits.iter().rev().enumerate() {
        let weight = if i % 2 == 0 { 3 } else { 1 };
        sum += d as u32 * weight;
    }
    ((10 - (sum % 10)) % 10) as u8
}

/// Validate that `digits`'s last entry is the correct check digit for the digits preceding it.
pub fn check_digit_is_valid(digits: &[u8]) -> bool {
    if digits.is_empty() {
        return false;
    }
    let (payload, check) = digits.split_at(digits.len() - 1);
    compute_check_digit(payload) == check[0]
}

/// Expand a UPC-E compressed 6-digit payload (plus number system digit) to its full 12-digit
/// UPC-A equivalent, per the GS1 General Specifications UPC-E expansion table keyed by the
/// compressed payload's last digit (0-9, selecting one of the zero-suppression patterns).
pub fn upc_e_to_upc_a(number_system: u8, compressed: &[u8; 6]) -> [u8; 11] {
    let mut out = [0u8; 11];
    out[0] = number_system;
    let last = compressed[5];
    match last {
        0 | 1 | 2 => {
            out[1] = compressed[0];
            out[2] = compressed[1];
            out[3] = last;
            out[4] = 0;
            out[5] = 0;
            out[6] = 0;
            out[7] = 0;
            out[8] = compressed[2];
            out[9] = compressed[3];
            out[10] = compressed[4];
        }
        3 => {
            out[1] = compressed[0];
            out[2] = compressed[1];
            out[3] = compressed[2];
            out[4] = 0;
            out[5] = 0;
            out[6] = 0;
            out[7] = 0;
            out[8] = 0;
            out[9] = compressed[3];
            out[10] = compressed[4];
        }
        4 => {
            out[1] = compressed[0];
            out[2] = compressed[1];
            out[3] = compressed[2];
            out[4] = compressed[3];
            out[5] = 0;
            out[6] = 0;
            out[7] = 0;
            out[8] = 0;
            out[9] = 0;
            out[10] = compressed[4];
        }
        _ => {
            out[1] = compressed[0];
            out[2] = compressed[1];
            out[3] = compressed[2];
            out[4] = compressed[3];
            out[5] = compressed[4];
            out[6] = 0;
            out[7] = 0;
            out[8] = 0;
            out[9] = 0;
            out[10] = last;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_known_ean13_check_digit() {
        // "400638133393" is a commonly cited EAN-13 example, check digit 3.
        let digits: Vec<u8> = "40063813339".bytes().map(|b| b - b'0').collect();
        assert_eq!(compute_check_digit(&digits), 3);
    }

    #[test]
    fn validates_full_code() {
        let digits: Vec<u8> = "400638133393".bytes().map(|b| b - b'0').collect();
        assert!(check_digit_is_valid(&digits));
    }

    #[test]
    fn rejects_wrong_check_digit() {
        let digits: Vec<u8> = "400638133390".bytes().map(|b| b - b'0').collect();
        assert!(!check_digit_is_valid(&digits));
    }

    #[test]
    fn upc_e_expansion_last_digit_zero() {
        let compressed = [1u8, 2, 3, 4, 5, 0];
        let expanded = upc_e_to_upc_a(0, &compressed);
        assert_eq!(expanded, [0, 1, 2, 0, 0, 0, 0, 0, 3, 4, 5]);
    }
}
