// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 15-bit format information word: a BCH(15,5) code carrying the error-correction level and
//! mask pattern, read twice (for redundancy) next to the top-left finder pattern. Rather than
//! storing all 32 masked codewords as a literal table, they're generated from the standard's
//! generator polynomial and matched by minimum Hamming distance, which is the same recovery the
//! standard's own worked examples describe.

use crate::tables::EcLevel;

const GENERATOR: u32 = 0x537;
const MASK: u32 = 0x5412;
/// The mask Micro QR applies to its own 15-bit format codeword (ISO/IEC 18004 Annex C); the BCH
/// generator is shared with full QR, only the mask differs.
pub const MICRO_MASK: u32 = 0x4445;

fn encode(data: u32, mask: u32) -> u32 {
    let mut value = data << 10;
    for i in (10..15).rev() {
        if value & (1 << i) != 0 {
            value ^= GENERATOR << (i - 10);
        }
    }
    (data << 10 | value) ^ mask
}

#[derive(Debug, Clone, Copy)]
pub struct FormatInfo {
    pub ec_level: EcLevel,
    pub mask_pattern: u8,
}

/// Recover the 5-bit BCH(15,5) data value nearest (by Hamming distance) to the 15 observed bits,
/// unmasked with `mask`. Returns `None` if no valid codeword is within 3 bit-errors, the code's
/// correction bound.
pub fn recover_data(bits: u32, mask: u32) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for data in 0u32..32 {
        let codeword = encode(data, mask);
        let distance = (codeword ^ bits).count_ones();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((data, distance));
        }
    }
    let (data, distance) = best?;
    (distance <= 3).then_some(data)
}

/// Recover full QR's format info (error-correction level and mask pattern) from the 15 observed
/// bits.
pub fn decode(bits: u32) -> Option<FormatInfo> {
    let data = recover_data(bits, MASK)?;
    Some(FormatInfo { ec_level: EcLevel::from_bits(data >> 3), mask_pattern: (data & 0b111) as u8 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_recovers_exact_codeword() {
        let data = (0b01 << 3) | 0b010; // EC level L, mask 2.
        let codeword = encode(data, MASK);
        let info = decode(codeword).unwrap();
        assert_eq!(info.mask_pattern, 2);
        assert_eq!(info.ec_level.label(), "L");
    }

    #[test]
    fn decode_tolerates_a_few_bit_errors() {
        let data = (0b00 << 3) | 0b101;
        let corrupted = encode(data, MASK) ^ 0b101;
        let info = decode(corrupted).unwrap();
        assert_eq!(info.mask_pattern, 5);
    }

    #[test]
    fn recover_data_works_with_the_micro_qr_mask() {
        let data = 0b10110;
        let codeword = encode(data, MICRO_MASK);
        assert_eq!(recover_data(codeword, MICRO_MASK), Some(data));
    }
}
