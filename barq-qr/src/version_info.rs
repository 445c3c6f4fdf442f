// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 18-bit version information word printed twice near the two non-top-left finder patterns,
//! present only on version 7 and up. A BCH(18,6) code over the version number, decoded the same
//! generate-and-match-by-distance way as `format_info`.

const GENERATOR: u32 = 0x1F25;

fn encode(version: u32) -> u32 {
    let mut value = version << 12;
    for i in (12..18).rev() {
        if value & (1 << i) != 0 {
            value ^= GENERATOR << (i - 12);
        }
    }
    version << 12 | value
}

/// Recover the version number (7-40) nearest the 18 observed bits, or `None` if no candidate is
/// within 3 bit-errors.
pub fn decode(bits: u32) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for version in 7u32..=40 {
        let codeword = encode(version);
        let distance = (codeword ^ bits).count_ones();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((version, distance));
        }
    }
    let (version, distance) = best?;
    if distance > 3 {
        return None;
    }
    Some(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_recovers_exact_version() {
        assert_eq!(decode(encode(7)), Some(7));
        assert_eq!(decode(encode(40)), Some(40));
    }

    #[test]
    fn decode_tolerates_bit_errors() {
        let corrupted = encode(12) ^ 0b11;
        assert_eq!(decode(corrupted), Some(12));
    }
}
