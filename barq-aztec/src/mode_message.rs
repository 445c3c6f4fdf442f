// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The mode message: wrapped around the bullseye core as 4-bit codewords over GF(16). Compact
//! symbols carry 28 bits (2 data codewords -- layer count and codeword count -- plus 5
//! Reed-Solomon codewords); Full-range symbols carry 40 bits (4 data codewords plus 6
//! Reed-Solomon codewords, to fit Full-range's wider layer and codeword-count fields) (ISO/IEC
//! 24778 clause 6.2).

use barq_core::{decode_binary, Error, GfBinary, Result};

pub struct ModeMessage {
    pub layers: u32,
    pub codewords: u32,
    pub is_full: bool,
}

/// Decode the 28-bit compact mode message, MSB-first.
pub fn decode_compact(bits: u32) -> Result<ModeMessage> {
    let field = GfBinary::new(4, 0x13);
    let mut words: Vec<u16> = (0..7).map(|i| ((bits >> (4 * (6 - i))) & 0xF) as u16).collect();
    decode_binary(&field, &mut words, 5, 1, 1)?;

    let data = ((words[0] as u32) << 4) | words[1] as u32;
    let layers = (data >> 6) + 1;
    let codewords = (data & 0x3F) + 1;
    if layers > crate::tables::MAX_COMPACT_LAYERS {
        return Err(Error::format("aztec: mode message reports more layers than a compact symbol allows"));
    }
    Ok(ModeMessage { layers, codewords, is_full: false })
}

/// Decode the 40-bit Full-range mode message, MSB-first: 10 codewords of 4 bits, the first 4
/// carrying a 5-bit layer-count field and an 11-bit codeword-count field, the remaining 6 are
/// Reed-Solomon.
pub fn decode_full(bits: u64) -> Result<ModeMessage> {
    let field = GfBinary::new(4, 0x13);
    let mut words: Vec<u16> = (0..10).map(|i| ((bits >> (4 * (9 - i))) & 0xF) as u16).collect();
    decode_binary(&field, &mut words, 6, 1, 1)?;

    let data = words[0..4].iter().fold(0u32, |acc, &w| (acc << 4) | w as u32);
    let layers = (data >> 11) + 1;
    let codewords = (data & 0x7FF) + 1;
    if layers > crate::tables::MAX_FULL_LAYERS {
        return Err(Error::format("aztec: mode message reports more layers than a Full-range symbol allows"));
    }
    Ok(ModeMessage { layers, codewords, is_full: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Systematic Reed-Solomon encode via polynomial division, used only to build a fixture for
    /// the round-trip test below (the decoder itself never needs to encode).
    fn encode(field: &GfBinary, data: &[u16], num_ecc: usize) -> Vec<u16> {
        let mut generator = vec![1u16];
        for i in 0..num_ecc {
            let root = field.exp(1 + i as i32);
            let mut next = vec![0u16; generator.len() + 1];
            for (j, &g) in generator.iter().enumerate() {
                next[j] ^= field.mul(g, root);
                next[j + 1] ^= g;
            }
            generator = next;
        }
        let mut remainder = data.to_vec();
        remainder.extend(std::iter::repeat(0u16).take(num_ecc));
        for i in 0..data.len() {
            let coeff = remainder[i];
            if coeff == 0 {
                continue;
            }
            for (j, &g) in generator.iter().enumerate() {
                remainder[i + j] ^= field.mul(g, coeff);
            }
        }
        remainder[data.len()..].to_vec()
    }

    #[test]
    fn round_trips_a_well_formed_mode_message() {
        let field = GfBinary::new(4, 0x13);
        let layers = 2u32;
        let codewords = 5u32;
        let data_value = ((layers - 1) << 6) | (codewords - 1);
        let data_words = [((data_value >> 4) & 0xF) as u16, (data_value & 0xF) as u16];
        let ec_words = encode(&field, &data_words, 5);
        let mut all = data_words.to_vec();
        all.extend(ec_words);
        let mut bits = 0u32;
        for w in &all {
            bits = (bits << 4) | *w as u32;
        }
        let decoded = decode_compact(bits).unwrap();
        assert_eq!(decoded.layers, layers);
        assert_eq!(decoded.codewords, codewords);
        assert!(!decoded.is_full);
    }

    #[test]
    fn round_trips_a_well_formed_full_range_mode_message() {
        let field = GfBinary::new(4, 0x13);
        let layers = 7u32;
        let codewords = 100u32;
        let data_value = ((layers - 1) << 11) | (codewords - 1);
        let data_words: [u16; 4] = std::array::from_fn(|i| ((data_value >> (4 * (3 - i))) & 0xF) as u16);
        let ec_words = encode(&field, &data_words, 6);
        let mut all = data_words.to_vec();
        all.extend(ec_words);
        let mut bits = 0u64;
        for w in &all {
            bits = (bits << 4) | *w as u64;
        }
        let decoded = decode_full(bits).unwrap();
        assert_eq!(decoded.layers, layers);
        assert_eq!(decoded.codewords, codewords);
        assert!(decoded.is_full);
    }
}
