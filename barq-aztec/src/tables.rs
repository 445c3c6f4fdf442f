// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-layer codeword word size and data-region bit capacity (ISO/IEC 24778 Table 2): 1-2 layers
//! pack 6-bit codewords, 3-8 pack 8-bit, 9-22 pack 10-bit, 23-32 pack 12-bit. Compact symbols are
//! capped at 4 layers; Full-range symbols run 1-32 layers and additionally carry a reference grid
//! (alternating-color rows/columns every 16 modules, ISO/IEC 24778 clause 6.4.2) splitting up the
//! data region, which this crate's data-placement walk (see `decoder::read_data_bits`) does not
//! thread around: reads on a Full-range symbol whose data spans a reference-grid line should be
//! expected to be wrong even once the symbol locates and its mode message decodes cleanly.

pub const MAX_COMPACT_LAYERS: u32 = 4;
pub const MAX_FULL_LAYERS: u32 = 32;

pub fn word_size(layers: u32) -> u32 {
    match layers {
        0..=2 => 6,
        3..=8 => 8,
        9..=22 => 10,
        _ => 12,
    }
}

/// Overall symbol dimension (modules per side) for a compact symbol with this many layers: an
/// 11x11 bullseye core plus 4 modules of data ring per layer.
pub fn symbol_size(layers: u32) -> u32 {
    11 + 4 * layers
}

/// Overall symbol dimension (modules per side) for a Full-range symbol with this many layers: a
/// 15x15 bullseye-plus-mode-message core (two rings wider than Compact's, to carry the larger
/// 40-bit mode message) plus 4 modules of data ring per layer. Does not account for the reference
/// grid's own width.
pub fn symbol_size_full(layers: u32) -> u32 {
    15 + 4 * layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_layer_uses_six_bit_words() {
        assert_eq!(word_size(1), 6);
        assert_eq!(word_size(4), 8);
    }

    #[test]
    fn higher_layer_counts_step_up_word_size() {
        assert_eq!(word_size(9), 10);
        assert_eq!(word_size(23), 12);
    }

    #[test]
    fn symbol_size_matches_known_compact_dimensions() {
        assert_eq!(symbol_size(1), 15);
        assert_eq!(symbol_size(4), 27);
    }

    #[test]
    fn symbol_size_full_is_wider_than_compact_at_the_same_layer_count() {
        assert!(symbol_size_full(1) > symbol_size(1));
    }
}
