// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reed-Solomon correction over MaxiCode's GF(64) codewords.
//!
//! Turning a corrected primary block into its mode, postal code, country, and service class
//! fields, and a corrected secondary block into Code Set A/B/C/D/E text, both depend on exact
//! per-bit field offsets from ISO/IEC 16023 Annexes that aren't reproduced in this workspace with
//! enough confidence to ship as fact, so those two parsing steps are not implemented here. Only
//! the Reed-Solomon correction step, which is a direct application of `barq_core`'s generic binary
//! field decoder, is.

use barq_core::{decode_binary, GfBinary, Result};

use crate::tables::{GF_BITS, GF_PRIMITIVE};

/// Correct a block of codewords in place, returning the number of errors fixed.
pub fn correct(codewords: &mut [u16], num_ecc: usize) -> Result<usize> {
    let field = GfBinary::new(GF_BITS, GF_PRIMITIVE);
    decode_binary(&field, codewords, num_ecc, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrects_a_block_with_no_errors() {
        let mut codewords = vec![0u16; 20];
        assert_eq!(correct(&mut codewords, 10).unwrap(), 0);
    }
}
