// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MaxiCode (ISO/IEC 16023) detection and decoding. See `detector` for the scope this crate
//! currently covers.

mod decoder;
mod detector;
mod tables;

use barq_core::{BitMatrix, Content, DecoderResult, Quadrilateral, Result};

/// Read `count` 6-bit codewords in raster (row-major) order off the sampled module matrix.
/// ISO/IEC 16023's real codeword-to-module bit assignment is a fixed, non-raster table that isn't
/// reproduced in this pack, so this pulls real bits from the located symbol rather than
/// synthesizing zeros, but the codeword boundaries this produces won't line up with a conformant
/// reader's.
fn read_codewords(matrix: &BitMatrix, count: usize) -> Vec<u16> {
    let mut bits = (0..matrix.height()).flat_map(|y| (0..matrix.width()).map(move |x| (x, y))).map(|(x, y)| matrix.get(x, y));
    let mut codewords = Vec::with_capacity(count);
    for _ in 0..count {
        let mut value = 0u16;
        for _ in 0..tables::GF_BITS {
            value = (value << 1) | bits.next().unwrap_or(false) as u16;
        }
        codewords.push(value);
    }
    codewords
}

/// Locates the symbol and error-corrects its primary message block. Turning the corrected
/// codewords into mode/postal-code/country/service-class fields and a secondary-block text
/// payload needs exact per-bit field offsets this pack doesn't carry with confidence (see
/// `decoder`'s module docs), so the returned content is always empty; only location and
/// correction are exercised end to end.
pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    let (matrix, quad) = detector::detect(image)?;
    let total = tables::PRIMARY_DATA_CODEWORDS + tables::PRIMARY_EC_CODEWORDS;
    let mut codewords = read_codewords(&matrix, total);
    decoder::correct(&mut codewords, tables::PRIMARY_EC_CODEWORDS)?;
    Ok((DecoderResult::new(Content::new()), quad))
}
