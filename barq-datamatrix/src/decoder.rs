// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turns a sampled, upright module matrix into a `DecoderResult`: read codewords via the "utah"
//! placement walk, Reed-Solomon correct them as a single block, then parse the resulting byte
//! stream into text/GS1/Base256 segments.

use barq_core::{format_error, BitMatrix, DecoderResult, Error, GfBinary, Result};

use crate::placement::{read_codewords, DataRegion};
use crate::segments;
use crate::tables::size_info;

/// Decode a symbol already sampled into an upright, exact `size x size` bit matrix including its
/// solid-L border and clock track (as produced by the detector's perspective sampling).
pub fn decode(matrix: &BitMatrix) -> Result<DecoderResult> {
    let size = matrix.width();
    if matrix.height() != size {
        return format_error("datamatrix: sampled matrix is not square");
    }
    let info = size_info(size).ok_or_else(|| Error::format("datamatrix: sampled size has no tabulated codeword layout"))?;

    // The data region excludes the one-module border (the solid L on the left/bottom, the clock
    // track on the top/right); its row/column 0 maps directly to the first interior row/column,
    // one module in from the matrix's own (0, 0).
    let region_size = size as i32 - 2;
    let get = |row: i32, col: i32| matrix.get((col + 1) as u32, (row + 1) as u32);
    let region = DataRegion { rows: region_size, cols: region_size, get: &get };
    let total = (info.data_codewords + info.ec_codewords) as usize;
    let codewords = read_codewords(&region, total);
    if codewords.len() != total {
        return format_error("datamatrix: placement walk produced the wrong codeword count");
    }

    let field = GfBinary::new(8, 0x12D);
    let mut work: Vec<u16> = codewords.iter().map(|&b| b as u16).collect();
    // Data Matrix's GF(256) generator starts at alpha^1, not alpha^0 (unlike QR's).
    barq_core::decode_binary(&field, &mut work, info.ec_codewords as usize, 1, 1)?;
    let data: Vec<u8> = work[..info.data_codewords as usize].iter().map(|&v| v as u8).collect();

    let parsed = segments::decode(&data)?;
    let mut result = DecoderResult::new(parsed.content);
    if parsed.structured_append {
        result = result.with_structured_append(0, 1, None);
    }
    if parsed.reader_init {
        result = result.mark_reader_init();
    }
    Ok(result.with_symbology_identifier("]d2"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_square_matrix() {
        let m = BitMatrix::new(10, 12).unwrap();
        assert!(decode(&m).is_err());
    }

    #[test]
    fn rejects_untabulated_size() {
        let m = BitMatrix::new(9, 9).unwrap();
        assert!(decode(&m).is_err());
    }
}
