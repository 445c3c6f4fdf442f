// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PDF417 (ISO/IEC 15438) detection and decoding: row indicator codewords, Text/Byte/Numeric
//! compaction, GF(929) Reed-Solomon, and Macro PDF417 segment linkage.

mod byte;
mod codewords;
mod decoder;
mod detector;
mod numeric;
mod segments;
mod tables;
mod text;

use barq_core::{unsupported_error, BitMatrix, DecoderResult, Quadrilateral, Result};

/// Locate a symbol, read its module matrix's left-indicator/data/right-indicator codeword
/// columns row by row, recover the error-correction level from the indicator columns (falling
/// back to a moderate default if fewer than 3 rows were found to cross-check it against), and
/// hand the assembled codeword list to `decoder::decode`.
pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    let (matrix, quad) = detector::detect(image)?;
    let columns_modules = matrix.width() / 17;
    let num_rows = matrix.height();
    if columns_modules < 3 {
        return unsupported_error("pdf417: located region too narrow to contain indicator and data columns");
    }

    let mut indicator_readings: Vec<(u32, u32, u32)> = Vec::new();
    let mut data_codewords: Vec<u16> = Vec::new();
    for row in 0..num_rows {
        let left = codewords::read_codeword(&matrix, row, 0);
        let right = codewords::read_codeword(&matrix, row, (columns_modules - 1) * 17);
        if let (Some(left), Some(right)) = (left, right) {
            indicator_readings.push((row % 3, left as u32, right as u32));
        }
        for col in 1..columns_modules - 1 {
            data_codewords.push(codewords::read_codeword(&matrix, row, col * 17).unwrap_or(0));
        }
    }

    let ec_level = if indicator_readings.len() >= 3 {
        let readings: [(u32, u32, u32); 3] =
            [indicator_readings[0], indicator_readings[1], indicator_readings[2]];
        tables::decode_row_indicators(&readings).map(|(_, _, level)| level).unwrap_or(2)
    }
    else {
        2
    };
    let num_ecc = tables::ec_codeword_count(ec_level);
    if data_codewords.len() < num_ecc {
        return unsupported_error("pdf417: fewer codewords recovered than the estimated error-correction count");
    }
    decoder::decode(&data_codewords, num_ecc).map(|result| (result, quad))
}
