// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Corrects a row of codewords with GF(929) Reed-Solomon, then parses the data codewords (row
//! indicators already removed by the caller) into segments.

use barq_core::reedsolomon::gf929;
use barq_core::{checksum_error, DecoderResult, Result};

use crate::segments;

/// Error-correct and parse one symbol's full codeword list (data codewords followed by `num_ecc`
/// error-correction codewords, in that order, as read off the rows in raster order with each
/// row's row-indicator codewords already stripped).
pub fn decode(codewords: &[u16], num_ecc: usize) -> Result<DecoderResult> {
    if codewords.len() < num_ecc {
        return checksum_error("pdf417: fewer codewords than the declared error-correction count");
    }
    let mut work: Vec<i64> = codewords.iter().map(|&c| c as i64).collect();
    gf929::decode(&mut work, num_ecc)?;

    let data_len = codewords.len() - num_ecc;
    let data: Vec<u16> = work[..data_len].iter().map(|&v| v as u16).collect();

    let parsed = segments::decode(&data)?;
    let mut result = DecoderResult::new(parsed.content);
    if let Some(index) = parsed.macro_segment_index {
        result = result.with_structured_append(index as u8, if parsed.macro_last_segment { index as u8 + 1 } else { 0 }, None);
    }
    Ok(result.with_symbology_identifier("]L2"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_fewer_codewords_than_ec_count() {
        let codewords = [1u16, 2, 3];
        assert!(decode(&codewords, 5).is_err());
    }

    #[test]
    fn decodes_with_no_errors_present() {
        // A single text-latch codeword followed by two all-zero EC codewords; the RS syndrome
        // check over an all-zero tail is trivially satisfied when there are no real errors only
        // if the data is chosen so the true EC codewords are also zero, which holds for an
        // all-zero message. Use the simplest possible case: zero data codewords.
        let codewords = [0u16; 2];
        assert!(decode(&codewords, 2).is_ok());
    }
}
