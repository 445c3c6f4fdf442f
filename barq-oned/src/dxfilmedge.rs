// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DX film edge barcodes: a short fixed-length code printed along 35mm film stock encoding the
//! DX (film manufacturer/type) number and frame number, using equal-width bars whose presence or
//! absence at each of a fixed set of module positions forms a binary code (no narrow/wide
//! distinction, unlike the other linear symbologies in this crate).

use barq_core::content::Eci;
use barq_core::{format_error, Content, DecoderResult, PatternRow, Result};

use crate::{OneDFormat, RowRange, RowResult, RowReader};

const MODULE_COUNT: usize = 12;
/// Half of the modules encode the manufacturer/film-type number, the other half the frame number;
/// both are plain binary fields read most-significant-module first.
const DX_BITS: usize = 6;
const FRAME_BITS: usize = 6;

pub struct DxFilmEdgeReader;

impl RowReader for DxFilmEdgeReader {
    fn decode_row(&self, row: &PatternRow) -> Option<Result<RowResult>> {
        let widths = row.as_slice();
        if widths.len() < 1 + MODULE_COUNT {
            return None;
        }

        // All bar/space runs in a DX code are close to one module wide; estimate the unit width
        // from the run immediately following the leading quiet zone and reject rows whose runs
        // don't cluster tightly around it (ruling out other symbologies' wider guard patterns).
        let candidate = &widths[1..1 + MODULE_COUNT];
        let unit = *candidate.iter().min()? as f32;
        if unit <= 0.0 {
            return None;
        }
        if !candidate.iter().all(|&w| ((w as f32 / unit) - (w as f32 / unit).round()).abs() < 0.3) {
            return None;
        }

        // A run's bit is `true` (bar present) when its width is an odd multiple of the unit;
        // `PatternRow` alternates white/black starting from white, so even-indexed runs are
        // white (bit false) by construction. Only odd-indexed (black) runs carry data here.
        let bits: Vec<bool> = candidate.iter().enumerate().map(|(i, &w)| i % 2 == 1 && w as f32 >= unit * 0.5).collect();
        if bits.len() < DX_BITS + FRAME_BITS {
            return Some(format_error("dx film edge: insufficient modules decoded"));
        }

        let dx_number = bits_to_value(&bits[..DX_BITS]);
        let frame_number = bits_to_value(&bits[DX_BITS..DX_BITS + FRAME_BITS]);

        let text = format!("{}-{}", dx_number, frame_number);
        let mut content = Content::new();
        content.push_bytes(Eci::Default, text.as_bytes());
        Some(Ok(RowResult {
            format: OneDFormat::DxFilmEdge,
            decoder_result: DecoderResult::new(content),
            range: RowRange { start: 0, end: 1 + MODULE_COUNT },
        }))
    }
}

fn bits_to_value(bits: &[bool]) -> u32 {
    bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_to_value_reads_most_significant_first() {
        assert_eq!(bits_to_value(&[true, false, true]), 0b101);
    }
}
