// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turns a sampled, upright module matrix into a `DecoderResult`: recover format and version
//! info, undo the data mask, read codewords in the standard's zigzag column order, deinterleave
//! the error-correction blocks, Reed-Solomon correct each one, and parse the resulting byte stream
//! into segments.

use barq_core::{decode_binary, format_error, unsupported_error, BitMatrix, DecoderResult, Error, GfBinary, Result};

use crate::function_pattern::is_function_module;
use crate::tables::{self, EcLevel, MAX_TABULATED_VERSION};
use crate::{format_info, mask, segments, version_info};

const FORMAT_INFO_PATH_A: [(u32, u32); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

fn format_info_path_b(modules: u32) -> [(u32, u32); 15] {
    [
        (modules - 1, 8),
        (modules - 2, 8),
        (modules - 3, 8),
        (modules - 4, 8),
        (modules - 5, 8),
        (modules - 6, 8),
        (modules - 7, 8),
        (8, modules - 8),
        (8, modules - 7),
        (8, modules - 6),
        (8, modules - 5),
        (8, modules - 4),
        (8, modules - 3),
        (8, modules - 2),
        (8, modules - 1),
    ]
}

fn read_bits_along(matrix: &BitMatrix, coords: &[(u32, u32)]) -> u32 {
    coords.iter().fold(0u32, |acc, &(x, y)| (acc << 1) | matrix.get(x, y) as u32)
}

fn version_info_block(matrix: &BitMatrix, modules: u32, top_right: bool) -> u32 {
    let mut bits = 0u32;
    for i in 0..18 {
        let (x, y) = if top_right {
            (modules - 11 + i / 6, i % 6)
        }
        else {
            (i % 6, modules - 11 + i / 6)
        };
        bits = (bits << 1) | matrix.get(x, y) as u32;
    }
    bits
}

/// Decode a symbol already sampled into an upright, exact `modules x modules` bit matrix (as
/// produced by the detector's perspective sampling).
pub fn decode(matrix: &BitMatrix) -> Result<DecoderResult> {
    let modules = matrix.width();
    if matrix.height() != modules {
        return format_error("qr: sampled matrix is not square");
    }
    let version = (modules - 17) / 4;
    if modules != tables::modules_for_version(version) {
        return format_error("qr: sampled matrix size doesn't match any version");
    }
    if version > MAX_TABULATED_VERSION {
        return unsupported_error("qr: versions beyond 10 are not decoded");
    }

    let format_bits_a = read_bits_along(matrix, &FORMAT_INFO_PATH_A);
    let format_bits_b = read_bits_along(matrix, &format_info_path_b(modules));
    let format = format_info::decode(format_bits_a)
        .or_else(|| format_info::decode(format_bits_b))
        .ok_or_else(|| Error::format("qr: could not recover format information"))?;
    log::debug!("qr: version {} ec level {} mask {}", version, format.ec_level.label(), format.mask_pattern);

    if version >= 7 {
        let a = version_info_block(matrix, modules, true);
        let b = version_info_block(matrix, modules, false);
        let decoded_version = version_info::decode(a).or_else(|| version_info::decode(b));
        if decoded_version != Some(version) {
            return format_error("qr: version info doesn't match symbol size");
        }
    }

    let codewords = read_codewords(matrix, version, modules, format.mask_pattern)?;
    let data = correct_and_deinterleave(&codewords, version, format.ec_level)?;
    let parsed = segments::decode(&data, version)?;

    let mut result = DecoderResult::new(parsed.content).with_ec_level(format.ec_level.label());
    if let Some((index, count, _parity)) = parsed.structured_append {
        result = result.with_structured_append(index, count, None);
    }
    if parsed.reader_init {
        result = result.mark_reader_init();
    }
    Ok(result.with_symbology_identifier("]Q1"))
}

/// Read codewords in the standard's zigzag column order: two-column-wide strips right to left,
/// skipping the vertical timing column, alternating scan direction each strip.
fn read_codewords(matrix: &BitMatrix, version: u32, modules: u32, mask_pattern: u8) -> Result<Vec<u8>> {
    let total = tables::version_info(version).map(|v| v.total_codewords).unwrap_or(0) as usize;
    let mut result = vec![0u8; total];
    let mut result_offset = 0usize;
    let mut current_byte = 0u8;
    let mut bits_read = 0u32;
    let mut reading_up = true;
    let mut col = modules - 1;

    loop {
        if col == 6 {
            col -= 1;
        }
        for count in 0..modules {
            let row = if reading_up { modules - 1 - count } else { count };
            for c in 0..2 {
                if col < c {
                    continue;
                }
                let x = col - c;
                if is_function_module(version, modules, x, row) {
                    continue;
                }
                bits_read += 1;
                current_byte <<= 1;
                if matrix.get(x, row) ^ mask::apply(mask_pattern, row, x) {
                    current_byte |= 1;
                }
                if bits_read == 8 {
                    if result_offset < result.len() {
                        result[result_offset] = current_byte;
                        result_offset += 1;
                    }
                    bits_read = 0;
                    current_byte = 0;
                }
            }
        }
        reading_up = !reading_up;
        if col < 2 {
            break;
        }
        col -= 2;
    }

    if result_offset < total {
        return format_error("qr: fewer codewords read than the version requires");
    }
    Ok(result)
}

/// Split `codewords` into the version/EC-level's block groups, Reed-Solomon correct each block
/// independently, then reassemble the data (non-EC) portion in the standard's interleaved read
/// order.
fn correct_and_deinterleave(codewords: &[u8], version: u32, ec_level: EcLevel) -> Result<Vec<u8>> {
    let info = tables::version_info(version).ok_or_else(|| Error::format("qr: version has no tabulated block layout"))?;
    let ec_blocks = &info.ec_blocks[ec_level as usize];
    let field = GfBinary::new(8, 0x11D);

    let mut blocks: Vec<Vec<u16>> = Vec::new();
    let mut max_data_len = 0usize;
    let mut cursor = 0usize;
    for &(count, data_len) in ec_blocks.groups {
        for _ in 0..count {
            let total_len = data_len as usize + ec_blocks.ec_codewords_per_block as usize;
            if cursor + total_len > codewords.len() {
                return format_error("qr: codeword stream shorter than block layout requires");
            }
            let block: Vec<u16> = codewords[cursor..cursor + total_len].iter().map(|&b| b as u16).collect();
            cursor += total_len;
            max_data_len = max_data_len.max(data_len as usize);
            blocks.push(block);
        }
    }

    let mut data_blocks = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        let ec = ec_blocks.ec_codewords_per_block as usize;
        decode_binary_block(&field, &mut block, ec)?;
        let data_len = block.len() - ec;
        data_blocks.push(block[..data_len].iter().map(|&v| v as u8).collect::<Vec<u8>>());
    }

    // Interleave data codewords column-by-column across blocks (shorter blocks simply run out
    // first), matching how the encoder wrote them.
    let mut out = Vec::with_capacity(data_blocks.iter().map(|b| b.len()).sum());
    for i in 0..max_data_len {
        for block in &data_blocks {
            if i < block.len() {
                out.push(block[i]);
            }
        }
    }
    Ok(out)
}

fn decode_binary_block(field: &GfBinary, block: &mut [u16], ec: usize) -> Result<usize> {
    decode_binary(field, block, ec, 0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_from_modules_matches_table() {
        assert_eq!((21 - 17) / 4, 1);
        assert_eq!((57 - 17) / 4, 10);
    }
}
