// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rectangular Micro QR (rMQR, ISO/IEC 23941): a rectangular-symbol sibling of QR with its own
//! version/size table, a full finder pattern at the top-left and a smaller corner alignment
//! pattern at the bottom-right instead of QR's three full finders.
//!
//! rMQR's own format-information encoding and the full 32-entry height/width version table
//! weren't pinned down with confidence in this pass, so this decoder approximates both: it tries a
//! small representative subset of the standard's height/width combinations (not the full table)
//! anchored on the single top-left finder this crate's detector can already find, and it recovers
//! format information by reusing Micro QR's BCH(15,5)/`MICRO_MASK` mechanism and bit-stream grammar
//! (`segments::decode`) rather than rMQR's own (unconfirmed) equivalents. Treat decoded payloads as
//! unverified even once a symbol locates and error-corrects cleanly.

use barq_core::{decode_binary, format_error, sample_grid, BitMatrix, DecoderResult, Error, GfBinary, PerspectiveTransform, PointF, Quadrilateral, Result};

use crate::finder::find_finder_patterns;
use crate::format_info::{recover_data, MICRO_MASK};
use crate::mask;
use crate::segments;

/// `(height, width)` in modules, a representative subset of ISO/IEC 23941's height/width version
/// table rather than its full 32 entries.
const SIZES: &[(u32, u32)] = &[
    (7, 43),
    (7, 59),
    (7, 77),
    (9, 43),
    (9, 59),
    (9, 77),
    (11, 43),
    (11, 59),
    (11, 77),
    (13, 43),
    (13, 59),
    (13, 77),
    (15, 43),
    (15, 59),
    (15, 77),
    (17, 43),
    (17, 59),
    (17, 77),
];

#[derive(Debug, Clone, Copy)]
enum EcLevel {
    M,
    H,
}

impl EcLevel {
    fn label(self) -> &'static str {
        match self {
            EcLevel::M => "M",
            EcLevel::H => "H",
        }
    }

    fn fraction(self) -> f32 {
        match self {
            EcLevel::M => 0.3,
            EcLevel::H => 0.5,
        }
    }
}

const FORMAT_INFO_PATH: [(u32, u32); 15] =
    [(8, 0), (8, 1), (8, 2), (8, 3), (8, 4), (8, 5), (8, 6), (8, 7), (7, 8), (6, 8), (5, 8), (4, 8), (3, 8), (2, 8), (1, 8)];

/// `true` for modules reserved by the top-left finder block, the timing tracks, the bottom-right
/// corner alignment pattern (approximated as a fixed 5x5 block), or the format info path.
fn is_function_module(height: u32, width: u32, x: u32, y: u32) -> bool {
    if x < 9 && y < 9 {
        return true;
    }
    if x == 0 || y == 0 {
        return true;
    }
    if x + 5 >= width && y + 5 >= height {
        return true;
    }
    FORMAT_INFO_PATH.contains(&(x, y))
}

fn sample_anchored(image: &BitMatrix, corner: PointF, module_size: f32, width: u32, height: u32) -> Result<(BitMatrix, Quadrilateral)> {
    let w = width as f32 * module_size;
    let h = height as f32 * module_size;
    let quad = Quadrilateral::new(
        corner,
        PointF::new(corner.x + w, corner.y),
        PointF::new(corner.x + w, corner.y + h),
        PointF::new(corner.x, corner.y + h),
    );
    let dest = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(width as f32, 0.0),
        PointF::new(width as f32, height as f32),
        PointF::new(0.0, height as f32),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(dest, quad);
    Ok((sample_grid(image, width, height, &transform)?, quad))
}

fn read_codewords(matrix: &BitMatrix, width: u32, height: u32, mask_pattern: u8, total_codewords: usize) -> Vec<u8> {
    let mut result = vec![0u8; total_codewords];
    let mut result_offset = 0usize;
    let mut current_byte = 0u8;
    let mut bits_read = 0u32;
    let mut reading_up = true;
    let mut col = width - 1;

    loop {
        for count in 0..height {
            let row = if reading_up { height - 1 - count } else { count };
            for c in 0..2 {
                if col < c {
                    continue;
                }
                let x = col - c;
                if x == 0 || is_function_module(height, width, x, row) {
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
    if bits_read > 0 && result_offset < result.len() {
        current_byte <<= 8 - bits_read;
        result[result_offset] = current_byte;
    }
    result
}

struct Candidate {
    width: u32,
    height: u32,
    ec_level: EcLevel,
    mask_pattern: u8,
    matrix: BitMatrix,
    quad: Quadrilateral,
}

fn locate(image: &BitMatrix) -> Result<Candidate> {
    let mut patterns = find_finder_patterns(image);
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    let finder = patterns.into_iter().next().ok_or_else(|| Error::format("rmqr: no finder pattern found"))?;
    let corner = PointF::new(finder.center.x - 3.5 * finder.module_size, finder.center.y - 3.5 * finder.module_size);

    for &(height, width) in SIZES {
        let (matrix, quad) = match sample_anchored(image, corner, finder.module_size, width, height) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let format_bits = FORMAT_INFO_PATH.iter().fold(0u32, |acc, &(x, y)| (acc << 1) | matrix.get(x, y) as u32);
        let Some(data) = recover_data(format_bits, MICRO_MASK)
        else {
            continue;
        };
        let ec_level = if data & 0b100 != 0 { EcLevel::H } else { EcLevel::M };
        let mask_pattern = (data & 0b11) as u8;
        return Ok(Candidate { width, height, ec_level, mask_pattern, matrix, quad });
    }
    format_error("rmqr: no candidate size recovered consistent format information")
}

pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    let candidate = locate(image)?;
    log::debug!(
        "rmqr: located a {}x{} symbol, ec level {}, mask {}",
        candidate.width,
        candidate.height,
        candidate.ec_level.label(),
        candidate.mask_pattern
    );

    let function_modules: usize = (0..candidate.height)
        .flat_map(|y| (0..candidate.width).map(move |x| (x, y)))
        .filter(|&(x, y)| x == 0 || is_function_module(candidate.height, candidate.width, x, y))
        .count();
    let capacity_bits = (candidate.width * candidate.height) as usize - function_modules;
    let total_codewords = capacity_bits / 8;
    if total_codewords < 2 {
        return barq_core::unsupported_error("rmqr: symbol too small to carry any data codewords");
    }
    let ec_codewords = ((total_codewords as f32 * candidate.ec_level.fraction()).round() as usize).clamp(1, total_codewords - 1);
    let data_codewords = total_codewords - ec_codewords;

    let codewords = read_codewords(&candidate.matrix, candidate.width, candidate.height, candidate.mask_pattern, total_codewords);
    let field = GfBinary::new(8, 0x11D);
    let mut work: Vec<u16> = codewords.iter().map(|&b| b as u16).collect();
    decode_binary(&field, &mut work, ec_codewords, 0, 1)?;

    let parsed = segments::decode(&work[..data_codewords].iter().map(|&w| w as u8).collect::<Vec<u8>>(), 1)?;
    let mut result = DecoderResult::new(parsed.content).with_ec_level(candidate.ec_level.label());
    if let Some((index, count, _parity)) = parsed.structured_append {
        result = result.with_structured_append(index, count, None);
    }
    Ok((result, candidate.quad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_table_entries_are_all_within_rmqr_bounds() {
        for &(height, width) in SIZES {
            assert!((7..=17).contains(&height));
            assert!((27..=139).contains(&width));
        }
    }

    #[test]
    fn finder_and_corner_blocks_are_function_modules() {
        assert!(is_function_module(11, 43, 0, 0));
        assert!(is_function_module(11, 43, 42, 10));
        assert!(!is_function_module(11, 43, 20, 5));
    }
}
