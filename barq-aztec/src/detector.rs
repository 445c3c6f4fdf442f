// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locates the bullseye (the concentric alternating-ring finder pattern at a Compact Aztec
//! symbol's center) and samples the mode-message ring around it. Unlike Data Matrix's solid-L
//! border, Aztec has no fixed corner to anchor on, so the search is a run-length scan for the
//! bullseye's nine equal-width alternating runs, assuming the symbol is close to axis-aligned
//! (no rotation/perspective correction beyond the ring's own scale).

use barq_core::{format_error, BitMatrix, PerspectiveTransform, PointF, Quadrilateral, Result};

use crate::mode_message::{decode_compact, decode_full, ModeMessage};
use crate::tables::{symbol_size, symbol_size_full};

/// Center (in image pixel coordinates) and estimated module size of a candidate bullseye.
struct Bullseye {
    center: PointF,
    module_size: f32,
}

/// A run of same-colored pixels, as `(start, length)` along a scanned line.
fn runs(get: impl Fn(u32) -> bool, len: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let mut start = 0u32;
    let mut current = get(0);
    for i in 1..len {
        let v = get(i);
        if v != current {
            out.push((start, i - start));
            start = i;
            current = v;
        }
    }
    out.push((start, len - start));
    out
}

/// Nine consecutive runs of roughly equal width, alternating color, centered on `center_run`.
fn equal_width_center(runs: &[(u32, u32)]) -> Option<f32> {
    if runs.len() < 9 {
        return None;
    }
    for window in runs.windows(9) {
        let widths: Vec<f32> = window.iter().map(|&(_, w)| w as f32).collect();
        let avg = widths.iter().sum::<f32>() / widths.len() as f32;
        if avg < 1.0 {
            continue;
        }
        let within_tolerance = widths.iter().all(|&w| (w - avg).abs() <= avg * 0.6);
        if within_tolerance {
            let (start, _) = window[4];
            let (last_start, last_len) = window[8];
            let mid = (start as f32 + (last_start + last_len) as f32) / 2.0;
            return Some(mid);
        }
    }
    None
}

fn find_bullseye(image: &BitMatrix) -> Result<Bullseye> {
    let width = image.width();
    let height = image.height();

    // Scan a handful of candidate rows for the nine-run alternating bullseye cross-section, then
    // confirm with a column scan through the candidate's x to recover y and an averaged module
    // size.
    for row in (height / 4..(height * 3 / 4).max(height / 4 + 1)).step_by(((height / 16).max(1)) as usize) {
        let row_runs = runs(|x| image.get(x, row), width);
        if let Some(cx) = equal_width_center(&row_runs) {
            let col_runs = runs(|y| image.get(cx as u32, y), height);
            if let Some(cy) = equal_width_center(&col_runs) {
                let module_size = (width as f32 / 20.0).max(1.0);
                return Ok(Bullseye { center: PointF::new(cx, cy), module_size });
            }
        }
    }
    format_error("aztec: could not locate a bullseye finder pattern")
}

/// Sample an `S x S` module grid centered on `center`, `module_size` pixels per module.
fn sample_centered(image: &BitMatrix, center: PointF, module_size: f32, modules: u32) -> Result<BitMatrix> {
    let half = modules as f32 * module_size / 2.0;
    let quad = Quadrilateral::new(
        PointF::new(center.x - half, center.y - half),
        PointF::new(center.x + half, center.y - half),
        PointF::new(center.x + half, center.y + half),
        PointF::new(center.x - half, center.y + half),
    );
    let dest = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(modules as f32, 0.0),
        PointF::new(modules as f32, modules as f32),
        PointF::new(0.0, modules as f32),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(dest, quad);
    barq_core::sample_grid(image, modules, modules, &transform)
}

/// The 11x11 core (9x9 bullseye plus its single mode-message ring) a Compact symbol's mode
/// message is read from.
const CORE_MODULES: u32 = 11;

/// The 15x15 core a Full-range symbol's (larger, 40-bit) mode message is read from: two rings
/// wider than Compact's to leave room for the bigger layer-count and codeword-count fields.
const CORE_MODULES_FULL: u32 = 15;

/// Read `bits_per_side` bits from the middle of each side of `core`'s outermost ring, clockwise
/// from the top-left, generalizing the placement `read_mode_bits` used for Compact's fixed
/// `(11, 7)` core/bits-per-side pair to any odd core size and any (possibly even) bits-per-side
/// count.
fn read_mode_ring(core: &BitMatrix, bits_per_side: u32) -> u64 {
    let core_modules = core.width();
    let last = core_modules - 1;
    let c = core_modules as i32 / 2;
    let start = c - bits_per_side as i32 / 2;
    let end = start + bits_per_side as i32 - 1;

    let mut bits = 0u64;
    for col in start..=end {
        bits = (bits << 1) | core.get(col as u32, 0) as u64;
    }
    for row in start..=end {
        bits = (bits << 1) | core.get(last, row as u32) as u64;
    }
    for col in (start..=end).rev() {
        bits = (bits << 1) | core.get(col as u32, last) as u64;
    }
    for row in (start..=end).rev() {
        bits = (bits << 1) | core.get(0, row as u32) as u64;
    }
    bits
}

/// A located, mode-message-decoded Aztec symbol (Compact or Full-range), ready for data
/// extraction.
pub struct Located {
    pub full: BitMatrix,
    pub quad: Quadrilateral,
    pub mode: ModeMessage,
}

fn quad_around(center: PointF, module_size: f32, size: u32) -> Quadrilateral {
    let half = size as f32 * module_size / 2.0;
    Quadrilateral::new(
        PointF::new(center.x - half, center.y - half),
        PointF::new(center.x + half, center.y - half),
        PointF::new(center.x + half, center.y + half),
        PointF::new(center.x - half, center.y + half),
    )
}

pub fn detect(image: &BitMatrix) -> Result<Located> {
    let bullseye = find_bullseye(image)?;

    let compact_core = sample_centered(image, bullseye.center, bullseye.module_size, CORE_MODULES)?;
    let compact_bits = read_mode_ring(&compact_core, 7) as u32;
    let mode = match decode_compact(compact_bits) {
        Ok(mode) => mode,
        Err(_) => {
            let full_core = sample_centered(image, bullseye.center, bullseye.module_size, CORE_MODULES_FULL)?;
            let full_bits = read_mode_ring(&full_core, 10);
            decode_full(full_bits)?
        }
    };

    let size = if mode.is_full { symbol_size_full(mode.layers) } else { symbol_size(mode.layers) };
    let full = sample_centered(image, bullseye.center, bullseye.module_size, size)?;
    let quad = quad_around(bullseye.center, bullseye.module_size, size);
    Ok(Located { full, quad, mode })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_bullseye(size: u32) -> BitMatrix {
        let mut m = BitMatrix::new(size, size).unwrap();
        let c = size as i32 / 2;
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                let ring = (x - c).abs().max((y - c).abs());
                if ring <= 4 && ring % 2 == 0 {
                    m.set(x as u32, y as u32);
                }
            }
        }
        m
    }

    #[test]
    fn locates_a_synthetic_bullseye_near_the_image_center() {
        let image = draw_bullseye(60);
        let bullseye = find_bullseye(&image).unwrap();
        assert!((bullseye.center.x - 30.0).abs() < 3.0);
        assert!((bullseye.center.y - 30.0).abs() < 3.0);
    }
}
