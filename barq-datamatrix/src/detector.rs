// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locates a Data Matrix symbol's solid-L finder pattern (two solid border lines on the left and
//! bottom, an alternating "clock track" on the top and right) and samples it into an upright
//! module matrix. Simplified to symbols presented close to axis-aligned, the way the QR detector's
//! Micro/rMQR stubs and the one-and-two-dimensional oned decoders draw their own scope lines: full
//! arbitrary-perspective correction would need the same alignment-pattern-refinement machinery this
//! crate does not implement for QR either.

use barq_core::{
    format_error, sample_grid, unsupported_error, BitMatrix, Error, PerspectiveTransform, PointF, Quadrilateral, Result,
};

use crate::tables::{size_info, MAX_TABULATED_SIZE};

fn bounding_box(image: &BitMatrix) -> Option<(u32, u32, u32, u32)> {
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    let mut found = false;
    for y in 0..image.height() {
        for x in 0..image.width() {
            if image.get(x, y) {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    if found {
        Some((min_x, min_y, max_x, max_y))
    }
    else {
        None
    }
}

/// Fraction of `image.get(x,y)` being set along a horizontal run from `x0` to `x1` at row `y`.
fn row_solidity(image: &BitMatrix, y: u32, x0: u32, x1: u32) -> f32 {
    let mut count = 0u32;
    for x in x0..=x1 {
        if image.get(x, y) {
            count += 1;
        }
    }
    count as f32 / (x1 - x0 + 1) as f32
}

fn col_solidity(image: &BitMatrix, x: u32, y0: u32, y1: u32) -> f32 {
    let mut count = 0u32;
    for y in y0..=y1 {
        if image.get(x, y) {
            count += 1;
        }
    }
    count as f32 / (y1 - y0 + 1) as f32
}

/// Score each of the bounding box's four corners by how solid its two adjacent edges are, and
/// return the corner index (0=top-left, 1=top-right, 2=bottom-right, 3=bottom-left) most likely to
/// be the solid-L's right-angle vertex.
fn best_solid_corner(image: &BitMatrix, bbox: (u32, u32, u32, u32)) -> usize {
    let (min_x, min_y, max_x, max_y) = bbox;
    let scores = [
        row_solidity(image, min_y, min_x, max_x) + col_solidity(image, min_x, min_y, max_y),
        row_solidity(image, min_y, min_x, max_x) + col_solidity(image, max_x, min_y, max_y),
        row_solidity(image, max_y, min_x, max_x) + col_solidity(image, max_x, min_y, max_y),
        row_solidity(image, max_y, min_x, max_x) + col_solidity(image, min_x, min_y, max_y),
    ];
    scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(3)
}

/// Count black/white transitions along a line, used to recover a side's module count from its
/// clock track (the alternating pattern opposite a solid border).
fn count_transitions_row(image: &BitMatrix, y: u32, x0: u32, x1: u32) -> u32 {
    let mut transitions = 1u32;
    let mut prev = image.get(x0, y);
    for x in (x0 + 1)..=x1 {
        let cur = image.get(x, y);
        if cur != prev {
            transitions += 1;
        }
        prev = cur;
    }
    transitions
}

fn count_transitions_col(image: &BitMatrix, x: u32, y0: u32, y1: u32) -> u32 {
    let mut transitions = 1u32;
    let mut prev = image.get(x, y0);
    for y in (y0 + 1)..=y1 {
        let cur = image.get(x, y);
        if cur != prev {
            transitions += 1;
        }
        prev = cur;
    }
    transitions
}

/// Find the symbol in `image`, determine its size, and sample it into an upright `size x size`
/// module matrix along with the quadrilateral it was sampled from.
pub fn detect(image: &BitMatrix) -> Result<(BitMatrix, Quadrilateral)> {
    let bbox = bounding_box(image).ok_or_else(|| Error::format("datamatrix: no dark modules found"))?;
    let (min_x, min_y, max_x, max_y) = bbox;
    if max_x <= min_x || max_y <= min_y {
        return format_error("datamatrix: bounding box degenerate");
    }

    let corner = best_solid_corner(image, bbox);
    // The solid edges meet at `corner`; the clock track runs along the two far sides.
    let (clock_row, clock_col) = match corner {
        0 => (max_y, max_x), // solid top+left, clock bottom+right
        1 => (max_y, min_x), // solid top+right, clock bottom+left
        2 => (min_y, min_x), // solid bottom+right, clock top+left
        _ => (min_y, max_x), // solid bottom+left, clock top+right
    };

    let cols = (count_transitions_row(image, clock_row, min_x, max_x) + 1) / 2 + 1;
    let rows = (count_transitions_col(image, clock_col, min_y, max_y) + 1) / 2 + 1;

    if cols != rows {
        return unsupported_error("datamatrix: only square symbols are decoded");
    }
    let size = cols;
    if size > MAX_TABULATED_SIZE {
        return unsupported_error("datamatrix: symbol size beyond the tabulated single-region range");
    }
    if size_info(size).is_none() {
        return format_error("datamatrix: bounding box doesn't match any tabulated symbol size");
    }
    log::debug!("datamatrix: solid corner {} estimated size {}x{}", corner, size, size);

    let quad = Quadrilateral::new(
        PointF::new(min_x as f32, min_y as f32),
        PointF::new(max_x as f32 + 1.0, min_y as f32),
        PointF::new(max_x as f32 + 1.0, max_y as f32 + 1.0),
        PointF::new(min_x as f32, max_y as f32 + 1.0),
    );
    let dest = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(size as f32, 0.0),
        PointF::new(size as f32, size as f32),
        PointF::new(0.0, size as f32),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(dest, quad);
    let sampled = sample_grid(image, size, size, &transform)?;
    Ok((sampled, quad))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_symbol(size: u32) -> BitMatrix {
        let scale = 4u32;
        let mut m = BitMatrix::new(size * scale, size * scale).unwrap();
        for row in 0..size {
            for col in 0..size {
                // Solid border on the left column and bottom row; alternating clock track on the
                // top row and right column; empty interior (the placement bits don't matter here).
                let set = col == 0 || row == size - 1 || (row == 0 && col % 2 == 0) || (col == size - 1 && row % 2 == 0);
                if set {
                    for dy in 0..scale {
                        for dx in 0..scale {
                            m.set(col * scale + dx, row * scale + dy);
                        }
                    }
                }
            }
        }
        m
    }

    #[test]
    fn finds_bounding_box_of_synthetic_symbol() {
        let image = draw_symbol(12);
        let bbox = bounding_box(&image).unwrap();
        assert_eq!(bbox, (0, 0, 47, 47));
    }
}
