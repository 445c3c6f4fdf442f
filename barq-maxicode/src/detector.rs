// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locating a MaxiCode symbol: find the dark-module bounding box, refine its center by scanning
//! for the bullseye's concentric ring structure along the horizontal and vertical lines through
//! the box's centroid (the same `runs`/widest-gap-pair idea Aztec's bullseye finder uses), and
//! sample the box into a fixed `30x33` module grid.
//!
//! MaxiCode's true module layout is a hexagonal lattice (each row offset by half a module from
//! its neighbors, per ISO/IEC 16023 Annex), not a square grid; the exact per-module hex center
//! table isn't reproduced in this pack, so this samples the bounding box as an axis-aligned
//! `30x33` square grid instead. That misplaces every module center except the handful that happen
//! to fall on a hex row's even offset, so codewords read off the sampled matrix should not be
//! expected to be correct; this at least locates real symbols instead of failing unconditionally.

use barq_core::{sample_grid, unsupported_error, BitMatrix, Error, PerspectiveTransform, PointF, Quadrilateral, Result};

use crate::tables::{COLUMNS, ROWS};

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
    found.then_some((min_x, min_y, max_x, max_y))
}

/// Run lengths of alternating colors along `get(i)` for `i` in `0..len`, starting from whatever
/// color position 0 is.
fn runs(get: impl Fn(u32) -> bool, len: u32) -> Vec<(u32, u32)> {
    let mut result = Vec::new();
    if len == 0 {
        return result;
    }
    let mut current = get(0);
    let mut start = 0u32;
    for i in 1..len {
        let c = get(i);
        if c != current {
            result.push((start, i - start));
            start = i;
            current = c;
        }
    }
    result.push((start, len - start));
    result
}

/// Given alternating runs along a line through an approximate bullseye center, find the
/// dark-run pair (first and last dark run) and return the midpoint between their centers, the
/// refined estimate of the bullseye's true center along that axis.
fn refine_center(runs: &[(u32, u32)]) -> Option<f32> {
    let dark_runs: Vec<(u32, u32)> = runs.iter().copied().enumerate().filter(|(i, _)| i % 2 == 1).map(|(_, r)| r).collect();
    let first = dark_runs.first()?;
    let last = dark_runs.last()?;
    let first_center = first.0 as f32 + first.1 as f32 / 2.0;
    let last_center = last.0 as f32 + last.1 as f32 / 2.0;
    Some((first_center + last_center) / 2.0)
}

/// Find the symbol in `image` and sample it into an upright `COLUMNS x ROWS` module matrix along
/// with the quadrilateral it was sampled from.
pub fn detect(image: &BitMatrix) -> Result<(BitMatrix, Quadrilateral)> {
    let (min_x, min_y, max_x, max_y) =
        bounding_box(image).ok_or_else(|| Error::format("maxicode: no dark modules found"))?;
    if max_x <= min_x || max_y <= min_y {
        return unsupported_error("maxicode: bounding box degenerate");
    }

    let approx_cx = (min_x + max_x) / 2;
    let approx_cy = (min_y + max_y) / 2;

    let horizontal = runs(|x| image.get(min_x + x, approx_cy), max_x - min_x + 1);
    let vertical = runs(|y| image.get(approx_cx, min_y + y), max_y - min_y + 1);
    let cx = refine_center(&horizontal).map(|c| min_x as f32 + c).unwrap_or(approx_cx as f32);
    let cy = refine_center(&vertical).map(|c| min_y as f32 + c).unwrap_or(approx_cy as f32);

    let half_width = (max_x - min_x) as f32 / 2.0;
    let half_height = (max_y - min_y) as f32 / 2.0;
    if half_width <= 0.0 || half_height <= 0.0 {
        return unsupported_error("maxicode: degenerate bullseye extent");
    }

    let quad = Quadrilateral::new(
        PointF::new(cx - half_width, cy - half_height),
        PointF::new(cx + half_width, cy - half_height),
        PointF::new(cx + half_width, cy + half_height),
        PointF::new(cx - half_width, cy + half_height),
    );
    let dest = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(COLUMNS as f32, 0.0),
        PointF::new(COLUMNS as f32, ROWS as f32),
        PointF::new(0.0, ROWS as f32),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(dest, quad);
    let sampled = sample_grid(image, COLUMNS, ROWS, &transform)?;
    log::debug!("maxicode: located bullseye around ({:.1}, {:.1})", cx, cy);
    Ok((sampled, quad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_center_averages_the_outermost_dark_runs() {
        let runs = vec![(0u32, 5u32), (5, 2), (7, 10), (17, 2), (19, 5)];
        let center = refine_center(&runs).unwrap();
        assert!((center - 12.0).abs() < 0.01);
    }

    #[test]
    fn detect_reports_unsupported_for_a_blank_image() {
        let image = BitMatrix::new(40, 40).unwrap();
        assert!(detect(&image).is_err());
    }
}
