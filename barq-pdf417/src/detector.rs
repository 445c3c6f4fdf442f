// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locating a PDF417 symbol: scan every pixel row for its left guard (`8:1:1:1:1:1:1:3`, 17
//! modules) and right guard (`7:1:1:3:1:1:1:2:1`, 18 modules), bound the symbol between the
//! topmost and bottommost row where both are found, and sample the interior into an upright
//! module matrix (one bit per module, one row per detected symbol row), the way the Data Matrix
//! detector samples its own finder-located region into a module grid. These guard ratios are the
//! commonly cited PDF417 start/stop widths; nothing in this pack carries the ISO/IEC 15438 text
//! to check them to the module, so treat the boundary this locates as an approximation.

use barq_core::{
    normalized_pattern, sample_grid, unsupported_error, BitMatrix, PatternRow,
    PerspectiveTransform, PointF, Quadrilateral, Result,
};

const START_PATTERN: [u32; 8] = [8, 1, 1, 1, 1, 1, 1, 3];
const START_SUM: u32 = 17;
const STOP_PATTERN: [u32; 9] = [7, 1, 1, 3, 1, 1, 1, 2, 1];
const STOP_SUM: u32 = 18;

/// `(run index the match starts at, pixel x before the match, pixel x after the match)`.
type Match = (usize, u32, u32);

/// Slide an `N`-run window across `row` looking for one whose widths normalize (see
/// `normalized_pattern`) to exactly `pattern`. The window always starts on a bar run, since
/// `PatternRow` begins with a (possibly zero-length) white run at index 0, putting bars at odd
/// indices.
fn find_pattern<const N: usize>(row: &PatternRow, pattern: [u32; N], sum: u32) -> Option<Match> {
    let widths = row.as_slice();
    if widths.len() < N {
        return None;
    }
    let mut x_before = Vec::with_capacity(widths.len() + 1);
    let mut acc = 0u32;
    x_before.push(0u32);
    for &w in widths {
        acc += w as u32;
        x_before.push(acc);
    }
    let mut start = 1usize;
    while start + N <= widths.len() {
        let observed: [u32; N] = std::array::from_fn(|i| widths[start + i] as u32);
        if normalized_pattern(observed, sum) == Some(pattern) {
            return Some((start, x_before[start], x_before[start + N]));
        }
        start += 2;
    }
    None
}

struct RowGuard {
    y: u32,
    left_end: u32,
    right_start: u32,
    module_width: f32,
}

fn scan_guards(image: &BitMatrix) -> Vec<RowGuard> {
    let mut rows = Vec::new();
    for y in 0..image.height() {
        let row = PatternRow::from_bits(image.row_bits(y));
        let Some((_, left_start, left_end)) = find_pattern(&row, START_PATTERN, START_SUM) else {
            continue;
        };
        let Some((_, right_start, _)) = find_pattern(&row, STOP_PATTERN, STOP_SUM) else {
            continue;
        };
        if right_start <= left_end {
            continue;
        }
        let module_width = (left_end - left_start) as f32 / START_SUM as f32;
        if module_width <= 0.0 {
            continue;
        }
        rows.push(RowGuard { y, left_end, right_start, module_width });
    }
    rows
}

/// Group consecutive guard-bearing pixel rows that share roughly the same horizontal bounds into
/// one symbol row each (a tall symbol row spans many pixel rows), returning each cluster's
/// representative (median) pixel row.
fn cluster_rows(guards: &[RowGuard]) -> Vec<&RowGuard> {
    let mut clusters: Vec<Vec<&RowGuard>> = Vec::new();
    for g in guards {
        let joins_last = clusters.last().and_then(|c| c.last()).is_some_and(|last: &&RowGuard| {
            g.y - last.y <= 2 && (g.left_end as i64 - last.left_end as i64).abs() <= last.module_width as i64 + 1
        });
        if joins_last {
            clusters.last_mut().unwrap().push(g);
        }
        else {
            clusters.push(vec![g]);
        }
    }
    clusters.into_iter().map(|c| c[c.len() / 2]).collect()
}

/// Find the symbol in `image`, determine its row/column extent, and sample it into an upright
/// `columns x rows` module matrix (one bit per module) along with the quadrilateral it was
/// sampled from. The returned matrix's columns run left guard-to-right guard inclusive; codeword
/// extraction (stripping the guards, splitting into left-indicator/data/right-indicator columns)
/// happens in `lib.rs` once the module matrix is in hand.
pub fn detect(image: &BitMatrix) -> Result<(BitMatrix, Quadrilateral)> {
    let guards = scan_guards(image);
    if guards.is_empty() {
        return unsupported_error("pdf417: no start/stop guard pattern pair found in any row");
    }
    let rows = cluster_rows(&guards);
    let num_rows = rows.len() as u32;

    let module_width = rows.iter().map(|r| r.module_width).sum::<f32>() / rows.len() as f32;
    let left_x = rows.iter().map(|r| r.left_end).min().unwrap();
    let right_x = rows.iter().map(|r| r.right_start).max().unwrap();
    if right_x <= left_x || module_width <= 0.0 {
        return unsupported_error("pdf417: degenerate guard span");
    }

    let interior_modules = ((right_x - left_x) as f32 / module_width).round().max(1.0) as u32;
    // At minimum one left-indicator, one data, and one right-indicator codeword (17 modules
    // each) sit between the guards.
    let columns_modules = (interior_modules / 17).max(3);
    let top_y = rows.first().unwrap().y;
    let bottom_y = rows.last().unwrap().y;

    let quad = Quadrilateral::new(
        PointF::new(left_x as f32, top_y as f32),
        PointF::new(right_x as f32, top_y as f32),
        PointF::new(right_x as f32, bottom_y as f32 + 1.0),
        PointF::new(left_x as f32, bottom_y as f32 + 1.0),
    );
    let dest = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(columns_modules as f32, 0.0),
        PointF::new(columns_modules as f32, num_rows as f32),
        PointF::new(0.0, num_rows as f32),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(dest, quad);
    let sampled = sample_grid(image, columns_modules, num_rows, &transform)?;
    log::debug!("pdf417: located a {}x{} module region ({} symbol rows)", columns_modules, num_rows, num_rows);
    Ok((sampled, quad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_rows_groups_adjacent_matching_guards_into_one_symbol_row() {
        let guards = vec![
            RowGuard { y: 0, left_end: 10, right_start: 100, module_width: 2.0 },
            RowGuard { y: 1, left_end: 10, right_start: 100, module_width: 2.0 },
            RowGuard { y: 20, left_end: 11, right_start: 101, module_width: 2.0 },
        ];
        let clusters = cluster_rows(&guards);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn find_pattern_locates_a_start_guard_embedded_in_a_row() {
        let mut row = PatternRow::new();
        for w in [20u16, 8, 1, 1, 1, 1, 1, 1, 3, 50] {
            row.push(w);
        }
        let found = find_pattern(&row, START_PATTERN, START_SUM);
        assert!(found.is_some());
    }

    #[test]
    fn detect_reports_unsupported_when_no_guards_are_present() {
        let image = BitMatrix::new(50, 50).unwrap();
        assert!(detect(&image).is_err());
    }
}
