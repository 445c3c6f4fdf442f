// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locates the three finder patterns (the nested-square targets in three of a QR symbol's
//! corners): a horizontal run-length scan for the characteristic 1:1:3:1:1 black/white ratio,
//! confirmed by a vertical cross-check through the same column, then merged across rows into a
//! handful of confident centers.

use barq_core::{BitMatrix, PointF};

#[derive(Debug, Clone, Copy)]
pub struct FinderPattern {
    pub center: PointF,
    pub module_size: f32,
    pub count: u32,
}

/// Row run-lengths, alternating white-first the way `PatternRow` does for 1D scans.
fn row_runs(image: &BitMatrix, y: u32) -> Vec<u32> {
    let mut runs = Vec::new();
    let mut current = 0u32;
    let mut last = false;
    for x in 0..image.width() {
        let bit = image.get(x, y);
        if x == 0 {
            last = bit;
        }
        if bit == last {
            current += 1;
        }
        else {
            runs.push(current);
            current = 1;
            last = bit;
        }
    }
    runs.push(current);
    runs
}

fn col_runs(image: &BitMatrix, x: u32) -> Vec<u32> {
    let mut runs = Vec::new();
    let mut current = 0u32;
    let mut last = false;
    for y in 0..image.height() {
        let bit = image.get(x, y);
        if y == 0 {
            last = bit;
        }
        if bit == last {
            current += 1;
        }
        else {
            runs.push(current);
            current = 1;
            last = bit;
        }
    }
    runs.push(current);
    runs
}

/// `runs` must be five consecutive runs starting on a black run (black-white-black-white-black);
/// checks the 1:1:3:1:1 module ratio within 50% tolerance per unit.
fn matches_finder_ratio(runs: &[u32; 5]) -> bool {
    let total: u32 = runs.iter().sum();
    if total < 7 {
        return false;
    }
    let unit = total as f32 / 7.0;
    let check = |actual: u32, count: f32| (actual as f32 - unit * count).abs() <= unit * count * 0.5 + 1.0;
    check(runs[0], 1.0) && check(runs[1], 1.0) && check(runs[2], 3.0) && check(runs[3], 1.0) && check(runs[4], 1.0)
}

/// Slide a 5-run window over `runs`, stepping two at a time so the window always starts on a black
/// run (alternation means every other run is black), returning each match's center offset and
/// estimated module size.
fn scan_line_for_center(runs: &[u32], start_black: bool) -> Vec<(f32, f32)> {
    let mut results = Vec::new();
    let mut cumulative = vec![0u32; runs.len() + 1];
    for (idx, &r) in runs.iter().enumerate() {
        cumulative[idx + 1] = cumulative[idx] + r;
    }
    let mut i = if start_black { 0 } else { 1 };
    while i + 5 <= runs.len() {
        let window: [u32; 5] = std::array::from_fn(|k| runs[i + k]);
        if matches_finder_ratio(&window) {
            let start = cumulative[i];
            let center = start as f32 + window[0] as f32 + window[1] as f32 + window[2] as f32 / 2.0;
            let module_size = window.iter().sum::<u32>() as f32 / 7.0;
            results.push((center, module_size));
        }
        i += 2;
    }
    results
}

fn combine_candidates(mut candidates: Vec<FinderPattern>) -> Vec<FinderPattern> {
    let mut merged: Vec<FinderPattern> = Vec::new();
    candidates.sort_by(|a, b| a.center.x.partial_cmp(&b.center.x).unwrap());
    'outer: for candidate in candidates {
        for existing in merged.iter_mut() {
            let dist = existing.center.distance(candidate.center);
            let threshold = (existing.module_size + candidate.module_size) / 2.0 * 1.5;
            if dist < threshold.max(2.0) {
                let total = (existing.count + candidate.count) as f32;
                let w_existing = existing.count as f32 / total;
                let w_candidate = candidate.count as f32 / total;
                existing.center = PointF::new(
                    existing.center.x * w_existing + candidate.center.x * w_candidate,
                    existing.center.y * w_existing + candidate.center.y * w_candidate,
                );
                existing.module_size = existing.module_size * w_existing + candidate.module_size * w_candidate;
                existing.count += candidate.count;
                continue 'outer;
            }
        }
        merged.push(candidate);
    }
    merged
}

/// Scan every row for finder-ratio hits, cross-check each with a vertical scan through its
/// candidate column, and merge the resulting per-row estimates into a small set of confident
/// finder pattern centers (retaining only those confirmed by more than one row).
pub fn find_finder_patterns(image: &BitMatrix) -> Vec<FinderPattern> {
    let mut raw = Vec::new();
    for y in 0..image.height() {
        let runs = row_runs(image, y);
        let start_black = image.get(0, y);
        for (cx, module_size) in scan_line_for_center(&runs, start_black) {
            if module_size <= 0.0 || cx < 0.0 || cx as u32 >= image.width() {
                continue;
            }
            let col_runs = col_runs(image, cx as u32);
            let start_black_col = image.get(cx as u32, 0);
            let mut best_cy = None;
            for (cy, col_module) in scan_line_for_center(&col_runs, start_black_col) {
                if (cy - y as f32).abs() <= module_size * 4.0 {
                    best_cy = Some((cy, col_module));
                    break;
                }
            }
            if let Some((cy, col_module)) = best_cy {
                raw.push(FinderPattern {
                    center: PointF::new(cx, cy),
                    module_size: (module_size + col_module) / 2.0,
                    count: 1,
                });
            }
        }
    }
    combine_candidates(raw).into_iter().filter(|p| p.count >= 2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use barq_core::BitMatrix;

    fn draw_finder(m: &mut BitMatrix, cx: u32, cy: u32, module: u32) {
        // Nested squares: 7x7 outer black ring, 5x5 white, 3x3 black center, matching the 1:1:3:1:1
        // cross-section ratio along any line through the center.
        for dy in 0..7 * module {
            for dx in 0..7 * module {
                let x = cx + dx;
                let y = cy + dy;
                if x >= m.width() || y >= m.height() {
                    continue;
                }
                let ring = |v: u32| (v / module) as i32;
                let rx = ring(dx);
                let ry = ring(dy);
                let is_outer_ring = rx == 0 || rx == 6 || ry == 0 || ry == 6;
                let is_center = (2..=4).contains(&rx) && (2..=4).contains(&ry);
                if is_outer_ring || is_center {
                    m.set(x, y);
                }
            }
        }
    }

    #[test]
    fn finds_a_synthetic_finder_pattern() {
        let mut m = BitMatrix::new(60, 60).unwrap();
        draw_finder(&mut m, 5, 5, 3);
        let patterns = find_finder_patterns(&m);
        assert!(!patterns.is_empty(), "expected at least one finder pattern candidate");
    }
}
