// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifies which modules of a sampled symbol matrix are function patterns (finder patterns and
//! their separators, timing patterns, alignment patterns, format/version info, and the single
//! fixed dark module) rather than data, so the zigzag codeword reader can skip them.

/// Alignment pattern center coordinates for versions 2-10 (ISO/IEC 18004 Annex E); version 1 has
/// none.
fn alignment_centers(version: u32) -> &'static [u32] {
    match version {
        2 => &[6, 18],
        3 => &[6, 22],
        4 => &[6, 26],
        5 => &[6, 30],
        6 => &[6, 34],
        7 => &[6, 22, 38],
        8 => &[6, 24, 42],
        9 => &[6, 26, 46],
        10 => &[6, 28, 50],
        _ => &[],
    }
}

fn in_finder_block(modules: u32, x: u32, y: u32) -> bool {
    let in_top_left = x < 9 && y < 9;
    let in_top_right = x >= modules - 8 && y < 9;
    let in_bottom_left = x < 9 && y >= modules - 8;
    in_top_left || in_top_right || in_bottom_left
}

fn in_alignment_pattern(version: u32, x: u32, y: u32) -> bool {
    let centers = alignment_centers(version);
    let modules = super::tables::modules_for_version(version);
    for &cy in centers {
        for &cx in centers {
            // Alignment patterns overlapping a finder pattern's 9x9 reserved block don't exist.
            if in_finder_block(modules, cx, cy) {
                continue;
            }
            if x.abs_diff(cx) <= 2 && y.abs_diff(cy) <= 2 {
                return true;
            }
        }
    }
    false
}

/// Returns `true` if `(x, y)` is reserved for a function pattern rather than data/error-correction
/// bits, for a symbol of the given `version` and `modules` (modules per side).
pub fn is_function_module(version: u32, modules: u32, x: u32, y: u32) -> bool {
    if in_finder_block(modules, x, y) {
        return true;
    }
    if x == 6 || y == 6 {
        return true; // Horizontal/vertical timing patterns.
    }
    if in_alignment_pattern(version, x, y) {
        return true;
    }
    // The single fixed dark module, always at (8, 4*version + 9).
    if x == 8 && y == 4 * version + 9 {
        return true;
    }
    // Version information blocks (present from version 7), two 6x3/3x6 rectangles.
    if version >= 7 {
        if x < 6 && y >= modules - 11 && y < modules - 8 {
            return true;
        }
        if y < 6 && x >= modules - 11 && x < modules - 8 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finder_pattern_corners_are_function_modules() {
        assert!(is_function_module(1, 21, 0, 0));
        assert!(is_function_module(1, 21, 20, 0));
        assert!(is_function_module(1, 21, 0, 20));
    }

    #[test]
    fn interior_data_module_is_not_function() {
        assert!(!is_function_module(1, 21, 10, 10));
    }

    #[test]
    fn version_two_alignment_pattern_is_reserved() {
        assert!(is_function_module(2, 25, 18, 18));
    }
}
