// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orients and samples a detected symbol: given the three finder pattern centers found by
//! `finder`, identify which is top-left/top-right/bottom-left, estimate the module count,
//! construct the module-space-to-image-space perspective transform, and sample it into an upright
//! `BitMatrix` for the decoder.

use barq_core::{format_error, sample_grid, BitMatrix, PerspectiveTransform, PointF, Quadrilateral, Result};

use crate::finder::{find_finder_patterns, FinderPattern};
use crate::tables::modules_for_version;

/// Finder pattern centers sit 3.5 modules in from each outer edge; the two finder-to-finder
/// distances in module space are therefore `modules - 7`.
const FINDER_CENTER_INSET: f32 = 3.5;

struct OrderedFinders {
    top_left: FinderPattern,
    top_right: FinderPattern,
    bottom_left: FinderPattern,
}

fn cross(o: PointF, a: PointF, b: PointF) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Pick the corner whose two outgoing edges are closest to perpendicular as top-left, then orient
/// the remaining two by the sign of their cross product so winding is always top-left, top-right,
/// bottom-left.
fn order_finders(patterns: &[FinderPattern; 3]) -> OrderedFinders {
    let dist = |a: PointF, b: PointF| a.distance(b);
    let d01 = dist(patterns[0].center, patterns[1].center);
    let d02 = dist(patterns[0].center, patterns[2].center);
    let d12 = dist(patterns[1].center, patterns[2].center);

    // The top-left corner is opposite the longest side (the diagonal between top-right and
    // bottom-left).
    let top_left_index = if d12 >= d01 && d12 >= d02 {
        0
    }
    else if d02 >= d01 && d02 >= d12 {
        1
    }
    else {
        2
    };

    let others: Vec<usize> = (0..3).filter(|&i| i != top_left_index).collect();
    let top_left = patterns[top_left_index];
    let (mut a, mut b) = (patterns[others[0]], patterns[others[1]]);
    if cross(top_left.center, a.center, b.center) < 0.0 {
        std::mem::swap(&mut a, &mut b);
    }
    // By convention the bottom-left pattern is below (larger y) the top-right pattern.
    if a.center.y > b.center.y {
        std::mem::swap(&mut a, &mut b);
    }
    OrderedFinders { top_left, top_right: a, bottom_left: b }
}

/// Detect a QR symbol in `image` and sample it into an upright module matrix at the detected
/// version's size. Does not decode the matrix; see `decoder::decode`.
pub fn detect(image: &BitMatrix) -> Result<(BitMatrix, Quadrilateral)> {
    let patterns = find_finder_patterns(image);
    log::debug!("qr: found {} finder pattern candidate(s)", patterns.len());
    if patterns.len() < 3 {
        return format_error("qr: fewer than three finder patterns found");
    }

    // When more than three candidates survive, prefer the three with the strongest row/column
    // corroboration.
    let mut ranked = patterns;
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    let top3: [FinderPattern; 3] = [ranked[0], ranked[1], ranked[2]];
    let ordered = order_finders(&top3);

    let module_size =
        (ordered.top_left.module_size + ordered.top_right.module_size + ordered.bottom_left.module_size) / 3.0;
    if module_size <= 0.0 {
        return format_error("qr: degenerate module size estimate");
    }

    let top_distance = ordered.top_left.center.distance(ordered.top_right.center);
    let left_distance = ordered.top_left.center.distance(ordered.bottom_left.center);
    let modules_estimate = (((top_distance + left_distance) / 2.0) / module_size + 7.0).round();
    let version = (((modules_estimate - 17.0) / 4.0).round() as i64).clamp(1, 40) as u32;
    let modules = modules_for_version(version);
    log::debug!("qr: estimated version {} ({} modules per side)", version, modules);

    // The fourth corner (bottom-right) is recovered via the parallelogram law: it completes the
    // parallelogram formed by the other three finder centers.
    let bottom_right = PointF::new(
        ordered.top_right.center.x + ordered.bottom_left.center.x - ordered.top_left.center.x,
        ordered.top_right.center.y + ordered.bottom_left.center.y - ordered.top_left.center.y,
    );

    let dst = Quadrilateral::new(ordered.top_left.center, ordered.top_right.center, bottom_right, ordered.bottom_left.center);
    let src = Quadrilateral::new(
        PointF::new(FINDER_CENTER_INSET, FINDER_CENTER_INSET),
        PointF::new(modules as f32 - FINDER_CENTER_INSET, FINDER_CENTER_INSET),
        PointF::new(modules as f32 - FINDER_CENTER_INSET, modules as f32 - FINDER_CENTER_INSET),
        PointF::new(FINDER_CENTER_INSET, modules as f32 - FINDER_CENTER_INSET),
    );
    let transform = PerspectiveTransform::quadrilateral_to_quadrilateral(src, dst);
    let sampled = sample_grid(image, modules, modules, &transform)?;
    Ok((sampled, dst))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finder(x: f32, y: f32) -> FinderPattern {
        FinderPattern { center: PointF::new(x, y), module_size: 1.0, count: 3 }
    }

    #[test]
    fn orders_finders_by_right_angle_corner() {
        let patterns = [finder(0.0, 0.0), finder(20.0, 0.0), finder(0.0, 20.0)];
        let ordered = order_finders(&patterns);
        assert_eq!(ordered.top_left.center, PointF::new(0.0, 0.0));
        assert_eq!(ordered.top_right.center, PointF::new(20.0, 0.0));
        assert_eq!(ordered.bottom_left.center, PointF::new(0.0, 20.0));
    }
}
