// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data Matrix (ECC200) detection and decoding: locates the solid-L finder pattern, samples the
//! symbol into an upright module matrix, walks the "utah" placement order to recover codewords,
//! Reed-Solomon corrects them, and parses the ASCII/C40/Text/X12/EDIFACT/Base256 byte stream.
//!
//! Square symbols with a single data region (10x10 through 26x26) are supported; larger symbols
//! that tile multiple data regions, and rectangular symbols, are out of scope.

mod bitstream;
mod decoder;
mod detector;
mod placement;
mod segments;
mod tables;

use barq_core::{BitMatrix, DecoderResult, Quadrilateral, Result};

/// Detect and decode a single Data Matrix symbol in `image`.
pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    let (sampled, quad) = detector::detect(image)?;
    let result = decoder::decode(&sampled)?;
    Ok((result, quad))
}
