// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! QR Code detection and decoding, the namesake and most capable symbology in the barq family:
//! finder pattern detection, format/version info recovery, GF(256) Reed-Solomon error correction,
//! and the full numeric/alphanumeric/byte/Kanji/ECI/FNC1/structured-append bit-stream grammar, for
//! versions 1-10. `micro` and `rmqr` decode Micro QR and rMQR by reusing this module's finder
//! search, masking and Reed-Solomon machinery against their own (single- or dual-finder,
//! axis-aligned) geometries; see each module's documentation for the specific approximations their
//! detectors carry where this pack didn't have enough to confirm the standard's exact tables.

mod bitstream;
mod decoder;
mod detector;
mod finder;
mod format_info;
mod function_pattern;
mod mask;
mod segments;
mod tables;
mod version_info;

pub mod micro;
pub mod rmqr;

use barq_core::{BitMatrix, DecoderResult, Quadrilateral, Result};

/// Detect and decode a single QR symbol in `image`, returning its decoded content and the
/// quadrilateral it occupies in image space.
pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    let (sampled, position) = detector::detect(image)?;
    let result = decoder::decode(&sampled)?;
    Ok((result, position))
}
