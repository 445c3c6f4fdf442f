// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aztec Code (ISO/IEC 24778) detection and decoding: Compact symbols (1-4 layers) and Full-range
//! symbols (1-32 layers). `detector::detect` tries a Compact-sized mode message first and falls
//! back to a Full-range-sized one; see `tables` and `decoder` for the approximations the
//! Full-range path carries (the reference grid dividing the data region is not threaded around).

mod charset;
mod detector;
mod decoder;
mod mode_message;
mod segments;
mod tables;

use barq_core::{BitMatrix, DecoderResult, Quadrilateral, Result};

pub fn detect_and_decode(image: &BitMatrix) -> Result<(DecoderResult, Quadrilateral)> {
    decoder::decode(image)
}
