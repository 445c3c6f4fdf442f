// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `barq-core` collects the pieces shared by every symbology-specific decoder crate in the barq
//! family: the image/luminance model, binarizers, the packed `BitMatrix` and 1D `PatternRow`
//! representations, perspective geometry, Reed-Solomon error correction, and the ECI-aware
//! `Content` payload type. A symbology crate (`barq-qr`, `barq-oned`, ...) depends on this crate
//! and never re-implements these primitives.

pub mod binarize;
pub mod bitmatrix;
pub mod content;
pub mod decoder_result;
pub mod errors;
pub mod geometry;
pub mod image;
pub mod pattern;
pub mod reedsolomon;

pub use binarize::{Binarizer, BinarizerKind};
pub use bitmatrix::{sample_grid, BitMatrix};
pub use content::{CharacterSet, Content, ContentType, Eci, TextMode};
pub use decoder_result::{DecoderResult, StructuredAppendInfo};
pub use errors::{checksum_error, format_error, unsupported_error, Error, ErrorKind, Result};
pub use geometry::{PerspectiveTransform, PointF, PointI, Quadrilateral};
pub use image::{ImageView, PixelFormat, Rotation};
pub use pattern::{narrow_wide_threshold, normalized_pattern, PatternRow, PatternView};
pub use reedsolomon::{decode_binary, GfBinary};
