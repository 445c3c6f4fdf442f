// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linear symbology readers. Every reader in this crate implements `RowReader`: given one scanned
//! `PatternRow`, try to locate and decode a symbol that starts within it. The `barq` facade crate
//! drives the middle-outward multi-row scanning loop (`ReaderOptions::min_line_count` etc.) and
//! calls these readers once per candidate row.

pub mod code128;
pub mod code39;
pub mod code93;
pub mod codabar;
pub mod databar;
pub mod dxfilmedge;
pub mod gtin;
pub mod itf;
pub mod upcean;

use barq_core::{DecoderResult, PatternRow};

/// The linear symbology a `RowReader` recognized, named rather than expressed as a shared bitflag
/// so this crate has no dependency on the facade crate's `BarcodeFormat` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneDFormat {
    Codabar,
    Code39,
    Code93,
    Code128,
    DataBar,
    DataBarExpanded,
    DataBarLimited,
    Ean8,
    Ean13,
    Itf,
    UpcA,
    UpcE,
    DxFilmEdge,
}

/// The pixel column range (within the scanned row) that the decoded symbol occupied, used by the
/// facade to build the final `Quadrilateral` position once the row's y-coordinate is known.
#[derive(Debug, Clone, Copy)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

/// A successful single-row decode: the recognized format, its result, and where in the row it was
/// found.
pub struct RowResult {
    pub format: OneDFormat,
    pub decoder_result: DecoderResult,
    pub range: RowRange,
}

/// Implemented by every linear-symbology reader in this crate.
pub trait RowReader {
    /// Attempt to decode a symbol starting at or after `row`'s first run. Returns `None` (not
    /// `Err`) when this reader's symbology simply isn't present in the row; a format/checksum
    /// error is reserved for "this does look like my symbology, but it's corrupt."
    fn decode_row(&self, row: &PatternRow) -> Option<barq_core::Result<RowResult>>;
}

/// Shared helper: find the narrow/wide-independent unit width for a guard-delimited symbology by
/// averaging across `count` modules spanning `pixels` pixels.
pub fn module_width(pixels: u32, count: u32) -> f32 {
    pixels as f32 / count as f32
}

/// Round `value / unit` to the nearest integer count of modules, with a minimum of 1.
pub fn round_to_modules(value: u32, unit: f32) -> u32 {
    ((value as f32 / unit).round() as u32).max(1)
}
