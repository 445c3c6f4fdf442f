// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ReaderOptions`: the knobs `MultiFormatReader` reads before it touches a single pixel.

use barq_core::{BinarizerKind, CharacterSet, TextMode};
use barq_oned::upcean::AddOnMode;

use crate::format::BarcodeFormat;

/// Controls how aggressively a reader decodes before giving up, trading CPU time for hit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Which symbologies to look for. The empty set (the type's own `Default`) means "all of
    /// them" — `BarcodeFormat::ANY`.
    pub formats: BarcodeFormat,
    /// Spend extra effort per symbology (extra binarizer passes, wider row-scan windows) rather
    /// than taking the first plausible read.
    pub try_harder: bool,
    /// Also scan the image rotated 90/180/270 degrees.
    pub try_rotate: bool,
    /// Also try the photometric inverse of the binarized image.
    pub try_invert: bool,
    /// Downscale large images before the first pass, retrying at full resolution only if nothing
    /// is found.
    pub try_downscale: bool,
    /// The shorter image dimension, in pixels, above which `try_downscale` kicks in.
    pub downscale_threshold: u32,
    /// The divisor used for the downscaled pass.
    pub downscale_factor: u32,
    /// The caller guarantees the image is a "pure" (not photographed) symbol render: one module
    /// per pixel, no perspective distortion, no need for noise-tolerant detection heuristics.
    pub is_pure: bool,
    /// The binarization algorithm `MultiFormatReader` uses to turn the input image into a
    /// `BitMatrix`/`PatternRow` sequence.
    pub binarizer: BinarizerKind,
    /// How many independent row-scans of a linear symbology must agree before it is accepted.
    pub min_line_count: u32,
    /// Stop once this many distinct symbols have been found; `None` means no limit.
    pub max_number_of_symbols: Option<u32>,
    /// Accept Code 39's extended (full-ASCII) encodation rather than treating `+%/$` as literal.
    pub try_code39_extended_mode: bool,
    /// Whether EAN-2/EAN-5 add-on symbols are ignored, read opportunistically, or required for a
    /// base EAN/UPC symbol to be considered valid.
    pub ean_add_on_symbol: AddOnMode,
    /// How `Barcode::text` renders the decoded payload.
    pub text_mode: TextMode,
    /// Overrides the character set used to interpret bytes lacking an explicit ECI designator.
    pub character_set: Option<CharacterSet>,
    /// Include failed-but-located symbols (detector succeeded, decoder did not) in the result
    /// list rather than silently dropping them.
    pub return_errors: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            formats: BarcodeFormat::NONE,
            try_harder: false,
            try_rotate: true,
            try_invert: true,
            try_downscale: true,
            downscale_threshold: 500,
            downscale_factor: 3,
            is_pure: false,
            binarizer: BinarizerKind::LocalAverage,
            min_line_count: 2,
            max_number_of_symbols: None,
            try_code39_extended_mode: false,
            ean_add_on_symbol: AddOnMode::Ignore,
            text_mode: TextMode::Plain,
            character_set: None,
            return_errors: false,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The formats this reader will actually attempt: the configured set, or `ANY` if none was
    /// set.
    pub fn effective_formats(&self) -> BarcodeFormat {
        if self.formats.is_empty() {
            BarcodeFormat::ANY
        }
        else {
            self.formats
        }
    }

    pub fn with_formats(mut self, formats: BarcodeFormat) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_try_harder(mut self, value: bool) -> Self {
        self.try_harder = value;
        self
    }

    pub fn with_try_rotate(mut self, value: bool) -> Self {
        self.try_rotate = value;
        self
    }

    pub fn with_try_invert(mut self, value: bool) -> Self {
        self.try_invert = value;
        self
    }

    pub fn with_try_downscale(mut self, value: bool) -> Self {
        self.try_downscale = value;
        self
    }

    pub fn with_downscale_threshold(mut self, value: u32) -> Self {
        self.downscale_threshold = value;
        self
    }

    pub fn with_downscale_factor(mut self, value: u32) -> Self {
        self.downscale_factor = value;
        self
    }

    pub fn with_is_pure(mut self, value: bool) -> Self {
        self.is_pure = value;
        self
    }

    pub fn with_binarizer(mut self, value: BinarizerKind) -> Self {
        self.binarizer = value;
        self
    }

    pub fn with_min_line_count(mut self, value: u32) -> Self {
        self.min_line_count = value.max(1);
        self
    }

    pub fn with_max_number_of_symbols(mut self, value: Option<u32>) -> Self {
        self.max_number_of_symbols = value;
        self
    }

    pub fn with_try_code39_extended_mode(mut self, value: bool) -> Self {
        self.try_code39_extended_mode = value;
        self
    }

    pub fn with_ean_add_on_symbol(mut self, value: AddOnMode) -> Self {
        self.ean_add_on_symbol = value;
        self
    }

    pub fn with_text_mode(mut self, value: TextMode) -> Self {
        self.text_mode = value;
        self
    }

    pub fn with_character_set(mut self, value: Option<CharacterSet>) -> Self {
        self.character_set = value;
        self
    }

    pub fn with_return_errors(mut self, value: bool) -> Self {
        self.return_errors = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_format_set_means_any() {
        let opts = ReaderOptions::new();
        assert_eq!(opts.effective_formats(), BarcodeFormat::ANY);
    }

    #[test]
    fn configured_formats_are_returned_verbatim() {
        let opts = ReaderOptions::new().with_formats(BarcodeFormat::QR_CODE);
        assert_eq!(opts.effective_formats(), BarcodeFormat::QR_CODE);
    }

    #[test]
    fn min_line_count_cannot_be_zero() {
        let opts = ReaderOptions::new().with_min_line_count(0);
        assert_eq!(opts.min_line_count, 1);
    }
}
