// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `DecoderResult`: the shared record a symbology decoder hands back to its caller in `barq`,
//! before position and orientation (known only to the detector, not the bit-stream decoder) are
//! attached to produce a public `Barcode`.

use crate::content::Content;
use crate::errors::Error;

/// Structured Append sequence metadata: this symbol's position in a multi-symbol sequence, the
/// total symbol count, and an optional shared sequence identifier used to group sequences read
/// out of order.
#[derive(Debug, Clone, Default)]
pub struct StructuredAppendInfo {
    pub index: u8,
    pub count: u8,
    pub id: Option<String>,
}

impl StructuredAppendInfo {
    pub fn is_part_of_sequence(&self) -> bool {
        self.count > 1
    }
}

/// The result of successfully (or unsuccessfully) decoding a bit/pattern stream into content, with
/// no knowledge yet of where in the image the symbol was found.
#[derive(Debug, Clone)]
pub struct DecoderResult {
    pub content: Content,
    /// Error-correction level label, e.g. QR's "M" or PDF417's numeric level; `None` for
    /// symbologies without one.
    pub ec_level: Option<String>,
    pub structured_append: StructuredAppendInfo,
    /// Corroborating row-scan count, populated for 1D symbologies (`ReaderOptions::min_line_count`
    /// governs how many are required before a result is accepted).
    pub line_count: u32,
    /// Set when the symbol encodes a "Reader Initialisation" / programming instruction rather
    /// than user data (Code128 FNC3, Data Matrix's reader-programming trigger).
    pub reader_init: bool,
    /// The raw decoded codeword/version/other symbology-specific label, used to populate
    /// `Barcode::symbology_identifier`'s modifier digit.
    pub symbology_identifier: Option<String>,
    pub error: Option<Error>,
}

impl DecoderResult {
    pub fn new(content: Content) -> Self {
        DecoderResult {
            content,
            ec_level: None,
            structured_append: StructuredAppendInfo::default(),
            line_count: 0,
            reader_init: false,
            symbology_identifier: None,
            error: None,
        }
    }

    pub fn with_ec_level(mut self, level: impl Into<String>) -> Self {
        self.ec_level = Some(level.into());
        self
    }

    pub fn with_structured_append(mut self, index: u8, count: u8, id: Option<String>) -> Self {
        self.structured_append = StructuredAppendInfo { index, count, id };
        self
    }

    pub fn with_line_count(mut self, count: u32) -> Self {
        self.line_count = count;
        self
    }

    pub fn with_symbology_identifier(mut self, id: impl Into<String>) -> Self {
        self.symbology_identifier = Some(id.into());
        self
    }

    pub fn mark_reader_init(mut self) -> Self {
        self.reader_init = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_append_single_symbol_is_not_a_sequence() {
        let info = StructuredAppendInfo { index: 0, count: 1, id: None };
        assert!(!info.is_part_of_sequence());
    }

    #[test]
    fn builder_chain_sets_fields() {
        let result = DecoderResult::new(Content::new())
            .with_ec_level("M")
            .with_line_count(3)
            .with_structured_append(1, 2, Some("A".to_string()));
        assert_eq!(result.ec_level.as_deref(), Some("M"));
        assert_eq!(result.line_count, 3);
        assert!(result.structured_append.is_part_of_sequence());
    }
}
