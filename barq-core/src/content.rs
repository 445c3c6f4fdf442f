// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Content`: the decoded byte payload of a symbol together with the ECI (Extended Channel
//! Interpretation) segments needed to render it as text, and the higher-level content-type
//! classification (plain text, GS1, URI, binary...) surfaced on `Barcode::content_type`.

use crate::errors::{format_error, Result};

/// An ECI designator, either the default interpretation or an explicit assigned value (ISO/IEC
/// 18004 Annex B / AIM ECI register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eci {
    /// No ECI segment was present; bytes are interpreted per the symbology's own default charset.
    Default,
    Value(u32),
}

impl Eci {
    /// Map an ECI value to the character set used to decode the bytes that follow it, covering
    /// the charsets symbologies in this crate actually emit.
    pub fn character_set(self) -> CharacterSet {
        match self {
            Eci::Default => CharacterSet::Iso8859_1,
            Eci::Value(v) => match v {
                0 => CharacterSet::Cp437,
                1 | 2 => CharacterSet::Iso8859_1,
                3 => CharacterSet::Iso8859_1,
                4 => CharacterSet::Iso8859_2,
                5 => CharacterSet::Iso8859_3,
                6 => CharacterSet::Iso8859_4,
                7 => CharacterSet::Iso8859_5,
                8 => CharacterSet::Iso8859_6,
                9 => CharacterSet::Iso8859_7,
                10 => CharacterSet::Iso8859_8,
                11 => CharacterSet::Iso8859_9,
                13 => CharacterSet::Iso8859_11,
                15 => CharacterSet::Iso8859_13,
                17 => CharacterSet::Iso8859_15,
                18 => CharacterSet::Iso8859_16,
                20 => CharacterSet::ShiftJis,
                21 => CharacterSet::Cp1250,
                22 => CharacterSet::Cp1251,
                23 => CharacterSet::Cp1252,
                24 => CharacterSet::Cp1256,
                25 => CharacterSet::Utf16Be,
                26 => CharacterSet::Utf8,
                27 => CharacterSet::Ascii,
                28 => CharacterSet::Big5,
                29 => CharacterSet::Gb2312,
                30 => CharacterSet::EucKr,
                170 => CharacterSet::Ascii,
                899 => CharacterSet::Binary,
                _ => CharacterSet::Unknown,
            },
        }
    }
}

/// The character sets this crate knows how to transcode to UTF-8. `ReaderOptions::character_set`
/// and ECI segments both resolve to this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Unknown,
    Ascii,
    Binary,
    Cp437,
    Iso8859_1,
    Iso8859_2,
    Iso8859_3,
    Iso8859_4,
    Iso8859_5,
    Iso8859_6,
    Iso8859_7,
    Iso8859_8,
    Iso8859_9,
    Iso8859_10,
    Iso8859_11,
    Iso8859_13,
    Iso8859_14,
    Iso8859_15,
    Iso8859_16,
    ShiftJis,
    Cp1250,
    Cp1251,
    Cp1252,
    Cp1256,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
    Utf8,
    Big5,
    Gb2312,
    EucKr,
}

/// How `Barcode::text` renders the decoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Apply each segment's character set / ECI and concatenate as Unicode text (the default).
    Plain,
    /// Render every byte as a two-digit hex pair, ignoring character set entirely.
    Hex,
    /// Render using the symbology's native escaping (e.g. Code128 FNC1 as `<FNC1>`), used for
    /// diagnostics.
    Escaped,
    /// Percent-encode any byte that isn't printable ASCII, producing a URI-safe rendering.
    Uri,
}

/// A coarse classification of what the decoded bytes represent, mirroring the reference
/// implementation's `ContentType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Binary,
    Mixed,
    Gs1,
    Iso15434,
    UriType,
}

/// One contiguous run of bytes under a single ECI designator.
#[derive(Debug, Clone)]
struct Segment {
    eci: Eci,
    bytes: Vec<u8>,
}

/// The decoded payload of a symbol: possibly multiple ECI segments, concatenated in the order
/// produced by the symbol's bit-stream decoder.
#[derive(Debug, Clone, Default)]
pub struct Content {
    segments: Vec<Segment>,
    /// Set when the symbology's own encodation marks this payload as GS1 (e.g. QR's FNC1-first
    /// mode, Data Matrix's `FNC1` trigger codeword, or a `]e0` AIM prefix).
    is_gs1: bool,
    /// Set when a symbology-specific "Reader Programming" / Symbol-specific AIM control segment
    /// was present, which decoders exclude from the human-readable text.
    has_eci_mismatch: bool,
}

impl Content {
    pub fn new() -> Self {
        Content::default()
    }

    /// Append raw bytes under the currently-active ECI (or `Eci::Default` if none has been seen
    /// yet), extending the last segment if it shares the same designator.
    pub fn push_bytes(&mut self, eci: Eci, bytes: &[u8]) {
        if let Some(last) = self.segments.last_mut() {
            if last.eci == eci {
                last.bytes.extend_from_slice(bytes);
                return;
            }
        }
        self.segments.push(Segment { eci, bytes: bytes.to_vec() });
    }

    pub fn mark_gs1(&mut self) {
        self.is_gs1 = true;
    }

    pub fn mark_eci_mismatch(&mut self) {
        self.has_eci_mismatch = true;
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.bytes.is_empty())
    }

    /// The raw, concatenated byte payload across all segments, with no character-set
    /// interpretation (matches `Barcode::bytes`).
    pub fn bytes(&self) -> Vec<u8> {
        self.segments.iter().flat_map(|s| s.bytes.iter().copied()).collect()
    }

    /// The raw byte payload of just the segments under a specific ECI value, or all bytes if no
    /// segment carries that ECI (matches `Barcode::bytes_eci`).
    pub fn bytes_eci(&self, eci: Eci) -> Vec<u8> {
        let filtered: Vec<u8> =
            self.segments.iter().filter(|s| s.eci == eci).flat_map(|s| s.bytes.iter().copied()).collect();
        if filtered.is_empty() {
            self.bytes()
        }
        else {
            filtered
        }
    }

    /// Render the payload as text per `mode`, transcoding each segment through its ECI's
    /// character set.
    pub fn text(&self, mode: TextMode) -> Result<String> {
        match mode {
            TextMode::Hex => Ok(self.bytes().iter().map(|b| format!("{:02X}", b)).collect()),
            TextMode::Uri => Ok(percent_encode(&self.bytes())),
            TextMode::Escaped => self.render_plain(true),
            TextMode::Plain => self.render_plain(false),
        }
    }

    fn render_plain(&self, escaped: bool) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            let charset = segment.eci.character_set();
            out.push_str(&decode_charset(&segment.bytes, charset, escaped)?);
        }
        Ok(out)
    }

    /// Classify the overall content per the reference implementation's heuristics: GS1 if the
    /// decoder flagged it, binary if any segment carries a `Binary`/`Unknown` charset, otherwise
    /// text.
    pub fn content_type(&self) -> ContentType {
        if self.is_gs1 {
            return ContentType::Gs1;
        }
        if self.segments.is_empty() {
            return ContentType::Text;
        }
        let has_binary =
            self.segments.iter().any(|s| matches!(s.eci.character_set(), CharacterSet::Binary | CharacterSet::Unknown));
        let has_text = self.segments.iter().any(|s| !matches!(s.eci.character_set(), CharacterSet::Binary));
        match (has_binary, has_text) {
            (true, true) => ContentType::Mixed,
            (true, false) => ContentType::Binary,
            _ => ContentType::Text,
        }
    }

    pub fn has_eci_mismatch(&self) -> bool {
        self.has_eci_mismatch
    }
}

fn percent_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        }
        else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Transcode `bytes` from `charset` into UTF-8. Single-byte Latin-family charsets pass through
/// unmapped high bytes as their Unicode code point equivalent (Latin-1 supplement region), which
/// is exact for ISO-8859-1 and an acceptable approximation for the others absent a full table.
fn decode_charset(bytes: &[u8], charset: CharacterSet, escaped: bool) -> Result<String> {
    match charset {
        CharacterSet::Ascii | CharacterSet::Iso8859_1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        CharacterSet::Utf8 => {
            std::str::from_utf8(bytes).map(|s| s.to_string()).or_else(|_| format_error("content: invalid utf-8 segment"))
        }
        CharacterSet::Utf16Be => decode_utf16(bytes, true),
        CharacterSet::Utf16Le => decode_utf16(bytes, false),
        CharacterSet::Binary => {
            if escaped {
                Ok(bytes.iter().map(|b| format!("\\x{:02X}", b)).collect())
            }
            else {
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
        }
        // Remaining single-byte code pages are approximated as Latin-1 in the absence of a full
        // mapping table; every code point below 0x80 is identical across all of them.
        _ => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return format_error("content: odd-length utf-16 segment");
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| if big_endian { u16::from_be_bytes([c[0], c[1]]) } else { u16::from_le_bytes([c[0], c[1]]) })
        .collect();
    String::from_utf16(&units).or_else(|_| format_error("content: invalid utf-16 segment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_round_trips() {
        let mut content = Content::new();
        content.push_bytes(Eci::Default, b"HELLO");
        assert_eq!(content.text(TextMode::Plain).unwrap(), "HELLO");
        assert_eq!(content.bytes(), b"HELLO");
    }

    #[test]
    fn hex_mode_ignores_charset() {
        let mut content = Content::new();
        content.push_bytes(Eci::Value(26), &[0xDE, 0xAD]);
        assert_eq!(content.text(TextMode::Hex).unwrap(), "DEAD");
    }

    #[test]
    fn gs1_marks_content_type() {
        let mut content = Content::new();
        content.push_bytes(Eci::Default, b"0112345");
        content.mark_gs1();
        assert_eq!(content.content_type(), ContentType::Gs1);
    }

    #[test]
    fn multi_eci_segments_each_use_their_own_charset() {
        let mut content = Content::new();
        content.push_bytes(Eci::Default, b"abc");
        content.push_bytes(Eci::Value(26), "xyz".as_bytes());
        let bytes = content.bytes();
        assert_eq!(bytes, b"abcxyz");
    }

    #[test]
    fn utf16_be_decodes_correctly() {
        let mut content = Content::new();
        // "Hi" in UTF-16BE.
        content.push_bytes(Eci::Value(25), &[0x00, b'H', 0x00, b'i']);
        assert_eq!(content.text(TextMode::Plain).unwrap(), "Hi");
    }
}
