// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parses the mode-indicator-tagged bit stream (ISO/IEC 18004 clause 7.4) produced once the
//! codewords are deinterleaved and error-corrected: numeric, alphanumeric, byte and Kanji data
//! segments, ECI designator changes, FNC1 (GS1) markers, and the Structured Append header.

use barq_core::content::Eci;
use barq_core::{format_error, Content, Error, Result};

use crate::bitstream::BitReader;

const MODE_TERMINATOR: u32 = 0b0000;
const MODE_NUMERIC: u32 = 0b0001;
const MODE_ALPHANUMERIC: u32 = 0b0010;
const MODE_STRUCTURED_APPEND: u32 = 0b0011;
const MODE_BYTE: u32 = 0b0100;
const MODE_FNC1_FIRST: u32 = 0b0101;
const MODE_ECI: u32 = 0b0111;
const MODE_KANJI: u32 = 0b1000;
const MODE_FNC1_SECOND: u32 = 0b1001;

const ALPHANUMERIC_CHARS: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Character count indicator bit width for `mode` at `version`, per the standard's three version
/// bands.
fn count_bits(mode: u32, version: u32) -> u32 {
    let band = if version <= 9 {
        0
    }
    else if version <= 26 {
        1
    }
    else {
        2
    };
    match (mode, band) {
        (MODE_NUMERIC, 0) => 10,
        (MODE_NUMERIC, 1) => 12,
        (MODE_NUMERIC, _) => 14,
        (MODE_ALPHANUMERIC, 0) => 9,
        (MODE_ALPHANUMERIC, 1) => 11,
        (MODE_ALPHANUMERIC, _) => 13,
        (MODE_BYTE, 0) => 8,
        (MODE_BYTE, _) => 16,
        (MODE_KANJI, 0) => 8,
        (MODE_KANJI, 1) => 10,
        (MODE_KANJI, _) => 12,
        _ => 0,
    }
}

pub struct ParsedSegments {
    pub content: Content,
    pub structured_append: Option<(u8, u8, u8)>,
    pub reader_init: bool,
}

/// Decode every segment out of `data` until a terminator or bit exhaustion, accumulating decoded
/// bytes into a `Content` under the currently active ECI.
pub fn decode(data: &[u8], version: u32) -> Result<ParsedSegments> {
    let mut reader = BitReader::new(data);
    let mut content = Content::new();
    let mut eci = Eci::Default;
    let mut structured_append = None;
    let mut reader_init = false;

    loop {
        if reader.bits_remaining() < 4 {
            break;
        }
        let mode = match reader.read_bits(4) {
            Some(m) => m,
            None => break,
        };
        match mode {
            MODE_TERMINATOR => break,
            MODE_NUMERIC => decode_numeric(&mut reader, version, &mut content, eci)?,
            MODE_ALPHANUMERIC => decode_alphanumeric(&mut reader, version, &mut content, eci)?,
            MODE_BYTE => decode_byte(&mut reader, version, &mut content, eci)?,
            MODE_KANJI => decode_kanji(&mut reader, version, &mut content, eci)?,
            MODE_ECI => {
                eci = decode_eci_designator(&mut reader)?;
            }
            MODE_FNC1_FIRST | MODE_FNC1_SECOND => {
                content.mark_gs1();
                if mode == MODE_FNC1_SECOND {
                    // The second-position FNC1's one-byte application indicator is informational
                    // only; skip it rather than folding it into the data stream.
                    reader.read_bits(8);
                }
            }
            MODE_STRUCTURED_APPEND => {
                let index = reader.read_bits(4).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
                let count = reader.read_bits(4).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
                let parity = reader.read_bits(8).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
                structured_append = Some((index as u8, count as u8 + 1, parity as u8));
            }
            // A reserved/reader-programming mode indicator: mark it and stop, the remaining bits
            // carry no user payload.
            _ => {
                reader_init = true;
                break;
            }
        }
    }

    Ok(ParsedSegments { content, structured_append, reader_init })
}

fn decode_numeric(reader: &mut BitReader, version: u32, content: &mut Content, eci: Eci) -> Result<()> {
    let bits = count_bits(MODE_NUMERIC, version);
    let count = reader.read_bits(bits).ok_or_else(|| Error::format("qr: truncated bit stream"))? as usize;
    let mut digits = Vec::with_capacity(count);
    let mut remaining = count;
    while remaining >= 3 {
        let value = reader.read_bits(10).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        if value > 999 {
            return format_error("qr: numeric triple out of range");
        }
        digits.extend(format!("{:03}", value).bytes());
        remaining -= 3;
    }
    if remaining == 2 {
        let value = reader.read_bits(7).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        digits.extend(format!("{:02}", value).bytes());
    }
    else if remaining == 1 {
        let value = reader.read_bits(4).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        digits.extend(format!("{:01}", value).bytes());
    }
    content.push_bytes(eci, &digits);
    Ok(())
}

fn decode_alphanumeric(reader: &mut BitReader, version: u32, content: &mut Content, eci: Eci) -> Result<()> {
    let bits = count_bits(MODE_ALPHANUMERIC, version);
    let count = reader.read_bits(bits).ok_or_else(|| Error::format("qr: truncated bit stream"))? as usize;
    let mut out = Vec::with_capacity(count);
    let mut remaining = count;
    while remaining >= 2 {
        let value = reader.read_bits(11).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        let (hi, lo) = ((value / 45) as usize, (value % 45) as usize);
        if hi >= 45 || lo >= 45 {
            return format_error("qr: alphanumeric pair out of range");
        }
        out.push(ALPHANUMERIC_CHARS[hi]);
        out.push(ALPHANUMERIC_CHARS[lo]);
        remaining -= 2;
    }
    if remaining == 1 {
        let value = reader.read_bits(6).ok_or_else(|| Error::format("qr: truncated bit stream"))? as usize;
        if value >= 45 {
            return format_error("qr: alphanumeric value out of range");
        }
        out.push(ALPHANUMERIC_CHARS[value]);
    }
    content.push_bytes(eci, &out);
    Ok(())
}

fn decode_byte(reader: &mut BitReader, version: u32, content: &mut Content, eci: Eci) -> Result<()> {
    let bits = count_bits(MODE_BYTE, version);
    let count = reader.read_bits(bits).ok_or_else(|| Error::format("qr: truncated bit stream"))? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(reader.read_bits(8).ok_or_else(|| Error::format("qr: truncated bit stream"))? as u8);
    }
    content.push_bytes(eci, &out);
    Ok(())
}

/// Kanji characters are stored as a 13-bit compaction of their Shift-JIS code point; this expands
/// back to the raw two Shift-JIS bytes without interpreting them further (no Shift-JIS to Unicode
/// table is implemented here, matching `CharacterSet::ShiftJis`'s Latin-1 passthrough fallback in
/// `barq-core`).
fn decode_kanji(reader: &mut BitReader, version: u32, content: &mut Content, _eci: Eci) -> Result<()> {
    let bits = count_bits(MODE_KANJI, version);
    let count = reader.read_bits(bits).ok_or_else(|| Error::format("qr: truncated bit stream"))? as usize;
    let mut out = Vec::with_capacity(count * 2);
    for _ in 0..count {
        let value = reader.read_bits(13).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        let shifted = if value < 0x1F00 { value + 0x8140 } else { value + 0xC140 };
        out.push((shifted >> 8) as u8);
        out.push((shifted & 0xFF) as u8);
    }
    content.push_bytes(Eci::Value(20), &out);
    Ok(())
}

fn decode_eci_designator(reader: &mut BitReader) -> Result<Eci> {
    let first = reader.read_bits(8).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
    let value = if first & 0x80 == 0 {
        first
    }
    else if first & 0xC0 == 0x80 {
        let second = reader.read_bits(8).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        ((first & 0x3F) << 8) | second
    }
    else {
        let second = reader.read_bits(8).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        let third = reader.read_bits(8).ok_or_else(|| Error::format("qr: truncated bit stream"))?;
        ((first & 0x1F) << 16) | (second << 8) | third
    };
    Ok(Eci::Value(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_numeric_stream(digits: &str) -> Vec<u8> {
        let mut bits: Vec<bool> = Vec::new();
        let push_bits = |bits: &mut Vec<bool>, value: u32, width: u32| {
            for i in (0..width).rev() {
                bits.push((value >> i) & 1 != 0);
            }
        };
        push_bits(&mut bits, MODE_NUMERIC, 4);
        push_bits(&mut bits, digits.len() as u32, 10);
        let bytes = digits.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let chunk = &bytes[i..(i + 3).min(bytes.len())];
            let value: u32 = std::str::from_utf8(chunk).unwrap().parse().unwrap();
            let width = match chunk.len() {
                3 => 10,
                2 => 7,
                _ => 4,
            };
            push_bits(&mut bits, value, width);
            i += 3;
        }
        push_bits(&mut bits, MODE_TERMINATOR, 4);
        while bits.len() % 8 != 0 {
            bits.push(false);
        }
        bits.chunks(8).map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8)).collect()
    }

    #[test]
    fn decodes_numeric_segment() {
        let bytes = build_numeric_stream("0123456");
        let parsed = decode(&bytes, 1).unwrap();
        assert_eq!(parsed.content.bytes(), b"0123456");
    }

    #[test]
    fn alphanumeric_table_matches_standard_order() {
        assert_eq!(ALPHANUMERIC_CHARS[0], b'0');
        assert_eq!(ALPHANUMERIC_CHARS[10], b'A');
        assert_eq!(ALPHANUMERIC_CHARS[44], b':');
    }
}
