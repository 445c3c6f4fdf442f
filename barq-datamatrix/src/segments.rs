// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decodes the error-corrected codeword stream (ISO/IEC 16022 clause 5.2): unlike QR's bit-packed
//! grammar, Data Matrix codewords are byte-aligned ASCII values with latches into C40, Text, ANSI
//! X12, EDIFACT and Base 256 sub-encodations, each with its own packing scheme.

use barq_core::{format_error, Content, Eci, Result};

use crate::bitstream::BitReader;

const ASCII: u8 = 0;
const C40: u8 = 1;
const TEXT: u8 = 2;
const ANSI_X12: u8 = 3;
const EDIFACT: u8 = 4;
const BASE256: u8 = 5;
const PAD: u8 = 6;

#[derive(Clone, Copy, PartialEq, Eq)]
enum C40Variant {
    C40,
    Text,
}

pub struct ParsedSegments {
    pub content: Content,
    pub structured_append: bool,
    pub reader_init: bool,
}

/// Decode the full codeword stream, starting in ASCII mode, until a pad codeword or the stream is
/// exhausted.
pub fn decode(codewords: &[u8]) -> Result<ParsedSegments> {
    let mut content = Content::new();
    let mut pos = 0usize;
    let mut mode = ASCII;
    let mut upper_shift = false;
    let mut structured_append = false;
    let mut reader_init = false;
    let mut macro_trailer = false;

    while mode != PAD && pos < codewords.len() {
        mode = match mode {
            ASCII => decode_ascii(
                codewords,
                &mut pos,
                &mut content,
                &mut upper_shift,
                &mut structured_append,
                &mut reader_init,
                &mut macro_trailer,
            )?,
            C40 => {
                decode_c40_like(codewords, &mut pos, &mut content, C40Variant::C40)?;
                ASCII
            }
            TEXT => {
                decode_c40_like(codewords, &mut pos, &mut content, C40Variant::Text)?;
                ASCII
            }
            ANSI_X12 => {
                decode_x12(codewords, &mut pos, &mut content)?;
                ASCII
            }
            EDIFACT => {
                decode_edifact(codewords, &mut pos, &mut content)?;
                ASCII
            }
            BASE256 => {
                decode_base256(codewords, &mut pos, &mut content)?;
                ASCII
            }
            _ => return format_error("datamatrix: unknown encodation mode"),
        };
    }

    if macro_trailer {
        content.push_bytes(Eci::Default, b"\x1E\x04");
    }

    Ok(ParsedSegments { content, structured_append, reader_init })
}

fn decode_ascii(
    codewords: &[u8],
    pos: &mut usize,
    content: &mut Content,
    upper_shift: &mut bool,
    structured_append: &mut bool,
    reader_init: &mut bool,
    macro_trailer: &mut bool,
) -> Result<u8> {
    loop {
        if *pos >= codewords.len() {
            return Ok(PAD);
        }
        let value = codewords[*pos];
        *pos += 1;
        match value {
            0 => return format_error("datamatrix: codeword 0 is not valid in ascii mode"),
            1..=128 => {
                let mut byte = value - 1;
                if *upper_shift {
                    byte = byte.wrapping_add(128);
                    *upper_shift = false;
                }
                content.push_bytes(Eci::Default, &[byte]);
                return Ok(ASCII);
            }
            129 => return Ok(PAD),
            130..=229 => {
                let digits = value - 130;
                content.push_bytes(Eci::Default, format!("{:02}", digits).as_bytes());
            }
            230 => return Ok(C40),
            231 => return Ok(BASE256),
            // FNC1: marks the payload as GS1 rather than inserting a literal separator byte,
            // matching how the QR decoder's FNC1-first/second modes are handled.
            232 => content.mark_gs1(),
            233 | 234 => {
                // Structured Append and Reader Programming control codewords carry no payload
                // bytes of their own; just note that they were present.
                if value == 233 {
                    *structured_append = true;
                }
                else {
                    *reader_init = true;
                }
            }
            235 => *upper_shift = true,
            236 => {
                content.push_bytes(Eci::Default, b"[)>\x1E05\x1D");
                *macro_trailer = true;
            }
            237 => {
                content.push_bytes(Eci::Default, b"[)>\x1E06\x1D");
                *macro_trailer = true;
            }
            238 => return Ok(ANSI_X12),
            239 => return Ok(TEXT),
            240 => return Ok(EDIFACT),
            241 => return format_error("datamatrix: eci designator codewords are not decoded"),
            _ => return format_error("datamatrix: reserved ascii codeword"),
        }
    }
}

/// Unpack two codewords into the three base-40 "C40 values" they encode (ISO/IEC 16022 clause
/// 5.2.5.2), shared by C40, Text and ANSI X12 sub-encodations.
fn parse_two_bytes(first: u8, second: u8) -> [u8; 3] {
    let full = (((first as u32) << 8) | second as u32).wrapping_sub(1);
    let v0 = full / 1600;
    let rem = full - v0 * 1600;
    let v1 = rem / 40;
    let v2 = rem - v1 * 40;
    [v0 as u8, v1 as u8, v2 as u8]
}

fn basic_char(value: u8, variant: C40Variant) -> Option<u8> {
    match value {
        3 => Some(b' '),
        4..=13 => Some(b'0' + (value - 4)),
        14..=39 => {
            let upper = b'A' + (value - 14);
            Some(if variant == C40Variant::Text { upper + 32 } else { upper })
        }
        _ => None,
    }
}

fn shift2_char(value: u8) -> Option<u8> {
    match value {
        0..=14 => Some(33 + value),        // ! " # $ % & ' ( ) * + , - . /
        15..=26 => Some(58 + (value - 15)), // : ; < = > ? @ [ \ ] ^ _
        _ => None,
    }
}

/// Shift-3 covers ASCII 96 (`` ` ``) through 127 (DEL); Text mode swaps the embedded letters to
/// uppercase since its basic set already holds lowercase.
fn shift3_char(value: u8, variant: C40Variant) -> u8 {
    let ascii = 96 + value;
    if variant == C40Variant::Text && (97..=122).contains(&ascii) {
        ascii - 32
    }
    else {
        ascii
    }
}

fn push_shifted(content: &mut Content, byte: u8, upper_shift: &mut bool) {
    let out = if *upper_shift { byte.wrapping_add(128) } else { byte };
    *upper_shift = false;
    content.push_bytes(Eci::Default, &[out]);
}

fn decode_c40_like(codewords: &[u8], pos: &mut usize, content: &mut Content, variant: C40Variant) -> Result<()> {
    let mut upper_shift = false;
    let mut shift = 0u8;
    loop {
        if codewords.len() - *pos < 2 {
            return Ok(());
        }
        let first = codewords[*pos];
        if first == 254 {
            *pos += 1;
            return Ok(());
        }
        let second = codewords[*pos + 1];
        *pos += 2;
        for value in parse_two_bytes(first, second) {
            match shift {
                0 => {
                    if value < 3 {
                        shift = value + 1;
                    }
                    else if let Some(ch) = basic_char(value, variant) {
                        push_shifted(content, ch, &mut upper_shift);
                    }
                    else {
                        return format_error("datamatrix: c40/text value out of range");
                    }
                }
                1 => {
                    push_shifted(content, value, &mut upper_shift);
                    shift = 0;
                }
                2 => {
                    if value == 27 {
                        content.mark_gs1();
                    }
                    else if value == 30 {
                        upper_shift = true;
                    }
                    else if let Some(ch) = shift2_char(value) {
                        push_shifted(content, ch, &mut upper_shift);
                    }
                    else {
                        return format_error("datamatrix: c40/text shift-2 value out of range");
                    }
                    shift = 0;
                }
                _ => {
                    if value > 31 {
                        return format_error("datamatrix: c40/text shift-3 value out of range");
                    }
                    push_shifted(content, shift3_char(value, variant), &mut upper_shift);
                    shift = 0;
                }
            }
        }
        if *pos >= codewords.len() {
            return Ok(());
        }
    }
}

fn decode_x12(codewords: &[u8], pos: &mut usize, content: &mut Content) -> Result<()> {
    loop {
        if codewords.len() - *pos < 2 {
            return Ok(());
        }
        let first = codewords[*pos];
        if first == 254 {
            *pos += 1;
            return Ok(());
        }
        let second = codewords[*pos + 1];
        *pos += 2;
        for value in parse_two_bytes(first, second) {
            let ch = match value {
                0 => b'\r',
                1 => b'*',
                2 => b'>',
                3 => b' ',
                4..=13 => b'0' + (value - 4),
                14..=39 => b'A' + (value - 14),
                _ => return format_error("datamatrix: x12 value out of range"),
            };
            content.push_bytes(Eci::Default, &[ch]);
        }
        if *pos >= codewords.len() {
            return Ok(());
        }
    }
}

/// EDIFACT packs four six-bit values into three codewords; unlike the other sub-encodations it is
/// read as a contiguous bit stream rather than byte pairs, ending at the unlatch value `0x1F`.
fn decode_edifact(codewords: &[u8], pos: &mut usize, content: &mut Content) -> Result<()> {
    let mut reader = BitReader::new(&codewords[*pos..]);
    while reader.bits_remaining() >= 6 {
        let value = reader.read_bits(6).unwrap() as u8;
        if value == 0x1F {
            break;
        }
        let ch = if value & 0x20 == 0 { value | 0x40 } else { value };
        content.push_bytes(Eci::Default, &[ch]);
    }
    *pos += (reader.bits_consumed() + 7) / 8;
    Ok(())
}

fn unrandomize_255(value: u8, position: usize) -> u8 {
    let pseudo_random = ((149 * position) % 255) + 1;
    let temp = value as i32 - pseudo_random as i32;
    (if temp >= 0 { temp } else { temp + 256 }) as u8
}

/// Base 256 codewords are randomized with a 255-state generator keyed by each codeword's absolute
/// position in the stream, and carry their own length prefix.
fn decode_base256(codewords: &[u8], pos: &mut usize, content: &mut Content) -> Result<()> {
    if *pos >= codewords.len() {
        return format_error("datamatrix: base256 length codeword missing");
    }
    let d1 = unrandomize_255(codewords[*pos], *pos + 1);
    *pos += 1;
    let count = if d1 == 0 {
        codewords.len() - *pos
    }
    else if d1 < 250 {
        d1 as usize
    }
    else {
        if *pos >= codewords.len() {
            return format_error("datamatrix: base256 length continuation missing");
        }
        let d2 = unrandomize_255(codewords[*pos], *pos + 1);
        *pos += 1;
        250 * (d1 as usize - 249) + d2 as usize
    };
    if *pos + count > codewords.len() {
        return format_error("datamatrix: base256 segment runs past end of codewords");
    }
    let bytes: Vec<u8> = (0..count).map(|i| unrandomize_255(codewords[*pos + i], *pos + i + 1)).collect();
    *pos += count;
    content.push_bytes(Eci::Value(899), &bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_ascii_digits() {
        // '1' -> codeword 50 ('1' is ASCII 49, codeword = value+1), then a pad codeword.
        let codewords = [50u8, 129];
        let parsed = decode(&codewords).unwrap();
        assert_eq!(parsed.content.bytes(), b"1");
    }

    #[test]
    fn decodes_double_digit_pair() {
        // Codeword 130 + 42 = digit pair "42".
        let codewords = [130u8 + 42];
        let parsed = decode(&codewords).unwrap();
        assert_eq!(parsed.content.bytes(), b"42");
    }

    #[test]
    fn parse_two_bytes_recovers_basic_set_letter() {
        // C40 value 14 ('A') alone, in shift state 0, packed as the first of three values with
        // the other two being the shift-1-to-padding "unlatch" style filler value 0.
        let packed = 14u32 * 1600 + 1;
        let first = (packed >> 8) as u8;
        let second = (packed & 0xFF) as u8;
        let values = parse_two_bytes(first, second);
        assert_eq!(values[0], 14);
    }
}
