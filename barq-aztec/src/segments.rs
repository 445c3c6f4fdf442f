// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Walks the unstuffed data bit stream through the Upper/Lower/Mixed/Punct/Digit state machine,
//! handling one-shot shifts, permanent latches, and Binary Shift segments (ISO/IEC 24778 clause
//! 8). ECI/FLG(n) signaling is not decoded; a stream that uses it reports an error.

use barq_core::{format_error, Content, Eci, Result};

use crate::charset::{lookup, Mode, Token};

struct BitCursor<'a> {
    bits: &'a [bool],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    fn new(bits: &'a [bool]) -> Self {
        BitCursor { bits, pos: 0 }
    }

    fn read(&mut self, count: u32) -> Option<u32> {
        if self.pos + count as usize > self.bits.len() {
            return None;
        }
        let mut value = 0u32;
        for i in 0..count as usize {
            value = (value << 1) | self.bits[self.pos + i] as u32;
        }
        self.pos += count as usize;
        Some(value)
    }
}

pub struct ParsedSegments {
    pub content: Content,
}

pub fn decode(bits: &[bool]) -> Result<ParsedSegments> {
    let mut reader = BitCursor::new(bits);
    let mut content = Content::new();
    let mut mode = Mode::Upper;

    while let Some(token) = next_token(&mut reader, mode) {
        match token {
            Token::Literal(b) => content.push_bytes(Eci::Default, &[b]),
            Token::Text(s) => content.push_bytes(Eci::Default, s.as_bytes()),
            Token::Latch(m) => mode = m,
            Token::Shift(target) => apply_shift(&mut reader, target, &mut content)?,
            Token::BinaryShift => decode_binary_shift(&mut reader, &mut content)?,
            Token::Invalid => return format_error("aztec: reserved punctuation code"),
        }
    }

    Ok(ParsedSegments { content })
}

fn next_token(reader: &mut BitCursor, mode: Mode) -> Option<Token> {
    reader.read(mode.code_width()).map(|value| lookup(mode, value as u8))
}

/// A shift reads exactly one code from `target`'s table and then returns control to the mode that
/// was active before the shift.
fn apply_shift(reader: &mut BitCursor, target: Mode, content: &mut Content) -> Result<()> {
    match next_token(reader, target) {
        Some(Token::Literal(b)) => content.push_bytes(Eci::Default, &[b]),
        Some(Token::Text(s)) => content.push_bytes(Eci::Default, s.as_bytes()),
        Some(Token::BinaryShift) => decode_binary_shift(reader, content)?,
        None => {}
        _ => return format_error("aztec: unexpected latch or shift immediately after a shift"),
    }
    Ok(())
}

fn decode_binary_shift(reader: &mut BitCursor, content: &mut Content) -> Result<()> {
    let first = reader.read(5).ok_or_else(|| barq_core::Error::format("aztec: truncated binary shift length"))?;
    let length = if first == 0 {
        reader.read(11).ok_or_else(|| barq_core::Error::format("aztec: truncated extended binary shift length"))? + 31
    }
    else {
        first
    };
    let mut bytes = Vec::with_capacity(length as usize);
    for _ in 0..length {
        let byte = reader.read(8).ok_or_else(|| barq_core::Error::format("aztec: truncated binary shift data"))?;
        bytes.push(byte as u8);
    }
    content.push_bytes(Eci::Value(899), &bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_from_str(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn decodes_upper_case_word() {
        // 'H' = code 9 (b'A'+7), 'I' = code 10, each 5 bits.
        let bits = bits_from_str("0100101010");
        let parsed = decode(&bits).unwrap();
        assert_eq!(parsed.content.bytes(), b"HI");
    }

    #[test]
    fn shift_to_punct_then_returns_to_upper() {
        // Shift (code 0) + punct code 6 ('!'), then upper code 9 ('H').
        let bits = bits_from_str("00000"); // shift to punct
        let mut all = bits;
        all.extend(bits_from_str("00110")); // '!'
        all.extend(bits_from_str("01001")); // 'H'
        let parsed = decode(&all).unwrap();
        assert_eq!(parsed.content.bytes(), b"!H");
    }
}
