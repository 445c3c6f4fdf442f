// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field geometry constants and GF(64) parameters shared by MaxiCode's primary and secondary
//! message blocks (ISO/IEC 16023).

/// MaxiCode's Reed-Solomon codewords are 6 bits wide, over GF(64) with primitive polynomial
/// `x^6 + x + 1`.
pub const GF_BITS: u32 = 6;
pub const GF_PRIMITIVE: u32 = 0x43;

/// The fixed symbol is 30 columns by 33 rows of hexagonal modules.
pub const COLUMNS: u32 = 30;
pub const ROWS: u32 = 33;

/// The primary message block is 10 data codewords protected by 10 error-correction codewords.
pub const PRIMARY_DATA_CODEWORDS: usize = 10;
pub const PRIMARY_EC_CODEWORDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Structured Carrier Message with a numeric postal code (US domestic addressing).
    Mode2,
    /// Structured Carrier Message with an alphanumeric postal code (international addressing).
    Mode3,
    /// Standard Error Correction, no structured carrier fields.
    Mode4,
    /// Enhanced Error Correction.
    Mode5,
    /// Reader programming symbol.
    Mode6,
}

impl Mode {
    pub fn from_code(value: u8) -> Option<Mode> {
        match value {
            2 => Some(Mode::Mode2),
            3 => Some(Mode::Mode3),
            4 => Some(Mode::Mode4),
            5 => Some(Mode::Mode5),
            6 => Some(Mode::Mode6),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_code_recognizes_the_five_structured_modes() {
        assert_eq!(Mode::from_code(2), Some(Mode::Mode2));
        assert_eq!(Mode::from_code(6), Some(Mode::Mode6));
        assert_eq!(Mode::from_code(1), None);
    }
}
