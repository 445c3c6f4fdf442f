// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ECC200 symbol size attributes (ISO/IEC 16022 Table 7), for the single-data-region square
//! symbols (10x10 through 26x26). Larger symbols split their data region into multiple tiled
//! blocks separated by extra timing patterns; that tiling is not implemented, so this table stops
//! at 26x26 (see the crate's module documentation).

pub struct SizeInfo {
    pub size: u32,
    pub data_codewords: u32,
    pub ec_codewords: u32,
}

pub const MAX_TABULATED_SIZE: u32 = 26;

pub fn size_info(size: u32) -> Option<&'static SizeInfo> {
    SIZES.iter().find(|s| s.size == size)
}

static SIZES: [SizeInfo; 9] = [
    SizeInfo { size: 10, data_codewords: 3, ec_codewords: 5 },
    SizeInfo { size: 12, data_codewords: 5, ec_codewords: 7 },
    SizeInfo { size: 14, data_codewords: 8, ec_codewords: 10 },
    SizeInfo { size: 16, data_codewords: 12, ec_codewords: 12 },
    SizeInfo { size: 18, data_codewords: 18, ec_codewords: 14 },
    SizeInfo { size: 20, data_codewords: 22, ec_codewords: 18 },
    SizeInfo { size: 22, data_codewords: 30, ec_codewords: 20 },
    SizeInfo { size: 24, data_codewords: 36, ec_codewords: 24 },
    SizeInfo { size: 26, data_codewords: 44, ec_codewords: 28 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_symbol_has_expected_capacity() {
        let info = size_info(10).unwrap();
        assert_eq!(info.data_codewords, 3);
        assert_eq!(info.ec_codewords, 5);
    }
}
