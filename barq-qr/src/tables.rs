// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-version capacity tables (ISO/IEC 18004 Table 9 and Annex tables). Versions 1-10 carry the
//! full error-correction block layout; versions beyond that are recognized by the detector but
//! data decoding is not implemented (see the crate's module documentation).

/// One error-correction level's block layout: `ec_codewords_per_block` plus one or two groups of
/// `(block_count, data_codewords_per_block)`.
pub struct EcBlocks {
    pub ec_codewords_per_block: u32,
    pub groups: &'static [(u32, u32)],
}

pub struct VersionInfo {
    pub version: u32,
    pub modules: u32,
    pub total_codewords: u32,
    /// Indexed by `EcLevel as usize`: L, M, Q, H.
    pub ec_blocks: [EcBlocks; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcLevel {
    L,
    M,
    Q,
    H,
}

impl EcLevel {
    pub fn from_bits(bits: u32) -> Self {
        // Format info's 2-bit EC level field uses this non-obvious ordering (01=L, 00=M, 11=Q,
        // 10=H), inherited directly from the standard.
        match bits & 0b11 {
            0b01 => EcLevel::L,
            0b00 => EcLevel::M,
            0b11 => EcLevel::Q,
            _ => EcLevel::H,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        }
    }
}

pub const MAX_TABULATED_VERSION: u32 = 10;

/// Modules per side for a given full-size QR version (1-40).
pub fn modules_for_version(version: u32) -> u32 {
    17 + 4 * version
}

/// Look up the full error-correction block layout for versions 1-10.
pub fn version_info(version: u32) -> Option<&'static VersionInfo> {
    VERSIONS.iter().find(|v| v.version == version)
}

macro_rules! ecb {
    ($ec:expr, [$(($n:expr, $d:expr)),+ $(,)?]) => {
        EcBlocks { ec_codewords_per_block: $ec, groups: &[$(($n, $d)),+] }
    };
}

static VERSIONS: [VersionInfo; 10] = [
    VersionInfo {
        version: 1,
        modules: 21,
        total_codewords: 26,
        ec_blocks: [ecb!(7, [(1, 19)]), ecb!(10, [(1, 16)]), ecb!(13, [(1, 13)]), ecb!(17, [(1, 9)])],
    },
    VersionInfo {
        version: 2,
        modules: 25,
        total_codewords: 44,
        ec_blocks: [ecb!(10, [(1, 34)]), ecb!(16, [(1, 28)]), ecb!(22, [(1, 22)]), ecb!(28, [(1, 16)])],
    },
    VersionInfo {
        version: 3,
        modules: 29,
        total_codewords: 70,
        ec_blocks: [ecb!(15, [(1, 55)]), ecb!(26, [(1, 44)]), ecb!(18, [(2, 17)]), ecb!(22, [(2, 13)])],
    },
    VersionInfo {
        version: 4,
        modules: 33,
        total_codewords: 100,
        ec_blocks: [ecb!(20, [(1, 80)]), ecb!(18, [(2, 32)]), ecb!(26, [(2, 24)]), ecb!(16, [(4, 9)])],
    },
    VersionInfo {
        version: 5,
        modules: 37,
        total_codewords: 134,
        ec_blocks: [
            ecb!(26, [(1, 108)]),
            ecb!(24, [(2, 43)]),
            ecb!(18, [(2, 15), (2, 16)]),
            ecb!(22, [(2, 9), (2, 10)]),
        ],
    },
    VersionInfo {
        version: 6,
        modules: 41,
        total_codewords: 172,
        ec_blocks: [ecb!(18, [(2, 68)]), ecb!(16, [(4, 43)]), ecb!(24, [(4, 19)]), ecb!(28, [(4, 15)])],
    },
    VersionInfo {
        version: 7,
        modules: 45,
        total_codewords: 196,
        ec_blocks: [
            ecb!(20, [(2, 78)]),
            ecb!(18, [(4, 32)]),
            ecb!(18, [(2, 14), (4, 15)]),
            ecb!(26, [(4, 11), (1, 12)]),
        ],
    },
    VersionInfo {
        version: 8,
        modules: 49,
        total_codewords: 242,
        ec_blocks: [
            ecb!(24, [(2, 97)]),
            ecb!(22, [(2, 38), (2, 39)]),
            ecb!(22, [(4, 18), (2, 19)]),
            ecb!(26, [(4, 14), (2, 15)]),
        ],
    },
    VersionInfo {
        version: 9,
        modules: 53,
        total_codewords: 292,
        ec_blocks: [
            ecb!(30, [(2, 116)]),
            ecb!(22, [(3, 36), (2, 37)]),
            ecb!(20, [(4, 16), (4, 17)]),
            ecb!(24, [(4, 12), (4, 13)]),
        ],
    },
    VersionInfo {
        version: 10,
        modules: 57,
        total_codewords: 346,
        ec_blocks: [
            ecb!(18, [(2, 68), (2, 69)]),
            ecb!(26, [(4, 43), (1, 44)]),
            ecb!(24, [(6, 19), (2, 20)]),
            ecb!(28, [(6, 15), (2, 16)]),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_has_the_standard_module_count() {
        assert_eq!(modules_for_version(1), 21);
    }

    #[test]
    fn ec_level_bit_mapping_matches_the_standard_ordering() {
        assert_eq!(EcLevel::from_bits(0b01), EcLevel::L);
        assert_eq!(EcLevel::from_bits(0b00), EcLevel::M);
        assert_eq!(EcLevel::from_bits(0b11), EcLevel::Q);
        assert_eq!(EcLevel::from_bits(0b10), EcLevel::H);
    }

    #[test]
    fn version_five_has_two_block_groups_for_q_and_h() {
        let v = version_info(5).unwrap();
        assert_eq!(v.ec_blocks[2].groups.len(), 2);
        assert_eq!(v.ec_blocks[3].groups.len(), 2);
    }
}
