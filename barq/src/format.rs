// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `BarcodeFormat`: the bit assignment a caller uses both to ask `ReaderOptions` which
//! symbologies to look for and to identify which one a `Barcode` turned out to be.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarcodeFormat: u32 {
        const NONE              = 0;
        const AZTEC             = 1 << 0;
        const CODABAR           = 1 << 1;
        const CODE39            = 1 << 2;
        const CODE93            = 1 << 3;
        const CODE128           = 1 << 4;
        const DATA_BAR          = 1 << 5;
        const DATA_BAR_EXPANDED = 1 << 6;
        const DATA_MATRIX       = 1 << 7;
        const EAN8              = 1 << 8;
        const EAN13              = 1 << 9;
        const ITF                = 1 << 10;
        const MAXICODE           = 1 << 11;
        const PDF417             = 1 << 12;
        const QR_CODE            = 1 << 13;
        const UPC_A              = 1 << 14;
        const UPC_E              = 1 << 15;
        const MICRO_QR_CODE      = 1 << 16;
        const RMQR_CODE          = 1 << 17;
        const DX_FILM_EDGE       = 1 << 18;
        const DATA_BAR_LIMITED   = 1 << 19;

        const LINEAR_CODES = Self::CODABAR.bits() | Self::CODE39.bits() | Self::CODE93.bits()
            | Self::CODE128.bits() | Self::EAN8.bits() | Self::EAN13.bits() | Self::ITF.bits()
            | Self::DATA_BAR.bits() | Self::DATA_BAR_EXPANDED.bits() | Self::DATA_BAR_LIMITED.bits()
            | Self::DX_FILM_EDGE.bits() | Self::UPC_A.bits() | Self::UPC_E.bits();

        const MATRIX_CODES = Self::AZTEC.bits() | Self::DATA_MATRIX.bits() | Self::MAXICODE.bits()
            | Self::PDF417.bits() | Self::QR_CODE.bits() | Self::MICRO_QR_CODE.bits() | Self::RMQR_CODE.bits();

        const ANY = Self::LINEAR_CODES.bits() | Self::MATRIX_CODES.bits();
    }
}

impl Default for BarcodeFormat {
    /// An empty set means "all supported formats" to `ReaderOptions`, but a bare `BarcodeFormat`
    /// default is the empty set itself, matching `bitflags`' usual convention; callers that want
    /// "everything" construct `ReaderOptions` via its own `Default` instead.
    fn default() -> Self {
        BarcodeFormat::NONE
    }
}

impl std::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            BarcodeFormat::AZTEC => "Aztec",
            BarcodeFormat::CODABAR => "Codabar",
            BarcodeFormat::CODE39 => "Code39",
            BarcodeFormat::CODE93 => "Code93",
            BarcodeFormat::CODE128 => "Code128",
            BarcodeFormat::DATA_BAR => "DataBar",
            BarcodeFormat::DATA_BAR_EXPANDED => "DataBarExpanded",
            BarcodeFormat::DATA_BAR_LIMITED => "DataBarLimited",
            BarcodeFormat::DATA_MATRIX => "DataMatrix",
            BarcodeFormat::EAN8 => "EAN-8",
            BarcodeFormat::EAN13 => "EAN-13",
            BarcodeFormat::ITF => "ITF",
            BarcodeFormat::MAXICODE => "MaxiCode",
            BarcodeFormat::PDF417 => "PDF417",
            BarcodeFormat::QR_CODE => "QRCode",
            BarcodeFormat::UPC_A => "UPC-A",
            BarcodeFormat::UPC_E => "UPC-E",
            BarcodeFormat::MICRO_QR_CODE => "MicroQRCode",
            BarcodeFormat::RMQR_CODE => "rMQRCode",
            BarcodeFormat::DX_FILM_EDGE => "DXFilmEdge",
            _ => "None",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_codes_excludes_matrix_codes() {
        assert!(BarcodeFormat::LINEAR_CODES.contains(BarcodeFormat::CODE128));
        assert!(!BarcodeFormat::LINEAR_CODES.contains(BarcodeFormat::QR_CODE));
    }

    #[test]
    fn any_is_the_union_of_both_groups() {
        assert_eq!(BarcodeFormat::ANY, BarcodeFormat::LINEAR_CODES | BarcodeFormat::MATRIX_CODES);
    }

    #[test]
    fn display_names_match_the_common_spelling() {
        assert_eq!(BarcodeFormat::QR_CODE.to_string(), "QRCode");
        assert_eq!(BarcodeFormat::EAN13.to_string(), "EAN-13");
    }
}
