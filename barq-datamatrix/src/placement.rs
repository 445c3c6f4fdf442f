// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ECC200 "utah" module placement algorithm (ISO/IEC 16022 Annex F): sweeps the data region
//! diagonally, reading each codeword's 8 bits from a fixed cross-shaped group of modules around
//! the sweep position, with four special-cased corner codewords that wrap around the region's
//! edges. This walk is a pure function of the data region's size, independent of image content.

pub struct DataRegion<'a> {
    pub rows: i32,
    pub cols: i32,
    /// Queries whether the module at `(row, col)` (already wrapped into range) is set.
    pub get: &'a dyn Fn(i32, i32) -> bool,
}

impl<'a> DataRegion<'a> {
    fn read_module(&self, mut row: i32, mut col: i32) -> bool {
        if row < 0 {
            row += self.rows;
            col += 4 - ((self.rows + 4) % 8);
        }
        if col < 0 {
            col += self.cols;
            row += 4 - ((self.cols + 4) % 8);
        }
        (self.get)(row, col)
    }

    fn read_utah(&self, row: i32, col: i32) -> u8 {
        let bits = [
            self.read_module(row - 2, col - 2),
            self.read_module(row - 2, col - 1),
            self.read_module(row - 1, col - 2),
            self.read_module(row - 1, col - 1),
            self.read_module(row - 1, col),
            self.read_module(row, col - 2),
            self.read_module(row, col - 1),
            self.read_module(row, col),
        ];
        pack(&bits)
    }

    fn read_corner1(&self) -> u8 {
        let (nr, nc) = (self.rows, self.cols);
        pack(&[
            self.read_module(nr - 1, 0),
            self.read_module(nr - 1, 1),
            self.read_module(nr - 1, 2),
            self.read_module(0, nc - 2),
            self.read_module(0, nc - 1),
            self.read_module(1, nc - 1),
            self.read_module(2, nc - 1),
            self.read_module(3, nc - 1),
        ])
    }

    fn read_corner2(&self) -> u8 {
        let (nr, nc) = (self.rows, self.cols);
        pack(&[
            self.read_module(nr - 3, 0),
            self.read_module(nr - 2, 0),
            self.read_module(nr - 1, 0),
            self.read_module(0, nc - 4),
            self.read_module(0, nc - 3),
            self.read_module(0, nc - 2),
            self.read_module(0, nc - 1),
            self.read_module(1, nc - 1),
        ])
    }

    fn read_corner3(&self) -> u8 {
        let (nr, nc) = (self.rows, self.cols);
        pack(&[
            self.read_module(nr - 1, 0),
            self.read_module(nr - 1, nc - 1),
            self.read_module(0, nc - 3),
            self.read_module(0, nc - 2),
            self.read_module(0, nc - 1),
            self.read_module(1, nc - 3),
            self.read_module(1, nc - 2),
            self.read_module(1, nc - 1),
        ])
    }

    fn read_corner4(&self) -> u8 {
        let (nr, nc) = (self.rows, self.cols);
        pack(&[
            self.read_module(nr - 3, 0),
            self.read_module(nr - 2, 0),
            self.read_module(nr - 1, 0),
            self.read_module(0, nc - 2),
            self.read_module(0, nc - 1),
            self.read_module(1, nc - 1),
            self.read_module(2, nc - 1),
            self.read_module(3, nc - 1),
        ])
    }
}

fn pack(bits: &[bool; 8]) -> u8 {
    bits.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8)
}

/// Walk the data region's diagonal sweep, reading `num_codewords` bytes in encoding order.
pub fn read_codewords(region: &DataRegion, num_codewords: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(num_codewords);
    let (mut row, mut col) = (4i32, 0i32);
    let (mut corner1, mut corner2, mut corner3, mut corner4) = (false, false, false, false);
    let (nr, nc) = (region.rows, region.cols);

    loop {
        if row == nr && col == 0 && !corner1 {
            result.push(region.read_corner1());
            row -= 2;
            col += 2;
            corner1 = true;
        }
        else if row == nr - 2 && col == 0 && (nc & 0x03) != 0 && !corner2 {
            result.push(region.read_corner2());
            row -= 2;
            col += 2;
            corner2 = true;
        }
        else if row == nr + 4 && col == 2 && (nc & 0x07) == 0 && !corner3 {
            result.push(region.read_corner3());
            row -= 2;
            col += 2;
            corner3 = true;
        }
        else if row == nr - 2 && col == 0 && (nc & 0x07) == 4 && !corner4 {
            result.push(region.read_corner4());
            row -= 2;
            col += 2;
            corner4 = true;
        }
        else {
            loop {
                if row < nr && col >= 0 && result.len() < num_codewords {
                    result.push(region.read_utah(row, col));
                }
                row -= 2;
                col += 2;
                if !(row >= 0 && col < nc) {
                    break;
                }
            }
            row += 1;
            col += 3;
            loop {
                if row >= 0 && col < nc && result.len() < num_codewords {
                    result.push(region.read_utah(row, col));
                }
                row += 2;
                col -= 2;
                if !(row < nr && col >= 0) {
                    break;
                }
            }
            row += 3;
            col += 1;
        }
        if !(row < nr || col < nc) || result.len() >= num_codewords {
            break;
        }
    }

    result.truncate(num_codewords);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_by_ten_region_reads_expected_codeword_count() {
        // An 8x8 data region (10x10 symbol minus its L-border) holds 3 data + 5 ec codewords.
        let get = |_row: i32, _col: i32| false;
        let region = DataRegion { rows: 8, cols: 8, get: &get };
        let codewords = read_codewords(&region, 8);
        assert_eq!(codewords.len(), 8);
    }
}
