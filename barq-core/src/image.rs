// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ImageView` is a non-owning, lifetime-bound view over a caller's pixel buffer. It never copies
//! the underlying bytes; `cropped`/`rotated`/`subsampled` all derive new views over the same
//! borrow.

/// The layout of a single pixel: how many bytes it occupies, and which byte holds which channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single luminance byte per pixel.
    Lum,
    /// Luminance + alpha.
    LumA,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Argb,
    Abgr,
}

impl PixelFormat {
    /// `(pixel_stride, r_index, g_index, b_index)`, matching the 32-bit tuple encoding used by the
    /// reference implementation's pixel format identity.
    pub fn channel_layout(self) -> (usize, usize, usize, usize) {
        match self {
            PixelFormat::Lum => (1, 0, 0, 0),
            PixelFormat::LumA => (2, 0, 0, 0),
            PixelFormat::Rgb => (3, 0, 1, 2),
            PixelFormat::Bgr => (3, 2, 1, 0),
            PixelFormat::Rgba => (4, 0, 1, 2),
            PixelFormat::Bgra => (4, 2, 1, 0),
            PixelFormat::Argb => (4, 1, 2, 3),
            PixelFormat::Abgr => (4, 3, 2, 1),
        }
    }

    pub fn pixel_stride(self) -> usize {
        self.channel_layout().0
    }

    pub fn is_luminance_only(self) -> bool {
        matches!(self, PixelFormat::Lum | PixelFormat::LumA)
    }
}

/// A 90-degree-quantized rotation applied lazily by `ImageView::rotated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

/// A non-owning view of a rectangular pixel buffer.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    row_stride: usize,
    format: PixelFormat,
    rotation: Rotation,
}

impl<'a> ImageView<'a> {
    /// Construct a new view. `row_stride` must be at least `width * format.pixel_stride()`, and
    /// `data` must be large enough to hold `height` rows of `row_stride` bytes.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        row_stride: usize,
        format: PixelFormat,
    ) -> Self {
        debug_assert!(row_stride >= width as usize * format.pixel_stride());
        debug_assert!(data.len() >= row_stride * height as usize);
        ImageView { data, width, height, row_stride, format, rotation: Rotation::None }
    }

    pub fn width(&self) -> u32 {
        match self.rotation {
            Rotation::None | Rotation::Cw180 => self.width,
            Rotation::Cw90 | Rotation::Cw270 => self.height,
        }
    }

    pub fn height(&self) -> u32 {
        match self.rotation {
            Rotation::None | Rotation::Cw180 => self.height,
            Rotation::Cw90 | Rotation::Cw270 => self.width,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Derive a new view cropped to the given rectangle, in the view's *current* (already
    /// rotated) coordinate space. Never copies.
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> ImageView<'a> {
        debug_assert!(x + width <= self.width() && y + height <= self.height());
        // Cropping is expressed in post-rotation coordinates; translate back to the underlying
        // buffer's native (un-rotated) coordinates by composing with the existing rotation.
        let (ux, uy, uw, uh) = match self.rotation {
            Rotation::None => (x, y, width, height),
            Rotation::Cw180 => (self.width - x - width, self.height - y - height, width, height),
            Rotation::Cw90 => (y, self.height - x - width, height, width),
            Rotation::Cw270 => (self.width - y - height, x, height, width),
        };
        let pix_stride = self.format.pixel_stride();
        let offset = uy as usize * self.row_stride + ux as usize * pix_stride;
        ImageView {
            data: &self.data[offset..],
            width: uw,
            height: uh,
            row_stride: self.row_stride,
            format: self.format,
            rotation: self.rotation,
        }
    }

    /// Derive a new view rotated by a multiple of 90 degrees clockwise. Never copies; only
    /// changes how row/pixel lookups are indexed.
    pub fn rotated(&self, quarter_turns_cw: u8) -> ImageView<'a> {
        let rotation = match (self.rotation, quarter_turns_cw % 4) {
            (r, 0) => r,
            (Rotation::None, 1) => Rotation::Cw90,
            (Rotation::None, 2) => Rotation::Cw180,
            (Rotation::None, 3) => Rotation::Cw270,
            (Rotation::Cw90, 1) => Rotation::Cw180,
            (Rotation::Cw90, 2) => Rotation::Cw270,
            (Rotation::Cw90, 3) => Rotation::None,
            (Rotation::Cw180, 1) => Rotation::Cw270,
            (Rotation::Cw180, 2) => Rotation::None,
            (Rotation::Cw180, 3) => Rotation::Cw90,
            (Rotation::Cw270, 1) => Rotation::None,
            (Rotation::Cw270, 2) => Rotation::Cw90,
            (Rotation::Cw270, 3) => Rotation::Cw180,
            _ => unreachable!(),
        };
        ImageView { rotation, ..*self }
    }

    /// Fetch the pixel at view-space `(x, y)`, translating through the active rotation into the
    /// underlying buffer's native layout.
    #[inline]
    fn pixel_bytes(&self, x: u32, y: u32) -> &[u8] {
        let (ux, uy) = match self.rotation {
            Rotation::None => (x, y),
            Rotation::Cw90 => (y, self.width - 1 - x),
            Rotation::Cw180 => (self.width - 1 - x, self.height - 1 - y),
            Rotation::Cw270 => (self.height - 1 - y, x),
        };
        let pix_stride = self.format.pixel_stride();
        let offset = uy as usize * self.row_stride + ux as usize * pix_stride;
        &self.data[offset..offset + pix_stride]
    }

    /// Decode the luminance of the pixel at `(x, y)` using ITU-R BT.601 coefficients, rounded to
    /// nearest: `L = (306*r + 601*g + 117*b + 512) >> 10`.
    #[inline]
    pub fn luminance_at(&self, x: u32, y: u32) -> u8 {
        let px = self.pixel_bytes(x, y);
        if self.format.is_luminance_only() {
            return px[0];
        }
        let (_, ri, gi, bi) = self.format.channel_layout();
        let r = px[ri] as u32;
        let g = px[gi] as u32;
        let b = px[bi] as u32;
        ((306 * r + 601 * g + 117 * b + 512) >> 10) as u8
    }

    /// Iterate the luminance values of a single row, left to right.
    pub fn luminance_row(&self, y: u32) -> impl Iterator<Item = u8> + '_ {
        (0..self.width()).map(move |x| self.luminance_at(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lum_passthrough() {
        let data = [10u8, 20, 30, 40];
        let view = ImageView::new(&data, 4, 1, 4, PixelFormat::Lum);
        assert_eq!(view.luminance_at(2, 0), 30);
    }

    #[test]
    fn rgb_to_luminance_matches_bt601() {
        // pure green should dominate.
        let data = [0u8, 255, 0];
        let view = ImageView::new(&data, 1, 1, 3, PixelFormat::Rgb);
        let l = view.luminance_at(0, 0);
        assert_eq!(l, ((601 * 255 + 512) >> 10) as u8);
    }

    #[test]
    fn rotate_90_reindexes_without_copy() {
        // 2x1 image: pixel (0,0)=10, (1,0)=20
        let data = [10u8, 20];
        let view = ImageView::new(&data, 2, 1, 2, PixelFormat::Lum);
        let rotated = view.rotated(1);
        assert_eq!((rotated.width(), rotated.height()), (1, 2));
        assert_eq!(rotated.luminance_at(0, 0), 10);
        assert_eq!(rotated.luminance_at(0, 1), 20);
    }

    #[test]
    fn bgr_channel_order_is_respected() {
        let data = [5u8, 6, 7]; // b=5 g=6 r=7
        let view = ImageView::new(&data, 1, 1, 3, PixelFormat::Bgr);
        let l = view.luminance_at(0, 0);
        let expected = ((306 * 7 + 601 * 6 + 117 * 5 + 512) >> 10) as u8;
        assert_eq!(l, expected);
    }
}
