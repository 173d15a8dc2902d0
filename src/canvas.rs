use image::RgbaImage;
use image::imageops::{self, FilterType};
use rayon::prelude::*;

use crate::components::crop::CropRect;

// ============================================================================
// PIXEL BUFFER – flat row-major RGBA8 storage
// ============================================================================

/// Largest buffer the editor will allocate (256 megapixels).
pub const MAX_PIXELS: u64 = 256_000_000;

/// Owned RGBA image, 8 bits per channel, row-major.
///
/// `data.len() == width * height * 4` always holds. Every geometric operation
/// returns a new buffer; the only in-place writer is the filter pipeline,
/// which overwrites a display buffer it already owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Create a buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * 4);
        for _ in 0..len {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, data }
    }

    /// Wrap raw RGBA bytes. Returns `None` if the length does not match the
    /// dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as u64) * (height as u64) * 4;
        if data.len() as u64 != expected {
            return None;
        }
        Some(Self { width, height, data })
    }

    pub fn from_rgba_image(src: &RgbaImage) -> Self {
        Self {
            width: src.width(),
            height: src.height(),
            data: src.as_raw().clone(),
        }
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        let (w, h) = (self.width, self.height);
        RgbaImage::from_raw(w, h, self.data).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        self.clone().into_rgba_image()
    }

    // ---- accessors ----------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// The RGBA value at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn memory_bytes(&self) -> usize {
        self.data.len()
    }

    /// Resize this buffer to match `other`'s dimensions and copy its bytes,
    /// reusing the existing allocation where possible.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }

    // ---- geometry -----------------------------------------------------------

    /// Copy the region described by `rect` into a new buffer.
    ///
    /// The rect is rounded to whole pixels: origin with `max(0, round(v))`,
    /// size with `max(1, round(v))`. Destination `(col, row)` reads the source
    /// at flat pixel index `(iy + row) * width + (ix + col)`, so a rounded
    /// rect one pixel wider than the source picks up the first pixel of the
    /// next row. Only indices past the end of the data come out transparent.
    pub fn crop(&self, rect: &CropRect) -> PixelBuffer {
        let (ix, iy, iw, ih) = rect.to_pixel_bounds();
        let mut out = PixelBuffer::new(iw, ih);
        let src_len = self.data.len() as u64;
        let dst_stride = out.stride();

        for row in 0..ih as u64 {
            let src_start = ((iy as u64 + row) * self.width as u64 + ix as u64) * 4;
            if src_start >= src_len {
                break;
            }
            let len = (dst_stride as u64).min(src_len - src_start) as usize;
            let src_start = src_start as usize;
            let dst_start = row as usize * dst_stride;
            out.data[dst_start..dst_start + len]
                .copy_from_slice(&self.data[src_start..src_start + len]);
        }
        out
    }

    /// Rotate 90° clockwise. Source `(x, y)` lands at `(h - 1 - y, x)`.
    pub fn rotate_90cw(&self) -> PixelBuffer {
        self.rotate_90(true)
    }

    /// Rotate 90° counter-clockwise. Source `(x, y)` lands at `(y, w - 1 - x)`.
    pub fn rotate_90ccw(&self) -> PixelBuffer {
        self.rotate_90(false)
    }

    /// Quarter-turn by direct index permutation, so a left turn followed by a
    /// right turn reproduces the original bytes exactly.
    pub fn rotate_90(&self, clockwise: bool) -> PixelBuffer {
        let old_w = self.width as usize;
        let old_h = self.height as usize;
        let new_w = old_h;
        let new_h = old_w;
        let mut out = PixelBuffer::new(new_w as u32, new_h as u32);
        if new_w == 0 || new_h == 0 {
            return out;
        }
        let src = &self.data;

        out.data
            .par_chunks_mut(new_w * 4)
            .enumerate()
            .for_each(|(dy, row_out)| {
                for dx in 0..new_w {
                    let (sx, sy) = if clockwise {
                        (dy, old_h - 1 - dx)
                    } else {
                        (old_w - 1 - dy, dx)
                    };
                    let si = (sy * old_w + sx) * 4;
                    row_out[dx * 4..dx * 4 + 4].copy_from_slice(&src[si..si + 4]);
                }
            });
        out
    }

    /// Mirror left↔right.
    pub fn flip_horizontal(&self) -> PixelBuffer {
        let w = self.width as usize;
        let mut out = PixelBuffer::new(self.width, self.height);
        if w == 0 {
            return out;
        }
        let stride = w * 4;
        out.data
            .par_chunks_mut(stride)
            .zip(self.data.par_chunks(stride))
            .for_each(|(row_out, row_in)| {
                for x in 0..w {
                    let si = (w - 1 - x) * 4;
                    row_out[x * 4..x * 4 + 4].copy_from_slice(&row_in[si..si + 4]);
                }
            });
        out
    }

    /// Mirror top↔bottom.
    pub fn flip_vertical(&self) -> PixelBuffer {
        let h = self.height as usize;
        let stride = self.stride();
        let mut out = PixelBuffer::new(self.width, self.height);
        if stride == 0 {
            return out;
        }
        out.data
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row_out)| {
                let sy = h - 1 - y;
                row_out.copy_from_slice(&self.data[sy * stride..(sy + 1) * stride]);
            });
        out
    }

    /// Resample to `new_w`×`new_h` with the given filter. Both dimensions are
    /// clamped to at least 1.
    pub fn resample(&self, new_w: u32, new_h: u32, filter: FilterType) -> PixelBuffer {
        let new_w = new_w.max(1);
        let new_h = new_h.max(1);
        if self.width == 0 || self.height == 0 {
            return PixelBuffer::new(new_w, new_h);
        }
        let flat = self.to_rgba_image();
        let resized = imageops::resize(&flat, new_w, new_h, filter);
        PixelBuffer::from_rgba_image(&resized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3×2 buffer where each pixel encodes its own coordinates.
    fn coord_buffer(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                buf.put_pixel(x, y, [x as u8, y as u8, (x * 10 + y) as u8, 255]);
            }
        }
        buf
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_crop_top_left_pixel() {
        let buf = coord_buffer(2, 2);
        let rect = CropRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        let out = buf.crop(&rect);
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.as_raw(), &[0, 0, 0, 255]);
    }

    #[test]
    fn test_crop_rounds_rect() {
        let buf = coord_buffer(5, 5);
        let rect = CropRect { x: 0.6, y: 1.4, width: 2.5, height: 1.49 };
        let out = buf.crop(&rect);
        // x rounds to 1, y to 1, width to 3, height to 1
        assert_eq!(out.dimensions(), (3, 1));
        assert_eq!(out.pixel(0, 0), buf.pixel(1, 1));
        assert_eq!(out.pixel(2, 0), buf.pixel(3, 1));
    }

    #[test]
    fn test_crop_past_end_of_data_stays_transparent() {
        let buf = PixelBuffer::filled(2, 2, [9, 9, 9, 255]);
        let rect = CropRect { x: 1.0, y: 1.0, width: 3.0, height: 3.0 };
        let out = buf.crop(&rect);
        assert_eq!(out.dimensions(), (3, 3));
        assert_eq!(out.pixel(0, 0), Some([9, 9, 9, 255]));
        assert_eq!(out.pixel(1, 0), Some([0, 0, 0, 0]));
        assert_eq!(out.pixel(0, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_crop_rounded_past_right_edge_reads_next_row() {
        // x = 10.5 and width = 89.5 round to 11 and 90, one past the 100 columns.
        let buf = coord_buffer(100, 4);
        let rect = CropRect { x: 10.5, y: 0.0, width: 89.5, height: 4.0 };
        let out = buf.crop(&rect);
        assert_eq!(out.dimensions(), (90, 4));
        assert_eq!(out.pixel(0, 0), buf.pixel(11, 0));
        assert_eq!(out.pixel(88, 0), buf.pixel(99, 0));
        assert_eq!(out.pixel(89, 0), buf.pixel(0, 1));
        assert_eq!(out.pixel(89, 2), buf.pixel(0, 3));
        // The last row's overhang runs past the end of the data.
        assert_eq!(out.pixel(89, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_rotate_cw_mapping() {
        let buf = coord_buffer(3, 2);
        let out = buf.rotate_90cw();
        assert_eq!(out.dimensions(), (2, 3));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.pixel(2 - 1 - y, x), buf.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_rotate_ccw_mapping() {
        let buf = coord_buffer(3, 2);
        let out = buf.rotate_90ccw();
        assert_eq!(out.dimensions(), (2, 3));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.pixel(y, 3 - 1 - x), buf.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_rotate_left_then_right_is_identity() {
        let buf = coord_buffer(7, 3);
        assert_eq!(buf.rotate_90ccw().rotate_90cw(), buf);
        assert_eq!(buf.rotate_90cw().rotate_90ccw(), buf);
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let buf = coord_buffer(4, 3);
        assert_eq!(buf.flip_horizontal().flip_horizontal(), buf);
        assert_eq!(buf.flip_vertical().flip_vertical(), buf);
    }

    #[test]
    fn test_flip_mirrors() {
        let buf = coord_buffer(4, 3);
        let h = buf.flip_horizontal();
        let v = buf.flip_vertical();
        assert_eq!(h.pixel(0, 1), buf.pixel(3, 1));
        assert_eq!(v.pixel(2, 0), buf.pixel(2, 2));
        assert_eq!(h.dimensions(), buf.dimensions());
    }

    #[test]
    fn test_resample_dimensions_and_solid_colour() {
        let buf = PixelBuffer::filled(10, 6, [200, 100, 50, 255]);
        let out = buf.resample(25, 3, FilterType::Triangle);
        assert_eq!(out.dimensions(), (25, 3));
        assert!(out.as_raw().chunks(4).all(|p| p == [200, 100, 50, 255]));
    }

    #[test]
    fn test_resample_clamps_to_one() {
        let buf = PixelBuffer::filled(4, 4, [1, 2, 3, 4]);
        assert_eq!(buf.resample(0, 0, FilterType::Triangle).dimensions(), (1, 1));
    }

    #[test]
    fn test_copy_from_reuses_buffer() {
        let mut dst = PixelBuffer::new(1, 1);
        let src = coord_buffer(3, 3);
        dst.copy_from(&src);
        assert_eq!(dst, src);
    }
}
