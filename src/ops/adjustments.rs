// ============================================================================
// FILTER PIPELINE - grayscale, brightness, contrast
// ============================================================================
//
// The display buffer is always recomputed from the source buffer, never
// from a previous display buffer, so applying the same settings twice gives
// byte-identical output. Rows are processed in parallel via rayon.
// ============================================================================

use rayon::prelude::*;

use crate::canvas::PixelBuffer;

/// Adjustable filter state. Brightness and contrast are kept inside
/// `[-255, 255]`, which also keeps the contrast denominator away from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FilterSettings {
    grayscale: bool,
    brightness: i16,
    contrast: i16,
}

impl FilterSettings {
    pub const MIN_LEVEL: i16 = -255;
    pub const MAX_LEVEL: i16 = 255;

    /// Build settings, clamping brightness and contrast into range.
    pub fn new(grayscale: bool, brightness: i32, contrast: i32) -> Self {
        Self {
            grayscale,
            brightness: clamp_level(brightness),
            contrast: clamp_level(contrast),
        }
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn brightness(&self) -> i16 {
        self.brightness
    }

    pub fn contrast(&self) -> i16 {
        self.contrast
    }

    pub fn set_grayscale(&mut self, on: bool) {
        self.grayscale = on;
    }

    pub fn set_brightness(&mut self, value: i32) {
        self.brightness = clamp_level(value);
    }

    pub fn set_contrast(&mut self, value: i32) {
        self.contrast = clamp_level(value);
    }

    /// True when applying these settings leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        !self.grayscale && self.brightness == 0 && self.contrast == 0
    }

    /// `259·(c+255) / (255·(259−c))`. Exactly 1.0 at `c = 0`.
    pub fn contrast_factor(&self) -> f64 {
        let c = self.contrast as f64;
        (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
    }

    /// Slider label value, `round(100 + brightness / 2)` percent.
    pub fn brightness_percent(&self) -> i32 {
        level_percent(self.brightness)
    }

    /// Slider label value, `round(100 + contrast / 2)` percent.
    pub fn contrast_percent(&self) -> i32 {
        level_percent(self.contrast)
    }
}

fn clamp_level(value: i32) -> i16 {
    value.clamp(FilterSettings::MIN_LEVEL as i32, FilterSettings::MAX_LEVEL as i32) as i16
}

fn level_percent(level: i16) -> i32 {
    (100.0 + level as f64 / 2.0 + 0.5).floor() as i32
}

/// Rec.601 luma.
#[inline]
fn luma(r: f64, g: f64, b: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Brightness then contrast on one channel value, clamped and rounded to u8.
#[inline]
fn adjust_channel(v: f64, brightness: f64, factor: f64) -> u8 {
    let v = v + brightness;
    let v = factor * (v - 128.0) + 128.0;
    v.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Per-value lookup table for the colour (non-grayscale) path, where every
/// input channel is an integer.
fn build_channel_lut(brightness: f64, factor: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = adjust_channel(i as f64, brightness, factor);
    }
    lut
}

/// Recompute a display buffer from `source`.
pub fn apply_filters(source: &PixelBuffer, settings: &FilterSettings) -> PixelBuffer {
    let mut out = PixelBuffer::new(0, 0);
    apply_filters_into(source, settings, &mut out);
    out
}

/// Recompute into an existing display buffer, overwriting it completely.
pub fn apply_filters_into(source: &PixelBuffer, settings: &FilterSettings, out: &mut PixelBuffer) {
    out.copy_from(source);
    if settings.is_identity() {
        return;
    }

    let stride = source.stride();
    if stride == 0 {
        return;
    }
    let brightness = settings.brightness as f64;
    let factor = settings.contrast_factor();
    let src_raw = source.as_raw();

    if settings.grayscale {
        out.as_raw_mut()
            .par_chunks_mut(stride)
            .zip(src_raw.par_chunks(stride))
            .for_each(|(row_out, row_in)| {
                for (po, pi) in row_out.chunks_exact_mut(4).zip(row_in.chunks_exact(4)) {
                    let gray = luma(pi[0] as f64, pi[1] as f64, pi[2] as f64);
                    let v = adjust_channel(gray, brightness, factor);
                    po[0] = v;
                    po[1] = v;
                    po[2] = v;
                    po[3] = pi[3];
                }
            });
    } else {
        let lut = build_channel_lut(brightness, factor);
        out.as_raw_mut()
            .par_chunks_mut(stride)
            .zip(src_raw.par_chunks(stride))
            .for_each(|(row_out, row_in)| {
                for (po, pi) in row_out.chunks_exact_mut(4).zip(row_in.chunks_exact(4)) {
                    po[0] = lut[pi[0] as usize];
                    po[1] = lut[pi[1] as usize];
                    po[2] = lut[pi[2] as usize];
                    po[3] = pi[3];
                }
            });
    }
}
