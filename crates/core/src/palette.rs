//! 256-color palette resource.

use std::ops::Range;

use crate::error::{RasterError, Result};
use crate::image::PixelImage;
use crate::types::{Color, PALETTE_SIZE};

/// Exactly 256 RGBA entries addressed by a `u8` index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Color; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

impl From<[Color; PALETTE_SIZE]> for Palette {
    fn from(colors: [Color; PALETTE_SIZE]) -> Self {
        Self { colors }
    }
}

impl Palette {
    /// Every entry set to `color`.
    pub fn filled(color: Color) -> Self {
        Self {
            colors: [color; PALETTE_SIZE],
        }
    }

    pub fn colors(&self) -> &[Color; PALETTE_SIZE] {
        &self.colors
    }

    #[inline]
    pub fn get(&self, index: u8) -> Color {
        self.colors[index as usize]
    }

    #[inline]
    pub fn set(&mut self, index: u8, color: Color) {
        self.colors[index as usize] = color;
    }

    /// Rotate the entries in `range` by `steps` positions (palette cycling).
    ///
    /// Positive steps move each color to a higher index. Ranges that fall
    /// outside the palette are clipped.
    pub fn rotate(&mut self, range: Range<usize>, steps: isize) {
        let end = range.end.min(PALETTE_SIZE);
        if range.start >= end {
            return;
        }
        let slice = &mut self.colors[range.start..end];
        let len = slice.len() as isize;
        let k = steps.rem_euclid(len) as usize;
        slice.rotate_right(k);
    }

    /// Parse the plain-text palette table.
    ///
    /// One `R,G,B[,A]` row per entry. Blank lines and lines starting with `#`
    /// are ignored, values are clamped to 0-255, alpha defaults to 255, rows
    /// beyond 256 are ignored and missing rows are opaque black.
    ///
    /// ```
    /// use indexed_raster_core::Palette;
    /// use indexed_raster_core::types::Color;
    ///
    /// let p = Palette::parse_text("# sky\n10,20,30\n300,0,0,128\n").unwrap();
    /// assert_eq!(p.get(0), Color::rgb(10, 20, 30));
    /// assert_eq!(p.get(1), Color::rgba(255, 0, 0, 128));
    /// assert_eq!(p.get(2), Color::BLACK);
    /// ```
    pub fn parse_text(text: &str) -> Result<Self> {
        let mut palette = Palette::filled(Color::BLACK);
        let mut index = 0usize;

        for (line_no, raw) in text.lines().enumerate() {
            if index >= PALETTE_SIZE {
                break;
            }
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut values = [0i32, 0, 0, 255];
            let mut count = 0usize;
            for token in line.split(',').take(4) {
                let token = token.trim();
                values[count] = token.parse::<i32>().map_err(|_| RasterError::PaletteParse {
                    line: line_no + 1,
                    reason: format!("invalid value {:?}", token),
                })?;
                count += 1;
            }
            if count < 3 {
                return Err(RasterError::PaletteParse {
                    line: line_no + 1,
                    reason: "need at least R,G,B".to_string(),
                });
            }

            let [r, g, b, a] = values.map(|v| v.clamp(0, 255) as u8);
            palette.colors[index] = Color::rgba(r, g, b, a);
            index += 1;
        }

        Ok(palette)
    }

    /// Treat the first 256 pixels of an image (row-major) as a literal palette.
    pub fn from_image(image: &PixelImage) -> Self {
        let mut palette = Palette::filled(Color::BLACK);
        for (slot, px) in palette.colors.iter_mut().zip(image.pixels()) {
            *slot = *px;
        }
        palette
    }

    /// Linear black-to-white ramp (the framebuffer default).
    pub fn grayscale() -> Self {
        let mut palette = Palette::filled(Color::BLACK);
        for (i, c) in palette.colors.iter_mut().enumerate() {
            *c = Color::gray(i as u8);
        }
        palette
    }

    /// 16 VGA colors, a 6x6x6 color cube, then a gray ramp.
    pub fn vga() -> Self {
        const BASE: [Color; 16] = [
            Color::rgb(0, 0, 0),
            Color::rgb(0, 0, 170),
            Color::rgb(0, 170, 0),
            Color::rgb(0, 170, 170),
            Color::rgb(170, 0, 0),
            Color::rgb(170, 0, 170),
            Color::rgb(170, 85, 0),
            Color::rgb(170, 170, 170),
            Color::rgb(85, 85, 85),
            Color::rgb(85, 85, 255),
            Color::rgb(85, 255, 85),
            Color::rgb(85, 255, 255),
            Color::rgb(255, 85, 85),
            Color::rgb(255, 85, 255),
            Color::rgb(255, 255, 85),
            Color::rgb(255, 255, 255),
        ];

        let mut palette = Palette::filled(Color::BLACK);
        palette.colors[..16].copy_from_slice(&BASE);

        let mut idx = 16usize;
        for r in 0..6u8 {
            for g in 0..6u8 {
                for b in 0..6u8 {
                    palette.colors[idx] = Color::rgb(r * 51, g * 51, b * 51);
                    idx += 1;
                }
            }
        }

        let ramp_start = idx;
        for i in ramp_start..PALETTE_SIZE {
            let gray = (i - ramp_start) * 255 / (255 - ramp_start);
            palette.colors[i] = Color::gray(gray as u8);
        }
        palette
    }

    /// Black -> red -> orange -> yellow -> white, for fire effects.
    pub fn fire_gradient() -> Self {
        let mut palette = Palette::filled(Color::BLACK);
        for (i, c) in palette.colors.iter_mut().enumerate() {
            *c = if i < 64 {
                Color::rgb((i as f32 / 64.0 * 64.0) as u8, 0, 0)
            } else if i < 128 {
                let t = (i - 64) as f32 / 64.0;
                Color::rgb((64.0 + t * 191.0) as u8, (t * 128.0) as u8, 0)
            } else if i < 192 {
                let t = (i - 128) as f32 / 64.0;
                Color::rgb(255, (128.0 + t * 127.0) as u8, (t * 128.0) as u8)
            } else {
                let t = (i - 192) as f32 / 63.0;
                Color::rgb(255, 255, (128.0 + t * 127.0) as u8)
            };
        }
        palette
    }

    /// Full-saturation hue sweep.
    pub fn rainbow() -> Self {
        let mut palette = Palette::filled(Color::BLACK);
        for (i, c) in palette.colors.iter_mut().enumerate() {
            let hue = i as f32 / 255.0 * 360.0;
            let x = 1.0 - ((hue / 60.0) % 2.0 - 1.0).abs();
            let (r, g, b) = match hue {
                h if h < 60.0 => (1.0, x, 0.0),
                h if h < 120.0 => (x, 1.0, 0.0),
                h if h < 180.0 => (0.0, 1.0, x),
                h if h < 240.0 => (0.0, x, 1.0),
                h if h < 300.0 => (x, 0.0, 1.0),
                _ => (1.0, 0.0, x),
            };
            *c = Color::rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8);
        }
        palette
    }

    /// Seven base hues in bright (1-7), medium (8-14) and dark (15-21) variants.
    ///
    /// Index 0 is black. This is the layout the default mesh lighting table
    /// expects.
    pub fn shaded_primaries() -> Self {
        const BRIGHT: [Color; 7] = [
            Color::rgb(255, 64, 64),
            Color::rgb(64, 255, 64),
            Color::rgb(64, 64, 255),
            Color::rgb(255, 255, 64),
            Color::rgb(255, 64, 255),
            Color::rgb(64, 255, 255),
            Color::rgb(255, 128, 64),
        ];
        const MEDIUM: [Color; 7] = [
            Color::rgb(153, 38, 38),
            Color::rgb(38, 153, 38),
            Color::rgb(38, 38, 153),
            Color::rgb(153, 153, 38),
            Color::rgb(153, 38, 153),
            Color::rgb(38, 153, 153),
            Color::rgb(153, 76, 38),
        ];
        const DARK: [Color; 7] = [
            Color::rgb(76, 19, 19),
            Color::rgb(19, 76, 19),
            Color::rgb(19, 19, 76),
            Color::rgb(76, 76, 19),
            Color::rgb(76, 19, 76),
            Color::rgb(19, 76, 76),
            Color::rgb(76, 38, 19),
        ];

        let mut palette = Palette::filled(Color::BLACK);
        palette.colors[1..8].copy_from_slice(&BRIGHT);
        palette.colors[8..15].copy_from_slice(&MEDIUM);
        palette.colors[15..22].copy_from_slice(&DARK);
        palette
    }
}
