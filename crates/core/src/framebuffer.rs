//! Indexed-color framebuffer.
//!
//! Every pixel is one byte indexing into a 256-entry [`Palette`]. Pixel and
//! palette changes are tracked by two independent dirty flags so a backend
//! can re-upload the small palette without touching the index plane (color
//! cycling, pulsing).
//!
//! Drawing never writes outside the buffer: out-of-range pixels are dropped
//! and rectangles/spans are clipped.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::image::PixelImage;
use crate::palette::Palette;
use crate::quantize::{median_cut, nearest_index};
use crate::render::{Attachable, RenderContext, TextureUploader, UploadReport};
use crate::types::{Color, Vec2, PALETTE_SIZE};

/// How [`IndexedFramebuffer::blit_image`] picks the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteFit {
    /// Median-cut the image and install the result as the buffer palette.
    #[default]
    Quantize,
    /// Map pixels against the palette already installed.
    Existing,
}

/// Identity of one framebuffer, used by backends to key their textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        BufferId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Width x height array of palette indices plus its palette.
#[derive(Debug)]
pub struct IndexedFramebuffer {
    id: BufferId,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    palette: Palette,
    pixels_dirty: bool,
    palette_dirty: bool,
    position: Vec2,
    scale: f32,
    visible: bool,
}

impl IndexedFramebuffer {
    /// New buffer cleared to index 0 with a grayscale palette.
    ///
    /// Both dirty flags start set: nothing has been uploaded yet.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            id: BufferId::next(),
            width,
            height,
            pixels: vec![0; len],
            palette: Palette::grayscale(),
            pixels_dirty: true,
            palette_dirty: true,
            position: Vec2::ZERO,
            scale: 1.0,
            visible: true,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline(always)]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Write one pixel. Out-of-range coordinates are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, index: u8) {
        if let Some(i) = self.idx(x, y) {
            self.pixels[i] = index;
            self.pixels_dirty = true;
        }
    }

    /// Read one pixel. Out-of-range coordinates read as index 0.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> u8 {
        self.idx(x, y).map(|i| self.pixels[i]).unwrap_or(0)
    }

    /// Bresenham line, both endpoints inclusive.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, index: u8) {
        let (w, h) = (self.width as i64, self.height as i64);
        let (mut x, mut y) = (x0 as i64, y0 as i64);
        let (x1, y1) = (x1 as i64, y1 as i64);

        // Both endpoints past the same edge: no pixel of the line can land.
        if (x < 0 && x1 < 0) || (y < 0 && y1 < 0) || (x >= w && x1 >= w) || (y >= h && y1 >= h) {
            return;
        }

        let dx = (x1 - x).abs();
        let dy = (y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.set_pixel(x as i32, y as i32, index);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Scanline triangle fill.
    ///
    /// Vertices are sorted by Y; each row interpolates X on the long edge and
    /// on whichever short edge spans that row, then fills the inclusive span.
    /// A triangle whose vertices share one Y has no area and draws nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_triangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        index: u8,
    ) {
        let mut v = [(x0, y0), (x1, y1), (x2, y2)];
        if v[1].1 < v[0].1 {
            v.swap(0, 1);
        }
        if v[2].1 < v[0].1 {
            v.swap(0, 2);
        }
        if v[2].1 < v[1].1 {
            v.swap(1, 2);
        }
        let [(x0, y0), (x1, y1), (x2, y2)] = v;

        if y0 == y2 || self.width == 0 || self.height == 0 {
            return;
        }

        let lerp = |ya: i32, yb: i32, xa: i32, xb: i32, y: i32| -> i32 {
            if yb == ya {
                return xa;
            }
            let t = (y as f32 - ya as f32) / (yb as f32 - ya as f32);
            (xa as f32 + t * (xb as f32 - xa as f32)) as i32
        };

        // Rows outside the buffer would only produce dropped writes.
        let y_start = y0.max(0);
        let y_end = y2.min(self.height as i32 - 1);
        for y in y_start..=y_end {
            let xa = lerp(y0, y2, x0, x2, y);
            let xb = if y < y1 {
                lerp(y0, y1, x0, x1, y)
            } else {
                lerp(y1, y2, x1, x2, y)
            };
            self.fill_span(y, xa.min(xb), xa.max(xb), index);
        }
    }

    /// Fill `[xa, xb]` on row `y`, clipped to the buffer.
    #[inline]
    fn fill_span(&mut self, y: i32, xa: i32, xb: i32, index: u8) {
        let xa = xa.max(0);
        let xb = xb.min(self.width as i32 - 1);
        if xa > xb || y < 0 || y as u32 >= self.height {
            return;
        }
        let row = (y as usize) * (self.width as usize);
        self.pixels[row + xa as usize..=row + xb as usize].fill(index);
        self.pixels_dirty = true;
    }

    /// Fill a rectangle, clipped to the buffer, one bulk row write at a time.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, index: u8) {
        let x_start = (x as i64).max(0);
        let y_start = (y as i64).max(0);
        let x_end = (x as i64 + width as i64).min(self.width as i64);
        let y_end = (y as i64 + height as i64).min(self.height as i64);

        if x_start >= x_end || y_start >= y_end {
            return;
        }

        let stride = self.width as usize;
        for row in y_start as usize..y_end as usize {
            let offset = row * stride;
            self.pixels[offset + x_start as usize..offset + x_end as usize].fill(index);
        }
        self.pixels_dirty = true;
    }

    /// Set every pixel to `index`.
    pub fn clear(&mut self, index: u8) {
        self.pixels.fill(index);
        self.pixels_dirty = true;
    }

    /// Alias of [`IndexedFramebuffer::clear`].
    pub fn fill(&mut self, index: u8) {
        self.clear(index);
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_entry(&self, index: u8) -> Color {
        self.palette.get(index)
    }

    pub fn set_palette_entry(&mut self, index: u8, color: Color) {
        self.palette.set(index, color);
        self.palette_dirty = true;
    }

    pub fn set_palette(&mut self, palette: &Palette) {
        self.palette = palette.clone();
        self.palette_dirty = true;
    }

    pub fn set_palette_colors(&mut self, colors: &[Color; PALETTE_SIZE]) {
        self.palette = Palette::from(*colors);
        self.palette_dirty = true;
    }

    /// Cycle palette entries in `range`; pixels are untouched.
    pub fn rotate_palette(&mut self, range: Range<usize>, steps: isize) {
        self.palette.rotate(range, steps);
        self.palette_dirty = true;
    }

    pub fn pixels_dirty(&self) -> bool {
        self.pixels_dirty
    }

    pub fn palette_dirty(&self) -> bool {
        self.palette_dirty
    }

    pub fn mark_pixels_dirty(&mut self) {
        self.pixels_dirty = true;
    }

    pub fn mark_palette_dirty(&mut self) {
        self.palette_dirty = true;
    }

    /// Push whichever planes changed since their last upload.
    ///
    /// Each flag is cleared only after its own upload succeeds, so a failed
    /// palette upload does not lose a pending index-plane change or vice versa.
    pub fn upload_dirty(&mut self, uploader: &mut dyn TextureUploader) -> Result<UploadReport> {
        let mut report = UploadReport::default();
        if self.pixels_dirty {
            uploader.upload_indices(self.width, self.height, &self.pixels)?;
            self.pixels_dirty = false;
            report.indices = true;
        }
        if self.palette_dirty {
            uploader.upload_palette(&self.palette)?;
            self.palette_dirty = false;
            report.palette = true;
        }
        if report.indices || report.palette {
            tracing::trace!(
                indices = report.indices,
                palette = report.palette,
                "framebuffer uploaded"
            );
        }
        Ok(report)
    }

    /// Quantize-and-blit a decoded image with its top-left at `(dest_x, dest_y)`.
    ///
    /// Destination pixels outside the buffer are skipped. Returns how many
    /// pixels were written.
    pub fn blit_image(&mut self, image: &PixelImage, dest_x: i32, dest_y: i32, fit: PaletteFit) -> usize {
        if fit == PaletteFit::Quantize && image.pixels().len() > 1 {
            let quantized = median_cut(image.pixels(), PALETTE_SIZE);
            tracing::debug!(
                width = image.width(),
                height = image.height(),
                used = quantized.used,
                "fitted palette to image"
            );
            self.set_palette(&quantized.palette);
        }

        let mut written = 0usize;
        for sy in 0..image.height() {
            for sx in 0..image.width() {
                let dx = dest_x as i64 + sx as i64;
                let dy = dest_y as i64 + sy as i64;
                if dx < 0 || dy < 0 || dx >= self.width as i64 || dy >= self.height as i64 {
                    continue;
                }
                if let Some(color) = image.get(sx, sy) {
                    let index = nearest_index(&self.palette, color);
                    self.pixels[(dy as usize) * (self.width as usize) + dx as usize] = index;
                    written += 1;
                }
            }
        }
        if written > 0 {
            self.pixels_dirty = true;
        }
        written
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Display scale for chunky-pixel output.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// A clone is a new buffer: fresh id, nothing uploaded yet.
impl Clone for IndexedFramebuffer {
    fn clone(&self) -> Self {
        Self {
            id: BufferId::next(),
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
            palette: self.palette.clone(),
            pixels_dirty: true,
            palette_dirty: true,
            position: self.position,
            scale: self.scale,
            visible: self.visible,
        }
    }
}

impl Attachable for IndexedFramebuffer {
    fn render(&mut self, ctx: &mut dyn RenderContext, offset: Vec2, opacity: f32) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        let origin = self.position + offset;
        ctx.present_indexed(self, origin, opacity)
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
