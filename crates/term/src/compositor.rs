//! Compositor: the terminal's stand-in for GPU textures and a sprite batch.
//!
//! Each presented [`IndexedFramebuffer`] syncs its dirty planes into a
//! per-buffer [`Texture`]; the texture is then resolved through its palette
//! and blended onto an RGB canvas. The canvas has two pixel rows per
//! terminal row and is folded into half-block cells at the end of a frame.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use indexed_raster_core::{
    BufferId, IndexedFramebuffer, Palette, RasterError, RenderContext, TextureUploader,
};

use crate::fb::{Cell, FrameBuffer, Rgb};
use crate::types::Vec2;

/// Upload counters, mostly for tests and the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadCounters {
    pub indices: u64,
    pub palette: u64,
}

/// Backend copy of one framebuffer: index plane plus palette.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    width: u32,
    height: u32,
    indices: Vec<u8>,
    palette: Palette,
    counters: UploadCounters,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn counters(&self) -> UploadCounters {
        self.counters
    }

    /// Resolved color at `(x, y)`, if inside the texture.
    pub fn sample(&self, x: u32, y: u32) -> Option<crate::types::Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize) * (self.width as usize) + (x as usize);
        self.indices.get(i).map(|&idx| self.palette.get(idx))
    }
}

impl TextureUploader for Texture {
    fn upload_indices(
        &mut self,
        width: u32,
        height: u32,
        indices: &[u8],
    ) -> indexed_raster_core::Result<()> {
        let expected = (width as usize) * (height as usize);
        if indices.len() != expected {
            return Err(RasterError::Upload(format!(
                "index plane is {} bytes, expected {expected} for {width}x{height}",
                indices.len()
            )));
        }
        self.width = width;
        self.height = height;
        self.indices.clear();
        self.indices.extend_from_slice(indices);
        self.counters.indices += 1;
        Ok(())
    }

    fn upload_palette(&mut self, palette: &Palette) -> indexed_raster_core::Result<()> {
        self.palette = palette.clone();
        self.counters.palette += 1;
        Ok(())
    }
}

/// RGB canvas plus the textures presented into it.
#[derive(Debug)]
pub struct Compositor {
    width: u32,
    height: u32,
    canvas: Vec<Rgb>,
    background: Rgb,
    textures: HashMap<BufferId, Texture>,
    presented: Vec<BufferId>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Compositor {
    /// Canvas of `width x height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            canvas: vec![Rgb::default(); (width as usize) * (height as usize)],
            background: Rgb::default(),
            textures: HashMap::new(),
            presented: Vec::new(),
        }
    }

    /// Canvas sized for a terminal of `cols x rows` cells.
    pub fn for_terminal(cols: u16, rows: u16) -> Self {
        Self::new(cols as u32, rows as u32 * 2)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    /// Start a frame: resize to `cols x rows` cells and clear to the background.
    pub fn begin_frame(&mut self, cols: u16, rows: u16) {
        let (w, h) = (cols as u32, rows as u32 * 2);
        if (w, h) != (self.width, self.height) {
            tracing::debug!(width = w, height = h, "compositor canvas resized");
            self.width = w;
            self.height = h;
            self.canvas.resize((w as usize) * (h as usize), self.background);
        }
        self.canvas.fill(self.background);
        self.presented.clear();
    }

    /// Finish a frame: drop textures nothing presented and fold the canvas into `cells`.
    pub fn end_frame(&mut self, cells: &mut FrameBuffer) {
        let presented = &self.presented;
        let before = self.textures.len();
        self.textures.retain(|id, _| presented.contains(id));
        if self.textures.len() < before {
            tracing::trace!(evicted = before - self.textures.len(), "dropped stale textures");
        }

        let cols = self.width.min(u16::MAX as u32) as u16;
        let rows = (self.height / 2).min(u16::MAX as u32) as u16;
        cells.resize(cols, rows);
        for y in 0..rows {
            for x in 0..cols {
                let upper = self.pixel(x as u32, y as u32 * 2).unwrap_or(self.background);
                let lower = self.pixel(x as u32, y as u32 * 2 + 1).unwrap_or(self.background);
                cells.set(x, y, Cell::half_block(upper, lower));
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.canvas[(y as usize) * (self.width as usize) + (x as usize)])
    }

    pub fn texture(&self, id: BufferId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Blend `texture` onto the canvas with its top-left at `origin`, scaled by `scale`.
    fn draw_texture(canvas: &mut [Rgb], size: (u32, u32), texture: &Texture, origin: Vec2, scale: f32, opacity: f32) {
        if scale <= 0.0 || opacity <= 0.0 {
            return;
        }
        let (cw, ch) = size;
        let x0 = origin.x.floor().max(0.0) as u32;
        let y0 = origin.y.floor().max(0.0) as u32;
        let x1 = (origin.x + texture.width as f32 * scale).ceil().clamp(0.0, cw as f32) as u32;
        let y1 = (origin.y + texture.height as f32 * scale).ceil().clamp(0.0, ch as f32) as u32;

        for py in y0..y1 {
            let ty = ((py as f32 - origin.y) / scale).floor();
            if ty < 0.0 {
                continue;
            }
            for px in x0..x1 {
                let tx = ((px as f32 - origin.x) / scale).floor();
                if tx < 0.0 {
                    continue;
                }
                let Some(color) = texture.sample(tx as u32, ty as u32) else {
                    continue;
                };
                let alpha = color.a as f32 / 255.0 * opacity;
                if alpha <= 0.0 {
                    continue;
                }
                let dst = &mut canvas[(py as usize) * (cw as usize) + (px as usize)];
                *dst = dst.blend(Rgb::from(color), alpha);
            }
        }
    }
}

impl RenderContext for Compositor {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present_indexed(
        &mut self,
        buffer: &mut IndexedFramebuffer,
        origin: Vec2,
        opacity: f32,
    ) -> indexed_raster_core::Result<()> {
        let id = buffer.id();
        let texture = match self.textures.entry(id) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                // New or evicted: the buffer's flags only describe the old texture.
                buffer.mark_pixels_dirty();
                buffer.mark_palette_dirty();
                slot.insert(Texture::default())
            }
        };
        buffer.upload_dirty(texture)?;
        if !self.presented.contains(&id) {
            self.presented.push(id);
        }
        Self::draw_texture(
            &mut self.canvas,
            (self.width, self.height),
            texture,
            origin,
            buffer.scale(),
            opacity,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn palette_change_uploads_only_palette() {
        let mut comp = Compositor::new(4, 4);
        let mut fb = IndexedFramebuffer::new(2, 2);
        fb.set_pixel(0, 0, 9);

        comp.begin_frame(4, 2);
        comp.present_indexed(&mut fb, Vec2::ZERO, 1.0).unwrap();
        fb.set_palette_entry(9, Color::rgb(255, 0, 0));
        comp.present_indexed(&mut fb, Vec2::ZERO, 1.0).unwrap();
        comp.present_indexed(&mut fb, Vec2::ZERO, 1.0).unwrap();

        let counters = comp.texture(fb.id()).map(Texture::counters).unwrap();
        assert_eq!(counters, UploadCounters { indices: 1, palette: 2 });
        assert_eq!(comp.pixel(0, 0), Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn buffers_get_separate_textures() {
        let mut comp = Compositor::new(4, 2);
        let mut a = IndexedFramebuffer::new(1, 1);
        let mut b = IndexedFramebuffer::new(1, 1);
        a.set_pixel(0, 0, 255);

        comp.begin_frame(4, 1);
        comp.present_indexed(&mut a, Vec2::ZERO, 1.0).unwrap();
        comp.present_indexed(&mut b, Vec2::new(2.0, 0.0), 1.0).unwrap();
        assert_eq!(comp.texture_count(), 2);
        assert_eq!(comp.pixel(0, 0), Some(Rgb::new(255, 255, 255)));
        assert_eq!(comp.pixel(2, 0), Some(Rgb::new(0, 0, 0)));

        let mut cells = FrameBuffer::new(0, 0);
        comp.begin_frame(4, 1);
        comp.present_indexed(&mut a, Vec2::ZERO, 1.0).unwrap();
        comp.end_frame(&mut cells);
        assert_eq!(comp.texture_count(), 1);
    }

    #[test]
    fn buffer_reappears_after_a_skipped_frame() {
        let mut comp = Compositor::new(1, 2);
        let mut cells = FrameBuffer::new(0, 0);
        let mut fb = IndexedFramebuffer::new(1, 1);
        fb.set_pixel(0, 0, 255);

        comp.begin_frame(1, 1);
        comp.present_indexed(&mut fb, Vec2::ZERO, 1.0).unwrap();
        comp.end_frame(&mut cells);

        comp.begin_frame(1, 1);
        comp.end_frame(&mut cells);
        assert!(comp.texture(fb.id()).is_none());

        comp.begin_frame(1, 1);
        comp.present_indexed(&mut fb, Vec2::ZERO, 1.0).unwrap();
        assert_eq!(comp.pixel(0, 0), Some(Rgb::new(255, 255, 255)));
        let texture = comp.texture(fb.id()).unwrap();
        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.counters(), UploadCounters { indices: 1, palette: 1 });
        assert!(!fb.pixels_dirty() && !fb.palette_dirty());
    }

    #[test]
    fn scale_and_opacity() {
        let mut comp = Compositor::new(4, 4);
        let mut fb = IndexedFramebuffer::new(1, 1);
        fb.set_pixel(0, 0, 200);
        fb.set_scale(2.0);

        comp.begin_frame(4, 2);
        comp.present_indexed(&mut fb, Vec2::new(1.0, 1.0), 0.5).unwrap();
        assert_eq!(comp.pixel(0, 0), Some(Rgb::new(0, 0, 0)));
        assert_eq!(comp.pixel(1, 1), Some(Rgb::new(100, 100, 100)));
        assert_eq!(comp.pixel(2, 2), Some(Rgb::new(100, 100, 100)));
        assert_eq!(comp.pixel(3, 3), Some(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn end_frame_folds_pixel_rows_into_half_blocks() {
        let mut comp = Compositor::for_terminal(1, 1);
        let mut fb = IndexedFramebuffer::new(1, 2);
        fb.set_pixel(0, 0, 255);

        comp.begin_frame(1, 1);
        comp.present_indexed(&mut fb, Vec2::ZERO, 1.0).unwrap();
        let mut cells = FrameBuffer::new(0, 0);
        comp.end_frame(&mut cells);

        let cell = cells.get(0, 0).unwrap();
        assert_eq!(cell.ch, '▀');
        assert_eq!(cell.style.fg, Rgb::new(255, 255, 255));
        assert_eq!(cell.style.bg, Rgb::new(0, 0, 0));
    }

    #[test]
    fn short_index_plane_is_rejected() {
        let mut t = Texture::default();
        assert!(t.upload_indices(2, 2, &[0, 1, 2]).is_err());
        assert_eq!(t.counters().indices, 0);
    }
}
