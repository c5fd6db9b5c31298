//! Seams between drawable objects and the renderer backend.
//!
//! The backend owns whatever GPU (or terminal) resources mirror a
//! framebuffer. It sees a framebuffer as two independently updatable
//! resources: the raw index plane and the 256-entry palette.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::framebuffer::IndexedFramebuffer;
use crate::palette::Palette;
use crate::types::Vec2;

/// Receives the two planes of an indexed framebuffer.
pub trait TextureUploader {
    /// Replace the index plane (one byte per pixel, row-major).
    fn upload_indices(&mut self, width: u32, height: u32, indices: &[u8]) -> Result<()>;

    /// Replace the 256x1 palette resource.
    fn upload_palette(&mut self, palette: &Palette) -> Result<()>;
}

/// What a renderer exposes to attachables during a frame.
pub trait RenderContext {
    /// Current viewport size in pixels, used for auto-sized buffers.
    fn viewport_size(&self) -> (u32, u32);

    /// Sync the buffer's dirty planes and draw it at `origin`.
    fn present_indexed(
        &mut self,
        buffer: &mut IndexedFramebuffer,
        origin: Vec2,
        opacity: f32,
    ) -> Result<()>;
}

/// Anything that can be attached to a [`Layer`] and drawn once per frame.
pub trait Attachable {
    /// Draw into `ctx`. `offset` is the layer offset, `opacity` the layer opacity.
    fn render(&mut self, ctx: &mut dyn RenderContext, offset: Vec2, opacity: f32) -> Result<()>;

    fn is_visible(&self) -> bool;
}

/// Which planes an [`IndexedFramebuffer::upload_dirty`] call pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadReport {
    pub indices: bool,
    pub palette: bool,
}

/// Shared handle to an attachable, so the owner can keep mutating it.
pub type AttachableRef = Rc<RefCell<dyn Attachable>>;

/// Ordered group of attachables drawn with a common offset and opacity.
pub struct Layer {
    order: i32,
    offset: Vec2,
    opacity: f32,
    visible: bool,
    items: Vec<AttachableRef>,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Layer {
    pub fn new(order: i32) -> Self {
        Self {
            order,
            offset: Vec2::ZERO,
            opacity: 1.0,
            visible: true,
            items: Vec::new(),
        }
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Opacity is clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn attach(&mut self, item: AttachableRef) {
        self.items.push(item);
    }

    /// Remove `item` (compared by identity). Returns whether it was attached.
    pub fn detach(&mut self, item: &AttachableRef) -> bool {
        let before = self.items.len();
        self.items.retain(|it| !Rc::ptr_eq(it, item));
        before != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render every visible attachable in insertion order.
    pub fn render(&self, ctx: &mut dyn RenderContext) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        for item in &self.items {
            let mut item = item.borrow_mut();
            if item.is_visible() {
                item.render(ctx, self.offset, self.opacity)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        visible: bool,
        calls: Vec<(Vec2, f32)>,
    }

    impl Attachable for Probe {
        fn render(&mut self, _ctx: &mut dyn RenderContext, offset: Vec2, opacity: f32) -> Result<()> {
            self.calls.push((offset, opacity));
            Ok(())
        }

        fn is_visible(&self) -> bool {
            self.visible
        }
    }

    struct NullContext;

    impl RenderContext for NullContext {
        fn viewport_size(&self) -> (u32, u32) {
            (0, 0)
        }

        fn present_indexed(&mut self, _: &mut IndexedFramebuffer, _: Vec2, _: f32) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn layer_passes_offset_and_clamped_opacity() {
        let shown = Rc::new(RefCell::new(Probe {
            visible: true,
            calls: Vec::new(),
        }));
        let hidden = Rc::new(RefCell::new(Probe {
            visible: false,
            calls: Vec::new(),
        }));

        let mut layer = Layer::new(1);
        layer.set_offset(Vec2::new(3.0, 4.0));
        layer.set_opacity(2.0);
        layer.attach(shown.clone());
        layer.attach(hidden.clone());
        layer.render(&mut NullContext).unwrap();

        assert_eq!(shown.borrow().calls, vec![(Vec2::new(3.0, 4.0), 1.0)]);
        assert!(hidden.borrow().calls.is_empty());
    }

    #[test]
    fn detach_compares_identity() {
        let a: AttachableRef = Rc::new(RefCell::new(Probe {
            visible: true,
            calls: Vec::new(),
        }));
        let b: AttachableRef = Rc::new(RefCell::new(Probe {
            visible: true,
            calls: Vec::new(),
        }));
        let mut layer = Layer::default();
        layer.attach(a.clone());
        assert!(!layer.detach(&b));
        assert!(layer.detach(&a));
        assert!(layer.is_empty());
    }
}
