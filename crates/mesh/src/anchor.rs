//! Attaching a mesh's render origin to another on-screen object.
//!
//! The mesh holds only a weak link to its target and re-resolves it every
//! frame. When the target is gone the result says so explicitly
//! ([`AnchorResolution::Detached`]) and carries the position the mesh falls
//! back to.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::types::{AnchorPoint, Vec2};

/// Something sprite-like that a mesh can be anchored to.
pub trait AnchorTarget {
    /// Top-left position on screen.
    fn position(&self) -> Vec2;

    /// Unscaled size, or `None` when the target has nothing to measure yet.
    fn size(&self) -> Option<Vec2>;

    fn scale(&self) -> Vec2 {
        Vec2::ONE
    }

    /// Screen position of `point` on this target's scaled bounding box.
    ///
    /// Targets without a size resolve every point to their position.
    fn anchor_position(&self, point: AnchorPoint) -> Vec2 {
        let pos = self.position();
        match self.size() {
            Some(size) => {
                let scale = self.scale();
                pos + point.offset(Vec2::new(size.x * scale.x, size.y * scale.y))
            }
            None => pos,
        }
    }
}

/// Minimal sprite-like box, enough to anchor meshes in demos and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteFrame {
    pub position: Vec2,
    pub size: Option<Vec2>,
    pub scale: Vec2,
}

impl SpriteFrame {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size: Some(size),
            scale: Vec2::ONE,
        }
    }
}

impl AnchorTarget for SpriteFrame {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn size(&self) -> Option<Vec2> {
        self.size
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }
}

/// Where the render origin comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    /// The renderable's own position.
    #[default]
    Viewport,
    /// A point on an external target plus an offset.
    Sprite,
}

/// Non-owning link to an anchor target.
#[derive(Clone)]
pub struct MeshAnchor {
    target: Weak<RefCell<dyn AnchorTarget>>,
    point: AnchorPoint,
    offset: Vec2,
}

impl std::fmt::Debug for MeshAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshAnchor")
            .field("alive", &(self.target.strong_count() > 0))
            .field("point", &self.point)
            .field("offset", &self.offset)
            .finish()
    }
}

impl MeshAnchor {
    pub fn new<T: AnchorTarget + 'static>(target: &Rc<RefCell<T>>, point: AnchorPoint, offset: Vec2) -> Self {
        let target: Rc<RefCell<dyn AnchorTarget>> = target.clone();
        Self {
            target: Rc::downgrade(&target),
            point,
            offset,
        }
    }

    pub fn point(&self) -> AnchorPoint {
        self.point
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Current anchor position, or `None` if the target was dropped or is
    /// mutably borrowed elsewhere.
    pub fn resolve(&self) -> Option<Vec2> {
        let target = self.target.upgrade()?;
        let target = target.try_borrow().ok()?;
        Some(target.anchor_position(self.point) + self.offset)
    }
}

/// Outcome of resolving a renderable's origin for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorResolution {
    /// Viewport mode: the renderable's own position.
    Viewport(Vec2),
    /// Sprite mode with a live target.
    Attached(Vec2),
    /// Sprite mode but the target is gone; the renderable's own position is used.
    Detached { fallback: Vec2 },
}

impl Default for AnchorResolution {
    fn default() -> Self {
        AnchorResolution::Viewport(Vec2::ZERO)
    }
}

impl AnchorResolution {
    pub fn origin(&self) -> Vec2 {
        match *self {
            AnchorResolution::Viewport(p) | AnchorResolution::Attached(p) => p,
            AnchorResolution::Detached { fallback } => fallback,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, AnchorResolution::Detached { .. })
    }
}
