//! MeshRenderable: transforms, culls, shades and rasterizes a mesh every frame.
//!
//! Per frame, for every polygon:
//!
//! 1. vertices are scaled, then rotated about X, Y, Z; normals are rotated and re-normalized
//! 2. the face normal is the polygon's first supplied normal, or the cross product
//!    of its first two edges
//! 3. `intensity = normal . (0, 0, -1)`; with culling on, `intensity <= 0` skips the face
//! 4. the [`BandTable`] turns base color + intensity into a palette index
//! 5. vertices are perspective-projected around the anchor origin
//! 6. the polygon is fan-filled or outlined into the framebuffer
//!
//! The renderable owns its framebuffer and clears it to index 0 before every
//! pass; there is no double buffering.

use std::cell::RefCell;
use std::rc::Rc;

use indexed_raster_core::{Attachable, IndexedFramebuffer, RenderContext};

use crate::anchor::{AnchorMode, AnchorResolution, AnchorTarget, MeshAnchor};
use crate::lighting::BandTable;
use crate::mesh::Mesh;
use crate::transform::{EulerRotation, Projection};
use crate::types::{AnchorPoint, Vec2, Vec3, FALLBACK_BUFFER_HEIGHT, FALLBACK_BUFFER_WIDTH};

/// Filled polygons or edge outlines. Both honor back-face culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Filled,
    Wireframe,
}

/// Target size of one buffer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extent {
    /// Follow the renderer's viewport.
    #[default]
    Auto,
    Fixed(u32),
}

impl Extent {
    /// `0` means "follow the viewport".
    pub fn from_len(len: u32) -> Self {
        if len == 0 {
            Extent::Auto
        } else {
            Extent::Fixed(len)
        }
    }

    fn resolve(self, viewport: u32) -> u32 {
        match self {
            Extent::Auto => viewport,
            Extent::Fixed(n) => n,
        }
    }
}

/// Counters from one rasterization pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStats {
    /// Polygons rasterized.
    pub drawn: usize,
    /// Polygons rejected by back-face culling.
    pub culled: usize,
    /// Degenerate polygons (fewer than 3 vertices or dangling indices).
    pub skipped: usize,
    /// Polygons whose base color has no lighting band entry.
    pub unshaded: usize,
    /// How the render origin was resolved.
    pub anchor: AnchorResolution,
}

#[derive(Debug, Default)]
struct Scratch {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    projected: Vec<(i32, i32)>,
}

#[derive(Debug, Clone, Copy)]
struct FrameParams {
    origin: Vec2,
    rotation: Vec3,
    scale: f32,
    projection: Projection,
    mode: RenderMode,
    cull: bool,
}

/// A mesh plus the transform state and framebuffer used to draw it.
#[derive(Debug)]
pub struct MeshRenderable {
    mesh: Mesh,
    position: Vec2,
    rotation: Vec3,
    scale: f32,
    auto_rotation: Vec3,
    projection: Projection,
    render_mode: RenderMode,
    back_face_culling: bool,
    anchor_mode: AnchorMode,
    anchor: Option<MeshAnchor>,
    bands: BandTable,
    visible: bool,

    buffer: IndexedFramebuffer,
    buffer_width: Extent,
    buffer_height: Extent,

    scratch: Scratch,
    last_stats: RenderStats,
    warned_detached: bool,
    warned_unshaded: bool,
}

impl MeshRenderable {
    /// Renderable whose buffer follows the viewport size.
    pub fn new(mesh: Mesh) -> Self {
        Self::with_buffer_size(mesh, 0, 0)
    }

    /// Renderable with a fixed buffer size; a zero dimension follows the viewport.
    pub fn with_buffer_size(mesh: Mesh, width: u32, height: u32) -> Self {
        let buffer_width = Extent::from_len(width);
        let buffer_height = Extent::from_len(height);
        let buffer = IndexedFramebuffer::new(
            buffer_width.resolve(FALLBACK_BUFFER_WIDTH),
            buffer_height.resolve(FALLBACK_BUFFER_HEIGHT),
        );
        Self {
            mesh,
            position: Vec2::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            auto_rotation: Vec3::ZERO,
            projection: Projection::default(),
            render_mode: RenderMode::Filled,
            back_face_culling: true,
            anchor_mode: AnchorMode::Viewport,
            anchor: None,
            bands: BandTable::default(),
            visible: true,
            buffer,
            buffer_width,
            buffer_height,
            scratch: Scratch::default(),
            last_stats: RenderStats::default(),
            warned_detached: false,
            warned_unshaded: false,
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_auto_rotation(mut self, speed: Vec3) -> Self {
        self.auto_rotation = speed;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    pub fn with_band_table(mut self, bands: BandTable) -> Self {
        self.bands = bands;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Euler angles in radians. Never wrapped.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Angular velocity per axis, radians per second.
    pub fn auto_rotation(&self) -> Vec3 {
        self.auto_rotation
    }

    pub fn set_auto_rotation(&mut self, speed: Vec3) {
        self.auto_rotation = speed;
    }

    pub fn focal_length(&self) -> f32 {
        self.projection.focal_length
    }

    pub fn set_focal_length(&mut self, focal_length: f32) {
        self.projection.focal_length = focal_length;
    }

    pub fn camera_distance(&self) -> f32 {
        self.projection.camera_distance
    }

    pub fn set_camera_distance(&mut self, distance: f32) {
        self.projection.camera_distance = distance;
    }

    /// Set the focal length from a field of view in degrees.
    pub fn set_fov(&mut self, degrees: f32) {
        self.projection.set_fov(degrees);
    }

    /// Field of view in degrees implied by the current focal length.
    pub fn fov(&self) -> f32 {
        self.projection.fov()
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    pub fn back_face_culling(&self) -> bool {
        self.back_face_culling
    }

    pub fn set_back_face_culling(&mut self, enabled: bool) {
        self.back_face_culling = enabled;
    }

    pub fn band_table(&self) -> &BandTable {
        &self.bands
    }

    pub fn set_band_table(&mut self, bands: BandTable) {
        self.bands = bands;
        self.warned_unshaded = false;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn anchor_mode(&self) -> AnchorMode {
        self.anchor_mode
    }

    pub fn set_anchor_mode(&mut self, mode: AnchorMode) {
        self.anchor_mode = mode;
    }

    /// Anchor the render origin to `point` on `target`, plus `offset`.
    ///
    /// Only a weak link is kept; switches the anchor mode to `Sprite`.
    pub fn anchor_to<T: AnchorTarget + 'static>(
        &mut self,
        target: &Rc<RefCell<T>>,
        point: AnchorPoint,
        offset: Vec2,
    ) {
        self.anchor = Some(MeshAnchor::new(target, point, offset));
        self.anchor_mode = AnchorMode::Sprite;
        self.warned_detached = false;
    }

    /// Drop the anchor link and return to viewport mode.
    pub fn clear_anchor(&mut self) {
        self.anchor = None;
        self.anchor_mode = AnchorMode::Viewport;
    }

    pub fn anchor(&self) -> Option<&MeshAnchor> {
        self.anchor.as_ref()
    }

    /// Resolve this frame's render origin.
    pub fn resolve_anchor(&self) -> AnchorResolution {
        match self.anchor_mode {
            AnchorMode::Viewport => AnchorResolution::Viewport(self.position),
            AnchorMode::Sprite => match self.anchor.as_ref().and_then(MeshAnchor::resolve) {
                Some(origin) => AnchorResolution::Attached(origin),
                None => AnchorResolution::Detached {
                    fallback: self.position,
                },
            },
        }
    }

    /// Accumulate auto-rotation. Angles grow without wrapping.
    pub fn update(&mut self, delta_time: f32) {
        self.rotation = self.rotation + self.auto_rotation * delta_time;
    }

    pub fn buffer(&self) -> &IndexedFramebuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut IndexedFramebuffer {
        &mut self.buffer
    }

    /// Configured width, or the current buffer width when following the viewport.
    pub fn buffer_width(&self) -> u32 {
        self.buffer_width.resolve(self.buffer.width())
    }

    pub fn buffer_height(&self) -> u32 {
        self.buffer_height.resolve(self.buffer.height())
    }

    /// Change the target buffer size; `Auto` axes resize on the next render.
    pub fn set_buffer_size(&mut self, width: Extent, height: Extent) {
        self.buffer_width = width;
        self.buffer_height = height;
        let (w, h) = (self.buffer.width(), self.buffer.height());
        self.ensure_buffer((w, h));
    }

    /// Resize the owned buffer to match the configured extents and `viewport`.
    ///
    /// A recreated buffer keeps the previous palette.
    pub fn ensure_buffer(&mut self, viewport: (u32, u32)) {
        let width = self.buffer_width.resolve(viewport.0);
        let height = self.buffer_height.resolve(viewport.1);
        if self.buffer.width() == width && self.buffer.height() == height {
            return;
        }
        tracing::debug!(width, height, "resizing mesh framebuffer");
        let mut buffer = IndexedFramebuffer::new(width, height);
        buffer.set_palette(self.buffer.palette());
        buffer.set_position(self.buffer.position());
        buffer.set_scale(self.buffer.scale());
        self.buffer = buffer;
    }

    /// Counters from the most recent pass.
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Rasterize into a caller-supplied buffer without clearing it.
    pub fn render_to_buffer(&mut self, buffer: &mut IndexedFramebuffer) -> RenderStats {
        if !self.visible {
            return RenderStats::default();
        }
        let params = self.begin_frame();
        let stats = rasterize(&self.mesh, &self.bands, params, &mut self.scratch, buffer);
        self.finish_frame(stats)
    }

    fn begin_frame(&mut self) -> FrameParams {
        let anchor = self.resolve_anchor();
        match anchor {
            AnchorResolution::Detached { fallback } if !self.warned_detached => {
                tracing::warn!(
                    x = fallback.x,
                    y = fallback.y,
                    "mesh anchor target is gone; using own position"
                );
                self.warned_detached = true;
            }
            AnchorResolution::Attached(_) => self.warned_detached = false,
            _ => {}
        }
        self.last_stats.anchor = anchor;
        FrameParams {
            origin: anchor.origin(),
            rotation: self.rotation,
            scale: self.scale,
            projection: self.projection,
            mode: self.render_mode,
            cull: self.back_face_culling,
        }
    }

    fn finish_frame(&mut self, mut stats: RenderStats) -> RenderStats {
        stats.anchor = self.last_stats.anchor;
        let unshaded = stats.unshaded > 0;
        if unshaded && !self.warned_unshaded {
            tracing::warn!(
                count = stats.unshaded,
                "polygons skipped: base color has no lighting bands"
            );
        }
        self.warned_unshaded = unshaded;
        tracing::debug!(
            drawn = stats.drawn,
            culled = stats.culled,
            skipped = stats.skipped,
            "mesh pass"
        );
        self.last_stats = stats;
        stats
    }
}

impl Attachable for MeshRenderable {
    fn render(
        &mut self,
        ctx: &mut dyn RenderContext,
        offset: Vec2,
        opacity: f32,
    ) -> indexed_raster_core::Result<()> {
        if !self.visible {
            return Ok(());
        }
        self.ensure_buffer(ctx.viewport_size());
        self.buffer.clear(0);

        let params = self.begin_frame();
        let stats = rasterize(&self.mesh, &self.bands, params, &mut self.scratch, &mut self.buffer);
        self.finish_frame(stats);

        let origin = self.buffer.position() + offset;
        ctx.present_indexed(&mut self.buffer, origin, opacity)
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

fn rasterize(
    mesh: &Mesh,
    bands: &BandTable,
    params: FrameParams,
    scratch: &mut Scratch,
    buffer: &mut IndexedFramebuffer,
) -> RenderStats {
    let mut stats = RenderStats::default();
    if mesh.is_empty() {
        return stats;
    }

    let rotation = EulerRotation::new(params.rotation);

    scratch.vertices.clear();
    scratch
        .vertices
        .extend(mesh.vertices().iter().map(|v| rotation.apply(*v * params.scale)));

    scratch.normals.clear();
    scratch
        .normals
        .extend(mesh.normals().iter().map(|n| rotation.apply(*n).normalized()));

    scratch.projected.clear();
    scratch.projected.extend(
        scratch
            .vertices
            .iter()
            .map(|p| params.projection.project(*p, params.origin)),
    );

    for poly in mesh.polygons() {
        let idx = &poly.vertices;
        if idx.len() < 3 || idx.iter().any(|&i| i >= scratch.vertices.len()) {
            stats.skipped += 1;
            continue;
        }

        let normal = match poly.normals.first().and_then(|&n| scratch.normals.get(n)) {
            Some(n) => *n,
            None => {
                let v0 = scratch.vertices[idx[0]];
                let v1 = scratch.vertices[idx[1]];
                let v2 = scratch.vertices[idx[2]];
                (v1 - v0).cross(v2 - v0).normalized()
            }
        };

        let intensity = normal.dot(Vec3::VIEW_DIRECTION);
        if params.cull && intensity <= 0.0 {
            stats.culled += 1;
            continue;
        }

        let Some(color) = bands.shade(poly.color, intensity) else {
            stats.unshaded += 1;
            continue;
        };

        let p = |k: usize| scratch.projected[idx[k]];
        match params.mode {
            RenderMode::Filled => {
                let (ax, ay) = p(0);
                for k in 1..idx.len() - 1 {
                    let (bx, by) = p(k);
                    let (cx, cy) = p(k + 1);
                    buffer.fill_triangle(ax, ay, bx, by, cx, cy, color);
                }
            }
            RenderMode::Wireframe => {
                for k in 0..idx.len() {
                    let (x0, y0) = p(k);
                    let (x1, y1) = p((k + 1) % idx.len());
                    buffer.draw_line(x0, y0, x1, y1, color);
                }
            }
        }
        stats.drawn += 1;
    }

    stats
}
