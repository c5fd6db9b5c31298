//! Mesh pipeline: culling, shading, projection, anchoring and the attachable path.

use std::cell::RefCell;
use std::rc::Rc;

use indexed_raster::core::{
    Attachable, AttachableRef, IndexedFramebuffer, Layer, RenderContext, Result,
};
use indexed_raster::mesh::{
    AnchorMode, AnchorResolution, BandTable, Extent, Mesh, MeshRenderable, Polygon, RenderMode,
    ShadeBands, SpriteFrame,
};
use indexed_raster::types::{AnchorPoint, Vec2, Vec3};

/// Context that records what was presented instead of drawing it.
struct RecordingContext {
    viewport: (u32, u32),
    presented: Vec<Presented>,
}

struct Presented {
    origin: Vec2,
    opacity: f32,
    size: (u32, u32),
    pixels: Vec<u8>,
    pixels_dirty: bool,
}

impl RecordingContext {
    fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            presented: Vec::new(),
        }
    }
}

impl RenderContext for RecordingContext {
    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn present_indexed(
        &mut self,
        buffer: &mut IndexedFramebuffer,
        origin: Vec2,
        opacity: f32,
    ) -> Result<()> {
        self.presented.push(Presented {
            origin,
            opacity,
            size: (buffer.width(), buffer.height()),
            pixels: buffer.pixels().to_vec(),
            pixels_dirty: buffer.pixels_dirty(),
        });
        Ok(())
    }
}

fn cube_at(rotation: Vec3) -> MeshRenderable {
    MeshRenderable::with_buffer_size(Mesh::cube(10.0), 160, 120)
        .with_position(Vec2::new(80.0, 60.0))
        .with_rotation(rotation)
}

fn count(fb: &IndexedFramebuffer, index: u8) -> usize {
    fb.pixels().iter().filter(|&&p| p == index).count()
}

#[test]
fn axis_aligned_cube_shows_only_its_camera_facing_face() {
    let mut cube = cube_at(Vec3::ZERO);
    let mut fb = IndexedFramebuffer::new(160, 120);
    let stats = cube.render_to_buffer(&mut fb);

    // Side faces are edge-on (intensity exactly 0) and cull with the back face.
    assert_eq!(stats.drawn, 1);
    assert_eq!(stats.culled, 5);
    assert_eq!(count(&fb, 2), fb.pixels().len() - count(&fb, 0));
    assert!(count(&fb, 2) > 0);
}

#[test]
fn tilted_cube_shows_three_faces() {
    let mut cube = cube_at(Vec3::new(0.5, 0.6, 0.0));
    let mut fb = IndexedFramebuffer::new(160, 120);
    let stats = cube.render_to_buffer(&mut fb);

    assert_eq!(stats.drawn, 3);
    assert_eq!(stats.culled, 3);
    assert_eq!(stats.skipped + stats.unshaded, 0);
    // Base 2 lit bright, bases 4 and 5 in the medium band (+7).
    assert!(count(&fb, 2) > 0);
    assert!(count(&fb, 11) > 0);
    assert!(count(&fb, 12) > 0);
}

#[test]
fn culling_off_draws_every_face() {
    let mut cube = cube_at(Vec3::new(0.5, 0.6, 0.0));
    cube.set_back_face_culling(false);
    let mut fb = IndexedFramebuffer::new(160, 120);
    let stats = cube.render_to_buffer(&mut fb);
    assert_eq!(stats.drawn, 6);
    assert_eq!(stats.culled, 0);
}

#[test]
fn wireframe_leaves_face_interior_empty() {
    let mut cube = cube_at(Vec3::ZERO).with_render_mode(RenderMode::Wireframe);
    let mut fb = IndexedFramebuffer::new(160, 120);
    let stats = cube.render_to_buffer(&mut fb);

    assert_eq!(stats.drawn, 1);
    assert_eq!(fb.get_pixel(80, 60), 0);
    assert!(count(&fb, 2) > 0);
}

#[test]
fn custom_band_table_redirects_shades() {
    let mut bands = BandTable::empty();
    for base in 1..=6u8 {
        bands.set(
            base,
            ShadeBands {
                bright: 100 + base,
                medium: 110 + base,
                dark: 120 + base,
            },
        );
    }
    let mut cube = cube_at(Vec3::ZERO).with_band_table(bands);
    let mut fb = IndexedFramebuffer::new(160, 120);
    cube.render_to_buffer(&mut fb);
    assert!(count(&fb, 102) > 0);
    assert_eq!(count(&fb, 2), 0);
}

#[test]
fn unmapped_bases_are_reported_not_drawn() {
    let mut cube = cube_at(Vec3::new(0.5, 0.6, 0.0)).with_band_table(BandTable::empty());
    let mut fb = IndexedFramebuffer::new(160, 120);
    let stats = cube.render_to_buffer(&mut fb);
    assert_eq!(stats.drawn, 0);
    assert_eq!(stats.unshaded, 3);
    assert_eq!(count(&fb, 0), fb.pixels().len());
    assert_eq!(cube.last_stats(), stats);
}

#[test]
fn fan_triangulates_polygons_with_many_vertices() {
    // Regular hexagon, wound clockwise so it faces the camera.
    let mut mesh = Mesh::new();
    let ring: Vec<usize> = (0..6)
        .rev()
        .map(|k| {
            let a = k as f32 * std::f32::consts::PI / 3.0;
            mesh.add_vertex(Vec3::new(a.cos() * 5.0, a.sin() * 5.0, 0.0))
        })
        .collect();
    mesh.add_polygon(Polygon::new(ring, 3)).unwrap();

    let mut r = MeshRenderable::with_buffer_size(mesh, 100, 100).with_position(Vec2::new(50.0, 50.0));
    let mut fb = IndexedFramebuffer::new(100, 100);
    let stats = r.render_to_buffer(&mut fb);
    assert_eq!(stats.drawn, 1);
    assert_eq!(fb.get_pixel(50, 50), 3);
}

#[test]
fn fov_round_trip() {
    let mut r = MeshRenderable::new(Mesh::cube(1.0));
    r.set_fov(60.0);
    assert!((r.fov() - 60.0).abs() < 1e-3);
    r.set_fov(90.0);
    assert!((r.focal_length() - 600.0).abs() < 1e-2);
}

#[test]
fn update_scales_auto_rotation_by_elapsed_time() {
    let mut r = MeshRenderable::new(Mesh::cube(1.0)).with_auto_rotation(Vec3::new(0.5, 1.0, 2.0));
    r.update(0.5);
    r.update(0.5);
    assert_eq!(r.rotation(), Vec3::new(0.5, 1.0, 2.0));
}

#[test]
fn anchored_mesh_follows_target_then_detaches() {
    let sprite = Rc::new(RefCell::new(SpriteFrame::new(
        Vec2::new(10.0, 20.0),
        Vec2::new(30.0, 40.0),
    )));
    let mut r = MeshRenderable::new(Mesh::cube(1.0)).with_position(Vec2::new(5.0, 5.0));
    r.anchor_to(&sprite, AnchorPoint::BottomRight, Vec2::new(1.0, -1.0));
    assert_eq!(r.anchor_mode(), AnchorMode::Sprite);
    assert_eq!(r.resolve_anchor(), AnchorResolution::Attached(Vec2::new(41.0, 59.0)));

    sprite.borrow_mut().position = Vec2::ZERO;
    assert_eq!(r.resolve_anchor(), AnchorResolution::Attached(Vec2::new(31.0, 39.0)));

    drop(sprite);
    let resolution = r.resolve_anchor();
    assert!(resolution.is_detached());
    assert_eq!(resolution.origin(), Vec2::new(5.0, 5.0));

    let mut fb = IndexedFramebuffer::new(16, 16);
    let stats = r.render_to_buffer(&mut fb);
    assert!(stats.anchor.is_detached());

    r.clear_anchor();
    assert_eq!(r.resolve_anchor(), AnchorResolution::Viewport(Vec2::new(5.0, 5.0)));
}

#[test]
fn attachable_render_clears_sizes_and_presents() {
    let mesh = Rc::new(RefCell::new(
        MeshRenderable::new(Mesh::cube(40.0))
            .with_position(Vec2::new(40.0, 30.0))
            .with_rotation(Vec3::new(0.5, 0.6, 0.0)),
    ));
    mesh.borrow_mut().buffer_mut().fill(77);

    let mut layer = Layer::new(3);
    layer.set_offset(Vec2::new(2.0, 4.0));
    layer.set_opacity(0.5);
    layer.attach(mesh.clone() as AttachableRef);

    let mut ctx = RecordingContext::new(80, 60);
    layer.render(&mut ctx).unwrap();

    assert_eq!(ctx.presented.len(), 1);
    let shot = &ctx.presented[0];
    assert_eq!(shot.size, (80, 60));
    assert_eq!(shot.origin, Vec2::new(2.0, 4.0));
    assert_eq!(shot.opacity, 0.5);
    assert!(shot.pixels_dirty);
    assert!(!shot.pixels.contains(&77));
    assert_eq!(mesh.borrow().last_stats().drawn, 3);
}

#[test]
fn fixed_extent_ignores_viewport() {
    let mut r = MeshRenderable::new(Mesh::cube(10.0));
    r.set_buffer_size(Extent::Fixed(32), Extent::Auto);
    let mut ctx = RecordingContext::new(200, 100);
    r.render(&mut ctx, Vec2::ZERO, 1.0).unwrap();
    assert_eq!(ctx.presented[0].size, (32, 100));
}

#[test]
fn hidden_renderable_presents_nothing() {
    let mut r = MeshRenderable::new(Mesh::cube(10.0));
    r.set_visible(false);
    assert!(!r.is_visible());
    let mut ctx = RecordingContext::new(10, 10);
    r.render(&mut ctx, Vec2::ZERO, 1.0).unwrap();
    assert!(ctx.presented.is_empty());
}
