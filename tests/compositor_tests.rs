//! Layers presented through the terminal compositor.

use std::cell::RefCell;
use std::rc::Rc;

use indexed_raster::core::{AttachableRef, IndexedFramebuffer, Layer, Palette};
use indexed_raster::mesh::{Mesh, MeshRenderable};
use indexed_raster::term::{Compositor, FrameBuffer, Rgb, UploadCounters};
use indexed_raster::types::{Color, Vec2, Vec3};

fn shared(fb: IndexedFramebuffer) -> Rc<RefCell<IndexedFramebuffer>> {
    Rc::new(RefCell::new(fb))
}

#[test]
fn palette_cycling_uploads_only_the_palette() {
    let backdrop = shared(IndexedFramebuffer::new(8, 4));
    {
        let mut fb = backdrop.borrow_mut();
        fb.set_palette(&Palette::rainbow());
        for x in 0..8 {
            fb.draw_line(x, 0, x, 3, x as u8 + 1);
        }
    }
    let mut layer = Layer::new(0);
    layer.attach(backdrop.clone() as AttachableRef);

    let mut comp = Compositor::default();
    let mut cells = FrameBuffer::new(0, 0);
    for _ in 0..5 {
        comp.begin_frame(8, 2);
        backdrop.borrow_mut().rotate_palette(1..9, 1);
        layer.render(&mut comp).unwrap();
        comp.end_frame(&mut cells);
    }

    let id = backdrop.borrow().id();
    let counters = comp.texture(id).map(|t| t.counters()).unwrap();
    assert_eq!(counters, UploadCounters { indices: 1, palette: 5 });
    assert_eq!((cells.width(), cells.height()), (8, 2));
}

#[test]
fn hidden_layer_draws_nothing() {
    let fb = shared(IndexedFramebuffer::new(2, 2));
    fb.borrow_mut().clear(255);

    let mut layer = Layer::new(0);
    layer.attach(fb.clone() as AttachableRef);
    layer.set_visible(false);

    let mut comp = Compositor::new(2, 2);
    comp.begin_frame(2, 1);
    layer.render(&mut comp).unwrap();
    assert_eq!(comp.pixel(0, 0), Some(Rgb::new(0, 0, 0)));
    assert_eq!(comp.texture_count(), 0);
}

#[test]
fn layer_shown_again_redraws_unchanged_buffer() {
    let fb = shared(IndexedFramebuffer::new(2, 2));
    fb.borrow_mut().clear(255);
    let mut layer = Layer::new(0);
    layer.attach(fb.clone() as AttachableRef);

    let mut comp = Compositor::default();
    let mut cells = FrameBuffer::new(0, 0);
    for visible in [true, false, true] {
        layer.set_visible(visible);
        comp.begin_frame(2, 1);
        layer.render(&mut comp).unwrap();
        comp.end_frame(&mut cells);
    }

    assert_eq!(comp.pixel(1, 1), Some(Rgb::new(255, 255, 255)));
    assert_eq!(comp.texture_count(), 1);
}

#[test]
fn detached_item_stops_rendering() {
    let fb = shared(IndexedFramebuffer::new(1, 1));
    fb.borrow_mut().clear(255);
    let item: AttachableRef = fb.clone();

    let mut layer = Layer::new(0);
    layer.attach(item.clone());
    assert_eq!(layer.len(), 1);
    assert!(layer.detach(&item));
    assert!(layer.is_empty());

    let mut comp = Compositor::new(1, 2);
    comp.begin_frame(1, 1);
    layer.render(&mut comp).unwrap();
    assert_eq!(comp.pixel(0, 0), Some(Rgb::new(0, 0, 0)));
}

#[test]
fn transparent_index_lets_lower_layers_through() {
    let back = shared(IndexedFramebuffer::new(4, 4));
    back.borrow_mut().clear(200);

    let front = shared(IndexedFramebuffer::new(4, 4));
    {
        let mut fb = front.borrow_mut();
        fb.set_palette_entry(0, Color::TRANSPARENT);
        fb.set_pixel(1, 1, 255);
    }

    let mut lower = Layer::new(0);
    lower.attach(back.clone() as AttachableRef);
    let mut upper = Layer::new(1);
    upper.attach(front.clone() as AttachableRef);

    let mut comp = Compositor::new(4, 4);
    comp.begin_frame(4, 2);
    for layer in [&lower, &upper] {
        layer.render(&mut comp).unwrap();
    }
    assert_eq!(comp.pixel(0, 0), Some(Rgb::new(200, 200, 200)));
    assert_eq!(comp.pixel(1, 1), Some(Rgb::new(255, 255, 255)));
}

#[test]
fn mesh_buffer_follows_compositor_viewport() {
    let mesh = Rc::new(RefCell::new(
        MeshRenderable::new(Mesh::cube(20.0))
            .with_position(Vec2::new(20.0, 20.0))
            .with_rotation(Vec3::new(0.5, 0.6, 0.0)),
    ));
    let mut layer = Layer::new(0);
    layer.attach(mesh.clone() as AttachableRef);

    let mut comp = Compositor::default();
    let mut cells = FrameBuffer::new(0, 0);
    comp.begin_frame(40, 20);
    layer.render(&mut comp).unwrap();
    comp.end_frame(&mut cells);

    let m = mesh.borrow();
    assert_eq!((m.buffer().width(), m.buffer().height()), (40, 40));
    assert_eq!(m.last_stats().drawn, 3);
    assert_eq!(comp.texture_count(), 1);
}
