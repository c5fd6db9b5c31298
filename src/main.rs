//! Terminal demo: a spinning, lit mesh over a palette-cycled backdrop.
//!
//! Configuration comes from `RASTER_*` environment variables and flags (see
//! `indexed_raster::config`). Logs go to `RASTER_LOG_PATH` when set, since the
//! terminal itself is in raw mode on the alternate screen.

use std::cell::RefCell;
use std::fs::File;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing_subscriber::EnvFilter;

use indexed_raster::config::DemoConfig;
use indexed_raster::core::{AttachableRef, IndexedFramebuffer, Layer, Palette};
use indexed_raster::mesh::{MeshRenderable, RenderMode};
use indexed_raster::term::{Compositor, TerminalRenderer};
use indexed_raster::types::{Color, Vec2, Vec3};

const MESH_SIZE: f32 = 100.0;
const SPIN: Vec3 = Vec3::new(0.5, 0.8, 0.2);

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = DemoConfig::from_env().apply_args(&args)?;
    init_logging(&config)?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &config);

    // Always try to restore terminal state.
    let _ = term.exit();
    if let Err(e) = &result {
        tracing::error!(error = %e, "demo aborted");
    }
    result
}

fn init_logging(config: &DemoConfig) -> Result<()> {
    let Some(path) = config.log_path.as_deref() else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("create log file {path}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

struct Scene {
    mesh: Rc<RefCell<MeshRenderable>>,
    backdrop: Rc<RefCell<IndexedFramebuffer>>,
    layers: Vec<Layer>,
    cycling: bool,
    fov: f32,
    fixed_scale: Option<f32>,
}

impl Scene {
    fn new(config: &DemoConfig) -> Self {
        let mut renderable = MeshRenderable::new(config.shape.build(MESH_SIZE))
            .with_auto_rotation(SPIN)
            .with_render_mode(config.mode);
        renderable.set_fov(config.fov);
        renderable.set_camera_distance(config.camera_distance);
        renderable.set_back_face_culling(config.cull);

        let mut palette = Palette::shaded_primaries();
        palette.set(0, Color::TRANSPARENT);
        renderable.buffer_mut().set_palette(&palette);

        let mesh = Rc::new(RefCell::new(renderable));
        let backdrop = Rc::new(RefCell::new(IndexedFramebuffer::new(1, 1)));

        let mut back = Layer::new(0);
        back.set_opacity(0.35);
        back.attach(backdrop.clone() as AttachableRef);
        let mut front = Layer::new(1);
        front.attach(mesh.clone() as AttachableRef);

        let mut layers = vec![front, back];
        layers.sort_by_key(Layer::order);

        Self {
            mesh,
            backdrop,
            layers,
            cycling: true,
            fov: config.fov,
            fixed_scale: config.scale,
        }
    }

    /// Returns `false` when the demo should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let mut mesh = self.mesh.borrow_mut();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char('w') => {
                let next = match mesh.render_mode() {
                    RenderMode::Filled => RenderMode::Wireframe,
                    RenderMode::Wireframe => RenderMode::Filled,
                };
                mesh.set_render_mode(next);
            }
            KeyCode::Char('c') => {
                let on = !mesh.back_face_culling();
                mesh.set_back_face_culling(on);
            }
            KeyCode::Char('p') => self.cycling = !self.cycling,
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.fov = (self.fov + 5.0).min(170.0);
                mesh.set_fov(self.fov);
            }
            KeyCode::Char('-') => {
                self.fov = (self.fov - 5.0).max(10.0);
                mesh.set_fov(self.fov);
            }
            _ => {}
        }
        true
    }

    fn layout(&mut self, width: u32, height: u32) {
        {
            let mut backdrop = self.backdrop.borrow_mut();
            if backdrop.width() != width || backdrop.height() != height {
                *backdrop = stripes(width, height);
            }
        }

        let mut mesh = self.mesh.borrow_mut();
        mesh.set_position(Vec2::new(width as f32 / 2.0, height as f32 / 2.0));
        let scale = self.fixed_scale.unwrap_or_else(|| {
            // Projected size is about size * scale * focal / distance; aim for half the short side.
            let target = width.min(height) as f32 * 0.5;
            target * mesh.camera_distance() / (MESH_SIZE * mesh.focal_length())
        });
        mesh.set_scale(scale);
    }

    fn frame(&mut self, dt: f32, compositor: &mut Compositor) -> Result<()> {
        self.mesh.borrow_mut().update(dt);
        if self.cycling {
            self.backdrop.borrow_mut().rotate_palette(1..256, 1);
        }
        for layer in &self.layers {
            layer.render(compositor)?;
        }
        Ok(())
    }

    fn status(&self) -> String {
        let mesh = self.mesh.borrow();
        let stats = mesh.last_stats();
        format!(
            " {:?} | fov {:.0} | cull {} | drawn {} culled {} | q quit  w wire  c cull  p cycle  +/- fov ",
            mesh.render_mode(),
            mesh.fov(),
            if mesh.back_face_culling() { "on" } else { "off" },
            stats.drawn,
            stats.culled,
        )
    }
}

/// Diagonal bands over indices 1-255 of the fire gradient.
fn stripes(width: u32, height: u32) -> IndexedFramebuffer {
    let mut fb = IndexedFramebuffer::new(width, height);
    fb.set_palette(&Palette::fire_gradient());
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let band = ((x / 2 + y) as u32 * 4) % 255;
            fb.set_pixel(x, y, band as u8 + 1);
        }
    }
    fb
}

fn run(term: &mut TerminalRenderer, config: &DemoConfig) -> Result<()> {
    let mut scene = Scene::new(config);
    let mut compositor = Compositor::default();

    let frame_duration = Duration::from_millis(config.frame_ms);
    let mut last_frame = Instant::now();
    tracing::info!(?config, "demo started");

    loop {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        compositor.begin_frame(cols, rows);
        scene.layout(compositor.width(), compositor.height());

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        scene.frame(dt, &mut compositor)?;
        term.present(&mut compositor, Some(&scene.status()))?;

        // Input with timeout until next frame.
        let deadline = last_frame + frame_duration;
        while let Some(timeout) = deadline.checked_duration_since(Instant::now()) {
            if !event::poll(timeout)? {
                break;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !scene.handle_key(key) {
                        tracing::info!("quit requested");
                        return Ok(());
                    }
                }
                Event::Resize(_, _) => term.invalidate(),
                _ => {}
            }
        }
    }
}
