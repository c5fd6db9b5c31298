//! Demo configuration: environment variables first, then command-line flags.

use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::mesh::{Mesh, RenderMode};

/// Built-in mesh shown by the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Cube,
    Pyramid,
    Sphere,
}

impl Shape {
    /// Mesh of roughly `size` across.
    pub fn build(self, size: f32) -> Mesh {
        match self {
            Shape::Cube => Mesh::cube(size),
            Shape::Pyramid => Mesh::pyramid(size),
            Shape::Sphere => Mesh::sphere(size / 2.0, 12),
        }
    }
}

impl FromStr for Shape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" => Ok(Shape::Cube),
            "pyramid" => Ok(Shape::Pyramid),
            "sphere" => Ok(Shape::Sphere),
            other => Err(anyhow!("unknown shape: {other} (expected cube, pyramid or sphere)")),
        }
    }
}

fn parse_mode(s: &str) -> Result<RenderMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "filled" | "fill" => Ok(RenderMode::Filled),
        "wireframe" | "wire" => Ok(RenderMode::Wireframe),
        other => Err(anyhow!("unknown mode: {other} (expected filled or wireframe)")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub shape: Shape,
    pub mode: RenderMode,
    /// Field of view in degrees.
    pub fov: f32,
    pub camera_distance: f32,
    /// Mesh scale; `None` fits the mesh to the viewport.
    pub scale: Option<f32>,
    pub cull: bool,
    pub frame_ms: u64,
    pub log_path: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            shape: Shape::Cube,
            mode: RenderMode::Filled,
            fov: 60.0,
            camera_distance: crate::types::DEFAULT_CAMERA_DISTANCE,
            scale: None,
            cull: true,
            frame_ms: 33,
            log_path: None,
        }
    }
}

impl DemoConfig {
    /// Create from `RASTER_*` environment variables. Unparseable values keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let shape = get("RASTER_SHAPE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(d.shape);
        let mode = get("RASTER_MODE")
            .and_then(|s| parse_mode(&s).ok())
            .unwrap_or(d.mode);
        let fov = get("RASTER_FOV")
            .and_then(|s| s.parse().ok())
            .unwrap_or(d.fov);
        let camera_distance = get("RASTER_CAMERA_DISTANCE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(d.camera_distance);
        let scale = get("RASTER_SCALE").and_then(|s| s.parse().ok());
        let cull = !get("RASTER_NO_CULL")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let frame_ms = get("RASTER_FRAME_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(d.frame_ms);
        let log_path = get("RASTER_LOG_PATH");

        Self {
            shape,
            mode,
            fov,
            camera_distance,
            scale,
            cull,
            frame_ms,
            log_path,
        }
    }

    /// Apply command-line flags (without the program name) on top of `self`.
    pub fn apply_args(mut self, args: &[String]) -> Result<Self> {
        let mut i = 0usize;
        while i < args.len() {
            let flag = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .map(String::as_str)
                    .ok_or_else(|| anyhow!("missing value for {flag}"))
            };
            match flag {
                "--shape" => self.shape = value()?.parse()?,
                "--mode" => self.mode = parse_mode(value()?)?,
                "--fov" => self.fov = parse_num(flag, value()?)?,
                "--distance" => self.camera_distance = parse_num(flag, value()?)?,
                "--scale" => self.scale = Some(parse_num(flag, value()?)?),
                "--frame-ms" => self.frame_ms = parse_num(flag, value()?)?,
                "--no-cull" => self.cull = false,
                other => return Err(anyhow!("unknown argument: {other}")),
            }
            i += 1;
        }

        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(anyhow!("--fov must be between 0 and 180 degrees, got {}", self.fov));
        }
        if self.frame_ms == 0 {
            return Err(anyhow!("--frame-ms must be positive"));
        }
        Ok(self)
    }
}

fn parse_num<T: FromStr>(flag: &str, v: &str) -> Result<T> {
    v.parse::<T>()
        .map_err(|_| anyhow!("invalid {flag} value: {v}"))
}
