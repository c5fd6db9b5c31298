//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the rasterizer.
//! All types are plain data with no external dependencies, making them usable
//! from the framebuffer, the mesh pipeline, and any renderer backend.
//!
//! # Palette Layout
//!
//! Framebuffers store one byte per pixel, indexing into a palette of exactly
//! [`PALETTE_SIZE`] entries. The mesh pipeline's default lighting table
//! expects the following layout:
//!
//! | Indices | Meaning |
//! |---------|---------|
//! | 0 | Background (cleared every frame) |
//! | 1-7 | Bright variant of each base color |
//! | 8-14 | Medium variant (`base + 7`) |
//! | 15-21 | Dark variant (`base + 14`) |
//!
//! # Projection Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `REFERENCE_DISTANCE` | 600 | Screen distance used for FOV <-> focal length |
//! | `DEFAULT_FOCAL_LENGTH` | 1039 | Roughly a 60 degree field of view |
//! | `DEFAULT_CAMERA_DISTANCE` | 200 | Distance added to every transformed Z |
//! | `NEAR_CLAMP` | 1.0 | Minimum depth before the perspective divide |
//!
//! # Examples
//!
//! ```
//! use indexed_raster_types::{AnchorPoint, Color, Vec2, Vec3};
//!
//! let red = Color::rgb(255, 0, 0);
//! assert_eq!(red.a, 255);
//!
//! let n = Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 1.0, 0.0));
//! assert_eq!(n, Vec3::new(0.0, 0.0, 1.0));
//!
//! let center = AnchorPoint::Center.offset(Vec2::new(10.0, 4.0));
//! assert_eq!(center, Vec2::new(5.0, 2.0));
//! ```

use std::ops::{Add, Mul, Neg, Sub};

/// Number of entries in every palette.
pub const PALETTE_SIZE: usize = 256;

/// Lighting intensity above which the bright band is used.
pub const BRIGHT_THRESHOLD: f32 = 0.67;

/// Lighting intensity above which the medium band is used.
pub const MEDIUM_THRESHOLD: f32 = 0.33;

/// Index offset from a base color to its medium variant in the default layout.
pub const MEDIUM_BAND_OFFSET: u8 = 7;

/// Index offset from a base color to its dark variant in the default layout.
pub const DARK_BAND_OFFSET: u8 = 14;

/// Screen distance used when converting between FOV and focal length.
pub const REFERENCE_DISTANCE: f32 = 600.0;

/// Default focal length (600 / tan(30 degrees)).
pub const DEFAULT_FOCAL_LENGTH: f32 = 1039.0;

/// Default camera distance added to transformed Z before projection.
pub const DEFAULT_CAMERA_DISTANCE: f32 = 200.0;

/// Minimum depth used for the perspective divide.
pub const NEAR_CLAMP: f32 = 1.0;

/// Fallback buffer size when a renderable has no viewport to measure yet.
pub const FALLBACK_BUFFER_WIDTH: u32 = 640;

/// Fallback buffer height when a renderable has no viewport to measure yet.
pub const FALLBACK_BUFFER_HEIGHT: u32 = 480;

/// 32-bit RGBA color (one palette entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// Squared euclidean distance over the RGB channels (alpha ignored).
    #[inline]
    pub fn distance_sq(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Color::rgba(v[0], v[1], v[2], v[3])
    }
}

/// 2D vector used for screen positions and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);
    pub const ONE: Vec2 = Vec2::new(1.0, 1.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// 3D vector used for vertex positions, normals and Euler angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    /// Fixed view direction of the mesh pipeline (camera looks down -Z).
    pub const VIEW_DIRECTION: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy of this vector.
    ///
    /// Vectors shorter than `1e-4` are returned unchanged so degenerate faces
    /// produce a zero normal instead of NaNs.
    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0001 {
            self * (1.0 / len)
        } else {
            self
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Reference positions on a bounding box, used to attach one object to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorPoint {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    #[default]
    Center,
}

impl AnchorPoint {
    /// Offset of this anchor point from the top-left corner of a box of `size`.
    pub fn offset(self, size: Vec2) -> Vec2 {
        match self {
            AnchorPoint::TopLeft => Vec2::ZERO,
            AnchorPoint::TopRight => Vec2::new(size.x, 0.0),
            AnchorPoint::BottomLeft => Vec2::new(0.0, size.y),
            AnchorPoint::BottomRight => size,
            AnchorPoint::Center => Vec2::new(size.x / 2.0, size.y / 2.0),
        }
    }

    /// Parse an anchor point name (case-insensitive, `-`/`_` separators allowed).
    ///
    /// ```
    /// use indexed_raster_types::AnchorPoint;
    ///
    /// assert_eq!(AnchorPoint::from_str("top-left"), Some(AnchorPoint::TopLeft));
    /// assert_eq!(AnchorPoint::from_str("CENTER"), Some(AnchorPoint::Center));
    /// assert_eq!(AnchorPoint::from_str("middle"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "topleft" => Some(AnchorPoint::TopLeft),
            "topright" => Some(AnchorPoint::TopRight),
            "bottomleft" => Some(AnchorPoint::BottomLeft),
            "bottomright" => Some(AnchorPoint::BottomRight),
            "center" => Some(AnchorPoint::Center),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_focal_length_matches_sixty_degree_fov() {
        let focal = REFERENCE_DISTANCE / (30.0f32.to_radians()).tan();
        assert!((focal - DEFAULT_FOCAL_LENGTH).abs() < 1.0);
    }

    #[test]
    fn band_offsets_keep_default_layout_inside_21_entries() {
        assert_eq!(7 + DARK_BAND_OFFSET, 21);
        assert_eq!(1 + MEDIUM_BAND_OFFSET, 8);
        assert!(BRIGHT_THRESHOLD > MEDIUM_THRESHOLD);
    }

    #[test]
    fn color_distance_ignores_alpha() {
        let a = Color::rgba(10, 20, 30, 0);
        let b = Color::rgba(10, 20, 30, 255);
        assert_eq!(a.distance_sq(b), 0);
        assert_eq!(Color::BLACK.distance_sq(Color::rgb(3, 4, 0)), 25);
    }

    #[test]
    fn normalize_leaves_tiny_vectors_alone() {
        let tiny = Vec3::new(0.00001, 0.0, 0.0);
        assert_eq!(tiny.normalized(), tiny);

        let n = Vec3::new(3.0, 0.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn anchor_offsets_cover_all_corners() {
        let size = Vec2::new(8.0, 6.0);
        assert_eq!(AnchorPoint::TopLeft.offset(size), Vec2::ZERO);
        assert_eq!(AnchorPoint::TopRight.offset(size), Vec2::new(8.0, 0.0));
        assert_eq!(AnchorPoint::BottomLeft.offset(size), Vec2::new(0.0, 6.0));
        assert_eq!(AnchorPoint::BottomRight.offset(size), size);
        assert_eq!(AnchorPoint::Center.offset(size), Vec2::new(4.0, 3.0));
    }
}
