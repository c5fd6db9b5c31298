//! Model rotation and perspective projection.

use crate::types::{
    Vec2, Vec3, DEFAULT_CAMERA_DISTANCE, DEFAULT_FOCAL_LENGTH, NEAR_CLAMP, REFERENCE_DISTANCE,
};

/// Euler rotation applied about X, then Y, then Z.
///
/// Sines and cosines are computed once per frame and reused for every vertex
/// and normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerRotation {
    cos_x: f32,
    sin_x: f32,
    cos_y: f32,
    sin_y: f32,
    cos_z: f32,
    sin_z: f32,
}

impl EulerRotation {
    pub fn new(angles: Vec3) -> Self {
        let (sin_x, cos_x) = angles.x.sin_cos();
        let (sin_y, cos_y) = angles.y.sin_cos();
        let (sin_z, cos_z) = angles.z.sin_cos();
        Self {
            cos_x,
            sin_x,
            cos_y,
            sin_y,
            cos_z,
            sin_z,
        }
    }

    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        // X axis
        let y1 = v.y * self.cos_x - v.z * self.sin_x;
        let z1 = v.y * self.sin_x + v.z * self.cos_x;
        // Y axis (leaves y untouched)
        let x2 = v.x * self.cos_y - z1 * self.sin_y;
        let z2 = v.x * self.sin_y + z1 * self.cos_y;
        // Z axis
        let x3 = x2 * self.cos_z - y1 * self.sin_z;
        let y3 = x2 * self.sin_z + y1 * self.cos_z;
        Vec3::new(x3, y3, z2)
    }
}

/// Pinhole projection onto the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub focal_length: f32,
    pub camera_distance: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            focal_length: DEFAULT_FOCAL_LENGTH,
            camera_distance: DEFAULT_CAMERA_DISTANCE,
        }
    }
}

impl Projection {
    /// Project a transformed vertex to integer screen coordinates around `origin`.
    ///
    /// Depth is clamped to [`NEAR_CLAMP`] so vertices at or behind the camera
    /// never divide by zero.
    #[inline]
    pub fn project(&self, p: Vec3, origin: Vec2) -> (i32, i32) {
        let z = (p.z + self.camera_distance).max(NEAR_CLAMP);
        let x = origin.x + (p.x * self.focal_length) / z;
        let y = origin.y + (p.y * self.focal_length) / z;
        (x as i32, y as i32)
    }

    pub fn set_fov(&mut self, degrees: f32) {
        self.focal_length = focal_length_for_fov(degrees);
    }

    pub fn fov(&self) -> f32 {
        fov_for_focal_length(self.focal_length)
    }
}

/// Focal length giving a field of view of `degrees` at [`REFERENCE_DISTANCE`].
pub fn focal_length_for_fov(degrees: f32) -> f32 {
    REFERENCE_DISTANCE / (degrees.to_radians() / 2.0).tan()
}

/// Approximate field of view (degrees) for a focal length.
pub fn fov_for_focal_length(focal_length: f32) -> f32 {
    (2.0 * (REFERENCE_DISTANCE / focal_length).atan()).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn quarter_turns_about_each_axis() {
        let v = Vec3::new(0.0, 1.0, 0.0);
        let rx = EulerRotation::new(Vec3::new(FRAC_PI_2, 0.0, 0.0));
        assert!(close(rx.apply(v), Vec3::new(0.0, 0.0, 1.0)));

        let v = Vec3::new(1.0, 0.0, 0.0);
        let ry = EulerRotation::new(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert!(close(ry.apply(v), Vec3::new(0.0, 0.0, 1.0)));

        let rz = EulerRotation::new(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(close(rz.apply(v), Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn rotation_order_is_x_then_y() {
        // X first sends +Y to +Z, then Y sends +Z to -X.
        let r = EulerRotation::new(Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0));
        assert!(close(r.apply(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn projection_divides_by_shifted_depth() {
        let p = Projection {
            focal_length: 100.0,
            camera_distance: 50.0,
        };
        assert_eq!(p.project(Vec3::new(10.0, -5.0, 50.0), Vec2::new(20.0, 20.0)), (30, 15));
    }

    #[test]
    fn projection_clamps_depth_near_camera() {
        let p = Projection {
            focal_length: 10.0,
            camera_distance: 0.0,
        };
        // z + distance = -3 -> clamped to 1.
        assert_eq!(p.project(Vec3::new(2.0, 3.0, -3.0), Vec2::ZERO), (20, 30));
    }

    #[test]
    fn fov_round_trips() {
        let mut p = Projection::default();
        for deg in [30.0f32, 60.0, 90.0, 120.0] {
            p.set_fov(deg);
            assert!((p.fov() - deg).abs() < 1e-3, "fov {deg} -> {}", p.fov());
        }
    }
}
