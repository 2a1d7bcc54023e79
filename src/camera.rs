//! Fixed camera poses.
//!
//! Every camera looks at the world origin from its configured position. The
//! image is mapped onto the camera's lens plane one world unit per pixel, and
//! rays extend from that plane along the forward axis (orthographic model).
use crate::config::CameraConfig;
use crate::geometry::Vec3;
use nalgebra::UnitQuaternion;

#[derive(Clone, Debug)]
pub struct CameraPose {
    pub index: usize,
    pub name: String,
    /// Lens-plane centre.
    pub origin: Vec3,
    pub orientation: UnitQuaternion<f32>,
    pub width: usize,
    pub height: usize,
    /// Offset from `origin` to the lens-plane corner of pixel (0, 0).
    pub to_corner: Vec3,
    /// Offset of this camera's frame inside the shared texture atlas.
    pub tex_offset: (f32, f32),
    pub focus: Option<f32>,
}

impl CameraPose {
    pub fn from_config(index: usize, cfg: &CameraConfig) -> Self {
        let position = Vec3::from(cfg.position);
        let up = Vec3::from(cfg.up);
        let orientation = look_at_origin(&position, &up);
        let (w, h) = (cfg.width as f32, cfg.height as f32);
        Self {
            index,
            name: cfg
                .name
                .clone()
                .unwrap_or_else(|| format!("Cam {index}")),
            origin: position + Vec3::from(cfg.offset),
            orientation,
            width: cfg.width,
            height: cfg.height,
            to_corner: orientation * Vec3::new(-w / 2.0, h / 2.0, 0.0),
            tex_offset: ((index * cfg.width) as f32, 0.0),
            focus: cfg.focus,
        }
    }

    /// Unit forward axis (towards the origin).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::z()
    }

    /// Lens-plane corner of pixel (0, 0).
    #[inline]
    pub fn left_top(&self) -> Vec3 {
        self.origin + self.to_corner
    }

    /// Projects an image position onto the lens plane.
    #[inline]
    pub fn lens_point(&self, x: f32, y: f32) -> Vec3 {
        self.left_top() + self.orientation * Vec3::new(x, -y, 0.0)
    }

    /// Projects a linear pixel coordinate onto the lens plane.
    #[inline]
    pub fn lens_pixel(&self, pixel: usize) -> Vec3 {
        let (x, y) = pixel_xy(pixel, self.width);
        self.lens_point(x as f32, y as f32)
    }
}

#[inline]
pub fn pixel_xy(pixel: usize, width: usize) -> (usize, usize) {
    (pixel % width, pixel / width)
}

/// Orientation whose local +Z points from `position` to the origin, with
/// local +Y as close to `up` as possible.
pub fn look_at_origin(position: &Vec3, up: &Vec3) -> UnitQuaternion<f32> {
    let dir = -position;
    if dir.norm_squared() <= f32::EPSILON || dir.cross(up).norm_squared() <= f32::EPSILON {
        // Degenerate hint: fall back to any perpendicular up vector.
        let alt = if dir.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        return UnitQuaternion::face_towards(&dir, &alt);
    }
    UnitQuaternion::face_towards(&dir, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Vec3, b: &Vec3) -> bool {
        (a - b).norm() < 1e-3
    }

    #[test]
    fn front_camera_maps_image_axes_to_world() {
        let cfg = CameraConfig {
            position: [0.0, 0.0, -300.0],
            width: 160,
            height: 120,
            ..Default::default()
        };
        let cam = CameraPose::from_config(0, &cfg);
        assert!(approx(&cam.forward(), &Vec3::new(0.0, 0.0, 1.0)));
        assert!(approx(&cam.left_top(), &Vec3::new(-80.0, 60.0, -300.0)));
        // pixel (100, 20) is 20 right of centre and 40 above it
        assert!(approx(&cam.lens_point(100.0, 20.0), &Vec3::new(20.0, 40.0, -300.0)));
        assert!(approx(&cam.lens_pixel(20 * 160 + 100), &Vec3::new(20.0, 40.0, -300.0)));
        assert_eq!(cam.name, "Cam 0");
    }

    #[test]
    fn side_camera_looks_along_negative_x() {
        let cfg = CameraConfig {
            position: [300.0, 0.0, 0.0],
            width: 100,
            height: 100,
            ..Default::default()
        };
        let cam = CameraPose::from_config(2, &cfg);
        assert!(approx(&cam.forward(), &Vec3::new(-1.0, 0.0, 0.0)));
        assert_eq!(cam.tex_offset, (200.0, 0.0));
        // the lens plane stays perpendicular to the forward axis
        let a = cam.lens_point(0.0, 0.0);
        let b = cam.lens_point(99.0, 57.0);
        assert!((b - a).dot(&cam.forward()).abs() < 1e-3);
    }

    #[test]
    fn offset_moves_the_lens_plane_only() {
        let cfg = CameraConfig {
            position: [0.0, 0.0, -300.0],
            offset: [0.0, 10.0, 0.0],
            ..Default::default()
        };
        let cam = CameraPose::from_config(0, &cfg);
        assert!(approx(&cam.origin, &Vec3::new(0.0, 10.0, -300.0)));
        assert!(approx(&cam.forward(), &Vec3::new(0.0, 0.0, 1.0)));
    }
}
