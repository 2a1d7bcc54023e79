use nalgebra::UnitQuaternion;
use visual_hull::config::{CameraConfig, HullConfig, IntersectionConfig, ProcessingConfig};
use visual_hull::geometry::Vec3;
use visual_hull::source::SyntheticSource;
use visual_hull::synthetic::{cube_source, SyntheticCube};
use visual_hull::CameraPose;

pub const WIDTH: usize = 320;
pub const HEIGHT: usize = 240;
pub const CELL: usize = 8;
pub const BACKGROUND_FRAMES: usize = 3;

/// Front camera on -Z and side camera on +X, both looking at the origin.
pub fn two_camera_config() -> HullConfig {
    let camera = |name: &str, position: [f32; 3]| CameraConfig {
        name: Some(name.to_string()),
        position,
        width: WIDTH,
        height: HEIGHT,
        ..Default::default()
    };
    HullConfig {
        processing: ProcessingConfig {
            background_frames: BACKGROUND_FRAMES,
            contour_cell: CELL,
            thread_timeout_ms: 2000,
            ..Default::default()
        },
        intersection: IntersectionConfig {
            parallel_plane_tolerance: 0.05,
            ..Default::default()
        },
        cameras: vec![
            camera("front", [0.0, 0.0, -300.0]),
            camera("side", [300.0, 0.0, 0.0]),
        ],
    }
}

/// Cube of half extent 60 tilted about the X axis.
pub fn tilted_cube() -> SyntheticCube {
    SyntheticCube::new(Vec3::zeros(), 60.0)
        .rotated(UnitQuaternion::from_axis_angle(&Vec3::x_axis(), 0.3))
}

pub fn cameras(config: &HullConfig) -> Vec<CameraPose> {
    config
        .cameras
        .iter()
        .enumerate()
        .map(|(i, c)| CameraPose::from_config(i, c))
        .collect()
}

/// One source per camera cycling over `poses`, with a background warmup.
pub fn sources(config: &HullConfig, poses: &[SyntheticCube]) -> Vec<SyntheticSource> {
    cameras(config)
        .iter()
        .map(|camera| cube_source(camera, poses, config.processing.background_frames))
        .collect()
}

/// Asserts that `actual` bounds lie within `slack` of `expected` on every axis.
pub fn assert_bounds_close(
    actual: ([f32; 3], [f32; 3]),
    expected: ([f32; 3], [f32; 3]),
    slack: f32,
) {
    for k in 0..3 {
        assert!(
            (actual.0[k] - expected.0[k]).abs() <= slack,
            "axis {k} min: {actual:?} vs {expected:?}"
        );
        assert!(
            (actual.1[k] - expected.1[k]).abs() <= slack,
            "axis {k} max: {actual:?} vs {expected:?}"
        );
    }
}
