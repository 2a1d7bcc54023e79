//! JSON configuration for the reconstruction core and the command-line tools.
//!
//! `HullConfig` is built once (from JSON or in code) and handed to every
//! component by reference; nothing reads settings from global state.
pub mod playback;

use crate::preview::PreviewKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HullConfig {
    pub processing: ProcessingConfig,
    pub intersection: IntersectionConfig,
    pub cameras: Vec<CameraConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Frames averaged into the background reference.
    pub background_frames: usize,
    /// Per-channel RGB difference below which a pixel counts as background.
    pub color_tolerance: u8,
    /// Side length in pixels of one contour grid cell.
    pub contour_cell: usize,
    /// Minimum boundary pixels for a cell to carry a keypoint.
    pub noise_pixel_tolerance: usize,
    /// Heading tolerance in radians of the segment merge pass.
    /// When `None`, segments are not merged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_tolerance: Option<f32>,
    /// Length of every ray along the camera's forward axis (world units).
    pub max_ray_length: f32,
    /// Per-phase worker timeout in milliseconds.
    pub thread_timeout_ms: u64,
    /// Scale of preview snapshots relative to the frame size.
    pub preview_scale: f32,
    /// Initial preview kind of every camera.
    pub preview: PreviewKind,
    /// Emit every ray as one quad instead of carved surface quads.
    pub show_full_rays: bool,
    /// Maintain the shared RGBA texture atlas.
    pub texture_atlas: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            background_frames: 20,
            color_tolerance: 35,
            contour_cell: 8,
            noise_pixel_tolerance: 5,
            merge_tolerance: None,
            max_ray_length: 640.0,
            thread_timeout_ms: 400,
            preview_scale: 0.3333,
            preview: PreviewKind::Disabled,
            show_full_rays: false,
            texture_atlas: false,
        }
    }
}

impl ProcessingConfig {
    /// Bound on a coordinator wait for all workers of one phase.
    pub fn barrier_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.thread_timeout_ms + self.thread_timeout_ms / 4)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    /// L1 magnitude of the normals' cross product below which two ray
    /// planes count as parallel.
    pub parallel_plane_tolerance: f32,
    /// Denominator below which a line–line system counts as singular.
    pub singular_threshold: f32,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            parallel_plane_tolerance: 1.0,
            singular_threshold: 3000.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Display name; defaults to "Cam {index}".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Camera position; the camera always looks at the world origin.
    pub position: [f32; 3],
    /// Translation applied after the look-at orientation is derived.
    pub offset: [f32; 3],
    /// Up hint for the look-at orientation.
    pub up: [f32; 3],
    pub width: usize,
    pub height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: None,
            position: [0.0, 0.0, -300.0],
            offset: [0.0; 3],
            up: [0.0, 1.0, 0.0],
            width: 640,
            height: 480,
            focus: None,
        }
    }
}

pub fn load_config(path: &Path) -> Result<HullConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: HullConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg.processing.background_frames, 20);
        assert_eq!(cfg.processing.color_tolerance, 35);
        assert_eq!(cfg.processing.contour_cell, 8);
        assert_eq!(cfg.processing.noise_pixel_tolerance, 5);
        assert!(cfg.processing.merge_tolerance.is_none());
        assert_eq!(cfg.intersection.singular_threshold, 3000.0);
        assert!(cfg.cameras.is_empty());
    }

    #[test]
    fn partial_camera_entries_fill_in_defaults() {
        let json = r#"{
            "processing": { "contour_cell": 4, "merge_tolerance": 0.25 },
            "cameras": [
                { "position": [0, 0, -250] },
                { "position": [250, 0, 0], "up": [0, 1, 1], "name": "side" }
            ]
        }"#;
        let cfg: HullConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(cfg.processing.contour_cell, 4);
        assert_eq!(cfg.processing.merge_tolerance, Some(0.25));
        assert_eq!(cfg.processing.max_ray_length, 640.0);
        assert_eq!(cfg.cameras.len(), 2);
        assert_eq!(cfg.cameras[0].up, [0.0, 1.0, 0.0]);
        assert_eq!(cfg.cameras[1].name.as_deref(), Some("side"));
        assert_eq!(cfg.cameras[1].width, 640);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/no/such/hull.json")).unwrap_err();
        assert!(err.starts_with("Failed to read config"), "{err}");
    }

    #[test]
    fn barrier_timeout_adds_a_quarter() {
        let cfg = ProcessingConfig::default();
        assert_eq!(cfg.barrier_timeout().as_millis(), 500);
    }
}
