use super::HullConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config of the `hull_playback` tool: recorded PNG sequences, one directory
/// per camera, reconstructed offline.
#[derive(Debug, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub hull: HullConfig,
    /// Frame directories in camera order.
    pub sources: Vec<PathBuf>,
    /// Global frames to reconstruct, background sampling included.
    #[serde(default = "default_frames")]
    pub frames: usize,
    pub output: PlaybackOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackOutputConfig {
    /// Directory receiving `model_{frame}.json` and `summary.json`.
    #[serde(rename = "dir")]
    pub dir: PathBuf,
    /// Write every model frame, not only the last one.
    #[serde(default)]
    pub every_frame: bool,
    /// Also write each camera's last binary mask as `mask_{camera}.png`.
    #[serde(default)]
    pub masks: bool,
}

fn default_frames() -> usize {
    30
}

pub fn load_config(path: &Path) -> Result<PlaybackConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let cfg: PlaybackConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    if cfg.sources.len() != cfg.hull.cameras.len() {
        return Err(format!(
            "Config {} lists {} sources for {} cameras",
            path.display(),
            cfg.sources.len(),
            cfg.hull.cameras.len()
        ));
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(json.as_bytes()).expect("write");
        file
    }

    #[test]
    fn loads_sources_and_defaults() {
        let file = write_config(
            r#"{
                "hull": { "cameras": [{ "position": [0, 0, -300] }] },
                "sources": ["rec/cam0"],
                "output": { "dir": "out" }
            }"#,
        );
        let cfg = load_config(file.path()).expect("load");
        assert_eq!(cfg.frames, 30);
        assert_eq!(cfg.sources, vec![PathBuf::from("rec/cam0")]);
        assert_eq!(cfg.output.dir, PathBuf::from("out"));
        assert!(!cfg.output.every_frame);
        assert!(!cfg.output.masks);
        assert_eq!(cfg.hull.processing.background_frames, 20);
    }

    #[test]
    fn source_count_must_match_cameras() {
        let file = write_config(
            r#"{
                "hull": { "cameras": [{}, {}] },
                "sources": ["a"],
                "output": { "dir": "out" }
            }"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.contains("1 sources for 2 cameras"), "{err}");
    }
}
