//! Offline reconstruction of recorded PNG sequences.
//!
//! Each camera plays one directory of `frame_*.png` files (plus an optional
//! `background.png`). Frames are reconstructed with the synchronous driver:
//! 1. Open one sequence source per configured camera.
//! 2. Run the configured number of global frames.
//! 3. Write the model JSON (last frame, or every frame) and a summary report.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;
use visual_hull::config::playback::{self as playback_cfg, PlaybackConfig};
use visual_hull::diagnostics::{CameraFrameReport, RunningAverage, TimingBreakdown};
use visual_hull::image::io::{save_mask_image, write_json_file};
use visual_hull::pipeline::SyncDriver;
use visual_hull::source::ImageSequenceSource;
use visual_hull::ModelFrame;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaybackSummary {
    frames: usize,
    last_frame_quads: usize,
    bounds: Option<([f32; 3], [f32; 3])>,
    mean_frame_ms: Option<f64>,
    max_frame_ms: Option<f64>,
    last_reports: Vec<CameraFrameReport>,
    timings: TimingBreakdown,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start = Instant::now();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    println!(
        "Total execution time: {:.2} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
}

fn run() -> Result<(), String> {
    let config = load_config_from_args()?;
    ensure_output_dir(&config)?;

    let open_start = Instant::now();
    let sources = config
        .sources
        .iter()
        .map(|dir| {
            ImageSequenceSource::open(dir)
                .map_err(|e| format!("Failed to open {}: {e}", dir.display()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let open_ms = open_start.elapsed().as_secs_f64() * 1000.0;

    let mut driver = SyncDriver::new(&config.hull, sources);
    let mut model = ModelFrame::default();
    let mut frame_ms = RunningAverage::default();
    let mut reports = Vec::new();
    let run_start = Instant::now();
    for frame in 0..config.frames {
        let frame_start = Instant::now();
        reports = driver.reconstruct_frame(&mut model);
        frame_ms.push(frame_start.elapsed().as_secs_f64() * 1000.0);
        let last = frame + 1 == config.frames;
        if config.output.every_frame || last {
            let path = config
                .output
                .dir
                .join(format!("model_{:05}.json", model.frame_index));
            write_json_file(&path, &model)?;
        }
    }
    let run_ms = run_start.elapsed().as_secs_f64() * 1000.0;
    if config.output.masks {
        save_masks(&driver, &config)?;
    }

    let mut timings = TimingBreakdown::default();
    timings.push("open", open_ms);
    timings.push("reconstruct", run_ms);
    let summary = PlaybackSummary {
        frames: config.frames,
        last_frame_quads: model.len(),
        bounds: model.bounds(),
        mean_frame_ms: frame_ms.average(),
        max_frame_ms: frame_ms.max(),
        last_reports: reports,
        timings,
    };
    let summary_path = config.output.dir.join("summary.json");
    write_json_file(&summary_path, &summary)?;
    println!("Playback summary written to {}", summary_path.display());
    Ok(())
}

fn save_masks(
    driver: &SyncDriver<ImageSequenceSource>,
    config: &PlaybackConfig,
) -> Result<(), String> {
    for camera in 0..driver.camera_count() {
        let Some(pipeline) = driver.pipeline(camera) else {
            continue;
        };
        if !pipeline.background().has_mask() {
            continue;
        }
        let mask = pipeline.background().mask().map_err(|e| e.to_string())?;
        let path = config
            .output
            .dir
            .join(format!("mask_{camera}.png"));
        save_mask_image(mask, &path)?;
    }
    Ok(())
}

fn usage() -> String {
    "Usage: hull_playback <config.json>".to_string()
}

fn load_config_from_args() -> Result<PlaybackConfig, String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    playback_cfg::load_config(Path::new(&config_path))
}

fn ensure_output_dir(config: &PlaybackConfig) -> Result<(), String> {
    fs::create_dir_all(&config.output.dir)
        .map_err(|e| format!("Failed to create {}: {e}", config.output.dir.display()))
}
