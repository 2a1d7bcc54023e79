//! Live demo: a spinning synthetic cube seen by several cameras, reconstructed
//! by the threaded orchestrator.
//!
//! Usage: `hull_demo [config.json] [frames] [model.json]`. Without a config
//! two perpendicular 320×240 cameras are used.

use log::{info, warn};
use nalgebra::UnitQuaternion;
use std::env;
use std::f32::consts::TAU;
use std::path::Path;
use std::time::Duration;
use visual_hull::config::{load_config, CameraConfig, HullConfig, IntersectionConfig};
use visual_hull::geometry::Vec3;
use visual_hull::image::io::write_json_file;
use visual_hull::orchestrator::Reconstructor;
use visual_hull::synthetic::{cube_source, spinning_poses, SyntheticCube};
use visual_hull::CameraPose;

const POSES: usize = 90;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) => load_config(Path::new(path))?,
        None => demo_config(),
    };
    let frames = match args.get(1) {
        Some(s) => s
            .parse::<u64>()
            .map_err(|e| format!("Invalid frame count {s}: {e}"))?,
        None => 60,
    };

    let cube = SyntheticCube::new(Vec3::zeros(), 60.0)
        .rotated(UnitQuaternion::from_axis_angle(&Vec3::x_axis(), 0.3));
    let poses = spinning_poses(&cube, POSES, TAU / POSES as f32);
    let warmup = config.processing.background_frames;
    let sources: Vec<_> = config
        .cameras
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cube_source(&CameraPose::from_config(i, c), &poses, warmup)
                .with_interval(Duration::from_millis(33))
        })
        .collect();

    let mut hull = Reconstructor::start(config, sources)
        .map_err(|e| format!("Failed to start reconstruction: {e}"))?;
    let output = hull.output();
    while output.frames_published() < frames {
        if !output.wait_for_new_model(Duration::from_secs(2)) {
            warn!("no model published within 2 s");
            continue;
        }
        let model = output.acquire().map_err(|e| e.to_string())?;
        match model.bounds() {
            Some((lo, hi)) => info!(
                "frame {}: {} quads, bounds [{:.0} {:.0} {:.0}]..[{:.0} {:.0} {:.0}]",
                model.frame_index,
                model.len(),
                lo[0],
                lo[1],
                lo[2],
                hi[0],
                hi[1],
                hi[2]
            ),
            None => info!("frame {}: empty model", model.frame_index),
        }
    }
    hull.stop();

    let model = output.snapshot();
    if let Some(path) = args.get(2) {
        write_json_file(Path::new(path), &model)?;
        println!("Model written to {path}");
    }
    println!(
        "{} frames published, last model has {} quads",
        output.frames_published(),
        model.len()
    );
    Ok(())
}

fn demo_config() -> HullConfig {
    let camera = |name: &str, position: [f32; 3]| CameraConfig {
        name: Some(name.to_string()),
        position,
        width: 320,
        height: 240,
        ..Default::default()
    };
    let mut config = HullConfig {
        intersection: IntersectionConfig {
            parallel_plane_tolerance: 0.05,
            ..Default::default()
        },
        cameras: vec![
            camera("front", [0.0, 0.0, -300.0]),
            camera("side", [300.0, 0.0, 0.0]),
        ],
        ..Default::default()
    };
    config.processing.background_frames = 5;
    config
}
