use super::*;
use crate::config::{CameraConfig, IntersectionConfig, ProcessingConfig};
use crate::geometry::Vec3;
use crate::image::RgbFrame;
use crate::preview::PreviewKind;
use crate::source::{SourceError, SyntheticSource};
use crate::synthetic::{cube_source, SyntheticCube};

fn config() -> HullConfig {
    let camera = |position: [f32; 3]| CameraConfig {
        position,
        width: 160,
        height: 120,
        ..Default::default()
    };
    HullConfig {
        processing: ProcessingConfig {
            background_frames: 3,
            thread_timeout_ms: 2000,
            ..Default::default()
        },
        intersection: IntersectionConfig {
            parallel_plane_tolerance: 0.5,
            ..Default::default()
        },
        cameras: vec![camera([0.0, 0.0, -300.0]), camera([300.0, 0.0, 0.0])],
    }
}

fn sources(config: &HullConfig) -> Vec<SyntheticSource> {
    let cube = SyntheticCube::new(Vec3::zeros(), 30.0);
    config
        .cameras
        .iter()
        .enumerate()
        .map(|(i, c)| cube_source(&CameraPose::from_config(i, c), &[cube], 3))
        .collect()
}

fn wait_frames(output: &ModelOutput, frames: u64) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while output.frames_published() < frames {
        assert!(Instant::now() < deadline, "only {} frames", output.frames_published());
        output.wait_for_new_model(Duration::from_millis(100));
    }
}

#[test]
fn frames_are_published_in_camera_order() {
    let cfg = config();
    let mut hull = Reconstructor::start(cfg.clone(), sources(&cfg)).expect("start");
    let output = hull.output();
    wait_frames(&output, 4);
    hull.stop();
    assert!(!hull.is_running());

    let model = output.acquire().expect("acquire");
    let reports = output.reports();
    assert_eq!(model.per_camera.len(), 2);
    assert_eq!(model.per_camera.iter().sum::<usize>(), model.len());
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.camera, i);
        assert_eq!(report.frame_index, model.frame_index);
        assert!(report.skipped.is_none(), "{report:?}");
        assert_eq!(report.quads, model.per_camera[i], "camera {i}");
        assert!(report.quads > 0, "camera {i} carved nothing");
    }
    let (lo, hi) = model.bounds().expect("quads");
    for k in 0..3 {
        assert!(lo[k] > -30.0 - 16.0 && hi[k] < 30.0 + 16.0, "{lo:?} {hi:?}");
    }
}

#[test]
fn nested_acquire_fails_while_running() {
    let cfg = config();
    let hull = Reconstructor::start(cfg.clone(), sources(&cfg)).expect("start");
    let output = hull.output();
    wait_frames(&output, 1);
    let guard = output.acquire().expect("first acquire");
    assert_eq!(output.acquire().unwrap_err(), OutputError::AlreadyAcquired);
    drop(guard);
    assert!(output.acquire().is_ok());
}

#[test]
fn full_ray_mode_emits_one_quad_per_ray() {
    let cfg = config();
    let mut hull = Reconstructor::start(cfg.clone(), sources(&cfg)).expect("start");
    let output = hull.output();
    hull.send(Command::ShowFullRays(true));
    hull.send(Command::SetPreview(0, PreviewKind::Keypoints));
    wait_frames(&output, 4);
    hull.stop();

    let model = output.snapshot();
    for report in output.reports() {
        assert!(report.rays > 0);
        assert_eq!(report.quads, report.rays, "{report:?}");
    }
    assert_eq!(model.len(), output.reports().iter().map(|r| r.rays).sum::<usize>());
    assert!(output.preview(0).is_some());
    assert!(output.preview(1).is_none());
}

#[test]
fn start_checks_cameras_and_sources() {
    let empty = HullConfig::default();
    assert!(matches!(
        Reconstructor::start(empty, Vec::<SyntheticSource>::new()),
        Err(OrchestratorError::NoCameras)
    ));
    let cfg = config();
    let mut one = sources(&cfg);
    one.truncate(1);
    assert!(matches!(
        Reconstructor::start(cfg, one),
        Err(OrchestratorError::SourceCount {
            cameras: 2,
            sources: 1
        })
    ));
}

#[test]
fn failing_source_contributes_nothing() {
    let cfg = config();
    let mut srcs = sources(&cfg);
    srcs[1] = SyntheticSource::new("dead", Vec::new());
    let mut hull = Reconstructor::start(cfg, srcs).expect("start");
    let output = hull.output();
    wait_frames(&output, 3);
    hull.stop();
    let model = output.snapshot();
    let reports = output.reports();
    assert_eq!(reports[1].skipped.as_deref(), Some("grab failed"));
    assert_eq!(model.per_camera[1], 0);
    // nothing to carve against, so camera 0 emits nothing either
    assert_eq!(model.per_camera[0], 0);
}

/// Source whose grab number `stall_at` sleeps for `stall`.
struct StallingSource {
    inner: SyntheticSource,
    grabs: usize,
    stall_at: usize,
    stall: Duration,
    stalled: Arc<AtomicBool>,
}

impl FrameSource for StallingSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        if self.grabs == self.stall_at {
            thread::sleep(self.stall);
            self.stalled.store(true, Ordering::Release);
        }
        self.grabs += 1;
        self.inner.grab()
    }

    fn retrieve(&mut self, frame: &mut RgbFrame) -> Result<(), SourceError> {
        self.inner.retrieve(frame)
    }
}

#[test]
fn stalled_camera_skips_frames_and_recovers() {
    let mut cfg = config();
    cfg.processing.thread_timeout_ms = 150;
    let stalled = Arc::new(AtomicBool::new(false));
    let srcs = sources(&cfg)
        .into_iter()
        .enumerate()
        .map(|(i, inner)| StallingSource {
            inner,
            grabs: 0,
            stall_at: if i == 1 { 8 } else { usize::MAX },
            stall: Duration::from_millis(600),
            stalled: stalled.clone(),
        })
        .collect();
    let mut hull = Reconstructor::start(cfg, srcs).expect("start");
    let output = hull.output();

    let deadline = Instant::now() + Duration::from_secs(30);
    while !stalled.load(Ordering::Acquire) {
        assert!(Instant::now() < deadline, "camera 1 never stalled");
        thread::sleep(Duration::from_millis(10));
    }
    let after_stall = output.frames_published();
    wait_frames(&output, after_stall + 4);
    hull.stop();

    let model = output.snapshot();
    // frame indices keep counting through skipped frames, publishes do not
    assert!(
        model.frame_index + 1 > output.frames_published(),
        "frame {} with {} publishes",
        model.frame_index,
        output.frames_published()
    );
    assert_eq!(model.per_camera.len(), 2);
    assert!(model.per_camera.iter().all(|&q| q > 0), "{:?}", model.per_camera);
    for report in output.reports() {
        assert_eq!(report.frame_index, model.frame_index);
        assert!(report.skipped.is_none(), "{report:?}");
    }
}
