mod common;

use common::scene::{sources, tilted_cube, two_camera_config};
use std::time::{Duration, Instant};
use visual_hull::pipeline::SyncDriver;
use visual_hull::preview::PreviewKind;
use visual_hull::{Command, ModelFrame, Reconstructor};

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn threaded_frames_match_the_synchronous_driver() {
    let config = two_camera_config();
    let cube = tilted_cube();

    let mut driver = SyncDriver::new(&config, sources(&config, &[cube]));
    let mut expected = ModelFrame::default();
    driver.reconstruct_frame(&mut expected);
    driver.reconstruct_frame(&mut expected);

    let mut hull = Reconstructor::start(config.clone(), sources(&config, &[cube])).expect("start");
    let output = hull.output();
    wait_until(|| output.frames_published() >= 5);
    hull.stop();

    let model = output.acquire().expect("acquire");
    assert!(model.frame_index >= 4);
    assert_eq!(model.per_camera, expected.per_camera);
    assert_eq!(model.quads, expected.quads);
}

#[test]
fn concatenation_follows_camera_order_every_frame() {
    let config = two_camera_config();
    let hull = Reconstructor::start(config.clone(), sources(&config, &[tilted_cube()]))
        .expect("start");
    let output = hull.output();
    let mut checked = 0;
    let mut last_frame = None;
    while checked < 4 {
        assert!(
            output.wait_for_new_model(Duration::from_secs(30)),
            "no model published"
        );
        let model = output.acquire().expect("acquire");
        assert_eq!(model.per_camera.len(), 2);
        assert_eq!(model.per_camera.iter().sum::<usize>(), model.len());
        if let Some(last) = last_frame {
            assert!(model.frame_index > last, "frames out of order");
        }
        last_frame = Some(model.frame_index);
        checked += 1;
    }
}

#[test]
fn recomputed_background_absorbs_a_static_object() {
    let config = two_camera_config();
    let hull = Reconstructor::start(config.clone(), sources(&config, &[tilted_cube()]))
        .expect("start");
    let output = hull.output();
    wait_until(|| !output.snapshot().is_empty());

    hull.send(Command::RecomputeBackground);
    hull.send(Command::SetPreview(1, PreviewKind::BinaryMask));
    // the sources keep showing the cube, so the new background absorbs it
    // and the carved model disappears
    wait_until(|| output.snapshot().is_empty() && output.preview(1).is_some());
}
