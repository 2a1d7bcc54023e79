//! Typed control commands.
use crate::preview::PreviewKind;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Commands accepted by a running reconstructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Every camera samples a new background on its next frame.
    RecomputeBackground,
    /// Switches the preview of one camera.
    SetPreview(usize, PreviewKind),
    /// Emits each ray as one full-width quad instead of carved quads.
    ShowFullRays(bool),
}

/// What the coordinator forwards to a single camera worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CameraCommand {
    RecomputeBackground,
    SetPreview(PreviewKind),
}

/// Drains every pending message without blocking. Returns `false` once the
/// channel is disconnected.
pub(crate) fn drain<T>(rx: &Receiver<T>, mut f: impl FnMut(T)) -> bool {
    loop {
        match rx.try_recv() {
            Ok(msg) => f(msg),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

/// Routes `command` to the per-camera channels. Returns the new full-ray
/// flag when the command changes it.
pub(crate) fn route(command: Command, cameras: &[Sender<CameraCommand>]) -> Option<bool> {
    match command {
        Command::RecomputeBackground => {
            for tx in cameras {
                let _ = tx.send(CameraCommand::RecomputeBackground);
            }
            None
        }
        Command::SetPreview(camera, kind) => {
            match cameras.get(camera) {
                Some(tx) => {
                    let _ = tx.send(CameraCommand::SetPreview(kind));
                }
                None => log::warn!("preview requested for unknown camera {camera}"),
            }
            None
        }
        Command::ShowFullRays(enabled) => Some(enabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn commands_fan_out_to_cameras() {
        let (txs, rxs): (Vec<_>, Vec<_>) = (0..2).map(|_| unbounded()).unzip();
        assert_eq!(route(Command::RecomputeBackground, &txs), None);
        assert_eq!(route(Command::SetPreview(1, PreviewKind::Keypoints), &txs), None);
        assert_eq!(route(Command::SetPreview(9, PreviewKind::Live), &txs), None);
        assert_eq!(route(Command::ShowFullRays(true), &txs), Some(true));

        let mut first = Vec::new();
        assert!(drain(&rxs[0], |c| first.push(c)));
        assert_eq!(first, vec![CameraCommand::RecomputeBackground]);
        let mut second = Vec::new();
        assert!(drain(&rxs[1], |c| second.push(c)));
        assert_eq!(
            second,
            vec![
                CameraCommand::RecomputeBackground,
                CameraCommand::SetPreview(PreviewKind::Keypoints)
            ]
        );
    }

    #[test]
    fn drain_reports_disconnect() {
        let (tx, rx) = unbounded::<Command>();
        tx.send(Command::ShowFullRays(false)).expect("send");
        drop(tx);
        let mut seen = 0;
        assert!(!drain(&rx, |_| seen += 1));
        assert_eq!(seen, 1);
    }
}
