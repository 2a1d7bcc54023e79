use crate::source::SourceError;
use thiserror::Error;

/// Errors surfaced by the per-camera pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A result was queried before the stage producing it ever ran.
    #[error("{0} is not ready yet")]
    NotReady(&'static str),
    #[error("frame size {actual:?} does not match the configured size {expected:?}")]
    FrameSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}
