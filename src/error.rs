use thiserror::Error;

/// Failures a detection pass can hit. All of them stop the monitor.
#[derive(Debug, Error)]
pub enum GazeError {
    #[error("face mesh inference failed: {0}")]
    Inference(String),

    #[error("landmark index {index} out of range for mesh of {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("eye index group is empty")]
    EmptyIndexGroup,

    #[error("could not read frame: {0}")]
    Frame(String),
}
