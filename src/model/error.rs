use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("index {index} is out of range for {count} stored samples")]
    OutOfRange { index: usize, count: usize },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("x data mismatch: stream expects x = {expected}, batch has x = {actual}")]
    XMismatch { expected: bool, actual: bool },
    #[error("invalid x range: min ({min}) must be less than max ({max})")]
    InvalidRange { min: f64, max: f64 },
    #[error("ragged batch: channel {channel} has {actual} samples, expected {expected}")]
    RaggedBatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },
    #[error("too many channels: requested {requested}, at most {max} supported")]
    TooManyChannels { requested: usize, max: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl StreamError {
    /// Contract violations from the decoding side; these are never retried.
    pub fn is_shape_violation(&self) -> bool {
        matches!(
            self,
            StreamError::ChannelMismatch { .. }
                | StreamError::XMismatch { .. }
                | StreamError::RaggedBatch { .. }
        )
    }
}
