use thiserror::Error;

/// Raised while decoding a weight blob into the compiled topology.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("weight blob does not match the compiled topology: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognizeError {
    #[error("invalid image geometry {width}x{height}, expected 28x28")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("invalid pixel format, expected 8-bit single-channel grayscale")]
    InvalidFormat,

    #[error("classifier model is not available")]
    ModelUnavailable,
}

pub type Result<T> = std::result::Result<T, RecognizeError>;
