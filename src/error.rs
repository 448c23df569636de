use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid landmark topology: {0}")]
    InvalidTopology(String),

    #[error("landmark index {index} out of range for a set of {len} landmarks")]
    LandmarkOutOfRange { index: usize, len: usize },

    #[error("rotation matrix cannot be used as an image warp")]
    InvalidWarp,

    #[cfg(feature = "onnx")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::OrtError),

    #[cfg(feature = "onnx")]
    #[error("unexpected model output: {0}")]
    ModelOutput(String),
}

#[cfg(feature = "onnx")]
impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::ModelOutput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
