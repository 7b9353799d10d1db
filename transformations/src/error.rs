use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformationError {
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("invalid percentage: {0}")]
    InvalidPercentage(String),

    #[error("invalid rotation angle: {0}")]
    InvalidAngle(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, TransformationError>;
