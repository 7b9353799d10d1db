use actix_web::http::{header, Method, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use transformations::TransformationError;

/// A single image that could not be transformed.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    /// Position of the image in the uploaded batch.
    pub index: usize,
    pub filename: String,
    pub error: String,
    /// Timeouts, panics and lost units are our fault, not the image's.
    #[serde(skip)]
    pub server_fault: bool,
}

#[derive(Debug, Error)]
pub enum ImageWorkerError {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    #[error("could not parse multipart form: {0}")]
    MalformedEnvelope(String),

    #[error("invalid operation descriptor: {0}")]
    InvalidOperationDescriptor(String),

    #[error("invalid operation: {0}")]
    UnknownOperation(String),

    #[error("{0}")]
    InvalidParameters(TransformationError),

    #[error("cannot process {count} files, a batch must contain between 1 and {max} images")]
    InvalidBatchSize { count: usize, max: usize },

    #[error("cannot process {filename}: file is {size} bytes, larger than {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    #[error("invalid file format: {extension:?} ({filename})")]
    UnsupportedFormat { filename: String, extension: String },

    #[error("{}", describe_failures(.0))]
    BatchFailed(Vec<ItemFailure>),

    #[error("could not assemble response: {0}")]
    Assembly(#[from] std::io::Error),
}

impl From<actix_multipart::MultipartError> for ImageWorkerError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        Self::MalformedEnvelope(err.to_string())
    }
}

fn describe_failures(failures: &[ItemFailure]) -> String {
    match failures {
        [] => "batch failed".to_string(),
        [first] => format!("failed to process {}: {}", first.filename, first.error),
        [first, rest @ ..] => format!(
            "failed to process {}: {} (and {} more)",
            first.filename,
            first.error,
            rest.len()
        ),
    }
}

impl ResponseError for ImageWorkerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidOperationDescriptor(_)
            | Self::UnknownOperation(_)
            | Self::InvalidParameters(_)
            | Self::InvalidBatchSize { .. }
            | Self::FileTooLarge { .. }
            | Self::UnsupportedFormat { .. } => StatusCode::BAD_REQUEST,
            Self::BatchFailed(failures) if failures.iter().any(|f| f.server_fault) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BatchFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedEnvelope(_) | Self::Assembly(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Upload failed: {}", self);
        } else {
            log::warn!("Upload rejected: {}", self);
        }

        let mut body = serde_json::json!({ "error": self.to_string() });
        if let Self::BatchFailed(failures) = self {
            body["failures"] = serde_json::json!(failures);
        }

        let mut response = HttpResponse::build(status);
        if let Self::MethodNotAllowed(_) = self {
            response.insert_header((header::ALLOW, "POST"));
        }
        response.json(body)
    }
}

pub type Result<T> = std::result::Result<T, ImageWorkerError>;
