use crate::error::{ImageWorkerError, Result};
use crate::limits::BatchLimits;
use actix_multipart::{Field, Multipart};
use actix_web::http::Method;
use actix_web::HttpRequest;
use futures_util::TryStreamExt;

/// Form field carrying the JSON operation descriptor.
pub const OPERATION_FIELD: &str = "operation";

/// Form field carrying the uploaded image files.
pub const IMAGES_FIELD: &str = "images";

/// Largest operation descriptor we are willing to buffer, in bytes.
pub const MAX_OPERATION_FIELD_SIZE: usize = 16 << 10;

/// The buffered contents of an upload form.
#[derive(Debug, Default)]
pub struct ParsedForm {
    /// Raw text of the first `operation` field, if any.
    pub operation: Option<String>,
    /// File parts under `images`, in upload order.
    pub files: Vec<FormFile>,
}

#[derive(Debug)]
pub struct FormFile {
    pub filename: String,
    /// Content of the part, left empty once `size` passes what we keep.
    pub bytes: Vec<u8>,
    /// Length of the part as uploaded.
    pub size: usize,
}

/// Rejects every verb except `POST`.
pub fn ensure_upload_method(req: &HttpRequest) -> Result<()> {
    if *req.method() != Method::POST {
        return Err(ImageWorkerError::MethodNotAllowed(req.method().clone()));
    }
    Ok(())
}

/// Buffers the multipart envelope.
///
/// At most `max_batch_size` image parts are kept, each up to
/// `max_upload_size` bytes. Parts past either limit are still read to the
/// end and their size recorded, so batch admission can reject them with the
/// real count and size. Parts that are neither the operation descriptor nor
/// an image file are drained and discarded.
pub async fn read_form(mut payload: Multipart, limits: &BatchLimits) -> Result<ParsedForm> {
    let mut form = ParsedForm::default();
    let mut buffered = 0usize;

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let name = content_disposition.get_name().map(str::to_owned);
        let filename = content_disposition.get_filename().map(str::to_owned);

        match (name.as_deref(), filename) {
            (Some(OPERATION_FIELD), _) => {
                let raw = read_operation(&mut field).await?;
                if form.operation.is_none() {
                    let text = String::from_utf8(raw).map_err(|_| {
                        ImageWorkerError::MalformedEnvelope(
                            "operation field is not valid UTF-8".to_string(),
                        )
                    })?;
                    form.operation = Some(text);
                }
            }
            (Some(IMAGES_FIELD), Some(filename)) => {
                let keep = if form.files.len() < limits.max_batch_size {
                    limits.max_upload_size
                } else {
                    0
                };
                let (bytes, size) = read_capped(&mut field, keep).await?;
                buffered += bytes.len();
                log::debug!("Read {} ({} bytes, {} buffered)", filename, size, bytes.len());
                form.files.push(FormFile {
                    filename,
                    bytes,
                    size,
                });
            }
            _ => drain_field(&mut field).await?,
        }
    }

    log::info!(
        "Parsed upload form: {} file(s), {} bytes buffered",
        form.files.len(),
        buffered
    );
    Ok(form)
}

async fn read_operation(field: &mut Field) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if data.len() + chunk.len() > MAX_OPERATION_FIELD_SIZE {
            return Err(ImageWorkerError::MalformedEnvelope(format!(
                "operation field exceeds the {} byte limit",
                MAX_OPERATION_FIELD_SIZE
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Reads a whole field, keeping its content only while it fits in `keep` bytes.
async fn read_capped(field: &mut Field, keep: usize) -> Result<(Vec<u8>, usize)> {
    let mut data = Vec::new();
    let mut size = 0usize;
    while let Some(chunk) = field.try_next().await? {
        size += chunk.len();
        if size <= keep {
            data.extend_from_slice(&chunk);
        } else if !data.is_empty() {
            data = Vec::new();
        }
    }
    Ok((data, size))
}

async fn drain_field(field: &mut Field) -> Result<()> {
    while field.try_next().await?.is_some() {}
    Ok(())
}
