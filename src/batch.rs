use crate::error::{ImageWorkerError, Result};
use crate::limits::{file_extension, is_supported_extension, BatchLimits};
use crate::request::FormFile;

/// An admitted image waiting to be transformed.
#[derive(Debug)]
pub struct ImageItem {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Admits an uploaded batch, all or nothing.
///
/// The count is checked first, then every file in upload order. The first
/// file that is too large or has an unsupported extension rejects the whole
/// batch, so nothing is dispatched unless every file passes.
pub fn extract_batch(files: Vec<FormFile>, limits: &BatchLimits) -> Result<Vec<ImageItem>> {
    validate_batch_size(files.len(), limits.max_batch_size)?;

    let items = files
        .into_iter()
        .map(|file| admit_file(file, limits))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Admitted {} image(s) for processing", items.len());
    Ok(items)
}

fn validate_batch_size(count: usize, max: usize) -> Result<()> {
    if count < 1 || count > max {
        return Err(ImageWorkerError::InvalidBatchSize { count, max });
    }
    Ok(())
}

fn admit_file(file: FormFile, limits: &BatchLimits) -> Result<ImageItem> {
    let FormFile {
        filename,
        bytes,
        size,
    } = file;

    if size > limits.max_upload_size {
        return Err(ImageWorkerError::FileTooLarge {
            filename,
            size,
            limit: limits.max_upload_size,
        });
    }

    let extension = file_extension(&filename);
    if !is_supported_extension(&extension) {
        return Err(ImageWorkerError::UnsupportedFormat {
            filename,
            extension,
        });
    }

    Ok(ImageItem { filename, bytes })
}
