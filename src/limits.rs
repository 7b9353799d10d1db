use std::path::Path;
use std::time::Duration;
use transformations::TransformLimits;

/// Most images accepted in a single upload.
pub const MAX_BATCH_SIZE: usize = 3;

/// Largest accepted file, in bytes (350 KiB).
pub const MAX_UPLOAD_SIZE: usize = 350 << 10;

/// Default bound on how long a single image may take to transform.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(30);

/// File extensions accepted for upload, lowercase with the leading dot.
pub const SUPPORTED_FORMATS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Every limit the upload pipeline enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_batch_size: usize,
    pub max_upload_size: usize,
    pub transform: TransformLimits,
    /// `None` waits for every item indefinitely.
    pub item_timeout: Option<Duration>,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_batch_size: MAX_BATCH_SIZE,
            max_upload_size: MAX_UPLOAD_SIZE,
            transform: TransformLimits::default(),
            item_timeout: Some(DEFAULT_ITEM_TIMEOUT),
        }
    }
}

/// Returns the dotted extension of `filename` exactly as uploaded.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Case-insensitive membership test against [`SUPPORTED_FORMATS`].
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_FORMATS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = BatchLimits::default();
        assert_eq!(limits.max_batch_size, 3);
        assert_eq!(limits.max_upload_size, 358_400);
        assert_eq!(limits.transform.max_resize_dimension, 1024);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.jpg"), ".jpg");
        assert_eq!(file_extension("archive.tar.PNG"), ".PNG");
        assert_eq!(file_extension("no_extension"), "");
        assert_eq!(file_extension(".hidden"), "");
        assert_eq!(file_extension(""), "");
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension(".jpg"));
        assert!(is_supported_extension(".jpeg"));
        assert!(is_supported_extension(".PNG"));
        assert!(!is_supported_extension(".gif"));
        assert!(!is_supported_extension("png"));
        assert!(!is_supported_extension(""));
    }
}
