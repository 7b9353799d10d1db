use crate::batch::ImageItem;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use transformations::{Operation, TransformationError};

/// Why a single dispatched image produced no output.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Transformation(#[from] TransformationError),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("processing aborted: {0}")]
    Aborted(String),

    #[error("processing unit never reported a result")]
    Lost,
}

impl ItemError {
    /// Whether the failure lies with the service rather than the submitted image.
    pub fn is_server_fault(&self) -> bool {
        !matches!(self, Self::Transformation(_))
    }
}

/// The outcome of transforming one [`ImageItem`].
#[derive(Debug)]
pub struct ProcessedImage {
    pub filename: String,
    pub outcome: Result<Vec<u8>, ItemError>,
}

/// Transforms every item concurrently and waits for all of them.
///
/// One task is spawned per item and the pixel work runs on the blocking
/// pool. Results travel through a channel sized to the batch, tagged with
/// their submission index, and are slotted back so the returned vector is in
/// input order regardless of completion order.
pub async fn dispatch(
    items: Vec<ImageItem>,
    operation: Operation,
    item_timeout: Option<Duration>,
) -> Vec<ProcessedImage> {
    if items.is_empty() {
        return Vec::new();
    }

    let total = items.len();
    let filenames: Vec<String> = items.iter().map(|item| item.filename.clone()).collect();
    let (tx, mut rx) = mpsc::channel::<(usize, ProcessedImage)>(total);

    log::info!("Dispatching {} image(s) for {}", total, operation.kind());

    for (index, item) in items.into_iter().enumerate() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let processed = process_item(item, operation, item_timeout).await;
            // The receiver only goes away if the request itself was dropped.
            let _ = tx.send((index, processed)).await;
        });
    }
    drop(tx);

    let mut slots: Vec<Option<ProcessedImage>> = (0..total).map(|_| None).collect();
    while let Some((index, processed)) = rx.recv().await {
        log::debug!("Image {} ({}) finished", index, processed.filename);
        slots[index] = Some(processed);
    }

    slots
        .into_iter()
        .zip(filenames)
        .map(|(slot, filename)| {
            slot.unwrap_or_else(|| ProcessedImage {
                filename,
                outcome: Err(ItemError::Lost),
            })
        })
        .collect()
}

async fn process_item(
    item: ImageItem,
    operation: Operation,
    item_timeout: Option<Duration>,
) -> ProcessedImage {
    let ImageItem { filename, bytes } = item;
    let work = tokio::task::spawn_blocking(move || operation.apply(&bytes));

    let joined = match item_timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                log::warn!("Processing {} timed out after {:?}", filename, limit);
                return ProcessedImage {
                    filename,
                    outcome: Err(ItemError::TimedOut(limit)),
                };
            }
        },
        None => work.await,
    };

    let outcome = match joined {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            log::warn!("Failed to process {}: {}", filename, e);
            Err(ItemError::Transformation(e))
        }
        Err(e) => {
            log::error!("Processing task for {} failed: {}", filename, e);
            Err(ItemError::Aborted(e.to_string()))
        }
    };

    ProcessedImage { filename, outcome }
}
