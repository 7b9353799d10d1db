use crate::error::Result;
use crate::limits::MAX_DECODE_DIMENSION;
use image::io::{Limits, Reader};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Decodes raw bytes, returning the image together with the detected container format.
///
/// Images wider or taller than [`MAX_DECODE_DIMENSION`] are rejected from
/// their header, before any pixel buffer is allocated.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(bytes)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);

    let mut reader = Reader::with_format(Cursor::new(bytes), format);
    reader.limits(limits);
    let image = reader.decode()?;
    log::debug!(
        "Decoded {:?} image ({}x{})",
        format,
        image.width(),
        image.height()
    );
    Ok((image, format))
}

/// Encodes an image back into the given container format.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());

    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut output, format)?,
        _ => image.write_to(&mut output, format)?,
    }

    Ok(output.into_inner())
}
