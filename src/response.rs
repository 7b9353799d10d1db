use crate::dispatch::ProcessedImage;
use crate::error::{ImageWorkerError, ItemFailure, Result};
use actix_web::HttpResponse;
use image::ImageFormat;
use std::io::{self, Write};

/// A transformed image ready to be written into the response.
#[derive(Debug)]
pub struct ProcessedOutput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Applies the all-or-nothing policy to a dispatched batch.
///
/// Every image must have succeeded. Otherwise the batch fails with every
/// failure listed in input order, and no partial output is returned.
pub fn settle(processed: Vec<ProcessedImage>) -> Result<Vec<ProcessedOutput>> {
    let mut outputs = Vec::with_capacity(processed.len());
    let mut failures = Vec::new();

    for (index, ProcessedImage { filename, outcome }) in processed.into_iter().enumerate() {
        match outcome {
            Ok(bytes) => outputs.push(ProcessedOutput { filename, bytes }),
            Err(e) => failures.push(ItemFailure {
                index,
                filename,
                server_fault: e.is_server_fault(),
                error: e.to_string(),
            }),
        }
    }

    if !failures.is_empty() {
        return Err(ImageWorkerError::BatchFailed(failures));
    }
    Ok(outputs)
}

/// Builds the `multipart/form-data` response for a dispatched batch.
pub fn assemble(processed: Vec<ProcessedImage>) -> Result<HttpResponse> {
    let outputs = settle(processed)?;

    let writer = MultipartWriter::new(Vec::new());
    let content_type = writer.content_type();
    let body = write_parts(writer, &outputs)?;

    log::info!(
        "Assembled response with {} part(s), {} bytes",
        outputs.len(),
        body.len()
    );

    Ok(HttpResponse::Ok().content_type(content_type).body(body))
}

/// Writes one file part per output, in order, and closes the body.
pub fn write_parts<W: Write>(mut writer: MultipartWriter<W>, outputs: &[ProcessedOutput]) -> Result<W> {
    for output in outputs {
        writer.write_file(&output.filename, content_type_for(&output.bytes), &output.bytes)?;
    }
    Ok(writer.finish()?)
}

fn content_type_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Minimal `multipart/form-data` encoder.
pub struct MultipartWriter<W: Write> {
    inner: W,
    boundary: String,
    parts: usize,
}

impl<W: Write> MultipartWriter<W> {
    /// Creates a writer with a random boundary.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            boundary: uuid::Uuid::new_v4().simple().to_string(),
            parts: 0,
        }
    }

    /// Creates a writer with a caller supplied boundary, which must be 1 to 70
    /// characters drawn from the RFC 2046 boundary alphabet.
    pub fn with_boundary(inner: W, boundary: &str) -> Result<Self> {
        if !is_valid_boundary(boundary) {
            return Err(ImageWorkerError::Assembly(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid multipart boundary {:?}", boundary),
            )));
        }
        Ok(Self {
            inner,
            boundary: boundary.to_string(),
            parts: 0,
        })
    }

    /// The `Content-Type` header value for the body being written.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn write_file(&mut self, name: &str, content_type: &str, body: &[u8]) -> io::Result<()> {
        let name = escape_quotes(name);
        if self.parts > 0 {
            self.inner.write_all(b"\r\n")?;
        }
        write!(
            self.inner,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary, name, name, content_type
        )?;
        self.inner.write_all(body)?;
        self.parts += 1;
        Ok(())
    }

    /// Writes the closing boundary and hands back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.parts > 0 {
            self.inner.write_all(b"\r\n")?;
        }
        write!(self.inner, "--{}--\r\n", self.boundary)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn is_valid_boundary(boundary: &str) -> bool {
    const SPECIALS: &str = "'()+_,-./:=? ";
    (1..=70).contains(&boundary.len())
        && !boundary.ends_with(' ')
        && boundary
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
}

fn escape_quotes(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ItemError;
    use std::time::Duration;
    use transformations::TransformationError;

    fn ok(filename: &str, bytes: &[u8]) -> ProcessedImage {
        ProcessedImage {
            filename: filename.to_string(),
            outcome: Ok(bytes.to_vec()),
        }
    }

    fn failed(filename: &str, error: ItemError) -> ProcessedImage {
        ProcessedImage {
            filename: filename.to_string(),
            outcome: Err(error),
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_output_layout() {
        let mut writer = MultipartWriter::with_boundary(Vec::new(), "XYZ").unwrap();
        writer.write_file("a.png", "image/png", b"AAA").unwrap();
        writer.write_file("b.jpg", "image/jpeg", b"BB").unwrap();
        let body = writer.finish().unwrap();

        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"a.png\"; filename=\"a.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            AAA\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"b.jpg\"; filename=\"b.jpg\"\r\n\
            Content-Type: image/jpeg\r\n\r\n\
            BB\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_random_boundary_in_content_type() {
        let writer = MultipartWriter::new(Vec::new());
        let content_type = writer.content_type();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        assert!(is_valid_boundary(boundary));
        assert_ne!(MultipartWriter::new(Vec::new()).content_type(), content_type);
    }

    #[test]
    fn test_invalid_boundary_is_rejected() {
        let too_long = "x".repeat(71);
        for boundary in ["", "has\"quote", "trailing ", too_long.as_str()] {
            let result = MultipartWriter::with_boundary(Vec::new(), boundary);
            assert!(matches!(result, Err(ImageWorkerError::Assembly(_))));
        }
    }

    #[test]
    fn test_quotes_in_filenames_are_escaped() {
        let mut writer = MultipartWriter::with_boundary(Vec::new(), "b").unwrap();
        writer.write_file("we\"ird.png", "image/png", b"").unwrap();
        let body = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(body.contains(r#"name="we\"ird.png""#));
    }

    #[test]
    fn test_settle_keeps_input_order() {
        let outputs = settle(vec![ok("1.png", b"one"), ok("2.png", b"two")]).unwrap();
        let names: Vec<_> = outputs.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, ["1.png", "2.png"]);
    }

    #[test]
    fn test_settle_fails_whole_batch_on_any_item_error() {
        let processed = vec![
            ok("good.png", b"fine"),
            failed(
                "bad.png",
                ItemError::Transformation(TransformationError::Processing("corrupt".to_string())),
            ),
            failed("slow.png", ItemError::TimedOut(Duration::from_secs(5))),
        ];

        let err = settle(processed).unwrap_err();

        match err {
            ImageWorkerError::BatchFailed(failures) => {
                assert_eq!(failures.len(), 2);
                assert_eq!((failures[0].index, failures[0].filename.as_str()), (1, "bad.png"));
                assert!(!failures[0].server_fault);
                assert_eq!((failures[1].index, failures[1].filename.as_str()), (2, "slow.png"));
                assert!(failures[1].server_fault);
            }
            other => panic!("expected BatchFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_assemble_failed_batch_has_no_body() {
        let processed = vec![failed(
            "bad.png",
            ItemError::Transformation(TransformationError::Processing("corrupt".to_string())),
        )];
        assert!(assemble(processed).is_err());
    }

    #[test]
    fn test_assemble_sets_multipart_content_type() {
        let response = assemble(vec![ok("x.png", b"data")]).unwrap();
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_write_failure_is_assembly_error() {
        let writer = MultipartWriter::with_boundary(BrokenWriter, "b").unwrap();
        let outputs = vec![ProcessedOutput {
            filename: "a.png".to_string(),
            bytes: b"data".to_vec(),
        }];

        let result = write_parts(writer, &outputs);

        assert!(matches!(result, Err(ImageWorkerError::Assembly(_))));
    }

    #[test]
    fn test_content_type_sniffing() {
        assert_eq!(content_type_for(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]), "image/png");
        assert_eq!(content_type_for(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(content_type_for(b"plain"), "application/octet-stream");
    }
}
