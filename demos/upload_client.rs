//! Example client for the image batch worker upload endpoint
//!
//! This example shows how to:
//! - Send up to three images with an operation descriptor
//! - Split the multipart response
//! - Save every transformed image to disk
//!
//! Usage:
//! ```bash
//! cargo run --example upload_client -- --operation resize --width 500 --height 500 a.png b.jpg
//! cargo run --example upload_client -- --operation rotate --angle 90 -o rotated/ a.png
//! ```

use actix_multipart::Multipart;
use actix_web::error::PayloadError;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::web::Bytes;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures_util::{stream, TryStreamExt};
use reqwest::multipart;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OperationArg {
    Resize,
    Enlarge,
    Rotate,
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Transform a batch of images with the image batch worker")]
struct Args {
    /// Image files to upload (1 to 3)
    #[clap(value_parser, required = true)]
    inputs: Vec<PathBuf>,

    /// Transformation to apply
    #[clap(long, value_enum)]
    operation: OperationArg,

    /// Target width for resize
    #[clap(long)]
    width: Option<i64>,

    /// Target height for resize
    #[clap(long)]
    height: Option<i64>,

    /// Scale percentage for enlarge
    #[clap(long)]
    percentage: Option<i64>,

    /// Clockwise angle for rotate (90, 180 or 270)
    #[clap(long)]
    angle: Option<i64>,

    /// Directory the transformed images are written to
    #[clap(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Image batch worker service URL
    #[clap(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Show detailed timing information
    #[clap(short, long)]
    verbose: bool,
}

impl Args {
    fn descriptor(&self) -> serde_json::Value {
        let (name, parameters) = match self.operation {
            OperationArg::Resize => (
                "resize",
                serde_json::json!({ "width": self.width, "height": self.height }),
            ),
            OperationArg::Enlarge => ("enlarge", serde_json::json!({ "percentage": self.percentage })),
            OperationArg::Rotate => ("rotate", serde_json::json!({ "angle": self.angle })),
        };
        serde_json::json!({ "operation": name, "parameters": parameters })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let start = Instant::now();
    let mut form = multipart::Form::new().text("operation", args.descriptor().to_string());

    for input in &args.inputs {
        let data = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read input file: {:?}", input))?;
        let filename = input
            .file_name()
            .with_context(|| format!("Input has no file name: {:?}", input))?
            .to_string_lossy()
            .to_string();

        println!("Read {} bytes from {:?}", data.len(), input);
        form = form.part("images", multipart::Part::bytes(data).file_name(filename));
    }

    let client = reqwest::Client::new();
    let url = format!("{}/upload", args.url);

    println!("Sending request to {}", url);
    let request_start = Instant::now();

    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;

    if args.verbose {
        println!("Request took: {:?}", request_start.elapsed());
        println!("Response status: {}", response.status());
    }

    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        anyhow::bail!("Server returned error {}: {}", status, error_body);
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .context("Response has no content type")?
        .to_string();
    let body = response
        .bytes()
        .await
        .context("Failed to download response body")?;

    let parts = split_parts(&content_type, body).await?;

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("Failed to create output directory: {:?}", args.output_dir))?;

    for (filename, bytes) in &parts {
        // Never let a part name escape the output directory
        let name = PathBuf::from(filename)
            .file_name()
            .map(|name| name.to_os_string())
            .with_context(|| format!("Unusable part name: {:?}", filename))?;
        let path = args.output_dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write output file: {:?}", path))?;
        println!("Saved {} bytes to {:?}", bytes.len(), path);
    }

    println!("\nSuccess! {} image(s) transformed", parts.len());
    println!("Total time:  {:?}", start.elapsed());

    Ok(())
}

/// Splits a `multipart/form-data` body into `(name, bytes)` pairs.
async fn split_parts(content_type: &str, body: Bytes) -> Result<Vec<(String, Vec<u8>)>> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type).context("Invalid response content type")?,
    );
    let mut multipart = Multipart::new(
        &headers,
        stream::once(async move { Ok::<_, PayloadError>(body) }),
    );

    let mut parts = Vec::new();
    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Malformed multipart response")?
    {
        let name = field
            .content_disposition()
            .get_name()
            .context("Part has no name")?
            .to_string();
        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("Failed to read part")? {
            data.extend_from_slice(&chunk);
        }
        parts.push((name, data));
    }
    Ok(parts)
}
