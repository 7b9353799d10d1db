//! # Image Batch Worker
//!
//! An HTTP microservice that applies one transformation to a small batch of
//! uploaded images and returns the results as a single multipart response.
//!
//! Pixel work is done by the `transformations` crate. This crate owns the
//! request pipeline around it, built on Actix-web and Tokio.
//!
//! ## Pipeline
//!
//! - [`request`]: method check and multipart buffering
//! - [`operation`]: decoding the operation descriptor into a validated [`transformations::Operation`]
//! - [`batch`]: all-or-nothing admission of the uploaded files
//! - [`dispatch`]: concurrent per-image transformation with ordered join
//! - [`response`]: the multipart response, or a batch failure
//!
//! [`error`] maps every failure to an HTTP status and JSON body, and
//! [`limits`] holds the limits the pipeline enforces.
//!
//! ## Example
//!
//! ```no_run
//! use actix_web::{web, App, HttpServer};
//! use image_batch_worker::handlers::upload;
//! use image_batch_worker::BatchLimits;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let limits = web::Data::new(BatchLimits::default());
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .app_data(limits.clone())
//!             .route("/upload", web::route().to(upload))
//!     })
//!     .bind("0.0.0.0:8080")?
//!     .run()
//!     .await
//! }
//! ```

pub mod batch;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod limits;
pub mod operation;
pub mod request;
pub mod response;

pub use error::{ImageWorkerError, Result};
pub use limits::BatchLimits;
