use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use transformations::OperationKind;

use crate::batch::extract_batch;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::limits::BatchLimits;
use crate::operation::resolve_operation;
use crate::request::{ensure_upload_method, read_form};
use crate::response::assemble;

/// Handles the upload endpoint
///
/// Accepts a multipart form with an `operation` descriptor and 1-3 `images`,
/// and returns the transformed images as a multipart body in upload order.
pub async fn upload(
    req: HttpRequest,
    payload: Multipart,
    limits: web::Data<BatchLimits>,
) -> Result<HttpResponse> {
    ensure_upload_method(&req)?;

    let form = read_form(payload, &limits).await?;
    let operation = resolve_operation(form.operation.as_deref(), &limits.transform)?;
    let items = extract_batch(form.files, &limits)?;

    let processed = dispatch(items, operation, limits.item_timeout).await;
    assemble(processed)
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub features: Vec<String>,
}

pub async fn health_check() -> actix_web::Result<impl actix_web::Responder> {
    let health_status = HealthStatus {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: OperationKind::ALL
            .iter()
            .map(|kind| kind.name().to_string())
            .collect(),
    };

    Ok(web::Json(health_status))
}
