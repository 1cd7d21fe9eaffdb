//! Work-order attachment upload and download.
//!
//! ```text
//! POST /api/v1/work-orders/{id}/attachments   multipart/form-data, field "file"
//! GET  /api/v1/work-orders/{id}/attachments/{attachmentId}
//! ```
//!
//! The multipart stream is read into memory up to the attachment cap; any
//! byte past it fails the request without buffering the rest.

use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};
use futures_util::TryStreamExt;
use serde_json::json;

use crate::domain::{
    Attachment, AttachmentUpload, Error, LineId, MAX_ATTACHMENT_BYTES, WorkOrderId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::AttachmentUploadForm;
use crate::inbound::http::state::HttpState;

const FILE_FIELD: &str = "file";

fn multipart_error(message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": FILE_FIELD,
        "code": "invalid_multipart",
    }))
}

async fn read_capped(field: &mut Field) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|err| multipart_error(format!("unreadable upload: {err}")))?
    {
        if bytes.len() + chunk.len() > MAX_ATTACHMENT_BYTES {
            return Err(Error::invalid_request("file exceeds 10 MiB").with_details(json!({
                "field": FILE_FIELD,
                "code": "too_large",
            })));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Pull the `file` part out of the form, ignoring any other fields.
async fn extract_upload(mut form: Multipart) -> Result<AttachmentUpload, Error> {
    while let Some(mut field) = form
        .try_next()
        .await
        .map_err(|err| multipart_error(format!("malformed multipart body: {err}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(ContentDisposition::get_filename)
            .unwrap_or("upload")
            .to_owned();
        let content_type = field
            .content_type()
            .map_or_else(|| "application/octet-stream".to_owned(), ToString::to_string);
        let bytes = read_capped(&mut field).await?;
        return Ok(AttachmentUpload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(multipart_error("multipart body has no file field"))
}

/// Attach a photo or PDF (at most 10 MiB) to an open work order.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/attachments",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body(content = AttachmentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment stored", body = Attachment),
        (status = 400, description = "Missing, oversized or unsupported file", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Order is closed", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "uploadAttachment"
)]
#[post("/work-orders/{id}/attachments")]
pub async fn upload_attachment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    form: Multipart,
) -> ApiResult<HttpResponse> {
    let upload = extract_upload(form).await?;
    let attachment = state
        .work_orders
        .upload_attachment(&principal, path.into_inner(), upload)
        .await?;
    Ok(HttpResponse::Created().json(attachment))
}

/// Download an attachment with its stored content type.
#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}/attachments/{attachment_id}",
    params(
        ("id" = WorkOrderId, Path, description = "Work order identifier"),
        ("attachment_id" = LineId, Path, description = "Attachment identifier")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "downloadAttachment"
)]
#[get("/work-orders/{id}/attachments/{attachment_id}")]
pub async fn download_attachment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<(WorkOrderId, LineId)>,
) -> ApiResult<HttpResponse> {
    let (id, attachment_id) = path.into_inner();
    let (attachment, bytes) = state
        .work_orders
        .download_attachment(&principal, id, attachment_id)
        .await?;
    Ok(HttpResponse::Ok()
        .content_type(attachment.content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(attachment.file_name)],
        })
        .body(bytes))
}
