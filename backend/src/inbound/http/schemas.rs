//! OpenAPI schema definitions for envelopes that live outside the domain.
//!
//! The `pagination` crate stays free of framework dependencies, so its
//! [`Page`](pagination::Page) envelope is described here instead. Upload
//! forms get a schema too since multipart bodies have no Rust type.

use utoipa::ToSchema;

/// OpenAPI schema for [`pagination::Page`].
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PageSchema<T> {
    /// Records on this page.
    items: Vec<T>,
    /// One-based page number.
    #[schema(example = 1)]
    page: u32,
    /// Page size used for the query.
    #[schema(example = 20)]
    limit: u32,
    /// Total matching records.
    #[schema(example = 42)]
    total: u64,
    /// Number of pages needed to show `total` records.
    #[schema(example = 3)]
    total_pages: u64,
}

/// Multipart form accepted by the attachment upload endpoint.
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AttachmentUploadForm {
    /// Image or PDF, at most 10 MiB.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}
