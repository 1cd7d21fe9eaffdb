//! File attachments kept on work orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::FieldError;
use super::{LineId, UserId, WorkOrderId};

/// Largest accepted upload in bytes (10 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Metadata of a stored attachment. The bytes live in the file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: LineId,
    pub work_order_id: WorkOrderId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

/// Accept images and PDFs only.
pub fn check_content_type(content_type: &str) -> Result<(), FieldError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if essence.starts_with("image/") || essence == "application/pdf" {
        return Ok(());
    }
    Err(FieldError::new(
        "file",
        "unsupported_media_type",
        format!("content type {essence} is not accepted"),
    ))
}

/// Reduce a client supplied name to its final path component.
pub fn sanitise_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(200)
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_owned()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", true)]
    #[case("IMAGE/JPEG; charset=binary", true)]
    #[case("application/pdf", true)]
    #[case("text/plain", false)]
    #[case("application/x-msdownload", false)]
    fn content_types(#[case] content_type: &str, #[case] accepted: bool) {
        assert_eq!(check_content_type(content_type).is_ok(), accepted);
    }

    #[rstest]
    #[case("../../etc/passwd", "passwd")]
    #[case("C:\\photos\\dent.jpg", "dent.jpg")]
    #[case("..", "upload")]
    #[case("", "upload")]
    fn file_names_are_sanitised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitise_file_name(raw), expected);
    }
}
