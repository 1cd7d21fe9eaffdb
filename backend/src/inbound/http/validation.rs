//! Shared validation helpers for inbound HTTP adapters.
//!
//! Extractor failures (malformed JSON, bad query strings, non-UUID path
//! segments) are rewritten into the domain `invalid_request` payload so
//! every 400 response has the same shape.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, web};
use pagination::{PageParams, PageRequest};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::domain::Error;

/// Largest JSON body accepted by the API.
const JSON_LIMIT_BYTES: usize = 256 * 1024;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MalformedBody,
    InvalidQuery,
    InvalidUuid,
    InvalidValue,
    OutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedBody => "malformed_body",
            ErrorCode::InvalidQuery => "invalid_query",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::OutOfRange => "out_of_range",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn request_error(code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "code": code.as_str() }))
}

fn field_error(field: &str, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

/// Page parameters shared by list endpoints without filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// One-based page number (default 1).
    pub page: Option<u32>,
    /// Page size, 1 to 100 (default 20).
    pub limit: Option<u32>,
}

/// Validate page parameters, applying the default page size.
pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageParams { page, limit }
        .into_request()
        .map_err(|err| field_error(err.field(), ErrorCode::OutOfRange, err.to_string()))
}

/// Parse a path segment naming a closed value such as a workflow step.
pub(crate) fn parse_segment<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: std::str::FromStr,
{
    value.parse().map_err(|_| {
        let name = field.as_str();
        Error::invalid_request(format!("{name} has an unknown value")).with_details(json!({
            "field": name,
            "value": value,
            "code": ErrorCode::InvalidValue.as_str(),
        }))
    })
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "request body is too large".to_owned()
        }
        JsonPayloadError::ContentType => "expected an application/json body".to_owned(),
        JsonPayloadError::Deserialize(inner) => format!("malformed JSON body: {inner}"),
        other => format!("malformed JSON body: {other}"),
    };
    request_error(ErrorCode::MalformedBody, message).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    request_error(ErrorCode::InvalidQuery, format!("invalid query string: {err}")).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    request_error(ErrorCode::InvalidUuid, format!("invalid path parameter: {err}")).into()
}

/// Register extractor configs that report failures as domain errors.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(json_error),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .app_data(web::PathConfig::default().error_handler(path_error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode as DomainCode, WorkflowStepKey};
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(Some(0), None, "page")]
    #[case(None, Some(0), "limit")]
    #[case(Some(1), Some(101), "limit")]
    fn page_request_rejects_out_of_range(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] field: &str,
    ) {
        let error = page_request(page, limit).expect_err("out of range");
        assert_eq!(error.code(), DomainCode::InvalidRequest);
        let details = error.details().expect("details");
        assert_eq!(details.get("field").and_then(Value::as_str), Some(field));
        assert_eq!(
            details.get("code").and_then(Value::as_str),
            Some("out_of_range")
        );
    }

    #[rstest]
    fn page_request_applies_defaults() {
        let request = page_request(None, None).expect("defaults");
        assert_eq!((request.page(), request.limit()), (1, 20));
    }

    #[rstest]
    fn parse_segment_reports_field_and_value() {
        let error = parse_segment::<WorkflowStepKey>("nope", FieldName::new("step"))
            .expect_err("unknown step");
        let details = error.details().expect("details");
        assert_eq!(details.get("field").and_then(Value::as_str), Some("step"));
        assert_eq!(details.get("value").and_then(Value::as_str), Some("nope"));
    }
}
