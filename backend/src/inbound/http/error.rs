//! HTTP rendering of domain errors.
//!
//! Handlers return [`ApiResult`]; failures become the JSON error envelope
//! with the request's trace id echoed in the `trace-id` header. Plan limits
//! answer 402 so clients can offer an upgrade, and 503 responses carry a
//! `Retry-After` hint while the database is unreachable. Internal failures
//! are logged in full and reach the client redacted.

use std::borrow::Cow;

use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Seconds clients should wait before retrying a 503.
const RETRY_AFTER_SECONDS: &str = "5";

/// Status code for each stable error code.
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::LimitExceeded => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The payload a client may see: internal errors keep only the trace id.
fn client_view(err: &Error) -> Cow<'_, Error> {
    if err.code() != ErrorCode::InternalError {
        return Cow::Borrowed(err);
    }
    error!(
        message = err.message(),
        details = ?err.details(),
        trace_id = ?err.trace_id(),
        "internal error"
    );
    let redacted = Error::internal("Internal server error");
    Cow::Owned(match err.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    })
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        if self.code() == ErrorCode::ServiceUnavailable {
            builder.insert_header((RETRY_AFTER, RETRY_AFTER_SECONDS));
        }
        builder.json(client_view(self).as_ref())
    }
}
