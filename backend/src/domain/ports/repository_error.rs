//! Error shared by every persistence port.

use serde_json::json;

use super::define_port_error;
use crate::domain::Error;

define_port_error! {
    /// Persistence errors raised by repository adapters.
    pub enum RepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "repository query failed: {message}",
        /// A uniqueness constraint rejected the write. `field` names the
        /// logical key, e.g. `license_plate`.
        Duplicate { field: String } => "duplicate value for {field}",
        /// A guarded write found the record changed since it was read.
        Stale { entity: String } => "{entity} changed since it was read",
    }
}

impl From<RepositoryError> for Error {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Connection { message } => {
                Error::service_unavailable(format!("repository unavailable: {message}"))
            }
            RepositoryError::Query { message } => {
                Error::internal(format!("repository error: {message}"))
            }
            RepositoryError::Duplicate { field } => {
                Error::conflict(format!("a record with this {field} already exists"))
                    .with_details(json!({ "field": field, "code": "duplicate" }))
            }
            RepositoryError::Stale { entity } => Error::conflict(format!(
                "the {entity} was changed by another request; reload and retry"
            ))
            .with_details(json!({ "code": "concurrent_update" })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(RepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(RepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[case(RepositoryError::duplicate("sku"), ErrorCode::Conflict)]
    #[case(RepositoryError::stale("invoice"), ErrorCode::Conflict)]
    fn maps_to_domain_codes(#[case] error: RepositoryError, #[case] expected: ErrorCode) {
        assert_eq!(Error::from(error).code(), expected);
    }

    #[rstest]
    fn duplicate_names_the_field() {
        let error = Error::from(RepositoryError::duplicate("vin"));
        assert_eq!(error.details().expect("details")["field"], "vin");
    }
}
