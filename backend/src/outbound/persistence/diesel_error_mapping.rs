//! Diesel and pool error mapping shared by every repository.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Unique constraints and the logical field each protects.
const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[
    ("tenants_slug_key", "slug"),
    ("users_email_key", "email"),
    ("vehicles_plate_active_idx", "license_plate"),
    ("vehicles_vin_active_idx", "vin"),
    ("work_orders_number_key", "number"),
    ("invoices_number_key", "number"),
    ("invoices_work_order_key", "work_order_id"),
    ("payments_provider_event_key", "provider_event_id"),
    ("inventory_items_sku_active_idx", "sku"),
];

/// Map pool errors to repository connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> RepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    RepositoryError::connection(message)
}

fn duplicate_field(constraint: Option<&str>) -> &'static str {
    let field = constraint.and_then(|name| {
        UNIQUE_CONSTRAINTS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, field)| *field)
    });
    field.unwrap_or_else(|| {
        warn!(?constraint, "unrecognised unique constraint");
        "value"
    })
}

/// Map Diesel errors to repository errors.
///
/// Unique violations become [`RepositoryError::Duplicate`] naming the field
/// the violated constraint protects.
pub(crate) fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => RepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => RepositoryError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::duplicate(duplicate_field(info.constraint_name()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::connection("database connection error")
        }
        _ => RepositoryError::query("database error"),
    }
}

/// Check the row count of a write filtered on the revision the caller read.
///
/// Nothing affected means another request changed the row first.
pub(crate) fn guarded(affected: usize, entity: &str) -> Result<(), RepositoryError> {
    if affected == 0 {
        debug!(entity, "guarded write matched no row");
        return Err(RepositoryError::stale(entity));
    }
    Ok(())
}

/// Map a transaction error where a failed guard rolled the transaction back.
pub(crate) fn map_guarded_error(entity: &str) -> impl Fn(DieselError) -> RepositoryError + '_ {
    move |error| match error {
        DieselError::RollbackTransaction => RepositoryError::stale(entity),
        other => map_diesel_error(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("vehicles_plate_active_idx"), "license_plate")]
    #[case(Some("payments_provider_event_key"), "provider_event_id")]
    #[case(Some("something_else"), "value")]
    #[case(None, "value")]
    fn constraints_name_their_field(#[case] constraint: Option<&str>, #[case] field: &str) {
        assert_eq!(duplicate_field(constraint), field);
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let error = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(error, RepositoryError::connection("timed out"));
    }

    #[rstest]
    fn missing_rows_are_query_errors() {
        assert_eq!(
            map_diesel_error(DieselError::NotFound),
            RepositoryError::query("record not found")
        );
    }

    #[rstest]
    fn unmatched_guards_are_stale() {
        assert_eq!(guarded(1, "invoice"), Ok(()));
        assert_eq!(guarded(0, "invoice"), Err(RepositoryError::stale("invoice")));
    }

    #[rstest]
    fn guard_rollbacks_are_stale() {
        let map = map_guarded_error("work order");
        assert_eq!(
            map(DieselError::RollbackTransaction),
            RepositoryError::stale("work order")
        );
        assert_eq!(
            map(DieselError::NotFound),
            RepositoryError::query("record not found")
        );
    }
}
