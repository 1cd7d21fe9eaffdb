//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler under `/api/v1` plus the health probes.
//! Request and response bodies are collected from the handler annotations;
//! only the error envelope is listed explicitly because it is returned by
//! every endpoint through `ApiResult`.
//!
//! The generated document is served by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::{
    accounts, appointments, attachments, customers, health, inventory, invoices, reports, tenants,
    users, vehicles, work_orders,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/v1/auth/register or /api/v1/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Garage backend API",
        description = "Multi-tenant workshop management: customers, vehicles, work orders, \
                       appointments, invoicing, inventory and reporting."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        accounts::register,
        accounts::login,
        accounts::me,
        accounts::change_password,
        tenants::current_tenant,
        tenants::update_settings,
        tenants::change_plan,
        tenants::usage,
        users::list_users,
        users::create_user,
        users::update_user,
        users::deactivate_user,
        customers::list_customers,
        customers::create_customer,
        customers::get_customer,
        customers::update_customer,
        customers::delete_customer,
        customers::add_customer_note,
        vehicles::list_vehicles,
        vehicles::create_vehicle,
        vehicles::get_vehicle,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        vehicles::record_mileage,
        vehicles::vehicle_history,
        work_orders::list_work_orders,
        work_orders::create_work_order,
        work_orders::get_work_order,
        work_orders::update_work_order,
        work_orders::delete_work_order,
        work_orders::assign_technician,
        work_orders::change_status,
        work_orders::apply_workflow_step,
        work_orders::add_service_line,
        work_orders::remove_service_line,
        work_orders::add_part_line,
        work_orders::remove_part_line,
        work_orders::add_work_order_note,
        attachments::upload_attachment,
        attachments::download_attachment,
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::delete_appointment,
        appointments::reschedule_appointment,
        appointments::change_appointment_status,
        appointments::convert_appointment,
        invoices::list_invoices,
        invoices::generate_invoice,
        invoices::get_invoice,
        invoices::void_invoice,
        invoices::list_payments,
        invoices::record_payment,
        invoices::refund_payment,
        invoices::payment_webhook,
        inventory::list_inventory,
        inventory::create_inventory_item,
        inventory::get_inventory_item,
        inventory::update_inventory_item,
        inventory::delete_inventory_item,
        inventory::adjust_stock,
        inventory::list_movements,
        reports::dashboard,
        reports::revenue,
        reports::technicians,
        reports::generate_report,
        reports::list_reports,
        reports::get_report,
        health::ready,
        health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Registration, sign-in and the current account"),
        (name = "tenant", description = "Shop profile, settings and subscription plan"),
        (name = "users", description = "Staff accounts and roles"),
        (name = "customers", description = "Customer records and notes"),
        (name = "vehicles", description = "Vehicles, mileage and service history"),
        (name = "work-orders", description = "Repair jobs, lines, workflow and attachments"),
        (name = "appointments", description = "Scheduling and conversion to work orders"),
        (name = "billing", description = "Invoices, payments and provider webhooks"),
        (name = "inventory", description = "Parts catalogue and stock movements"),
        (name = "reports", description = "Dashboard, revenue and technician reporting"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn doc() -> utoipa::openapi::OpenApi {
        ApiDoc::openapi()
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = doc();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        match error_schema {
            RefOr::T(Schema::Object(obj)) => {
                for field in ["code", "message"] {
                    assert!(obj.properties.contains_key(field), "missing '{field}'");
                }
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = doc();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }

    #[rstest]
    #[case("/api/v1/auth/login")]
    #[case("/api/v1/customers/{id}")]
    #[case("/api/v1/work-orders/{id}/workflow/{step}")]
    #[case("/api/v1/webhooks/payments")]
    #[case("/api/v1/reports/dashboard")]
    #[case("/health/ready")]
    fn documents_paths(#[case] path: &str) {
        assert!(
            doc().paths.paths.contains_key(path),
            "missing path {path}"
        );
    }
}
