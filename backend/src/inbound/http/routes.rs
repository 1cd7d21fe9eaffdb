//! Route table for the `/api/v1` scope.
//!
//! Literal segments are registered ahead of `{id}` patterns that would
//! otherwise capture them (`/reports/dashboard` before `/reports/{id}`).

use actix_web::web;

use super::{
    accounts, appointments, attachments, customers, inventory, invoices, reports, tenants, users,
    validation, vehicles, work_orders,
};

/// Register extractor configuration and every API handler.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    validation::configure_extractors(cfg);
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::me)
        .service(accounts::change_password)
        .service(tenants::current_tenant)
        .service(tenants::update_settings)
        .service(tenants::change_plan)
        .service(tenants::usage)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::update_user)
        .service(users::deactivate_user)
        .service(customers::list_customers)
        .service(customers::create_customer)
        .service(customers::get_customer)
        .service(customers::update_customer)
        .service(customers::delete_customer)
        .service(customers::add_customer_note)
        .service(vehicles::list_vehicles)
        .service(vehicles::create_vehicle)
        .service(vehicles::get_vehicle)
        .service(vehicles::update_vehicle)
        .service(vehicles::delete_vehicle)
        .service(vehicles::record_mileage)
        .service(vehicles::vehicle_history)
        .service(work_orders::list_work_orders)
        .service(work_orders::create_work_order)
        .service(work_orders::get_work_order)
        .service(work_orders::update_work_order)
        .service(work_orders::delete_work_order)
        .service(work_orders::assign_technician)
        .service(work_orders::change_status)
        .service(work_orders::apply_workflow_step)
        .service(work_orders::add_service_line)
        .service(work_orders::remove_service_line)
        .service(work_orders::add_part_line)
        .service(work_orders::remove_part_line)
        .service(work_orders::add_work_order_note)
        .service(attachments::upload_attachment)
        .service(attachments::download_attachment)
        .service(appointments::list_appointments)
        .service(appointments::create_appointment)
        .service(appointments::get_appointment)
        .service(appointments::delete_appointment)
        .service(appointments::reschedule_appointment)
        .service(appointments::change_appointment_status)
        .service(appointments::convert_appointment)
        .service(invoices::list_invoices)
        .service(invoices::generate_invoice)
        .service(invoices::get_invoice)
        .service(invoices::void_invoice)
        .service(invoices::list_payments)
        .service(invoices::record_payment)
        .service(invoices::refund_payment)
        .service(invoices::payment_webhook)
        .service(inventory::list_inventory)
        .service(inventory::create_inventory_item)
        .service(inventory::get_inventory_item)
        .service(inventory::update_inventory_item)
        .service(inventory::delete_inventory_item)
        .service(inventory::adjust_stock)
        .service(inventory::list_movements)
        .service(reports::dashboard)
        .service(reports::revenue)
        .service(reports::technicians)
        .service(reports::generate_report)
        .service(reports::list_reports)
        .service(reports::get_report);
}

#[cfg(test)]
mod tests {
    use crate::inbound::http::test_utils::{TestApp, send};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;

    #[rstest]
    #[case("/api/v1/auth/me")]
    #[case("/api/v1/tenant")]
    #[case("/api/v1/customers")]
    #[case("/api/v1/work-orders")]
    #[case("/api/v1/appointments")]
    #[case("/api/v1/invoices")]
    #[case("/api/v1/inventory")]
    #[case("/api/v1/reports/dashboard")]
    #[actix_web::test]
    async fn protected_routes_require_a_bearer_token(#[case] uri: &str) {
        let app = TestApp::new();
        let service = test::init_service(app.app()).await;
        let (status, body) = send(&service, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }

    #[actix_web::test]
    async fn malformed_json_uses_the_error_shape() {
        let app = TestApp::new();
        let service = test::init_service(app.app()).await;
        let (status, body) = send(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json")
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }
}
