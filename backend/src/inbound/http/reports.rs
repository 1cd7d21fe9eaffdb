//! Reporting handlers. Every route requires `reports:read`.
//!
//! ```text
//! GET  /api/v1/reports/dashboard
//! GET  /api/v1/reports/revenue?from=...&to=...&granularity=month
//! GET  /api/v1/reports/technicians?from=...&to=...
//! POST /api/v1/reports      {"kind":"revenue","granularity":"day"}
//! GET  /api/v1/reports
//! GET  /api/v1/reports/{id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    DashboardSummary, Error, GenerateReportRequest, Granularity, Report, ReportId, ReportQuery,
    RevenueReport, TechnicianReport,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{PageQuery, page_request};

/// Reporting window. Defaults to the 30 days before now.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportWindowQuery {
    /// Inclusive start.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive end.
    pub to: Option<DateTime<Utc>>,
    /// Revenue bucket width (default `day`).
    pub granularity: Option<Granularity>,
}

impl From<ReportWindowQuery> for ReportQuery {
    fn from(query: ReportWindowQuery) -> Self {
        Self {
            from: query.from,
            to: query.to,
            granularity: query.granularity,
        }
    }
}

/// Headline figures for the shop right now.
#[utoipa::path(
    get,
    path = "/api/v1/reports/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "dashboard"
)]
#[get("/reports/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    principal: Authenticated,
) -> ApiResult<web::Json<DashboardSummary>> {
    Ok(web::Json(state.reports.dashboard(&principal).await?))
}

/// Revenue from completed payments, bucketed by day or month.
#[utoipa::path(
    get,
    path = "/api/v1/reports/revenue",
    params(ReportWindowQuery),
    responses(
        (status = 200, description = "Revenue report", body = RevenueReport),
        (status = 400, description = "Window is empty or reversed", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "revenueReport"
)]
#[get("/reports/revenue")]
pub async fn revenue(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<ReportWindowQuery>,
) -> ApiResult<web::Json<RevenueReport>> {
    Ok(web::Json(
        state
            .reports
            .revenue(&principal, query.into_inner().into())
            .await?,
    ))
}

/// Completed orders and labour hours per technician.
#[utoipa::path(
    get,
    path = "/api/v1/reports/technicians",
    params(ReportWindowQuery),
    responses(
        (status = 200, description = "Technician productivity", body = [TechnicianReport]),
        (status = 400, description = "Window is empty or reversed", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "technicianReport"
)]
#[get("/reports/technicians")]
pub async fn technicians(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<ReportWindowQuery>,
) -> ApiResult<web::Json<Vec<TechnicianReport>>> {
    Ok(web::Json(
        state
            .reports
            .technicians(&principal, query.into_inner().into())
            .await?,
    ))
}

/// Compute a report and keep the snapshot.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = GenerateReportRequest,
    responses(
        (status = 201, description = "Report stored", body = Report),
        (status = 400, description = "Invalid window", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "generateReport"
)]
#[post("/reports")]
pub async fn generate_report(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<GenerateReportRequest>,
) -> ApiResult<HttpResponse> {
    let report = state
        .reports
        .generate(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(PageQuery),
    responses(
        (status = 200, description = "Stored reports, newest first", body = PageSchema<Report>),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "listReports"
)]
#[get("/reports")]
pub async fn list_reports(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Report>>> {
    let page = page_request(query.page, query.limit)?;
    Ok(web::Json(state.reports.list(&principal, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(("id" = ReportId, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Stored report", body = Report),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["reports"],
    operation_id = "getReport"
)]
#[get("/reports/{id}")]
pub async fn get_report(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<ReportId>,
) -> ApiResult<web::Json<Report>> {
    Ok(web::Json(
        state.reports.get(&principal, path.into_inner()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GenerateInvoiceRequest, PaymentMethod, RecordPaymentRequest, Role};
    use crate::inbound::http::test_utils::{TestApp, bearer, send};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[actix_web::test]
    async fn revenue_counts_completed_payments() {
        let app = TestApp::with_shop().await;
        let order = app.completed_order().await;
        let invoice = app
            .state
            .billing
            .generate(
                &app.owner(),
                GenerateInvoiceRequest {
                    work_order_id: order.id,
                },
            )
            .await
            .expect("invoice");
        app.state
            .billing
            .record_payment(
                &app.owner(),
                invoice.invoice.id,
                RecordPaymentRequest {
                    amount_cents: 7_500,
                    method: PaymentMethod::Cash,
                    reference: None,
                },
            )
            .await
            .expect("payment");
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;

        let (status, report) = send(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/reports/revenue?granularity=month")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["totalCents"], 7_500);
        assert_eq!(report["granularity"], "month");

        let (status, summary) = send(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/reports/dashboard")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["outstandingBalanceCents"], 4_500);
        assert_eq!(summary["activeCustomers"], 1);
    }

    #[actix_web::test]
    async fn snapshots_are_stored_and_listed() {
        let app = TestApp::with_shop().await;
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;

        let (status, report) = send(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/reports")
                .insert_header(bearer(&token))
                .set_json(json!({ "kind": "work_order_status" }))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = report["id"].as_str().expect("id").to_owned();

        let (status, fetched) = send(
            &service,
            test::TestRequest::get()
                .uri(&format!("/api/v1/reports/{id}"))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["kind"], "work_order_status");

        let (status, page) = send(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/reports")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
    }

    #[actix_web::test]
    async fn reversed_window_is_rejected() {
        let app = TestApp::with_shop().await;
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;
        let (status, body) = send(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/reports/technicians?from=2024-06-01T00:00:00Z&to=2024-05-01T00:00:00Z")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }

    #[rstest]
    #[case(Role::Receptionist)]
    #[case(Role::Technician)]
    #[actix_web::test]
    async fn front_desk_and_technicians_cannot_read_reports(#[case] role: Role) {
        let app = TestApp::with_shop().await;
        let token = app.token_for(role).await;
        let service = test::init_service(app.app()).await;
        let (status, _) = send(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/reports/dashboard")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
