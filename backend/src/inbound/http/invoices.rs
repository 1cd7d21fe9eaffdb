//! Billing handlers: invoices, payments, refunds and the provider webhook.
//!
//! ```text
//! GET  /api/v1/invoices?status=issued&customerId=...&overdue=true
//! POST /api/v1/invoices                 {"workOrderId":"..."}
//! GET  /api/v1/invoices/{id}
//! POST /api/v1/invoices/{id}/void
//! GET  /api/v1/invoices/{id}/payments
//! POST /api/v1/invoices/{id}/payments   {"amountCents":5000,"method":"card"}
//! POST /api/v1/payments/{id}/refund
//! POST /api/v1/webhooks/payments        x-signature: sha256=<hex>
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::Page;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    CustomerId, Error, GenerateInvoiceRequest, InvoiceFilter, InvoiceId, InvoiceStatus,
    InvoiceView, Payment, PaymentId, PaymentWebhookEvent, RecordPaymentRequest, WebhookOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::page_request;

/// Header carrying the webhook HMAC.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Query parameters for `GET /api/v1/invoices`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<CustomerId>,
    /// Only invoices past their due date with a balance left.
    pub overdue: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(InvoiceListQuery),
    responses(
        (status = 200, description = "Invoices", body = PageSchema<InvoiceView>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["billing"],
    operation_id = "listInvoices"
)]
#[get("/invoices")]
pub async fn list_invoices(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<InvoiceListQuery>,
) -> ApiResult<web::Json<Page<InvoiceView>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = InvoiceFilter {
        status: query.status,
        customer_id: query.customer_id,
        overdue_at: None,
    };
    let overdue = query.overdue.unwrap_or(false);
    Ok(web::Json(
        state
            .billing
            .list(&principal, filter, overdue, page)
            .await?,
    ))
}

/// Invoice a completed work order.
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = GenerateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice issued", body = InvoiceView),
        (status = 400, description = "Unknown work order", body = Error),
        (status = 409, description = "Order not completed or already invoiced", body = Error)
    ),
    tags = ["billing"],
    operation_id = "generateInvoice"
)]
#[post("/invoices")]
pub async fn generate_invoice(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<GenerateInvoiceRequest>,
) -> ApiResult<HttpResponse> {
    let invoice = state
        .billing
        .generate(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(invoice))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = InvoiceId, Path, description = "Invoice identifier")),
    responses(
        (status = 200, description = "Invoice", body = InvoiceView),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["billing"],
    operation_id = "getInvoice"
)]
#[get("/invoices/{id}")]
pub async fn get_invoice(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InvoiceId>,
) -> ApiResult<web::Json<InvoiceView>> {
    Ok(web::Json(
        state.billing.get(&principal, path.into_inner()).await?,
    ))
}

/// Void an invoice that has taken no money.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/void",
    params(("id" = InvoiceId, Path, description = "Invoice identifier")),
    responses(
        (status = 200, description = "Invoice voided", body = InvoiceView),
        (status = 409, description = "Invoice has payments", body = Error)
    ),
    tags = ["billing"],
    operation_id = "voidInvoice"
)]
#[post("/invoices/{id}/void")]
pub async fn void_invoice(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InvoiceId>,
) -> ApiResult<web::Json<InvoiceView>> {
    Ok(web::Json(
        state.billing.void(&principal, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}/payments",
    params(("id" = InvoiceId, Path, description = "Invoice identifier")),
    responses(
        (status = 200, description = "Payments, oldest first", body = [Payment]),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["billing"],
    operation_id = "listPayments"
)]
#[get("/invoices/{id}/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InvoiceId>,
) -> ApiResult<web::Json<Vec<Payment>>> {
    Ok(web::Json(
        state.billing.payments(&principal, path.into_inner()).await?,
    ))
}

/// Record a manual payment; it may not exceed the balance.
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/payments",
    params(("id" = InvoiceId, Path, description = "Invoice identifier")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 400, description = "Amount invalid or above the balance", body = Error),
        (status = 409, description = "Invoice is void or paid", body = Error)
    ),
    tags = ["billing"],
    operation_id = "recordPayment"
)]
#[post("/invoices/{id}/payments")]
pub async fn record_payment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InvoiceId>,
    payload: web::Json<RecordPaymentRequest>,
) -> ApiResult<HttpResponse> {
    let payment = state
        .billing
        .record_payment(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(payment))
}

/// Refund a completed payment, restoring the invoice balance.
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refund",
    params(("id" = PaymentId, Path, description = "Payment identifier")),
    responses(
        (status = 200, description = "Payment refunded", body = Payment),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Payment is not refundable", body = Error)
    ),
    tags = ["billing"],
    operation_id = "refundPayment"
)]
#[post("/payments/{id}/refund")]
pub async fn refund_payment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<PaymentId>,
) -> ApiResult<web::Json<Payment>> {
    Ok(web::Json(
        state.billing.refund(&principal, path.into_inner()).await?,
    ))
}

/// Payment provider callback, authenticated by an HMAC over the raw body.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payments",
    request_body = PaymentWebhookEvent,
    params(("x-signature" = String, Header, description = "sha256=<hex HMAC of the body>")),
    responses(
        (status = 200, description = "Event applied or replayed", body = WebhookOutcome),
        (status = 400, description = "Malformed event", body = Error),
        (status = 401, description = "Signature missing or invalid", body = Error)
    ),
    tags = ["billing"],
    operation_id = "paymentWebhook",
    security([])
)]
#[post("/webhooks/payments")]
pub async fn payment_webhook(
    state: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<WebhookOutcome>> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    Ok(web::Json(
        state.billing.handle_webhook(signature, &body).await?,
    ))
}
