//! Customer handlers.
//!
//! ```text
//! GET    /api/v1/customers?search=smith&page=1&limit=20
//! POST   /api/v1/customers {"firstName":"Ada","lastName":"Smith","phone":"+1 555 0100"}
//! GET    /api/v1/customers/{id}
//! PATCH  /api/v1/customers/{id}
//! DELETE /api/v1/customers/{id}
//! POST   /api/v1/customers/{id}/notes {"body":"Prefers texts"}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::Page;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    AddNoteRequest, CreateCustomerRequest, Customer, CustomerFilter, CustomerId, Error,
    UpdateCustomerRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::page_request;

/// Query parameters for `GET /api/v1/customers`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerListQuery {
    /// Case-insensitive match on name, e-mail or phone.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<&CustomerListQuery> for CustomerFilter {
    fn from(query: &CustomerListQuery) -> Self {
        Self {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_owned),
        }
    }
}

/// List active customers, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Customers", body = PageSchema<Customer>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["customers"],
    operation_id = "listCustomers"
)]
#[get("/customers")]
pub async fn list_customers(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<CustomerListQuery>,
) -> ApiResult<web::Json<Page<Customer>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = CustomerFilter::from(&*query);
    Ok(web::Json(
        state.customers.list(&principal, &filter, page).await?,
    ))
}

/// Register a customer.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid request", body = Error),
        (status = 402, description = "Plan customer limit reached", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["customers"],
    operation_id = "createCustomer"
)]
#[post("/customers")]
pub async fn create_customer(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<CreateCustomerRequest>,
) -> ApiResult<HttpResponse> {
    let customer = state
        .customers
        .create(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(customer))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = CustomerId, Path, description = "Customer identifier")),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["customers"],
    operation_id = "getCustomer"
)]
#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<CustomerId>,
) -> ApiResult<web::Json<Customer>> {
    Ok(web::Json(
        state.customers.get(&principal, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/customers/{id}",
    params(("id" = CustomerId, Path, description = "Customer identifier")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["customers"],
    operation_id = "updateCustomer"
)]
#[patch("/customers/{id}")]
pub async fn update_customer(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<CustomerId>,
    payload: web::Json<UpdateCustomerRequest>,
) -> ApiResult<web::Json<Customer>> {
    let customer = state
        .customers
        .update(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(customer))
}

/// Soft delete a customer. Refused while any work order is still open.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(("id" = CustomerId, Path, description = "Customer identifier")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Customer has open work orders", body = Error)
    ),
    tags = ["customers"],
    operation_id = "deleteCustomer"
)]
#[delete("/customers/{id}")]
pub async fn delete_customer(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<CustomerId>,
) -> ApiResult<HttpResponse> {
    state.customers.delete(&principal, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/notes",
    params(("id" = CustomerId, Path, description = "Customer identifier")),
    request_body = AddNoteRequest,
    responses(
        (status = 201, description = "Note added", body = Customer),
        (status = 400, description = "Empty note", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["customers"],
    operation_id = "addCustomerNote"
)]
#[post("/customers/{id}/notes")]
pub async fn add_customer_note(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<CustomerId>,
    payload: web::Json<AddNoteRequest>,
) -> ApiResult<HttpResponse> {
    let customer = state
        .customers
        .add_note(&principal, path.into_inner(), &payload)
        .await?;
    Ok(HttpResponse::Created().json(customer))
}
