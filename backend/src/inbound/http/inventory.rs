//! Inventory handlers.
//!
//! ```text
//! GET    /api/v1/inventory?search=pad&lowStock=true
//! POST   /api/v1/inventory
//! GET    /api/v1/inventory/{id}
//! PATCH  /api/v1/inventory/{id}
//! DELETE /api/v1/inventory/{id}
//! POST   /api/v1/inventory/{id}/adjustments {"delta":-2,"reason":"return"}
//! GET    /api/v1/inventory/{id}/movements
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::Page;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    AdjustStockRequest, CreateInventoryItemRequest, Error, InventoryFilter, InventoryItem,
    InventoryItemId, StockMovement, UpdateInventoryItemRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{PageQuery, page_request};

/// Query parameters for `GET /api/v1/inventory`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct InventoryListQuery {
    /// Case-insensitive match on SKU or name.
    pub search: Option<String>,
    /// Only items at or below their reorder level.
    pub low_stock: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<&InventoryListQuery> for InventoryFilter {
    fn from(query: &InventoryListQuery) -> Self {
        Self {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_owned),
            low_stock: query.low_stock.unwrap_or(false),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryListQuery),
    responses(
        (status = 200, description = "Inventory items ordered by SKU", body = PageSchema<InventoryItem>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "listInventory"
)]
#[get("/inventory")]
pub async fn list_inventory(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<InventoryListQuery>,
) -> ApiResult<web::Json<Page<InventoryItem>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = InventoryFilter::from(&*query);
    Ok(web::Json(
        state.inventory.list(&principal, &filter, page).await?,
    ))
}

/// Add a stock item; opening quantity is recorded as a purchase.
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryItemRequest,
    responses(
        (status = 201, description = "Item created", body = InventoryItem),
        (status = 400, description = "Invalid request", body = Error),
        (status = 402, description = "Plan inventory limit reached", body = Error),
        (status = 409, description = "SKU already in use", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "createInventoryItem"
)]
#[post("/inventory")]
pub async fn create_inventory_item(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<CreateInventoryItemRequest>,
) -> ApiResult<HttpResponse> {
    let item = state
        .inventory
        .create(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = InventoryItemId, Path, description = "Inventory item identifier")),
    responses(
        (status = 200, description = "Inventory item", body = InventoryItem),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "getInventoryItem"
)]
#[get("/inventory/{id}")]
pub async fn get_inventory_item(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InventoryItemId>,
) -> ApiResult<web::Json<InventoryItem>> {
    Ok(web::Json(
        state.inventory.get(&principal, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/inventory/{id}",
    params(("id" = InventoryItemId, Path, description = "Inventory item identifier")),
    request_body = UpdateInventoryItemRequest,
    responses(
        (status = 200, description = "Item updated", body = InventoryItem),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "updateInventoryItem"
)]
#[patch("/inventory/{id}")]
pub async fn update_inventory_item(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InventoryItemId>,
    payload: web::Json<UpdateInventoryItemRequest>,
) -> ApiResult<web::Json<InventoryItem>> {
    let item = state
        .inventory
        .update(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = InventoryItemId, Path, description = "Inventory item identifier")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "deleteInventoryItem"
)]
#[delete("/inventory/{id}")]
pub async fn delete_inventory_item(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InventoryItemId>,
) -> ApiResult<HttpResponse> {
    state
        .inventory
        .delete(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Book a manual stock change. Stock never drops below zero.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/adjustments",
    params(("id" = InventoryItemId, Path, description = "Inventory item identifier")),
    request_body = AdjustStockRequest,
    responses(
        (status = 201, description = "Movement recorded", body = StockMovement),
        (status = 400, description = "Zero delta", body = Error),
        (status = 409, description = "Insufficient stock", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "adjustStock"
)]
#[post("/inventory/{id}/adjustments")]
pub async fn adjust_stock(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InventoryItemId>,
    payload: web::Json<AdjustStockRequest>,
) -> ApiResult<HttpResponse> {
    let movement = state
        .inventory
        .adjust(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(movement))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/movements",
    params(
        ("id" = InventoryItemId, Path, description = "Inventory item identifier"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Movements, newest first", body = PageSchema<StockMovement>),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "listStockMovements"
)]
#[get("/inventory/{id}/movements")]
pub async fn list_movements(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<InventoryItemId>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<StockMovement>>> {
    let page = page_request(query.page, query.limit)?;
    Ok(web::Json(
        state
            .inventory
            .movements(&principal, path.into_inner(), page)
            .await?,
    ))
}
