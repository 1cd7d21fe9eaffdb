//! Work-order handlers: the order itself, its status and workflow, billable
//! lines and notes. Attachments live in [`super::attachments`].
//!
//! ```text
//! GET    /api/v1/work-orders?status=in_progress&assignedTo=...
//! POST   /api/v1/work-orders
//! GET    /api/v1/work-orders/{id}
//! PATCH  /api/v1/work-orders/{id}
//! DELETE /api/v1/work-orders/{id}
//! PUT    /api/v1/work-orders/{id}/assignee      {"technicianId":"..."}
//! POST   /api/v1/work-orders/{id}/status        {"status":"in_progress"}
//! POST   /api/v1/work-orders/{id}/workflow/{step} {"action":"complete"}
//! POST   /api/v1/work-orders/{id}/services
//! DELETE /api/v1/work-orders/{id}/services/{lineId}
//! POST   /api/v1/work-orders/{id}/parts
//! DELETE /api/v1/work-orders/{id}/parts/{lineId}
//! POST   /api/v1/work-orders/{id}/notes
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use pagination::Page;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    AddNoteRequest, AddPartLineRequest, AddServiceLineRequest, AssignTechnicianRequest,
    ChangeStatusRequest, CreateWorkOrderRequest, CustomerId, Error, LineId, UpdateWorkOrderRequest,
    UserId, VehicleId, WorkOrder, WorkOrderFilter, WorkOrderId, WorkOrderStatus,
    WorkflowActionRequest, WorkflowStepKey,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_request, parse_segment};

/// Query parameters for `GET /api/v1/work-orders`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct WorkOrderListQuery {
    pub status: Option<WorkOrderStatus>,
    /// Technician the order is assigned to.
    pub assigned_to: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub vehicle_id: Option<VehicleId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<&WorkOrderListQuery> for WorkOrderFilter {
    fn from(query: &WorkOrderListQuery) -> Self {
        Self {
            status: query.status,
            assigned_to: query.assigned_to,
            customer_id: query.customer_id,
            vehicle_id: query.vehicle_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    params(WorkOrderListQuery),
    responses(
        (status = 200, description = "Work orders", body = PageSchema<WorkOrder>),
        (status = 400, description = "Invalid query", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "listWorkOrders"
)]
#[get("/work-orders")]
pub async fn list_work_orders(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<WorkOrderListQuery>,
) -> ApiResult<web::Json<Page<WorkOrder>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = WorkOrderFilter::from(&*query);
    Ok(web::Json(
        state.work_orders.list(&principal, &filter, page).await?,
    ))
}

/// Open a work order with the default workflow and the next `WO-` number.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    request_body = CreateWorkOrderRequest,
    responses(
        (status = 201, description = "Work order created", body = WorkOrder),
        (status = 400, description = "Invalid request or unknown reference", body = Error),
        (status = 402, description = "Monthly work order limit reached", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "createWorkOrder"
)]
#[post("/work-orders")]
pub async fn create_work_order(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<CreateWorkOrderRequest>,
) -> ApiResult<HttpResponse> {
    let order = state
        .work_orders
        .create(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    responses(
        (status = 200, description = "Work order", body = WorkOrder),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "getWorkOrder"
)]
#[get("/work-orders/{id}")]
pub async fn get_work_order(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
) -> ApiResult<web::Json<WorkOrder>> {
    Ok(web::Json(
        state.work_orders.get(&principal, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/work-orders/{id}",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body = UpdateWorkOrderRequest,
    responses(
        (status = 200, description = "Work order updated", body = WorkOrder),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Order is closed", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "updateWorkOrder"
)]
#[patch("/work-orders/{id}")]
pub async fn update_work_order(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    payload: web::Json<UpdateWorkOrderRequest>,
) -> ApiResult<web::Json<WorkOrder>> {
    let order = state
        .work_orders
        .update(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(order))
}

/// Soft delete a pending or cancelled order, returning reserved parts.
#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/{id}",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    responses(
        (status = 204, description = "Work order deleted"),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Order has progressed", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "deleteWorkOrder"
)]
#[delete("/work-orders/{id}")]
pub async fn delete_work_order(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
) -> ApiResult<HttpResponse> {
    state
        .work_orders
        .delete(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Assign a technician, or clear the assignment with `null`.
#[utoipa::path(
    put,
    path = "/api/v1/work-orders/{id}/assignee",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 200, description = "Assignment updated", body = WorkOrder),
        (status = 400, description = "Unknown technician", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "assignTechnician"
)]
#[put("/work-orders/{id}/assignee")]
pub async fn assign_technician(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    payload: web::Json<AssignTechnicianRequest>,
) -> ApiResult<web::Json<WorkOrder>> {
    let order = state
        .work_orders
        .assign(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(order))
}

/// Move the order through its lifecycle.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/status",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = WorkOrder),
        (status = 409, description = "Transition not allowed", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "changeWorkOrderStatus"
)]
#[post("/work-orders/{id}/status")]
pub async fn change_status(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    payload: web::Json<ChangeStatusRequest>,
) -> ApiResult<web::Json<WorkOrder>> {
    let order = state
        .work_orders
        .change_status(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(order))
}

/// Start, complete or skip a workflow step.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/workflow/{step}",
    params(
        ("id" = WorkOrderId, Path, description = "Work order identifier"),
        ("step" = WorkflowStepKey, Path, description = "Workflow step key")
    ),
    request_body = WorkflowActionRequest,
    responses(
        (status = 200, description = "Step updated", body = WorkOrder),
        (status = 400, description = "Unknown step", body = Error),
        (status = 409, description = "Earlier required steps unfinished", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "applyWorkflowStep"
)]
#[post("/work-orders/{id}/workflow/{step}")]
pub async fn apply_workflow_step(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<(WorkOrderId, String)>,
    payload: web::Json<WorkflowActionRequest>,
) -> ApiResult<web::Json<WorkOrder>> {
    let (id, step) = path.into_inner();
    let key: WorkflowStepKey = parse_segment(&step, FieldName::new("step"))?;
    let order = state
        .work_orders
        .apply_step(&principal, id, key, payload.into_inner())
        .await?;
    Ok(web::Json(order))
}

/// Add a labour line priced at the shop rate unless `rateCents` is given.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/services",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body = AddServiceLineRequest,
    responses(
        (status = 201, description = "Line added; totals recomputed", body = WorkOrder),
        (status = 400, description = "Invalid line", body = Error),
        (status = 409, description = "Order is closed", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "addServiceLine"
)]
#[post("/work-orders/{id}/services")]
pub async fn add_service_line(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    payload: web::Json<AddServiceLineRequest>,
) -> ApiResult<HttpResponse> {
    let order = state
        .work_orders
        .add_service(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/{id}/services/{line_id}",
    params(
        ("id" = WorkOrderId, Path, description = "Work order identifier"),
        ("line_id" = LineId, Path, description = "Service line identifier")
    ),
    responses(
        (status = 200, description = "Line removed; totals recomputed", body = WorkOrder),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "removeServiceLine"
)]
#[delete("/work-orders/{id}/services/{line_id}")]
pub async fn remove_service_line(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<(WorkOrderId, LineId)>,
) -> ApiResult<web::Json<WorkOrder>> {
    let (id, line_id) = path.into_inner();
    let order = state
        .work_orders
        .remove_service(&principal, id, line_id)
        .await?;
    Ok(web::Json(order))
}

/// Add a part line. Stocked parts are reserved from inventory.
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/parts",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body = AddPartLineRequest,
    responses(
        (status = 201, description = "Line added; totals recomputed", body = WorkOrder),
        (status = 400, description = "Invalid line or unknown item", body = Error),
        (status = 409, description = "Insufficient stock", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "addPartLine"
)]
#[post("/work-orders/{id}/parts")]
pub async fn add_part_line(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    payload: web::Json<AddPartLineRequest>,
) -> ApiResult<HttpResponse> {
    let order = state
        .work_orders
        .add_part(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(order))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-orders/{id}/parts/{line_id}",
    params(
        ("id" = WorkOrderId, Path, description = "Work order identifier"),
        ("line_id" = LineId, Path, description = "Part line identifier")
    ),
    responses(
        (status = 200, description = "Line removed; stock restored", body = WorkOrder),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "removePartLine"
)]
#[delete("/work-orders/{id}/parts/{line_id}")]
pub async fn remove_part_line(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<(WorkOrderId, LineId)>,
) -> ApiResult<web::Json<WorkOrder>> {
    let (id, line_id) = path.into_inner();
    let order = state
        .work_orders
        .remove_part(&principal, id, line_id)
        .await?;
    Ok(web::Json(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/notes",
    params(("id" = WorkOrderId, Path, description = "Work order identifier")),
    request_body = AddNoteRequest,
    responses(
        (status = 201, description = "Note added", body = WorkOrder),
        (status = 400, description = "Empty note", body = Error)
    ),
    tags = ["work-orders"],
    operation_id = "addWorkOrderNote"
)]
#[post("/work-orders/{id}/notes")]
pub async fn add_work_order_note(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<WorkOrderId>,
    payload: web::Json<AddNoteRequest>,
) -> ApiResult<HttpResponse> {
    let order = state
        .work_orders
        .add_note(&principal, path.into_inner(), &payload)
        .await?;
    Ok(HttpResponse::Created().json(order))
}
