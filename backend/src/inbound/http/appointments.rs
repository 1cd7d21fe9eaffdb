//! Appointment handlers for the workshop calendar.
//!
//! ```text
//! GET    /api/v1/appointments?from=2024-05-01T00:00:00Z&to=...&technicianId=...
//! POST   /api/v1/appointments
//! GET    /api/v1/appointments/{id}
//! DELETE /api/v1/appointments/{id}
//! PUT    /api/v1/appointments/{id}/schedule   {"startsAt":"...","durationMinutes":90}
//! POST   /api/v1/appointments/{id}/status     {"status":"confirmed"}
//! POST   /api/v1/appointments/{id}/work-order
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, AppointmentStatusRequest,
    ConvertAppointmentRequest, CreateAppointmentRequest, Error, RescheduleAppointmentRequest,
    UserId, WorkOrder,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::page_request;

/// Query parameters for `GET /api/v1/appointments`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct AppointmentListQuery {
    /// Appointments starting at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Appointments starting before this instant.
    pub to: Option<DateTime<Utc>>,
    pub technician_id: Option<UserId>,
    pub status: Option<AppointmentStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<&AppointmentListQuery> for AppointmentFilter {
    fn from(query: &AppointmentListQuery) -> Self {
        Self {
            from: query.from,
            to: query.to,
            technician_id: query.technician_id,
            status: query.status,
        }
    }
}

/// Result of converting an appointment into a work order.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedAppointment {
    pub appointment: Appointment,
    pub work_order: WorkOrder,
}

/// Calendar view ordered by start time.
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Appointments", body = PageSchema<Appointment>),
        (status = 400, description = "Invalid query", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "listAppointments"
)]
#[get("/appointments")]
pub async fn list_appointments(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<AppointmentListQuery>,
) -> ApiResult<web::Json<Page<Appointment>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = AppointmentFilter::from(&*query);
    Ok(web::Json(
        state.appointments.list(&principal, &filter, page).await?,
    ))
}

/// Book a slot. A technician cannot hold two overlapping bookings.
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Invalid request or unknown reference", body = Error),
        (status = 409, description = "Technician already booked", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "createAppointment"
)]
#[post("/appointments")]
pub async fn create_appointment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<CreateAppointmentRequest>,
) -> ApiResult<HttpResponse> {
    let appointment = state
        .appointments
        .create(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(appointment))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    params(("id" = AppointmentId, Path, description = "Appointment identifier")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "getAppointment"
)]
#[get("/appointments/{id}")]
pub async fn get_appointment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<AppointmentId>,
) -> ApiResult<web::Json<Appointment>> {
    Ok(web::Json(
        state.appointments.get(&principal, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    params(("id" = AppointmentId, Path, description = "Appointment identifier")),
    responses(
        (status = 204, description = "Appointment deleted"),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "deleteAppointment"
)]
#[delete("/appointments/{id}")]
pub async fn delete_appointment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<AppointmentId>,
) -> ApiResult<HttpResponse> {
    state
        .appointments
        .delete(&principal, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Move a scheduled or confirmed appointment.
#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}/schedule",
    params(("id" = AppointmentId, Path, description = "Appointment identifier")),
    request_body = RescheduleAppointmentRequest,
    responses(
        (status = 200, description = "Appointment moved", body = Appointment),
        (status = 409, description = "Slot taken or appointment already underway", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "rescheduleAppointment"
)]
#[put("/appointments/{id}/schedule")]
pub async fn reschedule_appointment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<AppointmentId>,
    payload: web::Json<RescheduleAppointmentRequest>,
) -> ApiResult<web::Json<Appointment>> {
    let appointment = state
        .appointments
        .reschedule(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(appointment))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/status",
    params(("id" = AppointmentId, Path, description = "Appointment identifier")),
    request_body = AppointmentStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = Appointment),
        (status = 409, description = "Transition not allowed", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "changeAppointmentStatus"
)]
#[post("/appointments/{id}/status")]
pub async fn change_appointment_status(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<AppointmentId>,
    payload: web::Json<AppointmentStatusRequest>,
) -> ApiResult<web::Json<Appointment>> {
    let appointment = state
        .appointments
        .change_status(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(appointment))
}

/// Open a work order from the appointment and start it.
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/work-order",
    params(("id" = AppointmentId, Path, description = "Appointment identifier")),
    request_body = ConvertAppointmentRequest,
    responses(
        (status = 201, description = "Work order opened", body = ConvertedAppointment),
        (status = 400, description = "Vehicle required", body = Error),
        (status = 409, description = "Already converted or closed", body = Error)
    ),
    tags = ["appointments"],
    operation_id = "convertAppointment"
)]
#[post("/appointments/{id}/work-order")]
pub async fn convert_appointment(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<AppointmentId>,
    payload: Option<web::Json<ConvertAppointmentRequest>>,
) -> ApiResult<HttpResponse> {
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    let (appointment, work_order) = state
        .appointments
        .convert(&principal, path.into_inner(), request)
        .await?;
    Ok(HttpResponse::Created().json(ConvertedAppointment {
        appointment,
        work_order,
    }))
}
