//! PostgreSQL-backed `AppointmentRepository`.
//!
//! Rows carry a stored `ends_at` so technician overlap checks stay a
//! single range query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{AppointmentRepository, RepositoryError};
use crate::domain::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, CustomerId, TenantId,
    UserId, VehicleId, WorkOrderId,
};

use super::column_codecs::{i32_to_u32, page_window, parse_text, to_count, u32_to_i32};
use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::AppointmentRow;
use super::pool::DbPool;
use super::schema::appointments;

/// Diesel-backed implementation of the appointment repository port.
#[derive(Clone)]
pub struct DieselAppointmentRepository {
    pool: DbPool,
}

impl DieselAppointmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn appointment_to_row(appointment: &Appointment) -> Result<AppointmentRow, RepositoryError> {
    Ok(AppointmentRow {
        id: *appointment.id.as_uuid(),
        tenant_id: *appointment.tenant_id.as_uuid(),
        customer_id: *appointment.customer_id.as_uuid(),
        vehicle_id: appointment.vehicle_id.map(|id| *id.as_uuid()),
        technician_id: appointment.technician_id.map(|id| *id.as_uuid()),
        starts_at: appointment.starts_at,
        ends_at: appointment.ends_at(),
        duration_minutes: u32_to_i32(appointment.duration_minutes, "duration_minutes")?,
        service_type: appointment.service_type.clone(),
        notes: appointment.notes.clone(),
        status: appointment.status.as_str().to_owned(),
        work_order_id: appointment.work_order_id.map(|id| *id.as_uuid()),
        is_active: appointment.is_active,
        created_by: *appointment.created_by.as_uuid(),
        created_at: appointment.created_at,
        updated_at: appointment.updated_at,
    })
}

fn row_to_appointment(row: AppointmentRow) -> Result<Appointment, RepositoryError> {
    Ok(Appointment {
        id: AppointmentId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        vehicle_id: row.vehicle_id.map(VehicleId::from_uuid),
        technician_id: row.technician_id.map(UserId::from_uuid),
        starts_at: row.starts_at,
        duration_minutes: i32_to_u32(row.duration_minutes, "duration_minutes")?,
        service_type: row.service_type,
        notes: row.notes,
        status: parse_text(&row.status, "status")?,
        work_order_id: row.work_order_id.map(WorkOrderId::from_uuid),
        is_active: row.is_active,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_appointments(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>, RepositoryError> {
    rows.into_iter().map(row_to_appointment).collect()
}

fn active_appointments<'a>(tenant_id: TenantId) -> appointments::BoxedQuery<'a, Pg> {
    appointments::table
        .filter(appointments::tenant_id.eq(*tenant_id.as_uuid()))
        .filter(appointments::is_active.eq(true))
        .into_boxed()
}

fn filtered_appointments<'a>(
    tenant_id: TenantId,
    filter: &AppointmentFilter,
) -> appointments::BoxedQuery<'a, Pg> {
    let mut query = active_appointments(tenant_id);
    if let Some(from) = filter.from {
        query = query.filter(appointments::starts_at.ge(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(appointments::starts_at.lt(to));
    }
    if let Some(technician) = filter.technician_id {
        query = query.filter(appointments::technician_id.eq(*technician.as_uuid()));
    }
    if let Some(status) = filter.status {
        query = query.filter(appointments::status.eq(status.as_str()));
    }
    query
}

#[async_trait]
impl AppointmentRepository for DieselAppointmentRepository {
    async fn insert(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = appointment_to_row(appointment)?;
        diesel::insert_into(appointments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = appointment_to_row(appointment)?;
        diesel::update(appointments::table.find(row.id))
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = active_appointments(tenant_id)
            .filter(appointments::id.eq(*id.as_uuid()))
            .select(AppointmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_appointment).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<Appointment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = filtered_appointments(tenant_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<AppointmentRow> = filtered_appointments(tenant_id, filter)
            .order((appointments::starts_at.asc(), appointments::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(AppointmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Page::new(rows_to_appointments(rows)?, page, to_count(total)))
    }

    async fn find_for_technician(
        &self,
        tenant_id: TenantId,
        technician_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AppointmentRow> = active_appointments(tenant_id)
            .filter(appointments::technician_id.eq(*technician_id.as_uuid()))
            .filter(appointments::starts_at.lt(to))
            .filter(appointments::ends_at.gt(from))
            .order(appointments::starts_at.asc())
            .select(AppointmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_appointments(rows)
    }

    async fn count_starting_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let occupying: Vec<&'static str> = AppointmentStatus::ALL
            .iter()
            .filter(|status| status.occupies_slot())
            .map(|status| status.as_str())
            .collect();
        let total: i64 = active_appointments(tenant_id)
            .filter(appointments::starts_at.ge(from))
            .filter(appointments::starts_at.lt(to))
            .filter(appointments::status.eq_any(occupying))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }
}
