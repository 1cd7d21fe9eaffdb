//! PostgreSQL-backed `WorkOrderRepository`.
//!
//! Work-order line items, notes, attachments, history and workflow are
//! JSONB documents on the order row; sequence counters are upserted with
//! `RETURNING` so concurrent allocations never collide.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{RepositoryError, WorkOrderRepository};
use crate::domain::{
    CustomerId, TenantId, UserId, VehicleId, WorkOrder, WorkOrderFilter, WorkOrderId,
    WorkOrderStatus,
};

use super::column_codecs::{
    from_json, i32_to_u32, page_window, parse_text, to_count, to_json, to_u32,
};
use super::diesel_error_mapping::{guarded, map_diesel_error, map_pool_error};
use super::models::WorkOrderRow;
use super::pool::DbPool;
use super::schema::{work_order_counters, work_orders};

/// Diesel-backed implementation of the work-order repository port.
#[derive(Clone)]
pub struct DieselWorkOrderRepository {
    pool: DbPool,
}

impl DieselWorkOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(super) fn work_order_to_row(order: &WorkOrder) -> Result<WorkOrderRow, RepositoryError> {
    Ok(WorkOrderRow {
        id: *order.id.as_uuid(),
        tenant_id: *order.tenant_id.as_uuid(),
        number: order.number.clone(),
        customer_id: *order.customer_id.as_uuid(),
        vehicle_id: *order.vehicle_id.as_uuid(),
        assigned_to: order.assigned_to.map(|id| *id.as_uuid()),
        status: order.status.as_str().to_owned(),
        priority: order.priority.as_str().to_owned(),
        description: order.description.clone(),
        mileage_in: order.mileage_in.map(i64::from),
        services: to_json(&order.services, "services")?,
        parts: to_json(&order.parts, "parts")?,
        totals: to_json(&order.totals, "totals")?,
        notes: to_json(&order.notes, "notes")?,
        attachments: to_json(&order.attachments, "attachments")?,
        status_history: to_json(&order.status_history, "status_history")?,
        workflow: to_json(&order.workflow, "workflow")?,
        estimated_completion: order.estimated_completion,
        completed_at: order.completed_at,
        is_active: order.is_active,
        created_by: *order.created_by.as_uuid(),
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}

fn row_to_work_order(row: WorkOrderRow) -> Result<WorkOrder, RepositoryError> {
    Ok(WorkOrder {
        id: WorkOrderId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        number: row.number,
        customer_id: CustomerId::from_uuid(row.customer_id),
        vehicle_id: VehicleId::from_uuid(row.vehicle_id),
        assigned_to: row.assigned_to.map(UserId::from_uuid),
        status: parse_text(&row.status, "status")?,
        priority: parse_text(&row.priority, "priority")?,
        description: row.description,
        mileage_in: row
            .mileage_in
            .map(|value| to_u32(value, "mileage_in"))
            .transpose()?,
        services: from_json(row.services, "services")?,
        parts: from_json(row.parts, "parts")?,
        totals: from_json(row.totals, "totals")?,
        notes: from_json(row.notes, "notes")?,
        attachments: from_json(row.attachments, "attachments")?,
        status_history: from_json(row.status_history, "status_history")?,
        workflow: from_json(row.workflow, "workflow")?,
        estimated_completion: row.estimated_completion,
        completed_at: row.completed_at,
        is_active: row.is_active,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_work_orders(rows: Vec<WorkOrderRow>) -> Result<Vec<WorkOrder>, RepositoryError> {
    rows.into_iter().map(row_to_work_order).collect()
}

fn open_statuses() -> Vec<&'static str> {
    WorkOrderStatus::ALL
        .iter()
        .filter(|status| status.is_open())
        .map(|status| status.as_str())
        .collect()
}

fn active_work_orders<'a>(
    tenant_id: TenantId,
    filter: &WorkOrderFilter,
) -> work_orders::BoxedQuery<'a, Pg> {
    let mut query = work_orders::table
        .filter(work_orders::tenant_id.eq(*tenant_id.as_uuid()))
        .filter(work_orders::is_active.eq(true))
        .into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(work_orders::status.eq(status.as_str()));
    }
    if let Some(technician) = filter.assigned_to {
        query = query.filter(work_orders::assigned_to.eq(*technician.as_uuid()));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(work_orders::customer_id.eq(*customer_id.as_uuid()));
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query = query.filter(work_orders::vehicle_id.eq(*vehicle_id.as_uuid()));
    }
    query
}

#[async_trait]
impl WorkOrderRepository for DieselWorkOrderRepository {
    async fn next_sequence(
        &self,
        tenant_id: TenantId,
        period: &str,
    ) -> Result<u32, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let value: i32 = diesel::insert_into(work_order_counters::table)
            .values((
                work_order_counters::tenant_id.eq(tenant_id.as_uuid()),
                work_order_counters::period.eq(period),
                work_order_counters::last_value.eq(1),
            ))
            .on_conflict((work_order_counters::tenant_id, work_order_counters::period))
            .do_update()
            .set(work_order_counters::last_value.eq(work_order_counters::last_value + 1))
            .returning(work_order_counters::last_value)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        i32_to_u32(value, "last_value")
    }

    async fn insert(&self, order: &WorkOrder) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = work_order_to_row(order)?;
        diesel::insert_into(work_orders::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        order: &WorkOrder,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = work_order_to_row(order)?;
        let affected = diesel::update(
            work_orders::table
                .filter(work_orders::id.eq(row.id))
                .filter(work_orders::updated_at.eq(expected_updated_at)),
        )
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        guarded(affected, "work order")
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: WorkOrderId,
    ) -> Result<Option<WorkOrder>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = active_work_orders(tenant_id, &WorkOrderFilter::default())
            .filter(work_orders::id.eq(*id.as_uuid()))
            .select(WorkOrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_work_order).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &WorkOrderFilter,
        page: PageRequest,
    ) -> Result<Page<WorkOrder>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = active_work_orders(tenant_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<WorkOrderRow> = active_work_orders(tenant_id, filter)
            .order((work_orders::created_at.desc(), work_orders::number.desc()))
            .offset(offset)
            .limit(limit)
            .select(WorkOrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Page::new(rows_to_work_orders(rows)?, page, to_count(total)))
    }

    async fn list_for_vehicle(
        &self,
        tenant_id: TenantId,
        vehicle_id: VehicleId,
    ) -> Result<Vec<WorkOrder>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let filter = WorkOrderFilter {
            vehicle_id: Some(vehicle_id),
            ..WorkOrderFilter::default()
        };
        let rows: Vec<WorkOrderRow> = active_work_orders(tenant_id, &filter)
            .order((work_orders::created_at.desc(), work_orders::number.desc()))
            .select(WorkOrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_work_orders(rows)
    }

    async fn count_created_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = work_orders::table
            .filter(work_orders::tenant_id.eq(tenant_id.as_uuid()))
            .filter(work_orders::created_at.ge(from))
            .filter(work_orders::created_at.lt(to))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }

    async fn count_open_for_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let filter = WorkOrderFilter {
            customer_id: Some(customer_id),
            ..WorkOrderFilter::default()
        };
        let total: i64 = active_work_orders(tenant_id, &filter)
            .filter(work_orders::status.eq_any(open_statuses()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }

    async fn status_counts(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<(WorkOrderStatus, u64)>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, i64)> = work_orders::table
            .filter(work_orders::tenant_id.eq(tenant_id.as_uuid()))
            .filter(work_orders::is_active.eq(true))
            .group_by(work_orders::status)
            .select((work_orders::status, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let mut counts = rows
            .into_iter()
            .map(|(status, count)| {
                parse_text::<WorkOrderStatus>(&status, "status").map(|s| (s, to_count(count)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        counts.retain(|(_, count)| *count > 0);
        counts.sort_by_key(|(status, _)| {
            WorkOrderStatus::ALL
                .iter()
                .position(|candidate| candidate == status)
        });
        Ok(counts)
    }

    async fn list_completed_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WorkOrder>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<WorkOrderRow> = active_work_orders(tenant_id, &WorkOrderFilter::default())
            .filter(work_orders::completed_at.ge(from))
            .filter(work_orders::completed_at.lt(to))
            .order(work_orders::completed_at.asc())
            .select(WorkOrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_work_orders(rows)
    }
}
