//! PostgreSQL-backed `InventoryRepository` and `ReportRepository`.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{InventoryRepository, ReportRepository, RepositoryError};
use crate::domain::{
    InventoryFilter, InventoryItem, InventoryItemId, LineId, Report, ReportId, StockChange,
    StockMovement, StockUpdate, TenantId, UserId,
};

use super::column_codecs::{contains_pattern, page_window, parse_text, to_count};
use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{InventoryItemRow, InventoryItemUpdate, ReportRow, StockMovementRow};
use super::pool::DbPool;
use super::schema::{inventory_items, reports, stock_movements};

/// Diesel-backed implementation of the inventory repository port.
#[derive(Clone)]
pub struct DieselInventoryRepository {
    pool: DbPool,
}

impl DieselInventoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn item_to_row(item: &InventoryItem) -> InventoryItemRow {
    InventoryItemRow {
        id: *item.id.as_uuid(),
        tenant_id: *item.tenant_id.as_uuid(),
        sku: item.sku.clone(),
        name: item.name.clone(),
        category: item.category.clone(),
        quantity_on_hand: item.quantity_on_hand,
        reorder_level: item.reorder_level,
        unit_cost_cents: item.unit_cost_cents,
        unit_price_cents: item.unit_price_cents,
        supplier: item.supplier.clone(),
        location: item.location.clone(),
        is_active: item.is_active,
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

fn row_to_item(row: InventoryItemRow) -> InventoryItem {
    InventoryItem {
        id: InventoryItemId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        sku: row.sku,
        name: row.name,
        category: row.category,
        quantity_on_hand: row.quantity_on_hand,
        reorder_level: row.reorder_level,
        unit_cost_cents: row.unit_cost_cents,
        unit_price_cents: row.unit_price_cents,
        supplier: row.supplier,
        location: row.location,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn movement_to_row(movement: &StockMovement) -> StockMovementRow {
    StockMovementRow {
        id: *movement.id.as_uuid(),
        tenant_id: *movement.tenant_id.as_uuid(),
        item_id: *movement.item_id.as_uuid(),
        delta: movement.delta,
        reason: movement.reason.as_str().to_owned(),
        reference: movement.reference.clone(),
        quantity_after: movement.quantity_after,
        created_by: *movement.created_by.as_uuid(),
        occurred_at: movement.at,
    }
}

fn row_to_movement(row: StockMovementRow) -> Result<StockMovement, RepositoryError> {
    Ok(StockMovement {
        id: LineId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        item_id: InventoryItemId::from_uuid(row.item_id),
        delta: row.delta,
        reason: parse_text(&row.reason, "reason")?,
        reference: row.reference,
        quantity_after: row.quantity_after,
        created_by: UserId::from_uuid(row.created_by),
        at: row.occurred_at,
    })
}

fn active_items<'a>(
    tenant_id: TenantId,
    filter: &InventoryFilter,
) -> inventory_items::BoxedQuery<'a, Pg> {
    let mut query = inventory_items::table
        .filter(inventory_items::tenant_id.eq(*tenant_id.as_uuid()))
        .filter(inventory_items::is_active.eq(true))
        .into_boxed();
    if let Some(needle) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = contains_pattern(needle);
        query = query.filter(
            inventory_items::sku
                .ilike(pattern.clone())
                .or(inventory_items::name.ilike(pattern.clone()))
                .or(inventory_items::category.assume_not_null().ilike(pattern)),
        );
    }
    if filter.low_stock {
        query = query
            .filter(inventory_items::quantity_on_hand.le(inventory_items::reorder_level));
    }
    query
}

#[async_trait]
impl InventoryRepository for DieselInventoryRepository {
    async fn insert(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(inventory_items::table)
            .values(&item_to_row(item))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = InventoryItemUpdate {
            sku: &item.sku,
            name: &item.name,
            category: item.category.as_deref(),
            reorder_level: item.reorder_level,
            unit_cost_cents: item.unit_cost_cents,
            unit_price_cents: item.unit_price_cents,
            supplier: item.supplier.as_deref(),
            location: item.location.as_deref(),
            is_active: item.is_active,
            updated_at: item.updated_at,
        };
        diesel::update(inventory_items::table.find(item.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: InventoryItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = active_items(tenant_id, &InventoryFilter::default())
            .filter(inventory_items::id.eq(*id.as_uuid()))
            .select(InventoryItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_item))
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &InventoryFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = active_items(tenant_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<InventoryItemRow> = active_items(tenant_id, filter)
            .order(inventory_items::sku.asc())
            .offset(offset)
            .limit(limit)
            .select(InventoryItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows.into_iter().map(row_to_item).collect();
        Ok(Page::new(items, page, to_count(total)))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = active_items(tenant_id, &InventoryFilter::default())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }

    async fn count_low_stock(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let filter = InventoryFilter {
            search: None,
            low_stock: true,
        };
        let total: i64 = active_items(tenant_id, &filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }

    async fn apply_stock_change(
        &self,
        change: &StockChange,
    ) -> Result<StockUpdate, RepositoryError> {
        let change = change.clone();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let update = conn
            .transaction(|conn| {
                async move {
                    let current: Option<i64> = inventory_items::table
                        .filter(inventory_items::id.eq(change.item_id.as_uuid()))
                        .filter(inventory_items::tenant_id.eq(change.tenant_id.as_uuid()))
                        .filter(inventory_items::is_active.eq(true))
                        .select(inventory_items::quantity_on_hand)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(current) = current else {
                        return Ok(StockUpdate::NotFound);
                    };
                    let after = current + change.delta;
                    if after < 0 {
                        return Ok(StockUpdate::Insufficient { available: current });
                    }

                    diesel::update(inventory_items::table.find(change.item_id.as_uuid()))
                        .set((
                            inventory_items::quantity_on_hand.eq(after),
                            inventory_items::updated_at.eq(change.at),
                        ))
                        .execute(conn)
                        .await?;
                    let movement = change.into_movement(after);
                    diesel::insert_into(stock_movements::table)
                        .values(&movement_to_row(&movement))
                        .execute(conn)
                        .await?;
                    Ok(StockUpdate::Applied(movement))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if let StockUpdate::Applied(movement) = &update {
            debug!(
                item = %movement.item_id,
                delta = movement.delta,
                after = movement.quantity_after,
                "stock movement recorded"
            );
        }
        Ok(update)
    }

    async fn list_movements(
        &self,
        tenant_id: TenantId,
        item_id: InventoryItemId,
        page: PageRequest,
    ) -> Result<Page<StockMovement>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = stock_movements::table
            .filter(stock_movements::tenant_id.eq(tenant_id.as_uuid()))
            .filter(stock_movements::item_id.eq(item_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<StockMovementRow> = stock_movements::table
            .filter(stock_movements::tenant_id.eq(tenant_id.as_uuid()))
            .filter(stock_movements::item_id.eq(item_id.as_uuid()))
            .order((stock_movements::occurred_at.desc(), stock_movements::id.desc()))
            .offset(offset)
            .limit(limit)
            .select(StockMovementRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows
            .into_iter()
            .map(row_to_movement)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, to_count(total)))
    }
}

/// Diesel-backed implementation of the report repository port.
#[derive(Clone)]
pub struct DieselReportRepository {
    pool: DbPool,
}

impl DieselReportRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn report_to_row(report: &Report) -> ReportRow {
    ReportRow {
        id: *report.id.as_uuid(),
        tenant_id: *report.tenant_id.as_uuid(),
        kind: report.kind.as_str().to_owned(),
        parameters: report.parameters.clone(),
        data: report.data.clone(),
        generated_by: *report.generated_by.as_uuid(),
        generated_at: report.generated_at,
    }
}

fn row_to_report(row: ReportRow) -> Result<Report, RepositoryError> {
    Ok(Report {
        id: ReportId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        kind: parse_text(&row.kind, "kind")?,
        parameters: row.parameters,
        data: row.data,
        generated_by: UserId::from_uuid(row.generated_by),
        generated_at: row.generated_at,
    })
}

#[async_trait]
impl ReportRepository for DieselReportRepository {
    async fn insert(&self, report: &Report) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(reports::table)
            .values(&report_to_row(report))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: ReportId,
    ) -> Result<Option<Report>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = reports::table
            .filter(reports::id.eq(id.as_uuid()))
            .filter(reports::tenant_id.eq(tenant_id.as_uuid()))
            .select(ReportRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_report).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> Result<Page<Report>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = reports::table
            .filter(reports::tenant_id.eq(tenant_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ReportRow> = reports::table
            .filter(reports::tenant_id.eq(tenant_id.as_uuid()))
            .order((reports::generated_at.desc(), reports::id.desc()))
            .offset(offset)
            .limit(limit)
            .select(ReportRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows
            .into_iter()
            .map(row_to_report)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, to_count(total)))
    }
}
