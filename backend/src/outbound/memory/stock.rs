//! Inventory, stock movements and stored reports.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::ports::{InventoryRepository, ReportRepository, RepositoryError};
use crate::domain::{
    InventoryFilter, InventoryItem, InventoryItemId, Report, ReportId, StockChange, StockMovement,
    StockUpdate, TenantId,
};

use super::{MemoryStore, Tables, paged};

fn sku_taken(tables: &Tables, item: &InventoryItem) -> bool {
    tables.inventory.values().any(|other| {
        other.id != item.id
            && other.tenant_id == item.tenant_id
            && other.is_active
            && other.sku == item.sku
    })
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn insert(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if sku_taken(&tables, item) {
            return Err(RepositoryError::duplicate("sku"));
        }
        tables.inventory.insert(item.id, item.clone());
        Ok(())
    }

    async fn update(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if item.is_active && sku_taken(&tables, item) {
            return Err(RepositoryError::duplicate("sku"));
        }
        let quantity = tables
            .inventory
            .get(&item.id)
            .map_or(item.quantity_on_hand, |stored| stored.quantity_on_hand);
        let mut next = item.clone();
        next.quantity_on_hand = quantity;
        tables.inventory.insert(next.id, next);
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: InventoryItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        Ok(self
            .lock()?
            .inventory
            .get(&id)
            .filter(|i| i.tenant_id == tenant_id && i.is_active)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &InventoryFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, RepositoryError> {
        let tables = self.lock()?;
        let mut items: Vec<InventoryItem> = tables
            .inventory
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.is_active)
            .filter(|i| filter.search.as_deref().is_none_or(|needle| i.matches(needle)))
            .filter(|i| !filter.low_stock || i.is_low_stock())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(paged(&items, page))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .inventory
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.is_active)
            .count() as u64)
    }

    async fn count_low_stock(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .inventory
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.is_active && i.is_low_stock())
            .count() as u64)
    }

    async fn apply_stock_change(
        &self,
        change: &StockChange,
    ) -> Result<StockUpdate, RepositoryError> {
        let mut tables = self.lock()?;
        let Some(item) = tables
            .inventory
            .get_mut(&change.item_id)
            .filter(|i| i.tenant_id == change.tenant_id && i.is_active)
        else {
            return Ok(StockUpdate::NotFound);
        };
        let after = item.quantity_on_hand + change.delta;
        if after < 0 {
            return Ok(StockUpdate::Insufficient {
                available: item.quantity_on_hand,
            });
        }
        item.quantity_on_hand = after;
        item.updated_at = change.at;
        let movement = change.clone().into_movement(after);
        tables.movements.push(movement.clone());
        Ok(StockUpdate::Applied(movement))
    }

    async fn list_movements(
        &self,
        tenant_id: TenantId,
        item_id: InventoryItemId,
        page: PageRequest,
    ) -> Result<Page<StockMovement>, RepositoryError> {
        let tables = self.lock()?;
        let movements: Vec<StockMovement> = tables
            .movements
            .iter()
            .rev()
            .filter(|m| m.tenant_id == tenant_id && m.item_id == item_id)
            .cloned()
            .collect();
        Ok(paged(&movements, page))
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn insert(&self, report: &Report) -> Result<(), RepositoryError> {
        self.lock()?.reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: ReportId,
    ) -> Result<Option<Report>, RepositoryError> {
        Ok(self
            .lock()?
            .reports
            .get(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> Result<Page<Report>, RepositoryError> {
        let tables = self.lock()?;
        let mut reports: Vec<Report> = tables
            .reports
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then(b.id.cmp(&a.id)));
        Ok(paged(&reports, page))
    }
}
