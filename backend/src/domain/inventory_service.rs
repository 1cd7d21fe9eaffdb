//! Parts inventory and the stock movement ledger.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::info;

use super::ports::Repositories;
use super::tenant_service::UsageGuard;
use super::validation::{self, FieldError};
use super::{
    AdjustStockRequest, CreateInventoryItemRequest, Error, InventoryFilter, InventoryItem,
    InventoryItemId, LimitedResource, MovementReason, Permission, Principal, StockChange,
    StockMovement, StockUpdate, TenantId, UpdateInventoryItemRequest,
};

/// Inventory operations.
#[derive(Clone)]
pub struct InventoryService {
    repos: Repositories,
    usage: UsageGuard,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    /// Create the service.
    pub fn new(repos: Repositories, usage: UsageGuard, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            usage,
            clock,
        }
    }

    async fn item(&self, tenant_id: TenantId, id: InventoryItemId) -> Result<InventoryItem, Error> {
        self.repos
            .inventory
            .find(tenant_id, id)
            .await?
            .filter(|item| item.is_active)
            .ok_or_else(|| Error::not_found(format!("inventory item {id} not found")))
    }

    /// Add an item. Opening stock is booked as a purchase movement.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateInventoryItemRequest,
    ) -> Result<InventoryItem, Error> {
        principal.require(Permission::InventoryWrite)?;
        let now = self.clock.utc();
        let mut item = InventoryItem::create(principal.tenant_id, request, now)?;
        self.usage
            .ensure_capacity(principal.tenant_id, LimitedResource::InventoryItems)
            .await?;

        let opening = item.quantity_on_hand;
        item.quantity_on_hand = 0;
        self.repos.inventory.insert(&item).await?;
        if opening > 0 {
            let change = StockChange {
                tenant_id: item.tenant_id,
                item_id: item.id,
                delta: opening,
                reason: MovementReason::Purchase,
                reference: Some("opening stock".to_owned()),
                created_by: principal.user_id,
                at: now,
            };
            if let StockUpdate::Applied(movement) =
                self.repos.inventory.apply_stock_change(&change).await?
            {
                item.quantity_on_hand = movement.quantity_after;
            }
        }
        info!(tenant_id = %item.tenant_id, sku = %item.sku, "inventory item created");
        Ok(item)
    }

    /// Fetch one item.
    pub async fn get(
        &self,
        principal: &Principal,
        id: InventoryItemId,
    ) -> Result<InventoryItem, Error> {
        principal.require(Permission::InventoryRead)?;
        self.item(principal.tenant_id, id).await
    }

    /// Page through items ordered by SKU.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &InventoryFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, Error> {
        principal.require(Permission::InventoryRead)?;
        Ok(self
            .repos
            .inventory
            .list(principal.tenant_id, filter, page)
            .await?)
    }

    /// Apply a partial update. Quantities only change through adjustments.
    pub async fn update(
        &self,
        principal: &Principal,
        id: InventoryItemId,
        patch: UpdateInventoryItemRequest,
    ) -> Result<InventoryItem, Error> {
        principal.require(Permission::InventoryWrite)?;
        let mut item = self.item(principal.tenant_id, id).await?;
        item.apply(patch, self.clock.utc())?;
        self.repos.inventory.update(&item).await?;
        Ok(item)
    }

    /// Book a manual stock change.
    pub async fn adjust(
        &self,
        principal: &Principal,
        id: InventoryItemId,
        request: AdjustStockRequest,
    ) -> Result<StockMovement, Error> {
        principal.require(Permission::InventoryWrite)?;
        if request.delta == 0 {
            return Err(FieldError::new("delta", "out_of_range", "must not be zero").into());
        }
        let item = self.item(principal.tenant_id, id).await?;
        let reference = validation::optional_text("reference", request.reference.as_deref(), 200)?;
        let change = StockChange {
            tenant_id: item.tenant_id,
            item_id: item.id,
            delta: request.delta,
            reason: request.reason.unwrap_or(MovementReason::Adjustment),
            reference,
            created_by: principal.user_id,
            at: self.clock.utc(),
        };
        match self.repos.inventory.apply_stock_change(&change).await? {
            StockUpdate::Applied(movement) => {
                info!(
                    sku = %item.sku,
                    delta = movement.delta,
                    quantity_after = movement.quantity_after,
                    "stock adjusted"
                );
                Ok(movement)
            }
            StockUpdate::Insufficient { available } => {
                Err(Error::conflict("stock cannot drop below zero").with_details(json!({
                    "available": available,
                    "delta": request.delta,
                })))
            }
            StockUpdate::NotFound => Err(Error::not_found(format!(
                "inventory item {id} not found"
            ))),
        }
    }

    /// Movements of an item, newest first.
    pub async fn movements(
        &self,
        principal: &Principal,
        id: InventoryItemId,
        page: PageRequest,
    ) -> Result<Page<StockMovement>, Error> {
        principal.require(Permission::InventoryRead)?;
        let item = self.item(principal.tenant_id, id).await?;
        Ok(self
            .repos
            .inventory
            .list_movements(principal.tenant_id, item.id, page)
            .await?)
    }

    /// Soft delete.
    pub async fn delete(&self, principal: &Principal, id: InventoryItemId) -> Result<(), Error> {
        principal.require(Permission::InventoryWrite)?;
        let mut item = self.item(principal.tenant_id, id).await?;
        item.is_active = false;
        item.updated_at = self.clock.utc();
        self.repos.inventory.update(&item).await?;
        info!(tenant_id = %item.tenant_id, sku = %item.sku, "inventory item deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "inventory_service_tests.rs"]
mod tests;
