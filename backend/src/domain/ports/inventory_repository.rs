//! Port for inventory persistence and stock movements.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    InventoryFilter, InventoryItem, InventoryItemId, StockChange, StockMovement, StockUpdate,
    TenantId,
};

use super::RepositoryError;

/// Storage for inventory items. SKUs are unique per tenant among active
/// items; a clash surfaces as [`RepositoryError::Duplicate`] with field `sku`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Insert a new item.
    async fn insert(&self, item: &InventoryItem) -> Result<(), RepositoryError>;

    /// Replace a stored item's descriptive fields, including soft deletion.
    ///
    /// `quantity_on_hand` is owned by [`Self::apply_stock_change`] and is not
    /// written here.
    async fn update(&self, item: &InventoryItem) -> Result<(), RepositoryError>;

    /// Fetch an active item of the tenant.
    async fn find(
        &self,
        tenant_id: TenantId,
        id: InventoryItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError>;

    /// List active items ordered by SKU.
    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &InventoryFilter,
        page: PageRequest,
    ) -> Result<Page<InventoryItem>, RepositoryError>;

    /// Count active items.
    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;

    /// Count active items at or below their reorder level.
    async fn count_low_stock(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;

    /// Atomically apply a stock delta and append the movement record.
    ///
    /// The quantity never drops below zero; such a change is refused with
    /// [`StockUpdate::Insufficient`].
    async fn apply_stock_change(&self, change: &StockChange)
    -> Result<StockUpdate, RepositoryError>;

    /// Movements of an item, newest first.
    async fn list_movements(
        &self,
        tenant_id: TenantId,
        item_id: InventoryItemId,
        page: PageRequest,
    ) -> Result<Page<StockMovement>, RepositoryError>;
}
