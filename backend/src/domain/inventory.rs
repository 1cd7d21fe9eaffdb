//! Parts inventory and stock movements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::text_enum::text_enum;
use super::validation::{self, FieldError};
use super::{InventoryItemId, LineId, TenantId, UserId};

text_enum! {
    /// Why stock changed.
    pub enum MovementReason {
        Purchase => "purchase",
        Adjustment => "adjustment",
        WorkOrder => "work_order",
        Return => "return",
    }
}

/// A stocked part.
///
/// ## Invariants
/// - `sku` is upper-case and unique per tenant.
/// - `quantity_on_hand` never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub tenant_id: TenantId,
    #[schema(example = "BRK-PAD-001")]
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity_on_hand: i64,
    pub reorder_level: i64,
    pub unit_cost_cents: i64,
    pub unit_price_cents: i64,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An append-only record of a stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: LineId,
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub delta: i64,
    pub reason: MovementReason,
    pub reference: Option<String>,
    pub quantity_after: i64,
    pub created_by: UserId,
    pub at: DateTime<Utc>,
}

/// A stock change to be applied atomically by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub delta: i64,
    pub reason: MovementReason,
    pub reference: Option<String>,
    pub created_by: UserId,
    pub at: DateTime<Utc>,
}

impl StockChange {
    /// Materialise the movement once the new quantity is known.
    pub fn into_movement(self, quantity_after: i64) -> StockMovement {
        StockMovement {
            id: LineId::random(),
            tenant_id: self.tenant_id,
            item_id: self.item_id,
            delta: self.delta,
            reason: self.reason,
            reference: self.reference,
            quantity_after,
            created_by: self.created_by,
            at: self.at,
        }
    }
}

/// Outcome of applying a [`StockChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockUpdate {
    /// The change was applied.
    Applied(StockMovement),
    /// The change would drive stock below zero.
    Insufficient { available: i64 },
    /// No active item with that id exists for the tenant.
    NotFound,
}

/// Request body for creating an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemRequest {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub reorder_level: i64,
    #[serde(default)]
    pub unit_cost_cents: i64,
    #[serde(default)]
    pub unit_price_cents: i64,
    pub supplier: Option<String>,
    pub location: Option<String>,
}

/// Partial update of an inventory item. Quantity changes go through
/// adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItemRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub reorder_level: Option<i64>,
    pub unit_cost_cents: Option<i64>,
    pub unit_price_cents: Option<i64>,
    pub supplier: Option<String>,
    pub location: Option<String>,
}

/// Request body for a manual stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    #[schema(example = -2)]
    pub delta: i64,
    /// Defaults to `adjustment`.
    pub reason: Option<MovementReason>,
    pub reference: Option<String>,
}

/// Filters for listing inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub low_stock: bool,
}

fn non_negative(field: &'static str, value: i64) -> Result<i64, FieldError> {
    if value < 0 {
        return Err(FieldError::new(field, "out_of_range", "must not be negative"));
    }
    Ok(value)
}

impl InventoryItem {
    /// Validate `request` into a new active item.
    pub fn create(
        tenant_id: TenantId,
        request: CreateInventoryItemRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            id: InventoryItemId::random(),
            tenant_id,
            sku: validation::sku("sku", &request.sku)?,
            name: validation::text("name", &request.name, 1, 200)?,
            category: validation::optional_text("category", request.category.as_deref(), 100)?,
            quantity_on_hand: non_negative("quantityOnHand", request.quantity_on_hand)?,
            reorder_level: non_negative("reorderLevel", request.reorder_level)?,
            unit_cost_cents: validation::non_negative_cents("unitCostCents", request.unit_cost_cents)?,
            unit_price_cents: validation::non_negative_cents(
                "unitPriceCents",
                request.unit_price_cents,
            )?,
            supplier: validation::optional_text("supplier", request.supplier.as_deref(), 200)?,
            location: validation::optional_text("location", request.location.as_deref(), 100)?,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: UpdateInventoryItemRequest, now: DateTime<Utc>) -> Result<(), FieldError> {
        let mut next = self.clone();
        if let Some(sku) = patch.sku {
            next.sku = validation::sku("sku", &sku)?;
        }
        if let Some(name) = patch.name {
            next.name = validation::text("name", &name, 1, 200)?;
        }
        if let Some(category) = patch.category {
            next.category = validation::optional_text("category", Some(&category), 100)?;
        }
        if let Some(level) = patch.reorder_level {
            next.reorder_level = non_negative("reorderLevel", level)?;
        }
        if let Some(cost) = patch.unit_cost_cents {
            next.unit_cost_cents = validation::non_negative_cents("unitCostCents", cost)?;
        }
        if let Some(price) = patch.unit_price_cents {
            next.unit_price_cents = validation::non_negative_cents("unitPriceCents", price)?;
        }
        if let Some(supplier) = patch.supplier {
            next.supplier = validation::optional_text("supplier", Some(&supplier), 200)?;
        }
        if let Some(location) = patch.location {
            next.location = validation::optional_text("location", Some(&location), 100)?;
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// At or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity_on_hand <= self.reorder_level
    }

    /// Case-insensitive substring match on SKU, name and category.
    pub fn matches(&self, needle: &str) -> bool {
        let lower = needle.to_lowercase();
        self.sku.to_lowercase().contains(&lower)
            || self.name.to_lowercase().contains(&lower)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&lower))
    }
}
