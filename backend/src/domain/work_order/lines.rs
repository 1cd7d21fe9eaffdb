//! Billable service and part lines.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::money;
use crate::domain::validation::{self, FieldError};
use crate::domain::{InventoryItemId, LineId};

/// Labour performed on a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub id: LineId,
    pub description: String,
    /// Hours multiplied by 100.
    pub labor_hundredths: u32,
    pub rate_cents: i64,
    pub total_cents: i64,
}

/// A part fitted during the work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartLine {
    pub id: LineId,
    pub inventory_item_id: Option<InventoryItemId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

/// Request body for adding a service line. `rateCents` defaults to the shop
/// labour rate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddServiceLineRequest {
    #[schema(example = "Replace front brake pads")]
    pub description: String,
    #[schema(example = 150)]
    pub labor_hundredths: u32,
    pub rate_cents: Option<i64>,
}

/// Request body for adding a part line.
///
/// With an `inventoryItemId`, stock is reserved and `name`/`unitPriceCents`
/// default to the inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPartLineRequest {
    pub inventory_item_id: Option<InventoryItemId>,
    pub name: Option<String>,
    #[schema(example = 2)]
    pub quantity: u32,
    pub unit_price_cents: Option<i64>,
}

impl ServiceLine {
    /// Validate and price a service line.
    pub fn new(description: &str, labor_hundredths: u32, rate_cents: i64) -> Result<Self, FieldError> {
        let description = validation::text("description", description, 1, 500)?;
        let rate_cents = validation::non_negative_cents("rateCents", rate_cents)?;
        Ok(Self {
            id: LineId::random(),
            description,
            labor_hundredths,
            rate_cents,
            total_cents: money::labor_cents(labor_hundredths, rate_cents),
        })
    }
}

impl PartLine {
    /// Validate and price a part line.
    pub fn new(
        inventory_item_id: Option<InventoryItemId>,
        name: &str,
        quantity: u32,
        unit_price_cents: i64,
    ) -> Result<Self, FieldError> {
        if quantity == 0 {
            return Err(FieldError::new("quantity", "out_of_range", "must be at least 1"));
        }
        let name = validation::text("name", name, 1, 200)?;
        let unit_price_cents = validation::non_negative_cents("unitPriceCents", unit_price_cents)?;
        Ok(Self {
            id: LineId::random(),
            inventory_item_id,
            name,
            quantity,
            unit_price_cents,
            total_cents: unit_price_cents.saturating_mul(i64::from(quantity)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_line_prices_labor() {
        let line = ServiceLine::new("Oil change", 75, 9_000).expect("valid");
        assert_eq!(line.total_cents, 6_750);
    }

    #[test]
    fn part_line_requires_quantity() {
        let err = PartLine::new(None, "Filter", 0, 1_000).expect_err("zero quantity");
        assert_eq!(err.field(), "quantity");
        let line = PartLine::new(None, "Filter", 3, 1_250).expect("valid");
        assert_eq!(line.total_cents, 3_750);
    }
}
