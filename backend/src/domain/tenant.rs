//! Tenants, subscription plans and usage limits.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::text_enum::text_enum;
use super::validation::{self, FieldError};
use super::TenantId;

text_enum! {
    /// Subscription tier of a tenant.
    pub enum SubscriptionPlan {
        Trial => "trial",
        Basic => "basic",
        Professional => "professional",
        Enterprise => "enterprise",
    }
}

text_enum! {
    /// Billing state of a tenant's subscription.
    pub enum SubscriptionStatus {
        Trialing => "trialing",
        Active => "active",
        PastDue => "past_due",
        Suspended => "suspended",
        Cancelled => "cancelled",
    }
}

text_enum! {
    /// Resources capped by the subscription plan.
    pub enum LimitedResource {
        Users => "users",
        Customers => "customers",
        Vehicles => "vehicles",
        WorkOrders => "work_orders",
        InventoryItems => "inventory_items",
    }
}

impl SubscriptionPlan {
    /// Whether the plan is billed.
    pub const fn is_paid(self) -> bool {
        !matches!(self, Self::Trial)
    }

    /// Resource caps for the plan.
    pub const fn limits(self) -> PlanLimits {
        match self {
            Self::Trial => PlanLimits::capped(2, 25, 50, 20, 50),
            Self::Basic => PlanLimits::capped(5, 250, 500, 200, 500),
            Self::Professional => PlanLimits::capped(20, 2_500, 5_000, 2_000, 5_000),
            Self::Enterprise => PlanLimits::UNLIMITED,
        }
    }
}

impl SubscriptionStatus {
    /// Suspended and cancelled tenants are read-only.
    pub const fn allows_writes(self) -> bool {
        !matches!(self, Self::Suspended | Self::Cancelled)
    }
}

/// Per-plan resource caps. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_users: Option<u64>,
    pub max_customers: Option<u64>,
    pub max_vehicles: Option<u64>,
    pub max_work_orders_per_month: Option<u64>,
    pub max_inventory_items: Option<u64>,
}

impl PlanLimits {
    const UNLIMITED: Self = Self {
        max_users: None,
        max_customers: None,
        max_vehicles: None,
        max_work_orders_per_month: None,
        max_inventory_items: None,
    };

    const fn capped(users: u64, customers: u64, vehicles: u64, orders: u64, items: u64) -> Self {
        Self {
            max_users: Some(users),
            max_customers: Some(customers),
            max_vehicles: Some(vehicles),
            max_work_orders_per_month: Some(orders),
            max_inventory_items: Some(items),
        }
    }

    /// Cap applying to `resource`.
    pub const fn limit_for(&self, resource: LimitedResource) -> Option<u64> {
        match resource {
            LimitedResource::Users => self.max_users,
            LimitedResource::Customers => self.max_customers,
            LimitedResource::Vehicles => self.max_vehicles,
            LimitedResource::WorkOrders => self.max_work_orders_per_month,
            LimitedResource::InventoryItems => self.max_inventory_items,
        }
    }
}

fn default_currency() -> String {
    "USD".to_owned()
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

const fn default_due_days() -> u32 {
    30
}

/// Shop-wide settings used for pricing and invoicing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[serde(default = "default_currency")]
    #[schema(example = "USD")]
    pub currency: String,
    #[serde(default = "default_timezone")]
    #[schema(example = "UTC")]
    pub timezone: String,
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default)]
    pub labor_rate_cents: i64,
    #[serde(default = "default_due_days")]
    pub invoice_due_days: u32,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            timezone: default_timezone(),
            tax_rate_bps: 0,
            labor_rate_cents: 0,
            invoice_due_days: default_due_days(),
        }
    }
}

/// Partial update of [`TenantSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettingsPatch {
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub tax_rate_bps: Option<u32>,
    pub labor_rate_cents: Option<i64>,
    pub invoice_due_days: Option<u32>,
}

impl TenantSettings {
    /// Apply `patch`, validating every supplied field.
    pub fn apply(&self, patch: TenantSettingsPatch) -> Result<Self, FieldError> {
        let mut next = self.clone();
        if let Some(currency) = patch.currency {
            next.currency = validation::currency("currency", &currency)?;
        }
        if let Some(timezone) = patch.timezone {
            next.timezone = validation::text("timezone", &timezone, 1, 64)?;
        }
        if let Some(rate) = patch.tax_rate_bps {
            next.tax_rate_bps = validation::basis_points("taxRateBps", rate)?;
        }
        if let Some(rate) = patch.labor_rate_cents {
            next.labor_rate_cents = validation::non_negative_cents("laborRateCents", rate)?;
        }
        if let Some(days) = patch.invoice_due_days {
            if days > 365 {
                return Err(FieldError::new(
                    "invoiceDueDays",
                    "out_of_range",
                    "must be between 0 and 365",
                ));
            }
            next.invoice_due_days = days;
        }
        Ok(next)
    }
}

/// A repair shop organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub plan: SubscriptionPlan,
    pub subscription_status: SubscriptionStatus,
    pub settings: TenantSettings,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Validate a new tenant on the trial plan.
    pub fn register(name: &str, slug: &str, now: DateTime<Utc>) -> Result<Self, FieldError> {
        Ok(Self {
            id: TenantId::random(),
            name: validation::text("name", name, 1, 100)?,
            slug: validation::slug("slug", slug)?,
            plan: SubscriptionPlan::Trial,
            subscription_status: SubscriptionStatus::Trialing,
            settings: TenantSettings::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Usage of one limited resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageItem {
    pub resource: LimitedResource,
    pub used: u64,
    pub limit: Option<u64>,
}

/// Resource usage of a tenant against its plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub plan: SubscriptionPlan,
    pub period_start: DateTime<Utc>,
    pub items: Vec<UsageItem>,
}

/// Start of the UTC calendar month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Start of the UTC calendar month following `now`.
pub fn next_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
