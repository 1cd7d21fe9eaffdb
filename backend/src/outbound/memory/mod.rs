//! In-process repositories used when no database is configured.
//!
//! One [`MemoryStore`] implements every repository port over a set of tables
//! guarded by a single mutex, so each port call is atomic with respect to the
//! others. Uniqueness rules mirror the database indexes and surface as
//! [`RepositoryError::Duplicate`]; guarded writes compare `updated_at` like
//! the Diesel adapters and surface as [`RepositoryError::Stale`].

mod billing;
mod directory;
mod operations;
mod stock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{Repositories, RepositoryError};
use crate::domain::{
    Appointment, AppointmentId, Customer, CustomerId, InventoryItem, InventoryItemId, Invoice,
    InvoiceId, Payment, PaymentId, Report, ReportId, StockMovement, Tenant, TenantId, User, UserId,
    Vehicle, VehicleId, WorkOrder, WorkOrderId,
};

#[derive(Default)]
struct Tables {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
    customers: HashMap<CustomerId, Customer>,
    vehicles: HashMap<VehicleId, Vehicle>,
    work_orders: HashMap<WorkOrderId, WorkOrder>,
    work_order_counters: HashMap<(TenantId, String), u32>,
    appointments: HashMap<AppointmentId, Appointment>,
    invoices: HashMap<InvoiceId, Invoice>,
    invoice_counters: HashMap<(TenantId, i32), u32>,
    payments: HashMap<PaymentId, Payment>,
    inventory: HashMap<InventoryItemId, InventoryItem>,
    movements: Vec<StockMovement>,
    reports: HashMap<ReportId, Report>,
}

/// Shared in-memory backing store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle the store behind every repository port.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            tenants: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
            customers: Arc::new(self.clone()),
            vehicles: Arc::new(self.clone()),
            work_orders: Arc::new(self.clone()),
            appointments: Arc::new(self.clone()),
            billing: Arc::new(self.clone()),
            inventory: Arc::new(self.clone()),
            reports: Arc::new(self.clone()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::query("in-memory store lock poisoned"))
    }
}

/// Reject a write whose target changed, or vanished, since it was read.
fn check_revision(
    stored: Option<DateTime<Utc>>,
    expected: DateTime<Utc>,
    entity: &str,
) -> Result<(), RepositoryError> {
    if stored == Some(expected) {
        Ok(())
    } else {
        Err(RepositoryError::stale(entity))
    }
}

/// Sort-free paging over an already ordered result set.
fn paged<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    Page::new(page.slice(items), page, items.len() as u64)
}

#[cfg(test)]
mod tests;
