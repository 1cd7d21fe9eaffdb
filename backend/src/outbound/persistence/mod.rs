//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository port has a Diesel implementation over a shared
//! [`DbPool`] (`diesel-async` connections pooled by `bb8`).
//!
//! - **Thin adapters**: repositories only translate between row structs and
//!   domain types. Business rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Constraint-backed uniqueness**: unique indexes in `backend/migrations`
//!   enforce slugs, e-mails, plates, VINs, numbers and SKUs; violations come
//!   back as `RepositoryError::Duplicate` naming the field.
//!
//! # Example
//!
//! ```no_run
//! use garage_backend::outbound::persistence::{DbPool, PoolConfig, diesel_repositories};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/garage")).await?;
//! let repos = diesel_repositories(pool);
//! # let _ = repos;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::domain::ports::Repositories;

mod column_codecs;
mod diesel_appointment_repository;
mod diesel_billing_repository;
mod diesel_customer_repository;
mod diesel_error_mapping;
mod diesel_inventory_repository;
mod diesel_tenant_repository;
mod diesel_work_order_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_appointment_repository::DieselAppointmentRepository;
pub use diesel_billing_repository::DieselBillingRepository;
pub use diesel_customer_repository::{DieselCustomerRepository, DieselVehicleRepository};
pub use diesel_inventory_repository::{DieselInventoryRepository, DieselReportRepository};
pub use diesel_tenant_repository::{DieselTenantRepository, DieselUserRepository};
pub use diesel_work_order_repository::DieselWorkOrderRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

/// Bundle every Diesel repository over one pool.
pub fn diesel_repositories(pool: DbPool) -> Repositories {
    Repositories {
        tenants: Arc::new(DieselTenantRepository::new(pool.clone())),
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        customers: Arc::new(DieselCustomerRepository::new(pool.clone())),
        vehicles: Arc::new(DieselVehicleRepository::new(pool.clone())),
        work_orders: Arc::new(DieselWorkOrderRepository::new(pool.clone())),
        appointments: Arc::new(DieselAppointmentRepository::new(pool.clone())),
        billing: Arc::new(DieselBillingRepository::new(pool.clone())),
        inventory: Arc::new(DieselInventoryRepository::new(pool.clone())),
        reports: Arc::new(DieselReportRepository::new(pool)),
    }
}
