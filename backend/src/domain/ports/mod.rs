//! Domain ports for the hexagonal boundary.
//!
//! Outbound adapters (Diesel, in-memory, bcrypt/JWT, local files) implement
//! these traits; domain services only ever hold them as trait objects.

mod macros;
pub(crate) use macros::define_port_error;

mod appointment_repository;
mod billing_repository;
mod credentials;
mod customer_repository;
mod file_store;
mod inventory_repository;
mod report_repository;
mod repository_error;
mod tenant_repository;
mod user_repository;
mod vehicle_repository;
mod work_order_repository;

pub use appointment_repository::AppointmentRepository;
#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
pub use billing_repository::{BillingRepository, OutstandingSummary};
#[cfg(test)]
pub use billing_repository::MockBillingRepository;
pub use credentials::{CredentialError, PasswordHasher, TokenService};
#[cfg(test)]
pub use credentials::{MockPasswordHasher, MockTokenService};
pub use customer_repository::CustomerRepository;
#[cfg(test)]
pub use customer_repository::MockCustomerRepository;
pub use file_store::{FileStore, FileStoreError};
#[cfg(test)]
pub use file_store::MockFileStore;
pub use inventory_repository::InventoryRepository;
#[cfg(test)]
pub use inventory_repository::MockInventoryRepository;
pub use report_repository::ReportRepository;
#[cfg(test)]
pub use report_repository::MockReportRepository;
pub use repository_error::RepositoryError;
pub use tenant_repository::TenantRepository;
#[cfg(test)]
pub use tenant_repository::MockTenantRepository;
pub use user_repository::UserRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use vehicle_repository::VehicleRepository;
#[cfg(test)]
pub use vehicle_repository::MockVehicleRepository;
pub use work_order_repository::WorkOrderRepository;
#[cfg(test)]
pub use work_order_repository::MockWorkOrderRepository;

use std::sync::Arc;

/// Every repository port, shared by the domain services.
#[derive(Clone)]
pub struct Repositories {
    pub tenants: Arc<dyn TenantRepository>,
    pub users: Arc<dyn UserRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub work_orders: Arc<dyn WorkOrderRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub billing: Arc<dyn BillingRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub reports: Arc<dyn ReportRepository>,
}
