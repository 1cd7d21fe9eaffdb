//! Port for vehicle persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{TenantId, Vehicle, VehicleFilter, VehicleId};

use super::RepositoryError;

/// Storage for vehicles. Licence plates and VINs are unique per tenant among
/// active vehicles; clashes surface as [`RepositoryError::Duplicate`] with
/// field `license_plate` or `vin`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert a new vehicle.
    async fn insert(&self, vehicle: &Vehicle) -> Result<(), RepositoryError>;

    /// Replace a stored vehicle, including soft deletion.
    async fn update(&self, vehicle: &Vehicle) -> Result<(), RepositoryError>;

    /// Fetch an active vehicle of the tenant.
    async fn find(
        &self,
        tenant_id: TenantId,
        id: VehicleId,
    ) -> Result<Option<Vehicle>, RepositoryError>;

    /// List active vehicles ordered by creation time.
    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &VehicleFilter,
        page: PageRequest,
    ) -> Result<Page<Vehicle>, RepositoryError>;

    /// Count active vehicles.
    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;
}
