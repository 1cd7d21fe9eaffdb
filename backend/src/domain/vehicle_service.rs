//! Customer vehicles and their service history.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use super::ports::Repositories;
use super::tenant_service::UsageGuard;
use super::{
    CreateVehicleRequest, Error, LimitedResource, Permission, Principal, UpdateVehicleRequest,
    Vehicle, VehicleFilter, VehicleId, WorkOrder, lookup,
};

/// Request body for `PUT /vehicles/{id}/mileage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct RecordMileageRequest {
    #[schema(example = 48_250)]
    pub mileage: u32,
}

/// Vehicle operations.
#[derive(Clone)]
pub struct VehicleService {
    repos: Repositories,
    usage: UsageGuard,
    clock: Arc<dyn Clock>,
}

impl VehicleService {
    /// Create the service.
    pub fn new(repos: Repositories, usage: UsageGuard, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            usage,
            clock,
        }
    }

    /// Register a vehicle for an active customer.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateVehicleRequest,
    ) -> Result<Vehicle, Error> {
        principal.require(Permission::VehiclesWrite)?;
        let vehicle = Vehicle::create(principal.tenant_id, request, self.clock.utc())?;
        lookup::reference(
            lookup::customer(&self.repos, principal.tenant_id, vehicle.customer_id).await,
            "customerId",
        )?;
        self.usage
            .ensure_capacity(principal.tenant_id, LimitedResource::Vehicles)
            .await?;
        self.repos.vehicles.insert(&vehicle).await?;
        info!(tenant_id = %vehicle.tenant_id, vehicle_id = %vehicle.id, "vehicle created");
        Ok(vehicle)
    }

    /// Fetch one vehicle.
    pub async fn get(&self, principal: &Principal, id: VehicleId) -> Result<Vehicle, Error> {
        principal.require(Permission::VehiclesRead)?;
        lookup::vehicle(&self.repos, principal.tenant_id, id).await
    }

    /// Page through vehicles.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &VehicleFilter,
        page: PageRequest,
    ) -> Result<Page<Vehicle>, Error> {
        principal.require(Permission::VehiclesRead)?;
        Ok(self
            .repos
            .vehicles
            .list(principal.tenant_id, filter, page)
            .await?)
    }

    /// Apply a partial update.
    pub async fn update(
        &self,
        principal: &Principal,
        id: VehicleId,
        patch: UpdateVehicleRequest,
    ) -> Result<Vehicle, Error> {
        principal.require(Permission::VehiclesWrite)?;
        let mut vehicle = lookup::vehicle(&self.repos, principal.tenant_id, id).await?;
        vehicle.apply(patch, self.clock.utc())?;
        self.repos.vehicles.update(&vehicle).await?;
        Ok(vehicle)
    }

    /// Record an odometer reading.
    pub async fn record_mileage(
        &self,
        principal: &Principal,
        id: VehicleId,
        request: RecordMileageRequest,
    ) -> Result<Vehicle, Error> {
        principal.require(Permission::VehiclesWrite)?;
        let mut vehicle = lookup::vehicle(&self.repos, principal.tenant_id, id).await?;
        vehicle.record_mileage(request.mileage, self.clock.utc())?;
        self.repos.vehicles.update(&vehicle).await?;
        Ok(vehicle)
    }

    /// Soft delete.
    pub async fn delete(&self, principal: &Principal, id: VehicleId) -> Result<(), Error> {
        principal.require(Permission::VehiclesWrite)?;
        let mut vehicle = lookup::vehicle(&self.repos, principal.tenant_id, id).await?;
        vehicle.is_active = false;
        vehicle.updated_at = self.clock.utc();
        self.repos.vehicles.update(&vehicle).await?;
        Ok(())
    }

    /// Work orders raised for the vehicle, newest first.
    pub async fn history(
        &self,
        principal: &Principal,
        id: VehicleId,
    ) -> Result<Vec<WorkOrder>, Error> {
        principal.require(Permission::VehiclesRead)?;
        principal.require(Permission::WorkOrdersRead)?;
        let vehicle = lookup::vehicle(&self.repos, principal.tenant_id, id).await?;
        let mut orders = self
            .repos
            .work_orders
            .list_for_vehicle(principal.tenant_id, vehicle.id)
            .await?;
        orders.retain(|order| order.is_active);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
#[path = "vehicle_service_tests.rs"]
mod tests;
