//! Tenant-scoped loaders shared by the services.
//!
//! Every loader returns `not_found` for missing, inactive or foreign records,
//! so another tenant's data is indistinguishable from absent data.

use super::ports::Repositories;
use super::{
    Customer, CustomerId, Error, Tenant, TenantId, User, UserId, Vehicle, VehicleId, WorkOrder,
    WorkOrderId,
};

pub(crate) async fn tenant(repos: &Repositories, id: TenantId) -> Result<Tenant, Error> {
    repos
        .tenants
        .find_by_id(id)
        .await?
        .filter(|tenant| tenant.is_active)
        .ok_or_else(|| Error::not_found(format!("tenant {id} not found")))
}

pub(crate) async fn user(repos: &Repositories, tenant_id: TenantId, id: UserId) -> Result<User, Error> {
    repos
        .users
        .find_by_id(id)
        .await?
        .filter(|user| user.tenant_id == tenant_id && user.is_active)
        .ok_or_else(|| Error::not_found(format!("user {id} not found")))
}

pub(crate) async fn customer(
    repos: &Repositories,
    tenant_id: TenantId,
    id: CustomerId,
) -> Result<Customer, Error> {
    repos
        .customers
        .find(tenant_id, id)
        .await?
        .filter(|customer| customer.is_active)
        .ok_or_else(|| Error::not_found(format!("customer {id} not found")))
}

pub(crate) async fn vehicle(
    repos: &Repositories,
    tenant_id: TenantId,
    id: VehicleId,
) -> Result<Vehicle, Error> {
    repos
        .vehicles
        .find(tenant_id, id)
        .await?
        .filter(|vehicle| vehicle.is_active)
        .ok_or_else(|| Error::not_found(format!("vehicle {id} not found")))
}

pub(crate) async fn work_order(
    repos: &Repositories,
    tenant_id: TenantId,
    id: WorkOrderId,
) -> Result<WorkOrder, Error> {
    repos
        .work_orders
        .find(tenant_id, id)
        .await?
        .filter(|order| order.is_active)
        .ok_or_else(|| Error::not_found(format!("work order {id} not found")))
}

/// Resolve a referenced record, reporting the referencing field on failure.
///
/// References in request bodies that point nowhere are client mistakes, so
/// they surface as `invalid_request` rather than `not_found`.
pub(crate) fn reference<T>(result: Result<T, Error>, field: &str) -> Result<T, Error> {
    result.map_err(|err| {
        if err.code() == super::ErrorCode::NotFound {
            Error::invalid_request(format!("{field} does not reference an active record"))
                .with_details(serde_json::json!({ "field": field, "code": "unknown_reference" }))
        } else {
            err
        }
    })
}
