//! Port for work-order persistence and work-order read models.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{
    CustomerId, TenantId, VehicleId, WorkOrder, WorkOrderFilter, WorkOrderId, WorkOrderStatus,
};

use super::RepositoryError;

/// Storage for work orders. Reads only return active records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Allocate the next number in a tenant's monthly sequence.
    ///
    /// `period` is the `YYYYMM` stamp; sequences start at 1.
    async fn next_sequence(&self, tenant_id: TenantId, period: &str)
    -> Result<u32, RepositoryError>;

    /// Insert a new work order.
    async fn insert(&self, order: &WorkOrder) -> Result<(), RepositoryError>;

    /// Replace a stored work order, including soft deletion.
    ///
    /// The write applies only while the stored order still has
    /// `updated_at == expected_updated_at`; otherwise it fails with
    /// [`RepositoryError::Stale`] and nothing changes.
    async fn update(
        &self,
        order: &WorkOrder,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Fetch an active work order of the tenant.
    async fn find(
        &self,
        tenant_id: TenantId,
        id: WorkOrderId,
    ) -> Result<Option<WorkOrder>, RepositoryError>;

    /// List active work orders, newest first.
    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &WorkOrderFilter,
        page: PageRequest,
    ) -> Result<Page<WorkOrder>, RepositoryError>;

    /// Every active work order for a vehicle, newest first.
    async fn list_for_vehicle(
        &self,
        tenant_id: TenantId,
        vehicle_id: VehicleId,
    ) -> Result<Vec<WorkOrder>, RepositoryError>;

    /// Count work orders created in `[from, to)`, deleted ones included.
    async fn count_created_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Count active open work orders of a customer.
    async fn count_open_for_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<u64, RepositoryError>;

    /// Count active work orders per status.
    async fn status_counts(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<(WorkOrderStatus, u64)>, RepositoryError>;

    /// Active work orders whose `completed_at` falls in `[from, to)`.
    async fn list_completed_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WorkOrder>, RepositoryError>;
}
