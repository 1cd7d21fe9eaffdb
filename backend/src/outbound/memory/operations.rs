//! Work orders and appointments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{AppointmentRepository, RepositoryError, WorkOrderRepository};
use crate::domain::{
    Appointment, AppointmentFilter, AppointmentId, CustomerId, TenantId, UserId, VehicleId,
    WorkOrder, WorkOrderFilter, WorkOrderId, WorkOrderStatus,
};

use super::{MemoryStore, check_revision, paged};

fn newest_first(orders: &mut [WorkOrder]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.number.cmp(&a.number)));
}

#[async_trait]
impl WorkOrderRepository for MemoryStore {
    async fn next_sequence(
        &self,
        tenant_id: TenantId,
        period: &str,
    ) -> Result<u32, RepositoryError> {
        let mut tables = self.lock()?;
        let counter = tables
            .work_order_counters
            .entry((tenant_id, period.to_owned()))
            .or_default();
        *counter += 1;
        Ok(*counter)
    }

    async fn insert(&self, order: &WorkOrder) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables
            .work_orders
            .values()
            .any(|o| o.tenant_id == order.tenant_id && o.number == order.number)
        {
            return Err(RepositoryError::duplicate("number"));
        }
        tables.work_orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(
        &self,
        order: &WorkOrder,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables.work_orders.get(&order.id).map(|o| o.updated_at);
        check_revision(stored, expected_updated_at, "work order")?;
        tables.work_orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: WorkOrderId,
    ) -> Result<Option<WorkOrder>, RepositoryError> {
        Ok(self
            .lock()?
            .work_orders
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id && o.is_active)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &WorkOrderFilter,
        page: PageRequest,
    ) -> Result<Page<WorkOrder>, RepositoryError> {
        let tables = self.lock()?;
        let mut orders: Vec<WorkOrder> = tables
            .work_orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && o.is_active && filter.matches(o))
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(paged(&orders, page))
    }

    async fn list_for_vehicle(
        &self,
        tenant_id: TenantId,
        vehicle_id: VehicleId,
    ) -> Result<Vec<WorkOrder>, RepositoryError> {
        let tables = self.lock()?;
        let mut orders: Vec<WorkOrder> = tables
            .work_orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && o.is_active && o.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn count_created_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .work_orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && from <= o.created_at && o.created_at < to)
            .count() as u64)
    }

    async fn count_open_for_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .work_orders
            .values()
            .filter(|o| {
                o.tenant_id == tenant_id
                    && o.is_active
                    && o.customer_id == customer_id
                    && o.status.is_open()
            })
            .count() as u64)
    }

    async fn status_counts(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<(WorkOrderStatus, u64)>, RepositoryError> {
        let tables = self.lock()?;
        Ok(WorkOrderStatus::ALL
            .iter()
            .map(|status| {
                let count = tables
                    .work_orders
                    .values()
                    .filter(|o| o.tenant_id == tenant_id && o.is_active && o.status == *status)
                    .count() as u64;
                (*status, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn list_completed_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WorkOrder>, RepositoryError> {
        let tables = self.lock()?;
        let mut orders: Vec<WorkOrder> = tables
            .work_orders
            .values()
            .filter(|o| {
                o.tenant_id == tenant_id
                    && o.is_active
                    && o.completed_at.is_some_and(|at| from <= at && at < to)
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.completed_at);
        Ok(orders)
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn insert(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.lock()?
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn update(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.lock()?
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        Ok(self
            .lock()?
            .appointments
            .get(&id)
            .filter(|a| a.tenant_id == tenant_id && a.is_active)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<Appointment>, RepositoryError> {
        let tables = self.lock()?;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.tenant_id == tenant_id && a.is_active)
            .filter(|a| filter.from.is_none_or(|from| a.starts_at >= from))
            .filter(|a| filter.to.is_none_or(|to| a.starts_at < to))
            .filter(|a| {
                filter
                    .technician_id
                    .is_none_or(|id| a.technician_id == Some(id))
            })
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
        Ok(paged(&appointments, page))
    }

    async fn find_for_technician(
        &self,
        tenant_id: TenantId,
        technician_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        Ok(self
            .lock()?
            .appointments
            .values()
            .filter(|a| {
                a.tenant_id == tenant_id
                    && a.is_active
                    && a.technician_id == Some(technician_id)
                    && a.overlaps(from, to)
            })
            .cloned()
            .collect())
    }

    async fn count_starting_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .appointments
            .values()
            .filter(|a| {
                a.tenant_id == tenant_id
                    && a.is_active
                    && a.status.occupies_slot()
                    && from <= a.starts_at
                    && a.starts_at < to
            })
            .count() as u64)
    }
}
