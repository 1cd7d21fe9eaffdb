//! Port for appointment persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{Appointment, AppointmentFilter, AppointmentId, TenantId, UserId};

use super::RepositoryError;

/// Storage for appointments. Reads only return active records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert a new appointment.
    async fn insert(&self, appointment: &Appointment) -> Result<(), RepositoryError>;

    /// Replace a stored appointment, including soft deletion.
    async fn update(&self, appointment: &Appointment) -> Result<(), RepositoryError>;

    /// Fetch an active appointment of the tenant.
    async fn find(
        &self,
        tenant_id: TenantId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError>;

    /// List active appointments ordered by start time.
    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<Appointment>, RepositoryError>;

    /// Active appointments of a technician that may intersect `[from, to)`,
    /// whatever their status. Adapters may over-select; callers confirm with
    /// [`Appointment::overlaps`].
    async fn find_for_technician(
        &self,
        tenant_id: TenantId,
        technician_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError>;

    /// Count active appointments starting in `[from, to)` that still occupy
    /// their slot.
    async fn count_starting_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}
