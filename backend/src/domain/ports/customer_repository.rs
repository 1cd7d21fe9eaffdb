//! Port for customer persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Customer, CustomerFilter, CustomerId, TenantId};

use super::RepositoryError;

/// Storage for customers. Reads only return active records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert a new customer.
    async fn insert(&self, customer: &Customer) -> Result<(), RepositoryError>;

    /// Replace a stored customer, including soft deletion.
    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError>;

    /// Fetch an active customer of the tenant.
    async fn find(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// List active customers ordered by last then first name.
    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Page<Customer>, RepositoryError>;

    /// Count active customers.
    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;
}
