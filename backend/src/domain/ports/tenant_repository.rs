//! Port for tenant persistence.

use async_trait::async_trait;

use crate::domain::{Tenant, TenantId};

use super::RepositoryError;

/// Storage for tenants. Slugs are globally unique; a clash surfaces as
/// [`RepositoryError::Duplicate`] with field `slug`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Insert a new tenant.
    async fn insert(&self, tenant: &Tenant) -> Result<(), RepositoryError>;

    /// Replace a stored tenant.
    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError>;

    /// Fetch a tenant by identifier.
    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError>;

    /// Fetch a tenant by slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError>;

    /// Number of tenants in the store.
    async fn count(&self) -> Result<u64, RepositoryError>;
}
