//! Port for staff user persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{TenantId, User, UserId};

use super::RepositoryError;

/// Storage for users. E-mail addresses are unique across all tenants; a
/// clash surfaces as [`RepositoryError::Duplicate`] with field `email`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    /// Replace a stored user.
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;

    /// Fetch a user by identifier regardless of tenant.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user by normalised e-mail address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// List a tenant's users ordered by creation time.
    async fn list(&self, tenant_id: TenantId, page: PageRequest)
    -> Result<Page<User>, RepositoryError>;

    /// Count a tenant's active users.
    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError>;
}
