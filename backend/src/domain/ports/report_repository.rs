//! Port for stored report snapshots.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Report, ReportId, TenantId};

use super::RepositoryError;

/// Storage for generated reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Store a generated report.
    async fn insert(&self, report: &Report) -> Result<(), RepositoryError>;

    /// Fetch a stored report of the tenant.
    async fn find(&self, tenant_id: TenantId, id: ReportId)
    -> Result<Option<Report>, RepositoryError>;

    /// List stored reports, newest first.
    async fn list(&self, tenant_id: TenantId, page: PageRequest)
    -> Result<Page<Report>, RepositoryError>;
}
