//! Port for invoice and payment persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::{
    Invoice, InvoiceFilter, InvoiceId, Payment, PaymentId, TenantId, WorkOrder, WorkOrderId,
};

use super::RepositoryError;

/// Outstanding receivables of a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutstandingSummary {
    pub balance_cents: i64,
    pub overdue_invoices: u64,
}

/// Storage for invoices and payments.
///
/// Writes that touch several records are atomic: an invoice is stored
/// together with its invoiced work order, and a payment together with the
/// invoice totals it changes. Writes to records that already exist are
/// guarded by the `updated_at` the caller read; a record changed in between
/// fails the whole write with [`RepositoryError::Stale`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Allocate the next number in a tenant's yearly invoice sequence.
    async fn next_invoice_sequence(&self, tenant_id: TenantId, year: i32)
    -> Result<u32, RepositoryError>;

    /// Insert an invoice and store the invoiced work order.
    ///
    /// A second invoice for the same work order surfaces as
    /// [`RepositoryError::Duplicate`] with field `work_order_id`.
    async fn create_invoice(
        &self,
        invoice: &Invoice,
        order: &WorkOrder,
        order_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Replace a stored invoice.
    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Fetch an active invoice of the tenant.
    async fn find_invoice(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, RepositoryError>;

    /// Fetch the invoice raised for a work order.
    async fn find_invoice_for_work_order(
        &self,
        tenant_id: TenantId,
        work_order_id: WorkOrderId,
    ) -> Result<Option<Invoice>, RepositoryError>;

    /// List active invoices, newest first.
    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<Page<Invoice>, RepositoryError>;

    /// Insert or replace a payment and store the updated invoice.
    ///
    /// `invoice_updated_at` guards the invoice write. A reused provider
    /// event id surfaces as [`RepositoryError::Duplicate`] with field
    /// `provider_event_id`.
    async fn save_payment(
        &self,
        invoice: &Invoice,
        invoice_updated_at: DateTime<Utc>,
        payment: &Payment,
    ) -> Result<(), RepositoryError>;

    /// Fetch a payment of the tenant.
    async fn find_payment(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError>;

    /// Fetch the payment recorded for a provider event, across tenants.
    async fn find_payment_by_event(
        &self,
        event_id: &str,
    ) -> Result<Option<Payment>, RepositoryError>;

    /// Payments recorded against an invoice, oldest first.
    async fn list_payments(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, RepositoryError>;

    /// Completed payments received in `[from, to)`.
    async fn completed_payments_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, RepositoryError>;

    /// Unpaid balance across issued and partially paid invoices.
    async fn outstanding(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<OutstandingSummary, RepositoryError>;
}
