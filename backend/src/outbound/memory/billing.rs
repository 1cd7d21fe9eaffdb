//! Invoices and payments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};

use crate::domain::ports::{BillingRepository, OutstandingSummary, RepositoryError};
use crate::domain::{
    Invoice, InvoiceFilter, InvoiceId, Payment, PaymentId, PaymentStatus, TenantId, WorkOrder,
    WorkOrderId,
};

use super::{MemoryStore, check_revision, paged};

#[async_trait]
impl BillingRepository for MemoryStore {
    async fn next_invoice_sequence(
        &self,
        tenant_id: TenantId,
        year: i32,
    ) -> Result<u32, RepositoryError> {
        let mut tables = self.lock()?;
        let counter = tables.invoice_counters.entry((tenant_id, year)).or_default();
        *counter += 1;
        Ok(*counter)
    }

    async fn create_invoice(
        &self,
        invoice: &Invoice,
        order: &WorkOrder,
        order_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables.work_orders.get(&order.id).map(|o| o.updated_at);
        check_revision(stored, order_updated_at, "work order")?;
        if tables
            .invoices
            .values()
            .any(|i| i.work_order_id == invoice.work_order_id)
        {
            return Err(RepositoryError::duplicate("work_order_id"));
        }
        if tables
            .invoices
            .values()
            .any(|i| i.tenant_id == invoice.tenant_id && i.number == invoice.number)
        {
            return Err(RepositoryError::duplicate("number"));
        }
        tables.invoices.insert(invoice.id, invoice.clone());
        tables.work_orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables.invoices.get(&invoice.id).map(|i| i.updated_at);
        check_revision(stored, expected_updated_at, "invoice")?;
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn find_invoice(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        Ok(self
            .lock()?
            .invoices
            .get(&id)
            .filter(|i| i.tenant_id == tenant_id && i.is_active)
            .cloned())
    }

    async fn find_invoice_for_work_order(
        &self,
        tenant_id: TenantId,
        work_order_id: WorkOrderId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        Ok(self
            .lock()?
            .invoices
            .values()
            .find(|i| i.tenant_id == tenant_id && i.work_order_id == work_order_id)
            .cloned())
    }

    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<Page<Invoice>, RepositoryError> {
        let tables = self.lock()?;
        let mut invoices: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.is_active)
            .filter(|i| filter.status.is_none_or(|s| i.status == s))
            .filter(|i| filter.customer_id.is_none_or(|id| i.customer_id == id))
            .filter(|i| filter.overdue_at.is_none_or(|at| i.is_overdue(at)))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then(b.number.cmp(&a.number)));
        Ok(paged(&invoices, page))
    }

    async fn save_payment(
        &self,
        invoice: &Invoice,
        invoice_updated_at: DateTime<Utc>,
        payment: &Payment,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables.invoices.get(&invoice.id).map(|i| i.updated_at);
        check_revision(stored, invoice_updated_at, "invoice")?;
        if let Some(event_id) = &payment.provider_event_id {
            if tables.payments.values().any(|p| {
                p.id != payment.id && p.provider_event_id.as_ref() == Some(event_id)
            }) {
                return Err(RepositoryError::duplicate("provider_event_id"));
            }
        }
        tables.payments.insert(payment.id, payment.clone());
        tables.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn find_payment(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .lock()?
            .payments
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_payment_by_event(
        &self,
        event_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .lock()?
            .payments
            .values()
            .find(|p| p.provider_event_id.as_deref() == Some(event_id))
            .cloned())
    }

    async fn list_payments(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let tables = self.lock()?;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.invoice_id == invoice_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| a.received_at.cmp(&b.received_at).then(a.id.cmp(&b.id)));
        Ok(payments)
    }

    async fn completed_payments_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let tables = self.lock()?;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| {
                p.tenant_id == tenant_id
                    && p.status == PaymentStatus::Completed
                    && from <= p.received_at
                    && p.received_at < to
            })
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.received_at);
        Ok(payments)
    }

    async fn outstanding(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<OutstandingSummary, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .invoices
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.is_active && i.status.accepts_payments())
            .fold(OutstandingSummary::default(), |mut summary, invoice| {
                summary.balance_cents += invoice.balance_cents();
                if invoice.is_overdue(now) {
                    summary.overdue_invoices += 1;
                }
                summary
            }))
    }
}
