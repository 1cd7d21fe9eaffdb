//! PostgreSQL-backed `BillingRepository`.
//!
//! Invoice creation and payment recording each run in one transaction so
//! the invoiced work order and the invoice totals never drift from the
//! records that changed them. Every write is filtered on the `updated_at`
//! the caller read; a write that matches no row rolls back as stale.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{BillingRepository, OutstandingSummary, RepositoryError};
use crate::domain::{
    CustomerId, Invoice, InvoiceFilter, InvoiceId, InvoiceStatus, Payment, PaymentId,
    PaymentStatus, TenantId, WorkOrder, WorkOrderId,
};

use super::column_codecs::{
    from_json, i32_to_u32, page_window, parse_text, to_count, to_json, u32_to_i32,
};
use super::diesel_error_mapping::{
    guarded, map_diesel_error, map_guarded_error, map_pool_error,
};
use super::diesel_work_order_repository::work_order_to_row;
use super::models::{InvoiceRow, PaymentRow};
use super::pool::DbPool;
use super::schema::{invoice_counters, invoices, payments, work_orders};

/// Diesel-backed implementation of the billing repository port.
#[derive(Clone)]
pub struct DieselBillingRepository {
    pool: DbPool,
}

impl DieselBillingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn invoice_to_row(invoice: &Invoice) -> Result<InvoiceRow, RepositoryError> {
    Ok(InvoiceRow {
        id: *invoice.id.as_uuid(),
        tenant_id: *invoice.tenant_id.as_uuid(),
        number: invoice.number.clone(),
        work_order_id: *invoice.work_order_id.as_uuid(),
        customer_id: *invoice.customer_id.as_uuid(),
        lines: to_json(&invoice.lines, "lines")?,
        subtotal_cents: invoice.subtotal_cents,
        tax_rate_bps: u32_to_i32(invoice.tax_rate_bps, "tax_rate_bps")?,
        tax_cents: invoice.tax_cents,
        total_cents: invoice.total_cents,
        amount_paid_cents: invoice.amount_paid_cents,
        status: invoice.status.as_str().to_owned(),
        issued_at: invoice.issued_at,
        due_at: invoice.due_at,
        is_active: invoice.is_active,
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    })
}

fn row_to_invoice(row: InvoiceRow) -> Result<Invoice, RepositoryError> {
    Ok(Invoice {
        id: InvoiceId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        number: row.number,
        work_order_id: WorkOrderId::from_uuid(row.work_order_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        lines: from_json(row.lines, "lines")?,
        subtotal_cents: row.subtotal_cents,
        tax_rate_bps: i32_to_u32(row.tax_rate_bps, "tax_rate_bps")?,
        tax_cents: row.tax_cents,
        total_cents: row.total_cents,
        amount_paid_cents: row.amount_paid_cents,
        status: parse_text(&row.status, "status")?,
        issued_at: row.issued_at,
        due_at: row.due_at,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: *payment.id.as_uuid(),
        tenant_id: *payment.tenant_id.as_uuid(),
        invoice_id: *payment.invoice_id.as_uuid(),
        amount_cents: payment.amount_cents,
        method: payment.method.as_str().to_owned(),
        reference: payment.reference.clone(),
        status: payment.status.as_str().to_owned(),
        provider_event_id: payment.provider_event_id.clone(),
        received_at: payment.received_at,
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, RepositoryError> {
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        amount_cents: row.amount_cents,
        method: parse_text(&row.method, "method")?,
        reference: row.reference,
        status: parse_text(&row.status, "status")?,
        provider_event_id: row.provider_event_id,
        received_at: row.received_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_payments(rows: Vec<PaymentRow>) -> Result<Vec<Payment>, RepositoryError> {
    rows.into_iter().map(row_to_payment).collect()
}

fn payable_statuses() -> Vec<&'static str> {
    InvoiceStatus::ALL
        .iter()
        .filter(|status| status.accepts_payments())
        .map(|status| status.as_str())
        .collect()
}

fn active_invoices<'a>(tenant_id: TenantId) -> invoices::BoxedQuery<'a, Pg> {
    invoices::table
        .filter(invoices::tenant_id.eq(*tenant_id.as_uuid()))
        .filter(invoices::is_active.eq(true))
        .into_boxed()
}

fn filtered_invoices<'a>(
    tenant_id: TenantId,
    filter: &InvoiceFilter,
) -> invoices::BoxedQuery<'a, Pg> {
    let mut query = active_invoices(tenant_id);
    if let Some(status) = filter.status {
        query = query.filter(invoices::status.eq(status.as_str()));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(invoices::customer_id.eq(*customer_id.as_uuid()));
    }
    if let Some(at) = filter.overdue_at {
        query = query
            .filter(invoices::status.eq_any(payable_statuses()))
            .filter(invoices::total_cents.gt(invoices::amount_paid_cents))
            .filter(invoices::due_at.lt(at));
    }
    query
}

#[async_trait]
impl BillingRepository for DieselBillingRepository {
    async fn next_invoice_sequence(
        &self,
        tenant_id: TenantId,
        year: i32,
    ) -> Result<u32, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let value: i32 = diesel::insert_into(invoice_counters::table)
            .values((
                invoice_counters::tenant_id.eq(tenant_id.as_uuid()),
                invoice_counters::year.eq(year),
                invoice_counters::last_value.eq(1),
            ))
            .on_conflict((invoice_counters::tenant_id, invoice_counters::year))
            .do_update()
            .set(invoice_counters::last_value.eq(invoice_counters::last_value + 1))
            .returning(invoice_counters::last_value)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        i32_to_u32(value, "last_value")
    }

    async fn create_invoice(
        &self,
        invoice: &Invoice,
        order: &WorkOrder,
        order_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let invoice_row = invoice_to_row(invoice)?;
        let order_row = work_order_to_row(order)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let affected = diesel::update(
                    work_orders::table
                        .filter(work_orders::id.eq(order_row.id))
                        .filter(work_orders::updated_at.eq(order_updated_at)),
                )
                .set(&order_row)
                .execute(conn)
                .await?;
                if affected == 0 {
                    return Err(DieselError::RollbackTransaction);
                }
                diesel::insert_into(invoices::table)
                    .values(&invoice_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_guarded_error("work order"))?;

        debug!(number = %invoice.number, "invoice stored");
        Ok(())
    }

    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = invoice_to_row(invoice)?;
        let affected = diesel::update(
            invoices::table
                .filter(invoices::id.eq(row.id))
                .filter(invoices::updated_at.eq(expected_updated_at)),
        )
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        guarded(affected, "invoice")
    }

    async fn find_invoice(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = active_invoices(tenant_id)
            .filter(invoices::id.eq(*id.as_uuid()))
            .select(InvoiceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_invoice).transpose()
    }

    async fn find_invoice_for_work_order(
        &self,
        tenant_id: TenantId,
        work_order_id: WorkOrderId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = invoices::table
            .filter(invoices::tenant_id.eq(tenant_id.as_uuid()))
            .filter(invoices::work_order_id.eq(work_order_id.as_uuid()))
            .select(InvoiceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_invoice).transpose()
    }

    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> Result<Page<Invoice>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = filtered_invoices(tenant_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<InvoiceRow> = filtered_invoices(tenant_id, filter)
            .order((invoices::issued_at.desc(), invoices::number.desc()))
            .offset(offset)
            .limit(limit)
            .select(InvoiceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows
            .into_iter()
            .map(row_to_invoice)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, to_count(total)))
    }

    async fn save_payment(
        &self,
        invoice: &Invoice,
        invoice_updated_at: DateTime<Utc>,
        payment: &Payment,
    ) -> Result<(), RepositoryError> {
        let invoice_row = invoice_to_row(invoice)?;
        let payment_row = payment_to_row(payment);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // The invoice row lock taken here serialises concurrent payments.
        conn.transaction(|conn| {
            async move {
                let affected = diesel::update(
                    invoices::table
                        .filter(invoices::id.eq(invoice_row.id))
                        .filter(invoices::updated_at.eq(invoice_updated_at)),
                )
                .set(&invoice_row)
                .execute(conn)
                .await?;
                if affected == 0 {
                    return Err(DieselError::RollbackTransaction);
                }
                diesel::insert_into(payments::table)
                    .values(&payment_row)
                    .on_conflict(payments::id)
                    .do_update()
                    .set(&payment_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_guarded_error("invoice"))
    }

    async fn find_payment(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = payments::table
            .filter(payments::id.eq(id.as_uuid()))
            .filter(payments::tenant_id.eq(tenant_id.as_uuid()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_payment).transpose()
    }

    async fn find_payment_by_event(
        &self,
        event_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = payments::table
            .filter(payments::provider_event_id.eq(event_id))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_payment).transpose()
    }

    async fn list_payments(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::tenant_id.eq(tenant_id.as_uuid()))
            .filter(payments::invoice_id.eq(invoice_id.as_uuid()))
            .order((payments::received_at.asc(), payments::created_at.asc()))
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_payments(rows)
    }

    async fn completed_payments_between(
        &self,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::tenant_id.eq(tenant_id.as_uuid()))
            .filter(payments::status.eq(PaymentStatus::Completed.as_str()))
            .filter(payments::received_at.ge(from))
            .filter(payments::received_at.lt(to))
            .order(payments::received_at.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_payments(rows)
    }

    async fn outstanding(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<OutstandingSummary, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(i64, i64, DateTime<Utc>)> = active_invoices(tenant_id)
            .filter(invoices::status.eq_any(payable_statuses()))
            .select((
                invoices::total_cents,
                invoices::amount_paid_cents,
                invoices::due_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().fold(
            OutstandingSummary::default(),
            |mut summary, (total, paid, due_at)| {
                summary.balance_cents += total - paid;
                if now > due_at && total > paid {
                    summary.overdue_invoices += 1;
                }
                summary
            },
        ))
    }
}
