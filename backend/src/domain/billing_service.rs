//! Invoicing, payments and the payment-provider webhook.

use std::sync::Arc;

use chrono::Datelike;
use hmac::{Hmac, Mac};
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::billing::invoice_number;
use super::ports::{RepositoryError, Repositories};
use super::validation::FieldError;
use super::{
    Error, GenerateInvoiceRequest, Invoice, InvoiceFilter, InvoiceId, InvoiceView, Payment,
    PaymentId, PaymentMethod, PaymentStatus, PaymentWebhookEvent, Permission, Principal,
    RecordPaymentRequest, TenantId, WebhookEventType, WebhookOutcome, WorkOrderStatus, lookup,
};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Checks `x-signature: sha256=<hex>` headers against the shared secret.
///
/// Without a secret every delivery is refused.
#[derive(Clone, Default)]
pub struct WebhookVerifier {
    secret: Option<Arc<Zeroizing<Vec<u8>>>>,
}

impl WebhookVerifier {
    /// Verifier for `secret`; `None` disables the webhook.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| Arc::new(Zeroizing::new(s.as_bytes().to_vec()))),
        }
    }

    /// Hex HMAC-SHA256 of `body`, formatted as a header value.
    pub fn sign(&self, body: &[u8]) -> Option<String> {
        let secret = self.secret.as_ref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_slice()).ok()?;
        mac.update(body);
        Some(format!(
            "{SIGNATURE_PREFIX}{}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Check a signature header in constant time.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), Error> {
        let rejected = || Error::unauthorized("invalid webhook signature");
        let Some(secret) = self.secret.as_ref() else {
            warn!("payment webhook received but no webhook secret is configured");
            return Err(rejected());
        };
        let signature = header
            .and_then(|h| h.trim().strip_prefix(SIGNATURE_PREFIX))
            .and_then(|h| hex::decode(h).ok())
            .ok_or_else(rejected)?;
        let mut mac = HmacSha256::new_from_slice(secret.as_slice())
            .map_err(|err| Error::internal(format!("webhook key rejected: {err}")))?;
        mac.update(body);
        mac.verify_slice(&signature).map_err(|_| rejected())
    }
}

/// Invoice and payment operations.
#[derive(Clone)]
pub struct BillingService {
    repos: Repositories,
    verifier: WebhookVerifier,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    /// Create the service.
    pub fn new(repos: Repositories, verifier: WebhookVerifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            verifier,
            clock,
        }
    }

    async fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Invoice, Error> {
        self.repos
            .billing
            .find_invoice(tenant_id, id)
            .await?
            .filter(|invoice| invoice.is_active)
            .ok_or_else(|| Error::not_found(format!("invoice {id} not found")))
    }

    /// Invoice a completed work order and mark it invoiced.
    pub async fn generate(
        &self,
        principal: &Principal,
        request: GenerateInvoiceRequest,
    ) -> Result<InvoiceView, Error> {
        principal.require(Permission::BillingWrite)?;
        let tenant_id = principal.tenant_id;
        let mut order = lookup::reference(
            lookup::work_order(&self.repos, tenant_id, request.work_order_id).await,
            "workOrderId",
        )?;
        if let Some(existing) = self
            .repos
            .billing
            .find_invoice_for_work_order(tenant_id, order.id)
            .await?
        {
            return Err(Error::conflict("work order is already invoiced")
                .with_details(json!({ "invoiceId": existing.id, "number": existing.number })));
        }
        if order.status != WorkOrderStatus::Completed {
            return Err(Error::conflict(format!(
                "only completed work orders can be invoiced; {} is {}",
                order.number, order.status
            ))
            .with_details(json!({ "status": order.status.as_str() })));
        }

        let tenant = lookup::tenant(&self.repos, tenant_id).await?;
        let now = self.clock.utc();
        let sequence = self
            .repos
            .billing
            .next_invoice_sequence(tenant_id, now.year())
            .await?;
        let invoice = Invoice::for_work_order(
            &order,
            invoice_number(now, sequence),
            tenant.settings.tax_rate_bps,
            tenant.settings.invoice_due_days,
            now,
        );
        let order_updated_at = order.updated_at;
        order.mark_invoiced(principal.user_id, now)?;
        self.repos
            .billing
            .create_invoice(&invoice, &order, order_updated_at)
            .await?;
        info!(
            tenant_id = %tenant_id,
            invoice = %invoice.number,
            work_order = %order.number,
            total_cents = invoice.total_cents,
            "invoice issued"
        );
        Ok(invoice.view(now))
    }

    /// Fetch one invoice with its derived fields.
    pub async fn get(&self, principal: &Principal, id: InvoiceId) -> Result<InvoiceView, Error> {
        principal.require(Permission::BillingRead)?;
        let invoice = self.invoice(principal.tenant_id, id).await?;
        Ok(invoice.view(self.clock.utc()))
    }

    /// Page through invoices, newest first.
    ///
    /// `overdue` restricts the page to invoices overdue right now.
    pub async fn list(
        &self,
        principal: &Principal,
        mut filter: InvoiceFilter,
        overdue: bool,
        page: PageRequest,
    ) -> Result<Page<InvoiceView>, Error> {
        principal.require(Permission::BillingRead)?;
        let now = self.clock.utc();
        if overdue {
            filter.overdue_at = Some(now);
        }
        let invoices = self
            .repos
            .billing
            .list_invoices(principal.tenant_id, &filter, page)
            .await?;
        Ok(invoices.map(|invoice| invoice.view(now)))
    }

    /// Payments recorded against an invoice, oldest first.
    pub async fn payments(
        &self,
        principal: &Principal,
        id: InvoiceId,
    ) -> Result<Vec<Payment>, Error> {
        principal.require(Permission::BillingRead)?;
        let invoice = self.invoice(principal.tenant_id, id).await?;
        Ok(self
            .repos
            .billing
            .list_payments(principal.tenant_id, invoice.id)
            .await?)
    }

    /// Take a manual payment.
    pub async fn record_payment(
        &self,
        principal: &Principal,
        id: InvoiceId,
        request: RecordPaymentRequest,
    ) -> Result<Payment, Error> {
        principal.require(Permission::BillingWrite)?;
        let mut invoice = self.invoice(principal.tenant_id, id).await?;
        let read_at = invoice.updated_at;
        let now = self.clock.utc();
        let payment = Payment::new(
            &invoice,
            request.amount_cents,
            request.method,
            request.reference.as_deref(),
            PaymentStatus::Completed,
            now,
        )?;
        invoice.apply_payment(payment.amount_cents, now)?;
        self.repos
            .billing
            .save_payment(&invoice, read_at, &payment)
            .await?;
        info!(
            invoice = %invoice.number,
            amount_cents = payment.amount_cents,
            status = %invoice.status,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Refund a completed payment and restore the invoice balance.
    pub async fn refund(&self, principal: &Principal, id: PaymentId) -> Result<Payment, Error> {
        principal.require(Permission::BillingWrite)?;
        let mut payment = self
            .repos
            .billing
            .find_payment(principal.tenant_id, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("payment {id} not found")))?;
        if payment.status != PaymentStatus::Completed {
            return Err(Error::conflict(format!(
                "only completed payments can be refunded; payment is {}",
                payment.status
            ))
            .with_details(json!({ "status": payment.status.as_str() })));
        }
        let mut invoice = self.invoice(principal.tenant_id, payment.invoice_id).await?;
        let read_at = invoice.updated_at;
        let now = self.clock.utc();
        invoice.reverse_payment(payment.amount_cents, now)?;
        payment.status = PaymentStatus::Refunded;
        payment.updated_at = now;
        self.repos
            .billing
            .save_payment(&invoice, read_at, &payment)
            .await?;
        info!(invoice = %invoice.number, payment_id = %payment.id, "payment refunded");
        Ok(payment)
    }

    /// Void an invoice without completed payments.
    pub async fn void(&self, principal: &Principal, id: InvoiceId) -> Result<InvoiceView, Error> {
        principal.require(Permission::BillingWrite)?;
        let mut invoice = self.invoice(principal.tenant_id, id).await?;
        let read_at = invoice.updated_at;
        let now = self.clock.utc();
        invoice.void(now)?;
        self.repos.billing.update_invoice(&invoice, read_at).await?;
        info!(invoice = %invoice.number, "invoice voided");
        Ok(invoice.view(now))
    }

    /// Verify, decode and apply a provider event.
    ///
    /// Events are applied at most once per `eventId`; a repeat returns the
    /// payment recorded the first time with `replayed` set.
    pub async fn handle_webhook(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, Error> {
        self.verifier.verify(signature, body)?;
        let event: PaymentWebhookEvent = serde_json::from_slice(body).map_err(|err| {
            Error::invalid_request(format!("malformed webhook payload: {err}"))
        })?;

        if let Some(payment) = self.replayed(&event.event_id).await? {
            return Ok(payment);
        }

        let mut invoice = self.invoice(event.tenant_id, event.invoice_id).await?;
        let read_at = invoice.updated_at;
        let now = self.clock.utc();
        let status = match event.event_type {
            WebhookEventType::PaymentSucceeded => PaymentStatus::Completed,
            WebhookEventType::PaymentFailed => PaymentStatus::Failed,
        };
        if event.amount_cents <= 0 {
            return Err(FieldError::new("amountCents", "out_of_range", "must be positive").into());
        }
        let mut payment = Payment::new(
            &invoice,
            event.amount_cents,
            PaymentMethod::Online,
            event.reference.as_deref(),
            status,
            now,
        )?;
        payment.provider_event_id = Some(event.event_id.clone());
        if status == PaymentStatus::Completed {
            invoice.apply_payment(payment.amount_cents, now)?;
        }

        match self
            .repos
            .billing
            .save_payment(&invoice, read_at, &payment)
            .await
        {
            Ok(()) => {}
            // A concurrent delivery of the same event won the insert, or
            // another write to the invoice landed first.
            Err(RepositoryError::Duplicate { .. }) => {
                if let Some(outcome) = self.replayed(&event.event_id).await? {
                    return Ok(outcome);
                }
                return Err(Error::conflict("webhook event is already being processed"));
            }
            Err(stale @ RepositoryError::Stale { .. }) => {
                if let Some(outcome) = self.replayed(&event.event_id).await? {
                    return Ok(outcome);
                }
                return Err(stale.into());
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            event_id = %event.event_id,
            invoice = %invoice.number,
            status = %payment.status,
            "payment webhook applied"
        );
        Ok(WebhookOutcome {
            payment,
            replayed: false,
        })
    }

    async fn replayed(&self, event_id: &str) -> Result<Option<WebhookOutcome>, Error> {
        let seen = self.repos.billing.find_payment_by_event(event_id).await?;
        if seen.is_some() {
            info!(event_id, "payment webhook replayed");
        }
        Ok(seen.map(|payment| WebhookOutcome {
            payment,
            replayed: true,
        }))
    }
}

#[cfg(test)]
#[path = "billing_service_tests.rs"]
mod tests;
