//! Invoices, payments and payment-provider webhook events.
//!
//! `amount_paid_cents` only counts completed payments. Invoice status is a
//! function of the paid amount: `issued` with nothing paid, `partially_paid`
//! while a balance remains and `paid` once settled.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::text_enum::text_enum;
use super::validation::{self, FieldError};
use super::{CustomerId, Error, InvoiceId, PaymentId, TenantId, WorkOrder, WorkOrderId};

text_enum! {
    /// Lifecycle status of an invoice.
    pub enum InvoiceStatus {
        Draft => "draft",
        Issued => "issued",
        PartiallyPaid => "partially_paid",
        Paid => "paid",
        Void => "void",
    }
}

text_enum! {
    /// How a payment was made.
    pub enum PaymentMethod {
        Cash => "cash",
        Card => "card",
        Check => "check",
        BankTransfer => "bank_transfer",
        Online => "online",
    }
}

text_enum! {
    /// Settlement state of a payment.
    pub enum PaymentStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Kind of event delivered by the payment provider.
    pub enum WebhookEventType {
        PaymentSucceeded => "payment.succeeded",
        PaymentFailed => "payment.failed",
    }
}

impl InvoiceStatus {
    /// Whether the invoice accepts payments.
    pub const fn accepts_payments(self) -> bool {
        matches!(self, Self::Issued | Self::PartiallyPaid)
    }
}

/// Format an invoice number such as `INV-2024-00042`.
pub fn invoice_number(now: DateTime<Utc>, sequence: u32) -> String {
    format!("INV-{:04}-{sequence:05}", now.year())
}

/// One billed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

/// A bill issued for a completed work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    #[schema(example = "INV-2024-00042")]
    pub number: String,
    pub work_order_id: WorkOrderId,
    pub customer_id: CustomerId,
    pub lines: Vec<InvoiceLine>,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub amount_paid_cents: i64,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice with derived balance and overdue flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub balance_cents: i64,
    pub is_overdue: bool,
}

impl Invoice {
    /// Build an issued invoice from a completed work order.
    pub fn for_work_order(
        order: &WorkOrder,
        number: String,
        tax_rate_bps: u32,
        due_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let services = order.services.iter().map(|line| InvoiceLine {
            description: format!(
                "{} ({}.{:02} h)",
                line.description,
                line.labor_hundredths / 100,
                line.labor_hundredths % 100
            ),
            quantity: 1,
            unit_price_cents: line.total_cents,
            total_cents: line.total_cents,
        });
        let parts = order.parts.iter().map(|line| InvoiceLine {
            description: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            total_cents: line.total_cents,
        });
        let lines: Vec<InvoiceLine> = services.chain(parts).collect();
        let subtotal: i64 = lines.iter().map(|l| l.total_cents).sum();
        let tax = super::money::tax_cents(subtotal, tax_rate_bps);
        let mut invoice = Self {
            id: InvoiceId::random(),
            tenant_id: order.tenant_id,
            number,
            work_order_id: order.id,
            customer_id: order.customer_id,
            lines,
            subtotal_cents: subtotal,
            tax_rate_bps,
            tax_cents: tax,
            total_cents: subtotal + tax,
            amount_paid_cents: 0,
            status: InvoiceStatus::Issued,
            issued_at: now,
            due_at: now + Duration::days(i64::from(due_days)),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        invoice.settle_status();
        invoice
    }

    /// Amount still owed.
    pub fn balance_cents(&self) -> i64 {
        self.total_cents - self.amount_paid_cents
    }

    /// Unpaid past the due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.accepts_payments() && self.balance_cents() > 0 && now > self.due_at
    }

    /// Project the invoice with derived fields.
    pub fn view(self, now: DateTime<Utc>) -> InvoiceView {
        InvoiceView {
            balance_cents: self.balance_cents(),
            is_overdue: self.is_overdue(now),
            invoice: self,
        }
    }

    /// Derive the status from the amount paid. Nothing owed means paid.
    fn settle_status(&mut self) {
        self.status = if self.amount_paid_cents >= self.total_cents {
            InvoiceStatus::Paid
        } else if self.amount_paid_cents <= 0 {
            InvoiceStatus::Issued
        } else {
            InvoiceStatus::PartiallyPaid
        };
    }

    /// Check that a payment of `amount_cents` can be taken.
    pub fn check_payment(&self, amount_cents: i64) -> Result<(), Error> {
        if !self.status.accepts_payments() {
            return Err(Error::conflict(format!(
                "invoice {} does not accept payments while {}",
                self.number, self.status
            ))
            .with_details(json!({ "status": self.status.as_str() })));
        }
        if amount_cents <= 0 {
            return Err(FieldError::new("amountCents", "out_of_range", "must be positive").into());
        }
        if amount_cents > self.balance_cents() {
            return Err(Error::invalid_request("payment exceeds the outstanding balance")
                .with_details(json!({
                    "field": "amountCents",
                    "code": "exceeds_balance",
                    "balanceCents": self.balance_cents(),
                })));
        }
        Ok(())
    }

    /// Credit a completed payment.
    pub fn apply_payment(&mut self, amount_cents: i64, now: DateTime<Utc>) -> Result<(), Error> {
        self.check_payment(amount_cents)?;
        self.amount_paid_cents += amount_cents;
        self.settle_status();
        self.updated_at = now;
        Ok(())
    }

    /// Reverse a refunded payment.
    pub fn reverse_payment(&mut self, amount_cents: i64, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status == InvoiceStatus::Void {
            return Err(Error::conflict("void invoices cannot be refunded"));
        }
        self.amount_paid_cents = (self.amount_paid_cents - amount_cents).max(0);
        self.settle_status();
        self.updated_at = now;
        Ok(())
    }

    /// Void the invoice. Fails once any payment has been taken.
    pub fn void(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status == InvoiceStatus::Void {
            return Err(Error::conflict(format!("invoice {} is already void", self.number)));
        }
        if self.amount_paid_cents > 0 {
            return Err(Error::conflict("invoices with completed payments cannot be voided")
                .with_details(json!({ "amountPaidCents": self.amount_paid_cents })));
        }
        self.status = InvoiceStatus::Void;
        self.updated_at = now;
        Ok(())
    }
}

/// Money received against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub status: PaymentStatus,
    pub provider_event_id: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Build a payment record.
    pub fn new(
        invoice: &Invoice,
        amount_cents: i64,
        method: PaymentMethod,
        reference: Option<&str>,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            id: PaymentId::random(),
            tenant_id: invoice.tenant_id,
            invoice_id: invoice.id,
            amount_cents,
            method,
            reference: validation::optional_text("reference", reference, 200)?,
            status,
            provider_event_id: None,
            received_at: now,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request body for generating an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInvoiceRequest {
    pub work_order_id: WorkOrderId,
}

/// Request body for recording a manual payment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    #[schema(example = 5_000)]
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

/// Filters for listing invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<CustomerId>,
    /// Restrict to invoices overdue at this instant.
    pub overdue_at: Option<DateTime<Utc>>,
}

/// Event posted by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhookEvent {
    #[schema(example = "evt_1PZ4")]
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: WebhookEventType,
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub amount_cents: i64,
    pub reference: Option<String>,
}

/// Result of processing a webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub payment: Payment,
    /// The event id was seen before; nothing changed.
    pub replayed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreateWorkOrderRequest, ErrorCode, PartLine, ServiceLine, UserId, VehicleId};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn invoice() -> Invoice {
        let mut order = WorkOrder::open(
            TenantId::random(),
            "WO-202403-0001".into(),
            CreateWorkOrderRequest {
                customer_id: CustomerId::random(),
                vehicle_id: VehicleId::random(),
                assigned_to: None,
                priority: None,
                description: "Service".into(),
                mileage_in: None,
                estimated_completion: None,
            },
            UserId::random(),
            now(),
        )
        .expect("valid order");
        order
            .add_service(ServiceLine::new("Labour", 200, 5_000).expect("valid"), 0, now())
            .expect("add service");
        order
            .add_part(PartLine::new(None, "Filter", 2, 1_000).expect("valid"), 0, now())
            .expect("add part");
        Invoice::for_work_order(&order, invoice_number(now(), 42), 1_000, 30, now())
    }

    #[rstest]
    fn invoice_copies_lines_and_taxes(invoice: Invoice) {
        assert_eq!(invoice.number, "INV-2024-00042");
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.lines[0].description, "Labour (2.00 h)");
        assert_eq!(invoice.subtotal_cents, 12_000);
        assert_eq!(invoice.tax_cents, 1_200);
        assert_eq!(invoice.total_cents, 13_200);
        assert_eq!(invoice.due_at, now() + Duration::days(30));
    }

    #[rstest]
    fn payments_drive_status(mut invoice: Invoice) {
        invoice.apply_payment(5_000, now()).expect("partial");
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
        invoice.apply_payment(8_200, now()).expect("settle");
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.balance_cents(), 0);

        invoice.reverse_payment(8_200, now()).expect("refund");
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(invoice.balance_cents(), 8_200);
    }

    #[rstest]
    fn payment_cannot_exceed_balance(invoice: Invoice) {
        let err = invoice.check_payment(13_201).expect_err("overpayment");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details().expect("details")["code"], "exceeds_balance");
        assert!(invoice.check_payment(0).is_err());
    }

    #[rstest]
    fn overdue_is_derived(invoice: Invoice) {
        assert!(!invoice.is_overdue(now() + Duration::days(30)));
        assert!(invoice.clone().view(now() + Duration::days(31)).is_overdue);
    }

    #[test]
    fn order_without_lines_invoices_as_settled() {
        let order = WorkOrder::open(
            TenantId::random(),
            "WO-202403-0002".into(),
            CreateWorkOrderRequest {
                customer_id: CustomerId::random(),
                vehicle_id: VehicleId::random(),
                assigned_to: None,
                priority: None,
                description: "Warranty inspection".into(),
                mileage_in: None,
                estimated_completion: None,
            },
            UserId::random(),
            now(),
        )
        .expect("valid order");
        let invoice = Invoice::for_work_order(&order, invoice_number(now(), 43), 1_000, 30, now());

        assert_eq!(invoice.total_cents, 0);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        let view = invoice.view(now() + Duration::days(90));
        assert_eq!(view.balance_cents, 0);
        assert!(!view.is_overdue);
    }

    #[rstest]
    fn void_requires_no_payments(mut invoice: Invoice) {
        let mut paid = invoice.clone();
        paid.apply_payment(100, now()).expect("pay");
        assert_eq!(paid.void(now()).expect_err("paid").code(), ErrorCode::Conflict);

        invoice.void(now()).expect("void");
        assert!(!invoice.is_overdue(now() + Duration::days(90)));
        assert!(invoice.check_payment(100).is_err());
    }

    #[rstest]
    fn webhook_event_uses_type_field() {
        let event: PaymentWebhookEvent = serde_json::from_value(json!({
            "eventId": "evt_1",
            "type": "payment.succeeded",
            "tenantId": TenantId::random(),
            "invoiceId": InvoiceId::random(),
            "amountCents": 500,
            "reference": null,
        }))
        .expect("valid event");
        assert_eq!(event.event_type, WebhookEventType::PaymentSucceeded);
    }
}
