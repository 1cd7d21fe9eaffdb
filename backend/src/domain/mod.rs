//! Domain primitives, aggregates and services.
//!
//! Purpose: hold the shop's business rules independently of transport and
//! storage. Entities validate their own fields and enforce their state
//! machines; services orchestrate repositories through the traits in
//! [`ports`] and never import inbound or outbound adapters.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: API error payload and stable codes.
//! - Aggregates: [`Tenant`], [`User`], [`Customer`], [`Vehicle`],
//!   [`WorkOrder`], [`Appointment`], [`Invoice`], [`InventoryItem`],
//!   [`Report`].
//! - Services: one per aggregate, each built from [`ports::Repositories`]
//!   and a [`mockable::Clock`].

pub mod appointment;
pub mod attachment;
pub mod auth;
pub mod authz;
pub mod billing;
pub mod customer;
pub mod error;
pub mod ids;
pub mod inventory;
pub mod money;
pub mod note;
pub mod ports;
pub mod report;
pub mod tenant;
pub mod text_enum;
pub mod trace_id;
pub mod user;
pub mod validation;
pub mod vehicle;
pub mod work_order;

mod lookup;
#[cfg(test)]
mod service_test_helpers;

pub mod appointment_service;
pub mod auth_service;
pub mod billing_service;
pub mod customer_service;
pub mod inventory_service;
pub mod report_service;
pub mod tenant_service;
pub mod user_service;
pub mod vehicle_service;
pub mod work_order_service;

pub use self::appointment::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentStatusRequest,
    ConvertAppointmentRequest, CreateAppointmentRequest, RescheduleAppointmentRequest,
};
pub use self::appointment_service::AppointmentService;
pub use self::attachment::{Attachment, MAX_ATTACHMENT_BYTES};
pub use self::auth::{AccessToken, LoginCredentials};
pub use self::auth_service::{AuthService, ChangePasswordRequest, LoginResponse};
pub use self::authz::{Permission, Principal, Role};
pub use self::billing::{
    GenerateInvoiceRequest, Invoice, InvoiceFilter, InvoiceLine, InvoiceStatus, InvoiceView,
    Payment, PaymentMethod, PaymentStatus, PaymentWebhookEvent, RecordPaymentRequest,
    WebhookEventType, WebhookOutcome,
};
pub use self::billing_service::{BillingService, WebhookVerifier};
pub use self::customer::{
    Address, CreateCustomerRequest, Customer, CustomerFilter, UpdateCustomerRequest,
};
pub use self::customer_service::CustomerService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::ids::{
    AppointmentId, CustomerId, InventoryItemId, InvoiceId, LineId, PaymentId, ReportId, TenantId,
    UserId, VehicleId, WorkOrderId,
};
pub use self::inventory::{
    AdjustStockRequest, CreateInventoryItemRequest, InventoryFilter, InventoryItem,
    MovementReason, StockChange, StockMovement, StockUpdate, UpdateInventoryItemRequest,
};
pub use self::inventory_service::InventoryService;
pub use self::money::Totals;
pub use self::note::{AddNoteRequest, Note};
pub use self::report::{
    DashboardSummary, GenerateReportRequest, Granularity, Report, ReportKind, ReportRange,
    RevenueBucket, RevenueReport, TechnicianReport,
};
pub use self::report_service::{ReportQuery, ReportService};
pub use self::tenant::{
    LimitedResource, PlanLimits, SubscriptionPlan, SubscriptionStatus, Tenant, TenantSettings,
    TenantSettingsPatch, UsageItem, UsageReport,
};
pub use self::tenant_service::{
    ChangePlanRequest, OwnerAccount, RegisterTenantRequest, Registration, TenantService, UsageGuard,
};
pub use self::trace_id::TraceId;
pub use self::user::{User, UserProfile, UserView};
pub use self::user_service::{CreateUserRequest, UpdateUserRequest, UserService};
pub use self::vehicle::{CreateVehicleRequest, FuelType, UpdateVehicleRequest, Vehicle, VehicleFilter};
pub use self::vehicle_service::{RecordMileageRequest, VehicleService};
pub use self::work_order::{
    AddPartLineRequest, AddServiceLineRequest, AssignTechnicianRequest, ChangeStatusRequest,
    CreateWorkOrderRequest, PartLine, Priority, ServiceLine, StatusChange, StepAction, StepStatus,
    UpdateWorkOrderRequest, WorkOrder, WorkOrderFilter, WorkOrderStatus, WorkflowActionRequest,
    WorkflowStep, WorkflowStepKey,
};
pub use self::work_order_service::{AttachmentUpload, WorkOrderService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use garage_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
