//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` and only talk to
//! domain services, so they stay testable over the in-memory adapters.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{FileStore, PasswordHasher, Repositories, TokenService};
use crate::domain::{
    AppointmentService, AuthService, BillingService, CustomerService, InventoryService,
    ReportService, TenantService, UserService, VehicleService, WebhookVerifier, WorkOrderService,
};

/// Parameter object bundling the port implementations behind the services.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub repositories: Repositories,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub files: Arc<dyn FileStore>,
    pub webhooks: WebhookVerifier,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub tenants: TenantService,
    pub users: UserService,
    pub customers: CustomerService,
    pub vehicles: VehicleService,
    pub work_orders: WorkOrderService,
    pub appointments: AppointmentService,
    pub billing: BillingService,
    pub inventory: InventoryService,
    pub reports: ReportService,
}

impl HttpState {
    /// Wire every domain service over the supplied ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use chrono::Duration;
    /// use garage_backend::domain::WebhookVerifier;
    /// use garage_backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use garage_backend::outbound::files::LocalFileStore;
    /// use garage_backend::outbound::memory::MemoryStore;
    /// use garage_backend::outbound::security::{BcryptPasswordHasher, JwtTokenService};
    /// use mockable::DefaultClock;
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     repositories: MemoryStore::new().repositories(),
    ///     hasher: Arc::new(BcryptPasswordHasher::default()),
    ///     tokens: Arc::new(JwtTokenService::new(b"secret", Duration::hours(1))),
    ///     files: Arc::new(LocalFileStore::new("./uploads")),
    ///     webhooks: WebhookVerifier::new(None),
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// let _billing = state.billing.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            repositories,
            hasher,
            tokens,
            files,
            webhooks,
            clock,
        } = ports;
        let tenants = TenantService::new(
            repositories.clone(),
            hasher.clone(),
            tokens.clone(),
            clock.clone(),
        );
        let usage = tenants.usage_guard().clone();
        let work_orders =
            WorkOrderService::new(repositories.clone(), usage.clone(), files, clock.clone());
        Self {
            auth: AuthService::new(repositories.clone(), hasher.clone(), tokens, clock.clone()),
            users: UserService::new(repositories.clone(), usage.clone(), hasher, clock.clone()),
            customers: CustomerService::new(repositories.clone(), usage.clone(), clock.clone()),
            vehicles: VehicleService::new(repositories.clone(), usage.clone(), clock.clone()),
            appointments: AppointmentService::new(
                repositories.clone(),
                work_orders.clone(),
                clock.clone(),
            ),
            billing: BillingService::new(repositories.clone(), webhooks, clock.clone()),
            inventory: InventoryService::new(repositories.clone(), usage, clock.clone()),
            reports: ReportService::new(repositories, clock),
            work_orders,
            tenants,
        }
    }
}
