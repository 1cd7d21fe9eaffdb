//! Test helpers for inbound HTTP components.
//!
//! [`TestApp`] wires the real services over the in-memory store, bcrypt at
//! its minimum cost and a temporary upload directory, so handler tests run
//! the same code paths as production without a database.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use chrono::Duration;
use mockable::DefaultClock;
use serde_json::Value;
use tempfile::TempDir;

use crate::Trace;
use crate::domain::{
    AddServiceLineRequest, ChangePlanRequest, ChangeStatusRequest, CreateCustomerRequest,
    CreateUserRequest, CreateVehicleRequest, CreateWorkOrderRequest, Customer, LoginCredentials,
    OwnerAccount, Principal, RegisterTenantRequest, Role, StepAction, SubscriptionPlan, UserId,
    Vehicle, WebhookVerifier, WorkOrder, WorkOrderStatus, WorkflowActionRequest, WorkflowStepKey,
};
use crate::inbound::http::routes::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::files::LocalFileStore;
use crate::outbound::memory::MemoryStore;
use crate::outbound::security::{BcryptPasswordHasher, JwtTokenService};

/// Shared webhook secret used by handler tests.
pub const WEBHOOK_SECRET: &str = "whsec-test";

/// Build an `Authorization` header for `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Handler test fixture over in-memory adapters.
pub struct TestApp {
    pub state: web::Data<HttpState>,
    pub webhooks: WebhookVerifier,
    owner_token: Option<String>,
    owner: Option<Principal>,
    vehicles_created: AtomicU32,
    _uploads: TempDir,
}

impl TestApp {
    /// Password of the owner created by [`TestApp::with_shop`].
    pub const OWNER_PASSWORD: &'static str = "owner-password-1";

    /// An application with no tenants.
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("temporary upload dir");
        let webhooks = WebhookVerifier::new(Some(WEBHOOK_SECRET));
        let state = HttpState::new(HttpStatePorts {
            repositories: MemoryStore::new().repositories(),
            hasher: Arc::new(BcryptPasswordHasher::with_cost(4)),
            tokens: Arc::new(JwtTokenService::new(b"test-secret", Duration::hours(1))),
            files: Arc::new(LocalFileStore::new(uploads.path())),
            webhooks: webhooks.clone(),
            clock: Arc::new(DefaultClock),
        });
        Self {
            state: web::Data::new(state),
            webhooks,
            owner_token: None,
            owner: None,
            vehicles_created: AtomicU32::new(0),
            _uploads: uploads,
        }
    }

    /// An application with one professional-plan shop, "Joe's Garage".
    pub async fn with_shop() -> Self {
        let mut app = Self::new();
        let registration = app
            .state
            .tenants
            .register(RegisterTenantRequest {
                name: "Joe's Garage".into(),
                slug: "joes-garage".into(),
                owner: OwnerAccount {
                    email: "owner@joes.example".into(),
                    password: Self::OWNER_PASSWORD.into(),
                    first_name: "Joe".into(),
                    last_name: "Bloggs".into(),
                },
            })
            .await
            .expect("register shop");
        let owner = Principal {
            user_id: registration.user.id,
            tenant_id: registration.tenant.id,
            role: Role::Owner,
        };
        app.state
            .tenants
            .change_plan(
                &owner,
                ChangePlanRequest {
                    plan: SubscriptionPlan::Professional,
                },
            )
            .await
            .expect("upgrade plan");
        app.owner_token = Some(registration.token);
        app.owner = Some(owner);
        app
    }

    /// Bearer token of the shop owner.
    pub fn owner_token(&self) -> &str {
        self.owner_token.as_deref().expect("shop registered")
    }

    /// Principal of the shop owner.
    pub fn owner(&self) -> Principal {
        self.owner.expect("shop registered")
    }

    /// Create a staff member with `role` and return their bearer token.
    pub async fn token_for(&self, role: Role) -> String {
        self.staff_member(role).await.1
    }

    /// Create a staff member with `role`; returns their id and bearer token.
    pub async fn staff_member(&self, role: Role) -> (UserId, String) {
        let email = format!("{}-{}@joes.example", role.as_str(), uuid::Uuid::new_v4());
        let password = "staff-password-1";
        let user = self
            .state
            .users
            .create(
                &self.owner(),
                CreateUserRequest {
                    email: email.clone(),
                    password: password.into(),
                    first_name: "Sam".into(),
                    last_name: role.as_str().into(),
                    role,
                },
            )
            .await
            .expect("create staff member");
        let credentials = LoginCredentials::try_from_parts(&email, password).expect("credentials");
        let token = self
            .state
            .auth
            .login(&credentials)
            .await
            .expect("staff login")
            .token;
        (user.id, token)
    }

    /// Create a customer through the service layer.
    pub async fn customer(&self) -> Customer {
        self.state
            .customers
            .create(
                &self.owner(),
                CreateCustomerRequest {
                    first_name: "Jane".into(),
                    last_name: "Doe".into(),
                    email: Some("jane@example.com".into()),
                    phone: "+1 555 010 2030".into(),
                    address: None,
                },
            )
            .await
            .expect("create customer")
    }

    /// Create a customer with one vehicle at 42,000 miles.
    ///
    /// Each call registers a distinct plate and VIN, so one shop can hold
    /// several fixture vehicles.
    pub async fn vehicle(&self) -> (Customer, Vehicle) {
        let customer = self.customer().await;
        let n = self.vehicles_created.fetch_add(1, Ordering::Relaxed);
        let vehicle = self
            .state
            .vehicles
            .create(
                &self.owner(),
                CreateVehicleRequest {
                    customer_id: customer.id,
                    make: "Toyota".into(),
                    model: "Corolla".into(),
                    year: 2019,
                    vin: Some(format!("1HGCM82633A{n:06}")),
                    license_plate: format!("ABC{n:03}"),
                    color: None,
                    mileage: 42_000,
                    engine: None,
                    transmission: None,
                    fuel_type: None,
                },
            )
            .await
            .expect("create vehicle");
        (customer, vehicle)
    }

    /// A completed work order with one $120.00 labour line, ready to invoice.
    pub async fn completed_order(&self) -> WorkOrder {
        let owner = self.owner();
        let (customer, vehicle) = self.vehicle().await;
        let orders = &self.state.work_orders;
        let order = orders
            .create(
                &owner,
                CreateWorkOrderRequest {
                    customer_id: customer.id,
                    vehicle_id: vehicle.id,
                    assigned_to: None,
                    priority: None,
                    description: "Replace front brake pads".into(),
                    mileage_in: Some(42_000),
                    estimated_completion: None,
                },
            )
            .await
            .expect("create work order");
        orders
            .add_service(
                &owner,
                order.id,
                AddServiceLineRequest {
                    description: "Brake pad replacement".into(),
                    labor_hundredths: 150,
                    rate_cents: Some(8_000),
                },
            )
            .await
            .expect("add service line");
        for key in WorkflowStepKey::ALL.iter().filter(|key| key.is_required()) {
            orders
                .apply_step(
                    &owner,
                    order.id,
                    *key,
                    WorkflowActionRequest {
                        action: StepAction::Complete,
                    },
                )
                .await
                .expect("complete workflow step");
        }
        orders
            .change_status(
                &owner,
                order.id,
                ChangeStatusRequest {
                    status: WorkOrderStatus::Completed,
                    reason: None,
                },
            )
            .await
            .expect("complete work order")
    }

    /// Actix application exposing the full API.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api))
    }
}

/// Send a built request and decode the JSON body (`Value::Null` when empty).
pub async fn send<S, R>(service: &S, req: R) -> (StatusCode, Value)
where
    S: actix_web::dev::Service<R, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(service, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON response body")
    };
    (status, value)
}
