//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates, so they wire the public
//! API themselves: real services over the in-memory store, bcrypt at its
//! minimum cost and a temporary upload directory.

#![allow(dead_code, reason = "each integration test crate uses a subset of these helpers")]

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::{App, test, web};
use chrono::Duration;
use garage_backend::Trace;
use garage_backend::domain::WebhookVerifier;
use garage_backend::inbound::http::health::{HealthState, live, ready};
use garage_backend::inbound::http::routes::configure_api;
use garage_backend::inbound::http::state::{HttpState, HttpStatePorts};
use garage_backend::outbound::files::LocalFileStore;
use garage_backend::outbound::memory::MemoryStore;
use garage_backend::outbound::security::{BcryptPasswordHasher, JwtTokenService};
use mockable::DefaultClock;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Webhook secret configured for every test server.
pub const WEBHOOK_SECRET: &str = "whsec-integration";

/// Application state plus the upload directory it writes into.
pub struct Harness {
    pub state: web::Data<HttpState>,
    pub health: web::Data<HealthState>,
    _uploads: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("temporary upload dir");
        let state = HttpState::new(HttpStatePorts {
            repositories: MemoryStore::new().repositories(),
            hasher: Arc::new(BcryptPasswordHasher::with_cost(4)),
            tokens: Arc::new(JwtTokenService::new(
                b"integration-secret",
                Duration::hours(1),
            )),
            files: Arc::new(LocalFileStore::new(uploads.path())),
            webhooks: WebhookVerifier::new(Some(WEBHOOK_SECRET)),
            clock: Arc::new(DefaultClock),
        });
        Self {
            state: web::Data::new(state),
            health: web::Data::new(HealthState::new()),
            _uploads: uploads,
        }
    }

    /// The application as the server mounts it.
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
            .app_data(self.health.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api))
            .service(ready)
            .service(live)
    }
}

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Call `req` and decode the JSON body (`Value::Null` when empty).
pub async fn send<S, R>(service: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse, Error = actix_web::Error>,
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

/// Register a shop through the API and return the owner's bearer token.
pub async fn register_shop<S>(service: &S, slug: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = send(
        service,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "name": format!("Shop {slug}"),
                "slug": slug,
                "owner": {
                    "email": format!("owner@{slug}.example"),
                    "password": "correct horse battery",
                    "firstName": "Olive",
                    "lastName": "Owner"
                }
            }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().expect("token").to_owned()
}

/// POST `body` to `uri` as the bearer of `token`.
pub async fn post_json<S>(service: &S, token: &str, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(
        service,
        test::TestRequest::post()
            .uri(uri)
            .insert_header(bearer(token))
            .set_json(body)
            .to_request(),
    )
    .await
}

/// GET `uri` as the bearer of `token`.
pub async fn get_json<S>(service: &S, token: &str, uri: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(
        service,
        test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(token))
            .to_request(),
    )
    .await
}
