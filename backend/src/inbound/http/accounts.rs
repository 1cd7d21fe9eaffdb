//! Account handlers: tenant registration, login and the caller's profile.
//!
//! ```text
//! POST /api/v1/auth/register {"name":"Joe's Garage","slug":"joes-garage","owner":{...}}
//! POST /api/v1/auth/login {"email":"owner@joes-garage.example","password":"..."}
//! GET  /api/v1/auth/me
//! POST /api/v1/auth/password
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::{
    ChangePasswordRequest, Error, LoginCredentials, LoginResponse, RegisterTenantRequest,
    Registration, UserView,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/auth/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "owner@joes-garage.example")]
    pub email: String,
    #[schema(value_type = String)]
    pub password: Zeroizing<String>,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Ok(Self::try_from_parts(&value.email, &value.password)?)
    }
}

/// Register a shop on the trial plan and sign its owner in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterTenantRequest,
    responses(
        (status = 201, description = "Tenant registered", body = Registration),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Slug or e-mail already taken", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterTenantRequest>,
) -> ApiResult<HttpResponse> {
    let registration = state.tenants.register(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(registration))
}

/// Exchange e-mail and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())?;
    let response = state.auth.login(&credentials).await?;
    Ok(web::Json(response))
}

/// The signed-in user's own account.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserView),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    principal: Authenticated,
) -> ApiResult<web::Json<UserView>> {
    Ok(web::Json(state.auth.me(&principal).await?))
}

/// Change the caller's password after re-checking the current one.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password rejected", body = Error),
        (status = 401, description = "Current password is wrong", body = Error)
    ),
    tags = ["auth"],
    operation_id = "changePassword"
)]
#[post("/auth/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    state.auth.change_password(&principal, &payload).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestApp, bearer};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn register_returns_token_and_trial_tenant() {
        let app = TestApp::new();
        let service = test::init_service(app.app()).await;
        let res = test::call_service(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "name": "Brake Masters",
                    "slug": "brake-masters",
                    "owner": {
                        "email": "owner@brake.example",
                        "password": "correct horse battery",
                        "firstName": "Bea",
                        "lastName": "Stone"
                    }
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert!(body.get("token").and_then(Value::as_str).is_some());
        assert_eq!(body["tenant"]["plan"], "trial");
        assert_eq!(body["user"]["role"], "owner");
    }

    #[rstest]
    #[case(json!({"email": "not-an-email", "password": "x"}), StatusCode::BAD_REQUEST)]
    #[case(json!({"email": "owner@joes.example", "password": "wrong"}), StatusCode::UNAUTHORIZED)]
    #[case(json!({"email": "nobody@joes.example", "password": "wrong"}), StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn login_rejects_bad_credentials(#[case] body: Value, #[case] expected: StatusCode) {
        let app = TestApp::with_shop().await;
        let service = test::init_service(app.app()).await;
        let res = test::call_service(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn login_then_me_round_trips() {
        let app = TestApp::with_shop().await;
        let service = test::init_service(app.app()).await;
        let res = test::call_service(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({
                    "email": "owner@joes.example",
                    "password": TestApp::OWNER_PASSWORD,
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        let token = body["token"].as_str().expect("token").to_owned();

        let profile_res = test::call_service(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(profile_res.status(), StatusCode::OK);
        let profile: Value = test::read_body_json(profile_res).await;
        assert_eq!(profile["email"], "owner@joes.example");
        assert!(profile.get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn me_requires_a_token() {
        let app = TestApp::new();
        let service = test::init_service(app.app()).await;
        let res = test::call_service(
            &service,
            test::TestRequest::get().uri("/api/v1/auth/me").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "unauthorized");
    }
}
