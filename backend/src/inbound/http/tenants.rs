//! Tenant handlers: the caller's shop, its settings, plan and usage.
//!
//! ```text
//! GET   /api/v1/tenant
//! PATCH /api/v1/tenant/settings {"taxRateBps":825}
//! PUT   /api/v1/tenant/plan {"plan":"professional"}
//! GET   /api/v1/tenant/usage
//! ```

use actix_web::{get, patch, put, web};

use crate::domain::{ChangePlanRequest, Error, Tenant, TenantSettingsPatch, UsageReport};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;

/// The caller's tenant.
#[utoipa::path(
    get,
    path = "/api/v1/tenant",
    responses(
        (status = 200, description = "Current tenant", body = Tenant),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tenant"],
    operation_id = "currentTenant"
)]
#[get("/tenant")]
pub async fn current_tenant(
    state: web::Data<HttpState>,
    principal: Authenticated,
) -> ApiResult<web::Json<Tenant>> {
    Ok(web::Json(state.tenants.current(&principal).await?))
}

/// Merge a partial settings document into the tenant's settings.
#[utoipa::path(
    patch,
    path = "/api/v1/tenant/settings",
    request_body = TenantSettingsPatch,
    responses(
        (status = 200, description = "Updated tenant", body = Tenant),
        (status = 400, description = "Invalid settings", body = Error),
        (status = 403, description = "Only owners manage the tenant", body = Error)
    ),
    tags = ["tenant"],
    operation_id = "updateTenantSettings"
)]
#[patch("/tenant/settings")]
pub async fn update_settings(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<TenantSettingsPatch>,
) -> ApiResult<web::Json<Tenant>> {
    let tenant = state
        .tenants
        .update_settings(&principal, payload.into_inner())
        .await?;
    Ok(web::Json(tenant))
}

/// Move the tenant to another subscription plan.
#[utoipa::path(
    put,
    path = "/api/v1/tenant/plan",
    request_body = ChangePlanRequest,
    responses(
        (status = 200, description = "Updated tenant", body = Tenant),
        (status = 403, description = "Only owners manage the tenant", body = Error),
        (status = 409, description = "Current usage exceeds the target plan", body = Error)
    ),
    tags = ["tenant"],
    operation_id = "changePlan"
)]
#[put("/tenant/plan")]
pub async fn change_plan(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<ChangePlanRequest>,
) -> ApiResult<web::Json<Tenant>> {
    let tenant = state
        .tenants
        .change_plan(&principal, payload.into_inner())
        .await?;
    Ok(web::Json(tenant))
}

/// Usage of every plan-limited resource against the plan's caps.
#[utoipa::path(
    get,
    path = "/api/v1/tenant/usage",
    responses(
        (status = 200, description = "Usage report", body = UsageReport),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tenant"],
    operation_id = "tenantUsage"
)]
#[get("/tenant/usage")]
pub async fn usage(
    state: web::Data<HttpState>,
    principal: Authenticated,
) -> ApiResult<web::Json<UsageReport>> {
    Ok(web::Json(state.tenants.usage(&principal).await?))
}
