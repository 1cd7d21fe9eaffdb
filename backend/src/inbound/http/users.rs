//! Staff account handlers. Every route requires `users:manage`.
//!
//! ```text
//! GET    /api/v1/users?page=1&limit=20
//! POST   /api/v1/users {"email":"...","password":"...","role":"technician",...}
//! PATCH  /api/v1/users/{id} {"role":"manager"}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::Page;

use crate::domain::{CreateUserRequest, Error, UpdateUserRequest, UserId, UserView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{PageQuery, page_request};

/// List the tenant's staff, oldest account first.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users", body = PageSchema<UserView>),
        (status = 400, description = "Invalid page parameters", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<UserView>>> {
    let page = page_request(query.page, query.limit)?;
    Ok(web::Json(state.users.list(&principal, page).await?))
}

/// Invite a staff member. The owner role cannot be granted.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 400, description = "Invalid request", body = Error),
        (status = 402, description = "Plan user limit reached", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "E-mail already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let user = state.users.create(&principal, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Rename a staff member or change their role.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = UserId, Path, description = "User identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "No such user in this tenant", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<UserId>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserView>> {
    let user = state
        .users
        .update(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(user))
}

/// Deactivate a staff member; their tokens stop working immediately.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = UserId, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "No such user in this tenant", body = Error)
    ),
    tags = ["users"],
    operation_id = "deactivateUser"
)]
#[delete("/users/{id}")]
pub async fn deactivate_user(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    state.users.deactivate(&principal, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
