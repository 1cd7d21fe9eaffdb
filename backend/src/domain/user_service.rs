//! Staff account management inside a tenant.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::ports::{PasswordHasher, Repositories};
use super::tenant_service::UsageGuard;
use super::validation;
use super::{
    Error, LimitedResource, Permission, Principal, Role, User, UserId, UserProfile, UserView,
    lookup,
};

/// Request body for `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "tech@joes-garage.example")]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Request body for `PATCH /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

fn owner_role_forbidden() -> Error {
    Error::forbidden("the owner role cannot be granted").with_details(json!({ "role": "owner" }))
}

/// User administration operations. All require `users:manage`.
#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
    usage: UsageGuard,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create the service.
    pub fn new(
        repos: Repositories,
        usage: UsageGuard,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            usage,
            hasher,
            clock,
        }
    }

    /// Active and inactive users of the caller's tenant.
    pub async fn list(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> Result<Page<UserView>, Error> {
        principal.require(Permission::UsersManage)?;
        let users = self.repos.users.list(principal.tenant_id, page).await?;
        Ok(users.map(|user| UserView::from(&user)))
    }

    /// Add a staff member.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateUserRequest,
    ) -> Result<UserView, Error> {
        principal.require(Permission::UsersManage)?;
        if request.role == Role::Owner {
            return Err(owner_role_forbidden());
        }
        let profile = UserProfile::parse(&request.email, &request.first_name, &request.last_name)?;
        validation::password("password", &request.password)?;
        self.usage
            .ensure_capacity(principal.tenant_id, LimitedResource::Users)
            .await?;
        if self.repos.users.find_by_email(&profile.email).await?.is_some() {
            return Err(Error::conflict("email is already registered")
                .with_details(json!({ "field": "email", "code": "duplicate" })));
        }

        let hash = self.hasher.hash(&request.password)?;
        let user = User::new(
            principal.tenant_id,
            profile,
            hash,
            request.role,
            self.clock.utc(),
        );
        self.repos.users.insert(&user).await?;
        info!(tenant_id = %user.tenant_id, user_id = %user.id, role = %user.role, "user created");
        Ok(UserView::from(&user))
    }

    async fn managed_target(&self, principal: &Principal, id: UserId) -> Result<User, Error> {
        principal.require(Permission::UsersManage)?;
        if id == principal.user_id {
            return Err(Error::forbidden("you cannot change your own account here"));
        }
        let user = lookup::user(&self.repos, principal.tenant_id, id).await?;
        if user.role == Role::Owner {
            return Err(Error::forbidden("the owner account cannot be changed"));
        }
        Ok(user)
    }

    /// Rename a user or change their role.
    pub async fn update(
        &self,
        principal: &Principal,
        id: UserId,
        patch: UpdateUserRequest,
    ) -> Result<UserView, Error> {
        let mut user = self.managed_target(principal, id).await?;
        if patch.role == Some(Role::Owner) {
            return Err(owner_role_forbidden());
        }
        if let Some(first) = patch.first_name {
            user.first_name = validation::text("firstName", &first, 1, 50)?;
        }
        if let Some(last) = patch.last_name {
            user.last_name = validation::text("lastName", &last, 1, 50)?;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = self.clock.utc();
        self.repos.users.update(&user).await?;
        Ok(UserView::from(&user))
    }

    /// Disable a user's access. Their records stay attributed to them.
    pub async fn deactivate(&self, principal: &Principal, id: UserId) -> Result<(), Error> {
        let mut user = self.managed_target(principal, id).await?;
        user.is_active = false;
        user.updated_at = self.clock.utc();
        self.repos.users.update(&user).await?;
        info!(tenant_id = %user.tenant_id, user_id = %user.id, "user deactivated");
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
