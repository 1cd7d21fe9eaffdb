//! Login, bearer-token authentication and password changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::ports::{PasswordHasher, Repositories, TokenService};
use super::validation;
use super::{Error, LoginCredentials, Principal, User, UserView, lookup};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}

/// Request body for `POST /auth/password`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[schema(value_type = String)]
    pub current_password: Zeroizing<String>,
    #[schema(value_type = String)]
    pub new_password: Zeroizing<String>,
}

/// Authentication operations.
#[derive(Clone)]
pub struct AuthService {
    repos: Repositories,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create the service.
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            hasher,
            tokens,
            clock,
        }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Every failure reads `invalid credentials` so callers cannot learn
    /// which accounts exist.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, Error> {
        let Some(mut user) = self.repos.users.find_by_email(credentials.email()).await? else {
            debug!("login for unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !user.is_active || !self.hasher.verify(credentials.password(), &user.password_hash)? {
            debug!(user_id = %user.id, "login rejected");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        let tenant_active = self
            .repos
            .tenants
            .find_by_id(user.tenant_id)
            .await?
            .is_some_and(|tenant| tenant.is_active);
        if !tenant_active {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let now = self.clock.utc();
        user.last_login_at = Some(now);
        self.repos.users.update(&user).await?;
        let token = self.tokens.issue(&principal_of(&user), now)?;
        info!(user_id = %user.id, tenant_id = %user.tenant_id, "user logged in");
        Ok(LoginResponse {
            token: token.token,
            expires_at: token.expires_at,
            user: UserView::from(&user),
        })
    }

    /// Resolve a bearer token to a principal.
    ///
    /// The user must still be active in the token's tenant; the role is read
    /// from the stored user so demotions apply immediately.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, Error> {
        let claimed = self.tokens.verify(token)?;
        let user = self
            .repos
            .users
            .find_by_id(claimed.user_id)
            .await?
            .filter(|user| user.is_active && user.tenant_id == claimed.tenant_id)
            .ok_or_else(|| Error::unauthorized("user is no longer active"))?;
        let tenant_active = self
            .repos
            .tenants
            .find_by_id(user.tenant_id)
            .await?
            .is_some_and(|tenant| tenant.is_active);
        if !tenant_active {
            return Err(Error::unauthorized("tenant is no longer active"));
        }
        Ok(principal_of(&user))
    }

    /// The caller's own account.
    pub async fn me(&self, principal: &Principal) -> Result<UserView, Error> {
        let user = lookup::user(&self.repos, principal.tenant_id, principal.user_id).await?;
        Ok(UserView::from(&user))
    }

    /// Replace the caller's password after checking the current one.
    pub async fn change_password(
        &self,
        principal: &Principal,
        request: &ChangePasswordRequest,
    ) -> Result<(), Error> {
        validation::password("newPassword", &request.new_password)?;
        let mut user = lookup::user(&self.repos, principal.tenant_id, principal.user_id).await?;
        if !self
            .hasher
            .verify(&request.current_password, &user.password_hash)?
        {
            return Err(Error::invalid_request("current password is incorrect").with_details(
                json!({ "field": "currentPassword", "code": "incorrect_password" }),
            ));
        }
        user.password_hash = self.hasher.hash(&request.new_password)?;
        user.updated_at = self.clock.utc();
        self.repos.users.update(&user).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }
}

fn principal_of(user: &User) -> Principal {
    Principal {
        user_id: user.id,
        tenant_id: user.tenant_id,
        role: user.role,
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
