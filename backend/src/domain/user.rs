//! Staff user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{self, FieldError};
use super::{Role, TenantId, UserId};

/// Staff member of a tenant.
///
/// ## Invariants
/// - `email` is lower-cased and unique across all tenants.
/// - `password_hash` never leaves the domain; see [`UserView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated profile fields for a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    /// Validate raw profile inputs.
    pub fn parse(email: &str, first_name: &str, last_name: &str) -> Result<Self, FieldError> {
        Ok(Self {
            email: validation::email("email", email)?,
            first_name: validation::text("firstName", first_name, 1, 50)?,
            last_name: validation::text("lastName", last_name, 1, 50)?,
        })
    }
}

impl User {
    /// Build an active user from a validated profile and a password hash.
    pub fn new(
        tenant_id: TenantId,
        profile: UserProfile,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::random(),
            tenant_id,
            email: profile.email,
            password_hash,
            first_name: profile.first_name,
            last_name: profile.last_name,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `first last` display form.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub tenant_id: TenantId,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_normalises_email_and_names() {
        let profile = UserProfile::parse(" Ada@Shop.IO ", " Ada ", "Lovelace").expect("valid");
        assert_eq!(profile.email, "ada@shop.io");
        assert_eq!(profile.first_name, "Ada");
    }

    #[test]
    fn view_omits_password_hash() {
        let user = User::new(
            TenantId::random(),
            UserProfile::parse("ada@shop.io", "Ada", "Lovelace").expect("valid"),
            "$2b$04$hash".into(),
            Role::Admin,
            Utc::now(),
        );
        let json = serde_json::to_value(UserView::from(&user)).expect("serialise");
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
