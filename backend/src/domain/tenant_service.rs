//! Tenant registration, settings, plans and usage limits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::ports::{PasswordHasher, Repositories, TokenService};
use super::tenant::{month_start, next_month_start};
use super::validation;
use super::{
    Error, LimitedResource, Permission, Principal, Role, SubscriptionPlan, Tenant, TenantId,
    TenantSettingsPatch, UsageItem, UsageReport, User, UserProfile, UserView, lookup,
};

/// Enforces subscription limits before records are created.
#[derive(Clone)]
pub struct UsageGuard {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl UsageGuard {
    /// Create a guard over the given repositories.
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    async fn used(
        &self,
        tenant_id: TenantId,
        resource: LimitedResource,
        now: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let used = match resource {
            LimitedResource::Users => self.repos.users.count_active(tenant_id).await?,
            LimitedResource::Customers => self.repos.customers.count_active(tenant_id).await?,
            LimitedResource::Vehicles => self.repos.vehicles.count_active(tenant_id).await?,
            LimitedResource::WorkOrders => {
                self.repos
                    .work_orders
                    .count_created_between(tenant_id, month_start(now), next_month_start(now))
                    .await?
            }
            LimitedResource::InventoryItems => self.repos.inventory.count_active(tenant_id).await?,
        };
        Ok(used)
    }

    /// Fail unless the tenant may create one more `resource`.
    ///
    /// Suspended and cancelled tenants are refused with `forbidden`; a full
    /// plan yields `limit_exceeded` with `{resource, limit, used}`.
    pub async fn ensure_capacity(
        &self,
        tenant_id: TenantId,
        resource: LimitedResource,
    ) -> Result<(), Error> {
        let tenant = lookup::tenant(&self.repos, tenant_id).await?;
        if !tenant.subscription_status.allows_writes() {
            return Err(Error::forbidden(format!(
                "subscription is {}; creating records is disabled",
                tenant.subscription_status
            ))
            .with_details(json!({ "subscriptionStatus": tenant.subscription_status.as_str() })));
        }
        let Some(limit) = tenant.plan.limits().limit_for(resource) else {
            return Ok(());
        };
        let used = self.used(tenant_id, resource, self.clock.utc()).await?;
        if used >= limit {
            return Err(Error::limit_exceeded(format!(
                "the {} plan allows {limit} {resource}",
                tenant.plan
            ))
            .with_details(json!({
                "resource": resource.as_str(),
                "limit": limit,
                "used": used,
            })));
        }
        Ok(())
    }

    /// Usage of every limited resource against the tenant's plan.
    pub async fn usage(&self, tenant: &Tenant) -> Result<UsageReport, Error> {
        self.usage_for_plan(tenant.id, tenant.plan).await
    }

    async fn usage_for_plan(
        &self,
        tenant_id: TenantId,
        plan: SubscriptionPlan,
    ) -> Result<UsageReport, Error> {
        let now = self.clock.utc();
        let limits = plan.limits();
        let mut items = Vec::with_capacity(LimitedResource::ALL.len());
        for resource in LimitedResource::ALL.iter().copied() {
            items.push(UsageItem {
                resource,
                used: self.used(tenant_id, resource, now).await?,
                limit: limits.limit_for(resource),
            });
        }
        Ok(UsageReport {
            plan,
            period_start: month_start(now),
            items,
        })
    }
}

/// Account owner supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerAccount {
    #[schema(example = "owner@joes-garage.example")]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request body for `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTenantRequest {
    #[schema(example = "Joe's Garage")]
    pub name: String,
    #[schema(example = "joes-garage")]
    pub slug: String,
    pub owner: OwnerAccount,
}

/// A freshly registered tenant with its signed-in owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
    pub tenant: Tenant,
}

/// Request body for `PUT /tenant/plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePlanRequest {
    pub plan: SubscriptionPlan,
}

/// Tenant lifecycle operations.
#[derive(Clone)]
pub struct TenantService {
    repos: Repositories,
    usage: UsageGuard,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

impl TenantService {
    /// Create the service.
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            usage: UsageGuard::new(repos.clone(), clock.clone()),
            repos,
            hasher,
            tokens,
            clock,
        }
    }

    /// Create a trial tenant and its owner, returning a signed-in session.
    pub async fn register(&self, request: RegisterTenantRequest) -> Result<Registration, Error> {
        let now = self.clock.utc();
        let tenant = Tenant::register(&request.name, &request.slug, now)?;
        let profile = UserProfile::parse(
            &request.owner.email,
            &request.owner.first_name,
            &request.owner.last_name,
        )?;
        validation::password("owner.password", &request.owner.password)?;

        if self.repos.tenants.find_by_slug(&tenant.slug).await?.is_some() {
            return Err(Error::conflict(format!("slug {} is taken", tenant.slug))
                .with_details(json!({ "field": "slug", "code": "duplicate" })));
        }
        if self.repos.users.find_by_email(&profile.email).await?.is_some() {
            return Err(Error::conflict("email is already registered")
                .with_details(json!({ "field": "email", "code": "duplicate" })));
        }

        let hash = self.hasher.hash(&request.owner.password)?;
        let owner = User::new(tenant.id, profile, hash, Role::Owner, now);
        self.repos.tenants.insert(&tenant).await?;
        self.repos.users.insert(&owner).await?;

        let principal = Principal {
            user_id: owner.id,
            tenant_id: tenant.id,
            role: owner.role,
        };
        let token = self.tokens.issue(&principal, now)?;
        info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant registered");
        Ok(Registration {
            token: token.token,
            expires_at: token.expires_at,
            user: UserView::from(&owner),
            tenant,
        })
    }

    /// The caller's tenant.
    pub async fn current(&self, principal: &Principal) -> Result<Tenant, Error> {
        lookup::tenant(&self.repos, principal.tenant_id).await
    }

    /// Patch shop settings.
    pub async fn update_settings(
        &self,
        principal: &Principal,
        patch: TenantSettingsPatch,
    ) -> Result<Tenant, Error> {
        principal.require(Permission::TenantManage)?;
        let mut tenant = self.current(principal).await?;
        tenant.settings = tenant.settings.apply(patch)?;
        tenant.updated_at = self.clock.utc();
        self.repos.tenants.update(&tenant).await?;
        Ok(tenant)
    }

    /// Move the tenant to another plan.
    ///
    /// A plan whose limits are below current usage is refused, listing the
    /// offending resources. Paid plans activate the subscription.
    pub async fn change_plan(
        &self,
        principal: &Principal,
        request: ChangePlanRequest,
    ) -> Result<Tenant, Error> {
        principal.require(Permission::TenantManage)?;
        let mut tenant = self.current(principal).await?;
        let report = self.usage.usage_for_plan(tenant.id, request.plan).await?;
        let offending: Vec<&UsageItem> = report
            .items
            .iter()
            .filter(|item| item.limit.is_some_and(|limit| item.used > limit))
            .collect();
        if !offending.is_empty() {
            return Err(Error::conflict(format!(
                "current usage exceeds the {} plan",
                request.plan
            ))
            .with_details(json!({ "plan": request.plan.as_str(), "resources": offending })));
        }

        tenant.plan = request.plan;
        if request.plan.is_paid() {
            tenant.subscription_status = super::SubscriptionStatus::Active;
        }
        tenant.updated_at = self.clock.utc();
        self.repos.tenants.update(&tenant).await?;
        info!(tenant_id = %tenant.id, plan = %tenant.plan, "tenant plan changed");
        Ok(tenant)
    }

    /// Usage of the caller's tenant for the current month.
    pub async fn usage(&self, principal: &Principal) -> Result<UsageReport, Error> {
        let tenant = self.current(principal).await?;
        self.usage.usage(&tenant).await
    }

    /// The limit guard shared with the other services.
    pub fn usage_guard(&self) -> &UsageGuard {
        &self.usage
    }
}

#[cfg(test)]
#[path = "tenant_service_tests.rs"]
mod tests;
