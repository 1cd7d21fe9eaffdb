//! Tests for tenant registration, plans and limit enforcement.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::test_doubles::RepositoryMocks;
use crate::domain::ports::{CredentialError, MockPasswordHasher, MockTokenService};
use crate::domain::service_test_helpers::{clock, mocks_with_tenant, now, principal, tenant};
use crate::domain::{AccessToken, ErrorCode, SubscriptionStatus};

fn guard(mocks: RepositoryMocks) -> UsageGuard {
    UsageGuard::new(mocks.build(), clock())
}

fn service(mocks: RepositoryMocks) -> TenantService {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|password| Ok(format!("hashed:{password}")));
    let mut tokens = MockTokenService::new();
    tokens.expect_issue().returning(|_, issued_at| {
        Ok(AccessToken {
            token: "signed".into(),
            expires_at: issued_at + chrono::Duration::hours(12),
        })
    });
    TenantService::new(mocks.build(), Arc::new(hasher), Arc::new(tokens), clock())
}

fn registration() -> RegisterTenantRequest {
    RegisterTenantRequest {
        name: "Joe's Garage".into(),
        slug: "joes-garage".into(),
        owner: OwnerAccount {
            email: "Owner@Joes.example".into(),
            password: "correct horse".into(),
            first_name: "Joe".into(),
            last_name: "Bloggs".into(),
        },
    }
}

#[rstest]
#[case(1, true)]
#[case(2, false)]
#[tokio::test]
async fn user_limit_rejects_at_the_boundary(#[case] active_users: u64, #[case] allowed: bool) {
    let shop = tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing);
    let mut mocks = mocks_with_tenant(&shop);
    mocks
        .users
        .expect_count_active()
        .return_once(move |_| Ok(active_users));

    let result = guard(mocks)
        .ensure_capacity(shop.id, LimitedResource::Users)
        .await;

    if allowed {
        result.expect("below the limit");
    } else {
        let err = result.expect_err("at the limit");
        assert_eq!(err.code(), ErrorCode::LimitExceeded);
        let details = err.details().expect("details");
        assert_eq!(details["resource"], "users");
        assert_eq!(details["limit"], 2);
        assert_eq!(details["used"], 2);
    }
}

#[tokio::test]
async fn work_orders_count_the_current_month_only() {
    let shop = tenant(SubscriptionPlan::Basic, SubscriptionStatus::Active);
    let mut mocks = mocks_with_tenant(&shop);
    mocks
        .work_orders
        .expect_count_created_between()
        .withf(|_, from, to| {
            from.to_rfc3339() == "2024-05-01T00:00:00+00:00"
                && to.to_rfc3339() == "2024-06-01T00:00:00+00:00"
        })
        .return_once(|_, _, _| Ok(199));

    guard(mocks)
        .ensure_capacity(shop.id, LimitedResource::WorkOrders)
        .await
        .expect("199 of 200 used");
}

#[tokio::test]
async fn enterprise_skips_counting() {
    let shop = tenant(SubscriptionPlan::Enterprise, SubscriptionStatus::Active);
    let mocks = mocks_with_tenant(&shop);

    guard(mocks)
        .ensure_capacity(shop.id, LimitedResource::Customers)
        .await
        .expect("unlimited");
}

#[rstest]
#[case(SubscriptionStatus::Suspended)]
#[case(SubscriptionStatus::Cancelled)]
#[tokio::test]
async fn inactive_subscriptions_cannot_create(#[case] status: SubscriptionStatus) {
    let shop = tenant(SubscriptionPlan::Enterprise, status);
    let mocks = mocks_with_tenant(&shop);

    let err = guard(mocks)
        .ensure_capacity(shop.id, LimitedResource::Vehicles)
        .await
        .expect_err("read-only tenant");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn register_creates_tenant_and_owner() {
    let mut mocks = RepositoryMocks::default();
    mocks.tenants.expect_find_by_slug().return_once(|_| Ok(None));
    mocks.users.expect_find_by_email().return_once(|_| Ok(None));
    mocks.tenants.expect_insert().times(1).return_once(|_| Ok(()));
    mocks
        .users
        .expect_insert()
        .withf(|user| user.role == Role::Owner && user.password_hash == "hashed:correct horse")
        .times(1)
        .return_once(|_| Ok(()));

    let registration = service(mocks)
        .register(registration())
        .await
        .expect("registration succeeds");

    assert_eq!(registration.tenant.plan, SubscriptionPlan::Trial);
    assert_eq!(registration.user.email, "owner@joes.example");
    assert_eq!(registration.token, "signed");
}

#[tokio::test]
async fn register_rejects_taken_slug() {
    let existing = tenant(SubscriptionPlan::Basic, SubscriptionStatus::Active);
    let mut mocks = RepositoryMocks::default();
    mocks
        .tenants
        .expect_find_by_slug()
        .return_once(move |_| Ok(Some(existing)));

    let err = service(mocks)
        .register(registration())
        .await
        .expect_err("slug taken");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.details().expect("details")["field"], "slug");
}

#[tokio::test]
async fn register_rejects_short_password() {
    let mut request = registration();
    request.owner.password = "short".into();

    let err = service(RepositoryMocks::default())
        .register(request)
        .await
        .expect_err("weak password");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn register_surfaces_hashing_failures() {
    let mut mocks = RepositoryMocks::default();
    mocks.tenants.expect_find_by_slug().return_once(|_| Ok(None));
    mocks.users.expect_find_by_email().return_once(|_| Ok(None));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Err(CredentialError::hash("cost out of range")));
    let service = TenantService::new(
        mocks.build(),
        Arc::new(hasher),
        Arc::new(MockTokenService::new()),
        clock(),
    );

    let err = service.register(registration()).await.expect_err("hash fails");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[rstest]
#[case(Role::Admin)]
#[case(Role::Manager)]
#[tokio::test]
async fn only_owners_manage_the_tenant(#[case] role: Role) {
    let shop = tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing);
    let caller = principal(shop.id, role);

    let err = service(mocks_with_tenant(&shop))
        .update_settings(&caller, TenantSettingsPatch::default())
        .await
        .expect_err("not an owner");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn update_settings_persists_the_patch() {
    let shop = tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing);
    let caller = principal(shop.id, Role::Owner);
    let mut mocks = mocks_with_tenant(&shop);
    mocks
        .tenants
        .expect_update()
        .withf(|t| t.settings.invoice_due_days == 14 && t.updated_at == now())
        .times(1)
        .return_once(|_| Ok(()));

    let updated = service(mocks)
        .update_settings(
            &caller,
            TenantSettingsPatch {
                invoice_due_days: Some(14),
                ..TenantSettingsPatch::default()
            },
        )
        .await
        .expect("settings updated");
    assert_eq!(updated.settings.invoice_due_days, 14);
}

fn usage_mocks(shop: &Tenant, customers: u64) -> RepositoryMocks {
    let mut mocks = mocks_with_tenant(shop);
    mocks.users.expect_count_active().returning(|_| Ok(1));
    mocks
        .customers
        .expect_count_active()
        .returning(move |_| Ok(customers));
    mocks.vehicles.expect_count_active().returning(|_| Ok(0));
    mocks
        .work_orders
        .expect_count_created_between()
        .returning(|_, _, _| Ok(0));
    mocks.inventory.expect_count_active().returning(|_| Ok(0));
    mocks
}

#[tokio::test]
async fn downgrade_is_refused_when_usage_exceeds_new_limits() {
    let shop = tenant(SubscriptionPlan::Professional, SubscriptionStatus::Active);
    let caller = principal(shop.id, Role::Owner);

    let err = service(usage_mocks(&shop, 300))
        .change_plan(&caller, ChangePlanRequest { plan: SubscriptionPlan::Basic })
        .await
        .expect_err("too many customers for basic");
    assert_eq!(err.code(), ErrorCode::Conflict);
    let resources = &err.details().expect("details")["resources"];
    assert_eq!(resources[0]["resource"], "customers");
    assert_eq!(resources.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn upgrade_to_paid_plan_activates_subscription() {
    let shop = tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing);
    let caller = principal(shop.id, Role::Owner);
    let mut mocks = usage_mocks(&shop, 10);
    mocks.tenants.expect_update().times(1).return_once(|_| Ok(()));

    let updated = service(mocks)
        .change_plan(&caller, ChangePlanRequest { plan: SubscriptionPlan::Basic })
        .await
        .expect("upgrade");
    assert_eq!(updated.plan, SubscriptionPlan::Basic);
    assert_eq!(updated.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn usage_reports_every_resource() {
    let shop = tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing);
    let caller = principal(shop.id, Role::Technician);

    let report = service(usage_mocks(&shop, 7))
        .usage(&caller)
        .await
        .expect("usage");
    assert_eq!(report.items.len(), LimitedResource::ALL.len());
    let customers = report
        .items
        .iter()
        .find(|item| item.resource == LimitedResource::Customers)
        .expect("customers item");
    assert_eq!((customers.used, customers.limit), (7, Some(25)));
    assert_eq!(report.period_start.to_rfc3339(), "2024-05-01T00:00:00+00:00");
}
