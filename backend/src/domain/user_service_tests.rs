//! Tests for staff administration rules.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::MockPasswordHasher;
use crate::domain::ports::test_doubles::RepositoryMocks;
use crate::domain::service_test_helpers::{clock, mocks_with_tenant, now, principal, tenant};
use crate::domain::{ErrorCode, SubscriptionPlan, SubscriptionStatus, Tenant};

fn shop() -> Tenant {
    tenant(SubscriptionPlan::Basic, SubscriptionStatus::Active)
}

fn service(mocks: RepositoryMocks) -> UserService {
    let repos = mocks.build();
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|given| Ok(format!("hashed:{given}")));
    UserService::new(
        repos.clone(),
        UsageGuard::new(repos, clock()),
        Arc::new(hasher),
        clock(),
    )
}

fn member(shop: &Tenant, role: Role) -> User {
    User::new(
        shop.id,
        UserProfile::parse("tech@shop.io", "Tess", "Tech").expect("valid profile"),
        "hash".into(),
        role,
        now(),
    )
}

fn request(role: Role) -> CreateUserRequest {
    CreateUserRequest {
        email: "new@shop.io".into(),
        password: "long-enough".into(),
        first_name: "New".into(),
        last_name: "Hire".into(),
        role,
    }
}

#[tokio::test]
async fn admins_create_staff() {
    let shop = shop();
    let mut mocks = mocks_with_tenant(&shop);
    mocks.users.expect_count_active().return_once(|_| Ok(1));
    mocks.users.expect_find_by_email().return_once(|_| Ok(None));
    mocks
        .users
        .expect_insert()
        .withf(|u| u.role == Role::Technician && u.password_hash == "hashed:long-enough")
        .times(1)
        .return_once(|_| Ok(()));

    let view = service(mocks)
        .create(&principal(shop.id, Role::Admin), request(Role::Technician))
        .await
        .expect("user created");
    assert_eq!(view.email, "new@shop.io");
}

#[tokio::test]
async fn nobody_creates_owners() {
    let shop = shop();
    let err = service(RepositoryMocks::default())
        .create(&principal(shop.id, Role::Owner), request(Role::Owner))
        .await
        .expect_err("owner role");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(Role::Manager)]
#[case(Role::Technician)]
#[case(Role::Receptionist)]
#[tokio::test]
async fn managing_users_requires_permission(#[case] role: Role) {
    let shop = shop();
    let err = service(RepositoryMocks::default())
        .list(&principal(shop.id, role), PageRequest::default())
        .await
        .expect_err("missing users:manage");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.details().expect("details")["permission"], "users:manage");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let shop = shop();
    let existing = member(&shop, Role::Technician);
    let mut mocks = mocks_with_tenant(&shop);
    mocks.users.expect_count_active().return_once(|_| Ok(1));
    mocks
        .users
        .expect_find_by_email()
        .return_once(move |_| Ok(Some(existing)));

    let err = service(mocks)
        .create(&principal(shop.id, Role::Admin), request(Role::Technician))
        .await
        .expect_err("taken");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn owners_cannot_be_deactivated() {
    let shop = shop();
    let owner = member(&shop, Role::Owner);
    let owner_id = owner.id;
    let mut mocks = RepositoryMocks::default();
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(owner)));

    let err = service(mocks)
        .deactivate(&principal(shop.id, Role::Admin), owner_id)
        .await
        .expect_err("owner protected");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn callers_cannot_change_themselves() {
    let shop = shop();
    let caller = principal(shop.id, Role::Admin);

    let err = service(RepositoryMocks::default())
        .update(
            &caller,
            caller.user_id,
            UpdateUserRequest {
                role: Some(Role::Technician),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .expect_err("self change");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn promotion_to_owner_is_refused() {
    let shop = shop();
    let tech = member(&shop, Role::Technician);
    let tech_id = tech.id;
    let mut mocks = RepositoryMocks::default();
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(tech)));

    let err = service(mocks)
        .update(
            &principal(shop.id, Role::Owner),
            tech_id,
            UpdateUserRequest {
                role: Some(Role::Owner),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .expect_err("owner promotion");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn users_of_other_tenants_are_not_found() {
    let shop = shop();
    let foreign = member(&tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing), Role::Technician);
    let foreign_id = foreign.id;
    let mut mocks = RepositoryMocks::default();
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(foreign)));

    let err = service(mocks)
        .deactivate(&principal(shop.id, Role::Owner), foreign_id)
        .await
        .expect_err("foreign user");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn deactivate_marks_user_inactive() {
    let shop = shop();
    let tech = member(&shop, Role::Technician);
    let tech_id = tech.id;
    let mut mocks = RepositoryMocks::default();
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(tech)));
    mocks
        .users
        .expect_update()
        .withf(|u| !u.is_active)
        .times(1)
        .return_once(|_| Ok(()));

    service(mocks)
        .deactivate(&principal(shop.id, Role::Admin), tech_id)
        .await
        .expect("deactivated");
}
