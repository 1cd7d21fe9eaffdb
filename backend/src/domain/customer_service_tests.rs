//! Tests for customer operations.

use rstest::rstest;

use super::*;
use crate::domain::ports::RepositoryError;
use crate::domain::ports::test_doubles::RepositoryMocks;
use crate::domain::service_test_helpers::{clock, customer, mocks_with_tenant, principal, tenant};
use crate::domain::{ErrorCode, Role, SubscriptionPlan, SubscriptionStatus, Tenant};

fn shop() -> Tenant {
    tenant(SubscriptionPlan::Trial, SubscriptionStatus::Trialing)
}

fn service(mocks: RepositoryMocks) -> CustomerService {
    let repos = mocks.build();
    CustomerService::new(repos.clone(), UsageGuard::new(repos, clock()), clock())
}

fn request() -> CreateCustomerRequest {
    CreateCustomerRequest {
        first_name: "Sam".into(),
        last_name: "Carter".into(),
        email: None,
        phone: "555-0100".into(),
        address: None,
    }
}

fn with_customer(mut mocks: RepositoryMocks, stored: &Customer) -> RepositoryMocks {
    let stored = stored.clone();
    mocks
        .customers
        .expect_find()
        .returning(move |_, _| Ok(Some(stored.clone())));
    mocks
}

#[tokio::test]
async fn create_checks_capacity_then_inserts() {
    let shop = shop();
    let mut mocks = mocks_with_tenant(&shop);
    mocks.customers.expect_count_active().return_once(|_| Ok(24));
    mocks.customers.expect_insert().times(1).return_once(|_| Ok(()));

    let created = service(mocks)
        .create(&principal(shop.id, Role::Receptionist), request())
        .await
        .expect("created");
    assert_eq!(created.tenant_id, shop.id);
}

#[tokio::test]
async fn create_at_the_plan_limit_is_refused() {
    let shop = shop();
    let mut mocks = mocks_with_tenant(&shop);
    mocks.customers.expect_count_active().return_once(|_| Ok(25));

    let err = service(mocks)
        .create(&principal(shop.id, Role::Owner), request())
        .await
        .expect_err("limit reached");
    assert_eq!(err.code(), ErrorCode::LimitExceeded);
}

#[tokio::test]
async fn technicians_cannot_create_customers() {
    let shop = shop();
    let err = service(RepositoryMocks::default())
        .create(&principal(shop.id, Role::Technician), request())
        .await
        .expect_err("read-only role");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn duplicate_writes_surface_as_conflicts() {
    let shop = shop();
    let mut mocks = mocks_with_tenant(&shop);
    mocks.customers.expect_count_active().return_once(|_| Ok(0));
    mocks
        .customers
        .expect_insert()
        .return_once(|_| Err(RepositoryError::duplicate("email")));

    let err = service(mocks)
        .create(&principal(shop.id, Role::Owner), request())
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(0, true)]
#[case(2, false)]
#[tokio::test]
async fn delete_requires_no_open_work_orders(#[case] open: u64, #[case] deleted: bool) {
    let shop = shop();
    let stored = customer(shop.id);
    let id = stored.id;
    let mut mocks = with_customer(RepositoryMocks::default(), &stored);
    mocks
        .work_orders
        .expect_count_open_for_customer()
        .return_once(move |_, _| Ok(open));
    mocks
        .customers
        .expect_update()
        .withf(|c| !c.is_active)
        .times(usize::from(deleted))
        .returning(|_| Ok(()));

    let result = service(mocks)
        .delete(&principal(shop.id, Role::Manager), id)
        .await;
    if deleted {
        result.expect("deleted");
    } else {
        let err = result.expect_err("open orders");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.details().expect("details")["openWorkOrders"], 2);
    }
}

#[tokio::test]
async fn deleted_customers_read_as_not_found() {
    let shop = shop();
    let mut stored = customer(shop.id);
    stored.is_active = false;
    let id = stored.id;

    let err = service(with_customer(RepositoryMocks::default(), &stored))
        .get(&principal(shop.id, Role::Technician), id)
        .await
        .expect_err("inactive");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn notes_are_attributed_to_the_caller() {
    let shop = shop();
    let stored = customer(shop.id);
    let id = stored.id;
    let caller = principal(shop.id, Role::Receptionist);
    let mut mocks = with_customer(RepositoryMocks::default(), &stored);
    mocks.customers.expect_update().times(1).return_once(|_| Ok(()));

    let updated = service(mocks)
        .add_note(
            &caller,
            id,
            &AddNoteRequest {
                body: "Prefers morning drop-off".into(),
            },
        )
        .await
        .expect("note added");
    assert_eq!(updated.notes.len(), 1);
    assert_eq!(updated.notes[0].author_id, caller.user_id);
}
