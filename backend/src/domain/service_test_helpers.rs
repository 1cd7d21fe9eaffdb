//! Fixtures shared by the domain service tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mockable::{Clock, MockClock};

use super::ports::test_doubles::RepositoryMocks;
use super::{
    Customer, CreateCustomerRequest, CreateVehicleRequest, Principal, Role, SubscriptionPlan,
    SubscriptionStatus, Tenant, TenantId, UserId, Vehicle,
};

/// Tuesday 14 May 2024, 10:00 UTC.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, 10, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// A clock frozen at `at`.
pub(crate) fn clock_at(at: DateTime<Utc>) -> Arc<dyn Clock> {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(at);
    Arc::new(clock)
}

/// A clock frozen at [`now`].
pub(crate) fn clock() -> Arc<dyn Clock> {
    clock_at(now())
}

pub(crate) fn tenant(plan: SubscriptionPlan, status: SubscriptionStatus) -> Tenant {
    let mut tenant = Tenant::register("Joe's Garage", "joes-garage", now()).expect("valid tenant");
    tenant.plan = plan;
    tenant.subscription_status = status;
    tenant.settings.tax_rate_bps = 1_000;
    tenant.settings.labor_rate_cents = 9_000;
    tenant
}

pub(crate) fn principal(tenant_id: TenantId, role: Role) -> Principal {
    Principal {
        user_id: UserId::random(),
        tenant_id,
        role,
    }
}

pub(crate) fn customer(tenant_id: TenantId) -> Customer {
    Customer::create(
        tenant_id,
        CreateCustomerRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: Some("jane@example.com".into()),
            phone: "+1 555 010 2030".into(),
            address: None,
        },
        UserId::random(),
        now(),
    )
    .expect("valid customer")
}

pub(crate) fn vehicle(customer: &Customer) -> Vehicle {
    Vehicle::create(
        customer.tenant_id,
        CreateVehicleRequest {
            customer_id: customer.id,
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2019,
            vin: Some("1HGCM82633A004352".into()),
            license_plate: "ABC123".into(),
            color: None,
            mileage: 42_000,
            engine: None,
            transmission: None,
            fuel_type: None,
        },
        now(),
    )
    .expect("valid vehicle")
}

/// Mocks where the tenant lookup always yields `tenant`.
pub(crate) fn mocks_with_tenant(tenant: &Tenant) -> RepositoryMocks {
    let mut mocks = RepositoryMocks::default();
    let stored = tenant.clone();
    mocks
        .tenants
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    mocks
}
