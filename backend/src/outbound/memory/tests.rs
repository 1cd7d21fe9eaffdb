//! Behaviour of the in-memory repositories that the services rely on.

use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    CreateCustomerRequest, CreateInventoryItemRequest, CreateVehicleRequest, MovementReason,
    StockChange, StockUpdate, Vehicle,
};

fn at(hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, hour, 0, 0)
        .single()
        .expect("valid time")
}

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

fn tenant(slug: &str) -> Tenant {
    Tenant::register("Shop", slug, at(8)).expect("tenant")
}

fn vehicle(tenant_id: TenantId, plate: &str) -> Vehicle {
    let customer = Customer::create(
        tenant_id,
        CreateCustomerRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: None,
            phone: "555 0100".into(),
            address: None,
        },
        UserId::random(),
        at(8),
    )
    .expect("customer");
    Vehicle::create(
        tenant_id,
        CreateVehicleRequest {
            customer_id: customer.id,
            make: "Ford".into(),
            model: "Focus".into(),
            year: 2018,
            vin: None,
            license_plate: plate.into(),
            color: None,
            mileage: 1_000,
            engine: None,
            transmission: None,
            fuel_type: None,
        },
        at(8),
    )
    .expect("vehicle")
}

fn item(tenant_id: TenantId) -> InventoryItem {
    InventoryItem::create(
        tenant_id,
        CreateInventoryItemRequest {
            sku: "FLT-01".into(),
            name: "Oil filter".into(),
            category: None,
            quantity_on_hand: 0,
            reorder_level: 1,
            unit_cost_cents: 300,
            unit_price_cents: 700,
            supplier: None,
            location: None,
        },
        at(8),
    )
    .expect("item")
}

#[rstest]
#[tokio::test]
async fn slugs_are_globally_unique(store: MemoryStore) {
    let repos = store.repositories();
    repos.tenants.insert(&tenant("north")).await.expect("first");
    let err = repos
        .tenants
        .insert(&tenant("north"))
        .await
        .expect_err("clash");
    assert_eq!(err, RepositoryError::duplicate("slug"));
}

#[rstest]
#[tokio::test]
async fn plates_are_unique_per_tenant_among_active_vehicles(store: MemoryStore) {
    let repos = store.repositories();
    let first = TenantId::random();
    let mut existing = vehicle(first, "AB12CDE");
    repos.vehicles.insert(&existing).await.expect("first");

    let err = repos
        .vehicles
        .insert(&vehicle(first, "AB12CDE"))
        .await
        .expect_err("clash");
    assert_eq!(err, RepositoryError::duplicate("license_plate"));

    repos
        .vehicles
        .insert(&vehicle(TenantId::random(), "AB12CDE"))
        .await
        .expect("other tenant");

    existing.is_active = false;
    repos.vehicles.update(&existing).await.expect("soft delete");
    repos
        .vehicles
        .insert(&vehicle(first, "AB12CDE"))
        .await
        .expect("plate freed");
}

#[rstest]
#[tokio::test]
async fn sequences_count_per_tenant_and_period(store: MemoryStore) {
    let repos = store.repositories();
    let tenant_id = TenantId::random();
    assert_eq!(repos.work_orders.next_sequence(tenant_id, "202405").await, Ok(1));
    assert_eq!(repos.work_orders.next_sequence(tenant_id, "202405").await, Ok(2));
    assert_eq!(repos.work_orders.next_sequence(tenant_id, "202406").await, Ok(1));
    assert_eq!(repos.billing.next_invoice_sequence(tenant_id, 2024).await, Ok(1));
}

#[rstest]
#[tokio::test]
async fn stock_never_goes_negative(store: MemoryStore) {
    let repos = store.repositories();
    let stocked = item(TenantId::random());
    repos.inventory.insert(&stocked).await.expect("insert");
    let change = |delta| StockChange {
        tenant_id: stocked.tenant_id,
        item_id: stocked.id,
        delta,
        reason: MovementReason::Adjustment,
        reference: None,
        created_by: UserId::random(),
        at: at(9),
    };

    let applied = repos
        .inventory
        .apply_stock_change(&change(4))
        .await
        .expect("apply");
    assert!(matches!(applied, StockUpdate::Applied(ref m) if m.quantity_after == 4));

    let refused = repos
        .inventory
        .apply_stock_change(&change(-5))
        .await
        .expect("apply");
    assert_eq!(refused, StockUpdate::Insufficient { available: 4 });

    let movements = repos
        .inventory
        .list_movements(stocked.tenant_id, stocked.id, PageRequest::default())
        .await
        .expect("movements");
    assert_eq!(movements.total, 1);
}

#[rstest]
#[tokio::test]
async fn descriptive_updates_keep_the_stock_level(store: MemoryStore) {
    let repos = store.repositories();
    let mut stocked = item(TenantId::random());
    repos.inventory.insert(&stocked).await.expect("insert");
    repos
        .inventory
        .apply_stock_change(&StockChange {
            tenant_id: stocked.tenant_id,
            item_id: stocked.id,
            delta: 9,
            reason: MovementReason::Purchase,
            reference: None,
            created_by: UserId::random(),
            at: at(9),
        })
        .await
        .expect("purchase");

    stocked.name = "Premium oil filter".into();
    repos.inventory.update(&stocked).await.expect("update");
    let stored = repos
        .inventory
        .find(stocked.tenant_id, stocked.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.quantity_on_hand, 9);
    assert_eq!(stored.name, "Premium oil filter");
}

#[rstest]
#[tokio::test]
async fn records_of_other_tenants_are_invisible(store: MemoryStore) {
    let repos = store.repositories();
    let stocked = item(TenantId::random());
    repos.inventory.insert(&stocked).await.expect("insert");
    let found = repos
        .inventory
        .find(TenantId::random(), stocked.id)
        .await
        .expect("find");
    assert!(found.is_none());
}

#[rstest]
#[tokio::test]
async fn work_orders_created_this_month_include_deleted_ones(store: MemoryStore) {
    use crate::domain::{CreateWorkOrderRequest, CustomerId, VehicleId};

    let repos = store.repositories();
    let tenant_id = TenantId::random();
    let mut order = WorkOrder::open(
        tenant_id,
        "WO-202405-0001".into(),
        CreateWorkOrderRequest {
            customer_id: CustomerId::random(),
            vehicle_id: VehicleId::random(),
            assigned_to: None,
            priority: None,
            description: "Brakes".into(),
            mileage_in: None,
            estimated_completion: None,
        },
        UserId::random(),
        at(9),
    )
    .expect("order");
    repos.work_orders.insert(&order).await.expect("insert");
    let read_at = order.updated_at;
    order.is_active = false;
    repos
        .work_orders
        .update(&order, read_at)
        .await
        .expect("delete");

    let count = repos
        .work_orders
        .count_created_between(tenant_id, at(0), at(0) + Duration::days(1))
        .await
        .expect("count");
    assert_eq!(count, 1);
    assert!(
        repos
            .work_orders
            .find(tenant_id, order.id)
            .await
            .expect("find")
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn invoices_with_nothing_owed_are_never_overdue(store: MemoryStore) {
    use crate::domain::{CreateWorkOrderRequest, CustomerId, ServiceLine, VehicleId};

    let repos = store.repositories();
    let tenant_id = TenantId::random();
    let open = |number: &str| {
        WorkOrder::open(
            tenant_id,
            number.into(),
            CreateWorkOrderRequest {
                customer_id: CustomerId::random(),
                vehicle_id: VehicleId::random(),
                assigned_to: None,
                priority: None,
                description: "Inspection".into(),
                mileage_in: None,
                estimated_completion: None,
            },
            UserId::random(),
            at(9),
        )
        .expect("order")
    };

    let free = open("WO-202405-0001");
    let mut billed = open("WO-202405-0002");
    billed
        .services
        .push(ServiceLine::new("Diagnosis", 100, 6_000).expect("line"));
    billed.recalculate(0);

    for (order, number) in [(&free, "INV-2024-00001"), (&billed, "INV-2024-00002")] {
        repos.work_orders.insert(order).await.expect("insert order");
        let invoice = Invoice::for_work_order(order, number.into(), 0, 30, at(9));
        repos
            .billing
            .create_invoice(&invoice, order, order.updated_at)
            .await
            .expect("create invoice");
    }

    let summary = repos
        .billing
        .outstanding(tenant_id, at(9) + Duration::days(45))
        .await
        .expect("summary");
    assert_eq!(summary.overdue_invoices, 1);
    assert_eq!(summary.balance_cents, 6_000);
}

fn brake_job(tenant_id: TenantId) -> WorkOrder {
    use crate::domain::{CreateWorkOrderRequest, CustomerId, ServiceLine, VehicleId};

    let mut order = WorkOrder::open(
        tenant_id,
        "WO-202405-0007".into(),
        CreateWorkOrderRequest {
            customer_id: CustomerId::random(),
            vehicle_id: VehicleId::random(),
            assigned_to: None,
            priority: None,
            description: "Rear brakes".into(),
            mileage_in: None,
            estimated_completion: None,
        },
        UserId::random(),
        at(9),
    )
    .expect("order");
    order
        .services
        .push(ServiceLine::new("Replace shoes", 100, 10_000).expect("line"));
    order.recalculate(0);
    order
}

#[rstest]
#[tokio::test]
async fn work_order_writes_from_a_stale_read_are_rejected(store: MemoryStore) {
    let repos = store.repositories();
    let order = brake_job(TenantId::random());
    repos.work_orders.insert(&order).await.expect("insert");
    let read_at = order.updated_at;

    let mut first = order.clone();
    first.description = "Rear brakes and drums".into();
    first.updated_at = at(10);
    let mut second = order.clone();
    second.description = "Rear brakes only".into();
    second.updated_at = at(11);

    repos
        .work_orders
        .update(&first, read_at)
        .await
        .expect("first writer wins");
    let err = repos
        .work_orders
        .update(&second, read_at)
        .await
        .expect_err("second writer read an old revision");
    assert_eq!(err, RepositoryError::stale("work order"));

    let stored = repos
        .work_orders
        .find(order.tenant_id, order.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.description, "Rear brakes and drums");
}

#[rstest]
#[tokio::test]
async fn concurrent_payments_cannot_both_land(store: MemoryStore) {
    use crate::domain::{Payment, PaymentMethod, PaymentStatus};

    let repos = store.repositories();
    let order = brake_job(TenantId::random());
    repos.work_orders.insert(&order).await.expect("insert order");
    let invoice = Invoice::for_work_order(&order, "INV-2024-00007".into(), 0, 30, at(9));
    repos
        .billing
        .create_invoice(&invoice, &order, order.updated_at)
        .await
        .expect("create invoice");
    let read_at = invoice.updated_at;

    let mut results = Vec::new();
    for (hour, amount) in [(10, 6_000), (11, 7_000)] {
        let mut copy = invoice.clone();
        copy.apply_payment(amount, at(hour)).expect("within balance");
        let payment = Payment::new(
            &copy,
            amount,
            PaymentMethod::Card,
            None,
            PaymentStatus::Completed,
            at(hour),
        )
        .expect("payment");
        results.push(repos.billing.save_payment(&copy, read_at, &payment).await);
    }
    assert_eq!(results, vec![Ok(()), Err(RepositoryError::stale("invoice"))]);

    let stored = repos
        .billing
        .find_invoice(invoice.tenant_id, invoice.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.amount_paid_cents, 6_000);
    let payments = repos
        .billing
        .list_payments(invoice.tenant_id, invoice.id)
        .await
        .expect("payments");
    assert_eq!(payments.len(), 1);
}
