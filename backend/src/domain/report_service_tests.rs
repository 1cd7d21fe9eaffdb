//! Tests for dashboards and reports.

use chrono::TimeZone;

use super::*;
use crate::domain::ports::OutstandingSummary;
use crate::domain::ports::test_doubles::RepositoryMocks;
use crate::domain::service_test_helpers::{clock, customer, now, principal, vehicle};
use crate::domain::{
    CreateWorkOrderRequest, ErrorCode, Invoice, Payment, PaymentMethod, PaymentStatus, Role,
    ServiceLine, User, UserProfile, WorkOrder, WorkOrderStatus,
};

fn service(mocks: RepositoryMocks) -> ReportService {
    ReportService::new(mocks.build(), clock())
}

fn payment(tenant_id: TenantId, amount: i64, at: DateTime<Utc>) -> Payment {
    let owner = customer(tenant_id);
    let order = WorkOrder::open(
        tenant_id,
        "WO-202405-0001".into(),
        CreateWorkOrderRequest {
            customer_id: owner.id,
            vehicle_id: vehicle(&owner).id,
            assigned_to: None,
            priority: None,
            description: "Service".into(),
            mileage_in: None,
            estimated_completion: None,
        },
        UserId::random(),
        at,
    )
    .expect("order");
    let invoice = Invoice::for_work_order(&order, "INV-2024-00001".into(), 0, 30, at);
    Payment::new(&invoice, amount, PaymentMethod::Cash, None, PaymentStatus::Completed, at)
        .expect("payment")
}

fn completed_by(tenant_id: TenantId, technician: UserId, hundredths: u32) -> WorkOrder {
    let owner = customer(tenant_id);
    let mut order = WorkOrder::open(
        tenant_id,
        "WO-202405-0002".into(),
        CreateWorkOrderRequest {
            customer_id: owner.id,
            vehicle_id: vehicle(&owner).id,
            assigned_to: Some(technician),
            priority: None,
            description: "Repair".into(),
            mileage_in: None,
            estimated_completion: None,
        },
        UserId::random(),
        now(),
    )
    .expect("order");
    order
        .services
        .push(ServiceLine::new("Labour", hundredths, 9_000).expect("line"));
    order.status = WorkOrderStatus::Completed;
    order.completed_at = Some(now());
    order
}

#[tokio::test]
async fn dashboard_collects_headline_figures() {
    let tenant_id = TenantId::random();
    let mut mocks = RepositoryMocks::default();
    mocks.work_orders.expect_status_counts().return_once(|_| {
        Ok(vec![
            (WorkOrderStatus::Pending, 2),
            (WorkOrderStatus::InProgress, 3),
            (WorkOrderStatus::Completed, 4),
        ])
    });
    mocks
        .appointments
        .expect_count_starting_between()
        .withf(|_, from, to| {
            *from == Utc.with_ymd_and_hms(2024, 5, 14, 0, 0, 0).unwrap()
                && *to == Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap()
        })
        .return_once(|_, _, _| Ok(6));
    mocks
        .billing
        .expect_completed_payments_between()
        .withf(|_, from, _| *from == Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        .return_once(move |_, _, _| {
            Ok(vec![
                payment(tenant_id, 1_000, now()),
                payment(tenant_id, 2_500, now()),
            ])
        });
    mocks.billing.expect_outstanding().return_once(|_, _| {
        Ok(OutstandingSummary {
            balance_cents: 9_900,
            overdue_invoices: 1,
        })
    });
    mocks.inventory.expect_count_low_stock().return_once(|_| Ok(7));
    mocks.customers.expect_count_active().return_once(|_| Ok(40));

    let summary = service(mocks)
        .dashboard(&principal(tenant_id, Role::Manager))
        .await
        .expect("dashboard");
    assert_eq!(summary.open_work_orders, 5);
    assert_eq!(summary.work_orders_by_status["completed"], 4);
    assert_eq!(summary.appointments_today, 6);
    assert_eq!(summary.revenue_month_to_date_cents, 3_500);
    assert_eq!(summary.outstanding_balance_cents, 9_900);
    assert_eq!(summary.low_stock_items, 7);
    assert_eq!(summary.active_customers, 40);
}

#[tokio::test]
async fn receptionists_cannot_read_reports() {
    let err = service(RepositoryMocks::default())
        .dashboard(&principal(TenantId::random(), Role::Receptionist))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn revenue_defaults_to_the_last_thirty_days() {
    let tenant_id = TenantId::random();
    let mut mocks = RepositoryMocks::default();
    mocks
        .billing
        .expect_completed_payments_between()
        .withf(|_, from, to| *to == now() && *from == now() - Duration::days(30))
        .return_once(move |_, _, _| Ok(vec![payment(tenant_id, 4_200, now() - Duration::days(2))]));

    let report = service(mocks)
        .revenue(&principal(tenant_id, Role::Owner), ReportQuery::default())
        .await
        .expect("report");
    assert_eq!(report.total_cents, 4_200);
    assert_eq!(report.buckets.len(), 31);
}

#[tokio::test]
async fn oversized_windows_are_rejected() {
    let query = ReportQuery {
        from: Some(now() - Duration::days(400)),
        to: Some(now()),
        granularity: Some(Granularity::Month),
    };
    let err = service(RepositoryMocks::default())
        .revenue(&principal(TenantId::random(), Role::Owner), query)
        .await
        .expect_err("too long");
    assert_eq!(err.details().expect("details")["code"], "range_too_long");
}

#[tokio::test]
async fn technician_report_sums_labour() {
    let tenant_id = TenantId::random();
    let tess = User::new(
        tenant_id,
        UserProfile::parse("tess@shop.io", "Tess", "Tech").expect("profile"),
        "hash".into(),
        Role::Technician,
        now(),
    );
    let tess_id = tess.id;
    let other = UserId::random();
    let orders = vec![
        completed_by(tenant_id, tess_id, 150),
        completed_by(tenant_id, tess_id, 75),
        completed_by(tenant_id, other, 300),
    ];
    let mut mocks = RepositoryMocks::default();
    mocks
        .work_orders
        .expect_list_completed_between()
        .return_once(move |_, _, _| Ok(orders));
    mocks.users.expect_find_by_id().returning(move |id| {
        if id == tess_id {
            Ok(Some(tess.clone()))
        } else {
            Ok(None)
        }
    });

    let rows = service(mocks)
        .technicians(&principal(tenant_id, Role::Admin), ReportQuery::default())
        .await
        .expect("report");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Tess Tech");
    assert_eq!(rows[0].completed_work_orders, 2);
    assert!((rows[0].labor_hours - 2.25).abs() < f64::EPSILON);
    assert_eq!(rows[1].name, "Former staff");
}

#[tokio::test]
async fn generated_reports_are_stored() {
    let tenant_id = TenantId::random();
    let mut mocks = RepositoryMocks::default();
    mocks
        .work_orders
        .expect_status_counts()
        .return_once(|_| Ok(vec![(WorkOrderStatus::OnHold, 1)]));
    mocks
        .reports
        .expect_insert()
        .withf(|r| r.kind == ReportKind::WorkOrderStatus && r.data["on_hold"] == 1)
        .times(1)
        .return_once(|_| Ok(()));

    let report = service(mocks)
        .generate(
            &principal(tenant_id, Role::Manager),
            GenerateReportRequest {
                kind: ReportKind::WorkOrderStatus,
                from: None,
                to: None,
                granularity: None,
            },
        )
        .await
        .expect("stored");
    assert_eq!(report.parameters["granularity"], "day");
}
