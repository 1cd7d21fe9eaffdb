//! Dashboards and business reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::text_enum::text_enum;
use super::validation::FieldError;
use super::{ReportId, TenantId, UserId};

/// Longest reporting window in days.
pub const MAX_RANGE_DAYS: i64 = 366;

text_enum! {
    /// Bucket width of a revenue report.
    pub enum Granularity {
        Day => "day",
        Month => "month",
    }
}

text_enum! {
    /// Kind of stored report snapshot.
    pub enum ReportKind {
        Revenue => "revenue",
        TechnicianProductivity => "technician_productivity",
        WorkOrderStatus => "work_order_status",
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub open_work_orders: u64,
    pub work_orders_by_status: BTreeMap<String, u64>,
    pub appointments_today: u64,
    pub revenue_month_to_date_cents: i64,
    pub outstanding_balance_cents: i64,
    pub overdue_invoices: u64,
    pub low_stock_items: u64,
    pub active_customers: u64,
}

/// Revenue collected in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBucket {
    /// `YYYY-MM-DD` for daily buckets, `YYYY-MM` for monthly ones.
    pub period: String,
    pub revenue_cents: i64,
    pub payments: u64,
}

/// Revenue over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub granularity: Granularity,
    pub buckets: Vec<RevenueBucket>,
    pub total_cents: i64,
}

/// Output of one technician over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianReport {
    pub technician_id: UserId,
    pub name: String,
    pub completed_work_orders: u64,
    pub labor_hours: f64,
}

/// A stored report snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub tenant_id: TenantId,
    pub kind: ReportKind,
    #[schema(value_type = Object)]
    pub parameters: Value,
    #[schema(value_type = Object)]
    pub data: Value,
    pub generated_by: UserId,
    pub generated_at: DateTime<Utc>,
}

/// Half-open reporting window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportRange {
    /// Validate ordering and length.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, FieldError> {
        if to <= from {
            return Err(FieldError::new("to", "invalid_range", "must be after from"));
        }
        if to - from > Duration::days(MAX_RANGE_DAYS) {
            return Err(FieldError::new(
                "to",
                "range_too_long",
                format!("range must not exceed {MAX_RANGE_DAYS} days"),
            ));
        }
        Ok(Self { from, to })
    }

    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

/// Request body for generating and storing a report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub kind: ReportKind,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub granularity: Option<Granularity>,
}

fn period_label(at: DateTime<Utc>, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => at.format("%Y-%m-%d").to_string(),
        Granularity::Month => at.format("%Y-%m").to_string(),
    }
}

fn next_period(date: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => date.succ_opt(),
        Granularity::Month => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)
        }
    }
}

fn period_start(at: DateTime<Utc>, granularity: Granularity) -> NaiveDate {
    let date = at.date_naive();
    match granularity {
        Granularity::Day => date,
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Group `(received_at, amount_cents)` pairs into contiguous buckets.
///
/// Every period touching the range gets a bucket, empty ones included.
pub fn revenue_buckets(
    payments: &[(DateTime<Utc>, i64)],
    range: ReportRange,
    granularity: Granularity,
) -> RevenueReport {
    let mut buckets: BTreeMap<String, RevenueBucket> = BTreeMap::new();
    let mut cursor = Some(period_start(range.from, granularity));
    while let Some(date) = cursor {
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        if start >= range.to {
            break;
        }
        let period = period_label(start, granularity);
        buckets.insert(
            period.clone(),
            RevenueBucket {
                period,
                revenue_cents: 0,
                payments: 0,
            },
        );
        cursor = next_period(date, granularity);
    }

    let mut total = 0;
    for (at, amount) in payments.iter().filter(|(at, _)| range.contains(*at)) {
        let bucket = buckets
            .entry(period_label(*at, granularity))
            .or_insert_with_key(|period| RevenueBucket {
                period: period.clone(),
                revenue_cents: 0,
                payments: 0,
            });
        bucket.revenue_cents += amount;
        bucket.payments += 1;
        total += amount;
    }

    RevenueReport {
        from: range.from,
        to: range.to,
        granularity,
        buckets: buckets.into_values().collect(),
        total_cents: total,
    }
}
