//! Dashboard figures, revenue and productivity reports, stored snapshots.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::ports::Repositories;
use super::tenant::month_start;
use super::{
    DashboardSummary, Error, GenerateReportRequest, Granularity, Permission, Principal, Report,
    ReportId, ReportKind, ReportRange, RevenueReport, TechnicianReport, TenantId, UserId,
    report::revenue_buckets,
};

/// Window used when a report request names no dates.
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Query string of the ad-hoc report endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// Inclusive start; defaults to 30 days before `to`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive end; defaults to now.
    pub to: Option<DateTime<Utc>>,
    /// Revenue bucket width; defaults to `day`.
    pub granularity: Option<Granularity>,
}

impl ReportQuery {
    fn range(&self, now: DateTime<Utc>) -> Result<ReportRange, Error> {
        let to = self.to.unwrap_or(now);
        let from = self
            .from
            .unwrap_or_else(|| to - Duration::days(DEFAULT_WINDOW_DAYS));
        Ok(ReportRange::new(from, to)?)
    }
}

/// Report operations. Every call requires `reports:read`.
#[derive(Clone)]
pub struct ReportService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    /// Create the service.
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Headline figures for the caller's shop at the current instant.
    pub async fn dashboard(&self, principal: &Principal) -> Result<DashboardSummary, Error> {
        principal.require(Permission::ReportsRead)?;
        let tenant_id = principal.tenant_id;
        let now = self.clock.utc();
        let today = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);

        let counts = self.repos.work_orders.status_counts(tenant_id).await?;
        let open_work_orders = counts
            .iter()
            .filter(|(status, _)| status.is_open())
            .map(|(_, count)| count)
            .sum();
        let work_orders_by_status: BTreeMap<String, u64> = counts
            .into_iter()
            .map(|(status, count)| (status.as_str().to_owned(), count))
            .collect();

        let revenue_month_to_date_cents = self
            .repos
            .billing
            .completed_payments_between(tenant_id, month_start(now), now)
            .await?
            .iter()
            .map(|p| p.amount_cents)
            .sum();
        let outstanding = self.repos.billing.outstanding(tenant_id, now).await?;

        Ok(DashboardSummary {
            open_work_orders,
            work_orders_by_status,
            appointments_today: self
                .repos
                .appointments
                .count_starting_between(tenant_id, today, today + Duration::days(1))
                .await?,
            revenue_month_to_date_cents,
            outstanding_balance_cents: outstanding.balance_cents,
            overdue_invoices: outstanding.overdue_invoices,
            low_stock_items: self.repos.inventory.count_low_stock(tenant_id).await?,
            active_customers: self.repos.customers.count_active(tenant_id).await?,
        })
    }

    async fn revenue_in(
        &self,
        tenant_id: TenantId,
        range: ReportRange,
        granularity: Granularity,
    ) -> Result<RevenueReport, Error> {
        let payments: Vec<(DateTime<Utc>, i64)> = self
            .repos
            .billing
            .completed_payments_between(tenant_id, range.from, range.to)
            .await?
            .into_iter()
            .map(|p| (p.received_at, p.amount_cents))
            .collect();
        Ok(revenue_buckets(&payments, range, granularity))
    }

    async fn technicians_in(
        &self,
        tenant_id: TenantId,
        range: ReportRange,
    ) -> Result<Vec<TechnicianReport>, Error> {
        let orders = self
            .repos
            .work_orders
            .list_completed_between(tenant_id, range.from, range.to)
            .await?;
        let mut totals: HashMap<UserId, (u64, u64)> = HashMap::new();
        for order in &orders {
            if let Some(technician) = order.assigned_to {
                let entry = totals.entry(technician).or_default();
                entry.0 += 1;
                entry.1 += order.labor_hundredths();
            }
        }

        let mut rows = Vec::with_capacity(totals.len());
        for (technician_id, (completed, hundredths)) in totals {
            let name = match self.repos.users.find_by_id(technician_id).await? {
                Some(user) if user.tenant_id == tenant_id => user.full_name(),
                _ => "Former staff".to_owned(),
            };
            rows.push(TechnicianReport {
                technician_id,
                name,
                completed_work_orders: completed,
                labor_hours: hundredths as f64 / 100.0,
            });
        }
        rows.sort_by(|a, b| {
            b.completed_work_orders
                .cmp(&a.completed_work_orders)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rows)
    }

    /// Revenue from completed payments received in the window.
    pub async fn revenue(
        &self,
        principal: &Principal,
        query: ReportQuery,
    ) -> Result<RevenueReport, Error> {
        principal.require(Permission::ReportsRead)?;
        let range = query.range(self.clock.utc())?;
        self.revenue_in(
            principal.tenant_id,
            range,
            query.granularity.unwrap_or(Granularity::Day),
        )
        .await
    }

    /// Completed work and labour per technician, busiest first.
    pub async fn technicians(
        &self,
        principal: &Principal,
        query: ReportQuery,
    ) -> Result<Vec<TechnicianReport>, Error> {
        principal.require(Permission::ReportsRead)?;
        let range = query.range(self.clock.utc())?;
        self.technicians_in(principal.tenant_id, range).await
    }

    /// Compute a report and store the snapshot.
    pub async fn generate(
        &self,
        principal: &Principal,
        request: GenerateReportRequest,
    ) -> Result<Report, Error> {
        principal.require(Permission::ReportsRead)?;
        let tenant_id = principal.tenant_id;
        let now = self.clock.utc();
        let query = ReportQuery {
            from: request.from,
            to: request.to,
            granularity: request.granularity,
        };
        let range = query.range(now)?;
        let granularity = request.granularity.unwrap_or(Granularity::Day);

        let data = match request.kind {
            ReportKind::Revenue => {
                json!(self.revenue_in(tenant_id, range, granularity).await?)
            }
            ReportKind::TechnicianProductivity => {
                json!(self.technicians_in(tenant_id, range).await?)
            }
            ReportKind::WorkOrderStatus => {
                let counts: BTreeMap<String, u64> = self
                    .repos
                    .work_orders
                    .status_counts(tenant_id)
                    .await?
                    .into_iter()
                    .map(|(status, count)| (status.as_str().to_owned(), count))
                    .collect();
                json!(counts)
            }
        };
        let report = Report {
            id: ReportId::random(),
            tenant_id,
            kind: request.kind,
            parameters: json!({
                "from": range.from,
                "to": range.to,
                "granularity": granularity,
            }),
            data,
            generated_by: principal.user_id,
            generated_at: now,
        };
        self.repos.reports.insert(&report).await?;
        info!(tenant_id = %tenant_id, kind = %report.kind, report_id = %report.id, "report stored");
        Ok(report)
    }

    /// Page through stored reports, newest first.
    pub async fn list(&self, principal: &Principal, page: PageRequest) -> Result<Page<Report>, Error> {
        principal.require(Permission::ReportsRead)?;
        Ok(self.repos.reports.list(principal.tenant_id, page).await?)
    }

    /// Fetch a stored report.
    pub async fn get(&self, principal: &Principal, id: ReportId) -> Result<Report, Error> {
        principal.require(Permission::ReportsRead)?;
        self.repos
            .reports
            .find(principal.tenant_id, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("report {id} not found")))
    }
}

#[cfg(test)]
#[path = "report_service_tests.rs"]
mod tests;
