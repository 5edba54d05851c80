//! Analytics service over the storage ports

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use core_kernel::{Currency, Money};
use domain_billing::{Bill, BillPort, BillQuery, PaymentStatus};
use domain_inventory::{group_alerts, MedicinePort, MedicineQuery};
use domain_patient::{PatientPort, PatientQuery, PatientStatus};

use crate::error::AnalyticsError;
use crate::reports::{
    percentage_change, revenue_breakdown, revenue_in, revenue_trend, top_medicines, top_services,
    DailyRevenue, DashboardSummary, RevenueBreakdown, TopItem,
};
use crate::window::DateWindow;

/// Read-only dashboard queries
#[derive(Clone)]
pub struct AnalyticsService {
    patients: Arc<dyn PatientPort>,
    medicines: Arc<dyn MedicinePort>,
    bills: Arc<dyn BillPort>,
    currency: Currency,
}

impl AnalyticsService {
    pub fn new<S>(store: Arc<S>, currency: Currency) -> Self
    where
        S: PatientPort + MedicinePort + BillPort,
    {
        Self {
            patients: store.clone(),
            medicines: store.clone(),
            bills: store,
            currency,
        }
    }

    /// Headline figures as of `now`
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self, now: DateTime<Utc>) -> Result<DashboardSummary, AnalyticsError> {
        let today = DateWindow::day_of(now);
        let yesterday = today.previous();
        let month = DateWindow::month_of(now);
        let last_month = month.previous_month();

        // Last month through today covers every revenue figure
        let from = last_month.from.min(yesterday.from);
        let recent = self.bills_between(from, today.to).await?;

        let (today_revenue, today_bills) = revenue_in(&recent, &today);
        let (yesterday_revenue, yesterday_bills) = revenue_in(&recent, &yesterday);
        let (month_revenue, _) = revenue_in(&recent, &month);
        let (last_month_revenue, _) = revenue_in(&recent, &last_month);

        let total_patients = self.patients.count_patients(&PatientQuery::default()).await?;
        let active_patients = self
            .patients
            .count_patients(&PatientQuery {
                status: Some(PatientStatus::Active),
                ..Default::default()
            })
            .await?;
        let new_patients_this_month = self
            .patients
            .count_patients(&PatientQuery::registered_between(month.from, month.to))
            .await?;

        let (outstanding_bills, outstanding_amount) = self.outstanding().await?;

        let medicines = self.medicines.find_medicines(&MedicineQuery::default()).await?;
        let alerts = group_alerts(medicines, now.date_naive());

        Ok(DashboardSummary {
            today_revenue: self.money(today_revenue),
            today_bills,
            yesterday_revenue: self.money(yesterday_revenue),
            yesterday_bills,
            daily_change: percentage_change(today_revenue, yesterday_revenue),
            month_revenue: self.money(month_revenue),
            last_month_revenue: self.money(last_month_revenue),
            monthly_change: percentage_change(month_revenue, last_month_revenue),
            total_patients,
            active_patients,
            new_patients_this_month,
            outstanding_bills,
            outstanding_amount: self.money(outstanding_amount),
            low_stock_medicines: alerts.low_stock.len() as u64,
            out_of_stock_medicines: alerts.out_of_stock.len() as u64,
            expiring_soon_medicines: alerts.expiring_soon.len() as u64,
        })
    }

    #[instrument(skip(self))]
    pub async fn revenue_breakdown(&self, window: DateWindow) -> Result<RevenueBreakdown, AnalyticsError> {
        let bills = self.bills_between(window.from, window.to).await?;
        Ok(revenue_breakdown(&bills, self.currency))
    }

    #[instrument(skip(self))]
    pub async fn revenue_trend(&self, window: DateWindow) -> Result<Vec<DailyRevenue>, AnalyticsError> {
        let bills = self.bills_between(window.from, window.to).await?;
        Ok(revenue_trend(&bills, &window, self.currency))
    }

    #[instrument(skip(self))]
    pub async fn top_services(&self, window: DateWindow, limit: usize) -> Result<Vec<TopItem>, AnalyticsError> {
        let bills = self.bills_between(window.from, window.to).await?;
        Ok(top_services(&bills, limit, self.currency))
    }

    #[instrument(skip(self))]
    pub async fn top_medicines(&self, window: DateWindow, limit: usize) -> Result<Vec<TopItem>, AnalyticsError> {
        let bills = self.bills_between(window.from, window.to).await?;
        Ok(top_medicines(&bills, limit, self.currency))
    }

    /// Count and sum of bills still owed, fetched per unpaid status
    async fn outstanding(&self) -> Result<(u64, Decimal), AnalyticsError> {
        let mut count = 0;
        let mut amount = Decimal::ZERO;
        for status in [PaymentStatus::Pending, PaymentStatus::Partial] {
            let bills = self
                .bills
                .find_bills(&BillQuery {
                    payment_status: Some(status),
                    ..Default::default()
                })
                .await?;
            count += bills.len() as u64;
            amount += bills.iter().map(|bill| bill.total_amount.amount()).sum::<Decimal>();
        }
        Ok((count, amount))
    }

    async fn bills_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Bill>, AnalyticsError> {
        Ok(self.bills.find_bills(&BillQuery::between(from, to)).await?)
    }

    fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }
}
