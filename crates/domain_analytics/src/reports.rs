//! Report computations
//!
//! Every function here is pure over the bills it is handed. Amounts are
//! summed as decimals and wrapped in the reporting currency at the end.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use core_kernel::{percentage_floor, Currency, Money};
use domain_billing::Bill;

use crate::window::DateWindow;

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub today_revenue: Money,
    pub today_bills: u64,
    pub yesterday_revenue: Money,
    pub yesterday_bills: u64,
    /// Today's revenue against yesterday's, in whole percent
    pub daily_change: i64,
    pub month_revenue: Money,
    pub last_month_revenue: Money,
    /// This month's revenue against last month's, in whole percent
    pub monthly_change: i64,
    pub total_patients: u64,
    pub active_patients: u64,
    pub new_patients_this_month: u64,
    /// Bills still pending or partially paid
    pub outstanding_bills: u64,
    pub outstanding_amount: Money,
    pub low_stock_medicines: u64,
    pub out_of_stock_medicines: u64,
    pub expiring_soon_medicines: u64,
}

/// Revenue split by source
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueBreakdown {
    pub consultation: Money,
    pub medicines: Money,
    pub services: Money,
    pub total: Money,
    /// Whole percent of the total, rounded down so the three never exceed 100
    pub consultation_share: u32,
    pub medicines_share: u32,
    pub services_share: u32,
    pub bill_count: u64,
}

/// Revenue on one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Money,
    pub bills: u64,
}

/// A ranked medicine or service
#[derive(Debug, Clone, PartialEq)]
pub struct TopItem {
    /// Storage key of the medicine or service
    pub id: String,
    pub name: String,
    /// Units sold (medicines) or times billed (services)
    pub quantity: u64,
    /// Number of bills the item appears on
    pub bills: u64,
    pub revenue: Money,
}

/// Change from `previous` to `current` in whole percent, rounded half away
/// from zero; zero when there is nothing to compare against
pub fn percentage_change(current: Decimal, previous: Decimal) -> i64 {
    if previous.is_zero() {
        return 0;
    }
    ((current - previous) / previous * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Sums revenue and counts bills inside `window`
pub fn revenue_in(bills: &[Bill], window: &DateWindow) -> (Decimal, u64) {
    bills
        .iter()
        .filter(|bill| window.contains(bill.created_at))
        .fold((Decimal::ZERO, 0), |(sum, count), bill| {
            (sum + bill.total_amount.amount(), count + 1)
        })
}

/// Splits revenue of `bills` into consultation, medicines and services
pub fn revenue_breakdown(bills: &[Bill], currency: Currency) -> RevenueBreakdown {
    let mut consultation = Decimal::ZERO;
    let mut medicines = Decimal::ZERO;
    let mut services = Decimal::ZERO;
    for bill in bills {
        consultation += bill.consultation_fee.amount();
        medicines += bill.medicines_total.amount();
        services += bill.services_total.amount();
    }
    let total = consultation + medicines + services;

    RevenueBreakdown {
        consultation: Money::new(consultation, currency),
        medicines: Money::new(medicines, currency),
        services: Money::new(services, currency),
        total: Money::new(total, currency),
        consultation_share: percentage_floor(consultation, total),
        medicines_share: percentage_floor(medicines, total),
        services_share: percentage_floor(services, total),
        bill_count: bills.len() as u64,
    }
}

/// Revenue per day across `window`, with zero rows for days without bills
pub fn revenue_trend(bills: &[Bill], window: &DateWindow, currency: Currency) -> Vec<DailyRevenue> {
    let mut per_day: HashMap<NaiveDate, (Decimal, u64)> = HashMap::new();
    for bill in bills.iter().filter(|bill| window.contains(bill.created_at)) {
        let entry = per_day.entry(bill.created_at.date_naive()).or_default();
        entry.0 += bill.total_amount.amount();
        entry.1 += 1;
    }

    window
        .dates()
        .into_iter()
        .map(|date| {
            let (revenue, count) = per_day.get(&date).copied().unwrap_or_default();
            DailyRevenue {
                date,
                revenue: Money::new(revenue, currency),
                bills: count,
            }
        })
        .collect()
}

#[derive(Default)]
struct Tally {
    name: String,
    quantity: u64,
    bills: u64,
    revenue: Decimal,
}

/// Best-selling services by revenue, then by times billed
pub fn top_services(bills: &[Bill], limit: usize, currency: Currency) -> Vec<TopItem> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for bill in bills {
        let mut seen = Vec::new();
        for line in &bill.services {
            let key = line.service.as_uuid().to_string();
            let tally = tallies.entry(key.clone()).or_default();
            tally.name.clone_from(&line.name);
            tally.quantity += 1;
            tally.revenue += line.price.amount();
            if !seen.contains(&key) {
                tally.bills += 1;
                seen.push(key);
            }
        }
    }
    rank(tallies, limit, currency)
}

/// Best-selling medicines by revenue, then by units sold
pub fn top_medicines(bills: &[Bill], limit: usize, currency: Currency) -> Vec<TopItem> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for bill in bills {
        let mut seen = Vec::new();
        for line in &bill.medicines {
            let key = line.medicine.as_uuid().to_string();
            let tally = tallies.entry(key.clone()).or_default();
            tally.name.clone_from(&line.name);
            tally.quantity += u64::from(line.quantity);
            tally.revenue += line.total.amount();
            if !seen.contains(&key) {
                tally.bills += 1;
                seen.push(key);
            }
        }
    }
    rank(tallies, limit, currency)
}

fn rank(tallies: HashMap<String, Tally>, limit: usize, currency: Currency) -> Vec<TopItem> {
    let mut items: Vec<(String, Tally)> = tallies.into_iter().collect();
    items.sort_by(|(_, a), (_, b)| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.quantity.cmp(&a.quantity))
            .then_with(|| a.name.cmp(&b.name))
    });
    items
        .into_iter()
        .take(limit)
        .map(|(id, tally)| TopItem {
            id,
            name: tally.name,
            quantity: tally.quantity,
            bills: tally.bills,
            revenue: Money::new(tally.revenue, currency),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(dec!(150), dec!(100)), 50);
        assert_eq!(percentage_change(dec!(50), dec!(100)), -50);
        assert_eq!(percentage_change(dec!(100), dec!(0)), 0);
        assert_eq!(percentage_change(dec!(0), dec!(0)), 0);
        assert_eq!(percentage_change(dec!(101), dec!(300)), -66);
    }

    #[test]
    fn test_empty_inputs_give_zero_reports() {
        let breakdown = revenue_breakdown(&[], Currency::INR);
        assert!(breakdown.total.is_zero());
        assert_eq!(breakdown.consultation_share, 0);
        assert_eq!(breakdown.bill_count, 0);

        assert!(top_services(&[], 5, Currency::INR).is_empty());
        assert!(top_medicines(&[], 5, Currency::INR).is_empty());
    }
}
