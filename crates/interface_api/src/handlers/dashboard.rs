//! Dashboard report handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};

use domain_analytics::DateWindow;

use crate::dto::dashboard::*;
use crate::{error::ApiError, AppState};

const MAX_TOP_LIMIT: usize = 50;

/// Headline figures for today, this month and the shelves
pub async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummaryResponse>, ApiError> {
    let summary = state.analytics.dashboard_summary(Utc::now()).await?;
    Ok(Json(summary.into()))
}

/// Revenue by source over the window
pub async fn revenue(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<RevenueBreakdownResponse>, ApiError> {
    let window = report_window(&params, Utc::now())?;
    let breakdown = state.analytics.revenue_breakdown(window).await?;
    Ok(Json(breakdown.into()))
}

/// One row per day in the window, including days without bills
pub async fn trend(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<Vec<DailyRevenueResponse>>, ApiError> {
    let window = report_window(&params, Utc::now())?;
    let days = state.analytics.revenue_trend(window).await?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}

pub async fn top_services(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<Vec<TopItemResponse>>, ApiError> {
    let window = report_window(&params, Utc::now())?;
    let items = state.analytics.top_services(window, top_limit(&params)).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn top_medicines(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<Vec<TopItemResponse>>, ApiError> {
    let window = report_window(&params, Utc::now())?;
    let items = state.analytics.top_medicines(window, top_limit(&params)).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// `from`/`to` when given (an open `to` means today), else the last `days` days
fn report_window(params: &ReportParams, now: DateTime<Utc>) -> Result<DateWindow, ApiError> {
    let window = match (params.from, params.to) {
        (Some(from), Some(to)) => DateWindow::days(from, to)?,
        (Some(from), None) => DateWindow::days(from, now.date_naive())?,
        (None, Some(_)) => {
            return Err(ApiError::BadRequest("`to` requires `from`".to_string()));
        }
        (None, None) => DateWindow::last_days(params.days.unwrap_or(DEFAULT_REPORT_DAYS), now)?,
    };
    Ok(window)
}

fn top_limit(params: &ReportParams) -> usize {
    params.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_explicit_days_are_inclusive() {
        let params = ReportParams {
            from: NaiveDate::from_ymd_opt(2026, 5, 1),
            to: NaiveDate::from_ymd_opt(2026, 5, 7),
            ..Default::default()
        };
        let window = report_window(&params, now()).unwrap();
        assert_eq!(window.dates().len(), 7);
    }

    #[test]
    fn test_to_without_from_is_rejected() {
        let params = ReportParams {
            to: NaiveDate::from_ymd_opt(2026, 5, 7),
            ..Default::default()
        };
        assert!(matches!(report_window(&params, now()), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_top_limit_is_clamped() {
        let params = ReportParams {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(top_limit(&params), 1);
        assert_eq!(top_limit(&ReportParams::default()), DEFAULT_TOP_LIMIT);
    }
}
