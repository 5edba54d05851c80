//! Reporting windows

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::AnalyticsError;

/// Longest window a report may span
pub const MAX_WINDOW_DAYS: u32 = 366;

/// A half-open time range `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        if to <= from {
            return Err(AnalyticsError::InvalidWindow("end must be after start".to_string()));
        }
        if to - from > Duration::days(i64::from(MAX_WINDOW_DAYS)) {
            return Err(AnalyticsError::InvalidWindow(format!(
                "window may span at most {MAX_WINDOW_DAYS} days"
            )));
        }
        Ok(Self { from, to })
    }

    /// Whole days from `start` up to and including `end`
    pub fn days(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        let after_end = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AnalyticsError::InvalidWindow(format!("date {end} is out of range")))?;
        Self::new(start_of(start), start_of(after_end))
    }

    /// The calendar day containing `now`
    pub fn day_of(now: DateTime<Utc>) -> Self {
        let start = start_of(now.date_naive());
        Self {
            from: start,
            to: start + Duration::days(1),
        }
    }

    /// The `days` whole days ending with the day containing `now`
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        if days == 0 {
            return Err(AnalyticsError::InvalidWindow("days must be at least 1".to_string()));
        }
        if days > MAX_WINDOW_DAYS {
            return Err(AnalyticsError::InvalidWindow(format!(
                "window may span at most {MAX_WINDOW_DAYS} days"
            )));
        }
        let today = now.date_naive();
        let start = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| AnalyticsError::InvalidWindow(format!("{days} days before {today} is out of range")))?;
        Self::days(start, today)
    }

    /// The calendar month containing `now`
    pub fn month_of(now: DateTime<Utc>) -> Self {
        let start = month_start(now.date_naive());
        let next = month_start(start + Duration::days(32));
        Self {
            from: start_of(start),
            to: start_of(next),
        }
    }

    /// The window of the same length immediately before this one
    pub fn previous(&self) -> Self {
        let length = self.to - self.from;
        Self {
            from: self.from - length,
            to: self.from,
        }
    }

    /// The calendar month before the one starting at `from`
    pub fn previous_month(&self) -> Self {
        Self::month_of(self.from - Duration::days(1))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at < self.to
    }

    /// Every calendar date touched by the window, in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        let first = self.from.date_naive();
        let last = (self.to - Duration::nanoseconds(1)).date_naive();
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
