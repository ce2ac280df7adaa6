//! Calendar helpers for the week-windowed schedule API.

use chrono::{Datelike, Days, Months, NaiveDate};

/// A calendar month, carried as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// `None` for an out-of-range month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.with_day(1).expect("day 1 exists in every month"))
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn last_day(self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .expect("month end within calendar range")
    }

    /// Every day of the month in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.0.iter_days().take_while(move |d| *d <= last)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// The Sunday on or before `date`, which is where the portal's 7-day
/// schedule windows start.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
}

/// The wire form of a week-start date; also the cache's dedup key.
pub fn week_key(week_start: NaiveDate) -> String {
    format!("{week_start}T00:00:00.000Z")
}

/// `HH:MM` slice of a portal date-time string. Strings too short to carry a
/// time sort by their raw value instead.
pub fn time_of_day(datetime: &str) -> &str {
    datetime.get(11..16).unwrap_or(datetime)
}
