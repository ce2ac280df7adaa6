//! Month-view schedule cache.
//!
//! The portal serves the schedule in 7-day windows anchored on a Sunday.
//! Loading a month means walking the week starts that cover it, fetching
//! only the windows never seen before, and merging the results into a
//! per-day index. A week is attempted at most once per cache lifetime:
//! a failed fetch stays marked so a retry storm cannot develop, and the
//! month renders with whatever data arrived.

use crate::client::WeekScheduleSource;
use crate::schedule::dates::{time_of_day, week_key, week_start, YearMonth};
use crate::types::{ScheduleEntry, ScheduleParams};
use chrono::{Days, NaiveDate};
use dashmap::{DashMap, DashSet};
use futures::future;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ScheduleCache {
    source: Arc<dyn WeekScheduleSource>,
    params: ScheduleParams,
    /// Entries indexed by the calendar day of their `date` field
    by_date: DashMap<NaiveDate, Vec<ScheduleEntry>>,
    /// Week keys that have been scheduled for fetching at least once
    fetched_weeks: DashSet<String>,
    in_flight: tokio::sync::Mutex<()>,
}

impl ScheduleCache {
    pub fn new(source: Arc<dyn WeekScheduleSource>, params: ScheduleParams) -> Self {
        Self {
            source,
            params,
            by_date: DashMap::new(),
            fetched_weeks: DashSet::new(),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Loads every week window needed to cover `month`, skipping windows
    /// already fetched. Cheap when the month is fully cached. Individual
    /// week failures are logged and swallowed; the affected days stay
    /// empty until the process restarts.
    pub async fn ensure_month_loaded(&self, month: YearMonth, token: &str) {
        // A load is already running; its bookkeeping makes our walk
        // redundant.
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(%month, "month load already in flight");
            return;
        };

        let last = month.last_day();

        let mut to_fetch = Vec::new();
        let mut current = week_start(month.first_day());
        while current <= last {
            // `insert` returning true doubles as the atomic check-and-mark:
            // marking before the await keeps a duplicate call from fetching
            // the same week.
            if self.fetched_weeks.insert(week_key(current)) {
                to_fetch.push(current);
            }
            current = current + Days::new(7);
        }
        // The last block can stop short of the month's final days; pull in
        // the boundary week as well.
        if current - Days::new(7) < last && self.fetched_weeks.insert(week_key(current)) {
            to_fetch.push(current);
        }

        if to_fetch.is_empty() {
            debug!(%month, "month already cached");
            return;
        }

        info!(%month, weeks = to_fetch.len(), "fetching schedule weeks");
        let fetches = to_fetch
            .iter()
            .map(|&start| self.source.fetch_week(token, &self.params, start));
        let results = future::join_all(fetches).await;

        for (start, result) in to_fetch.iter().zip(results) {
            match result {
                Ok(entries) => self.merge_entries(entries),
                Err(e) => warn!(week = %start, error = %e, "week fetch failed, leaving week sparse"),
            }
        }
    }

    fn merge_entries(&self, entries: Vec<ScheduleEntry>) {
        for entry in entries {
            let Some(day) = entry.day() else {
                warn!(date = %entry.date, "schedule entry has unparsable date");
                continue;
            };
            self.by_date.entry(day).or_default().push(entry);
        }
    }

    /// Cached entries for `day`, sorted ascending by start time. Entries
    /// whose start time carries no `HH:MM` slice sort by their raw string.
    pub fn entries_for_day(&self, day: NaiveDate) -> Vec<ScheduleEntry> {
        let mut entries = self
            .by_date
            .get(&day)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        entries.sort_by(|a, b| time_of_day(&a.start_time).cmp(time_of_day(&b.start_time)));
        entries
    }

    /// Whether any entry is cached for `day`. Used to mark calendar days
    /// without cloning.
    pub fn has_entries_for_day(&self, day: NaiveDate) -> bool {
        self.by_date.get(&day).is_some_and(|r| !r.value().is_empty())
    }

    /// Cached entries for every day of `month`, in day order.
    pub fn entries_for_month(&self, month: YearMonth) -> Vec<ScheduleEntry> {
        month
            .days()
            .flat_map(|day| self.entries_for_day(day))
            .collect()
    }
}
