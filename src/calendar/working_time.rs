use super::{CalendarSet, Interval, normalize_intervals};
use crate::error::ScheduleResult;
use crate::ids::CalendarId;
use crate::time::{SECONDS_PER_DAY, TimeValue};
use chrono::NaiveDate;
use tracing::warn;

/// Working-time arithmetic over the union of one or more calendars.
///
/// A task staffed by resources on different calendars may work whenever any of
/// them does. Every search is bounded by `max_scan_days`; past that bound the
/// computation falls back to wall-clock arithmetic.
#[derive(Debug, Clone)]
pub struct WorkingTime<'a> {
    calendars: &'a CalendarSet,
    ids: Vec<CalendarId>,
    max_scan_days: i64,
}

impl<'a> WorkingTime<'a> {
    pub fn new(calendars: &'a CalendarSet, calendar: CalendarId, max_scan_days: u32) -> Self {
        Self::union(calendars, [calendar], max_scan_days)
    }

    /// Falls back to the root calendar when `ids` is empty.
    pub fn union<I>(calendars: &'a CalendarSet, ids: I, max_scan_days: u32) -> Self
    where
        I: IntoIterator<Item = CalendarId>,
    {
        let mut ids: Vec<CalendarId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            ids.push(calendars.root());
        }
        Self {
            calendars,
            ids,
            max_scan_days: i64::from(max_scan_days.max(1)),
        }
    }

    pub fn calendar_ids(&self) -> &[CalendarId] {
        &self.ids
    }

    pub fn intervals_on(&self, date: NaiveDate) -> ScheduleResult<Vec<Interval>> {
        if let [single] = self.ids.as_slice() {
            return self.calendars.intervals_for_date(*single, date);
        }
        let mut all = Vec::new();
        for id in &self.ids {
            all.extend(self.calendars.intervals_for_date(*id, date)?);
        }
        Ok(normalize_intervals(all))
    }

    fn absolute_on(&self, day: TimeValue) -> ScheduleResult<Vec<(TimeValue, TimeValue)>> {
        Ok(self
            .intervals_on(day.date())?
            .iter()
            .map(|interval| interval.get_absolute(day))
            .collect())
    }

    fn day_after(day: TimeValue, k: i64) -> Option<TimeValue> {
        TimeValue::new(day.seconds() + k * SECONDS_PER_DAY)
    }

    fn day_before(day: TimeValue, k: i64) -> Option<TimeValue> {
        TimeValue::new(day.seconds() - k * SECONDS_PER_DAY)
    }

    /// First working instant at or after `t`.
    pub fn next_working_instant(&self, t: TimeValue) -> ScheduleResult<TimeValue> {
        let midnight = t.day_start();
        for k in 0..=self.max_scan_days {
            let Some(day) = Self::day_after(midnight, k) else {
                break;
            };
            for (start, end) in self.absolute_on(day)? {
                if end > t {
                    return Ok(start.max(t));
                }
            }
        }
        warn!(time = %t, calendars = ?self.ids, "no working time found after instant");
        Ok(t)
    }

    /// Latest working instant at or before `t`; the end of an interval counts.
    pub fn prev_working_instant(&self, t: TimeValue) -> ScheduleResult<TimeValue> {
        let midnight = t.day_start();
        for k in 0..=self.max_scan_days {
            let Some(day) = Self::day_before(midnight, k) else {
                break;
            };
            for (start, end) in self.absolute_on(day)?.into_iter().rev() {
                if start < t {
                    return Ok(end.min(t));
                }
            }
        }
        warn!(time = %t, calendars = ?self.ids, "no working time found before instant");
        Ok(t)
    }

    /// Instant at which `seconds` of working time starting at `start` are consumed.
    pub fn add_working_time(&self, start: TimeValue, seconds: i64) -> ScheduleResult<TimeValue> {
        if seconds <= 0 {
            return Ok(start);
        }
        let mut remaining = seconds;
        let midnight = start.day_start();
        for k in 0..=self.max_scan_days {
            let Some(day) = Self::day_after(midnight, k) else {
                break;
            };
            for (from, to) in self.absolute_on(day)? {
                if to <= start {
                    continue;
                }
                let from = from.max(start);
                let available = to.seconds() - from.seconds();
                if available >= remaining {
                    return Ok(from.offset(remaining));
                }
                remaining -= available;
            }
        }
        warn!(start = %start, seconds, "working time exhausted, using wall-clock duration");
        Ok(start.offset(seconds))
    }

    /// Instant from which `seconds` of working time end exactly at `finish`.
    pub fn sub_working_time(&self, finish: TimeValue, seconds: i64) -> ScheduleResult<TimeValue> {
        if seconds <= 0 {
            return Ok(finish);
        }
        let mut remaining = seconds;
        let midnight = finish.day_start();
        for k in 0..=self.max_scan_days {
            let Some(day) = Self::day_before(midnight, k) else {
                break;
            };
            for (from, to) in self.absolute_on(day)?.into_iter().rev() {
                if from >= finish {
                    continue;
                }
                let to = to.min(finish);
                let available = to.seconds() - from.seconds();
                if available >= remaining {
                    return Ok(to.offset(-remaining));
                }
                remaining -= available;
            }
        }
        warn!(finish = %finish, seconds, "working time exhausted, using wall-clock duration");
        Ok(finish.offset(-seconds))
    }

    /// Working seconds inside `[from, to)`; zero when `to <= from`.
    pub fn working_seconds_between(&self, from: TimeValue, to: TimeValue) -> ScheduleResult<i64> {
        if to <= from {
            return Ok(0);
        }
        let days = (to.day_start().seconds() - from.day_start().seconds()) / SECONDS_PER_DAY;
        if days > self.max_scan_days {
            warn!(from = %from, to = %to, "span exceeds calendar scan bound, using wall-clock duration");
            return Ok(to.seconds() - from.seconds());
        }
        let midnight = from.day_start();
        let mut total = 0;
        for k in 0..=days {
            let Some(day) = Self::day_after(midnight, k) else {
                break;
            };
            for (start, end) in self.absolute_on(day)? {
                let start = start.max(from);
                let end = end.min(to);
                if end > start {
                    total += end.seconds() - start.seconds();
                }
            }
        }
        Ok(total)
    }
}
