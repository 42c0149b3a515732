use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::DayId;
use crate::time::{SECONDS_PER_DAY, TimeValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A working period within a day, in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: i64,
    end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> ScheduleResult<Self> {
        if start < 0 || end > SECONDS_PER_DAY || start >= end {
            return Err(ScheduleError::invalid_value(format!(
                "interval ({start}, {end}) must satisfy 0 <= start < end <= {SECONDS_PER_DAY}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Convenience for whole hours, e.g. `Interval::hours(8, 12)`.
    pub fn hours(start: u32, end: u32) -> ScheduleResult<Self> {
        Self::new(i64::from(start) * 3_600, i64::from(end) * 3_600)
    }

    pub fn full_day() -> Self {
        Self {
            start: 0,
            end: SECONDS_PER_DAY,
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Projects the interval onto the day starting at `day_start`.
    pub fn get_absolute(&self, day_start: TimeValue) -> (TimeValue, TimeValue) {
        let midnight = day_start.day_start();
        (midnight.offset(self.start), midnight.offset(self.end))
    }
}

/// Sorts intervals and merges the ones that overlap or touch.
pub fn normalize_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort();
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Work,
    Nonwork,
    UseBase,
    Custom,
}

/// A named working-time template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    id: DayId,
    name: String,
    description: String,
    kind: DayKind,
    intervals: Vec<Interval>,
}

impl Day {
    pub fn id(&self) -> DayId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> DayKind {
        self.kind
    }

    /// Default intervals; calendars may override them per day type.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn total_work(&self) -> i64 {
        self.intervals.iter().map(Interval::duration).sum()
    }
}

/// Project-wide registry of day types. Calendars reference days by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRegistry {
    days: BTreeMap<DayId, Day>,
}

impl Default for DayRegistry {
    fn default() -> Self {
        let builtins = [
            (DayId::WORK, "Working", "A default working day", DayKind::Work, vec![Interval::full_day()]),
            (DayId::NONWORK, "Nonworking", "A default non working day", DayKind::Nonwork, Vec::new()),
            (DayId::USE_BASE, "Use base", "Use day from base calendar", DayKind::UseBase, Vec::new()),
        ];
        let days = builtins
            .into_iter()
            .map(|(id, name, description, kind, intervals)| {
                (
                    id,
                    Day {
                        id,
                        name: name.to_string(),
                        description: description.to_string(),
                        kind,
                        intervals,
                    },
                )
            })
            .collect();
        Self { days }
    }
}

impl DayRegistry {
    pub fn get(&self, id: DayId) -> Option<&Day> {
        self.days.get(&id)
    }

    pub fn day(&self, id: DayId) -> ScheduleResult<&Day> {
        self.get(id).ok_or(ScheduleError::DayNotFound(id))
    }

    pub fn contains(&self, id: DayId) -> bool {
        self.days.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Day> {
        self.days.values()
    }

    pub fn find_by_name(&self, name: &str) -> Option<DayId> {
        self.days
            .values()
            .find(|day| day.name.eq_ignore_ascii_case(name))
            .map(|day| day.id)
    }

    pub(crate) fn insert_custom(
        &mut self,
        id: DayId,
        name: impl Into<String>,
        description: impl Into<String>,
        intervals: Vec<Interval>,
    ) {
        self.days.insert(
            id,
            Day {
                id,
                name: name.into(),
                description: description.into(),
                kind: DayKind::Custom,
                intervals: normalize_intervals(intervals),
            },
        );
    }

    pub(crate) fn set_intervals(&mut self, id: DayId, intervals: Vec<Interval>) -> ScheduleResult<()> {
        let day = self.days.get_mut(&id).ok_or(ScheduleError::DayNotFound(id))?;
        if day.kind != DayKind::Custom {
            return Err(ScheduleError::invalid_operation(format!(
                "builtin day type '{}' has fixed intervals",
                day.name
            )));
        }
        day.intervals = normalize_intervals(intervals);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: DayId) -> ScheduleResult<Day> {
        if id.is_builtin() {
            return Err(ScheduleError::invalid_operation(
                "builtin day types cannot be removed",
            ));
        }
        self.days.remove(&id).ok_or(ScheduleError::DayNotFound(id))
    }
}
