//! Calendar tree and day-type resolution.
//!
//! Every calendar but the root has exactly one parent. A calendar answers "which
//! day type applies on this date" by checking date overrides up its ancestry, then
//! weekday defaults up its ancestry. Entries set to [`DayId::USE_BASE`] (or never
//! set) defer to the parent, and the root always resolves to a concrete day type.

pub mod day;
pub mod working_time;

pub use day::{Day, DayKind, DayRegistry, Interval, normalize_intervals};
pub use working_time::WorkingTime;

use crate::error::{ScheduleError, ScheduleResult};
use crate::ids::{CalendarId, DayId};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Weekday index used by calendars: 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    id: CalendarId,
    name: String,
    parent: Option<CalendarId>,
    children: Vec<CalendarId>,
    default_days: [Option<DayId>; 7],
    overrides: BTreeMap<NaiveDate, DayId>,
    intervals: BTreeMap<DayId, Vec<Interval>>,
}

impl Calendar {
    fn new(id: CalendarId, name: impl Into<String>, parent: Option<CalendarId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            children: Vec::new(),
            default_days: [None; 7],
            overrides: BTreeMap::new(),
            intervals: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<CalendarId> {
        self.parent
    }

    pub fn children(&self) -> &[CalendarId] {
        &self.children
    }

    /// Locally stored weekday default; `None` behaves as `UseBase`.
    pub fn default_day(&self, weekday: Weekday) -> Option<DayId> {
        self.default_days[weekday_index(weekday)]
    }

    pub fn date_override(&self, date: NaiveDate) -> Option<DayId> {
        self.overrides.get(&date).copied()
    }

    pub fn overrides(&self) -> impl Iterator<Item = (NaiveDate, DayId)> + '_ {
        self.overrides.iter().map(|(date, day)| (*date, *day))
    }
}

/// Serializable working-week description applied to a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl CalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> ScheduleResult<Self>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(ScheduleError::invalid_value(
                "a calendar configuration requires at least one working day",
            ));
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSet {
    root: CalendarId,
    calendars: BTreeMap<CalendarId, Calendar>,
    days: DayRegistry,
}

impl CalendarSet {
    pub(crate) const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    /// Creates the tree with a root calendar working Monday to Friday.
    pub(crate) fn new(root: CalendarId) -> Self {
        let mut calendar = Calendar::new(root, "Default", None);
        for weekday in Self::ALL_WEEKDAYS {
            let day = match weekday {
                Weekday::Sat | Weekday::Sun => DayId::NONWORK,
                _ => DayId::WORK,
            };
            calendar.default_days[weekday_index(weekday)] = Some(day);
        }
        Self {
            root,
            calendars: BTreeMap::from([(root, calendar)]),
            days: DayRegistry::default(),
        }
    }

    pub fn root(&self) -> CalendarId {
        self.root
    }

    pub fn get(&self, id: CalendarId) -> Option<&Calendar> {
        self.calendars.get(&id)
    }

    pub fn calendar(&self, id: CalendarId) -> ScheduleResult<&Calendar> {
        self.get(id).ok_or(ScheduleError::CalendarNotFound(id))
    }

    fn calendar_mut(&mut self, id: CalendarId) -> ScheduleResult<&mut Calendar> {
        self.calendars
            .get_mut(&id)
            .ok_or(ScheduleError::CalendarNotFound(id))
    }

    pub fn contains(&self, id: CalendarId) -> bool {
        self.calendars.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.values()
    }

    pub fn days(&self) -> &DayRegistry {
        &self.days
    }

    pub fn find_by_name(&self, name: &str) -> Option<CalendarId> {
        self.calendars
            .values()
            .find(|calendar| calendar.name == name)
            .map(|calendar| calendar.id)
    }

    /// `id` followed by its parent, grandparent, ... up to the root.
    pub fn ancestry(&self, id: CalendarId) -> ScheduleResult<Vec<CalendarId>> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(cal_id) = current {
            chain.push(cal_id);
            current = self.calendar(cal_id)?.parent;
        }
        Ok(chain)
    }

    pub fn is_descendant(&self, candidate: CalendarId, ancestor: CalendarId) -> bool {
        self.ancestry(candidate)
            .map(|chain| chain.contains(&ancestor))
            .unwrap_or(false)
    }

    /// Resolves the day type of `date` on `calendar`.
    ///
    /// Date overrides are searched first (up the ancestry when `check_ancestors`),
    /// then weekday defaults. Without `check_ancestors` an unresolved lookup yields
    /// [`DayId::USE_BASE`].
    pub fn get_day(
        &self,
        calendar: CalendarId,
        date: NaiveDate,
        check_ancestors: bool,
    ) -> ScheduleResult<DayId> {
        let chain = if check_ancestors {
            self.ancestry(calendar)?
        } else {
            vec![self.calendar(calendar)?.id]
        };

        for id in &chain {
            if let Some(day) = self.calendars[id].date_override(date) {
                if day != DayId::USE_BASE {
                    return Ok(day);
                }
            }
        }

        let weekday = date.weekday();
        for id in &chain {
            if let Some(day) = self.calendars[id].default_day(weekday) {
                if day != DayId::USE_BASE {
                    return Ok(day);
                }
            }
        }

        if check_ancestors {
            Err(ScheduleError::NoDefaultCalendar { calendar, date })
        } else {
            Ok(DayId::USE_BASE)
        }
    }

    /// Working intervals of `day` as seen from `calendar`.
    ///
    /// A calendar-level override wins, then (with `check_ancestors`) the nearest
    /// ancestor override, then the day type's own intervals.
    ///
    /// [`DayId::USE_BASE`] carries no intervals and overrides cannot be set for it,
    /// so the ancestor walk always ends at `[]`. Resolve a date with
    /// [`CalendarSet::get_day`] first to get the inherited day type.
    pub fn day_get_intervals(
        &self,
        calendar: CalendarId,
        day: DayId,
        check_ancestors: bool,
    ) -> ScheduleResult<Vec<Interval>> {
        let template = self.days.day(day)?;
        if day == DayId::NONWORK {
            return Ok(Vec::new());
        }
        let chain = if check_ancestors {
            self.ancestry(calendar)?
        } else {
            vec![self.calendar(calendar)?.id]
        };
        for id in chain {
            if let Some(intervals) = self.calendars[&id].intervals.get(&day) {
                return Ok(intervals.clone());
            }
        }
        Ok(template.intervals().to_vec())
    }

    pub fn day_get_total_work(
        &self,
        calendar: CalendarId,
        day: DayId,
        check_ancestors: bool,
    ) -> ScheduleResult<i64> {
        Ok(self
            .day_get_intervals(calendar, day, check_ancestors)?
            .iter()
            .map(Interval::duration)
            .sum())
    }

    /// Working intervals that apply on `date`.
    pub fn intervals_for_date(
        &self,
        calendar: CalendarId,
        date: NaiveDate,
    ) -> ScheduleResult<Vec<Interval>> {
        let day = self.get_day(calendar, date, true)?;
        self.day_get_intervals(calendar, day, true)
    }

    /// Check if a date has any working time
    pub fn is_working_day(&self, calendar: CalendarId, date: NaiveDate) -> ScheduleResult<bool> {
        Ok(!self.intervals_for_date(calendar, date)?.is_empty())
    }

    fn resolved_default_day(&self, calendar: CalendarId, weekday: Weekday) -> ScheduleResult<DayId> {
        for id in self.ancestry(calendar)? {
            if let Some(day) = self.calendars[&id].default_day(weekday) {
                if day != DayId::USE_BASE {
                    return Ok(day);
                }
            }
        }
        Err(ScheduleError::invalid_operation(format!(
            "calendar {calendar} has no concrete default for {weekday}"
        )))
    }

    fn ensure_day(&self, day: DayId) -> ScheduleResult<()> {
        if self.days.contains(day) {
            Ok(())
        } else {
            Err(ScheduleError::DayNotFound(day))
        }
    }

    pub(crate) fn set_default_day(
        &mut self,
        calendar: CalendarId,
        weekday: Weekday,
        day: DayId,
    ) -> ScheduleResult<()> {
        self.ensure_day(day)?;
        if calendar == self.root && day == DayId::USE_BASE {
            return Err(ScheduleError::invalid_operation(
                "the root calendar cannot defer a weekday to a base calendar",
            ));
        }
        let entry = &mut self.calendar_mut(calendar)?.default_days[weekday_index(weekday)];
        *entry = (day != DayId::USE_BASE).then_some(day);
        Ok(())
    }

    pub(crate) fn set_date_override(
        &mut self,
        calendar: CalendarId,
        date: NaiveDate,
        day: DayId,
    ) -> ScheduleResult<()> {
        self.ensure_day(day)?;
        let cal = self.calendar_mut(calendar)?;
        if day == DayId::USE_BASE {
            cal.overrides.remove(&date);
        } else {
            cal.overrides.insert(date, day);
        }
        Ok(())
    }

    pub(crate) fn clear_date_override(
        &mut self,
        calendar: CalendarId,
        date: NaiveDate,
    ) -> ScheduleResult<bool> {
        Ok(self.calendar_mut(calendar)?.overrides.remove(&date).is_some())
    }

    pub(crate) fn set_day_intervals(
        &mut self,
        calendar: CalendarId,
        day: DayId,
        intervals: Vec<Interval>,
    ) -> ScheduleResult<()> {
        self.ensure_day(day)?;
        if day == DayId::NONWORK || day == DayId::USE_BASE {
            return Err(ScheduleError::invalid_operation(
                "intervals can only be set for working day types",
            ));
        }
        self.calendar_mut(calendar)?
            .intervals
            .insert(day, normalize_intervals(intervals));
        Ok(())
    }

    pub(crate) fn rename(&mut self, calendar: CalendarId, name: impl Into<String>) -> ScheduleResult<()> {
        self.calendar_mut(calendar)?.name = name.into();
        Ok(())
    }

    /// Adds an empty child of `parent`; every day resolves through the parent.
    pub(crate) fn derive(
        &mut self,
        id: CalendarId,
        name: impl Into<String>,
        parent: CalendarId,
    ) -> ScheduleResult<()> {
        self.calendar_mut(parent)?.children.push(id);
        self.calendars.insert(id, Calendar::new(id, name, Some(parent)));
        Ok(())
    }

    /// Adds a top-level calendar that behaves like `source` without inheriting from it.
    pub(crate) fn copy(
        &mut self,
        id: CalendarId,
        name: impl Into<String>,
        source: CalendarId,
    ) -> ScheduleResult<()> {
        let chain = self.ancestry(source)?;
        let mut copy = Calendar::new(id, name, Some(self.root));

        for weekday in Self::ALL_WEEKDAYS {
            copy.default_days[weekday_index(weekday)] =
                Some(self.resolved_default_day(source, weekday)?);
        }

        let dates: BTreeSet<NaiveDate> = chain
            .iter()
            .flat_map(|cal_id| self.calendars[cal_id].overrides.keys().copied())
            .collect();
        for date in dates {
            let day = self.get_day(source, date, true)?;
            copy.overrides.insert(date, day);
        }

        // Nearest override wins, so walk from the root down.
        for cal_id in chain.iter().rev() {
            for (day, intervals) in &self.calendars[cal_id].intervals {
                copy.intervals.insert(*day, intervals.clone());
            }
        }

        self.calendar_mut(self.root)?.children.push(id);
        self.calendars.insert(id, copy);
        Ok(())
    }

    pub(crate) fn reparent(&mut self, calendar: CalendarId, new_parent: CalendarId) -> ScheduleResult<()> {
        if calendar == self.root {
            return Err(ScheduleError::invalid_operation(
                "the root calendar cannot be reparented",
            ));
        }
        self.calendar(new_parent)?;
        if self.is_descendant(new_parent, calendar) {
            return Err(ScheduleError::invalid_operation(format!(
                "calendar {new_parent} is inside the subtree of {calendar}"
            )));
        }
        let old_parent = self.calendar(calendar)?.parent;
        if let Some(old) = old_parent {
            self.calendar_mut(old)?.children.retain(|child| *child != calendar);
        }
        self.calendar_mut(new_parent)?.children.push(calendar);
        self.calendar_mut(calendar)?.parent = Some(new_parent);
        Ok(())
    }

    /// Detaches `calendar`, promoting its children to its parent.
    pub(crate) fn remove(&mut self, calendar: CalendarId) -> ScheduleResult<Calendar> {
        if calendar == self.root {
            return Err(ScheduleError::invalid_operation(
                "the root calendar cannot be removed",
            ));
        }
        let removed = self
            .calendars
            .remove(&calendar)
            .ok_or(ScheduleError::CalendarNotFound(calendar))?;
        let parent = removed.parent.unwrap_or(self.root);
        for child in &removed.children {
            if let Some(child_cal) = self.calendars.get_mut(child) {
                child_cal.parent = Some(parent);
            }
        }
        let parent_cal = self.calendar_mut(parent)?;
        parent_cal.children.retain(|child| *child != calendar);
        parent_cal.children.extend(removed.children.iter().copied());
        Ok(removed)
    }

    /// Add a single holiday
    pub(crate) fn add_holiday(&mut self, calendar: CalendarId, date: NaiveDate) -> ScheduleResult<()> {
        self.set_date_override(calendar, date, DayId::NONWORK)
    }

    /// Add the same holiday for a range of years, e.g. Dec 24 for 2025-2030
    pub(crate) fn add_recurring_holiday(
        &mut self,
        calendar: CalendarId,
        month: u32,
        day: u32,
        start_year: i32,
        end_year: i32,
    ) -> ScheduleResult<()> {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.add_holiday(calendar, date)?;
            }
        }
        Ok(())
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub(crate) fn set_working_weekdays(&mut self, calendar: CalendarId, days: &[Weekday]) -> ScheduleResult<()> {
        for weekday in Self::ALL_WEEKDAYS {
            let day = if days.contains(&weekday) {
                DayId::WORK
            } else {
                DayId::NONWORK
            };
            self.set_default_day(calendar, weekday, day)?;
        }
        Ok(())
    }

    pub(crate) fn apply_config(&mut self, calendar: CalendarId, config: &CalendarConfig) -> ScheduleResult<()> {
        self.set_working_weekdays(calendar, config.working_days())?;
        for date in config.holidays() {
            self.add_holiday(calendar, *date)?;
        }
        Ok(())
    }

    pub(crate) fn add_day(
        &mut self,
        id: DayId,
        name: impl Into<String>,
        description: impl Into<String>,
        intervals: Vec<Interval>,
    ) {
        self.days.insert_custom(id, name, description, intervals);
    }

    pub(crate) fn set_day_type_intervals(&mut self, day: DayId, intervals: Vec<Interval>) -> ScheduleResult<()> {
        self.days.set_intervals(day, intervals)
    }

    /// Removes a custom day type and every calendar entry referring to it.
    /// Returns the calendars whose resolution changed.
    pub(crate) fn remove_day(&mut self, day: DayId) -> ScheduleResult<Vec<CalendarId>> {
        self.days.remove(day)?;
        let root = self.root;
        let mut affected = Vec::new();
        for calendar in self.calendars.values_mut() {
            let mut touched = false;
            for slot in calendar.default_days.iter_mut() {
                if *slot == Some(day) {
                    *slot = if calendar.id == root {
                        Some(DayId::NONWORK)
                    } else {
                        None
                    };
                    touched = true;
                }
            }
            let before = calendar.overrides.len();
            calendar.overrides.retain(|_, entry| *entry != day);
            touched |= before != calendar.overrides.len();
            touched |= calendar.intervals.remove(&day).is_some();
            if touched {
                affected.push(calendar.id);
            }
        }
        Ok(affected)
    }
}
