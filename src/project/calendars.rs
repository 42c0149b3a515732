use super::Project;
use crate::calendar::{CalendarConfig, Interval};
use crate::error::{ScheduleError, ScheduleResult};
use crate::events::ProjectEvent;
use crate::ids::{CalendarId, DayId, EntityRef};
use chrono::{NaiveDate, Weekday};
use tracing::info;

impl Project {
    fn calendar_changed(&mut self, calendar: CalendarId) -> ScheduleResult<()> {
        self.emit(ProjectEvent::CalendarChanged { calendar });
        self.schedule_changed(None)
    }

    // A new calendar has no users yet, so the schedule is unaffected.
    fn calendar_created(&mut self, calendar: CalendarId) {
        self.emit(ProjectEvent::CalendarChanged { calendar });
        self.mark_dirty();
    }

    pub fn get_day(&self, calendar: CalendarId, date: NaiveDate, check_ancestors: bool) -> ScheduleResult<DayId> {
        self.calendars.get_day(calendar, date, check_ancestors)
    }

    pub fn day_get_intervals(
        &self,
        calendar: CalendarId,
        day: DayId,
        check_ancestors: bool,
    ) -> ScheduleResult<Vec<Interval>> {
        self.calendars.day_get_intervals(calendar, day, check_ancestors)
    }

    pub fn day_get_total_work(&self, calendar: CalendarId, day: DayId, check_ancestors: bool) -> ScheduleResult<i64> {
        self.calendars.day_get_total_work(calendar, day, check_ancestors)
    }

    pub fn set_project_calendar(&mut self, calendar: CalendarId) -> ScheduleResult<()> {
        self.calendars.calendar(calendar)?;
        self.calendar = calendar;
        self.calendar_changed(calendar)
    }

    /// New calendar whose unset days resolve through `parent`.
    pub fn derive_calendar(&mut self, name: impl Into<String>, parent: CalendarId) -> ScheduleResult<CalendarId> {
        self.calendars.calendar(parent)?;
        let id = self.ids.calendar();
        self.calendars.derive(id, name, parent)?;
        self.calendar_created(id);
        Ok(id)
    }

    /// New top-level calendar resolving every date like `source` does today.
    pub fn copy_calendar(&mut self, name: impl Into<String>, source: CalendarId) -> ScheduleResult<CalendarId> {
        self.calendars.calendar(source)?;
        let id = self.ids.calendar();
        self.calendars.copy(id, name, source)?;
        self.calendar_created(id);
        Ok(id)
    }

    pub fn rename_calendar(&mut self, calendar: CalendarId, name: impl Into<String>) -> ScheduleResult<()> {
        self.calendars.rename(calendar, name)?;
        self.emit(ProjectEvent::CalendarChanged { calendar });
        self.mark_dirty();
        Ok(())
    }

    pub fn reparent_calendar(&mut self, calendar: CalendarId, new_parent: CalendarId) -> ScheduleResult<()> {
        self.calendars.reparent(calendar, new_parent)?;
        self.calendar_changed(calendar)
    }

    /// Removes a calendar. Its children move to its parent, resources using it
    /// fall back to the project calendar, and a project calendar falls back to the parent.
    pub fn remove_calendar(&mut self, calendar: CalendarId) -> ScheduleResult<()> {
        let removed = self.calendars.remove(calendar)?;
        let parent = removed.parent().unwrap_or(self.calendars.root());

        let mut orphaned = Vec::new();
        for resource in self.resources.values_mut() {
            if resource.calendar == Some(calendar) {
                resource.calendar = None;
                orphaned.push(resource.id);
            }
        }
        for resource in orphaned {
            self.emit(ProjectEvent::ResourceFieldChanged {
                resource,
                field: "calendar",
            });
        }
        if self.calendar == calendar {
            self.calendar = parent;
        }

        self.emit(ProjectEvent::Removed(EntityRef::Calendar(calendar)));
        self.ids.release(EntityRef::Calendar(calendar));
        info!(%calendar, %parent, "calendar removed");
        self.calendar_changed(parent)
    }

    pub fn set_default_day(&mut self, calendar: CalendarId, weekday: Weekday, day: DayId) -> ScheduleResult<()> {
        self.calendars.set_default_day(calendar, weekday, day)?;
        self.calendar_changed(calendar)
    }

    pub fn set_date_override(&mut self, calendar: CalendarId, date: NaiveDate, day: DayId) -> ScheduleResult<()> {
        self.calendars.set_date_override(calendar, date, day)?;
        self.calendar_changed(calendar)
    }

    pub fn clear_date_override(&mut self, calendar: CalendarId, date: NaiveDate) -> ScheduleResult<bool> {
        let cleared = self.calendars.clear_date_override(calendar, date)?;
        if cleared {
            self.calendar_changed(calendar)?;
        }
        Ok(cleared)
    }

    /// Overrides the working intervals of `day` as seen from `calendar` and its descendants.
    pub fn set_day_intervals(
        &mut self,
        calendar: CalendarId,
        day: DayId,
        intervals: Vec<Interval>,
    ) -> ScheduleResult<()> {
        self.calendars.set_day_intervals(calendar, day, intervals)?;
        self.calendar_changed(calendar)
    }

    pub fn add_holiday(&mut self, calendar: CalendarId, date: NaiveDate) -> ScheduleResult<()> {
        self.calendars.add_holiday(calendar, date)?;
        self.calendar_changed(calendar)
    }

    pub fn add_recurring_holiday(
        &mut self,
        calendar: CalendarId,
        month: u32,
        day: u32,
        start_year: i32,
        end_year: i32,
    ) -> ScheduleResult<()> {
        self.calendars
            .add_recurring_holiday(calendar, month, day, start_year, end_year)?;
        self.calendar_changed(calendar)
    }

    pub fn set_working_weekdays(&mut self, calendar: CalendarId, days: &[Weekday]) -> ScheduleResult<()> {
        self.calendars.set_working_weekdays(calendar, days)?;
        self.calendar_changed(calendar)
    }

    pub fn apply_calendar_config(&mut self, calendar: CalendarId, config: &CalendarConfig) -> ScheduleResult<()> {
        self.calendars.apply_config(calendar, config)?;
        self.calendar_changed(calendar)
    }

    /// Registers a custom day type with default `intervals`.
    pub fn add_day_type(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        intervals: Vec<Interval>,
    ) -> ScheduleResult<DayId> {
        let name = name.into();
        if self.calendars.days().find_by_name(&name).is_some() {
            return Err(ScheduleError::invalid_value(format!(
                "a day type named '{name}' already exists"
            )));
        }
        let id = self.ids.day();
        self.calendars.add_day(id, name, description, intervals);
        self.mark_dirty();
        Ok(id)
    }

    pub fn set_day_type_intervals(&mut self, day: DayId, intervals: Vec<Interval>) -> ScheduleResult<()> {
        self.calendars.set_day_type_intervals(day, intervals)?;
        let root = self.calendars.root();
        self.calendar_changed(root)
    }

    /// Removes a custom day type; calendar entries using it fall back to their base.
    pub fn remove_day_type(&mut self, day: DayId) -> ScheduleResult<()> {
        let affected = self.calendars.remove_day(day)?;
        self.emit(ProjectEvent::Removed(EntityRef::Day(day)));
        self.ids.release(EntityRef::Day(day));
        for calendar in &affected {
            self.emit(ProjectEvent::CalendarChanged { calendar: *calendar });
        }
        self.schedule_changed(None)
    }
}
