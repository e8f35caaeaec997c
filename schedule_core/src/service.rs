//! Day schedule service.
//!
//! Ties local group records, the timetable source and the resolver together.

use crate::applicability::semester_week;
use crate::resolver::resolve_day;
use crate::source::ScheduleSource;
use crate::store::RecordStore;
use crate::types::{DaySchedule, TargetQuery};
use crate::weekday::localize;
use crate::{Error, Result};
use chrono::NaiveDate;

/// Parse a caller-supplied ISO `YYYY-MM-DD` date
pub fn parse_target_date(literal: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(literal.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidDate(format!("{:?}: {}", literal, e)))
}

pub struct ScheduleService<S> {
    store: RecordStore,
    source: S,
    semester_start: NaiveDate,
}

impl<S: ScheduleSource> ScheduleService<S> {
    pub fn new(store: RecordStore, source: S, semester_start: NaiveDate) -> Self {
        Self {
            store,
            source,
            semester_start,
        }
    }

    /// Lessons a locally known group has on `date`
    pub fn day_schedule(&self, group_number: &str, date: &str) -> Result<DaySchedule> {
        let group = self.store.find_group_by_number(group_number)?;
        let date = parse_target_date(date)?;

        let weekly = self.source.fetch(group_number)?;
        if weekly.is_empty() {
            tracing::info!(group = group_number, "No schedules found in timetable payload");
        }

        let query = TargetQuery {
            group: group_number.to_string(),
            date,
        };
        let weekday = localize(date);
        let lessons = resolve_day(&weekly, &query, self.semester_start);

        tracing::info!(
            group = group_number,
            date = %date,
            weekday = %weekday,
            "Found {} lessons",
            lessons.len()
        );

        Ok(DaySchedule {
            group_id: group.id,
            group_number: group.group_number,
            date,
            weekday,
            week: semester_week(self.semester_start, date),
            lessons,
        })
    }
}
