//! Core domain types for the group schedule system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Lesson records parsed from the external timetable API
//! - Weekly schedules bucketed by weekday
//! - Resolved per-day schedule projections
//! - Locally persisted groups and stored schedules

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::weekday::WeekdayName;

/// Date format used by lesson date literals in the timetable payload
pub const LESSON_DATE_FORMAT: &str = "%d.%m.%Y";

// ============================================================================
// Lesson Types
// ============================================================================

/// One lesson definition as published by the timetable API.
///
/// Date constraints are kept as the source's `dd.MM.yyyy` literals and parsed
/// when matched, so that one malformed field never drops the whole record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonRecord {
    pub subject: String,
    pub lesson_type: String,
    pub start_time: String,
    pub end_time: String,
    pub auditoriums: Vec<String>,
    pub single_date: Option<String>,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub week_numbers: BTreeSet<i64>,
}

impl LessonRecord {
    /// Authoritative room: first listed auditorium, or empty
    pub fn auditorium(&self) -> &str {
        self.auditoriums.first().map(String::as_str).unwrap_or("")
    }

    /// Clock range rendered as `start-end`
    pub fn time_range(&self) -> String {
        format!("{}-{}", self.start_time, self.end_time)
    }
}

/// A group's timetable keyed by weekday
#[derive(Clone, Debug, Default)]
pub struct WeeklySchedule {
    pub days: HashMap<Weekday, Vec<LessonRecord>>,
}

impl WeeklySchedule {
    /// Lessons in the bucket for `weekday`, if the source had one
    pub fn bucket(&self, weekday: Weekday) -> Option<&[LessonRecord]> {
        self.days.get(&weekday).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    /// Total number of lessons across all buckets
    pub fn lesson_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Resolution Types
// ============================================================================

/// The resolution unit: which group, on which date
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetQuery {
    pub group: String,
    pub date: NaiveDate,
}

/// A lesson that applies on the queried date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub subject: String,
    pub lesson_type: String,
    pub time: String,
    pub auditorium: String,
    pub group: String,
}

impl ScheduleEntry {
    pub fn project(lesson: &LessonRecord, group: &str) -> Self {
        Self {
            subject: lesson.subject.clone(),
            lesson_type: lesson.lesson_type.clone(),
            time: lesson.time_range(),
            auditorium: lesson.auditorium().to_string(),
            group: group.to_string(),
        }
    }
}

/// A group's resolved schedule for one date
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaySchedule {
    pub group_id: u64,
    pub group_number: String,
    pub date: NaiveDate,
    pub weekday: WeekdayName,
    pub week: i64,
    pub lessons: Vec<ScheduleEntry>,
}

// ============================================================================
// Local Record Types
// ============================================================================

/// A student group mirrored locally
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: u64,
    pub group_number: String,
}

/// A schedule entry persisted against a local group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSchedule {
    pub id: u64,
    pub subject: String,
    pub lesson_type: String,
    pub time: String,
    pub auditorium: String,
    pub group_id: u64,
}

/// Fields supplied when creating or updating a stored schedule
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub subject: String,
    pub lesson_type: String,
    pub time: String,
    pub auditorium: String,
    pub group_id: u64,
}

/// A group together with its stored schedules
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupView {
    pub id: u64,
    pub group_number: String,
    pub schedules: Vec<StoredSchedule>,
}
