//! Timetable API payload parsing.
//!
//! The API returns `{"schedules": {"<weekday label>": [lesson, ...]}}` with
//! loosely typed lesson objects. Lessons are checked one by one: a lesson
//! missing its subject, type or times is skipped with a warning and the rest
//! of the payload survives. Date and week fields of the wrong JSON type never
//! drop a lesson; they are kept as malformed literals so matching fails open.

use crate::types::{LessonRecord, WeeklySchedule};
use crate::weekday::WeekdayName;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Top-level payload; everything except `schedules` is ignored
#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    schedules: Option<HashMap<String, Option<Vec<Value>>>>,
}

/// Lesson object as published by the API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLesson {
    subject_full_name: Option<String>,
    lesson_type_abbrev: Option<String>,
    start_lesson_time: Option<String>,
    end_lesson_time: Option<String>,
    #[serde(default)]
    auditories: Option<Vec<String>>,
    #[serde(default)]
    date_lesson: Option<Value>,
    #[serde(default)]
    start_lesson_date: Option<Value>,
    #[serde(default)]
    end_lesson_date: Option<Value>,
    #[serde(default)]
    week_number: Option<Value>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InvalidRecord(format!("missing {}", field))),
    }
}

/// Date field as a literal; non-string values keep their JSON text
fn date_literal(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Week list; anything that is not a list of integers drops the constraint
fn week_numbers(value: Option<Value>, subject: &str) -> BTreeSet<i64> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return BTreeSet::new();
    };

    let weeks = match &value {
        Value::Array(items) => items.iter().map(Value::as_i64).collect::<Option<BTreeSet<_>>>(),
        _ => None,
    };

    weeks.unwrap_or_else(|| {
        tracing::warn!(
            subject = %subject,
            field = "weekNumber",
            literal = %value,
            "Malformed week list, ignoring week constraint"
        );
        BTreeSet::new()
    })
}

impl TryFrom<RawLesson> for LessonRecord {
    type Error = Error;

    fn try_from(raw: RawLesson) -> Result<Self> {
        let subject = required(raw.subject_full_name, "subjectFullName")?;
        let week_numbers = week_numbers(raw.week_number, &subject);

        Ok(LessonRecord {
            lesson_type: required(raw.lesson_type_abbrev, "lessonTypeAbbrev")?,
            start_time: required(raw.start_lesson_time, "startLessonTime")?,
            end_time: required(raw.end_lesson_time, "endLessonTime")?,
            auditoriums: raw.auditories.unwrap_or_default(),
            single_date: date_literal(raw.date_lesson),
            date_range_start: date_literal(raw.start_lesson_date),
            date_range_end: date_literal(raw.end_lesson_date),
            week_numbers,
            subject,
        })
    }
}

/// Parse a payload body into a weekly schedule
pub fn parse_weekly_schedule(body: &str) -> Result<WeeklySchedule> {
    let value: Value = serde_json::from_str(body)?;
    weekly_schedule_from_value(value)
}

/// Build a weekly schedule from an already decoded payload
pub fn weekly_schedule_from_value(value: Value) -> Result<WeeklySchedule> {
    let payload: RawPayload = serde_json::from_value(value)?;
    let mut schedule = WeeklySchedule::default();

    let Some(buckets) = payload.schedules else {
        tracing::debug!("Payload has no schedules map");
        return Ok(schedule);
    };

    for (label, lessons) in buckets {
        let Some(name) = WeekdayName::from_label(&label) else {
            tracing::warn!(label = %label, "Ignoring unknown weekday bucket");
            continue;
        };

        let mut records = Vec::new();
        for (idx, lesson) in lessons.unwrap_or_default().into_iter().enumerate() {
            match parse_lesson(lesson) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(bucket = %label, index = idx, "Skipping lesson: {}", e);
                }
            }
        }

        schedule.days.insert(name.weekday(), records);
    }

    tracing::debug!(
        "Parsed {} lessons across {} weekday buckets",
        schedule.lesson_count(),
        schedule.days.len()
    );
    Ok(schedule)
}

fn parse_lesson(value: Value) -> Result<LessonRecord> {
    let raw: RawLesson = serde_json::from_value(value)?;
    LessonRecord::try_from(raw)
}
