//! Lesson date applicability.
//!
//! Decides whether a lesson from a weekday bucket actually takes place on a
//! specific calendar date.
//!
//! ## Precedence
//!
//! 1. **Week numbers**: a non-empty week list vetoes dates outside those
//!    semester weeks, then evaluation continues
//! 2. **Exact date**: the lesson applies only on that date
//! 3. **Date range**: the lesson applies between both ends, inclusive
//! 4. **Default**: no constraint, the lesson always applies
//!
//! A malformed date literal makes the lesson applicable (fail open). Showing a
//! stray lesson is recoverable for the reader, silently hiding a real one is
//! not. Every such case is reported through a `warn` event.

use crate::types::{LessonRecord, LESSON_DATE_FORMAT};
use chrono::NaiveDate;

/// A lesson date field that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {field} literal {literal:?}")]
pub struct MalformedDateLiteral {
    pub field: &'static str,
    pub literal: String,
}

/// 1-based semester week that `date` falls into.
///
/// Dates before the semester start yield week 0 or below.
pub fn semester_week(semester_start: NaiveDate, date: NaiveDate) -> i64 {
    (date - semester_start).num_days().div_euclid(7) + 1
}

/// Whether `lesson` takes place on `target`, failing open on bad dates
pub fn applies(lesson: &LessonRecord, target: NaiveDate, semester_start: NaiveDate) -> bool {
    match check(lesson, target, semester_start) {
        Ok(applicable) => applicable,
        Err(malformed) => {
            tracing::warn!(
                subject = %lesson.subject,
                field = malformed.field,
                literal = %malformed.literal,
                target = %target,
                "Malformed lesson date, treating lesson as applicable"
            );
            true
        }
    }
}

/// Strict form of [`applies`] that reports malformed literals
pub fn check(
    lesson: &LessonRecord,
    target: NaiveDate,
    semester_start: NaiveDate,
) -> Result<bool, MalformedDateLiteral> {
    if !lesson.week_numbers.is_empty() {
        let week = semester_week(semester_start, target);
        if !lesson.week_numbers.contains(&week) {
            return Ok(false);
        }
    }

    if let Some(single) = parse_field("single_date", lesson.single_date.as_deref())? {
        return Ok(single == target);
    }

    let start = non_empty(lesson.date_range_start.as_deref());
    let end = non_empty(lesson.date_range_end.as_deref());
    if let (Some(start), Some(end)) = (start, end) {
        let start = parse_date("date_range_start", start)?;
        let end = parse_date("date_range_end", end)?;
        return Ok(start <= target && target <= end);
    }

    Ok(true)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_field(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, MalformedDateLiteral> {
    non_empty(value).map(|v| parse_date(field, v)).transpose()
}

fn parse_date(field: &'static str, literal: &str) -> Result<NaiveDate, MalformedDateLiteral> {
    NaiveDate::parse_from_str(literal, LESSON_DATE_FORMAT).map_err(|_| MalformedDateLiteral {
        field,
        literal: literal.to_string(),
    })
}
