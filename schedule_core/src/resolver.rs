//! Per-day schedule resolution.
//!
//! Picks the weekday bucket for the target date and keeps the lessons that
//! apply on that exact date, in source order.

use crate::applicability::applies;
use crate::types::{ScheduleEntry, TargetQuery, WeeklySchedule};
use crate::weekday::localize;
use chrono::NaiveDate;

/// Resolve the lessons a group has on the queried date.
///
/// Returns an empty list when the source has no bucket for that weekday.
pub fn resolve_day(
    schedule: &WeeklySchedule,
    query: &TargetQuery,
    semester_start: NaiveDate,
) -> Vec<ScheduleEntry> {
    let weekday = localize(query.date);

    let Some(lessons) = schedule.bucket(weekday.weekday()) else {
        tracing::debug!(
            group = %query.group,
            weekday = %weekday,
            "No lessons bucket for weekday"
        );
        return Vec::new();
    };

    lessons
        .iter()
        .filter(|lesson| {
            let keep = applies(lesson, query.date, semester_start);
            if !keep {
                tracing::debug!(
                    group = %query.group,
                    subject = %lesson.subject,
                    "Lesson skipped due to date/week mismatch"
                );
            }
            keep
        })
        .map(|lesson| ScheduleEntry::project(lesson, &query.group))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LessonRecord;
    use chrono::Weekday;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lesson(subject: &str) -> LessonRecord {
        LessonRecord {
            subject: subject.into(),
            lesson_type: "ПЗ".into(),
            start_time: "10:35".into(),
            end_time: "11:55".into(),
            auditoriums: vec![],
            single_date: None,
            date_range_start: None,
            date_range_end: None,
            week_numbers: BTreeSet::new(),
        }
    }

    fn query(d: NaiveDate) -> TargetQuery {
        TargetQuery {
            group: "221701".into(),
            date: d,
        }
    }

    #[test]
    fn test_keeps_applicable_lessons_in_order() {
        // 2025-03-10 is a Monday
        let today = date(2025, 3, 10);
        let always_on = lesson("Физика");
        let past_window = LessonRecord {
            date_range_start: Some("10.02.2025".into()),
            date_range_end: Some("24.02.2025".into()),
            ..lesson("Химия")
        };
        let exact_today = LessonRecord {
            single_date: Some("10.03.2025".into()),
            ..lesson("Консультация")
        };

        let mut schedule = WeeklySchedule::default();
        schedule
            .days
            .insert(Weekday::Mon, vec![always_on, past_window, exact_today]);

        let entries = resolve_day(&schedule, &query(today), date(2025, 2, 9));
        let subjects: Vec<_> = entries.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Физика", "Консультация"]);
        assert!(entries.iter().all(|e| e.group == "221701"));
        assert_eq!(entries[0].auditorium, "");
        assert_eq!(entries[0].time, "10:35-11:55");
    }

    #[test]
    fn test_only_matching_weekday_bucket_is_scanned() {
        let mut schedule = WeeklySchedule::default();
        schedule.days.insert(Weekday::Tue, vec![lesson("Физика")]);

        let monday = resolve_day(&schedule, &query(date(2025, 3, 10)), date(2025, 2, 9));
        assert!(monday.is_empty());

        let tuesday = resolve_day(&schedule, &query(date(2025, 3, 11)), date(2025, 2, 9));
        assert_eq!(tuesday.len(), 1);
    }

    #[test]
    fn test_empty_schedule_resolves_to_nothing() {
        let entries = resolve_day(
            &WeeklySchedule::default(),
            &query(date(2025, 3, 16)),
            date(2025, 2, 9),
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn test_every_lesson_filtered_out() {
        let mut schedule = WeeklySchedule::default();
        schedule.days.insert(
            Weekday::Mon,
            vec![LessonRecord {
                week_numbers: [2].into_iter().collect(),
                ..lesson("Физика")
            }],
        );

        // 2025-03-10 is week 5
        let entries = resolve_day(&schedule, &query(date(2025, 3, 10)), date(2025, 2, 9));
        assert!(entries.is_empty());
    }
}
