//! Weekday localization.
//!
//! The timetable API buckets lessons under Russian weekday names. This module
//! owns the fixed table between ISO weekdays and those bucket labels.

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Bucket labels in ISO order, Monday first
static WEEKDAY_LABELS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Понедельник"),
    (Weekday::Tue, "Вторник"),
    (Weekday::Wed, "Среда"),
    (Weekday::Thu, "Четверг"),
    (Weekday::Fri, "Пятница"),
    (Weekday::Sat, "Суббота"),
    (Weekday::Sun, "Воскресенье"),
];

static WEEKDAY_BY_LABEL: Lazy<HashMap<&'static str, Weekday>> = Lazy::new(|| {
    WEEKDAY_LABELS
        .iter()
        .map(|&(weekday, label)| (label, weekday))
        .collect()
});

/// Localized name of a weekday, as used for the source's bucket keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WeekdayName(Weekday);

impl WeekdayName {
    pub fn new(weekday: Weekday) -> Self {
        Self(weekday)
    }

    /// Reverse lookup of a bucket key; exact match only
    pub fn from_label(label: &str) -> Option<Self> {
        WEEKDAY_BY_LABEL.get(label).copied().map(Self)
    }

    pub fn weekday(self) -> Weekday {
        self.0
    }

    pub fn label(self) -> &'static str {
        // Table is indexed by days-from-Monday, so this never misses
        WEEKDAY_LABELS[self.0.num_days_from_monday() as usize].1
    }
}

impl fmt::Display for WeekdayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<WeekdayName> for String {
    fn from(name: WeekdayName) -> Self {
        name.label().to_string()
    }
}

impl TryFrom<String> for WeekdayName {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Self::from_label(&label).ok_or_else(|| format!("unknown weekday label: {}", label))
    }
}

/// Localized weekday name for a calendar date
pub fn localize(date: NaiveDate) -> WeekdayName {
    WeekdayName(date.weekday())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_table_is_in_iso_order() {
        for (idx, (weekday, _)) in WEEKDAY_LABELS.iter().enumerate() {
            assert_eq!(weekday.num_days_from_monday() as usize, idx);
        }
    }

    #[test]
    fn test_localize_known_dates() {
        // 2025-02-09 was a Sunday
        assert_eq!(localize(date(2025, 2, 9)).label(), "Воскресенье");
        assert_eq!(localize(date(2025, 2, 10)).label(), "Понедельник");
        assert_eq!(localize(date(2025, 3, 14)).label(), "Пятница");
    }

    #[test]
    fn test_localize_covers_every_label_once_per_week() {
        let start = date(2025, 2, 10);
        let labels: Vec<_> = (0..7)
            .map(|offset| localize(start + chrono::Duration::days(offset)).label())
            .collect();
        let expected: Vec<_> = WEEKDAY_LABELS.iter().map(|(_, label)| *label).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_localize_is_idempotent_and_periodic() {
        let d = date(2025, 5, 21);
        assert_eq!(localize(d), localize(d));
        assert_eq!(localize(d), localize(d + chrono::Duration::days(7)));
        assert_eq!(localize(d), localize(d - chrono::Duration::days(700)));
    }

    #[test]
    fn test_from_label_roundtrip() {
        for &(weekday, label) in WEEKDAY_LABELS.iter() {
            let name = WeekdayName::from_label(label).unwrap();
            assert_eq!(name.weekday(), weekday);
            assert_eq!(name.label(), label);
        }
    }

    #[test]
    fn test_from_label_requires_exact_match() {
        assert!(WeekdayName::from_label("понедельник").is_none());
        assert!(WeekdayName::from_label("Monday").is_none());
        assert!(WeekdayName::from_label(" Среда").is_none());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&WeekdayName::new(Weekday::Wed)).unwrap();
        assert_eq!(json, "\"Среда\"");
        let parsed: WeekdayName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.weekday(), Weekday::Wed);
    }
}
