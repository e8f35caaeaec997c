#![forbid(unsafe_code)]

//! Core domain model and business logic for university group schedules.
//!
//! This crate provides:
//! - Domain types (lessons, weekly schedules, day schedules, groups)
//! - Weekday localization and lesson date applicability
//! - Timetable API payload parsing and sources
//! - Local group/schedule records
//! - The day schedule service

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod weekday;
pub mod applicability;
pub mod payload;
pub mod resolver;
pub mod source;
pub mod store;
pub mod service;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use weekday::{localize, WeekdayName};
pub use applicability::{applies, semester_week};
pub use payload::parse_weekly_schedule;
pub use resolver::resolve_day;
pub use source::{FileScheduleSource, HttpScheduleSource, ScheduleSource};
pub use store::RecordStore;
pub use service::{parse_target_date, ScheduleService};
