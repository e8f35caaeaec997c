//! Sources of weekly timetables.
//!
//! The live source queries the university timetable API over HTTP; the file
//! source reads saved payloads for offline use.

use crate::config::SourceConfig;
use crate::payload::parse_weekly_schedule;
use crate::types::WeeklySchedule;
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Something that can produce a group's weekly timetable
pub trait ScheduleSource {
    fn fetch(&self, group_number: &str) -> Result<WeeklySchedule>;
}

/// Timetable API client
pub struct HttpScheduleSource {
    client: reqwest::blocking::Client,
    config: SourceConfig,
}

impl HttpScheduleSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl ScheduleSource for HttpScheduleSource {
    fn fetch(&self, group_number: &str) -> Result<WeeklySchedule> {
        let url = self.config.url_for(group_number)?;
        tracing::info!(group = group_number, "Fetching timetable from {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| Error::Upstream(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "timetable API answered {} for group {}",
                status, group_number
            )));
        }

        let body = response
            .text()
            .map_err(|e| Error::Upstream(format!("failed to read response body: {}", e)))?;
        tracing::debug!(group = group_number, "API response: {}", body);

        parse_weekly_schedule(&body)
            .map_err(|e| Error::Upstream(format!("unreadable timetable payload: {}", e)))
    }
}

/// Reads payloads saved from the timetable API.
///
/// The path is either a single payload file used for every group, or a
/// directory holding `<group>.json` files.
pub struct FileScheduleSource {
    path: PathBuf,
}

impl FileScheduleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn payload_path(&self, group_number: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{}.json", group_number))
        } else {
            self.path.clone()
        }
    }
}

impl ScheduleSource for FileScheduleSource {
    fn fetch(&self, group_number: &str) -> Result<WeeklySchedule> {
        let path = self.payload_path(group_number);
        let body = std::fs::read_to_string(&path).map_err(|e| {
            Error::Upstream(format!("cannot read payload {:?}: {}", path, e))
        })?;
        tracing::debug!(group = group_number, "Loaded payload from {:?}", path);

        parse_weekly_schedule(&body)
            .map_err(|e| Error::Upstream(format!("unreadable payload {:?}: {}", path, e)))
    }
}
