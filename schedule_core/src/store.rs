//! Local group and schedule records with file locking.
//!
//! All records live in one JSON document. Reads take a shared lock, writes
//! go through a temp file that is renamed over the original, and every
//! load-modify-save cycle holds an exclusive lock on a sidecar lock file so
//! concurrent CLI invocations cannot lose each other's updates.

use crate::types::{Group, GroupView, ScheduleDraft, StoredSchedule};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The persisted document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub last_group_id: u64,
    #[serde(default)]
    pub last_schedule_id: u64,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub schedules: Vec<StoredSchedule>,
}

impl Records {
    /// Load records with shared locking
    ///
    /// Returns empty records if the file doesn't exist. A corrupted file is
    /// an error: silently starting over would drop every stored group.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No records file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        release(&file, path);
        read?;

        let records = serde_json::from_str::<Records>(&contents)?;
        tracing::debug!(
            "Loaded {} groups and {} schedules from {:?}",
            records.groups.len(),
            records.schedules.len(),
            path
        );
        Ok(records)
    }

    /// Save records atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "records path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved records to {:?}", path);
        Ok(())
    }

    fn group(&self, id: u64) -> Result<&Group> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::group_not_found(id))
    }

    fn view(&self, group: &Group) -> GroupView {
        GroupView {
            id: group.id,
            group_number: group.group_number.clone(),
            schedules: self
                .schedules
                .iter()
                .filter(|s| s.group_id == group.id)
                .cloned()
                .collect(),
        }
    }

    fn ensure_number_free(&self, number: &str, except: Option<u64>) -> Result<()> {
        let taken = self
            .groups
            .iter()
            .any(|g| g.group_number == number && Some(g.id) != except);
        if taken {
            return Err(Error::Conflict(format!("group {} already exists", number)));
        }
        Ok(())
    }
}

/// Unlock a held file; closing the handle releases the lock anyway
fn release(file: &File, path: &Path) {
    if let Err(e) = file.unlock() {
        tracing::warn!("Failed to unlock {:?}: {}", path, e);
    }
}

fn validate_group_number(number: &str) -> Result<String> {
    let number = number.trim();
    if number.is_empty() {
        return Err(Error::InvalidRecord("group number must not be empty".into()));
    }
    Ok(number.to_string())
}

/// Handle to the records document on disk
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Records> {
        Records::load(&self.path)
    }

    /// Load, modify and save under an exclusive lock
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Records) -> Result<T>,
    {
        let lock_path = self.path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock.lock_exclusive()?;

        let result = self.modify(f);

        // The closure's outcome wins over a failed unlock
        release(&lock, &lock_path);
        result
    }

    fn modify<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Records) -> Result<T>,
    {
        let mut records = self.read()?;
        let value = f(&mut records)?;
        records.save(&self.path)?;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub fn find_all_groups(&self) -> Result<Vec<GroupView>> {
        let records = self.read()?;
        Ok(records.groups.iter().map(|g| records.view(g)).collect())
    }

    pub fn find_group(&self, id: u64) -> Result<GroupView> {
        let records = self.read()?;
        let group = records.group(id)?;
        Ok(records.view(group))
    }

    pub fn find_group_by_number(&self, number: &str) -> Result<GroupView> {
        let records = self.read()?;
        let group = records
            .groups
            .iter()
            .find(|g| g.group_number == number)
            .ok_or_else(|| Error::group_not_found(number))?;
        Ok(records.view(group))
    }

    pub fn create_group(&self, number: &str) -> Result<GroupView> {
        let number = validate_group_number(number)?;
        self.update(|records| {
            records.ensure_number_free(&number, None)?;
            records.last_group_id += 1;
            let group = Group {
                id: records.last_group_id,
                group_number: number,
            };
            tracing::info!(id = group.id, "Created group {}", group.group_number);
            records.groups.push(group.clone());
            Ok(records.view(&group))
        })
    }

    pub fn update_group(&self, id: u64, number: &str) -> Result<GroupView> {
        let number = validate_group_number(number)?;
        self.update(|records| {
            records.ensure_number_free(&number, Some(id))?;
            let group = records
                .groups
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| Error::group_not_found(id))?;
            group.group_number = number;
            let group = group.clone();
            tracing::info!(id, "Renamed group to {}", group.group_number);
            Ok(records.view(&group))
        })
    }

    /// Delete a group together with its stored schedules
    pub fn delete_group(&self, id: u64) -> Result<()> {
        self.update(|records| {
            records.group(id)?;
            records.groups.retain(|g| g.id != id);
            let before = records.schedules.len();
            records.schedules.retain(|s| s.group_id != id);
            tracing::info!(
                id,
                removed_schedules = before - records.schedules.len(),
                "Deleted group"
            );
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Stored schedules
    // ------------------------------------------------------------------

    pub fn find_all_schedules(&self) -> Result<Vec<StoredSchedule>> {
        Ok(self.read()?.schedules)
    }

    pub fn find_schedule(&self, id: u64) -> Result<StoredSchedule> {
        self.read()?
            .schedules
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::schedule_not_found(id))
    }

    pub fn find_schedules_by_group(&self, group_id: u64) -> Result<Vec<StoredSchedule>> {
        Ok(self
            .read()?
            .schedules
            .into_iter()
            .filter(|s| s.group_id == group_id)
            .collect())
    }

    pub fn create_schedule(&self, draft: ScheduleDraft) -> Result<StoredSchedule> {
        self.update(|records| {
            records.group(draft.group_id)?;
            records.last_schedule_id += 1;
            let schedule = StoredSchedule {
                id: records.last_schedule_id,
                subject: draft.subject,
                lesson_type: draft.lesson_type,
                time: draft.time,
                auditorium: draft.auditorium,
                group_id: draft.group_id,
            };
            tracing::info!(
                id = schedule.id,
                group_id = schedule.group_id,
                "Created schedule {}",
                schedule.subject
            );
            records.schedules.push(schedule.clone());
            Ok(schedule)
        })
    }

    pub fn update_schedule(&self, id: u64, draft: ScheduleDraft) -> Result<StoredSchedule> {
        self.update(|records| {
            let exists = records.schedules.iter().any(|s| s.id == id);
            if !exists {
                return Err(Error::schedule_not_found(id));
            }
            records.group(draft.group_id)?;

            let schedule = records
                .schedules
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| Error::schedule_not_found(id))?;
            schedule.subject = draft.subject;
            schedule.lesson_type = draft.lesson_type;
            schedule.time = draft.time;
            schedule.auditorium = draft.auditorium;
            schedule.group_id = draft.group_id;
            tracing::info!(id, "Updated schedule");
            Ok(schedule.clone())
        })
    }

    pub fn delete_schedule(&self, id: u64) -> Result<()> {
        self.update(|records| {
            let before = records.schedules.len();
            records.schedules.retain(|s| s.id != id);
            if records.schedules.len() == before {
                return Err(Error::schedule_not_found(id));
            }
            tracing::info!(id, "Deleted schedule");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> RecordStore {
        RecordStore::new(dir.path().join("records.json"))
    }

    fn draft(group_id: u64, subject: &str) -> ScheduleDraft {
        ScheduleDraft {
            subject: subject.into(),
            lesson_type: "ЛК".into(),
            time: "09:00-10:20".into(),
            auditorium: "104-2 к.".into(),
            group_id,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        assert!(store.find_all_groups().unwrap().is_empty());
        assert!(store.find_all_schedules().unwrap().is_empty());
    }

    #[test]
    fn test_create_and_find_group() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);

        let created = store.create_group(" 221701 ").unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.group_number, "221701");
        assert!(created.schedules.is_empty());

        assert_eq!(store.find_group(1).unwrap().group_number, "221701");
        assert_eq!(store.find_group_by_number("221701").unwrap().id, 1);
    }

    #[test]
    fn test_missing_group_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);

        assert!(matches!(
            store.find_group(7),
            Err(Error::NotFound { kind: "Group", .. })
        ));
        assert!(matches!(
            store.find_group_by_number("000000"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(store.delete_group(7), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_duplicate_group_number_conflicts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        store.create_group("221701").unwrap();
        let second = store.create_group("221702").unwrap();

        assert!(matches!(store.create_group("221701"), Err(Error::Conflict(_))));
        assert!(matches!(
            store.update_group(second.id, "221701"),
            Err(Error::Conflict(_))
        ));
        // renaming to its own number is fine
        assert!(store.update_group(second.id, "221702").is_ok());
    }

    #[test]
    fn test_empty_group_number_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        assert!(matches!(store.create_group("  "), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);

        let first = store.create_group("221701").unwrap();
        store.delete_group(first.id).unwrap();
        let second = store.create_group("221701").unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_schedule_crud() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        let group = store.create_group("221701").unwrap();
        let other = store.create_group("221702").unwrap();

        let created = store.create_schedule(draft(group.id, "Физика")).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(store.find_schedule(created.id).unwrap(), created);

        let view = store.find_group(group.id).unwrap();
        assert_eq!(view.schedules, vec![created.clone()]);

        let moved = store
            .update_schedule(created.id, draft(other.id, "Химия"))
            .unwrap();
        assert_eq!(moved.subject, "Химия");
        assert!(store.find_schedules_by_group(group.id).unwrap().is_empty());
        assert_eq!(store.find_schedules_by_group(other.id).unwrap().len(), 1);

        store.delete_schedule(created.id).unwrap();
        assert!(matches!(
            store.find_schedule(created.id),
            Err(Error::NotFound { kind: "Schedule", .. })
        ));
        assert!(matches!(
            store.delete_schedule(created.id),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_schedule_requires_existing_group() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);

        assert!(matches!(
            store.create_schedule(draft(42, "Физика")),
            Err(Error::NotFound { kind: "Group", .. })
        ));

        let group = store.create_group("221701").unwrap();
        let schedule = store.create_schedule(draft(group.id, "Физика")).unwrap();
        assert!(matches!(
            store.update_schedule(schedule.id, draft(42, "Физика")),
            Err(Error::NotFound { kind: "Group", .. })
        ));
        assert!(matches!(
            store.update_schedule(99, draft(group.id, "Физика")),
            Err(Error::NotFound { kind: "Schedule", .. })
        ));
    }

    #[test]
    fn test_delete_group_removes_its_schedules() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        let group = store.create_group("221701").unwrap();
        let other = store.create_group("221702").unwrap();
        store.create_schedule(draft(group.id, "Физика")).unwrap();
        store.create_schedule(draft(other.id, "Химия")).unwrap();

        store.delete_group(group.id).unwrap();

        let remaining = store.find_all_schedules().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].group_id, other.id);
    }

    #[test]
    fn test_corrupted_records_are_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(matches!(store.find_all_groups(), Err(Error::Json(_))));
        // and nothing gets overwritten
        assert!(store.create_group("221701").is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{ invalid json }"
        );
    }

    #[test]
    fn test_failed_update_reports_its_own_error_and_releases_lock() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        store.create_group("221701").unwrap();

        assert!(matches!(store.create_group("221701"), Err(Error::Conflict(_))));

        // Another handle can take the lock straight away
        let other = store.clone();
        let created = std::thread::spawn(move || other.create_group("221702"))
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(created.id, 2);

        let lock = File::open(temp_dir.path().join("records.lock")).unwrap();
        assert!(lock.try_lock_exclusive().is_ok());
        lock.unlock().unwrap();
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store(&temp_dir);
        store.create_group("221701").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "records.json" && name != "records.lock")
            .collect();
        assert!(extras.is_empty(), "Unexpected files: {:?}", extras);
    }

    #[test]
    fn test_concurrent_creates_are_serialized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = RecordStore::new(path.clone());
                std::thread::spawn(move || store.create_group(&format!("2217{:02}", i)).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = RecordStore::new(path);
        let mut ids: Vec<_> = store.find_all_groups().unwrap().iter().map(|g| g.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }
}
