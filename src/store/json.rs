//! `json` store: one JSON array file per table under the data directory.
//!
//! Files managed under `data_dir`:
//! - `misconceptions.json` : `[Misconception]`
//! - `skill_progress.json` : `[SkillProgress]`
//! - `profiles.json`       : `[Profile]`
//! - `activity.json`       : `[ActivityRecord]`
//!
//! A missing file reads as an empty table.  Writes are read-modify-write
//! under a process-wide lock and go through a temp file + rename.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{ActivityRecord, Misconception, Profile, SkillProgress, Store, StoreError};

const MISCONCEPTIONS_FILENAME: &str = "misconceptions.json";
const SKILL_PROGRESS_FILENAME: &str = "skill_progress.json";
const PROFILES_FILENAME: &str = "profiles.json";
const ACTIVITY_FILENAME: &str = "activity.json";

pub struct JsonStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Open (and create, if needed) the data directory.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| {
            StoreError::Backend(format!("cannot create {}: {e}", data_dir.display()))
        })?;
        Ok(Self { data_dir, write_lock: Mutex::new(()) })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn read_table<T: DeserializeOwned>(&self, filename: &str) -> Result<Vec<T>, StoreError> {
        let path = self.data_dir.join(filename);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Backend(format!("cannot read {}: {e}", path.display())));
            }
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data)
            .map_err(|e| StoreError::Malformed(format!("{}: {e}", path.display())))
    }

    fn write_table<T: Serialize>(&self, filename: &str, rows: &[T]) -> Result<(), StoreError> {
        let path = self.data_dir.join(filename);
        let tmp = self.data_dir.join(format!("{filename}.tmp"));
        let data = serde_json::to_string_pretty(rows)
            .map_err(|e| StoreError::Malformed(format!("serialise {filename}: {e}")))?;
        fs::write(&tmp, data)
            .map_err(|e| StoreError::Backend(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| StoreError::Backend(format!("cannot replace {}: {e}", path.display())))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Backend("json store lock poisoned".into()))
    }

    // ── Seeding (used by fixtures and the import path) ────────────────

    pub fn put_misconception(&self, row: Misconception) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut rows: Vec<Misconception> = self.read_table(MISCONCEPTIONS_FILENAME)?;
        rows.push(row);
        self.write_table(MISCONCEPTIONS_FILENAME, &rows)
    }

    /// Insert or replace the progress row for `(user_id, skill_id)`.
    pub fn put_skill_progress(&self, row: SkillProgress) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut rows: Vec<SkillProgress> = self.read_table(SKILL_PROGRESS_FILENAME)?;
        rows.retain(|r| !(r.user_id == row.user_id && r.skill_id == row.skill_id));
        rows.push(row);
        self.write_table(SKILL_PROGRESS_FILENAME, &rows)
    }
}

impl Store for JsonStore {
    fn store_type(&self) -> &str {
        "json"
    }

    fn active_misconceptions(
        &self,
        user_id: &str,
        min_strength: f64,
        limit: usize,
    ) -> Result<Vec<Misconception>, StoreError> {
        let mut rows: Vec<Misconception> = self
            .read_table::<Misconception>(MISCONCEPTIONS_FILENAME)?
            .into_iter()
            .filter(|m| m.user_id == user_id && m.strength >= min_strength)
            .collect();
        rows.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        rows.truncate(limit);
        Ok(rows)
    }

    fn skill_progress(&self, user_id: &str, skill_id: &str) -> Result<Option<SkillProgress>, StoreError> {
        let mut matches = self
            .read_table::<SkillProgress>(SKILL_PROGRESS_FILENAME)?
            .into_iter()
            .filter(|p| p.user_id == user_id && p.skill_id == skill_id);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(StoreError::Malformed(format!(
                "multiple skill_progress rows for user {user_id}, skill {skill_id}"
            )));
        }
        Ok(first)
    }

    fn skill_progress_all(&self, user_id: &str) -> Result<Vec<SkillProgress>, StoreError> {
        Ok(self
            .read_table::<SkillProgress>(SKILL_PROGRESS_FILENAME)?
            .into_iter()
            .filter(|p| p.user_id == user_id)
            .collect())
    }

    fn profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        self.read_table::<Profile>(PROFILES_FILENAME)?
            .into_iter()
            .find(|p| p.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile for user {user_id}")))
    }

    fn activity_days(&self, user_id: &str) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self
            .read_table::<ActivityRecord>(ACTIVITY_FILENAME)?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.date)
            .collect())
    }

    fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let _guard = self.lock()?;
        let mut rows: Vec<Profile> = self.read_table(PROFILES_FILENAME)?;
        if rows.iter().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::Conflict(format!("profile for user {}", profile.user_id)));
        }
        rows.push(profile.clone());
        self.write_table(PROFILES_FILENAME, &rows)?;
        Ok(profile.clone())
    }

    fn record_activity(&self, user_id: &str, date: NaiveDate) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut rows: Vec<ActivityRecord> = self.read_table(ACTIVITY_FILENAME)?;
        if rows.iter().any(|r| r.user_id == user_id && r.date == date) {
            return Ok(());
        }
        rows.push(ActivityRecord { user_id: user_id.to_string(), date });
        self.write_table(ACTIVITY_FILENAME, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn misconception(user: &str, kind: &str, strength: f64) -> Misconception {
        Misconception {
            user_id: user.into(),
            misconception_type: Some(kind.into()),
            description: None,
            correct_concept: None,
            strength,
        }
    }

    fn open() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn empty_store_reads_empty_tables() {
        let (_dir, store) = open();
        assert!(store.active_misconceptions("u1", 0.0, 10).unwrap().is_empty());
        assert!(store.skill_progress("u1", "s1").unwrap().is_none());
        assert!(store.activity_days("u1").unwrap().is_empty());
        assert!(store.profile("u1").unwrap_err().is_not_found());
    }

    #[test]
    fn misconceptions_filtered_sorted_and_capped() {
        let (_dir, store) = open();
        store.put_misconception(misconception("u1", "weak", 0.1)).unwrap();
        store.put_misconception(misconception("u1", "mid", 0.5)).unwrap();
        store.put_misconception(misconception("u1", "edge", 0.3)).unwrap();
        store.put_misconception(misconception("u1", "top", 0.9)).unwrap();
        store.put_misconception(misconception("u1", "high", 0.7)).unwrap();
        store.put_misconception(misconception("u2", "other", 1.0)).unwrap();

        let rows = store.active_misconceptions("u1", 0.3, 3).unwrap();
        let kinds: Vec<_> = rows.iter().filter_map(|m| m.misconception_type.as_deref()).collect();
        assert_eq!(kinds, vec!["top", "high", "mid"]);

        let all = store.active_misconceptions("u1", 0.3, 10).unwrap();
        assert_eq!(all.len(), 4, "threshold is inclusive");
    }

    #[test]
    fn skill_progress_upserts() {
        let (_dir, store) = open();
        let mut row = SkillProgress {
            user_id: "u1".into(),
            skill_id: "quadratics".into(),
            skill_name: None,
            mastery_level: Some(0.2),
            attempts_count: Some(3),
            success_rate: Some(0.5),
        };
        store.put_skill_progress(row.clone()).unwrap();
        row.mastery_level = Some(0.6);
        store.put_skill_progress(row.clone()).unwrap();

        assert_eq!(store.skill_progress("u1", "quadratics").unwrap(), Some(row));
        assert_eq!(store.skill_progress_all("u1").unwrap().len(), 1);
    }

    #[test]
    fn insert_profile_then_conflict() {
        let (_dir, store) = open();
        let p = Profile::new("u1", "a@b.pl", "Ala");
        store.insert_profile(&p).unwrap();
        assert_eq!(store.profile("u1").unwrap(), p);
        assert!(matches!(store.insert_profile(&p), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn activity_is_deduplicated() {
        let (_dir, store) = open();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store.record_activity("u1", day).unwrap();
        store.record_activity("u1", day).unwrap();
        assert_eq!(store.activity_days("u1").unwrap(), vec![day]);
    }

    #[test]
    fn malformed_file_errors() {
        let (dir, store) = open();
        fs::write(dir.path().join(PROFILES_FILENAME), "{not json").unwrap();
        assert!(matches!(store.profile("u1"), Err(StoreError::Malformed(_))));
    }
}
