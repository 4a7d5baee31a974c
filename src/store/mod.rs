//! Persistence seam for student data.
//!
//! The tutor reads misconception, skill-progress and profile rows, and
//! writes profiles and daily activity.  [`Store`] is the
//! synchronous backend contract; [`StoreHandle`] wraps a backend for async
//! callers by dispatching every call onto the blocking pool.
//!
//! Write operations default to [`StoreError::Unsupported`] so read-only
//! backends only implement what they need.

pub mod handle;
pub mod json;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use handle::StoreHandle;
pub use json::JsonStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("store '{store}' does not support {op}")]
    Unsupported { store: String, op: &'static str },
    #[error("malformed data: {0}")]
    Malformed(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// A recorded recurring error pattern of one student.
///
/// `strength` is in `0..=1`; higher means the mistake shows up more often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Misconception {
    pub user_id: String,
    #[serde(default)]
    pub misconception_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub correct_concept: Option<String>,
    pub strength: f64,
}

/// Progress of one student on one skill.  Missing numbers read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
    pub user_id: String,
    pub skill_id: String,
    #[serde(default)]
    pub skill_name: Option<String>,
    #[serde(default)]
    pub mastery_level: Option<f64>,
    #[serde(default)]
    pub attempts_count: Option<u32>,
    #[serde(default)]
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub level: u32,
    pub total_points: u64,
    pub diagnosis_completed: bool,
    pub onboarding_completed: bool,
}

impl Profile {
    /// A fresh profile for a user seen for the first time.
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name: name.into(),
            level: 1,
            total_points: 0,
            diagnosis_completed: false,
            onboarding_completed: false,
        }
    }
}

/// One day on which a user talked to the tutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    pub date: NaiveDate,
}

/// Pluggable student-data backend.
///
/// Implementations are `Send + Sync` and may block; async code goes through
/// [`StoreHandle`].
pub trait Store: Send + Sync {
    /// Unique type name for this store (e.g. `"json"`).
    fn store_type(&self) -> &str;

    /// Misconceptions with `strength >= min_strength`, strongest first,
    /// at most `limit` rows.
    fn active_misconceptions(
        &self,
        user_id: &str,
        min_strength: f64,
        limit: usize,
    ) -> Result<Vec<Misconception>, StoreError>;

    /// The progress row for `(user_id, skill_id)`, if any.
    fn skill_progress(&self, user_id: &str, skill_id: &str) -> Result<Option<SkillProgress>, StoreError>;

    /// Every progress row of a user.
    fn skill_progress_all(&self, user_id: &str) -> Result<Vec<SkillProgress>, StoreError>;

    /// The user's profile, or [`StoreError::NotFound`].
    fn profile(&self, user_id: &str) -> Result<Profile, StoreError>;

    /// Distinct activity days of a user, in no particular order.
    fn activity_days(&self, user_id: &str) -> Result<Vec<NaiveDate>, StoreError>;

    // ── Writes ────────────────────────────────────────────────────────

    fn insert_profile(&self, _profile: &Profile) -> Result<Profile, StoreError> {
        Err(StoreError::Unsupported {
            store: self.store_type().to_string(),
            op: "insert_profile",
        })
    }

    fn record_activity(&self, _user_id: &str, _date: NaiveDate) -> Result<(), StoreError> {
        Err(StoreError::Unsupported {
            store: self.store_type().to_string(),
            op: "record_activity",
        })
    }
}
