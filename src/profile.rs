//! Profile fetch-or-create for the dashboard.
//!
//! The dashboard only needs the onboarding flag, and must always render, so
//! [`load_or_create`] never fails: a missing profile is created with
//! defaults, and any other problem falls back to "onboarding not completed".

use serde::Serialize;
use tracing::{error, info, warn};

use crate::store::{Profile, StoreHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileStatus {
    pub onboarding_completed: bool,
    /// `true` when the status is a fallback rather than stored data.
    #[serde(skip)]
    pub fallback: bool,
}

impl ProfileStatus {
    fn from_profile(p: &Profile) -> Self {
        Self { onboarding_completed: p.onboarding_completed, fallback: false }
    }

    fn fallback() -> Self {
        Self { onboarding_completed: false, fallback: true }
    }
}

/// Identity fields used when a profile has to be created.
#[derive(Debug, Clone, Default)]
pub struct NewUser<'a> {
    pub user_id: &'a str,
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
}

pub async fn load_or_create(store: &StoreHandle, user: NewUser<'_>) -> ProfileStatus {
    info!(user_id = %user.user_id, "loading profile");

    match store.profile(user.user_id).await {
        Ok(profile) => ProfileStatus::from_profile(&profile),
        Err(e) if e.is_not_found() => {
            info!(user_id = %user.user_id, "creating missing profile");
            let fresh = Profile::new(
                user.user_id,
                user.email.unwrap_or_default(),
                user.name.unwrap_or_default(),
            );
            match store.insert_profile(fresh).await {
                Ok(created) => ProfileStatus::from_profile(&created),
                Err(e) => {
                    error!(user_id = %user.user_id, error = %e, "profile creation failed");
                    ProfileStatus::fallback()
                }
            }
        }
        Err(e) => {
            warn!(user_id = %user.user_id, error = %e, "profile fetch failed");
            ProfileStatus::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::store::{JsonStore, Misconception, SkillProgress, Store, StoreError};

    fn json_store() -> (TempDir, Arc<JsonStore>, StoreHandle) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        let handle = StoreHandle::new(store.clone());
        (dir, store, handle)
    }

    fn user(id: &str) -> NewUser<'_> {
        NewUser { user_id: id, email: Some("ola@example.pl"), name: Some("Ola") }
    }

    #[tokio::test]
    async fn existing_profile_returned() {
        let (_d, store, handle) = json_store();
        let mut p = Profile::new("u1", "", "");
        p.onboarding_completed = true;
        store.insert_profile(&p).unwrap();

        let status = load_or_create(&handle, user("u1")).await;
        assert!(status.onboarding_completed);
        assert!(!status.fallback);
    }

    #[tokio::test]
    async fn missing_profile_created_with_defaults() {
        let (_d, store, handle) = json_store();
        let status = load_or_create(&handle, user("u2")).await;
        assert!(!status.onboarding_completed);
        assert!(!status.fallback);

        let created = store.profile("u2").unwrap();
        assert_eq!(created.email, "ola@example.pl");
        assert_eq!(created.name, "Ola");
        assert_eq!(created.level, 1);
    }

    /// Has no profiles and cannot write any.
    struct ReadOnly;

    impl Store for ReadOnly {
        fn store_type(&self) -> &str { "readonly" }
        fn active_misconceptions(&self, _: &str, _: f64, _: usize) -> Result<Vec<Misconception>, StoreError> {
            Ok(Vec::new())
        }
        fn skill_progress(&self, _: &str, _: &str) -> Result<Option<SkillProgress>, StoreError> {
            Ok(None)
        }
        fn skill_progress_all(&self, _: &str) -> Result<Vec<SkillProgress>, StoreError> {
            Ok(Vec::new())
        }
        fn profile(&self, user_id: &str) -> Result<Profile, StoreError> {
            Err(StoreError::NotFound(user_id.to_string()))
        }
        fn activity_days(&self, _: &str) -> Result<Vec<NaiveDate>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn creation_failure_falls_back() {
        let handle = StoreHandle::new(Arc::new(ReadOnly));
        let status = load_or_create(&handle, user("u3")).await;
        assert_eq!(status, ProfileStatus { onboarding_completed: false, fallback: true });
    }

    #[tokio::test]
    async fn fetch_failure_falls_back() {
        let (dir, _store, handle) = json_store();
        std::fs::write(dir.path().join("profiles.json"), "[{").unwrap();
        let status = load_or_create(&handle, user("u4")).await;
        assert!(status.fallback);
        assert!(!status.onboarding_completed);
    }
}
