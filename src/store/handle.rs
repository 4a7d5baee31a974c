//! [`StoreHandle`]: async-safe handle over a blocking [`Store`].
//!
//! Every call is dispatched to `tokio::task::spawn_blocking` so callers
//! remain non-blocking.  Cheap to clone.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{Misconception, Profile, SkillProgress, Store, StoreError};

#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn Store>,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store_type(&self) -> &str {
        self.store.store_type()
    }

    pub async fn active_misconceptions(
        &self,
        user_id: &str,
        min_strength: f64,
        limit: usize,
    ) -> Result<Vec<Misconception>, StoreError> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.active_misconceptions(&user_id, min_strength, limit))
            .await
            .map_err(|e| StoreError::Backend(format!("active_misconceptions join: {e}")))?
    }

    pub async fn skill_progress(
        &self,
        user_id: &str,
        skill_id: &str,
    ) -> Result<Option<SkillProgress>, StoreError> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        let skill_id = skill_id.to_string();
        tokio::task::spawn_blocking(move || store.skill_progress(&user_id, &skill_id))
            .await
            .map_err(|e| StoreError::Backend(format!("skill_progress join: {e}")))?
    }

    pub async fn skill_progress_all(&self, user_id: &str) -> Result<Vec<SkillProgress>, StoreError> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.skill_progress_all(&user_id))
            .await
            .map_err(|e| StoreError::Backend(format!("skill_progress_all join: {e}")))?
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.profile(&user_id))
            .await
            .map_err(|e| StoreError::Backend(format!("profile join: {e}")))?
    }

    pub async fn insert_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.insert_profile(&profile))
            .await
            .map_err(|e| StoreError::Backend(format!("insert_profile join: {e}")))?
    }

    pub async fn activity_days(&self, user_id: &str) -> Result<Vec<NaiveDate>, StoreError> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.activity_days(&user_id))
            .await
            .map_err(|e| StoreError::Backend(format!("activity_days join: {e}")))?
    }

    pub async fn record_activity(&self, user_id: &str, date: NaiveDate) -> Result<(), StoreError> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || store.record_activity(&user_id, date))
            .await
            .map_err(|e| StoreError::Backend(format!("record_activity join: {e}")))?
    }
}
