//! Data behind the home dashboard widgets: quick-access cards and the
//! weekly streak.
//!
//! Everything here degrades to empty values on store errors; the dashboard
//! is informational and must always render.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::profile::{self, NewUser, ProfileStatus};
use crate::store::{SkillProgress, StoreHandle};

const WEEKDAY_LABELS: [&str; 7] = ["Pon", "Wt", "Śr", "Czw", "Pt", "Sob", "Nd"];
const DEFAULT_GREETING_NAME: &str = "Uczniu";
/// Mastery at which a skill counts as learned.
const MASTERED_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub label: &'static str,
    pub date: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyStreak {
    /// Monday to Sunday of the week containing "today".
    pub week: Vec<WeekDay>,
    pub current_streak: u32,
}

/// Build the weekly strip and the current streak from activity days.
///
/// The streak counts consecutive active days ending today; if today has no
/// activity yet, it counts back from yesterday so an unfinished day does not
/// break it.
pub fn weekly_streak(days: &[NaiveDate], today: NaiveDate) -> WeeklyStreak {
    let active: HashSet<NaiveDate> = days.iter().copied().collect();

    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let week = WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let date = monday + Duration::days(i as i64);
            WeekDay { label: *label, date, active: active.contains(&date) }
        })
        .collect();

    let mut cursor = if active.contains(&today) { today } else { today - Duration::days(1) };
    let mut current_streak = 0;
    while active.contains(&cursor) {
        current_streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    WeeklyStreak { week, current_streak }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickAccessCard {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Whole percent, `0..=100`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<Stat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_link: Option<String>,
    pub highlighted: bool,
}

impl QuickAccessCard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            progress: None,
            stats: Vec::new(),
            button_text: None,
            button_link: None,
            highlighted: false,
        }
    }

    pub fn subtitle(mut self, s: impl Into<String>) -> Self {
        self.subtitle = Some(s.into());
        self
    }

    /// Set progress from a percentage; clamped to `0..=100`, NaN reads as 0.
    pub fn progress(mut self, percent: f64) -> Self {
        let pct = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
        self.progress = Some(pct.round() as u8);
        self
    }

    pub fn stat(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.stats.push(Stat { label: label.into(), value: value.to_string() });
        self
    }

    pub fn button(mut self, text: impl Into<String>, link: impl Into<String>) -> Self {
        self.button_text = Some(text.into());
        self.button_link = Some(link.into());
        self
    }

    pub fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub greeting_name: String,
    pub profile: ProfileStatus,
    pub cards: Vec<QuickAccessCard>,
    pub streak: WeeklyStreak,
}

impl Dashboard {
    pub async fn build(
        store: &StoreHandle,
        user: NewUser<'_>,
        today: NaiveDate,
    ) -> Dashboard {
        let user_id = user.user_id;
        let greeting_name = user
            .name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_GREETING_NAME)
            .to_string();

        let profile = profile::load_or_create(store, user).await;

        let (progress, days, stored_profile) = tokio::join!(
            store.skill_progress_all(user_id),
            store.activity_days(user_id),
            store.profile(user_id),
        );
        let progress = progress.unwrap_or_else(|e| {
            warn!(%user_id, error = %e, "skill progress unavailable for dashboard");
            Vec::new()
        });
        let days = days.unwrap_or_else(|e| {
            warn!(%user_id, error = %e, "activity unavailable for dashboard");
            Vec::new()
        });
        let points = stored_profile.map(|p| p.total_points).unwrap_or(0);

        Dashboard {
            greeting_name,
            profile,
            cards: quick_access_cards(&progress, points),
            streak: weekly_streak(&days, today),
        }
    }
}

fn quick_access_cards(progress: &[SkillProgress], points: u64) -> Vec<QuickAccessCard> {
    let current = progress
        .iter()
        .filter(|p| p.mastery_level.unwrap_or(0.0) < 1.0)
        .max_by(|a, b| {
            a.mastery_level
                .unwrap_or(0.0)
                .total_cmp(&b.mastery_level.unwrap_or(0.0))
        });

    let continue_card = match current {
        Some(p) => QuickAccessCard::new("Kontynuuj naukę")
            .subtitle(p.skill_name.clone().unwrap_or_else(|| p.skill_id.clone()))
            .progress(p.mastery_level.unwrap_or(0.0) * 100.0)
            .button("Kontynuuj", "/study"),
        None => QuickAccessCard::new("Kontynuuj naukę")
            .subtitle("Zacznij swoją pierwszą lekcję")
            .button("Zacznij", "/study"),
    };

    let mastered = progress
        .iter()
        .filter(|p| p.mastery_level.unwrap_or(0.0) >= MASTERED_THRESHOLD)
        .count();

    let progress_card = QuickAccessCard::new("Twój postęp")
        .stat("Opanowane umiejętności", mastered)
        .stat("Punktów", points)
        .button("Zobacz szczegóły", "/progress");

    let chat_card = QuickAccessCard::new("Zapytaj AI")
        .subtitle("Masz pytanie? Jestem tu dla Ciebie 24/7")
        .button("Rozpocznij rozmowę", "/chat")
        .highlighted();

    vec![continue_card, progress_card, chat_card]
}
