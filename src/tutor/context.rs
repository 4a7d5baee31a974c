//! Lightweight educational context.
//!
//! Fetches only the two most valuable pieces of student state and renders
//! them as a Markdown section appended to the system prompt:
//! - active misconceptions (recurring mistakes)
//! - progress on the current skill
//!
//! Lookups are independent and run concurrently.  A failed lookup is logged
//! and treated as "no data"; the tutor must keep answering without context.

use tracing::{debug, info, warn};

use crate::store::{Misconception, SkillProgress, StoreHandle};

/// Tunables for context assembly (`[context]` in config).
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSettings {
    pub enabled: bool,
    /// Inclusive lower bound on misconception strength.
    pub min_strength: f64,
    pub misconception_limit: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self { enabled: true, min_strength: 0.3, misconception_limit: 3 }
    }
}

#[derive(Clone)]
pub struct ContextBuilder {
    store: StoreHandle,
    settings: ContextSettings,
}

impl ContextBuilder {
    pub fn new(store: StoreHandle, settings: ContextSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    /// Build the context section for `user_id`, or `None` when there is
    /// nothing worth telling the model.
    pub async fn build(&self, user_id: &str, skill_id: Option<&str>) -> Option<String> {
        if !self.settings.enabled {
            return None;
        }
        debug!(%user_id, ?skill_id, "building lightweight context");

        let (misconceptions, progress) = tokio::join!(
            self.fetch_misconceptions(user_id),
            self.fetch_skill_progress(user_id, skill_id),
        );

        let mut parts = Vec::new();
        if !misconceptions.is_empty() {
            parts.push(format_misconceptions(&misconceptions));
        }
        if let Some(progress) = &progress {
            parts.push(format_skill_progress(progress));
        }

        if parts.is_empty() {
            debug!(%user_id, "no lightweight context data available");
            return None;
        }

        let context = format!("\n\n## KONTEKST EDUKACYJNY UCZNIA\n\n{}", parts.join("\n\n"));
        info!(
            %user_id,
            misconceptions = misconceptions.len(),
            has_progress = progress.is_some(),
            len = context.len(),
            "lightweight context built"
        );
        Some(context)
    }

    async fn fetch_misconceptions(&self, user_id: &str) -> Vec<Misconception> {
        match self
            .store
            .active_misconceptions(user_id, self.settings.min_strength, self.settings.misconception_limit)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%user_id, error = %e, "misconception lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch_skill_progress(&self, user_id: &str, skill_id: Option<&str>) -> Option<SkillProgress> {
        let skill_id = skill_id?;
        match self.store.skill_progress(user_id, skill_id).await {
            Ok(row) => row,
            Err(e) => {
                warn!(%user_id, %skill_id, error = %e, "skill progress lookup failed");
                None
            }
        }
    }
}

/// Whole-number percentage of a `0..=1` fraction.  Halves round up
/// (`0.625` is "63"), matching how the web client displays them.
fn percent(fraction: f64) -> String {
    let pct = (fraction * 100.0).round();
    // -0.4% rounds to -0
    if pct == 0.0 { "0".to_string() } else { format!("{pct}") }
}

/// Render the misconceptions subsection.  Empty input renders nothing.
pub fn format_misconceptions(misconceptions: &[Misconception]) -> String {
    if misconceptions.is_empty() {
        return String::new();
    }

    let mut out = String::from("### BŁĘDNE KONCEPCJE (Misconceptions)\n\n");
    out.push_str("Uczeń ma tendencję do popełniania następujących błędów:\n\n");

    for (i, m) in misconceptions.iter().enumerate() {
        let kind = m
            .misconception_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Nieznany typ");
        out.push_str(&format!("{}. **{kind}** (siła: {}%)\n", i + 1, percent(m.strength)));
        if let Some(desc) = m.description.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!("   - {desc}\n"));
        }
        if let Some(correct) = m.correct_concept.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!("   - Prawidłowe rozumienie: {correct}\n"));
        }
    }

    out.push_str(
        "\n**INSTRUKCJA:** Gdy zauważysz, że uczeń popełnia któryś z tych błędów, delikatnie go naprowadź pytaniami, aby sam odkrył poprawne rozwiązanie. Nie mów wprost \"to jest błąd\", ale zadaj pytanie, które zmusi go do przemyślenia swojego podejścia.",
    );
    out
}

/// Render the skill-progress subsection with a mastery-dependent instruction.
pub fn format_skill_progress(progress: &SkillProgress) -> String {
    let mastery = progress.mastery_level.unwrap_or(0.0);
    let attempts = progress.attempts_count.unwrap_or(0);
    let success = progress.success_rate.unwrap_or(0.0);

    let mut out = String::from("### POSTĘPY W NAUCE\n\n");
    out.push_str(&format!("- **Poziom opanowania:** {}%\n", percent(mastery)));
    out.push_str(&format!("- **Liczba prób:** {attempts}\n"));
    out.push_str(&format!("- **Wskaźnik sukcesu:** {}%\n", percent(success)));

    let instruction = if mastery < 0.3 {
        "Uczeń jest na **początkowym etapie** nauki tej umiejętności. Używaj prostego języka, małych kroków i dużo zachęty. Sprawdzaj zrozumienie po każdym kroku."
    } else if mastery < 0.7 {
        "Uczeń ma **podstawowe zrozumienie**, ale potrzebuje więcej praktyki. Możesz wprowadzać nieco trudniejsze przykłady, ale wciąż sprawdzaj zrozumienie."
    } else {
        "Uczeń **dobrze opanował** tę umiejętność. Możesz wprowadzać bardziej złożone problemy i zachęcać do samodzielnego rozwiązywania."
    };
    out.push_str(&format!("\n**INSTRUKCJA:** {instruction}"));
    out
}
