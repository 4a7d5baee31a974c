//! GADIE lesson prompts (Goal-Assess-Develop-Implement-Evaluate).
//!
//! Two templates exist: the structured GADIE prompt used by default, and the
//! older free-form "legacy" prompt kept for comparison runs.  Both append the
//! same conditional blocks, in this order:
//!
//! ```text
//! skill         : when a skill name is known
//! first contact : the opening turn of a conversation
//! hint request  : the student asked for a hint
//! calibration   : periodic "tell me if this is too hard" reminder
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::prompt::PromptBuilder;

const GADIE_TEMPLATE: &str = include_str!("../../config/prompts/gadie.md");
const LEGACY_TEMPLATE: &str = include_str!("../../config/prompts/legacy.md");

pub const DEFAULT_TUTOR_NAME: &str = "Mentavo";
const DEFAULT_GOAL_SUBJECT: &str = "tym zagadnieniu";

const FIRST_CONTACT_MESSAGE: &str = "\"😊 Cześć! Jestem tu by Ci pomóc z matematyką. Jeśli czegoś nie rozumiesz w moich odpowiedziach - napisz od razu! Mogę wyjaśnić prościej lub inaczej. Dostosowuję się do Twojego tempa nauki.\"";
const HINT_INSTRUCTION: &str = "Użytkownik prosi o pomoc. Odwołaj się dokładnie do problemu który już wcześniej omawialiście w tej rozmowie. NIE wymyślaj nowego przykładu - użyj tego samego!";
const CALIBRATION_MESSAGE: &str = "\"😊 Przypomnę - jeśli coś jest zbyt trudne, zbyt techniczne lub jest tego za dużo na raz, napisz mi! Jestem tu by dostosować się do Twojego stylu nauki.\"";

const LEGACY_SYMBOLS_WARNING: &str = "⚠️ WAŻNE - SYMBOLE MATEMATYCZNE:
Gdy napiszesz skomplikowany symbol (jak d/dx, f'(x), x^n), od razu go wytłumacz w prostych słowach.
Przykład: \"d/dx (to znaczy: pochodna względem x)\" lub \"f'(x) (czyli pochodna funkcji f od x)\"";
const LEGACY_LENGTH_WARNING: &str = "⚠️ LIMIT DŁUGOŚCI ODPOWIEDZI:
MAKSYMALNIE 150 słów + JEDNO pytanie na końcu. NIGDY więcej! Jeśli musisz więcej wyjaśnić - zrób to w kolejnej wymianie, nie w jednej długiej odpowiedzi.";

/// Per-turn inputs to the prompt templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GadieContext {
    pub skill_name: Option<String>,
    pub is_first_contact: bool,
    pub is_hint_request: bool,
    pub needs_calibration_reminder: bool,
    /// Messages already exchanged in this conversation.
    pub message_count: u32,
    /// Persona name; `None` means [`DEFAULT_TUTOR_NAME`].
    pub tutor_name: Option<String>,
}

impl GadieContext {
    fn skill(&self) -> Option<&str> {
        self.skill_name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn tutor_name(&self) -> &str {
        self.tutor_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_TUTOR_NAME)
    }
}

/// Which template family to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Gadie,
    Legacy,
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gadie" => Ok(PromptStyle::Gadie),
            "legacy" => Ok(PromptStyle::Legacy),
            other => Err(format!("unknown prompt style: {other} (expected \"gadie\" or \"legacy\")")),
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStyle::Gadie => f.write_str("gadie"),
            PromptStyle::Legacy => f.write_str("legacy"),
        }
    }
}

/// The five lesson phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonPhase {
    Goal,
    Assess,
    Develop,
    Implement,
    Evaluate,
}

impl LessonPhase {
    /// Expected phase after `message_count` exchanged messages, following the
    /// per-phase message budget of the GADIE template.
    pub fn for_message_count(message_count: u32) -> Self {
        match message_count {
            0 => LessonPhase::Goal,
            1..=2 => LessonPhase::Assess,
            3..=6 => LessonPhase::Develop,
            7..=10 => LessonPhase::Implement,
            _ => LessonPhase::Evaluate,
        }
    }
}

impl fmt::Display for LessonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LessonPhase::Goal => "goal",
            LessonPhase::Assess => "assess",
            LessonPhase::Develop => "develop",
            LessonPhase::Implement => "implement",
            LessonPhase::Evaluate => "evaluate",
        };
        f.write_str(s)
    }
}

/// Render the structured GADIE system prompt.
pub fn build_gadie_prompt(ctx: &GadieContext) -> String {
    let skill = ctx.skill();

    PromptBuilder::new()
        .template(GADIE_TEMPLATE)
        .append_if(
            skill.is_some(),
            format!(
                "## UMIEJĘTNOŚĆ\n{} - dostosuj wszystkie pytania i przykłady do tej konkretnej umiejętności.",
                skill.unwrap_or_default()
            ),
        )
        .append_if(
            ctx.is_first_contact,
            format!(
                "## ⚠️ PIERWSZY KONTAKT - KALIBRACJA\nNa początku dodaj krótką wiadomość: {FIRST_CONTACT_MESSAGE}"
            ),
        )
        .append_if(
            ctx.is_hint_request,
            format!("## ⚠️ PROŚBA O PODPOWIEDŹ\n{HINT_INSTRUCTION}"),
        )
        .append_if(
            ctx.needs_calibration_reminder,
            format!("## ⚠️ PRZYPOMNIENIE O KALIBRACJI\nNa końcu odpowiedzi dodaj: {CALIBRATION_MESSAGE}"),
        )
        .var("tutor_name", ctx.tutor_name())
        .var("goal_subject", skill.unwrap_or(DEFAULT_GOAL_SUBJECT))
        .build()
}

/// Render the older free-form prompt (150-word limit).
pub fn build_legacy_prompt(ctx: &GadieContext) -> String {
    let skill = ctx.skill();

    PromptBuilder::new()
        .template(LEGACY_TEMPLATE)
        .append_if(
            skill.is_some(),
            format!(
                "UMIEJĘTNOŚĆ: {} - dostosuj wszystkie pytania i przykłady do tej konkretnej umiejętności.",
                skill.unwrap_or_default()
            ),
        )
        .append_if(
            ctx.is_first_contact,
            format!(
                "⚠️ PIERWSZY KONTAKT - KALIBRACJA POTRZEBNA:\nNa początku dodaj krótką wiadomość: {FIRST_CONTACT_MESSAGE}"
            ),
        )
        .append_if(
            ctx.is_hint_request,
            format!("⚠️ PROŚBA O PODPOWIEDŹ:\n{HINT_INSTRUCTION}"),
        )
        .append_if(
            ctx.needs_calibration_reminder,
            format!("⚠️ PRZYPOMNIENIE O KALIBRACJI:\nNa końcu odpowiedzi dodaj: {CALIBRATION_MESSAGE}"),
        )
        .append(LEGACY_SYMBOLS_WARNING)
        .append(LEGACY_LENGTH_WARNING)
        .build()
}

/// Render the template selected by `style`.
pub fn build_prompt(style: PromptStyle, ctx: &GadieContext) -> String {
    match style {
        PromptStyle::Gadie => build_gadie_prompt(ctx),
        PromptStyle::Legacy => build_legacy_prompt(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> GadieContext {
        GadieContext::default()
    }

    #[test]
    fn gadie_base_has_persona_and_all_phases() {
        let p = build_gadie_prompt(&ctx());
        assert!(p.starts_with("# GŁÓWNY PROMPT SYSTEMOWY"));
        assert!(p.contains("Jesteś Mentavo"));
        for phase in ["GOAL", "ASSESS", "DEVELOP", "IMPLEMENT", "EVALUATE"] {
            assert!(p.contains(&format!(": {phase} (")), "missing phase {phase}");
        }
        assert!(p.contains("Maksymalnie 50 słów + 1 pytanie"));
    }

    #[test]
    fn gadie_without_skill_uses_generic_goal() {
        let p = build_gadie_prompt(&ctx());
        assert!(p.contains("Dziś skupimy się na tym zagadnieniu."));
        assert!(!p.contains("## UMIEJĘTNOŚĆ"));
        assert!(!p.contains("{{"));
    }

    #[test]
    fn gadie_with_skill_names_goal_and_appends_block() {
        let c = GadieContext { skill_name: Some("Równania kwadratowe".into()), ..ctx() };
        let p = build_gadie_prompt(&c);
        assert!(p.contains("Dziś skupimy się na Równania kwadratowe."));
        assert!(p.contains("## UMIEJĘTNOŚĆ\nRównania kwadratowe - dostosuj"));
    }

    #[test]
    fn blank_skill_name_treated_as_missing() {
        let c = GadieContext { skill_name: Some("   ".into()), ..ctx() };
        let p = build_gadie_prompt(&c);
        assert!(!p.contains("## UMIEJĘTNOŚĆ"));
        assert!(p.contains("tym zagadnieniu"));
    }

    #[test]
    fn gadie_no_flags_has_no_conditional_blocks() {
        let p = build_gadie_prompt(&ctx());
        assert!(!p.contains("PIERWSZY KONTAKT"));
        assert!(!p.contains("PROŚBA O PODPOWIEDŹ"));
        assert!(!p.contains("PRZYPOMNIENIE O KALIBRACJI"));
    }

    #[test]
    fn gadie_blocks_appear_in_fixed_order() {
        let c = GadieContext {
            skill_name: Some("Pochodne".into()),
            is_first_contact: true,
            is_hint_request: true,
            needs_calibration_reminder: true,
            ..ctx()
        };
        let p = build_gadie_prompt(&c);
        let skill = p.find("## UMIEJĘTNOŚĆ").unwrap();
        let first = p.find("## ⚠️ PIERWSZY KONTAKT").unwrap();
        let hint = p.find("## ⚠️ PROŚBA O PODPOWIEDŹ").unwrap();
        let calib = p.find("## ⚠️ PRZYPOMNIENIE O KALIBRACJI").unwrap();
        assert!(skill < first && first < hint && hint < calib);
        assert_eq!(p.matches("PIERWSZY KONTAKT").count(), 1);
        assert!(p.ends_with("Jestem tu by dostosować się do Twojego stylu nauki.\""));
    }

    #[test]
    fn custom_tutor_name_substituted() {
        let c = GadieContext { tutor_name: Some("Euklides".into()), ..ctx() };
        let p = build_gadie_prompt(&c);
        assert!(p.contains("Jesteś Euklides,"));
        assert!(!p.contains("Mentavo"));
    }

    #[test]
    fn placeholder_in_skill_name_stays_literal() {
        let c = GadieContext { skill_name: Some("{{tutor_name}}".into()), ..ctx() };
        let first = build_gadie_prompt(&c);
        for _ in 0..20 {
            assert_eq!(build_gadie_prompt(&c), first);
        }
        assert!(!first.contains("{{"));
        assert!(first.contains("Dziś skupimy się na {tutor_name}."));
        assert!(first.contains("## UMIEJĘTNOŚĆ\n{tutor_name} - dostosuj"));
        assert!(first.contains("Jesteś Mentavo"));
        assert!(!build_legacy_prompt(&c).contains("{{"));
    }

    #[test]
    fn legacy_always_ends_with_length_limit() {
        let p = build_legacy_prompt(&ctx());
        assert!(p.starts_with("Jesteś korepetytorem matematyki"));
        assert!(p.contains("⚠️ WAŻNE - SYMBOLE MATEMATYCZNE:"));
        assert!(p.ends_with("nie w jednej długiej odpowiedzi."));
        assert!(!p.contains("UMIEJĘTNOŚĆ:"));
    }

    #[test]
    fn legacy_blocks_before_closing_warnings() {
        let c = GadieContext {
            skill_name: Some("Logarytmy".into()),
            is_first_contact: true,
            is_hint_request: true,
            needs_calibration_reminder: true,
            ..ctx()
        };
        let p = build_legacy_prompt(&c);
        let skill = p.find("UMIEJĘTNOŚĆ: Logarytmy").unwrap();
        let first = p.find("KALIBRACJA POTRZEBNA").unwrap();
        let hint = p.find("⚠️ PROŚBA O PODPOWIEDŹ:").unwrap();
        let calib = p.find("⚠️ PRZYPOMNIENIE O KALIBRACJI:").unwrap();
        let symbols = p.find("⚠️ WAŻNE - SYMBOLE").unwrap();
        let limit = p.find("⚠️ LIMIT DŁUGOŚCI").unwrap();
        assert!(skill < first && first < hint && hint < calib && calib < symbols && symbols < limit);
    }

    #[test]
    fn build_prompt_dispatches_on_style() {
        assert_eq!(build_prompt(PromptStyle::Gadie, &ctx()), build_gadie_prompt(&ctx()));
        assert_eq!(build_prompt(PromptStyle::Legacy, &ctx()), build_legacy_prompt(&ctx()));
    }

    #[test]
    fn prompt_style_parses() {
        assert_eq!("GADIE".parse::<PromptStyle>().unwrap(), PromptStyle::Gadie);
        assert_eq!(" legacy ".parse::<PromptStyle>().unwrap(), PromptStyle::Legacy);
        assert!("socratic".parse::<PromptStyle>().is_err());
        assert_eq!(PromptStyle::Legacy.to_string(), "legacy");
    }

    #[test]
    fn phase_follows_message_budget() {
        assert_eq!(LessonPhase::for_message_count(0), LessonPhase::Goal);
        assert_eq!(LessonPhase::for_message_count(2), LessonPhase::Assess);
        assert_eq!(LessonPhase::for_message_count(3), LessonPhase::Develop);
        assert_eq!(LessonPhase::for_message_count(10), LessonPhase::Implement);
        assert_eq!(LessonPhase::for_message_count(11), LessonPhase::Evaluate);
        assert_eq!(LessonPhase::Evaluate.to_string(), "evaluate");
    }
}
