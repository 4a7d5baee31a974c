//! Study-tutor orchestration.
//!
//! One call to [`TutorService::reply`] handles one student message:
//!
//! ```text
//! flags (first contact / hint / calibration)
//!   → system prompt (GADIE or legacy template)
//!   → + lightweight context (misconceptions, skill progress)
//!   → provider completion (system + history + message)
//!   → record today's activity
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::{ChatTurn, Completion, LlmProvider, providers};
use crate::store::StoreHandle;

use super::context::ContextBuilder;
use super::gadie::{self, GadieContext, LessonPhase, PromptStyle};

const HINT_MARKERS: &[&str] = &["podpowiedź", "podpowiedz", "wskazówk"];

/// One student message plus the conversation state the client tracks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TutorRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub skill_name: Option<String>,
    /// Messages already exchanged before this one.
    #[serde(default)]
    pub message_count: u32,
    /// Set by the client's "hint" button.
    #[serde(default)]
    pub hint_request: bool,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorReply {
    pub request_id: Uuid,
    pub reply: String,
    pub phase: LessonPhase,
}

#[derive(Debug, Clone)]
pub struct TutorSettings {
    pub tutor_name: String,
    pub prompt_style: PromptStyle,
    pub calibration_interval: u32,
}

#[derive(Clone)]
pub struct TutorService {
    provider: LlmProvider,
    context: ContextBuilder,
    store: StoreHandle,
    settings: TutorSettings,
}

impl TutorService {
    pub fn new(
        provider: LlmProvider,
        context: ContextBuilder,
        store: StoreHandle,
        settings: TutorSettings,
    ) -> Self {
        Self { provider, context, store, settings }
    }

    /// Wire a service from loaded config: provider, context builder, settings.
    pub fn from_config(config: &Config, store: StoreHandle) -> Result<Self, AppError> {
        let provider = providers::build(&config.llm, config.llm_api_key.clone())?;
        let context = ContextBuilder::new(store.clone(), config.context.clone());
        let settings = TutorSettings {
            tutor_name: config.tutor_name.clone(),
            prompt_style: config.prompt_style,
            calibration_interval: config.calibration_interval,
        };
        Ok(Self::new(provider, context, store, settings))
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    pub fn tutor_name(&self) -> &str {
        &self.settings.tutor_name
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Start a new conversation: resets the mock round-robin when active.
    pub fn reset_conversation(&self) {
        if let Some(mock) = self.provider.as_mock() {
            mock.reset();
            debug!("mock conversation reset");
        }
    }

    /// Derive the per-turn template flags from a request.
    pub fn gadie_context(&self, req: &TutorRequest) -> GadieContext {
        let interval = self.settings.calibration_interval.max(1);
        GadieContext {
            skill_name: req.skill_name.clone(),
            is_first_contact: req.message_count == 0,
            is_hint_request: req.hint_request || mentions_hint(&req.message),
            needs_calibration_reminder: req.message_count > 0 && req.message_count % interval == 0,
            message_count: req.message_count,
            tutor_name: Some(self.settings.tutor_name.clone()),
        }
    }

    /// Full system prompt for a request: template plus optional context.
    pub async fn system_prompt(&self, req: &TutorRequest) -> String {
        let ctx = self.gadie_context(req);
        let mut prompt = gadie::build_prompt(self.settings.prompt_style, &ctx);
        if let Some(extra) = self.context.build(&req.user_id, req.skill_id.as_deref()).await {
            prompt.push_str(&extra);
        }
        prompt
    }

    pub async fn reply(&self, req: TutorRequest) -> Result<TutorReply, AppError> {
        let message = req.message.trim();
        if message.is_empty() {
            return Err(AppError::InvalidRequest("message must not be empty".into()));
        }
        if req.user_id.trim().is_empty() {
            return Err(AppError::InvalidRequest("user_id must not be empty".into()));
        }

        let request_id = Uuid::new_v4();
        let phase = LessonPhase::for_message_count(req.message_count);
        let system = self.system_prompt(&req).await;

        info!(
            %request_id,
            user_id = %req.user_id,
            skill_id = ?req.skill_id,
            message_count = req.message_count,
            %phase,
            style = %self.settings.prompt_style,
            provider = self.provider.name(),
            prompt_len = system.len(),
            "tutor request"
        );

        let completion = Completion {
            system: Some(system),
            history: req.history.clone(),
            content: message.to_string(),
        };
        let reply = self.provider.complete(&completion).await?;

        let today = Local::now().date_naive();
        if let Err(e) = self.store.record_activity(&req.user_id, today).await {
            warn!(%request_id, user_id = %req.user_id, error = %e, "failed to record activity");
        }

        debug!(%request_id, reply_len = reply.len(), "tutor reply ready");
        Ok(TutorReply { request_id, reply, phase })
    }
}

/// Whether the student is asking for a hint in their own words.
pub fn mentions_hint(message: &str) -> bool {
    let lower = message.to_lowercase();
    HINT_MARKERS.iter().any(|m| lower.contains(m))
}
