//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `MENTAVO_CONFIG`), then applies
//! `MENTAVO_DATA_DIR` and `MENTAVO_LOG_LEVEL` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;
use crate::tutor::context::ContextSettings;
use crate::tutor::gadie::PromptStyle;

/// PTY (console) channel configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
    /// User id the console session reads and writes as.
    pub user_id: String,
}

/// HTTP channel configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    /// Socket address to bind the HTTP channel to.
    pub bind: String,
}

#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub pty: PtyConfig,
    pub http: HttpConfig,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Mock responder configuration (`[llm.mock]`).
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Sleep for each canned response's delay before returning it, and
    /// hold the console typing indicator for a human-like pause.
    pub simulate_delay: bool,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active: `"dummy"`, `"mock"` or `"openai"`.
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
    pub mock: MockConfig,
}

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Persona name: fills `{{tutor_name}}` in the system prompt and heads
    /// the console output.
    pub tutor_name: String,
    /// Directory holding the JSON store files (already expanded, no `~`).
    pub data_dir: PathBuf,
    pub log_level: String,
    pub prompt_style: PromptStyle,
    /// Every N-th message carries the calibration reminder block.
    pub calibration_interval: u32,
    pub context: ContextSettings,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var: `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    tutor: RawTutor,
    #[serde(default)]
    context: RawContext,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawTutor {
    #[serde(default = "default_tutor_name")]
    name: String,
    data_dir: String,
    log_level: String,
    #[serde(default = "default_prompt_style")]
    prompt_style: String,
    #[serde(default = "default_calibration_interval")]
    calibration_interval: u32,
}

#[derive(Deserialize)]
struct RawContext {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_min_strength")]
    min_strength: f64,
    #[serde(default = "default_misconception_limit")]
    misconception_limit: usize,
}

impl Default for RawContext {
    fn default() -> Self {
        Self {
            enabled: true,
            min_strength: default_min_strength(),
            misconception_limit: default_misconception_limit(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    pty: RawPty,
    #[serde(default)]
    http: RawHttp,
}

#[derive(Deserialize)]
struct RawPty {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_console_user")]
    user_id: String,
}

impl Default for RawPty {
    fn default() -> Self {
        Self { enabled: true, user_id: default_console_user() }
    }
}

#[derive(Deserialize)]
struct RawHttp {
    /// Defaults to `false`: HTTP must be explicitly enabled.
    #[serde(default = "default_false")]
    enabled: bool,
    #[serde(default = "default_http_bind")]
    bind: String,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { enabled: false, bind: default_http_bind() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
    #[serde(default)]
    mock: RawMockConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            openai: RawOpenAiConfig::default(),
            mock: RawMockConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawMockConfig {
    #[serde(default = "default_true")]
    simulate_delay: bool,
}

impl Default for RawMockConfig {
    fn default() -> Self {
        Self { simulate_delay: true }
    }
}

fn default_tutor_name() -> String { "Mentavo".to_string() }
fn default_prompt_style() -> String { "gadie".to_string() }
fn default_calibration_interval() -> u32 { 8 }
fn default_min_strength() -> f64 { 0.3 }
fn default_misconception_limit() -> usize { 3 }
fn default_console_user() -> String { "console".to_string() }
fn default_http_bind() -> String { "127.0.0.1:8080".to_string() }
fn default_llm_provider() -> String { "mock".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.7 }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_true() -> bool { true }
fn default_false() -> bool { false }

/// Load config from `config/default.toml` (or `MENTAVO_CONFIG`), then apply
/// env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("MENTAVO_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let data_dir_override = env::var("MENTAVO_DATA_DIR").ok();
    let log_level_override = env::var("MENTAVO_LOG_LEVEL").ok();
    load_from(
        Path::new(&path),
        data_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader: accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    data_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let t = parsed.tutor;

    let data_dir = expand_home(data_dir_override.unwrap_or(&t.data_dir));
    let (log_level_key, log_level) = match log_level_override {
        Some(level) => ("MENTAVO_LOG_LEVEL", level.to_string()),
        None => ("tutor.log_level", t.log_level),
    };
    logger::parse_level(log_level_key, &log_level)?;

    let prompt_style: PromptStyle = t.prompt_style.parse().map_err(AppError::Config)?;

    if t.calibration_interval == 0 {
        return Err(AppError::Config("tutor.calibration_interval must be at least 1".into()));
    }
    if !(0.0..=1.0).contains(&parsed.context.min_strength) {
        return Err(AppError::Config(format!(
            "context.min_strength must be within 0..=1, got {}",
            parsed.context.min_strength
        )));
    }

    Ok(Config {
        tutor_name: t.name,
        data_dir,
        log_level,
        prompt_style,
        calibration_interval: t.calibration_interval,
        context: ContextSettings {
            enabled: parsed.context.enabled,
            min_strength: parsed.context.min_strength,
            misconception_limit: parsed.context.misconception_limit,
        },
        comms: CommsConfig {
            pty: PtyConfig {
                enabled: parsed.comms.pty.enabled,
                user_id: parsed.comms.pty.user_id,
            },
            http: HttpConfig {
                enabled: parsed.comms.http.enabled,
                bind: parsed.comms.http.bind,
            },
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
            mock: MockConfig { simulate_delay: parsed.llm.mock.simulate_delay },
        },
        llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for tests: mock LLM without delays, no API keys.
impl Config {
    pub fn test_default(data_dir: &Path) -> Self {
        Self {
            tutor_name: "Mentavo".into(),
            data_dir: data_dir.to_path_buf(),
            log_level: "info".into(),
            prompt_style: PromptStyle::Gadie,
            calibration_interval: default_calibration_interval(),
            context: ContextSettings::default(),
            comms: CommsConfig {
                pty: PtyConfig { enabled: false, user_id: default_console_user() },
                http: HttpConfig { enabled: false, bind: default_http_bind() },
            },
            llm: LlmConfig {
                provider: "mock".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
                mock: MockConfig { simulate_delay: false },
            },
            llm_api_key: None,
        }
    }
}
