//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory: called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod mock;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "mock" => Ok(LlmProvider::Mock(mock::MockProvider::new(config.mock.simulate_delay))),
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn llm_config(provider: &str) -> LlmConfig {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp")).llm;
        cfg.provider = provider.to_string();
        cfg
    }

    #[test]
    fn builds_known_providers() {
        assert_eq!(build(&llm_config("dummy"), None).unwrap().name(), "dummy");
        assert_eq!(build(&llm_config("mock"), None).unwrap().name(), "mock");
        assert_eq!(build(&llm_config("openai"), Some("k".into())).unwrap().name(), "openai");
        assert_eq!(build(&llm_config("openai-compatible"), None).unwrap().name(), "openai");
    }

    #[test]
    fn unknown_provider_errors() {
        let err = build(&llm_config("claude-local"), None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(ref p) if p == "claude-local"));
    }
}
