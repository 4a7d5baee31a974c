//! Logging for the tutor service.
//!
//! `tutor.log_level` sets the baseline for every target, except the HTTP
//! client/server stack, which is held at `warn` or quieter so per-request
//! connection noise does not bury tutor events.  `RUST_LOG`, when set, is
//! layered on top: its directives refine individual targets
//! (`RUST_LOG=reqwest=debug`) without replacing the configured baseline.

use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::error::AppError;

/// Crates whose logs are capped at `warn` unless `RUST_LOG` says otherwise.
const HTTP_STACK_TARGETS: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "rustls", "axum", "tower"];

/// Install the global subscriber at the configured tutor level.
///
/// Fails when `level` is not a valid level or a subscriber is already set.
/// Malformed `RUST_LOG` directives are skipped and reported once the
/// subscriber is live.
pub fn init(level: &str) -> Result<(), AppError> {
    let level = parse_level("tutor.log_level", level)?;

    let mut filter = EnvFilter::try_new(baseline_directives(level))
        .map_err(|e| AppError::Logger(format!("invalid baseline filter: {e}")))?;

    let mut rejected = Vec::new();
    if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
        for raw in env.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match raw.parse::<Directive>() {
                Ok(d) => filter = filter.add_directive(d),
                Err(_) => rejected.push(raw.to_string()),
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    for raw in rejected {
        warn!(directive = %raw, "ignoring malformed RUST_LOG directive");
    }
    Ok(())
}

/// Filter string for a tutor level: the level itself plus the HTTP stack
/// capped at `warn`.
pub fn baseline_directives(level: LevelFilter) -> String {
    let quiet = level.min(LevelFilter::WARN);
    let mut directives = vec![level.to_string().to_lowercase()];
    directives.extend(HTTP_STACK_TARGETS.iter().map(|t| format!("{t}={}", quiet.to_string().to_lowercase())));
    directives.join(",")
}

/// Validate the level found under config key `key`.
pub fn parse_level(key: &str, value: &str) -> Result<LevelFilter, AppError> {
    // LevelFilter reads "" as ERROR; an empty setting is a mistake here.
    if value.trim().is_empty() {
        return Err(AppError::Config(format!("{key}: log level must not be empty")));
    }
    value.trim().parse::<LevelFilter>().map_err(|_| {
        AppError::Config(format!(
            "{key}: unrecognised log level '{value}' (expected off, error, warn, info, debug or trace)"
        ))
    })
}
