//! Tracing subscriber setup for binaries embedding the dispatch core.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the process. Environment variables take precedence over config:
//!
//! - `RPCPIPE_TRACE_LEVEL`: env-filter directive (default: `logging.level`)
//! - `RPCPIPE_TRACE_JSON`: `1` for JSON lines, `0` for compact text
//! - `RPCPIPE_TRACE_FILE`: append to this file instead of stderr

use crate::config::LoggingConfig;
use std::env;
use std::sync::OnceLock;

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Resolved logging settings after applying environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSettings {
    pub level: String,
    pub json: bool,
    pub file: Option<String>,
}

impl TraceSettings {
    /// Merge `RPCPIPE_TRACE_*` environment variables over `config`.
    pub fn resolve(config: &LoggingConfig) -> Self {
        Self::resolve_with(config, |key| env::var(key).ok())
    }

    fn resolve_with(config: &LoggingConfig, var: impl Fn(&str) -> Option<String>) -> Self {
        let level = var("RPCPIPE_TRACE_LEVEL").unwrap_or_else(|| config.level.clone());
        let json = var("RPCPIPE_TRACE_JSON").map_or_else(|| config.format == "json", |v| v != "0");
        let file = var("RPCPIPE_TRACE_FILE").or_else(|| config.file.clone());
        Self { level, json, file }
    }
}

/// Install the global subscriber. Safe to call more than once; only the
/// first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    let settings = TraceSettings::resolve(config);

    let writer = match &settings.file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = TRACE_GUARD.set(guard);
                non_blocking
            }
            Err(e) => {
                eprintln!("ERROR: Unable to open log file '{path}': {e}");
                stderr_writer()
            }
        },
        None => stderr_writer(),
    };

    let base = || {
        let filter = tracing_subscriber::EnvFilter::try_new(&settings.level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(writer.clone())
    };

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if settings.json {
        Box::new(base().json().finish())
    } else {
        Box::new(base().compact().finish())
    };

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn stderr_writer() -> tracing_appender::non_blocking::NonBlocking {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = TRACE_GUARD.set(guard);
    non_blocking
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(config: &LoggingConfig, vars: &[(&str, &str)]) -> TraceSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TraceSettings::resolve_with(config, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_values_without_env() {
        let settings = resolve(&LoggingConfig::default(), &[]);
        assert_eq!(settings.level, "info");
        assert!(!settings.json);
        assert!(settings.file.is_none());
    }

    #[test]
    fn test_json_format_from_config() {
        let config = LoggingConfig {
            format: "json".to_string(),
            ..LoggingConfig::default()
        };
        assert!(resolve(&config, &[]).json);
        assert!(!resolve(&config, &[("RPCPIPE_TRACE_JSON", "0")]).json);
    }

    #[test]
    fn test_env_overrides_config() {
        let settings = resolve(
            &LoggingConfig::default(),
            &[
                ("RPCPIPE_TRACE_LEVEL", "rpcpipe=trace"),
                ("RPCPIPE_TRACE_JSON", "1"),
                ("RPCPIPE_TRACE_FILE", "/tmp/rpcpipe.log"),
            ],
        );
        assert_eq!(settings.level, "rpcpipe=trace");
        assert!(settings.json);
        assert_eq!(settings.file.as_deref(), Some("/tmp/rpcpipe.log"));
    }
}
