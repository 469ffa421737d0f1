//! Logging configuration and initialization.
//!
//! Presets pick a base level per `lantern::*` target. `--log TARGET=LEVEL`
//! overrides a single target, and `RUST_LOG` replaces the whole filter.

use std::collections::HashMap;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "lantern::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, API and errors; per-message chat detail is off.
    #[default]
    Production,
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only.
    Quiet,
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides, keyed by full target name.
    pub overrides: HashMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        // "chat=debug,db=trace" or "lantern::chat=debug"
        let mut overrides = HashMap::new();
        for part in log_overrides.iter().flat_map(|s| s.split(',')) {
            let Some((target, level)) = part.split_once('=') else {
                continue;
            };
            let target = target.trim();
            let full_target = if target.starts_with(TARGET_PREFIX) || target == "tower_http" {
                target.to_string()
            } else {
                format!("{TARGET_PREFIX}{target}")
            };
            if let Some(level) = parse_level(level.trim()) {
                overrides.insert(full_target, level);
            }
        }

        Self {
            preset,
            overrides,
            format,
        }
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn directives(&self) -> String {
        let mut directives: Vec<String> = match self.preset {
            LogPreset::Production => vec![
                "lantern::startup=info".into(),
                "lantern::api=info".into(),
                "lantern::db=info".into(),
                "lantern::chat=info".into(),
                "lantern::files=info".into(),
                "lantern::ollama=warn".into(),
                "tower_http=warn".into(),
            ],
            LogPreset::Verbose => vec!["lantern=info".into(), "tower_http=info".into()],
            LogPreset::Debug => vec!["lantern=debug".into(), "tower_http=debug".into()],
            LogPreset::Trace => vec!["lantern=trace".into(), "tower_http=trace".into()],
            LogPreset::Quiet => vec!["lantern=warn".into(), "tower_http=error".into()],
        };

        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level.as_str().to_lowercase()));
        }
        directives.join(",")
    }
}

fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_preset_priority() {
        let config = LogConfig::from_cli(true, true, true, true, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Quiet);

        let config = LogConfig::from_cli(true, true, true, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Trace);

        let config = LogConfig::from_cli(true, true, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Debug);

        let config = LogConfig::from_cli(false, false, false, false, vec![], LogFormat::Text);
        assert_eq!(config.preset, LogPreset::Production);
    }

    #[test]
    fn test_overrides_are_prefixed() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["chat=debug".into(), "db=trace,lantern::files=warn".into(), "tower_http=info".into()],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("lantern::chat"), Some(&Level::DEBUG));
        assert_eq!(config.overrides.get("lantern::db"), Some(&Level::TRACE));
        assert_eq!(config.overrides.get("lantern::files"), Some(&Level::WARN));
        assert_eq!(config.overrides.get("tower_http"), Some(&Level::INFO));
    }

    #[test]
    fn test_bad_override_ignored() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["chat=loud".into(), "nonsense".into()],
            LogFormat::Text,
        );
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_override_appended_to_preset() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            true,
            vec!["chat=debug".into()],
            LogFormat::Text,
        );
        let directives = config.directives();
        assert!(directives.starts_with("lantern=warn"));
        assert!(directives.ends_with("lantern::chat=debug"));
    }
}
