//! Instrumentation configuration.
//!
//! Executors take an [`InstrumentationConfig`] explicitly. A process-wide default
//! exists for the composition root only ([`global`] / [`set_global`]); it is read
//! by [`CallExecutor::from_global`](crate::executor::CallExecutor::from_global)
//! and nowhere else.

use crate::observers::{default_error_handler, ErrorHandler, LogFormat, Observer};
use crate::{ErrorContext, Result};
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::sync::Arc;

/// Environment variable holding the default log format.
pub const LOG_FORMAT_ENV: &str = "AI_LIB_LOG_FORMAT";

/// Serializable part of the configuration (e.g. a section of an app config file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InstrumentationSettings {
    pub log_format: LogFormat,
}

#[derive(Clone)]
pub struct InstrumentationConfig {
    pub log_format: LogFormat,
    /// Observers attached to every call made through the executor.
    pub observers: Vec<Arc<dyn Observer>>,
    pub error_handler: ErrorHandler,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Off,
            observers: Vec::new(),
            error_handler: default_error_handler(),
        }
    }
}

impl InstrumentationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: InstrumentationSettings) -> Self {
        Self::default().with_log_format(settings.log_format)
    }

    /// Defaults plus the log format from `AI_LIB_LOG_FORMAT`, if set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(raw) => {
                let format = raw.parse::<LogFormat>().map_err(|e| match e {
                    crate::Error::Configuration { message, context } => {
                        crate::Error::Configuration {
                            message,
                            context: ErrorContext {
                                field_path: Some(LOG_FORMAT_ENV.to_string()),
                                ..context
                            },
                        }
                    }
                    other => other,
                })?;
                Ok(Self::default().with_log_format(format))
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }
}

impl std::fmt::Debug for InstrumentationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentationConfig")
            .field("log_format", &self.log_format)
            .field(
                "observers",
                &self.observers.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

static GLOBAL_CONFIG: Lazy<ArcSwap<InstrumentationConfig>> =
    Lazy::new(|| ArcSwap::from_pointee(InstrumentationConfig::default()));

/// Returns the process-wide default configuration.
pub fn global() -> Arc<InstrumentationConfig> {
    GLOBAL_CONFIG.load_full()
}

/// Replaces the process-wide default configuration.
pub fn set_global(config: InstrumentationConfig) {
    GLOBAL_CONFIG.store(Arc::new(config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::InMemoryObserver;

    #[test]
    fn settings_deserialize_with_defaults() {
        let s: InstrumentationSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.log_format, LogFormat::Off);
        let s: InstrumentationSettings =
            serde_json::from_str(r#"{"log_format":"basic-text"}"#).unwrap();
        assert_eq!(
            InstrumentationConfig::from_settings(s).log_format,
            LogFormat::BasicText
        );
    }

    #[test]
    fn builder_collects_observers() {
        let config = InstrumentationConfig::new()
            .with_log_format(LogFormat::DetailedJson)
            .with_observer(Arc::new(InMemoryObserver::new()));
        assert_eq!(config.observers.len(), 1);
        assert_eq!(config.log_format, LogFormat::DetailedJson);
        assert!(format!("{:?}", config).contains("in-memory"));
    }

    #[test]
    fn env_and_global_config() {
        // Both touch process-wide state, so they share one test.
        std::env::set_var(LOG_FORMAT_ENV, "detailed-object");
        assert_eq!(
            InstrumentationConfig::from_env().unwrap().log_format,
            LogFormat::DetailedObject
        );
        std::env::set_var(LOG_FORMAT_ENV, "verbose");
        let err = InstrumentationConfig::from_env().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some(LOG_FORMAT_ENV)
        );
        std::env::remove_var(LOG_FORMAT_ENV);
        assert_eq!(InstrumentationConfig::from_env().unwrap().log_format, LogFormat::Off);

        set_global(InstrumentationConfig::new().with_log_format(LogFormat::BasicText));
        assert_eq!(global().log_format, LogFormat::BasicText);
        set_global(InstrumentationConfig::default());
        assert_eq!(global().log_format, LogFormat::Off);
    }
}
