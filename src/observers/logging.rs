//! Built-in logging observers.

use super::Observer;
use crate::types::LifecycleEvent;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// `tracing` target used by the logging observers.
pub const CALL_LOG_TARGET: &str = "ai_lib_instrument::calls";

const BINARY_ARRAY_MIN_LEN: usize = 64;
const BASE64_MIN_LEN: usize = 1024;

/// Output style of the built-in call logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    #[serde(alias = "none")]
    Off,
    BasicText,
    DetailedObject,
    DetailedJson,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "off" | "none" => Ok(LogFormat::Off),
            "basic-text" => Ok(LogFormat::BasicText),
            "detailed-object" => Ok(LogFormat::DetailedObject),
            "detailed-json" => Ok(LogFormat::DetailedJson),
            other => Err(Error::configuration_with_context(
                "unknown log format",
                ErrorContext::new()
                    .with_field_path("log_format")
                    .with_details(format!(
                        "got '{}', expected off|basic-text|detailed-object|detailed-json",
                        other
                    )),
            )),
        }
    }
}

/// Zero or one logging observer for `format`.
pub fn logger_for(format: LogFormat) -> Option<Arc<dyn Observer>> {
    match format {
        LogFormat::Off => None,
        LogFormat::BasicText => Some(Arc::new(BasicTextObserver)),
        LogFormat::DetailedObject => Some(Arc::new(DetailedObjectObserver)),
        LogFormat::DetailedJson => Some(Arc::new(DetailedJsonObserver)),
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| {
            Error::configuration_with_context(
                e.to_string(),
                ErrorContext::new().with_source("init_tracing"),
            )
        })
}

/// One line per event.
pub struct BasicTextObserver;

impl BasicTextObserver {
    pub fn format(event: &LifecycleEvent) -> String {
        match event {
            LifecycleEvent::Started {
                metadata,
                timestamp_ms,
            } => format!(
                "[{}] {} - {} started",
                timestamp_ms, metadata.call_id, metadata.function_type
            ),
            LifecycleEvent::Finished {
                metadata,
                finished_at_ms,
                duration_ms,
                result,
            } => format!(
                "[{}] {} - {} finished in {}ms ({})",
                finished_at_ms,
                metadata.call_id,
                metadata.function_type,
                duration_ms,
                result.status()
            ),
        }
    }
}

impl Observer for BasicTextObserver {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        info!(target: CALL_LOG_TARGET, "{}", Self::format(event));
        Ok(())
    }

    fn name(&self) -> &str {
        "basic-text"
    }
}

/// Cleaned event rendered in Rust debug notation.
pub struct DetailedObjectObserver;

impl Observer for DetailedObjectObserver {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        let cleaned = clean_event(event)?;
        info!(target: CALL_LOG_TARGET, "{:#?}", cleaned);
        Ok(())
    }

    fn name(&self) -> &str {
        "detailed-object"
    }
}

/// Cleaned event rendered as pretty JSON.
pub struct DetailedJsonObserver;

impl Observer for DetailedJsonObserver {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        let rendered = serde_json::to_string_pretty(&clean_event(event)?)?;
        info!(target: CALL_LOG_TARGET, "{}", rendered);
        Ok(())
    }

    fn name(&self) -> &str {
        "detailed-json"
    }
}

/// Event as JSON with raw responses removed and binary payloads elided.
pub fn clean_event(event: &LifecycleEvent) -> Result<Value> {
    let mut value = serde_json::to_value(event)?;
    elide(&mut value);
    Ok(value)
}

fn is_raw_response_key(key: &str) -> bool {
    key == "raw_response" || key == "rawResponse"
}

fn is_byte_array(items: &[Value]) -> bool {
    items.len() > BINARY_ARRAY_MIN_LEN
        && items
            .iter()
            .all(|v| v.as_u64().map(|n| n <= u8::MAX as u64).unwrap_or(false))
}

fn looks_like_base64(s: &str) -> bool {
    s.len() > BASE64_MIN_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'))
}

fn elide(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !is_raw_response_key(key));
            for v in map.values_mut() {
                elide(v);
            }
        }
        Value::Array(items) if is_byte_array(items) => {
            let len = items.len();
            *value = Value::String(format!("<binary {} bytes>", len));
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                elide(v);
            }
        }
        Value::String(s) if looks_like_base64(s) => {
            let len = s.len();
            *value = Value::String(format!("<base64 {} chars>", len));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallMetadata, CallResult, FunctionType};
    use serde_json::json;

    fn finished(input: Value, raw: Option<Value>) -> LifecycleEvent {
        LifecycleEvent::Finished {
            metadata: CallMetadata {
                call_id: "call-log".into(),
                parent_call_id: None,
                run_id: None,
                session_id: None,
                user_id: None,
                function_id: Some("describe".into()),
                function_type: FunctionType::GenerateSpeech,
                input,
                settings: json!({"model": "tts-1", "rawResponse": {"secret": true}}),
                started_at_ms: 5,
            },
            finished_at_ms: 17,
            duration_ms: 12,
            result: CallResult::Success {
                value: Some(json!("ok")),
                raw_response: raw,
                usage: None,
            },
        }
    }

    #[test]
    fn parses_log_formats() {
        assert_eq!("basic-text".parse::<LogFormat>().unwrap(), LogFormat::BasicText);
        assert_eq!("DETAILED-JSON".parse::<LogFormat>().unwrap(), LogFormat::DetailedJson);
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Off);
        assert!("loud".parse::<LogFormat>().is_err());

        let parsed: LogFormat = serde_json::from_value(json!("detailed-object")).unwrap();
        assert_eq!(parsed, LogFormat::DetailedObject);
        let parsed: LogFormat = serde_json::from_value(json!("none")).unwrap();
        assert_eq!(parsed, LogFormat::Off);
    }

    #[test]
    fn logger_selection() {
        assert!(logger_for(LogFormat::Off).is_none());
        assert_eq!(logger_for(LogFormat::BasicText).unwrap().name(), "basic-text");
        assert_eq!(logger_for(LogFormat::DetailedJson).unwrap().name(), "detailed-json");
    }

    #[test]
    fn basic_text_line() {
        let line = BasicTextObserver::format(&finished(json!("hi"), None));
        assert_eq!(line, "[17] call-log - generate-speech finished in 12ms (success)");
    }

    #[test]
    fn cleaning_drops_raw_responses_and_binary_payloads() {
        let audio: Vec<u8> = (0..200u32).map(|i| (i % 256) as u8).collect();
        let blob = "A".repeat(2048);
        let event = finished(
            json!({"text": "hello", "audio": audio, "image": blob}),
            Some(json!({"huge": "provider body"})),
        );

        let cleaned = clean_event(&event).unwrap();
        assert!(cleaned["result"].get("raw_response").is_none());
        assert!(cleaned["metadata"]["settings"].get("rawResponse").is_none());
        assert_eq!(cleaned["metadata"]["settings"]["model"], "tts-1");
        assert_eq!(cleaned["metadata"]["input"]["text"], "hello");
        assert_eq!(cleaned["metadata"]["input"]["audio"], "<binary 200 bytes>");
        assert_eq!(cleaned["metadata"]["input"]["image"], "<base64 2048 chars>");
    }

    #[test]
    fn small_arrays_are_kept() {
        let event = finished(json!([1, 2, 3]), None);
        let cleaned = clean_event(&event).unwrap();
        assert_eq!(cleaned["metadata"]["input"], json!([1, 2, 3]));
    }

    #[test]
    fn detailed_observers_do_not_fail_on_plain_events() {
        let event = finished(json!("hi"), Some(json!({"id": 1})));
        DetailedObjectObserver.on_event(&event).unwrap();
        DetailedJsonObserver.on_event(&event).unwrap();
        BasicTextObserver.on_event(&event).unwrap();
    }
}
