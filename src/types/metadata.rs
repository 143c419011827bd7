//! Per-call metadata recorded in every lifecycle event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of model function being instrumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionType {
    Embed,
    GenerateText,
    StreamText,
    GenerateStructure,
    StreamStructure,
    GenerateImage,
    GenerateSpeech,
    StreamSpeech,
    GenerateTranscription,
    GenerateToolCall,
    GenerateToolCalls,
    ExecuteTool,
    ExecuteFunction,
    Retrieve,
    Classify,
}

impl FunctionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionType::Embed => "embed",
            FunctionType::GenerateText => "generate-text",
            FunctionType::StreamText => "stream-text",
            FunctionType::GenerateStructure => "generate-structure",
            FunctionType::StreamStructure => "stream-structure",
            FunctionType::GenerateImage => "generate-image",
            FunctionType::GenerateSpeech => "generate-speech",
            FunctionType::StreamSpeech => "stream-speech",
            FunctionType::GenerateTranscription => "generate-transcription",
            FunctionType::GenerateToolCall => "generate-tool-call",
            FunctionType::GenerateToolCalls => "generate-tool-calls",
            FunctionType::ExecuteTool => "execute-tool",
            FunctionType::ExecuteFunction => "execute-function",
            FunctionType::Retrieve => "retrieve",
            FunctionType::Classify => "classify",
        }
    }
}

impl std::fmt::Display for FunctionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record created when a call starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMetadata {
    /// Unique per invocation.
    pub call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Caller-supplied label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_id: Option<String>,
    pub function_type: FunctionType,
    pub input: Value,
    /// Model settings snapshot, for logging only.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub settings: Value,
    pub started_at_ms: u64,
}

pub(crate) fn new_call_id() -> String {
    format!("call-{}", uuid::Uuid::new_v4())
}
