//! Wire envelopes for the bidirectional generate-content service.
//!
//! Outbound messages use the service's snake_case field names, inbound ones
//! arrive camelCased; the serde renames below pin both so the structs can
//! stay idiomatic. Inbound parsing is deliberately lenient: every field is
//! optional or defaulted because a live session must survive whatever shape
//! the service sends next.

use crate::audio::CAPTURE_RATE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---- outbound ----

/// First message after the socket opens: model, modality, temperature,
/// system instruction, and the tool declarations.
#[derive(Debug, Serialize)]
pub struct SetupMessage {
    pub setup: Setup,
}

#[derive(Debug, Serialize)]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: SystemInstruction,
    pub tools: Vec<ToolDeclarations>,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ToolDeclarations {
    pub function_declarations: Vec<Value>,
}

impl SetupMessage {
    pub fn new(
        model: String,
        temperature: f32,
        instruction: String,
        function_declarations: Vec<Value>,
    ) -> Self {
        Self {
            setup: Setup {
                model,
                generation_config: GenerationConfig {
                    response_modalities: vec!["AUDIO".to_string()],
                    temperature,
                },
                system_instruction: SystemInstruction {
                    parts: vec![TextPart { text: instruction }],
                },
                tools: vec![ToolDeclarations {
                    function_declarations,
                }],
            },
        }
    }
}

/// One realtime microphone frame, already base64-encoded PCM16.
#[derive(Debug, Serialize)]
pub struct RealtimeInputMessage {
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Serialize)]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Serialize)]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

impl RealtimeInputMessage {
    pub fn audio_frame(data: String) -> Self {
        Self {
            realtime_input: RealtimeInput {
                media_chunks: vec![MediaChunk {
                    mime_type: format!("audio/pcm;rate={CAPTURE_RATE}"),
                    data,
                }],
            },
        }
    }
}

/// The answer to a tool-call envelope: one response entry per invocation,
/// correlated by id.
#[derive(Debug, Serialize)]
pub struct ToolResponseMessage {
    pub tool_response: ToolResponse,
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub function_responses: Vec<FunctionResponse>,
}

#[derive(Debug, Serialize)]
pub struct FunctionResponse {
    pub id: String,
    pub name: String,
    pub response: FunctionOutput,
}

#[derive(Debug, Serialize)]
pub struct FunctionOutput {
    pub output: String,
}

impl ToolResponseMessage {
    pub fn new(responses: Vec<FunctionResponse>) -> Self {
        Self {
            tool_response: ToolResponse {
                function_responses: responses,
            },
        }
    }
}

// ---- inbound ----

#[derive(Debug, Default, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "toolCall")]
    pub tool_call: Option<ToolCallEnvelope>,
    #[serde(rename = "serverContent")]
    pub server_content: Option<ServerContent>,
    #[serde(rename = "setupComplete")]
    pub setup_complete: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolCallEnvelope {
    #[serde(rename = "functionCalls", default)]
    pub function_calls: Vec<FunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerContent {
    #[serde(rename = "modelTurn")]
    pub model_turn: Option<ModelTurn>,
    #[serde(default)]
    pub interrupted: bool,
    #[serde(rename = "turnComplete", default)]
    pub turn_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelTurn {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "inlineData")]
    pub inline_data: Option<InlineData>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

impl ServerMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Base64 audio payloads in arrival order, if any.
    pub fn audio_payloads(&self) -> Vec<&str> {
        self.server_content
            .as_ref()
            .and_then(|content| content.model_turn.as_ref())
            .map(|turn| {
                turn.parts
                    .iter()
                    .filter_map(|part| part.inline_data.as_ref())
                    .map(|inline| inline.data.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_interrupted(&self) -> bool {
        self.server_content
            .as_ref()
            .map(|content| content.interrupted)
            .unwrap_or(false)
    }
}
