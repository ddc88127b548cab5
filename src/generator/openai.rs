use reqwest::blocking::Client;
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    http::{
        ensure_success,
        http_client,
    },
    CardForgeError,
};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, system: &str, user: &str) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage { role: Role::System, content: system.to_string() },
                ChatMessage { role: Role::User, content: user.to_string() },
            ],
            temperature: 0.7,
            max_tokens: 1000,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Offers `function` as the only tool and forces the model to call it.
    pub fn with_forced_function(mut self, function: FunctionDef) -> Self {
        self.tool_choice = Some(ToolChoice {
            kind: "function".to_string(),
            function: FunctionName { name: function.name.clone() },
        });
        self.tools = vec![Tool { kind: "function".to_string(), function }];
        self
    }

    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// What the model sent back, before any JSON parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    FunctionArguments(String),
    Content(String),
}

impl ChatReply {
    pub fn text(&self) -> &str {
        match self {
            ChatReply::FunctionArguments(text) | ChatReply::Content(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

/// Picks tool-call arguments first, then the legacy `function_call`, then content.
pub fn reply_from_body(body: &str) -> Result<ChatReply, CardForgeError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| CardForgeError::MissingField("choices".to_string()))?;

    if let Some(call) = message.tool_calls.into_iter().flatten().next() {
        return Ok(ChatReply::FunctionArguments(call.function.arguments));
    }
    if let Some(call) = message.function_call {
        return Ok(ChatReply::FunctionArguments(call.arguments));
    }
    message
        .content
        .map(ChatReply::Content)
        .ok_or_else(|| CardForgeError::MissingField("choices[0].message.content".to_string()))
}

pub trait ChatCompletion {
    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, CardForgeError>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, CardForgeError> {
        Ok(Self { client: http_client()?, api_key: api_key.into() })
    }
}

impl ChatCompletion for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, CardForgeError> {
        tracing::debug!("Chat completion request: model={} tools={}", request.model, request.tools.len());

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;
        let body = ensure_success(response)?.text()?;
        tracing::debug!("Chat completion response: {}", body);

        reply_from_body(&body)
    }
}
