//! Chat model abstraction
//!
//! The router, the tool agents and the summarizer talk to the language model
//! through `ChatModel`, so each can be driven by a scripted model in tests.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function the model may call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub name: String,
    pub response: Value,
}

/// One turn of the model-facing dialogue
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    ToolCalls(Vec<ToolCall>),
    ToolResults(Vec<ToolResponse>),
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system: String,
    pub turns: Vec<Turn>,
    pub tools: Vec<ToolSpec>,
    /// Constrain the reply to JSON matching this schema
    pub response_schema: Option<Value>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, text: impl Into<String>) -> Self {
        self.turns.push(Turn::User(text.into()));
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelReply>;
}
