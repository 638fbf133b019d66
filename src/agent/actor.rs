//! Tool-using worker agents
//!
//! A `ToolAgent` hands the conversation to the model together with its tool
//! subset and keeps executing requested calls until the model answers in text.

use crate::error::OrchestrationError;
use crate::llm::{ChatModel, ChatRequest, ModelReply, ToolResponse, Turn};
use crate::models::{ActorName, ConversationState};
use crate::tools::ToolRegistry;
use crate::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one actor step, as seen by the routing loop
#[derive(Debug, Clone, PartialEq)]
pub enum ActorOutcome {
    Completed(String),
    Failed(String),
}

#[async_trait]
pub trait Actor: Send + Sync {
    fn name(&self) -> ActorName;

    async fn act(&self, state: &ConversationState) -> ActorOutcome;
}

pub struct ToolAgent {
    actor: ActorName,
    system_prompt: &'static str,
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    max_tool_rounds: usize,
}

impl ToolAgent {
    pub fn new(
        actor: ActorName,
        system_prompt: &'static str,
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            actor,
            system_prompt,
            model,
            tools,
            max_tool_rounds,
        }
    }

    async fn run_tools(&self, state: &ConversationState) -> Result<String> {
        let mut request = ChatRequest::new(self.system_prompt)
            .with_user(state.transcript())
            .with_tools(self.tools.specs());

        for round in 0..=self.max_tool_rounds {
            let calls = match self.model.chat(&request).await? {
                ModelReply::Text(text) => return Ok(text),
                ModelReply::ToolCalls(calls) => calls,
            };

            if round == self.max_tool_rounds {
                break;
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                debug!(agent = %self.actor, tool = %call.name, args = %call.args, "Calling tool");
                let response = match self.tools.call(&call.name, &call.args).await {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(agent = %self.actor, tool = %call.name, error = %e, "Tool call failed");
                        json!({ "error": e.to_string() })
                    }
                };
                results.push(ToolResponse {
                    name: call.name.clone(),
                    response,
                });
            }

            request.turns.push(Turn::ToolCalls(calls));
            request.turns.push(Turn::ToolResults(results));
        }

        Err(OrchestrationError::ToolCallLimit(self.max_tool_rounds))
    }
}

#[async_trait]
impl Actor for ToolAgent {
    fn name(&self) -> ActorName {
        self.actor
    }

    async fn act(&self, state: &ConversationState) -> ActorOutcome {
        info!(agent = %self.actor, "Agent acting");

        match self.run_tools(state).await {
            Ok(text) => ActorOutcome::Completed(text),
            Err(e) => {
                warn!(agent = %self.actor, error = %e, "Agent failed");
                ActorOutcome::Failed(e.to_string())
            }
        }
    }
}
