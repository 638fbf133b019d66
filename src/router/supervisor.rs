//! Model-backed supervisor router
//!
//! Sends the supervisor prompt and the transcript, and constrains the model
//! to reply with `{"next": <label>}`.

use super::{parse_route_response, Router};
use crate::error::OrchestrationError;
use crate::llm::{ChatModel, ChatRequest, ModelReply};
use crate::models::{ConversationState, RouteDecision};
use crate::prompts;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

pub struct SupervisorRouter {
    model: Arc<dyn ChatModel>,
}

impl SupervisorRouter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn route_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "next": {
                    "type": "STRING",
                    "format": "enum",
                    "enum": RouteDecision::labels()
                }
            },
            "required": ["next"]
        })
    }

    fn build_request(state: &ConversationState) -> ChatRequest {
        let prompt = format!(
            "{}\n\n{}",
            state.transcript(),
            prompts::routing_instruction()
        );

        ChatRequest::new(prompts::supervisor_prompt())
            .with_user(prompt)
            .with_response_schema(Self::route_schema())
    }
}

#[async_trait]
impl Router for SupervisorRouter {
    async fn decide(&self, state: &ConversationState) -> Result<RouteDecision> {
        let request = Self::build_request(state);

        match self.model.chat(&request).await? {
            ModelReply::Text(raw) => {
                let decision = parse_route_response(&raw).map_err(|e| {
                    error!(reply = %raw, "Supervisor returned an invalid route");
                    e
                })?;
                debug!(next = %decision, "Supervisor decided");
                Ok(decision)
            }
            ModelReply::ToolCalls(calls) => Err(OrchestrationError::InvalidRoute(format!(
                "supervisor answered with {} tool call(s) instead of a route",
                calls.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ToolCall, Turn};
    use crate::test_support::ScriptedModel;

    #[tokio::test]
    async fn test_decides_from_structured_reply() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::Text(
            r#"{"next":"Financial_Data_Agent"}"#.to_string(),
        ))]));
        let router = SupervisorRouter::new(model.clone());
        let state = ConversationState::seeded("t", "What is AAPL's price?");

        let decision = router.decide(&state).await.unwrap();
        assert_eq!(decision, RouteDecision::FinancialDataAgent);

        let request = &model.requests()[0];
        assert!(request.system.contains("Financial_Data_Agent, Web_Research_Agent"));
        assert!(request.response_schema.is_some());
        match &request.turns[0] {
            Turn::User(text) => {
                assert!(text.starts_with("[User]: What is AAPL's price?"));
                assert!(text.contains("Or should we FINISH?"));
            }
            other => panic!("unexpected turn {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_label_is_invalid_route() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::Text(
            r#"{"next":"Chart_Agent"}"#.to_string(),
        ))]));
        let router = SupervisorRouter::new(model);

        let err = router
            .decide(&ConversationState::seeded("t", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidRoute(_)));
    }

    #[tokio::test]
    async fn test_tool_call_reply_is_invalid_route() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply::ToolCalls(vec![
            ToolCall {
                name: "get_stock_price".to_string(),
                args: json!({"symbol": "AAPL"}),
            },
        ]))]));
        let router = SupervisorRouter::new(model);

        let err = router
            .decide(&ConversationState::seeded("t", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidRoute(_)));
    }
}
