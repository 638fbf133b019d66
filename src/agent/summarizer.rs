//! Output summarizer: turns everything gathered into the final answer

use crate::error::OrchestrationError;
use crate::llm::{ChatModel, ChatRequest, ModelReply};
use crate::models::ConversationState;
use crate::prompts::SUMMARIZER_PROMPT;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, state: &ConversationState) -> Result<String>;
}

pub struct LlmSummarizer {
    model: Arc<dyn ChatModel>,
}

impl LlmSummarizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn build_request(state: &ConversationState) -> ChatRequest {
        let query = state.latest_user_query().unwrap_or_default();
        let material = format!(
            "Please summarize the following information:\n\n{}",
            state.joined_contents()
        );

        ChatRequest::new(SUMMARIZER_PROMPT)
            .with_user(format!("Original question: {}", query))
            .with_user(material)
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, state: &ConversationState) -> Result<String> {
        debug!(thread_id = %state.thread_id, messages = state.len(), "Summarizing");

        match self.model.chat(&Self::build_request(state)).await? {
            ModelReply::Text(text) => Ok(text),
            ModelReply::ToolCalls(_) => Err(OrchestrationError::LlmError(
                "summarizer requested tools it does not have".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Turn;
    use crate::models::ActorName;
    use crate::test_support::ScriptedModel;

    #[tokio::test]
    async fn test_sends_query_and_all_contents() {
        let model = Arc::new(ScriptedModel::text("AAPL trades at $191.20."));
        let summarizer = LlmSummarizer::new(model.clone());

        let mut state = ConversationState::seeded("t", "What is AAPL's price?");
        state.push_actor(ActorName::FinancialDataAgent, "{\"price\": 191.2}");

        let answer = summarizer.summarize(&state).await.unwrap();
        assert_eq!(answer, "AAPL trades at $191.20.");

        let request = &model.requests()[0];
        assert_eq!(request.system, SUMMARIZER_PROMPT);
        assert_eq!(
            request.turns,
            vec![
                Turn::User("Original question: What is AAPL's price?".to_string()),
                Turn::User(
                    "Please summarize the following information:\n\n\
                     What is AAPL's price?\n{\"price\": 191.2}"
                        .to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let summarizer = LlmSummarizer::new(model);

        let err = summarizer
            .summarize(&ConversationState::seeded("t", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::LlmError(_)));
    }
}
