//! Main orchestrator - implements the routing loop
//!
//! SUPERVISOR → (FINANCIAL DATA | WEB RESEARCH) → SUPERVISOR → ... → SUMMARIZE → DONE

pub mod actor;
pub mod summarizer;

pub use actor::{Actor, ActorOutcome, ToolAgent};
pub use summarizer::{LlmSummarizer, Summarizer};

use crate::config::AppConfig;
use crate::error::OrchestrationError;
use crate::fetcher::DataFetcher;
use crate::gemini::GeminiClient;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::llm::ChatModel;
use crate::models::{ActorName, ConversationState, Message, RouteDecision, RunReport};
use crate::prompts;
use crate::router::{Router, SupervisorRouter};
use crate::state::{InMemorySessionStore, SessionStore};
use crate::tools::{create_financial_registry, create_web_registry};
use crate::web::WebExtractor;
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_STEPS: usize = 25;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Supervisor,
    FinancialDataAgent,
    WebResearchAgent,
    OutputSummarizer,
    Done,
}

impl Stage {
    /// FINISH and an explicit summarizer choice both lead to the summarizer
    pub fn after(decision: RouteDecision) -> Stage {
        match decision {
            RouteDecision::FinancialDataAgent => Stage::FinancialDataAgent,
            RouteDecision::WebResearchAgent => Stage::WebResearchAgent,
            RouteDecision::OutputSummarizer | RouteDecision::Finish => Stage::OutputSummarizer,
        }
    }
}

/// Render an actor outcome as the text of its message
fn render_outcome(outcome: ActorOutcome) -> String {
    match outcome {
        ActorOutcome::Completed(text) => text,
        ActorOutcome::Failed(reason) => format!("An error occurred: {}", reason),
    }
}

/// Main orchestrator that routes one query at a time through the actors
pub struct Orchestrator {
    router: Arc<dyn Router>,
    financial_agent: Arc<dyn Actor>,
    web_agent: Arc<dyn Actor>,
    summarizer: Arc<dyn Summarizer>,
    sessions: Arc<dyn SessionStore>,
    max_steps: usize,
}

impl Orchestrator {
    pub fn new(
        router: Arc<dyn Router>,
        financial_agent: Arc<dyn Actor>,
        web_agent: Arc<dyn Actor>,
        summarizer: Arc<dyn Summarizer>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            router,
            financial_agent,
            web_agent,
            summarizer,
            sessions,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Wire the production stack: reqwest transport, Gemini model, in-memory sessions
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
        let model: Arc<dyn ChatModel> = Arc::new(GeminiClient::new(&config.llm)?);

        let fetcher = Arc::new(DataFetcher::new(transport.clone(), &config.fmp));
        let extractor = Arc::new(WebExtractor::new(transport, config.routing.web_timeout));

        let financial_agent = ToolAgent::new(
            ActorName::FinancialDataAgent,
            prompts::FINANCIAL_DATA_PROMPT,
            model.clone(),
            create_financial_registry(fetcher),
            config.routing.max_tool_rounds,
        );
        let web_agent = ToolAgent::new(
            ActorName::WebResearchAgent,
            prompts::WEB_RESEARCH_PROMPT,
            model.clone(),
            create_web_registry(extractor),
            config.routing.max_tool_rounds,
        );

        Ok(Self::new(
            Arc::new(SupervisorRouter::new(model.clone())),
            Arc::new(financial_agent),
            Arc::new(web_agent),
            Arc::new(LlmSummarizer::new(model)),
            Arc::new(InMemorySessionStore::new()),
        )
        .with_max_steps(config.routing.max_steps))
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }

    pub async fn run(&self, thread_id: &str, query: &str) -> Result<RunReport> {
        self.run_streaming(thread_id, query, None).await
    }

    /// Run the routing loop for one query, sending each actor message to
    /// `stream` as soon as it is appended
    pub async fn run_streaming(
        &self,
        thread_id: &str,
        query: &str,
        stream: Option<&UnboundedSender<Message>>,
    ) -> Result<RunReport> {
        let handle = self.sessions.open(thread_id).await?;
        let mut state = handle.lock().await;

        info!(
            thread_id = %thread_id,
            history = state.len(),
            query = %query,
            "Orchestrator: starting run"
        );

        state.push_user(query);
        let first_new = state.len();

        self.drive(&mut state, stream).await?;

        let messages = state.messages()[first_new..].to_vec();
        let answer = messages
            .iter()
            .rev()
            .find(|m| m.name == Some(ActorName::OutputSummarizer))
            .map(|m| m.content.clone());

        info!(thread_id = %thread_id, appended = messages.len(), "Orchestrator: run complete");

        Ok(RunReport {
            thread_id: thread_id.to_string(),
            messages,
            answer,
        })
    }

    async fn drive(
        &self,
        state: &mut ConversationState,
        stream: Option<&UnboundedSender<Message>>,
    ) -> Result<()> {
        let mut stage = Stage::Supervisor;
        let mut decisions = 0;

        loop {
            debug!(?stage, "Routing loop step");

            stage = match stage {
                Stage::Supervisor => {
                    if decisions >= self.max_steps {
                        return Err(OrchestrationError::MaxStepsExceeded(format!(
                            "{} supervisor decisions without reaching FINISH",
                            self.max_steps
                        )));
                    }
                    decisions += 1;

                    let decision = self.router.decide(state).await?;
                    info!(next = %decision, step = decisions, "Supervisor routed");
                    state.set_next(decision);
                    Stage::after(decision)
                }
                Stage::FinancialDataAgent => {
                    self.step_actor(&self.financial_agent, state, stream).await;
                    Stage::Supervisor
                }
                Stage::WebResearchAgent => {
                    self.step_actor(&self.web_agent, state, stream).await;
                    Stage::Supervisor
                }
                Stage::OutputSummarizer => {
                    let text = match self.summarizer.summarize(state).await {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "Summarizer failed");
                            format!("An error occurred: {}", e)
                        }
                    };
                    Self::append(state, ActorName::OutputSummarizer, text, stream);
                    Stage::Done
                }
                Stage::Done => return Ok(()),
            };
        }
    }

    async fn step_actor(
        &self,
        actor: &Arc<dyn Actor>,
        state: &mut ConversationState,
        stream: Option<&UnboundedSender<Message>>,
    ) {
        let outcome = actor.act(state).await;
        if let ActorOutcome::Failed(reason) = &outcome {
            warn!(actor = %actor.name(), reason = %reason, "Actor failed; recording as message");
        }
        Self::append(state, actor.name(), render_outcome(outcome), stream);
    }

    fn append(
        state: &mut ConversationState,
        actor: ActorName,
        text: String,
        stream: Option<&UnboundedSender<Message>>,
    ) {
        let message = state.push_actor(actor, text);
        if let Some(tx) = stream {
            // A closed receiver only means nobody is watching
            let _ = tx.send(message.clone());
        }
    }
}
