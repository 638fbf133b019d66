//! Scripted stand-ins for the network, the model and the loop's actors.
//!
//! Each double replays a fixed script and records what it was asked, so
//! tests can assert on both the outcome and the traffic.

use crate::agent::{Actor, ActorOutcome, Summarizer};
use crate::error::OrchestrationError;
use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::llm::{ChatModel, ChatRequest, ModelReply};
use crate::models::{ActorName, ConversationState, RouteDecision};
use crate::router::Router;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn http_ok(body: &str) -> std::result::Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status: 200,
        reason: "OK".to_string(),
        body: body.to_string(),
    })
}

pub fn http_status(code: u16, reason: &str) -> std::result::Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status: code,
        reason: reason.to_string(),
        body: String::new(),
    })
}

//
// ================= Transport =================
//

pub struct ScriptedTransport {
    script: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
    fallback: Option<std::result::Result<HttpResponse, TransportError>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Replays responses in order, then fails with "script exhausted"
    pub fn new(script: Vec<std::result::Result<HttpResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with the same response
    pub fn repeating(response: std::result::Result<HttpResponse, TransportError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(response) => response.clone(),
            None => Err(TransportError::Other("script exhausted".to_string())),
        }
    }
}

//
// ================= Model =================
//

pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(vec![Ok(ModelReply::Text(reply.to_string()))])
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, request: &ChatRequest) -> Result<ModelReply> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OrchestrationError::LlmError("no scripted reply".to_string())))
    }
}

//
// ================= Loop participants =================
//

/// Replays routing labels; an exhausted script keeps answering FINISH
pub struct ScriptedRouter {
    decisions: Mutex<VecDeque<Result<RouteDecision>>>,
    calls: AtomicUsize,
}

impl ScriptedRouter {
    pub fn new(decisions: Vec<Result<RouteDecision>>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn routes(decisions: &[RouteDecision]) -> Self {
        Self::new(decisions.iter().copied().map(Ok).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Router for ScriptedRouter {
    async fn decide(&self, _state: &ConversationState) -> Result<RouteDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RouteDecision::Finish))
    }
}

/// Router that never finishes
pub struct LoopingRouter(pub RouteDecision);

#[async_trait]
impl Router for LoopingRouter {
    async fn decide(&self, _state: &ConversationState) -> Result<RouteDecision> {
        Ok(self.0)
    }
}

pub struct StubActor {
    name: ActorName,
    outcome: ActorOutcome,
    seen: Mutex<Vec<usize>>,
}

impl StubActor {
    pub fn completed(name: ActorName, text: &str) -> Self {
        Self {
            name,
            outcome: ActorOutcome::Completed(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failed(name: ActorName, reason: &str) -> Self {
        Self {
            name,
            outcome: ActorOutcome::Failed(reason.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// History length observed on each invocation
    pub fn seen(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actor for StubActor {
    fn name(&self) -> ActorName {
        self.name
    }

    async fn act(&self, state: &ConversationState) -> ActorOutcome {
        self.seen.lock().unwrap().push(state.len());
        self.outcome.clone()
    }
}

pub struct StubSummarizer {
    reply: std::result::Result<String, String>,
}

impl StubSummarizer {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, _state: &ConversationState) -> Result<String> {
        self.reply
            .clone()
            .map_err(OrchestrationError::LlmError)
    }
}
