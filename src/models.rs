//! Core data models for the finance agent router

use crate::error::OrchestrationError;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//
// ================= Actors & Routes =================
//

/// A named participant whose output becomes an attributed message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorName {
    #[serde(rename = "Financial_Data_Agent")]
    FinancialDataAgent,
    #[serde(rename = "Web_Research_Agent")]
    WebResearchAgent,
    #[serde(rename = "Output_Summarizing_Agent")]
    OutputSummarizer,
}

impl ActorName {
    pub const ALL: [ActorName; 3] = [
        ActorName::FinancialDataAgent,
        ActorName::WebResearchAgent,
        ActorName::OutputSummarizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorName::FinancialDataAgent => "Financial_Data_Agent",
            ActorName::WebResearchAgent => "Web_Research_Agent",
            ActorName::OutputSummarizer => "Output_Summarizing_Agent",
        }
    }
}

/// Label returned by the decision procedure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouteDecision {
    #[serde(rename = "Financial_Data_Agent")]
    FinancialDataAgent,
    #[serde(rename = "Web_Research_Agent")]
    WebResearchAgent,
    #[serde(rename = "Output_Summarizing_Agent")]
    OutputSummarizer,
    #[serde(rename = "FINISH")]
    Finish,
}

impl RouteDecision {
    /// Every label the decision procedure may answer with, `FINISH` first.
    pub const OPTIONS: [RouteDecision; 4] = [
        RouteDecision::Finish,
        RouteDecision::FinancialDataAgent,
        RouteDecision::WebResearchAgent,
        RouteDecision::OutputSummarizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::FinancialDataAgent => "Financial_Data_Agent",
            RouteDecision::WebResearchAgent => "Web_Research_Agent",
            RouteDecision::OutputSummarizer => "Output_Summarizing_Agent",
            RouteDecision::Finish => "FINISH",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::OPTIONS.iter().map(RouteDecision::as_str).collect()
    }
}

impl FromStr for RouteDecision {
    type Err = OrchestrationError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::OPTIONS
            .into_iter()
            .find(|option| option.as_str() == label)
            .ok_or_else(|| {
                OrchestrationError::InvalidRoute(format!(
                    "'{}' is not one of {:?}",
                    label,
                    Self::labels()
                ))
            })
    }
}

impl fmt::Display for ActorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ================= Messages =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in a conversation. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: Uuid,
    /// Append position within the owning conversation
    pub seq: u64,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<ActorName>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self.role {
            Role::User => " Human Message ",
            Role::Assistant => " Ai Message ",
        };
        writeln!(f, "{:=^80}", title)?;
        if let Some(name) = self.name {
            writeln!(f, "Name: {}", name)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.content)
    }
}

//
// ================= Conversation =================
//

/// Append-only history of one session plus the most recent routing choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: String,
    messages: Vec<Message>,
    next: Option<RouteDecision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            next: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// A fresh conversation seeded with exactly one user message
    pub fn seeded(thread_id: impl Into<String>, query: impl Into<String>) -> Self {
        let mut state = Self::new(thread_id);
        state.push_user(query);
        state
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Role::User, content.into(), None)
    }

    pub fn push_actor(&mut self, actor: ActorName, content: impl Into<String>) -> &Message {
        self.push(Role::Assistant, content.into(), Some(actor))
    }

    fn push(&mut self, role: Role, content: String, name: Option<ActorName>) -> &Message {
        let message = Message {
            message_id: Uuid::new_v4(),
            seq: self.messages.len() as u64,
            role,
            content,
            name,
            created_at: Utc::now(),
        };
        self.messages.push(message);
        self.updated_at = Utc::now();
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn next(&self) -> Option<RouteDecision> {
        self.next
    }

    pub fn set_next(&mut self, decision: RouteDecision) {
        self.next = Some(decision);
        self.updated_at = Utc::now();
    }

    /// The most recent user message, i.e. the question currently being answered
    pub fn latest_user_query(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Render the history as speaker-tagged text for a model prompt
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            let speaker = match (message.role, message.name) {
                (_, Some(name)) => name.as_str(),
                (Role::User, None) => "User",
                (Role::Assistant, None) => "Assistant",
            };
            out.push_str(&format!("[{}]: {}\n\n", speaker, message.content));
        }
        out.trim_end().to_string()
    }

    /// All message texts in append order, one per line
    pub fn joined_contents(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

//
// ================= Tool Results =================
//

/// Outcome of a data-provider backed operation: data or an error record,
/// never both. Serializes an error as `{"error": <reason>}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Data(Value),
    Error(String),
}

impl ToolResult {
    pub fn error(reason: impl Into<String>) -> Self {
        ToolResult::Error(reason.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            ToolResult::Data(value) => value,
            ToolResult::Error(reason) => serde_json::json!({ "error": reason }),
        }
    }

    /// First element of a sequence result
    pub fn first_record(&self) -> Option<&Value> {
        match self {
            ToolResult::Data(Value::Array(items)) => items.first(),
            _ => None,
        }
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToolResult::Data(value) => value.serialize(serializer),
            ToolResult::Error(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", reason)?;
                map.end()
            }
        }
    }
}

//
// ================= Run Output =================
//

/// What a single routing run appended to its session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub answer: Option<String>,
}
