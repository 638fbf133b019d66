//! Finance agent router
//!
//! A multi-agent assistant for financial questions:
//! - A supervisor model picks the next actor from the conversation so far
//! - A data agent calls the financial data provider through typed tools
//! - A research agent reads web pages
//! - A summarizer writes the final answer
//!
//! ROUTING LOOP:
//! SUPERVISOR → AGENT → SUPERVISOR → ... → SUMMARIZE → DONE

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gemini;
pub mod http;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod router;
pub mod state;
pub mod tools;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::Orchestrator;
pub use config::AppConfig;
