//! Router trait and implementations
//!
//! The router is the decision procedure of the routing loop: it reads the
//! whole conversation and names the next actor, or FINISH.

use crate::error::OrchestrationError;
use crate::models::{ConversationState, RouteDecision};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;

pub mod supervisor;
pub use supervisor::SupervisorRouter;

/// Trait for next-actor selection
#[async_trait]
pub trait Router: Send + Sync {
    async fn decide(&self, state: &ConversationState) -> Result<RouteDecision>;
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    next: String,
}

/// Parse a structured `{"next": "<label>"}` reply.
/// Anything else, including an unknown label, is an `InvalidRoute` error.
pub fn parse_route_response(raw: &str) -> Result<RouteDecision> {
    let response: RouteResponse = serde_json::from_str(raw.trim()).map_err(|e| {
        OrchestrationError::InvalidRoute(format!("malformed supervisor reply '{}': {}", raw, e))
    })?;
    response.next.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_labels() {
        assert_eq!(
            parse_route_response(r#"{"next": "Web_Research_Agent"}"#).unwrap(),
            RouteDecision::WebResearchAgent
        );
        assert_eq!(
            parse_route_response("  {\"next\":\"FINISH\"}\n").unwrap(),
            RouteDecision::Finish
        );
    }

    #[test]
    fn test_out_of_enum_label_is_hard_error() {
        let err = parse_route_response(r#"{"next": "Calculator_Agent"}"#).unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidRoute(_)));
    }

    #[test]
    fn test_malformed_reply_is_hard_error() {
        for raw in ["FINISH", r#"{"agent": "FINISH"}"#, "", r#"{"next": 3}"#] {
            let err = parse_route_response(raw).unwrap_err();
            assert!(matches!(err, OrchestrationError::InvalidRoute(_)), "{}", raw);
        }
    }
}
