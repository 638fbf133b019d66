//! Gemini API client
//!
//! Implements `ChatModel` against `generateContent`, including function
//! calling and JSON-schema constrained replies.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::LlmConfig;
use crate::error::OrchestrationError;
use crate::llm::{ChatModel, ChatRequest, ModelReply, ToolCall, Turn};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    temperature: f32,
    max_output_tokens: i32,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn build_request(&self, request: &ChatRequest) -> GeminiRequest {
        let contents = request.turns.iter().map(content_from_turn).collect();

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![ToolDeclarations {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|spec| FunctionDeclaration {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        parameters: spec.parameters.clone(),
                    })
                    .collect(),
            }]
        };

        GeminiRequest {
            contents,
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(&request.system)],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
            },
            tools,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn chat(&self, request: &ChatRequest) -> crate::Result<ModelReply> {
        if self.api_key.is_empty() {
            return Err(OrchestrationError::LlmError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let body = self.build_request(request);

        debug!(
            turns = request.turns.len(),
            tools = request.tools.len(),
            structured = request.response_schema.is_some(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                OrchestrationError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(OrchestrationError::LlmError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            OrchestrationError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                prompt_tokens = usage.prompt_token_count.unwrap_or(0),
                reply_tokens = usage.candidates_token_count.unwrap_or(0),
                "Gemini response received"
            );
        }

        reply_from_response(gemini_response)
    }
}

fn content_from_turn(turn: &Turn) -> Content {
    match turn {
        Turn::User(text) => Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        },
        Turn::ToolCalls(calls) => Content {
            role: Some("model".to_string()),
            parts: calls
                .iter()
                .map(|call| Part {
                    function_call: Some(FunctionCall {
                        name: call.name.clone(),
                        args: call.args.clone(),
                    }),
                    ..Part::default()
                })
                .collect(),
        },
        Turn::ToolResults(results) => Content {
            role: Some("user".to_string()),
            parts: results
                .iter()
                .map(|result| Part {
                    function_response: Some(FunctionResponse {
                        name: result.name.clone(),
                        // Gemini requires an object here
                        response: json!({ "result": result.response }),
                    }),
                    ..Part::default()
                })
                .collect(),
        },
    }
}

fn reply_from_response(response: GeminiResponse) -> crate::Result<ModelReply> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        OrchestrationError::LlmError("No response from Gemini API".to_string())
    })?;

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let calls: Vec<ToolCall> = parts
        .iter()
        .filter_map(|part| part.function_call.as_ref())
        .map(|call| ToolCall {
            name: call.name.clone(),
            args: call.args.clone(),
        })
        .collect();

    if !calls.is_empty() {
        return Ok(ModelReply::ToolCalls(calls));
    }

    let text: String = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        return Err(OrchestrationError::LlmError(format!(
            "Empty response from Gemini (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(ModelReply::Text(text))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclarations>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ToolResponse, ToolSpec};

    fn client() -> GeminiClient {
        GeminiClient::new(&LlmConfig {
            api_key: "k".to_string(),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_includes_model() {
        assert_eq!(
            client().endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest::new("You are a financial data agent")
            .with_user("What is AAPL's price?")
            .with_tools(vec![ToolSpec {
                name: "get_stock_price".to_string(),
                description: "Fetch the current stock price".to_string(),
                parameters: json!({"type": "OBJECT", "properties": {"symbol": {"type": "STRING"}}}),
            }]);

        let json = serde_json::to_value(client().build_request(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is AAPL's price?");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You are a financial data agent");
        assert_eq!(json["tools"][0]["functionDeclarations"][0]["name"], "get_stock_price");
        assert!(json["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_tool_turns_serialization() {
        let mut request = ChatRequest::new("sys").with_response_schema(json!({"type": "OBJECT"}));
        request.turns.push(Turn::ToolCalls(vec![ToolCall {
            name: "get_stock_price".to_string(),
            args: json!({"symbol": "AAPL"}),
        }]));
        request.turns.push(Turn::ToolResults(vec![ToolResponse {
            name: "get_stock_price".to_string(),
            response: json!({"price": 191.2}),
        }]));

        let json = serde_json::to_value(client().build_request(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "model");
        assert_eq!(json["contents"][0]["parts"][0]["functionCall"]["args"]["symbol"], "AAPL");
        assert_eq!(
            json["contents"][1]["parts"][0]["functionResponse"]["response"]["result"]["price"],
            191.2
        );
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_reply_prefers_function_calls() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Let me look that up."},
                    {"functionCall": {"name": "get_stock_price", "args": {"symbol": "AAPL"}}}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let reply = reply_from_response(response).unwrap();
        assert_eq!(
            reply,
            ModelReply::ToolCalls(vec![ToolCall {
                name: "get_stock_price".to_string(),
                args: json!({"symbol": "AAPL"}),
            }])
        );
    }

    #[test]
    fn test_reply_text_and_empty() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"next\":"}, {"text": "\"FINISH\"}"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 3}
        }))
        .unwrap();
        assert_eq!(
            reply_from_response(response).unwrap(),
            ModelReply::Text("{\"next\":\"FINISH\"}".to_string())
        );

        let empty: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(
            reply_from_response(empty),
            Err(OrchestrationError::LlmError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let client = GeminiClient::new(&LlmConfig::default()).unwrap();
        let err = client.chat(&ChatRequest::new("sys").with_user("hi")).await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
