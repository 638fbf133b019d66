//! Webpage reading tool for the research agent

use super::{parse_args, Tool};
use crate::web::WebExtractor;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ReadWebpageTool {
    extractor: Arc<WebExtractor>,
}

impl ReadWebpageTool {
    pub fn new(extractor: Arc<WebExtractor>) -> Self {
        Self { extractor }
    }
}

#[derive(Deserialize)]
struct UrlArgs {
    url: String,
}

#[async_trait::async_trait]
impl Tool for ReadWebpageTool {
    fn name(&self) -> &'static str {
        "read_webpage"
    }

    fn description(&self) -> &'static str {
        "Read the text content of a webpage URL."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "url": {"type": "STRING", "description": "Absolute http(s) URL"}
            },
            "required": ["url"]
        })
    }

    async fn call(&self, args: &Value) -> Result<Value> {
        let args: UrlArgs = parse_args(self.name(), args)?;
        Ok(Value::String(self.extractor.extract(&args.url).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_ok, ScriptedTransport};
    use std::time::Duration;

    #[tokio::test]
    async fn test_returns_page_text() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok(
            "<html><body><h1>Earnings</h1><p>Revenue  up 8%</p></body></html>",
        )));
        let tool = ReadWebpageTool::new(Arc::new(WebExtractor::new(
            transport.clone(),
            Duration::from_secs(10),
        )));

        let value = tool
            .call(&json!({"url": "https://example.com/news"}))
            .await
            .unwrap();

        assert_eq!(value, json!("Earnings\nRevenue\nup 8%"));
        assert_eq!(transport.requests()[0].url, "https://example.com/news");
    }
}
