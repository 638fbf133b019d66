//! Tool trait and registry
//!
//! Tools are what the worker agents may call. Financial tools wrap the data
//! fetcher; the web tool wraps the page extractor.

pub mod financial;
pub mod screener;
pub mod web;

pub use financial::{FinancialData, FinancialTool, FinancialToolKind, Period, Statement};
pub use screener::ScreenerFilters;
pub use web::ReadWebpageTool;

use crate::error::OrchestrationError;
use crate::fetcher::DataFetcher;
use crate::llm::ToolSpec;
use crate::web::WebExtractor;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for a single callable tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;
    async fn call(&self, args: &Value) -> Result<Value>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Declarations handed to the model, sorted by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.list()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Run a tool by name
    pub async fn call(&self, name: &str, args: &Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| OrchestrationError::ToolNotFound(name.to_string()))?;
        tool.call(args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize tool arguments, treating a missing/null args value as `{}`
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|e| {
        OrchestrationError::InvalidToolInput(format!("{}: {}", tool, e))
    })
}

/// Registry of every data-provider tool
pub fn create_financial_registry(fetcher: Arc<DataFetcher>) -> ToolRegistry {
    let data = Arc::new(FinancialData::new(fetcher));
    let mut registry = ToolRegistry::new();

    for tool in FinancialTool::all(data) {
        registry.register(Arc::new(tool));
    }

    registry
}

/// Registry holding only the webpage reader
pub fn create_web_registry(extractor: Arc<WebExtractor>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadWebpageTool::new(extractor)));
    registry
}
