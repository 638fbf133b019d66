//! Financial data tools backed by the data fetcher

use super::{parse_args, ScreenerFilters, Tool};
use crate::fetcher::DataFetcher;
use crate::models::ToolResult;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Annual,
    Quarter,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Annual => "annual",
            Period::Quarter => "quarter",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Statement {
    #[default]
    IncomeStatement,
    BalanceSheetStatement,
    CashFlowStatement,
}

impl Statement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statement::IncomeStatement => "income-statement",
            Statement::BalanceSheetStatement => "balance-sheet-statement",
            Statement::CashFlowStatement => "cash-flow-statement",
        }
    }
}

/// `{"price": n}` from the first quote row; errors pass through
fn price_from(result: ToolResult) -> ToolResult {
    if result.is_error() {
        return result;
    }
    match result.first_record().and_then(|record| record.get("price")) {
        Some(price) => ToolResult::Data(json!({ "price": price })),
        None => ToolResult::error("No price data available"),
    }
}

/// First row of a sequence result, or `missing` as the error
fn first_or(result: ToolResult, missing: &str) -> ToolResult {
    if result.is_error() {
        return result;
    }
    match result.first_record() {
        Some(record) => ToolResult::Data(record.clone()),
        None => ToolResult::error(missing),
    }
}

fn period_param(period: Period) -> Vec<(String, String)> {
    vec![("period".to_string(), period.as_str().to_string())]
}

/// Typed financial queries over the provider's endpoint family
pub struct FinancialData {
    fetcher: Arc<DataFetcher>,
}

impl FinancialData {
    pub fn new(fetcher: Arc<DataFetcher>) -> Self {
        Self { fetcher }
    }

    /// Latest price as `{"price": n}`
    pub async fn price(&self, symbol: &str) -> ToolResult {
        let result = self.fetcher.fetch(&format!("quote-short/{}", symbol), vec![]).await;
        price_from(result)
    }

    pub async fn profile(&self, symbol: &str) -> ToolResult {
        let result = self.fetcher.fetch(&format!("profile/{}", symbol), vec![]).await;
        first_or(result, "No company profile data available")
    }

    pub async fn ratios(&self, symbol: &str, period: Period) -> ToolResult {
        self.fetcher
            .fetch(&format!("ratios/{}", symbol), period_param(period))
            .await
    }

    pub async fn key_metrics(&self, symbol: &str, period: Period) -> ToolResult {
        self.fetcher
            .fetch(&format!("key-metrics/{}", symbol), period_param(period))
            .await
    }

    pub async fn market_cap(&self, symbol: &str) -> ToolResult {
        let result = self
            .fetcher
            .fetch(&format!("market-capitalization/{}", symbol), vec![])
            .await;
        first_or(result, "No market cap data available")
    }

    pub async fn screener(&self, filters: &ScreenerFilters) -> ToolResult {
        self.fetcher.fetch("stock-screener", filters.to_query()).await
    }

    /// Statement rows as returned by the provider; an error comes back as a
    /// one-element sequence
    pub async fn line_items(&self, ticker: &str, statement: Statement, period: Period) -> Value {
        let result = self
            .fetcher
            .fetch(&format!("{}/{}", statement.as_str(), ticker), period_param(period))
            .await;

        match result {
            ToolResult::Data(value) => value,
            error @ ToolResult::Error(_) => Value::Array(vec![error.into_value()]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialToolKind {
    Price,
    Profile,
    Ratios,
    KeyMetrics,
    MarketCap,
    Screener,
    Statement,
}

impl FinancialToolKind {
    const ALL: [FinancialToolKind; 7] = [
        FinancialToolKind::Price,
        FinancialToolKind::Profile,
        FinancialToolKind::Ratios,
        FinancialToolKind::KeyMetrics,
        FinancialToolKind::MarketCap,
        FinancialToolKind::Screener,
        FinancialToolKind::Statement,
    ];
}

/// One model-callable financial operation
pub struct FinancialTool {
    kind: FinancialToolKind,
    data: Arc<FinancialData>,
}

impl FinancialTool {
    pub fn new(kind: FinancialToolKind, data: Arc<FinancialData>) -> Self {
        Self { kind, data }
    }

    pub fn all(data: Arc<FinancialData>) -> Vec<Self> {
        FinancialToolKind::ALL
            .into_iter()
            .map(|kind| Self::new(kind, data.clone()))
            .collect()
    }
}

#[derive(Deserialize)]
struct SymbolArgs {
    symbol: String,
}

#[derive(Deserialize)]
struct PeriodArgs {
    symbol: String,
    #[serde(default)]
    period: Period,
}

#[derive(Deserialize)]
struct StatementArgs {
    ticker: String,
    #[serde(default)]
    statement: Statement,
    #[serde(default)]
    period: Period,
}

fn symbol_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "symbol": {"type": "STRING", "description": "Ticker symbol, e.g. AAPL"}
        },
        "required": ["symbol"]
    })
}

fn period_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "symbol": {"type": "STRING", "description": "Ticker symbol, e.g. AAPL"},
            "period": {"type": "STRING", "format": "enum", "enum": ["annual", "quarter"]}
        },
        "required": ["symbol"]
    })
}

#[async_trait::async_trait]
impl Tool for FinancialTool {
    fn name(&self) -> &'static str {
        match self.kind {
            FinancialToolKind::Price => "get_stock_price",
            FinancialToolKind::Profile => "get_company_profile",
            FinancialToolKind::Ratios => "get_financial_ratios",
            FinancialToolKind::KeyMetrics => "get_key_metrics",
            FinancialToolKind::MarketCap => "get_market_cap",
            FinancialToolKind::Screener => "get_stock_screener",
            FinancialToolKind::Statement => "generate_single_line_item_query",
        }
    }

    fn description(&self) -> &'static str {
        match self.kind {
            FinancialToolKind::Price => "Fetch the current stock price for a given symbol.",
            FinancialToolKind::Profile => "Fetch the company profile for a given symbol.",
            FinancialToolKind::Ratios => "Fetch financial ratios for a given symbol.",
            FinancialToolKind::KeyMetrics => "Fetch key metrics for a given symbol.",
            FinancialToolKind::MarketCap => "Fetch the current market capitalization for a given symbol.",
            FinancialToolKind::Screener => "Find stocks matching screening criteria.",
            FinancialToolKind::Statement => {
                "Fetch income, balance sheet or cash flow statement line items for a ticker."
            }
        }
    }

    fn parameters(&self) -> Value {
        match self.kind {
            FinancialToolKind::Price | FinancialToolKind::Profile | FinancialToolKind::MarketCap => {
                symbol_schema()
            }
            FinancialToolKind::Ratios | FinancialToolKind::KeyMetrics => period_schema(),
            FinancialToolKind::Screener => ScreenerFilters::schema(),
            FinancialToolKind::Statement => json!({
                "type": "OBJECT",
                "properties": {
                    "ticker": {"type": "STRING", "description": "Ticker symbol, e.g. AAPL"},
                    "statement": {
                        "type": "STRING",
                        "format": "enum",
                        "enum": ["income-statement", "balance-sheet-statement", "cash-flow-statement"]
                    },
                    "period": {"type": "STRING", "format": "enum", "enum": ["annual", "quarter"]}
                },
                "required": ["ticker"]
            }),
        }
    }

    async fn call(&self, args: &Value) -> Result<Value> {
        let name = self.name();
        info!(tool = name, %args, "Calling financial tool");

        let result = match self.kind {
            FinancialToolKind::Price => {
                let args: SymbolArgs = parse_args(name, args)?;
                self.data.price(&args.symbol).await
            }
            FinancialToolKind::Profile => {
                let args: SymbolArgs = parse_args(name, args)?;
                self.data.profile(&args.symbol).await
            }
            FinancialToolKind::Ratios => {
                let args: PeriodArgs = parse_args(name, args)?;
                self.data.ratios(&args.symbol, args.period).await
            }
            FinancialToolKind::KeyMetrics => {
                let args: PeriodArgs = parse_args(name, args)?;
                self.data.key_metrics(&args.symbol, args.period).await
            }
            FinancialToolKind::MarketCap => {
                let args: SymbolArgs = parse_args(name, args)?;
                self.data.market_cap(&args.symbol).await
            }
            FinancialToolKind::Screener => {
                let filters: ScreenerFilters = parse_args(name, args)?;
                self.data.screener(&filters).await
            }
            FinancialToolKind::Statement => {
                let args: StatementArgs = parse_args(name, args)?;
                return Ok(self
                    .data
                    .line_items(&args.ticker, args.statement, args.period)
                    .await);
            }
        };

        Ok(result.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FmpConfig;
    use crate::fetcher::RetryPolicy;
    use crate::test_support::{http_ok, http_status, ScriptedTransport};

    fn data(transport: Arc<ScriptedTransport>) -> FinancialData {
        let config = FmpConfig {
            api_key: "k".to_string(),
            base_url: "https://provider.test/api/v3".to_string(),
            ..FmpConfig::default()
        };
        let fetcher = DataFetcher::new(transport, &config).with_policy(RetryPolicy::immediate(2));
        FinancialData::new(Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_price_takes_first_record() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok(
            r#"[{"symbol":"AAPL","price":191.2,"volume":51234}]"#,
        )));
        let result = data(transport.clone()).price("AAPL").await;

        assert_eq!(result, ToolResult::Data(json!({"price": 191.2})));
        assert!(transport.requests()[0].url.contains("/quote-short/AAPL?"));
    }

    #[test]
    fn test_price_from_derivation() {
        assert_eq!(
            price_from(ToolResult::Data(json!([{"symbol": "AAPL", "price": 191.2}]))),
            ToolResult::Data(json!({"price": 191.2}))
        );
        assert_eq!(
            price_from(ToolResult::Data(json!([]))),
            ToolResult::error("No price data available")
        );
        assert_eq!(
            price_from(ToolResult::Data(json!([{"symbol": "AAPL"}]))),
            ToolResult::error("No price data available")
        );
        assert_eq!(price_from(ToolResult::error("boom")), ToolResult::error("boom"));
    }

    #[test]
    fn test_first_or_on_empty_sequence() {
        assert_eq!(
            first_or(ToolResult::Data(json!([])), "No market cap data available"),
            ToolResult::error("No market cap data available")
        );
    }

    #[tokio::test]
    async fn test_price_passes_fetch_errors_through() {
        let transport = Arc::new(ScriptedTransport::repeating(http_status(403, "Forbidden")));
        let result = data(transport).price("AAPL").await;
        assert_eq!(
            result,
            ToolResult::error("API access forbidden. Please check your API key.")
        );
    }

    #[tokio::test]
    async fn test_profile_and_market_cap() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            http_ok(r#"[{"symbol":"AAPL","companyName":"Apple Inc."}]"#),
            http_ok(r#"[{"symbol":"AAPL","marketCap":2950000000000}]"#),
        ]));
        let data = data(transport.clone());

        assert_eq!(
            data.profile("AAPL").await,
            ToolResult::Data(json!({"symbol": "AAPL", "companyName": "Apple Inc."}))
        );
        assert_eq!(
            data.market_cap("AAPL").await,
            ToolResult::Data(json!({"symbol": "AAPL", "marketCap": 2950000000000u64}))
        );
        assert!(transport.requests()[1].url.contains("/market-capitalization/AAPL?"));
    }

    #[tokio::test]
    async fn test_profile_and_market_cap_of_objects_without_rows() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok(r#"{"symbol":"AAPL"}"#)));
        let data = data(transport);

        assert_eq!(
            data.profile("AAPL").await,
            ToolResult::error("No company profile data available")
        );
        assert_eq!(
            data.market_cap("AAPL").await,
            ToolResult::error("No market cap data available")
        );
    }

    #[tokio::test]
    async fn test_ratios_and_metrics_send_period() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok(r#"[{"currentRatio":1.1}]"#)));
        let data = data(transport.clone());

        let ratios = data.ratios("MSFT", Period::Quarter).await;
        assert_eq!(ratios, ToolResult::Data(json!([{"currentRatio": 1.1}])));
        data.key_metrics("MSFT", Period::Annual).await;

        let requests = transport.requests();
        assert_eq!(
            requests[0].url,
            "https://provider.test/api/v3/ratios/MSFT?period=quarter&apikey=k"
        );
        assert_eq!(
            requests[1].url,
            "https://provider.test/api/v3/key-metrics/MSFT?period=annual&apikey=k"
        );
    }

    #[tokio::test]
    async fn test_line_items_wrap_errors() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            http_ok(r#"[{"revenue":1},{"revenue":2}]"#),
            http_ok(r#"{"Error Message":"Invalid API KEY."}"#),
        ]));
        let data = data(transport.clone());

        let rows = data
            .line_items("AAPL", Statement::CashFlowStatement, Period::Quarter)
            .await;
        assert_eq!(rows, json!([{"revenue": 1}, {"revenue": 2}]));
        assert!(transport.requests()[0]
            .url
            .contains("/cash-flow-statement/AAPL?period=quarter"));

        let rows = data
            .line_items("AAPL", Statement::IncomeStatement, Period::Annual)
            .await;
        assert_eq!(rows, json!([{"error": "Invalid API KEY."}]));
    }

    #[tokio::test]
    async fn test_line_items_pass_single_record_through() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok(
            r#"{"symbol":"AAPL","revenue":383285000000}"#,
        )));

        let value = data(transport)
            .line_items("AAPL", Statement::IncomeStatement, Period::Annual)
            .await;
        assert_eq!(value, json!({"symbol": "AAPL", "revenue": 383285000000u64}));
    }

    #[test]
    fn test_tool_names() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok("[]")));
        let data = Arc::new(data(transport));
        assert_eq!(
            FinancialTool::new(FinancialToolKind::Screener, data.clone()).name(),
            "get_stock_screener"
        );
        assert_eq!(
            FinancialTool::new(FinancialToolKind::Statement, data).name(),
            "generate_single_line_item_query"
        );
    }

    #[tokio::test]
    async fn test_statement_tool_defaults() {
        let transport = Arc::new(ScriptedTransport::repeating(http_ok(r#"[{"revenue":1}]"#)));
        let tool = FinancialTool::new(FinancialToolKind::Statement, Arc::new(data(transport.clone())));

        let value = tool.call(&json!({"ticker": "AAPL"})).await.unwrap();
        assert_eq!(value, json!([{"revenue": 1}]));
        assert!(transport.requests()[0]
            .url
            .contains("/income-statement/AAPL?period=annual"));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(Statement::BalanceSheetStatement).unwrap(),
            json!("balance-sheet-statement")
        );
        let period: Period = serde_json::from_value(json!("quarter")).unwrap();
        assert_eq!(period, Period::Quarter);
    }
}
