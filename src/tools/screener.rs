//! Stock screener filters and their provider query encoding

use crate::fetcher::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

fn default_limit() -> u32 {
    10
}

/// Screening criteria; unset filters are not sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerFilters {
    pub market_cap_more_than: Option<u64>,
    pub market_cap_lower_than: Option<u64>,
    pub price_more_than: Option<f64>,
    pub price_lower_than: Option<f64>,
    pub beta_more_than: Option<f64>,
    pub beta_lower_than: Option<f64>,
    pub volume_more_than: Option<u64>,
    pub volume_lower_than: Option<u64>,
    pub dividend_more_than: Option<f64>,
    pub dividend_lower_than: Option<f64>,
    pub is_etf: Option<bool>,
    pub is_fund: Option<bool>,
    pub is_actively_trading: Option<bool>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub exchange: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for ScreenerFilters {
    fn default() -> Self {
        Self {
            market_cap_more_than: None,
            market_cap_lower_than: None,
            price_more_than: None,
            price_lower_than: None,
            beta_more_than: None,
            beta_lower_than: None,
            volume_more_than: None,
            volume_lower_than: None,
            dividend_more_than: None,
            dividend_lower_than: None,
            is_etf: None,
            is_fund: None,
            is_actively_trading: None,
            sector: None,
            industry: None,
            country: None,
            exchange: None,
            limit: default_limit(),
        }
    }
}

impl ScreenerFilters {
    /// Filters in declaration order, values already rendered for the query string.
    /// Booleans render as `true` / `false`.
    fn entries(&self) -> [(&'static str, Option<String>); 17] {
        fn text<T: ToString>(value: Option<T>) -> Option<String> {
            value.map(|v| v.to_string())
        }

        [
            ("market_cap_more_than", text(self.market_cap_more_than)),
            ("market_cap_lower_than", text(self.market_cap_lower_than)),
            ("price_more_than", text(self.price_more_than)),
            ("price_lower_than", text(self.price_lower_than)),
            ("beta_more_than", text(self.beta_more_than)),
            ("beta_lower_than", text(self.beta_lower_than)),
            ("volume_more_than", text(self.volume_more_than)),
            ("volume_lower_than", text(self.volume_lower_than)),
            ("dividend_more_than", text(self.dividend_more_than)),
            ("dividend_lower_than", text(self.dividend_lower_than)),
            ("is_etf", text(self.is_etf)),
            ("is_fund", text(self.is_fund)),
            ("is_actively_trading", text(self.is_actively_trading)),
            ("sector", self.sector.clone()),
            ("industry", self.industry.clone()),
            ("country", self.country.clone()),
            ("exchange", self.exchange.clone()),
        ]
    }

    /// Provider query: set filters under camel-case keys, then `limit`
    pub fn to_query(&self) -> QueryParams {
        let mut params: QueryParams = self
            .entries()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (to_camel_case(key), v)))
            .collect();
        params.push(("limit".to_string(), self.limit.to_string()));
        params
    }

    /// Argument schema for the model
    pub fn schema() -> Value {
        let mut properties = Map::new();
        for (key, _) in ScreenerFilters::default().entries() {
            let kind = match key {
                k if k.starts_with("is_") => "BOOLEAN",
                "market_cap_more_than" | "market_cap_lower_than" | "volume_more_than"
                | "volume_lower_than" => "INTEGER",
                "sector" | "industry" | "country" | "exchange" => "STRING",
                _ => "NUMBER",
            };
            properties.insert(key.to_string(), json!({ "type": kind }));
        }
        properties.insert(
            "limit".to_string(),
            json!({ "type": "INTEGER", "description": "Maximum results, default 10" }),
        );

        json!({ "type": "OBJECT", "properties": properties })
    }
}

/// `market_cap_more_than` -> `marketCapMoreThan`
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, word) in key.split('_').enumerate() {
        if i == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}
