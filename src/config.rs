//! Application configuration
//!
//! Built once from the environment (after `.env` is loaded by the binary)
//! and handed to constructors explicitly.

use crate::error::OrchestrationError;
use crate::Result;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Financial data provider settings
#[derive(Debug, Clone)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    /// Attempts per request when the provider answers with nothing
    pub max_attempts: u32,
    /// Constant pause between those attempts
    pub retry_delay: Duration,
}

impl Default for FmpConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_FMP_BASE_URL.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: i32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: 0.2,
            max_output_tokens: 2048,
        }
    }
}

/// Limits for the routing loop and its agents
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Supervisor decisions allowed in one run
    pub max_steps: usize,
    /// Model/tool rounds allowed in one agent turn
    pub max_tool_rounds: usize,
    pub web_timeout: Duration,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_steps: 25,
            max_tool_rounds: 10,
            web_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fmp: FmpConfig,
    pub llm: LlmConfig,
    pub routing: RoutingConfig,
    pub api_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fmp: FmpConfig::default(),
            llm: LlmConfig::default(),
            routing: RoutingConfig::default(),
            api_port: 8080,
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fmp_api_key = get("FMP_API_KEY").unwrap_or_default();
        if fmp_api_key.is_empty() {
            warn!("FMP_API_KEY not set; financial data requests will be rejected by the provider");
        }

        let gemini_api_key = get("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.is_empty() {
            warn!("GEMINI_API_KEY not set; routing and agent calls will fail");
        }

        let fmp = FmpConfig {
            api_key: fmp_api_key,
            base_url: get("FMP_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.fmp.base_url),
            max_attempts: parse_or("FMP_MAX_ATTEMPTS", get("FMP_MAX_ATTEMPTS"), defaults.fmp.max_attempts)?,
            retry_delay: get("FMP_RETRY_DELAY_MS")
                .map(|raw| parse_value::<u64>("FMP_RETRY_DELAY_MS", &raw))
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or(defaults.fmp.retry_delay),
        };

        let llm = LlmConfig {
            api_key: gemini_api_key,
            model: get("GEMINI_MODEL").unwrap_or(defaults.llm.model),
            base_url: get("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm.base_url),
            ..defaults.llm
        };

        let routing = RoutingConfig {
            max_steps: parse_or("ROUTER_MAX_STEPS", get("ROUTER_MAX_STEPS"), defaults.routing.max_steps)?,
            max_tool_rounds: parse_or(
                "AGENT_MAX_TOOL_ROUNDS",
                get("AGENT_MAX_TOOL_ROUNDS"),
                defaults.routing.max_tool_rounds,
            )?,
            web_timeout: get("WEB_TIMEOUT_SECS")
                .map(|raw| parse_value::<u64>("WEB_TIMEOUT_SECS", &raw))
                .transpose()?
                .map(Duration::from_secs)
                .unwrap_or(defaults.routing.web_timeout),
        };

        let api_port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value::<u16>("PORT", &raw)?,
            None => defaults.api_port,
        };

        Ok(Self {
            fmp,
            llm,
            routing,
            api_port,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        OrchestrationError::ConfigError(format!("{} has an invalid value: '{}'", key, raw))
    })
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
