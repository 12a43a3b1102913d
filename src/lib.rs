//! Channel Optimizer
//!
//! Order-to-channel assignment engine for last-mile delivery. Each request
//! is compiled into a 0/1 integer program and solved under a hard
//! wall-clock budget; when the solver comes back empty the service
//! degrades to a deterministic greedy assignment instead of failing.

pub mod geo;
pub mod http;
pub mod metrics;
pub mod model;
pub mod optimizer;

use anyhow::Result;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub default_timeout_seconds: f64,
    pub max_timeout_seconds: f64,
    pub default_weight_delivery_time: f64,
    pub default_weight_cost: f64,
    pub default_weight_quality: f64,
    pub log_level: String,
    pub log_format: String,
    pub metrics_enabled: bool,
    pub cors_origins: Vec<String>,
    pub cors_methods: Vec<String>,
    pub cors_headers: Vec<String>,
    pub database_url: Option<String>,
    pub cache_url: Option<String>,
    /// Reserved for the asynchronous request/result flow; not consumed yet.
    pub message_bus_url: Option<String>,
    pub topic_optimization_requests: String,
    pub topic_optimization_results: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service_name: env_or("SERVICE_NAME", "channel-optimizer"),
            version: env_or("VERSION", env!("CARGO_PKG_VERSION")),
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8000").parse()?,
            workers: env_or("WORKERS", "4").parse()?,
            default_timeout_seconds: env_or("DEFAULT_TIMEOUT_SECONDS", "0.1").parse()?,
            max_timeout_seconds: env_or("MAX_TIMEOUT_SECONDS", "10.0").parse()?,
            default_weight_delivery_time: env_or("DEFAULT_WEIGHT_DELIVERY_TIME", "0.5").parse()?,
            default_weight_cost: env_or("DEFAULT_WEIGHT_COST", "0.3").parse()?,
            default_weight_quality: env_or("DEFAULT_WEIGHT_QUALITY", "0.2").parse()?,
            log_level: env_or("LOG_LEVEL", "info"),
            log_format: env_or("LOG_FORMAT", "json"),
            metrics_enabled: env_or("METRICS_ENABLED", "true").parse()?,
            cors_origins: parse_list(&env_or("CORS_ORIGINS", "*")),
            cors_methods: parse_list(&env_or("CORS_METHODS", "*")),
            cors_headers: parse_list(&env_or("CORS_HEADERS", "*")),
            database_url: std::env::var("DATABASE_URL").ok(),
            cache_url: std::env::var("CACHE_URL").ok(),
            message_bus_url: std::env::var("MESSAGE_BUS_URL").ok(),
            topic_optimization_requests: env_or(
                "TOPIC_OPTIMIZATION_REQUESTS",
                "optimization-requests",
            ),
            topic_optimization_results: env_or(
                "TOPIC_OPTIMIZATION_RESULTS",
                "optimization-results",
            ),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_splits_and_trims() {
        assert_eq!(
            parse_list("http://a.example, http://b.example"),
            vec!["http://a.example", "http://b.example"]
        );
        assert_eq!(parse_list("*"), vec!["*"]);
        assert_eq!(parse_list(""), Vec::<String>::new());
    }
}
