//! Configuration for the Habits Adventure knowledge base
//!
//! Values come from serde defaults, then from environment variables (a
//! `.env` file is honoured). Unparsable values are logged and ignored.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Graph store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Use an encrypted connection
    #[serde(default)]
    pub tls: bool,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Database name, server default when unset
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Connection attempts at startup
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    #[serde(default = "default_connect_retry_delay_ms")]
    pub connect_retry_delay_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureConfig {
    #[serde(default)]
    pub graph: GraphStoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    7687
}

fn default_username() -> String {
    "neo4j".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_connect_retries() -> u32 {
    3
}

fn default_connect_retry_delay_ms() -> u64 {
    2000
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: false,
            username: default_username(),
            password: String::new(),
            database: None,
            pool_size: default_pool_size(),
            query_timeout_secs: default_query_timeout_secs(),
            connect_retries: default_connect_retries(),
            connect_retry_delay_ms: default_connect_retry_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl GraphStoreConfig {
    /// Bolt routing URI, `neo4j+s://` when TLS is on.
    pub fn uri(&self) -> String {
        let scheme = if self.tls { "neo4j+s" } else { "neo4j" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }

    #[cfg(feature = "adapters")]
    pub fn to_neo4j_config(&self) -> crate::adapters::Neo4jConfig {
        crate::adapters::Neo4jConfig {
            uri: self.uri(),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            pool_size: self.pool_size,
            connection_retry_count: self.connect_retries,
            connection_retry_delay: self.connect_retry_delay(),
            query_timeout: self.query_timeout(),
        }
    }

    /// Applies `GRAPH_*` variables read through `lookup`.
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("GRAPH_HOST") {
            self.host = host;
        }
        parse_into(lookup, "GRAPH_PORT", &mut self.port);
        if let Some(tls) = lookup("GRAPH_TLS") {
            match parse_bool(&tls) {
                Some(tls) => self.tls = tls,
                None => warn!("Invalid GRAPH_TLS value: {}", tls),
            }
        }
        if let Some(username) = lookup("GRAPH_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("GRAPH_PASSWORD") {
            self.password = password;
        }
        if let Some(database) = lookup("GRAPH_DATABASE") {
            self.database = Some(database).filter(|db| !db.trim().is_empty());
        }
        parse_into(lookup, "GRAPH_POOL_SIZE", &mut self.pool_size);
        parse_into(lookup, "GRAPH_QUERY_TIMEOUT_SECS", &mut self.query_timeout_secs);
        parse_into(lookup, "GRAPH_CONNECT_RETRIES", &mut self.connect_retries);
        parse_into(lookup, "GRAPH_CONNECT_RETRY_DELAY_MS", &mut self.connect_retry_delay_ms);
    }
}

impl LoggingConfig {
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(filter) = lookup("LOG_FILTER") {
            self.filter = filter;
        }
        if let Some(json) = lookup("LOG_JSON") {
            match parse_bool(&json) {
                Some(json) => self.json = json,
                None => warn!("Invalid LOG_JSON value: {}", json),
            }
        }
    }
}

impl AdventureConfig {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from defaults plus whatever `lookup` yields.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.graph.apply_env(&lookup);
        config.logging.apply_env(&lookup);
        config
    }
}

fn parse_into<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T)
where
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Invalid {} value: {}", key, raw),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdventureConfig::from_lookup(|_| None);
        assert_eq!(config, AdventureConfig::default());
        assert_eq!(config.graph.uri(), "neo4j://localhost:7687");
        assert_eq!(config.graph.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_env_overrides() {
        let config = AdventureConfig::from_lookup(lookup_from(&[
            ("GRAPH_HOST", "graph.internal"),
            ("GRAPH_PORT", "7000"),
            ("GRAPH_TLS", "true"),
            ("GRAPH_PASSWORD", "secret"),
            ("GRAPH_DATABASE", "adventure"),
            ("GRAPH_QUERY_TIMEOUT_SECS", "5"),
            ("GRAPH_CONNECT_RETRIES", "7"),
            ("GRAPH_CONNECT_RETRY_DELAY_MS", "250"),
            ("LOG_JSON", "1"),
        ]));

        assert_eq!(config.graph.uri(), "neo4j+s://graph.internal:7000");
        assert_eq!(config.graph.password, "secret");
        assert_eq!(config.graph.database.as_deref(), Some("adventure"));
        assert_eq!(config.graph.query_timeout_secs, 5);
        assert_eq!(config.graph.connect_retries, 7);
        assert_eq!(config.graph.connect_retry_delay(), Duration::from_millis(250));
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = AdventureConfig::from_lookup(lookup_from(&[
            ("GRAPH_PORT", "seventy"),
            ("GRAPH_TLS", "maybe"),
            ("GRAPH_POOL_SIZE", "-1"),
            ("GRAPH_CONNECT_RETRY_DELAY_MS", "soon"),
        ]));

        assert_eq!(config.graph.port, 7687);
        assert!(!config.graph.tls);
        assert_eq!(config.graph.pool_size, 10);
        assert_eq!(config.graph.connect_retry_delay_ms, 2000);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AdventureConfig =
            serde_json::from_str(r#"{"graph": {"host": "db", "tls": true}}"#).unwrap();
        assert_eq!(config.graph.uri(), "neo4j+s://db:7687");
        assert_eq!(config.graph.pool_size, 10);
        assert!(!config.logging.json);
    }
}
