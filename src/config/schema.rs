//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the node.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::protocol::request::DEFAULT_ENCODING;
use crate::protocol::SERVER_NAME;
use crate::schema::{ChildScope, ParseOptions};

/// Root configuration for the XHTTP node.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NodeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// XHTTP protocol behaviour.
    pub protocol: ProtocolConfig,

    /// Schema registry settings.
    pub registry: RegistryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "localhost:8888").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:8888".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// XHTTP protocol settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// `Server` header added to responses that do not set one.
    pub server_header: String,

    /// Reject requests without `X-Mode` instead of assuming `perform`.
    pub require_mode_header: bool,

    /// `X-Encoding` assumed when a request carries none.
    pub default_encoding: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            server_header: SERVER_NAME.to_string(),
            require_mode_header: true,
            default_encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

/// Schema registry settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Search the whole subtree for nested schema elements instead of
    /// direct children only.
    pub nested_lookup: bool,

    /// Reload the registry when the service directory changes.
    pub watch: bool,
}

impl RegistryConfig {
    pub fn parse_options(&self) -> ParseOptions {
        if self.nested_lookup {
            ParseOptions::new(ChildScope::Subtree)
        } else {
            ParseOptions::new(ChildScope::Direct)
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.listener.bind_address, "localhost:8888");
        assert_eq!(config.protocol.server_header, "XHTTP Rust node");
        assert!(config.protocol.require_mode_header);
        assert_eq!(config.protocol.default_encoding, "x-user-defined");
        assert!(!config.registry.watch);
        assert_eq!(config.registry.parse_options().scope, ChildScope::Direct);
    }

    #[test]
    fn test_partial_toml() {
        let config: NodeConfig = toml::from_str(
            r#"
            [registry]
            nested_lookup = true

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.parse_options().scope, ChildScope::Subtree);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
