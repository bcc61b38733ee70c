//! Configuration parsing for the ABX feed client.
//!
//! Settings are read from an optional JSON config file. Every field may be
//! omitted; the `effective_*` accessors supply the defaults the client runs
//! with, and command-line overrides are applied on top by the runner.
//!
//! # Example config
//!
//! ```json
//! {
//!   "server":  { "host": "127.0.0.1", "port": 3000, "recv_timeout_ms": 10000 },
//!   "output":  { "path": "output.json" },
//!   "logging": { "level": "info", "log_dir": "/tmp/log", "format": "json" }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::AbxError;
use crate::logging::LogFormat;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OUTPUT_PATH: &str = "output.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_MODULE_NAME: &str = "abx_client";

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Feed server endpoint and transport bounds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host name or IP address of the feed server.
    pub host: Option<String>,

    /// TCP port of the feed server.
    pub port: Option<u16>,

    /// Upper bound on establishing one connection. Unset means no bound.
    pub connect_timeout_ms: Option<u64>,

    /// Upper bound on waiting for one response frame. Unset means no bound.
    pub recv_timeout_ms: Option<u64>,
}

impl ServerConfig {
    pub fn effective_host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// `host:port` string suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.effective_host(), self.effective_port())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn recv_timeout(&self) -> Option<Duration> {
        self.recv_timeout_ms.map(Duration::from_millis)
    }
}

/// Where the assembled dataset is written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
}

impl OutputConfig {
    pub fn effective_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }
}

/// Logging block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub log_dir: Option<String>,
    pub module_name: Option<String>,
    pub format: Option<LogFormat>,
}

impl LoggingConfig {
    pub fn effective_level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn effective_module_name(&self) -> &str {
        self.module_name.as_deref().unwrap_or(DEFAULT_MODULE_NAME)
    }

    pub fn effective_format(&self) -> LogFormat {
        self.format.unwrap_or_default()
    }
}

impl AppConfig {
    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<(), AbxError> {
        if self.server.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(AbxError::Config("server.host must not be empty".into()));
        }
        if self.server.port == Some(0) {
            return Err(AbxError::Config("server.port must be non-zero".into()));
        }
        if self.output.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(AbxError::Config("output.path must not be empty".into()));
        }
        Ok(())
    }
}

/// Deserialize a config from JSON text.
///
/// Values are not validated here; overrides may still replace them, so
/// callers run [`AppConfig::validate`] on the final, merged config.
pub fn parse_config(content: &str) -> anyhow::Result<AppConfig> {
    let config: AppConfig = serde_json::from_str(content).map_err(|e| AbxError::Config(e.to_string()))?;
    Ok(config)
}

/// Load and deserialize a JSON config file. See [`parse_config`].
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parse config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = parse_config("{}").unwrap();
        assert_eq!(cfg.server.address(), "127.0.0.1:3000");
        assert_eq!(cfg.output.effective_path(), PathBuf::from("output.json"));
        assert_eq!(cfg.logging.effective_level(), "info");
        assert_eq!(cfg.logging.effective_format(), LogFormat::Text);
        assert!(cfg.server.recv_timeout().is_none());
        assert!(cfg.server.connect_timeout().is_none());
    }

    #[test]
    fn full_config() {
        let json = r#"{
            "server": { "host": "feed.local", "port": 4000, "connect_timeout_ms": 250, "recv_timeout_ms": 1500 },
            "output": { "path": "/tmp/abx/out.json" },
            "logging": { "level": "debug", "log_dir": "/tmp/log", "module_name": "abx", "format": "json" }
        }"#;
        let cfg = parse_config(json).unwrap();
        assert_eq!(cfg.server.address(), "feed.local:4000");
        assert_eq!(cfg.server.connect_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.server.recv_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(cfg.output.effective_path(), PathBuf::from("/tmp/abx/out.json"));
        assert_eq!(cfg.logging.log_dir.as_deref(), Some("/tmp/log"));
        assert_eq!(cfg.logging.effective_module_name(), "abx");
        assert_eq!(cfg.logging.effective_format(), LogFormat::Json);
    }

    #[test]
    fn zero_port_rejected() {
        let cfg = parse_config(r#"{ "server": { "port": 0 } }"#).unwrap();
        assert!(matches!(cfg.validate(), Err(AbxError::Config(_))));
    }

    #[test]
    fn blank_host_rejected() {
        let cfg = parse_config(r#"{ "server": { "host": "  " } }"#).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_output_path_rejected() {
        let cfg = parse_config(r#"{ "output": { "path": "" } }"#).unwrap();
        assert!(matches!(cfg.validate(), Err(AbxError::Config(_))));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = parse_config(r#"{ "serverr": {} }"#).unwrap_err();
        assert!(matches!(err.downcast_ref::<AbxError>(), Some(AbxError::Config(_))));
    }
}
