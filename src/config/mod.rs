//! Catalog configuration.
//!
//! Loaded from JSON or YAML, then overlaid with environment overrides:
//!
//! ```rust,no_run
//! use tool_catalog::CatalogConfig;
//!
//! # async fn example() -> Result<(), tool_catalog::ConfigError> {
//! let config = CatalogConfig::load("tool-catalog.yaml").await?;
//! println!("{} MCP servers", config.mcp_servers.len());
//! # Ok(())
//! # }
//! ```

mod env;

pub use env::{ENV_DEFER_HIGH, ENV_MAX_CONCURRENCY, ENV_TIMEOUT_MS};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CategoryTaxonomy, Priority, UsageRecord};
use crate::mcp::{McpServerConfig, McpToolDefinition};
use crate::search::SearchType;
use crate::source::CrateDescriptor;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// JSON deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Multiple validation errors
    #[error("{0}")]
    ValidationErrors(ValidationErrors),
}

#[derive(Debug)]
pub struct ValidationErrors(pub Vec<ConfigError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation failed: ")?;
        let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

fn default_true() -> bool {
    true
}

/// One MCP server plus its discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerEntry {
    #[serde(flatten)]
    pub config: McpServerConfig,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides `build.discoveryTimeoutMs` for this server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Static tool list used when live discovery fails.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_tools: Vec<McpToolDefinition>,
}

impl McpServerEntry {
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            enabled: true,
            timeout_ms: None,
            fallback_tools: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// Upper bound on servers queried at the same time.
    pub max_concurrency: usize,
    pub discovery_timeout_ms: u64,
    /// Whether `high`-priority tools are deferred.
    pub defer_high: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            discovery_timeout_ms: 10_000,
            defer_high: false,
        }
    }
}

impl BuildOptions {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub search_type: SearchType,
    pub max_results: usize,
    pub catalog_path: PathBuf,
    pub include_search_tool: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            search_type: SearchType::Hybrid,
            max_results: 10,
            catalog_path: default_catalog_path(),
            include_search_tool: true,
        }
    }
}

/// Platform data directory when resolvable, else a relative path.
pub fn default_catalog_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "tool-catalog")
        .map(|dirs| dirs.data_dir().join("catalog.json"))
        .unwrap_or_else(|| PathBuf::from(".tool-catalog/catalog.json"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    pub mcp_servers: BTreeMap<String, McpServerEntry>,
    pub crates: Vec<CrateDescriptor>,
    pub subagent_dirs: Vec<PathBuf>,
    pub builtins: Vec<McpToolDefinition>,
    /// Replaces the built-in category rules when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<CategoryTaxonomy>,
    /// Keyed by tool id or bare tool name.
    pub priority_overrides: BTreeMap<String, Priority>,
    /// Usage counters carried forward from a previous run, keyed like overrides.
    pub usage: BTreeMap<String, UsageRecord>,
    pub build: BuildOptions,
    pub export: ExportOptions,
}

impl CatalogConfig {
    /// Read a JSON or YAML (by `.yaml`/`.yml` extension) file, apply
    /// environment overrides and validate.
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let mut config = if is_yaml {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml_ng::from_str(content).map_err(|e| ConfigError::Yaml(e.to_string()))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.build.max_concurrency == 0 {
            errors.push(invalid("build.maxConcurrency", "must be at least 1"));
        }
        if self.build.discovery_timeout_ms == 0 {
            errors.push(invalid("build.discoveryTimeoutMs", "must be positive"));
        }
        if self.export.max_results == 0 {
            errors.push(invalid("export.maxResults", "must be at least 1"));
        }

        for (name, entry) in &self.mcp_servers {
            let key = format!("mcpServers.{}", name);
            if name.trim().is_empty() || name.contains("__") {
                errors.push(invalid(&key, "server names must be non-empty and not contain '__'"));
            }
            let McpServerConfig::Stdio { command, .. } = &entry.config;
            if command.trim().is_empty() {
                errors.push(invalid(&format!("{}.command", key), "must not be empty"));
            }
            if entry.timeout_ms == Some(0) {
                errors.push(invalid(&format!("{}.timeoutMs", key), "must be positive"));
            }
        }

        for descriptor in &self.crates {
            if descriptor.name.trim().is_empty() {
                errors.push(invalid("crates", "crate descriptors need a name"));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::ValidationErrors(ValidationErrors(errors))),
        }
    }

    pub fn enabled_servers(&self) -> impl Iterator<Item = (&String, &McpServerEntry)> {
        self.mcp_servers.iter().filter(|(_, entry)| entry.enabled)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
