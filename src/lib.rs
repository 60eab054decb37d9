//! # tool-catalog
//!
//! Tool catalog and hybrid search for agent runtimes that defer tool loading.
//!
//! The crate discovers tool definitions from MCP servers, crate descriptors,
//! subagent files and builtin lists, normalizes them into a [`ToolCatalog`],
//! and answers BM25, regex or hybrid queries against an immutable snapshot.
//! Exporters turn a catalog into Anthropic-style tool lists with
//! `defer_loading` flags and into consumer settings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tool_catalog::{CatalogBuilder, CatalogConfig, HybridSearchEngine, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tool_catalog::Error> {
//!     let config = CatalogConfig::load("tool-catalog.json").await?;
//!     let (catalog, report) = CatalogBuilder::from_config(config).build().await?;
//!     for warning in &report.warnings {
//!         eprintln!("{}", warning);
//!     }
//!
//!     let engine = HybridSearchEngine::new(catalog);
//!     let response = engine.search("create a pull request", &SearchOptions::default());
//!     for hit in response.results {
//!         println!("{:.3} {}", hit.score, hit.tool.id);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod catalog;
pub mod config;
pub mod export;
pub mod mcp;
pub mod observability;
pub mod search;
pub mod source;

pub use catalog::{
    BuildReport, CATALOG_FORMAT_VERSION, CatalogBuilder, CatalogStore, CategoryRule,
    CategoryTaxonomy, InputSchema, Priority, SchemaType, SourceKind, SourceWarning, ToolCatalog,
    ToolCatalogEntry, UsageRecord,
};
pub use config::{
    BuildOptions, CatalogConfig, ConfigError, ExportOptions, McpServerEntry, ValidationErrors,
};
pub use export::{
    AnthropicExport, AnthropicTool, ConsumerSettings, ExportedTool, McpToolset, TokenSavings,
    ToolLoadConfig, ToolSearchSettings, ToolSearchTool, export_anthropic, export_settings,
    mcp_toolsets, merge_settings, token_savings, write_anthropic, write_catalog, write_settings,
};
pub use mcp::{McpError, McpResult, McpServerConfig, McpToolDefinition, McpToolProvider};
pub use search::{
    Bm25Engine, Bm25Params, CatalogStats, CommonPattern, HybridSearchEngine, PatternEngine,
    PatternMatches, SearchField, SearchOptions, SearchResponse, SearchResult, SearchStrategy,
    SearchType,
};
pub use source::{
    CrateDescriptor, FallbackRegistry, StaticToolProvider, SubagentDefinition, SubagentLoader,
    ToolProvider,
};

/// Error type for tool-catalog operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Every configured source failed and no local definitions were available.
    #[error("All {} tool sources failed; no catalog produced", warnings.len())]
    AllSourcesFailed { warnings: Vec<SourceWarning> },

    /// Persisted catalog was written by an incompatible format version.
    #[error("Catalog schema mismatch: expected version {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    /// Catalog is structurally invalid (duplicate ids, inconsistent indexes).
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Build was cancelled before all sources reported.
    #[error("Catalog build cancelled")]
    Cancelled,

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to parse a source definition.
    #[error("Parse error: {0}")]
    Parse(String),

    /// MCP server communication failed.
    #[error("MCP error: {0}")]
    Mcp(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration, parsing, or setup errors
    Configuration,
    /// Source failures that may succeed on a later rebuild
    Transient,
    /// Persisted catalog cannot be served
    Catalog,
    /// Internal errors (IO, JSON)
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::Parse(_) => ErrorCategory::Configuration,
            Error::AllSourcesFailed { .. } | Error::Mcp(_) | Error::Cancelled => {
                ErrorCategory::Transient
            }
            Error::SchemaMismatch { .. } | Error::InvalidCatalog(_) => ErrorCategory::Catalog,
            Error::Json(_) | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn is_catalog_error(&self) -> bool {
        self.category() == ErrorCategory::Catalog
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::Io(e) => Error::Io(e),
            config::ConfigError::Json(e) => Error::Json(e),
            other => Error::Config(other.to_string()),
        }
    }
}

impl From<mcp::McpError> for Error {
    fn from(err: mcp::McpError) -> Self {
        match err {
            mcp::McpError::Io(e) => Error::Io(e),
            mcp::McpError::Json(e) => Error::Json(e),
            _ => Error::Mcp(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
