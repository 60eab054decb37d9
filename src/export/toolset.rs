//! `mcp_toolset` blocks for the Anthropic export.
//!
//! Each MCP server in the catalog becomes one block that defers the whole
//! server by default and lists the resident tools as per-tool exceptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{SourceKind, ToolCatalog, ToolCatalogEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolsetKind {
    #[default]
    #[serde(rename = "mcp_toolset")]
    Mcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLoadConfig {
    pub defer_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolset {
    #[serde(rename = "type", default)]
    pub kind: ToolsetKind,
    pub mcp_server_name: String,
    pub default_config: ToolLoadConfig,
    /// Bare tool name to its override; only tools that differ from the default.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configs: BTreeMap<String, ToolLoadConfig>,
}

impl McpToolset {
    /// Block for one server's entries. The server is deferred unless every
    /// tool on it is resident.
    fn from_entries<'a>(
        server: &str,
        entries: impl IntoIterator<Item = &'a ToolCatalogEntry>,
    ) -> Self {
        let entries: Vec<&ToolCatalogEntry> = entries.into_iter().collect();
        let defer_server = entries.iter().any(|e| e.defer_loading);
        let configs = entries
            .iter()
            .filter(|e| e.defer_loading != defer_server)
            .map(|e| {
                (
                    e.name.clone(),
                    ToolLoadConfig {
                        defer_loading: e.defer_loading,
                    },
                )
            })
            .collect();

        Self {
            kind: ToolsetKind::Mcp,
            mcp_server_name: server.to_string(),
            default_config: ToolLoadConfig {
                defer_loading: defer_server,
            },
            configs,
        }
    }
}

/// One toolset per MCP server in the catalog, ordered by server name.
pub fn mcp_toolsets(catalog: &ToolCatalog) -> Vec<McpToolset> {
    let mut by_server: BTreeMap<&str, Vec<&ToolCatalogEntry>> = BTreeMap::new();
    for tool in catalog.resolve(catalog.by_source(SourceKind::Mcp)) {
        by_server.entry(tool.server.as_str()).or_default().push(tool);
    }

    by_server
        .into_iter()
        .map(|(server, entries)| McpToolset::from_entries(server, entries))
        .collect()
}
