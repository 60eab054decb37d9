//! Static per-server tool lists used when live discovery fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mcp::McpToolDefinition;

/// Immutable table of server name → predefined tools.
///
/// Built once and handed to the builder; there is no process-wide registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackRegistry {
    servers: BTreeMap<String, Vec<McpToolDefinition>>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(mut self, name: impl Into<String>, tools: Vec<McpToolDefinition>) -> Self {
        self.servers.insert(name.into(), tools);
        self
    }

    /// Entries from `other` replace entries for the same server.
    pub fn merge(mut self, other: FallbackRegistry) -> Self {
        self.servers.extend(other.servers);
        self
    }

    pub fn get(&self, server: &str) -> Option<&[McpToolDefinition]> {
        self.servers.get(server).map(Vec::as_slice)
    }

    pub fn contains(&self, server: &str) -> bool {
        self.servers.contains_key(server)
    }

    pub fn servers(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl FromIterator<(String, Vec<McpToolDefinition>)> for FallbackRegistry {
    fn from_iter<T: IntoIterator<Item = (String, Vec<McpToolDefinition>)>>(iter: T) -> Self {
        Self {
            servers: iter.into_iter().collect(),
        }
    }
}
