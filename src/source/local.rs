//! Crate-backed tool descriptors, read directly from configuration.

use serde::{Deserialize, Serialize};

use crate::mcp::McpToolDefinition;

/// Tools compiled into a Rust crate and exposed without a server process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrateDescriptor {
    pub name: String,
    /// Forces every tool in the crate into this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tools: Vec<McpToolDefinition>,
}

impl CrateDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            tools: Vec::new(),
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tool(mut self, tool: McpToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder_and_serde() {
        let descriptor = CrateDescriptor::new("fs-tools")
            .category("files")
            .tool(McpToolDefinition::new(
                "read_file",
                "Read a file",
                serde_json::json!({"type": "object"}),
            ));

        let json = serde_json::to_string(&descriptor).unwrap();
        let parsed: CrateDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, descriptor);

        let minimal: CrateDescriptor = serde_json::from_str(r#"{"name": "empty"}"#).unwrap();
        assert!(minimal.tools.is_empty());
        assert!(minimal.category.is_none());
    }
}
