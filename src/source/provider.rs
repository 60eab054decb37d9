//! Live tool discovery contract.

use async_trait::async_trait;

use crate::mcp::{McpResult, McpToolDefinition};

/// Something that can list tools or fail.
///
/// The builder treats an error and a timeout the same way: the source falls
/// back to its static list and a warning is recorded.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>>;
}

/// Provider answering from a fixed in-memory list.
#[derive(Debug, Clone)]
pub struct StaticToolProvider {
    name: String,
    tools: Vec<McpToolDefinition>,
}

impl StaticToolProvider {
    pub fn new(name: impl Into<String>, tools: Vec<McpToolDefinition>) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }
}

#[async_trait]
impl ToolProvider for StaticToolProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>> {
        Ok(self.tools.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticToolProvider::new(
            "git",
            vec![McpToolDefinition::new(
                "git_status",
                "Show status",
                serde_json::json!({"type": "object"}),
            )],
        );
        assert_eq!(provider.name(), "git");
        assert_eq!(provider.list_tools().await.unwrap().len(), 1);
    }
}
