//! Anthropic Messages API tool lists with deferred loading.

use serde::{Deserialize, Serialize};

use super::toolset::{McpToolset, mcp_toolsets};
use crate::catalog::{ToolCatalog, ToolCatalogEntry};
use crate::config::ExportOptions;
use crate::search::SearchType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    pub defer_loading: bool,
}

impl AnthropicTool {
    pub fn from_entry(entry: &ToolCatalogEntry) -> Self {
        Self {
            name: entry.id.clone(),
            description: entry.description.clone(),
            input_schema: entry.input_schema.to_json(),
            defer_loading: entry.defer_loading,
        }
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tool_tokens(&self.name, &self.description, &self.input_schema)
    }
}

/// Server-side search tool that lets the model discover deferred tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolSearchTool {
    #[serde(rename = "tool_search_tool_regex_20251119")]
    Regex { name: String },
    #[serde(rename = "tool_search_tool_bm25_20251119")]
    Bm25 { name: String },
}

impl ToolSearchTool {
    pub fn regex() -> Self {
        Self::Regex {
            name: "tool_search_tool_regex".to_string(),
        }
    }

    pub fn bm25() -> Self {
        Self::Bm25 {
            name: "tool_search_tool_bm25".to_string(),
        }
    }

    /// There is no server-side hybrid tool; hybrid consumers get BM25.
    pub fn for_search_type(search_type: SearchType) -> Self {
        match search_type {
            SearchType::Regex => Self::regex(),
            SearchType::Bm25 | SearchType::Hybrid => Self::bm25(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Regex { name } | Self::Bm25 { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportedTool {
    Search(ToolSearchTool),
    Tool(AnthropicTool),
}

impl ExportedTool {
    pub fn name(&self) -> &str {
        match self {
            Self::Search(tool) => tool.name(),
            Self::Tool(tool) => &tool.name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSavings {
    pub without_defer_loading: usize,
    pub with_defer_loading: usize,
    pub saved_tokens: usize,
    /// In `0.0..=100.0`; zero when nothing is deferred.
    pub savings_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnthropicExport {
    pub tools: Vec<ExportedTool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_toolsets: Vec<McpToolset>,
    pub token_savings: TokenSavings,
}

/// Estimate token count for a tool based on name, description, and schema sizes.
///
/// Uses a chars/4 heuristic plus a fixed overhead of 20 tokens for JSON structure.
pub fn estimate_tool_tokens(name: &str, description: &str, schema: &serde_json::Value) -> usize {
    name.len() / 4 + description.len() / 4 + schema.to_string().len() / 4 + 20
}

pub fn token_savings(catalog: &ToolCatalog) -> TokenSavings {
    let without: usize = catalog
        .tools()
        .iter()
        .map(ToolCatalogEntry::estimated_tokens)
        .sum();
    let with: usize = catalog
        .tools()
        .iter()
        .filter(|t| !t.defer_loading)
        .map(ToolCatalogEntry::estimated_tokens)
        .sum();
    let saved = without.saturating_sub(with);
    let percent = if without == 0 {
        0.0
    } else {
        (saved as f64 / without as f64 * 100.0).clamp(0.0, 100.0)
    };

    TokenSavings {
        without_defer_loading: without,
        with_defer_loading: with,
        saved_tokens: saved,
        savings_percent: percent,
    }
}

/// Tool list in catalog order, optionally led by the search tool.
pub fn export_anthropic(catalog: &ToolCatalog, options: &ExportOptions) -> AnthropicExport {
    let mut tools = Vec::with_capacity(catalog.len() + 1);
    if options.include_search_tool {
        tools.push(ExportedTool::Search(ToolSearchTool::for_search_type(
            options.search_type,
        )));
    }
    tools.extend(
        catalog
            .tools()
            .iter()
            .map(|entry| ExportedTool::Tool(AnthropicTool::from_entry(entry))),
    );

    AnthropicExport {
        tools,
        mcp_toolsets: mcp_toolsets(catalog),
        token_savings: token_savings(catalog),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InputSchema, Priority, SchemaType, SourceKind};

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(vec![
            ToolCatalogEntry::new(SourceKind::Mcp, "git", "git_status", "Show the working tree status")
                .priority(Priority::Always),
            ToolCatalogEntry::new(SourceKind::Mcp, "fs", "list_files", "List files in a directory")
                .input_schema(InputSchema::object().required_property(
                    "path",
                    InputSchema::of_type(SchemaType::String),
                )),
            ToolCatalogEntry::new(SourceKind::Builtin, "builtin", "Read", "Read a file")
                .priority(Priority::Low),
        ])
        .unwrap()
    }

    #[test]
    fn test_export_with_search_tool() {
        let options = ExportOptions {
            search_type: SearchType::Regex,
            ..Default::default()
        };
        let export = export_anthropic(&catalog(), &options);
        let json = serde_json::to_value(&export).unwrap();

        assert_eq!(json["tools"][0]["type"], "tool_search_tool_regex_20251119");
        assert_eq!(json["tools"][0]["name"], "tool_search_tool_regex");
        assert_eq!(json["tools"][1]["name"], "mcp__git__git_status");
        assert_eq!(json["tools"][1]["defer_loading"], false);
        assert_eq!(json["tools"][2]["defer_loading"], true);
        assert_eq!(json["tools"][2]["input_schema"]["required"][0], "path");
        assert_eq!(export.tools.len(), 4);
        assert_eq!(export.mcp_toolsets.len(), 2);
    }

    #[test]
    fn test_export_without_search_tool() {
        let options = ExportOptions {
            include_search_tool: false,
            ..Default::default()
        };
        let export = export_anthropic(&catalog(), &options);
        assert_eq!(export.tools.len(), 3);
        assert!(export.tools.iter().all(|t| matches!(t, ExportedTool::Tool(_))));
    }

    #[test]
    fn test_hybrid_exports_bm25_tool() {
        assert_eq!(
            ToolSearchTool::for_search_type(SearchType::Hybrid),
            ToolSearchTool::bm25()
        );
    }

    #[test]
    fn test_token_savings() {
        let savings = token_savings(&catalog());
        assert!(savings.with_defer_loading < savings.without_defer_loading);
        assert_eq!(
            savings.saved_tokens,
            savings.without_defer_loading - savings.with_defer_loading
        );
        assert!(savings.savings_percent > 0.0 && savings.savings_percent <= 100.0);
    }

    #[test]
    fn test_token_savings_nothing_deferred() {
        let catalog = ToolCatalog::new(vec![
            ToolCatalogEntry::new(SourceKind::Builtin, "builtin", "Bash", "Run a command")
                .priority(Priority::Always),
        ])
        .unwrap();
        let savings = token_savings(&catalog);
        assert_eq!(savings.saved_tokens, 0);
        assert_eq!(savings.savings_percent, 0.0);

        let empty = token_savings(&ToolCatalog::new(vec![]).unwrap());
        assert_eq!(empty, TokenSavings::default());
    }

    #[test]
    fn test_estimate_tool_tokens() {
        let schema = serde_json::json!({"type": "object"});
        assert_eq!(
            estimate_tool_tokens("abcd", "abcdefgh", &schema),
            1 + 2 + schema.to_string().len() / 4 + 20
        );
    }
}
