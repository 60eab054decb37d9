//! Export Tests
//!
//! Anthropic tool lists, token savings and consumer settings generated from
//! built catalogs.
//!
//! Run: cargo nextest run --test export_tests

use tool_catalog::{
    CatalogBuilder, CatalogConfig, ExportOptions, ExportedTool, McpToolDefinition, Priority,
    SearchType, StaticToolProvider, ToolCatalog, ToolSearchTool, export_anthropic,
    export_settings, merge_settings, token_savings, write_settings,
};

fn def(name: &str, description: &str) -> McpToolDefinition {
    McpToolDefinition::new(
        name,
        description,
        serde_json::json!({
            "type": "object",
            "properties": {"path": {"type": "string", "description": "Target path"}},
            "required": ["path"]
        }),
    )
}

async fn build(config: CatalogConfig) -> ToolCatalog {
    let (catalog, _) = CatalogBuilder::from_config(config)
        .provider(StaticToolProvider::new(
            "git",
            vec![
                def("git_status", "Show the working tree status"),
                def("git_log", "Show commit logs"),
            ],
        ))
        .build()
        .await
        .unwrap();
    catalog
}

async fn mixed_catalog() -> ToolCatalog {
    let config = CatalogConfig::from_json(
        r#"{
            "builtins": [
                {"name": "Read", "description": "Read a file from disk", "inputSchema": {"type": "object"}}
            ],
            "priorityOverrides": {
                "Read": "always",
                "git_status": "always",
                "git_log": "low"
            }
        }"#,
    )
    .unwrap();
    build(config).await
}

mod savings_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_resident_saves_nothing() {
        let config = CatalogConfig::from_json(
            r#"{"priorityOverrides": {"git_status": "always", "git_log": "always"}}"#,
        )
        .unwrap();
        let catalog = build(config).await;
        assert!(catalog.tools().iter().all(|t| !t.defer_loading));

        let savings = token_savings(&catalog);
        assert_eq!(savings.savings_percent, 0.0);
        assert_eq!(savings.saved_tokens, 0);
        assert_eq!(savings.with_defer_loading, savings.without_defer_loading);
    }

    #[tokio::test]
    async fn test_all_high_savings_follow_defer_high() {
        let overrides = r#""priorityOverrides": {"git_status": "high", "git_log": "high"}"#;

        let resident = build(CatalogConfig::from_json(&format!("{{{overrides}}}")).unwrap()).await;
        assert!(resident.tools().iter().all(|t| t.priority == Priority::High));
        assert!(resident.tools().iter().all(|t| !t.defer_loading));
        assert_eq!(token_savings(&resident).savings_percent, 0.0);

        let deferred = build(
            CatalogConfig::from_json(&format!(r#"{{{overrides}, "build": {{"deferHigh": true}}}}"#))
                .unwrap(),
        )
        .await;
        assert!(deferred.tools().iter().all(|t| t.defer_loading));
        let savings = token_savings(&deferred);
        assert!(savings.savings_percent > 0.0);
        assert!(savings.savings_percent <= 100.0);
    }

    #[tokio::test]
    async fn test_mixed_catalog_saves_some() {
        let catalog = mixed_catalog().await;
        let savings = token_savings(&catalog);
        assert!(savings.savings_percent > 0.0);
        assert!(savings.savings_percent <= 100.0);
        assert_eq!(
            savings.saved_tokens,
            savings.without_defer_loading - savings.with_defer_loading
        );
    }
}

mod anthropic_tests {
    use super::*;

    #[tokio::test]
    async fn test_export_flags_follow_catalog() {
        let catalog = mixed_catalog().await;
        let options = ExportOptions {
            search_type: SearchType::Regex,
            ..Default::default()
        };
        let export = export_anthropic(&catalog, &options);

        assert_eq!(export.tools.len(), catalog.len() + 1);
        assert_eq!(export.tools[0], ExportedTool::Search(ToolSearchTool::regex()));

        for exported in &export.tools[1..] {
            let ExportedTool::Tool(tool) = exported else {
                panic!("search tool must only lead the list");
            };
            let entry = catalog.get(&tool.name).unwrap();
            assert_eq!(tool.defer_loading, entry.defer_loading);
            assert_eq!(tool.input_schema["required"][0], "path");
        }

        assert_eq!(export.mcp_toolsets.len(), 1);
        let git = &export.mcp_toolsets[0];
        assert_eq!(git.mcp_server_name, "git");
        assert!(git.default_config.defer_loading);
        assert_eq!(git.configs.keys().collect::<Vec<_>>(), vec!["git_status"]);
        assert!(!git.configs["git_status"].defer_loading);
    }

    #[tokio::test]
    async fn test_export_json_shape() {
        let catalog = mixed_catalog().await;
        let options = ExportOptions {
            include_search_tool: false,
            ..Default::default()
        };
        let json = serde_json::to_value(export_anthropic(&catalog, &options)).unwrap();

        let tools = json["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
        assert!(tools.iter().all(|t| t["defer_loading"].is_boolean()));
        assert!(json["tokenSavings"]["savingsPercent"].as_f64().unwrap() > 0.0);
    }
}

mod settings_tests {
    use super::*;

    #[tokio::test]
    async fn test_settings_reflect_priorities() {
        let catalog = mixed_catalog().await;
        let settings = export_settings(&catalog, &ExportOptions::default());

        assert!(settings.tool_search.enabled);
        assert_eq!(settings.tool_search.search_type, SearchType::Hybrid);
        assert_eq!(settings.always_loaded_tools.len(), 2);
        assert!(settings.always_loaded_tools.contains(&"Read".to_string()));
        assert_eq!(settings.tool_priorities["mcp__git__git_log"], Priority::Low);
        assert_eq!(settings.tool_priorities.len(), catalog.len());
    }

    #[tokio::test]
    async fn test_merge_preserves_unrelated_keys() {
        let catalog = mixed_catalog().await;
        let settings = export_settings(&catalog, &ExportOptions::default());
        let existing = serde_json::json!({
            "theme": "dark",
            "alwaysLoadedTools": ["stale"],
            "permissions": {"allow": ["Read"]}
        });

        let merged = merge_settings(existing, &settings).unwrap();
        assert_eq!(merged["theme"], "dark");
        assert_eq!(merged["permissions"]["allow"][0], "Read");
        assert_ne!(merged["alwaysLoadedTools"][0], "stale");
        assert_eq!(merged["toolSearch"]["maxResults"], 10);

        assert!(merge_settings(serde_json::json!([1, 2]), &settings).is_err());
    }

    #[tokio::test]
    async fn test_write_settings_rejects_non_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "[]").await.unwrap();

        let catalog = mixed_catalog().await;
        let settings = export_settings(&catalog, &ExportOptions::default());
        assert!(write_settings(&settings, &path).await.is_err());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "[]");
    }
}
