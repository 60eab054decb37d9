//! Build-time exports: Anthropic tool lists and consumer settings.

mod anthropic;
mod settings;
mod toolset;

pub use anthropic::{
    AnthropicExport, AnthropicTool, ExportedTool, TokenSavings, ToolSearchTool,
    estimate_tool_tokens, export_anthropic, token_savings,
};
pub use settings::{ConsumerSettings, ToolSearchSettings, export_settings, merge_settings};
pub use toolset::{McpToolset, ToolLoadConfig, ToolsetKind, mcp_toolsets};

use std::path::Path;

use crate::catalog::ToolCatalog;

async fn ensure_parent(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Persist the catalog as pretty JSON.
pub async fn write_catalog(catalog: &ToolCatalog, path: impl AsRef<Path>) -> crate::Result<()> {
    catalog.save(path).await
}

/// Write settings, merging into the file at `path` when one already exists.
pub async fn write_settings(
    settings: &ConsumerSettings,
    path: impl AsRef<Path>,
) -> crate::Result<()> {
    let path = path.as_ref();
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            serde_json::Value::Object(Default::default())
        }
        Err(e) => return Err(e.into()),
    };
    let merged = merge_settings(existing, settings)?;

    ensure_parent(path).await?;
    tokio::fs::write(path, serde_json::to_string_pretty(&merged)?).await?;
    tracing::debug!(path = %path.display(), "Wrote consumer settings");
    Ok(())
}

/// Write an Anthropic export as pretty JSON.
pub async fn write_anthropic(export: &AnthropicExport, path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    ensure_parent(path).await?;
    tokio::fs::write(path, serde_json::to_string_pretty(export)?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Priority, SourceKind, ToolCatalogEntry};
    use crate::config::ExportOptions;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(vec![
            ToolCatalogEntry::new(SourceKind::Builtin, "builtin", "Read", "Read a file")
                .priority(Priority::Always),
            ToolCatalogEntry::new(SourceKind::Builtin, "builtin", "WebFetch", "Fetch a URL"),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_write_settings_merges_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = export_settings(&catalog(), &ExportOptions::default());

        write_settings(&settings, &path).await.unwrap();
        let mut content: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        content["model"] = serde_json::json!("sonnet");
        tokio::fs::write(&path, content.to_string()).await.unwrap();

        write_settings(&settings, &path).await.unwrap();
        let content: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(content["model"], "sonnet");
        assert_eq!(content["alwaysLoadedTools"][0], "Read");
    }

    #[tokio::test]
    async fn test_write_catalog_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog();

        let catalog_path = dir.path().join("out").join("catalog.json");
        write_catalog(&catalog, &catalog_path).await.unwrap();
        let loaded = ToolCatalog::load(&catalog_path).await.unwrap();
        assert!(loaded.same_content(&catalog));

        let export_path = dir.path().join("tools.json");
        let export = export_anthropic(&catalog, &ExportOptions::default());
        write_anthropic(&export, &export_path).await.unwrap();
        let back: AnthropicExport =
            serde_json::from_str(&tokio::fs::read_to_string(&export_path).await.unwrap()).unwrap();
        assert_eq!(back.tools, export.tools);
        assert_eq!(back.mcp_toolsets, export.mcp_toolsets);
    }
}
