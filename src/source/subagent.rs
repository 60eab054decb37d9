//! Subagent definition files: Markdown with YAML frontmatter.
//!
//! ```text
//! ---
//! name: code-reviewer
//! description: Reviews diffs for correctness and style
//! tools: Read, Grep, Bash(git:*)
//! category: agents
//! ---
//! You are a meticulous reviewer...
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::catalog::{InputSchema, SchemaType};
use crate::mcp::McpToolDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubagentFrontmatter {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tools: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubagentDefinition {
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub path: Option<PathBuf>,
}

impl SubagentDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tools: Vec::new(),
            model: None,
            category: None,
            path: None,
        }
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The callable surface of a subagent: a single task prompt.
    pub fn to_tool_definition(&self) -> McpToolDefinition {
        let mut description = self.description.clone();
        if !self.tools.is_empty() {
            description.push_str(&format!(" (tools: {})", self.tools.join(", ")));
        }
        let schema = InputSchema::object().required_property(
            "prompt",
            InputSchema::of_type(SchemaType::String).description("Task for the subagent"),
        );
        McpToolDefinition::new(self.name.clone(), description, schema.to_json())
    }
}

struct ParsedDocument<F> {
    frontmatter: F,
}

fn parse_frontmatter<F: DeserializeOwned>(content: &str) -> crate::Result<ParsedDocument<F>> {
    let content = content.trim_start_matches('\u{feff}');
    if !content.starts_with("---") {
        return Err(crate::Error::Parse(
            "Document must have YAML frontmatter (starting with ---)".to_string(),
        ));
    }

    let after_first = &content[3..];
    let end_pos = after_first.find("\n---").ok_or_else(|| {
        crate::Error::Parse("Frontmatter not properly terminated with ---".to_string())
    })?;

    let frontmatter: F = serde_yaml_ng::from_str(after_first[..end_pos].trim())
        .map_err(|e| crate::Error::Parse(format!("Failed to parse frontmatter: {}", e)))?;

    Ok(ParsedDocument { frontmatter })
}

/// Comma-separated list, ignoring commas inside parentheses.
fn split_csv(s: Option<String>) -> Vec<String> {
    let Some(v) = s else {
        return Vec::new();
    };
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0u32;
    for ch in v.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    items.push(trimmed.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        items.push(trimmed.to_string());
    }
    items
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubagentLoader;

impl SubagentLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str, path: Option<&Path>) -> crate::Result<SubagentDefinition> {
        let doc = parse_frontmatter::<SubagentFrontmatter>(content)?;
        let fm = doc.frontmatter;
        Ok(SubagentDefinition {
            name: fm.name,
            description: fm.description,
            tools: split_csv(fm.tools),
            model: fm.model,
            category: fm.category,
            path: path.map(Path::to_path_buf),
        })
    }

    pub async fn load_file(&self, path: &Path) -> crate::Result<SubagentDefinition> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            crate::Error::Config(format!("Failed to read subagent file {:?}: {}", path, e))
        })?;
        self.parse(&content, Some(path))
    }

    /// Load every `*.md` under `dir`, sorted by path. Unparseable files are
    /// skipped with a warning; a missing directory yields nothing.
    pub async fn load_dir(&self, dir: &Path) -> crate::Result<Vec<SubagentDefinition>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let root = glob::Pattern::escape(&dir.to_string_lossy());
        let pattern = Path::new(&root).join("**").join("*.md");
        let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| crate::Error::Config(format!("Invalid subagent directory {:?}: {}", dir, e)))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut definitions = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_file(&path).await {
                Ok(def) => definitions.push(def),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to load subagent")
                }
            }
        }
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVIEWER: &str = r#"---
name: code-reviewer
description: Reviews diffs for correctness
tools: Read, Grep, Bash(git:diff, git:log)
model: haiku
---

You review code.
"#;

    #[test]
    fn test_parse_subagent() {
        let def = SubagentLoader::new().parse(REVIEWER, None).unwrap();
        assert_eq!(def.name, "code-reviewer");
        assert_eq!(def.tools, vec!["Read", "Grep", "Bash(git:diff, git:log)"]);
        assert_eq!(def.model.as_deref(), Some("haiku"));
        assert!(def.category.is_none());
    }

    #[test]
    fn test_parse_requires_frontmatter() {
        let loader = SubagentLoader::new();
        assert!(loader.parse("no frontmatter", None).is_err());
        assert!(loader.parse("---\nname: x\n", None).is_err());
        assert!(loader.parse("---\nname: x\n---\n", None).is_err());
    }

    #[test]
    fn test_to_tool_definition() {
        let def = SubagentDefinition::new("explore", "Explore the codebase").tools(["Read", "Glob"]);
        let tool = def.to_tool_definition();
        assert_eq!(tool.name, "explore");
        assert!(tool.description.ends_with("(tools: Read, Glob)"));
        assert_eq!(tool.input_schema["required"], serde_json::json!(["prompt"]));
    }

    #[tokio::test]
    async fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("team");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(dir.path().join("reviewer.md"), REVIEWER)
            .await
            .unwrap();
        tokio::fs::write(
            nested.join("planner.md"),
            "---\nname: planner\ndescription: Plans work\ncategory: agents\n---\n",
        )
        .await
        .unwrap();
        tokio::fs::write(dir.path().join("broken.md"), "not a subagent")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored")
            .await
            .unwrap();

        let defs = SubagentLoader::new().load_dir(dir.path()).await.unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["code-reviewer", "planner"]);
        assert_eq!(defs[1].category.as_deref(), Some("agents"));
        assert!(defs[0].path.is_some());
    }

    #[tokio::test]
    async fn test_load_dir_with_glob_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        let agents = dir.path().join("agents[1]*?");
        tokio::fs::create_dir_all(&agents).await.unwrap();
        tokio::fs::write(agents.join("reviewer.md"), REVIEWER)
            .await
            .unwrap();
        let sibling = dir.path().join("agents1x");
        tokio::fs::create_dir_all(&sibling).await.unwrap();
        tokio::fs::write(
            sibling.join("other.md"),
            "---\nname: other\ndescription: Must not be picked up\n---\n",
        )
        .await
        .unwrap();

        let defs = SubagentLoader::new().load_dir(&agents).await.unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["code-reviewer"]);
    }

    #[tokio::test]
    async fn test_load_missing_dir() {
        let defs = SubagentLoader::new()
            .load_dir(Path::new("/nonexistent/subagents"))
            .await
            .unwrap();
        assert!(defs.is_empty());
    }
}
