//! Catalog entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::InputSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Mcp,
    RustCrate,
    Subagent,
    Builtin,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcp => "mcp",
            Self::RustCrate => "rust_crate",
            Self::Subagent => "subagent",
            Self::Builtin => "builtin",
        }
    }

    /// Catalog id for a tool from this kind of source.
    pub fn make_id(&self, server: &str, tool: &str) -> String {
        match self {
            Self::Mcp => crate::mcp::make_mcp_name(server, tool),
            Self::RustCrate => format!("crate__{server}__{tool}"),
            Self::Subagent => format!("agent__{tool}"),
            Self::Builtin => tool.to_string(),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loading priority. Declaration order is rank order: `Always` sorts first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Always,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Always, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Defer flag implied by this priority; `High` is the tunable case.
    pub fn defers(&self, defer_high: bool) -> bool {
        match self {
            Self::Always => false,
            Self::High => defer_high,
            Self::Medium | Self::Low => true,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Historical usage handed into a rebuild and carried forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageRecord {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            last_used: None,
        }
    }

    pub fn last_used(mut self, at: DateTime<Utc>) -> Self {
        self.last_used = Some(at);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCatalogEntry {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub source: SourceKind,
    pub server: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub priority: Priority,
    pub defer_loading: bool,
    #[serde(default)]
    pub input_schema: InputSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl ToolCatalogEntry {
    /// Entry with derived fields left empty; the builder fills them in.
    pub fn new(
        source: SourceKind,
        server: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let server = server.into();
        let name = name.into();
        Self {
            id: source.make_id(&server, &name),
            display_name: display_name(&name),
            name,
            source,
            server,
            category: super::taxonomy::DEFAULT_CATEGORY.to_string(),
            subcategory: None,
            description: description.into(),
            keywords: Vec::new(),
            aliases: Vec::new(),
            priority: Priority::Medium,
            defer_loading: true,
            input_schema: InputSchema::object(),
            usage_count: None,
            last_used: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Sets priority and the defer flag it implies.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self.defer_loading = priority.defers(false);
        self
    }

    pub fn defer_loading(mut self, defer: bool) -> Self {
        self.defer_loading = defer;
        self
    }

    pub fn keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn input_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn usage(mut self, usage: UsageRecord) -> Self {
        self.usage_count = Some(usage.count);
        self.last_used = usage.last_used;
        self
    }

    /// Whether the priority/defer invariant holds for this entry.
    pub fn is_consistent(&self) -> bool {
        match self.priority {
            Priority::Always => !self.defer_loading,
            Priority::High => true,
            Priority::Medium | Priority::Low => self.defer_loading,
        }
    }

    /// Estimated context cost of this tool's definition.
    ///
    /// Uses a chars/4 heuristic plus a fixed overhead of 20 tokens for JSON structure.
    pub fn estimated_tokens(&self) -> usize {
        self.name.len() / 4
            + self.description.len() / 4
            + self.input_schema.to_json().to_string().len() / 4
            + 20
    }
}

/// `git_status` → `Git Status`, `listFiles` → `List Files`.
pub(crate) fn display_name(name: &str) -> String {
    super::taxonomy::split_identifier(name)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
