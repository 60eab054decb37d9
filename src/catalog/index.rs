//! Immutable catalog snapshot with derived lookup indexes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{Priority, SourceKind, ToolCatalogEntry};

/// Format version written into every persisted catalog.
pub const CATALOG_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCatalog {
    version: String,
    generated_at: DateTime<Utc>,
    tools: Vec<ToolCatalogEntry>,
    by_category: BTreeMap<String, Vec<String>>,
    by_source: BTreeMap<SourceKind, Vec<String>>,
    by_priority: BTreeMap<Priority, Vec<String>>,
    by_server: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    by_id: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    version: String,
    generated_at: DateTime<Utc>,
    tools: Vec<ToolCatalogEntry>,
    by_category: BTreeMap<String, Vec<String>>,
    by_source: BTreeMap<SourceKind, Vec<String>>,
    by_priority: BTreeMap<Priority, Vec<String>>,
    by_server: BTreeMap<String, Vec<String>>,
}

impl ToolCatalog {
    /// Build a snapshot from entries, deriving every index in one pass.
    ///
    /// Fails on duplicate ids and on entries whose defer flag contradicts
    /// their priority.
    pub fn new(tools: Vec<ToolCatalogEntry>) -> crate::Result<Self> {
        Self::assemble(tools, Utc::now())
    }

    fn assemble(tools: Vec<ToolCatalogEntry>, generated_at: DateTime<Utc>) -> crate::Result<Self> {
        let mut by_id = HashMap::with_capacity(tools.len());
        let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut by_source: BTreeMap<SourceKind, Vec<String>> = BTreeMap::new();
        let mut by_priority: BTreeMap<Priority, Vec<String>> = BTreeMap::new();
        let mut by_server: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (pos, entry) in tools.iter().enumerate() {
            if !entry.is_consistent() {
                return Err(crate::Error::InvalidCatalog(format!(
                    "tool '{}' has priority {} but deferLoading={}",
                    entry.id, entry.priority, entry.defer_loading
                )));
            }
            if by_id.insert(entry.id.clone(), pos).is_some() {
                return Err(crate::Error::InvalidCatalog(format!(
                    "duplicate tool id '{}'",
                    entry.id
                )));
            }
            by_category
                .entry(entry.category.clone())
                .or_default()
                .push(entry.id.clone());
            by_source
                .entry(entry.source)
                .or_default()
                .push(entry.id.clone());
            by_priority
                .entry(entry.priority)
                .or_default()
                .push(entry.id.clone());
            by_server
                .entry(entry.server.clone())
                .or_default()
                .push(entry.id.clone());
        }

        Ok(Self {
            version: CATALOG_FORMAT_VERSION.to_string(),
            generated_at,
            tools,
            by_category,
            by_source,
            by_priority,
            by_server,
            by_id,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn tools(&self) -> &[ToolCatalogEntry] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ToolCatalogEntry> {
        self.by_id.get(id).map(|&pos| &self.tools[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn by_category(&self, category: &str) -> &[String] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn by_source(&self, source: SourceKind) -> &[String] {
        self.by_source
            .get(&source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn by_priority(&self, priority: Priority) -> &[String] {
        self.by_priority
            .get(&priority)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn by_server(&self, server: &str) -> &[String] {
        self.by_server
            .get(server)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn category_index(&self) -> &BTreeMap<String, Vec<String>> {
        &self.by_category
    }

    pub fn source_index(&self) -> &BTreeMap<SourceKind, Vec<String>> {
        &self.by_source
    }

    pub fn priority_index(&self) -> &BTreeMap<Priority, Vec<String>> {
        &self.by_priority
    }

    pub fn server_index(&self) -> &BTreeMap<String, Vec<String>> {
        &self.by_server
    }

    /// Resolve ids to entries, skipping unknown ids.
    pub fn resolve<'a>(&'a self, ids: &'a [String]) -> impl Iterator<Item = &'a ToolCatalogEntry> {
        ids.iter().filter_map(|id| self.get(id))
    }

    pub fn total_tokens(&self) -> usize {
        self.tools.iter().map(ToolCatalogEntry::estimated_tokens).sum()
    }

    /// Equal in everything except `generatedAt`.
    pub fn same_content(&self, other: &ToolCatalog) -> bool {
        self.version == other.version
            && self.tools == other.tools
            && self.by_category == other.by_category
            && self.by_source == other.by_source
            && self.by_priority == other.by_priority
            && self.by_server == other.by_server
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a persisted catalog, refusing incompatible or inconsistent files.
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)?;
        let found = raw
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("<missing>")
            .to_string();
        if major(&found) != major(CATALOG_FORMAT_VERSION) {
            return Err(crate::Error::SchemaMismatch {
                expected: CATALOG_FORMAT_VERSION.to_string(),
                found,
            });
        }

        let file: CatalogFile = serde_json::from_value(raw)
            .map_err(|e| crate::Error::InvalidCatalog(e.to_string()))?;

        let mut catalog = Self::assemble(file.tools, file.generated_at)?;
        if catalog.by_category != file.by_category
            || catalog.by_source != file.by_source
            || catalog.by_priority != file.by_priority
            || catalog.by_server != file.by_server
        {
            return Err(crate::Error::InvalidCatalog(
                "stored indexes disagree with tool list".to_string(),
            ));
        }
        catalog.version = file.version;
        Ok(catalog)
    }

    pub async fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&content)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json()?).await?;
        Ok(())
    }
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}
