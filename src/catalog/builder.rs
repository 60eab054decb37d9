//! Catalog construction from configured sources.
//!
//! Server-backed sources are queried concurrently through a bounded pool.
//! Each query has its own timeout; a failed or slow server degrades to its
//! fallback list and a [`SourceWarning`] instead of failing the build.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::entry::{SourceKind, ToolCatalogEntry};
use super::index::ToolCatalog;
use super::schema::InputSchema;
use super::taxonomy::{CategoryTaxonomy, derive_aliases, extract_keywords};
use crate::config::CatalogConfig;
use crate::mcp::{McpToolDefinition, McpToolProvider};
use crate::source::{FallbackRegistry, SubagentLoader, ToolProvider};

const SUBAGENT_SERVER: &str = "subagents";
/// Category for subagents whose frontmatter names none.
const SUBAGENT_CATEGORY: &str = "agents";
const BUILTIN_SERVER: &str = "builtin";

/// A source that could not be reached or produced unusable data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWarning {
    pub source: String,
    pub message: String,
}

impl SourceWarning {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SourceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Outcome summary of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub warnings: Vec<SourceWarning>,
    /// Servers that answered a live `list_tools` call.
    pub live_sources: usize,
    /// Servers that failed and contributed their fallback list.
    pub fallback_sources: usize,
    /// Crate descriptors, subagent files and the builtin list that added
    /// at least one entry.
    pub local_sources: usize,
    pub tool_count: usize,
    pub elapsed: Duration,
}

struct ServerSource {
    provider: Arc<dyn ToolProvider>,
    timeout: Option<Duration>,
}

enum Discovery {
    Live(Vec<McpToolDefinition>),
    Failed(String),
    Cancelled,
}

pub struct CatalogBuilder {
    config: CatalogConfig,
    taxonomy: CategoryTaxonomy,
    fallbacks: FallbackRegistry,
    servers: Vec<ServerSource>,
    cancel: CancellationToken,
}

impl CatalogBuilder {
    /// Builder with no sources; add providers and local definitions explicitly.
    pub fn new() -> Self {
        Self {
            config: CatalogConfig::default(),
            taxonomy: CategoryTaxonomy::default(),
            fallbacks: FallbackRegistry::new(),
            servers: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// One MCP provider per enabled server; `fallbackTools` entries seed the
    /// fallback registry.
    pub fn from_config(config: CatalogConfig) -> Self {
        let servers = config
            .enabled_servers()
            .map(|(name, entry)| ServerSource {
                provider: Arc::new(McpToolProvider::new(name.clone(), entry.config.clone())),
                timeout: entry.timeout(),
            })
            .collect();
        let fallbacks = config
            .enabled_servers()
            .filter(|(_, entry)| !entry.fallback_tools.is_empty())
            .map(|(name, entry)| (name.clone(), entry.fallback_tools.clone()))
            .collect();
        let taxonomy = config.taxonomy.clone().unwrap_or_default();

        Self {
            config,
            taxonomy,
            fallbacks,
            servers,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn taxonomy(mut self, taxonomy: CategoryTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Merge additional fallback lists; these win over configured ones.
    pub fn fallbacks(mut self, registry: FallbackRegistry) -> Self {
        self.fallbacks = std::mem::take(&mut self.fallbacks).merge(registry);
        self
    }

    /// Add a server-backed source using the default discovery timeout.
    pub fn provider(self, provider: impl ToolProvider + 'static) -> Self {
        self.push_provider(Arc::new(provider), None)
    }

    pub fn provider_with_timeout(
        self,
        provider: impl ToolProvider + 'static,
        timeout: Duration,
    ) -> Self {
        self.push_provider(Arc::new(provider), Some(timeout))
    }

    fn push_provider(mut self, provider: Arc<dyn ToolProvider>, timeout: Option<Duration>) -> Self {
        self.servers.push(ServerSource { provider, timeout });
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Discover, normalize and index every source.
    ///
    /// Fails with [`crate::Error::AllSourcesFailed`] when no server answered
    /// and no local source produced an entry, or when the result would be
    /// empty, and with [`crate::Error::Cancelled`]
    /// when the cancellation token fires first.
    #[instrument(skip_all, fields(servers = self.servers.len()))]
    pub async fn build(&self) -> crate::Result<(ToolCatalog, BuildReport)> {
        let started = Instant::now();
        if self.cancel.is_cancelled() {
            return Err(crate::Error::Cancelled);
        }

        let mut report = BuildReport::default();
        let mut collector = EntryCollector::default();

        let discoveries = self.discover_servers().await;
        for (source, discovery) in self.servers.iter().zip(discoveries) {
            let server = source.provider.name();
            match discovery {
                Discovery::Live(tools) => {
                    debug!(server = %server, tools = tools.len(), "Discovered tools");
                    report.live_sources += 1;
                    for def in &tools {
                        collector.push(self.normalize(SourceKind::Mcp, server, def, None), &mut report);
                    }
                }
                Discovery::Failed(message) => {
                    warn!(server = %server, error = %message, "Tool discovery failed");
                    report.warnings.push(SourceWarning::new(server, message));
                    if let Some(tools) = self.fallbacks.get(server) {
                        report.fallback_sources += 1;
                        for def in tools {
                            collector.push(
                                self.normalize(SourceKind::Mcp, server, def, None),
                                &mut report,
                            );
                        }
                    }
                }
                Discovery::Cancelled => return Err(crate::Error::Cancelled),
            }
        }

        self.collect_local(&mut collector, &mut report).await?;

        let produced = report.live_sources > 0 || report.local_sources > 0;
        if !produced || collector.entries.is_empty() {
            return Err(crate::Error::AllSourcesFailed {
                warnings: report.warnings,
            });
        }
        if self.cancel.is_cancelled() {
            return Err(crate::Error::Cancelled);
        }

        let catalog = ToolCatalog::new(collector.entries)?;
        report.tool_count = catalog.len();
        report.elapsed = started.elapsed();
        info!(
            tools = report.tool_count,
            live = report.live_sources,
            fallback = report.fallback_sources,
            local = report.local_sources,
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Catalog built"
        );
        Ok((catalog, report))
    }

    /// Query every server with at most `max_concurrency` calls in flight.
    /// Results come back in registration order.
    async fn discover_servers(&self) -> Vec<Discovery> {
        let permits = Semaphore::new(self.config.build.max_concurrency.max(1));
        let default_timeout = self.config.build.discovery_timeout();

        let futures = self.servers.iter().map(|source| {
            let permits = &permits;
            let timeout = source.timeout.unwrap_or(default_timeout);
            async move {
                let work = async {
                    let Ok(_permit) = permits.acquire().await else {
                        return Discovery::Failed("discovery pool closed".to_string());
                    };
                    match tokio::time::timeout(timeout, source.provider.list_tools()).await {
                        Ok(Ok(tools)) => Discovery::Live(tools),
                        Ok(Err(e)) => Discovery::Failed(e.to_string()),
                        Err(_) => Discovery::Failed(format!(
                            "timed out after {}ms",
                            timeout.as_millis()
                        )),
                    }
                };
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Discovery::Cancelled,
                    outcome = work => outcome,
                }
            }
        });

        join_all(futures).await
    }

    async fn collect_local(
        &self,
        collector: &mut EntryCollector,
        report: &mut BuildReport,
    ) -> crate::Result<()> {
        for descriptor in &self.config.crates {
            let before = collector.entries.len();
            for def in &descriptor.tools {
                let entry = self.normalize(
                    SourceKind::RustCrate,
                    &descriptor.name,
                    def,
                    descriptor.category.as_deref(),
                );
                collector.push(entry, report);
            }
            if collector.entries.len() > before {
                report.local_sources += 1;
            }
        }

        let loader = SubagentLoader::new();
        for dir in &self.config.subagent_dirs {
            if self.cancel.is_cancelled() {
                return Err(crate::Error::Cancelled);
            }
            for agent in loader.load_dir(dir).await? {
                let def = agent.to_tool_definition();
                let entry = self.normalize(
                    SourceKind::Subagent,
                    SUBAGENT_SERVER,
                    &def,
                    Some(agent.category.as_deref().unwrap_or(SUBAGENT_CATEGORY)),
                );
                if collector.push(entry, report) {
                    report.local_sources += 1;
                }
            }
        }

        let before = collector.entries.len();
        for def in &self.config.builtins {
            collector.push(
                self.normalize(SourceKind::Builtin, BUILTIN_SERVER, def, None),
                report,
            );
        }
        if collector.entries.len() > before {
            report.local_sources += 1;
        }
        Ok(())
    }

    fn normalize(
        &self,
        source: SourceKind,
        server: &str,
        def: &McpToolDefinition,
        category_hint: Option<&str>,
    ) -> ToolCatalogEntry {
        let id = source.make_id(server, &def.name);
        let usage = self
            .config
            .usage
            .get(&id)
            .or_else(|| self.config.usage.get(&def.name))
            .copied();

        let category = match category_hint {
            Some(category) => category.to_string(),
            None => self.taxonomy.categorize(&def.name, &def.description),
        };
        let priority = self
            .config
            .priority_overrides
            .get(&id)
            .or_else(|| self.config.priority_overrides.get(&def.name))
            .copied()
            .unwrap_or_else(|| {
                self.taxonomy
                    .priority_for(&category, usage.map(|u| u.count))
            });

        let mut entry = ToolCatalogEntry::new(source, server, &def.name, &def.description)
            .category(category)
            .priority(priority)
            .defer_loading(priority.defers(self.config.build.defer_high))
            .keywords(extract_keywords(&def.name, &def.description))
            .aliases(derive_aliases(&def.name))
            .input_schema(InputSchema::from_json(&def.input_schema));
        if let Some(usage) = usage {
            entry = entry.usage(usage);
        }
        entry
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// First occurrence of an id wins; later ones become warnings.
#[derive(Default)]
struct EntryCollector {
    entries: Vec<ToolCatalogEntry>,
    seen: std::collections::HashSet<String>,
}

impl EntryCollector {
    /// Returns whether the entry was kept.
    fn push(&mut self, entry: ToolCatalogEntry, report: &mut BuildReport) -> bool {
        if self.seen.insert(entry.id.clone()) {
            self.entries.push(entry);
            true
        } else {
            warn!(id = %entry.id, server = %entry.server, "Duplicate tool id ignored");
            report.warnings.push(SourceWarning::new(
                entry.server,
                format!("duplicate tool id '{}' ignored", entry.id),
            ));
            false
        }
    }
}
