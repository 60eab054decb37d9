//! Active catalog snapshot with atomic replacement on rebuild.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::builder::{BuildReport, CatalogBuilder};
use super::index::ToolCatalog;
use crate::search::HybridSearchEngine;

/// Holds the search engine for the current catalog snapshot.
///
/// Readers clone an `Arc` to the engine and search without holding the lock.
/// Rebuilds construct the complete replacement before swapping it in, so a
/// reader sees either the previous or the new snapshot, never a partial one.
#[derive(Default)]
pub struct CatalogStore {
    current: RwLock<Option<Arc<HybridSearchEngine>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: ToolCatalog) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(HybridSearchEngine::new(catalog)))),
        }
    }

    pub async fn snapshot(&self) -> Option<Arc<HybridSearchEngine>> {
        self.current.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Replace the active snapshot, returning the previous one.
    pub async fn replace(&self, catalog: ToolCatalog) -> Option<Arc<HybridSearchEngine>> {
        let engine = Arc::new(HybridSearchEngine::new(catalog));
        self.current.write().await.replace(engine)
    }

    /// Run a build and publish its catalog. On failure or cancellation the
    /// previous snapshot stays active.
    pub async fn rebuild(&self, builder: &CatalogBuilder) -> crate::Result<BuildReport> {
        let (catalog, report) = builder.build().await?;
        let engine = Arc::new(HybridSearchEngine::new(catalog));
        *self.current.write().await = Some(engine);
        tracing::info!(
            tools = report.tool_count,
            warnings = report.warnings.len(),
            "Catalog snapshot replaced"
        );
        Ok(report)
    }

    /// Load a persisted catalog. Schema or structure problems leave the
    /// current snapshot untouched.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let catalog = ToolCatalog::load(path).await?;
        self.replace(catalog).await;
        Ok(())
    }
}
