//! Tool catalog: entry model, derived indexes, the builder that produces
//! snapshots and the store that serves the active one.

mod builder;
mod entry;
mod index;
mod schema;
mod store;
pub mod taxonomy;

pub use builder::{BuildReport, CatalogBuilder, SourceWarning};
pub use entry::{Priority, SourceKind, ToolCatalogEntry, UsageRecord};
pub use index::{CATALOG_FORMAT_VERSION, ToolCatalog};
pub use schema::{InputSchema, SchemaType};
pub use store::CatalogStore;
pub use taxonomy::{CategoryRule, CategoryTaxonomy, DEFAULT_CATEGORY};
