//! Tool sources: the live discovery contract, static fallbacks and local
//! definitions that need no network call.

mod fallback;
mod local;
mod provider;
mod subagent;

pub use fallback::FallbackRegistry;
pub use local::CrateDescriptor;
pub use provider::{StaticToolProvider, ToolProvider};
pub use subagent::{SubagentDefinition, SubagentFrontmatter, SubagentLoader};
