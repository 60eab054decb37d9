//! Consumer-side settings describing resident and deferred tools.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{Priority, ToolCatalog};
use crate::config::ExportOptions;
use crate::search::SearchType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSearchSettings {
    pub enabled: bool,
    pub search_type: SearchType,
    pub max_results: usize,
    pub catalog_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSettings {
    pub tool_search: ToolSearchSettings,
    pub always_loaded_tools: Vec<String>,
    /// Categories in which every tool is deferred.
    pub deferred_categories: Vec<String>,
    pub tool_priorities: BTreeMap<String, Priority>,
}

impl ConsumerSettings {
    const KEYS: [&'static str; 4] = [
        "toolSearch",
        "alwaysLoadedTools",
        "deferredCategories",
        "toolPriorities",
    ];
}

pub fn export_settings(catalog: &ToolCatalog, options: &ExportOptions) -> ConsumerSettings {
    let always_loaded_tools: Vec<String> = catalog
        .tools()
        .iter()
        .filter(|t| !t.defer_loading)
        .map(|t| t.id.clone())
        .collect();

    let resident_categories: BTreeSet<&str> = catalog
        .tools()
        .iter()
        .filter(|t| !t.defer_loading)
        .map(|t| t.category.as_str())
        .collect();
    let deferred_categories = catalog
        .category_index()
        .keys()
        .filter(|c| !resident_categories.contains(c.as_str()))
        .cloned()
        .collect();

    let tool_priorities = catalog
        .tools()
        .iter()
        .map(|t| (t.id.clone(), t.priority))
        .collect();

    ConsumerSettings {
        tool_search: ToolSearchSettings {
            enabled: always_loaded_tools.len() < catalog.len(),
            search_type: options.search_type,
            max_results: options.max_results,
            catalog_path: options.catalog_path.clone(),
        },
        always_loaded_tools,
        deferred_categories,
        tool_priorities,
    }
}

/// Shallow-merge the generated keys into an existing settings object.
/// Unrelated keys are left as they are.
pub fn merge_settings(existing: Value, settings: &ConsumerSettings) -> crate::Result<Value> {
    let Value::Object(mut target) = existing else {
        return Err(crate::Error::Config(
            "existing settings must be a JSON object".to_string(),
        ));
    };
    let Value::Object(generated) = serde_json::to_value(settings)? else {
        return Err(crate::Error::Config(
            "generated settings did not serialize to an object".to_string(),
        ));
    };
    for (key, value) in generated {
        debug_assert!(ConsumerSettings::KEYS.contains(&key.as_str()));
        target.insert(key, value);
    }
    Ok(Value::Object(target))
}
