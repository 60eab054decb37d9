//! Search Tests
//!
//! BM25, regex and hybrid search over built catalogs, including the
//! three-tool scenario and the hybrid superset property.
//!
//! Run: cargo nextest run --test search_tests

use std::collections::BTreeSet;

use tool_catalog::catalog::taxonomy::{derive_aliases, extract_keywords};
use tool_catalog::{
    CatalogBuilder, HybridSearchEngine, McpToolDefinition, Priority, SearchField, SearchOptions,
    SearchStrategy, SearchType, SourceKind, StaticToolProvider, ToolCatalog, ToolCatalogEntry,
};

fn entry(server: &str, name: &str, description: &str, category: &str) -> ToolCatalogEntry {
    ToolCatalogEntry::new(SourceKind::Mcp, server, name, description)
        .category(category)
        .keywords(extract_keywords(name, description))
        .aliases(derive_aliases(name))
}

fn three_tool_engine() -> HybridSearchEngine {
    HybridSearchEngine::new(
        ToolCatalog::new(vec![
            entry("git", "git_status", "Show the working tree status", "git")
                .priority(Priority::Always),
            entry("fs", "list_files", "List files in a directory", "files")
                .priority(Priority::Medium),
            entry("obsidian", "obsidian_search_notes", "Search notes in the vault", "obsidian")
                .priority(Priority::Low),
        ])
        .unwrap(),
    )
}

async fn built_engine() -> HybridSearchEngine {
    let def = |name: &str, description: &str| {
        McpToolDefinition::new(name, description, serde_json::json!({"type": "object"}))
    };
    let (catalog, _) = CatalogBuilder::new()
        .provider(StaticToolProvider::new(
            "github",
            vec![
                def("create_pull_request", "Create a new pull request"),
                def("list_issues", "List open issues in a repository"),
                def("search_code", "Search code across repositories"),
            ],
        ))
        .provider(StaticToolProvider::new(
            "git",
            vec![
                def("git_status", "Show the working tree status"),
                def("git_commit", "Record changes to the repository"),
                def("git_diff", "Show changes between commits"),
            ],
        ))
        .provider(StaticToolProvider::new(
            "obsidian",
            vec![
                def("obsidian_search_notes", "Search notes in the vault"),
                def("obsidian_create_note", "Create a note in the vault"),
            ],
        ))
        .build()
        .await
        .unwrap();
    HybridSearchEngine::new(catalog)
}

fn names<'a>(results: impl IntoIterator<Item = &'a ToolCatalogEntry>) -> BTreeSet<&'a str> {
    results.into_iter().map(|t| t.name.as_str()).collect()
}

// =============================================================================
// Three-tool scenario
// =============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_hybrid_ranks_git_status_first() {
        let engine = three_tool_engine();
        let response = engine.search("git status", &SearchOptions::default());
        assert_eq!(response.strategy, SearchStrategy::Hybrid);
        assert_eq!(response.results[0].tool.name, "git_status");
    }

    #[test]
    fn test_regex_returns_exactly_git_status() {
        let engine = three_tool_engine();
        let response = engine.search("git_.*", &SearchOptions::new(SearchType::Regex));
        assert_eq!(response.ids(), vec!["mcp__git__git_status"]);
    }

    #[test]
    fn test_deferred_tools() {
        let engine = three_tool_engine();
        assert_eq!(
            names(engine.deferred_tools()),
            BTreeSet::from(["list_files", "obsidian_search_notes"])
        );
        assert_eq!(names(engine.always_loaded_tools()), BTreeSet::from(["git_status"]));
    }
}

// =============================================================================
// Engine behaviour
// =============================================================================

mod engine_tests {
    use super::*;

    #[tokio::test]
    async fn test_bm25_finds_by_description_and_alias() {
        let engine = built_engine().await;
        let options = SearchOptions::new(SearchType::Bm25);

        let response = engine.search("pull request", &options);
        assert_eq!(response.results[0].tool.name, "create_pull_request");

        let response = engine.search("ls", &options);
        let found = names(response.results.iter().map(|r| r.tool));
        assert_eq!(found, BTreeSet::from(["list_issues"]), "synonym alias should match");
    }

    #[tokio::test]
    async fn test_malformed_patterns_never_panic() {
        let engine = built_engine().await;
        for pattern in ["(unclosed", "[a-", "*", "a{2,1}", r"\"] {
            let matches = engine.pattern().search(pattern, 10);
            assert!(!matches.valid, "{pattern} should be invalid");
            assert!(!matches.error.as_deref().unwrap_or_default().is_empty());
            assert!(matches.results.is_empty());
        }
    }

    #[tokio::test]
    async fn test_hybrid_superset_of_single_engines() {
        let engine = built_engine().await;
        let limit = engine.catalog().len();
        for query in [
            "search",
            "create note",
            "git changes",
            "issues in repository",
            "^git_",
            "obsidian|github",
        ] {
            let hybrid = engine.search(query, &SearchOptions::default().limit(limit));
            let hybrid_ids: BTreeSet<&str> = hybrid.ids().into_iter().collect();

            let bm25 = engine.search(query, &SearchOptions::new(SearchType::Bm25).limit(limit));
            let regex = engine.search(query, &SearchOptions::new(SearchType::Regex).limit(limit));

            if hybrid.strategy == SearchStrategy::Regex {
                assert_eq!(hybrid.ids(), regex.ids(), "{query}");
                continue;
            }
            for id in bm25.ids().into_iter().chain(regex.ids()) {
                assert!(hybrid_ids.contains(id), "{query}: {id} missing from hybrid");
            }

            let capped = engine.search(query, &SearchOptions::default().limit(2));
            assert!(capped.results.len() <= 2, "{query}: limit ignored");
            assert_eq!(capped.ids(), hybrid.ids()[..capped.results.len()], "{query}");
        }
    }

    #[tokio::test]
    async fn test_filters() {
        let engine = built_engine().await;

        let response = engine.search("search", &SearchOptions::default().category("obsidian"));
        assert!(!response.results.is_empty());
        assert!(response.results.iter().all(|r| r.tool.category == "obsidian"));

        let response = engine.search(
            "create",
            &SearchOptions::default().source(SourceKind::Builtin),
        );
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_matched_fields_reported() {
        let engine = built_engine().await;
        let response = engine.search("vault", &SearchOptions::new(SearchType::Bm25));
        assert!(!response.results.is_empty());
        for result in &response.results {
            assert!(result.matched_fields.contains(&SearchField::Description));
        }
    }

    #[tokio::test]
    async fn test_stats_and_suggest() {
        let engine = built_engine().await;
        let stats = engine.stats();
        assert_eq!(stats.total_tools, 8);
        assert_eq!(stats.always_loaded_count + stats.deferred_count, 8);
        assert_eq!(stats.by_source[&SourceKind::Mcp], 8);
        assert_eq!(stats.by_category.values().sum::<usize>(), 8);

        let suggestions = engine.suggest("rep", 5);
        assert!(suggestions.iter().all(|s| s.starts_with("rep")));
        assert!(suggestions.contains(&"repository".to_string()));
    }
}
