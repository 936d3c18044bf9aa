//! Property tests for the catalog, name resolution and search.

use proptest::prelude::*;
use std::collections::HashSet;
use toolhub_core::tools::{
    normalize_name, Frequency, NameResolver, SearchQuery, ToolCategory, ToolDescriptor,
    ToolRegistry,
};
use toolhub_core::types::ResolverConfig;

const CATEGORIES: [ToolCategory; 4] = [
    ToolCategory::Security,
    ToolCategory::Testing,
    ToolCategory::Analysis,
    ToolCategory::Refactoring,
];

/// 50 descriptors; `high[i]` decides whether tool `i` is immediate.
fn fixture(high: &[bool]) -> ToolRegistry {
    let descriptors = high.iter().enumerate().map(|(i, &is_high)| {
        let frequency = match (is_high, i % 2) {
            (true, _) => Frequency::High,
            (false, 0) => Frequency::Medium,
            (false, _) => Frequency::Low,
        };
        ToolDescriptor::new(
            &format!("fixture_tool_{i:02}"),
            &format!("server-{}", i % 5),
            frequency,
            CATEGORIES[i % CATEGORIES.len()],
            "Fixture tool used by property tests",
        )
        .keywords([format!("kw{}", i % 7)])
    });
    ToolRegistry::from_descriptors(descriptors).unwrap()
}

fn builtin() -> (ToolRegistry, NameResolver) {
    let registry = ToolRegistry::builtin().unwrap();
    let resolver = NameResolver::new(&registry, &ResolverConfig::default());
    (registry, resolver)
}

/// Every (alias, canonical) pair of the builtin catalog.
fn alias_pairs() -> Vec<(String, String)> {
    let registry = ToolRegistry::builtin().unwrap();
    registry
        .iter()
        .flat_map(|d| d.aliases.iter().map(move |a| (a.clone(), d.name.clone())))
        .collect()
}

/// Flip case per `upper` and put a separator before characters where `sep` says so.
fn mangle(alias: &str, upper: &[bool], sep: &[u8]) -> String {
    let mut out = String::new();
    for (i, c) in alias.chars().enumerate() {
        match sep.get(i).copied().unwrap_or(0) {
            1 => out.push('-'),
            2 => out.push('_'),
            3 => out.push(' '),
            _ => {}
        }
        if upper.get(i).copied().unwrap_or(false) {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn test_canonical_names_resolve_to_themselves() {
    let (registry, resolver) = builtin();
    for descriptor in registry.iter() {
        assert_eq!(resolver.resolve(&descriptor.name), Some(descriptor.name.as_str()));
    }
}

#[test]
fn test_search_without_filters_returns_each_descriptor_once() {
    let (registry, _) = builtin();
    let hits = registry.search_tools(&SearchQuery::default());
    let names: HashSet<&str> = hits.iter().map(|h| h.descriptor.name.as_str()).collect();
    assert_eq!(hits.len(), registry.tool_count());
    assert_eq!(names.len(), registry.tool_count());
}

proptest! {
    #[test]
    fn prop_immediate_and_deferred_partition(high in prop::collection::vec(any::<bool>(), 50)) {
        let registry = fixture(&high);
        let k = high.iter().filter(|&&h| h).count();
        prop_assert_eq!(registry.tool_count(), 50);
        prop_assert_eq!(registry.immediate_tools().len(), k);
        prop_assert_eq!(registry.deferred_tools().len(), 50 - k);
    }

    #[test]
    fn prop_category_filter_is_exact(
        high in prop::collection::vec(any::<bool>(), 50),
        c in 0usize..4,
    ) {
        let registry = fixture(&high);
        let category = CATEGORIES[c];
        let query = SearchQuery { category: Some(category), ..Default::default() };
        let hits = registry.search_tools(&query);
        prop_assert!(hits.iter().all(|h| h.descriptor.category == category));
        prop_assert_eq!(hits.len(), registry.tools_by_category(category).len());
    }

    #[test]
    fn prop_aliases_resolve_regardless_of_case_and_separators(
        pick in any::<prop::sample::Index>(),
        upper in prop::collection::vec(any::<bool>(), 0..40),
        sep in prop::collection::vec(0u8..6, 0..40),
    ) {
        let pairs = alias_pairs();
        let (alias, canonical) = &pairs[pick.index(pairs.len())];
        let (_, resolver) = builtin();
        let raw = mangle(alias, &upper, &sep);
        prop_assert_eq!(resolver.resolve(&raw), Some(canonical.as_str()), "raw = {:?}", raw);
    }

    #[test]
    fn prop_unregistered_strings_do_not_resolve(raw in "zq[0-9]{6,12}") {
        let (_, resolver) = builtin();
        prop_assert_eq!(resolver.resolve(&raw), None);
    }

    #[test]
    fn prop_short_inputs_only_match_exactly(raw in "[a-z]{1,3}") {
        let (_, resolver) = builtin();
        if let Some(canonical) = resolver.resolve(&raw) {
            let aliases = resolver.get_tool_aliases(canonical).unwrap();
            let normalized: Vec<String> = aliases.iter().map(|a| normalize_name(a)).collect();
            prop_assert!(normalized.contains(&raw));
        }
    }

    #[test]
    fn prop_suggestions_are_capped_and_distinct(
        words in prop::collection::vec(
            prop::sample::select(vec![
                "secret", "test", "rename", "scan", "coverage", "config", "path", "complexity",
            ]),
            1..20,
        ),
    ) {
        let (registry, _) = builtin();
        let text = words.join(" ");
        let hits = registry.suggest_tools(&text);
        prop_assert!(hits.len() <= 5);
        let names: HashSet<&str> = hits.iter().map(|h| h.descriptor.name.as_str()).collect();
        prop_assert_eq!(names.len(), hits.len());
    }
}
