//! Keyword-overlap search over the registry.
//!
//! Relevance is the number of distinct query tokens found among a descriptor's
//! keyword tokens plus the number found among its description tokens.
//! Filters (category, frequency, server) are hard constraints, not scored.

use super::catalog::ToolRegistry;
use super::descriptor::{Frequency, ToolCategory, ToolDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on `suggest_tools` results.
pub const MAX_SUGGESTIONS: usize = 5;

/// Lowercase and split on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn distinct_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Search parameters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub category: Option<ToolCategory>,
    pub frequency: Option<Frequency>,
    pub server: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn text(query: &str) -> Self {
        Self {
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    fn admits(&self, descriptor: &ToolDescriptor) -> bool {
        self.category.map_or(true, |c| descriptor.category == c)
            && self.frequency.map_or(true, |f| descriptor.frequency == f)
            && self
                .server
                .as_deref()
                .map_or(true, |s| descriptor.server == s)
    }
}

/// A scored search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub descriptor: &'a ToolDescriptor,
    pub relevance: usize,
}

#[derive(Debug, Default)]
struct IndexedTokens {
    keywords: HashSet<String>,
    description: HashSet<String>,
}

/// Precomputed token sets, one per descriptor, in declaration order.
#[derive(Debug, Default)]
pub(crate) struct SearchIndex {
    entries: Vec<IndexedTokens>,
}

impl SearchIndex {
    pub(crate) fn build(descriptors: &[ToolDescriptor]) -> Self {
        let entries = descriptors
            .iter()
            .map(|d| IndexedTokens {
                keywords: d.keywords.iter().flat_map(|k| tokenize(k)).collect(),
                description: tokenize(&d.description).into_iter().collect(),
            })
            .collect();
        Self { entries }
    }

    fn score(&self, index: usize, tokens: &[String]) -> usize {
        let Some(entry) = self.entries.get(index) else {
            return 0;
        };
        tokens
            .iter()
            .map(|t| {
                usize::from(entry.keywords.contains(t))
                    + usize::from(entry.description.contains(t))
            })
            .sum()
    }
}

impl ToolRegistry {
    /// Search descriptors. Without a query every descriptor passing the
    /// filters is returned; with a query, zero-relevance descriptors drop out.
    ///
    /// Sort: relevance desc, then frequency (high first), then declaration order.
    pub fn search_tools(&self, query: &SearchQuery) -> Vec<SearchHit<'_>> {
        let tokens = query
            .query
            .as_deref()
            .map(distinct_tokens)
            .unwrap_or_default();
        let require_match = !tokens.is_empty();

        let mut hits: Vec<(usize, SearchHit<'_>)> = self
            .iter()
            .enumerate()
            .filter(|(_, d)| query.admits(d))
            .map(|(i, d)| {
                (
                    i,
                    SearchHit {
                        descriptor: d,
                        relevance: self.index.score(i, &tokens),
                    },
                )
            })
            .filter(|(_, hit)| !require_match || hit.relevance > 0)
            .collect();

        hits.sort_by(|(ia, a), (ib, b)| {
            b.relevance
                .cmp(&a.relevance)
                .then_with(|| a.descriptor.frequency.rank().cmp(&b.descriptor.frequency.rank()))
                .then_with(|| ia.cmp(ib))
        });

        let limit = query.limit.unwrap_or(usize::MAX);
        hits.into_iter().take(limit).map(|(_, hit)| hit).collect()
    }

    /// Suggest up to [`MAX_SUGGESTIONS`] tools for free-form context text.
    /// Repeated words in the text never yield duplicate entries.
    pub fn suggest_tools(&self, context: &str) -> Vec<SearchHit<'_>> {
        let tokens = distinct_tokens(context);
        if tokens.is_empty() {
            return Vec::new();
        }

        let query = SearchQuery {
            query: Some(tokens.join(" ")),
            ..Default::default()
        };

        let mut seen = HashSet::new();
        self.search_tools(&query)
            .into_iter()
            .filter(|hit| seen.insert(hit.descriptor.name.as_str()))
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Frequency, ToolCategory, ToolDescriptor};

    fn registry() -> ToolRegistry {
        ToolRegistry::from_descriptors(vec![
            ToolDescriptor::new(
                "scan_secrets",
                "security-scanner",
                Frequency::Medium,
                ToolCategory::Security,
                "Find leaked secrets in source files",
            )
            .keywords(["secret", "credential", "scan"]),
            ToolDescriptor::new(
                "scan_vulnerabilities",
                "security-scanner",
                Frequency::High,
                ToolCategory::Security,
                "Scan source for injection vulnerabilities",
            )
            .keywords(["vulnerability", "scan", "injection"]),
            ToolDescriptor::new(
                "generate_tests",
                "test-generator",
                Frequency::High,
                ToolCategory::Testing,
                "Generate unit tests for source files",
            )
            .keywords(["test", "unit", "generate"]),
            ToolDescriptor::new(
                "telemetry_report",
                "telemetry",
                Frequency::Low,
                ToolCategory::Telemetry,
                "Summarize usage telemetry",
            )
            .keywords(["usage", "report"])
            .deferred(),
        ])
        .unwrap()
    }

    fn names(hits: &[SearchHit<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.descriptor.name.clone()).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Scan_secrets, now!"), vec!["scan", "secrets", "now"]);
        assert_eq!(tokenize("보안 스캔"), vec!["보안", "스캔"]);
        assert!(tokenize(" -- ").is_empty());
    }

    #[test]
    fn test_no_filters_returns_everything_once() {
        let reg = registry();
        let hits = reg.search_tools(&SearchQuery::default());
        assert_eq!(hits.len(), reg.tool_count());
        let mut all = names(&hits);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), reg.tool_count());
    }

    #[test]
    fn test_relevance_then_frequency_ordering() {
        let reg = registry();
        // "scan" hits both scanners' keywords; "source" hits three descriptions.
        let hits = reg.search_tools(&SearchQuery::text("scan source"));
        assert_eq!(
            names(&hits),
            vec!["scan_vulnerabilities", "scan_secrets", "generate_tests"]
        );
        assert_eq!(hits[0].relevance, 3);
        assert_eq!(hits[1].relevance, 2);
        assert_eq!(hits[2].relevance, 1);
    }

    #[test]
    fn test_ties_broken_by_frequency() {
        let reg = registry();
        // Both match "files" once in the description; high frequency wins
        // over declaration order.
        let hits = reg.search_tools(&SearchQuery::text("files"));
        assert_eq!(names(&hits), vec!["generate_tests", "scan_secrets"]);
        assert_eq!(hits[0].relevance, hits[1].relevance);
    }

    #[test]
    fn test_filters_are_hard_constraints() {
        let reg = registry();
        let query = SearchQuery {
            query: Some("source".into()),
            category: Some(ToolCategory::Testing),
            ..Default::default()
        };
        assert_eq!(names(&reg.search_tools(&query)), vec!["generate_tests"]);

        let by_server = SearchQuery {
            server: Some("security-scanner".into()),
            ..Default::default()
        };
        assert!(reg
            .search_tools(&by_server)
            .iter()
            .all(|h| h.descriptor.server == "security-scanner"));
    }

    #[test]
    fn test_limit_truncates() {
        let reg = registry();
        let query = SearchQuery {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(reg.search_tools(&query).len(), 2);
    }

    #[test]
    fn test_repeated_query_tokens_do_not_inflate() {
        let reg = registry();
        let once = reg.search_tools(&SearchQuery::text("scan"));
        let thrice = reg.search_tools(&SearchQuery::text("scan scan scan"));
        assert_eq!(once[0].relevance, thrice[0].relevance);
    }

    #[test]
    fn test_suggest_deduplicates_and_caps() {
        let reg = registry();
        let hits = reg.suggest_tools("scan scan SCAN the source, scan for secrets and unit tests");
        assert!(hits.len() <= MAX_SUGGESTIONS);
        let mut all = names(&hits);
        let before = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), before);
        assert!(names(&hits).contains(&"scan_secrets".to_string()));
    }

    #[test]
    fn test_suggest_empty_text() {
        assert!(registry().suggest_tools("  ...  ").is_empty());
    }
}
