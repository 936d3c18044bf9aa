//! Raw name resolution.
//!
//! Maps whatever string a caller used (canonical id, English alias, Korean
//! alias, or a near-miss typo) onto a canonical tool name. Exact matches on
//! the normalized alias table win; otherwise a bounded Levenshtein search
//! runs, and only for inputs long enough that a two-edit miss is meaningful.

use super::catalog::ToolRegistry;
use super::descriptor::ToolId;
use crate::types::ResolverConfig;
use std::collections::HashMap;

/// Largest edit distance accepted for a fuzzy match.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Normalized inputs shorter than this many chars only match exactly.
pub const MIN_FUZZY_INPUT_LEN: usize = 4;

/// Lowercase and strip whitespace, `-` and `_`.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// How a name was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy { distance: usize },
}

/// A successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub id: ToolId,
    pub canonical: &'a str,
    pub kind: MatchKind,
}

#[derive(Debug)]
struct AliasEntry {
    chars: Vec<char>,
    id: ToolId,
}

/// Alias table built from a registry. Immutable after construction.
#[derive(Debug)]
pub struct NameResolver {
    exact: HashMap<String, ToolId>,
    entries: Vec<AliasEntry>,
    canonical: Vec<String>,
    aliases: Vec<Vec<String>>,
    max_edit_distance: usize,
    min_fuzzy_input_len: usize,
}

impl NameResolver {
    pub fn new(registry: &ToolRegistry, config: &ResolverConfig) -> Self {
        let mut exact = HashMap::new();
        let mut entries = Vec::new();
        let mut canonical = Vec::with_capacity(registry.tool_count());
        let mut aliases = Vec::with_capacity(registry.tool_count());

        for (index, descriptor) in registry.iter().enumerate() {
            let id = ToolId::from_index(index);
            for alias in &descriptor.aliases {
                let normalized = normalize_name(alias);
                if normalized.is_empty() {
                    continue;
                }
                // The registry already rejects cross-tool collisions; this
                // only skips a tool's own normalized duplicates.
                if exact.insert(normalized.clone(), id).is_none() {
                    entries.push(AliasEntry {
                        chars: normalized.chars().collect(),
                        id,
                    });
                }
            }
            canonical.push(descriptor.name.clone());
            aliases.push(descriptor.aliases.clone());
        }

        Self {
            exact,
            entries,
            canonical,
            aliases,
            max_edit_distance: config.max_edit_distance,
            min_fuzzy_input_len: config.min_fuzzy_input_len,
        }
    }

    /// Resolve a raw name to its canonical name.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        self.resolve_detailed(raw).map(|r| r.canonical)
    }

    pub fn resolve_id(&self, raw: &str) -> Option<ToolId> {
        self.resolve_detailed(raw).map(|r| r.id)
    }

    /// Resolve and report how the match was made.
    ///
    /// Returns `None` for empty input, for inputs too short to fuzzy-match,
    /// when no alias is within the edit bound, and when the closest aliases
    /// belong to more than one tool.
    pub fn resolve_detailed(&self, raw: &str) -> Option<Resolution<'_>> {
        let normalized = normalize_name(raw);
        if normalized.is_empty() {
            return None;
        }

        if let Some(&id) = self.exact.get(&normalized) {
            return Some(self.resolution(id, MatchKind::Exact));
        }

        let input: Vec<char> = normalized.chars().collect();
        if input.len() < self.min_fuzzy_input_len || self.max_edit_distance == 0 {
            return None;
        }

        let mut best: Option<(usize, ToolId)> = None;
        let mut ambiguous = false;
        for entry in &self.entries {
            if entry.chars.len().abs_diff(input.len()) > self.max_edit_distance {
                continue;
            }
            let distance = edit_distance(&input, &entry.chars);
            if distance > self.max_edit_distance {
                continue;
            }
            match best {
                Some((d, _)) if distance > d => {}
                Some((d, id)) if distance == d => {
                    if id != entry.id {
                        ambiguous = true;
                    }
                }
                _ => {
                    best = Some((distance, entry.id));
                    ambiguous = false;
                }
            }
        }

        match best {
            Some((distance, id)) if !ambiguous => {
                Some(self.resolution(id, MatchKind::Fuzzy { distance }))
            }
            _ => None,
        }
    }

    fn resolution(&self, id: ToolId, kind: MatchKind) -> Resolution<'_> {
        Resolution {
            id,
            canonical: &self.canonical[id.index()],
            kind,
        }
    }

    /// Alias list of a canonical tool, canonical name first.
    pub fn get_tool_aliases(&self, canonical: &str) -> Option<&[String]> {
        self.canonical
            .iter()
            .position(|name| name == canonical)
            .map(|index| self.aliases[index].as_slice())
    }

    /// True when the name resolves, exactly or fuzzily.
    pub fn is_valid_tool_name(&self, raw: &str) -> bool {
        self.resolve_detailed(raw).is_some()
    }

    /// Number of distinct normalized aliases.
    pub fn alias_count(&self) -> usize {
        self.entries.len()
    }
}

/// Levenshtein distance over chars, two rows.
fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
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
                Frequency::High,
                ToolCategory::Security,
                "Find leaked secrets",
            )
            .aliases(["secret-scan", "비밀스캔"]),
            ToolDescriptor::new(
                "scan_sql",
                "security-scanner",
                Frequency::Medium,
                ToolCategory::Security,
                "Find SQL injection",
            ),
            ToolDescriptor::new(
                "scan_xss",
                "security-scanner",
                Frequency::Medium,
                ToolCategory::Security,
                "Find XSS",
            ),
            ToolDescriptor::new(
                "generate_tests",
                "test-generator",
                Frequency::High,
                ToolCategory::Testing,
                "Generate tests",
            )
            .aliases(["테스트생성"]),
        ])
        .unwrap()
    }

    fn resolver() -> NameResolver {
        NameResolver::new(&registry(), &ResolverConfig::default())
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Scan_Secrets"), "scansecrets");
        assert_eq!(normalize_name(" secret - scan "), "secretscan");
        assert_eq!(normalize_name("테스트 생성"), "테스트생성");
        assert_eq!(normalize_name("-_ "), "");
    }

    #[test]
    fn test_edit_distance() {
        let d = |a: &str, b: &str| {
            edit_distance(
                &a.chars().collect::<Vec<_>>(),
                &b.chars().collect::<Vec<_>>(),
            )
        };
        assert_eq!(d("kitten", "sitting"), 3);
        assert_eq!(d("", "abc"), 3);
        assert_eq!(d("abc", "abc"), 0);
        assert_eq!(d("테스트생성", "테스트생상"), 1);
    }

    #[test]
    fn test_exact_resolution_through_aliases() {
        let r = resolver();
        assert_eq!(r.resolve("scan_secrets"), Some("scan_secrets"));
        assert_eq!(r.resolve("SCAN-SECRETS"), Some("scan_secrets"));
        assert_eq!(r.resolve("secret scan"), Some("scan_secrets"));
        assert_eq!(r.resolve("비밀스캔"), Some("scan_secrets"));
        assert_eq!(r.resolve("테스트 생성"), Some("generate_tests"));
        assert_eq!(
            r.resolve_detailed("secret-scan").unwrap().kind,
            MatchKind::Exact
        );
    }

    #[test]
    fn test_fuzzy_resolution_within_bound() {
        let r = resolver();
        let res = r.resolve_detailed("scan_secrts").unwrap();
        assert_eq!(res.canonical, "scan_secrets");
        assert_eq!(res.kind, MatchKind::Fuzzy { distance: 1 });
        assert_eq!(r.resolve("generat_tsts"), Some("generate_tests"));
        assert_eq!(r.resolve("completely_different"), None);
    }

    #[test]
    fn test_short_inputs_never_fuzzy_match() {
        let r = resolver();
        // "scn" is one edit from nothing, but is under the length floor anyway.
        assert_eq!(r.resolve("scn"), None);
        assert_eq!(r.resolve("a"), None);
        assert_eq!(r.resolve(""), None);
        assert_eq!(r.resolve("  "), None);
    }

    #[test]
    fn test_ambiguous_tie_resolves_to_none() {
        let r = resolver();
        // One substitution from "scansql", two from "scanxss".
        assert_eq!(r.resolve("scanssl"), Some("scan_sql"));
        // Two substitutions from both.
        assert_eq!(r.resolve("scansxs"), None);
    }

    #[test]
    fn test_aliases_and_validity() {
        let r = resolver();
        assert_eq!(
            r.get_tool_aliases("scan_secrets").unwrap(),
            ["scan_secrets", "secret-scan", "비밀스캔"]
        );
        assert!(r.get_tool_aliases("secret-scan").is_none());
        assert!(r.is_valid_tool_name("비밀스캔"));
        assert!(!r.is_valid_tool_name("nope"));
        assert_eq!(r.alias_count(), 7);
    }

    #[test]
    fn test_config_disables_fuzzy() {
        let config = ResolverConfig {
            max_edit_distance: 0,
            ..Default::default()
        };
        let r = NameResolver::new(&registry(), &config);
        assert_eq!(r.resolve("scan_secrts"), None);
        assert_eq!(r.resolve("scan_secrets"), Some("scan_secrets"));
    }
}
