//! The shipped tool catalog.
//!
//! One descriptor list per tool server, concatenated in a fixed order. Only
//! the `toolhub` discovery tools are implemented by this crate; every other
//! server registers its own handlers against these descriptors.

use super::descriptor::{Frequency, ToolCategory, ToolDescriptor, ToolExample};
use crate::schema::{InputSchema, PropertySchema};
use serde_json::json;

pub const SECURITY_SCANNER: &str = "security-scanner";
pub const TEST_GENERATOR: &str = "test-generator";
pub const CODE_GENERATOR: &str = "code-generator";
pub const REFACTOR_ASSISTANT: &str = "refactor-assistant";
pub const CODE_ANALYZER: &str = "code-analyzer";
pub const HEALTH_DIAGNOSTICS: &str = "health-diagnostics";
pub const TELEMETRY: &str = "telemetry";
pub const CONFIG_NORMALIZER: &str = "config-normalizer";
pub const PATH_SANITIZER: &str = "path-sanitizer";
/// Tools served by the core itself.
pub const TOOLHUB: &str = "toolhub";

const CATEGORY_NAMES: &[&str] = &[
    "security",
    "testing",
    "generation",
    "refactoring",
    "analysis",
    "diagnostics",
    "telemetry",
    "configuration",
    "discovery",
];

const FREQUENCY_NAMES: &[&str] = &["high", "medium", "low"];

fn path_arg() -> PropertySchema {
    PropertySchema::string("File or directory to operate on").with_length(Some(1), Some(4096))
}

fn severity_arg() -> PropertySchema {
    PropertySchema::one_of("Minimum severity to report", &["low", "medium", "high", "critical"])
        .with_default(json!("medium"))
}

fn non_empty(description: &str) -> PropertySchema {
    PropertySchema::string(description).with_length(Some(1), None)
}

fn identifier_arg(description: &str) -> PropertySchema {
    PropertySchema::string(description).with_pattern("^[A-Za-z_][A-Za-z0-9_]*$")
}

/// Every builtin descriptor, in declaration order.
pub fn descriptors() -> Vec<ToolDescriptor> {
    let mut all = Vec::new();
    all.extend(security_scanner());
    all.extend(test_generator());
    all.extend(code_generator());
    all.extend(refactor_assistant());
    all.extend(code_analyzer());
    all.extend(health_diagnostics());
    all.extend(telemetry());
    all.extend(config_normalizer());
    all.extend(path_sanitizer());
    all.extend(discovery());
    all
}

fn security_scanner() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "scan_secrets",
            SECURITY_SCANNER,
            Frequency::High,
            ToolCategory::Security,
            "Scan source files for hardcoded secrets, API keys and credentials",
        )
        .keywords(["secret", "credential", "key", "token", "password", "leak"])
        .aliases(["secret-scan", "find-secrets", "시크릿스캔", "비밀키검사"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .property("severity", severity_arg())
                .property(
                    "exclude",
                    PropertySchema::array("Glob patterns to skip", PropertySchema::string("Glob"))
                        .with_item_count(None, Some(64)),
                ),
        )
        .example(ToolExample::new(
            "scan repository",
            "Scan the repository root for leaked credentials",
            json!({"path": ".", "severity": "high"}),
            json!({"findings": [{"file": "config/dev.env", "line": 3, "kind": "aws_access_key"}]}),
        )),
        ToolDescriptor::new(
            "scan_vulnerabilities",
            SECURITY_SCANNER,
            Frequency::High,
            ToolCategory::Security,
            "Scan code for injection, XSS and other common vulnerability patterns",
        )
        .keywords(["vulnerability", "security", "injection", "xss", "owasp", "scan"])
        .aliases(["vuln-scan", "security-scan", "보안스캔", "취약점스캔"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .property("severity", severity_arg())
                .property(
                    "rules",
                    PropertySchema::array("Rule ids to run", PropertySchema::string("Rule id")),
                ),
        ),
        ToolDescriptor::new(
            "scan_dependencies",
            SECURITY_SCANNER,
            Frequency::Medium,
            ToolCategory::Security,
            "Check declared dependencies against known advisories",
        )
        .keywords(["dependency", "advisory", "cve", "package", "audit"])
        .aliases(["dep-scan", "audit-deps", "의존성스캔"])
        .schema(InputSchema::strict().required_property("manifest", path_arg())),
        ToolDescriptor::new(
            "audit_permissions",
            SECURITY_SCANNER,
            Frequency::Low,
            ToolCategory::Security,
            "Report files and directories with overly broad permissions",
        )
        .keywords(["permission", "chmod", "audit", "access"])
        .aliases(["permission-audit", "권한감사"])
        .schema(InputSchema::strict().required_property("path", path_arg()))
        .deferred(),
    ]
}

fn test_generator() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "generate_tests",
            TEST_GENERATOR,
            Frequency::High,
            ToolCategory::Testing,
            "Generate unit tests for the functions in a source file",
        )
        .keywords(["test", "unit", "generate", "spec", "assert"])
        .aliases(["test-gen", "write-tests", "테스트생성"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .property(
                    "framework",
                    PropertySchema::one_of(
                        "Test framework",
                        &["auto", "jest", "vitest", "pytest", "cargo"],
                    )
                    .with_default(json!("auto")),
                )
                .property(
                    "max_cases",
                    PropertySchema::integer("Upper bound on generated cases per function")
                        .with_range(Some(1.0), Some(50.0)),
                ),
        )
        .example(ToolExample::new(
            "tests for parser",
            "Generate tests for a parser module with vitest",
            json!({"path": "src/parser.ts", "framework": "vitest", "max_cases": 5}),
            json!({"file": "src/parser.test.ts", "cases": 5}),
        )),
        ToolDescriptor::new(
            "generate_test_fixtures",
            TEST_GENERATOR,
            Frequency::Medium,
            ToolCategory::Testing,
            "Generate fixture data matching a type or schema definition",
        )
        .keywords(["fixture", "mock", "data", "test"])
        .aliases(["fixtures", "픽스처생성"])
        .schema(
            InputSchema::strict()
                .required_property("type_name", identifier_arg("Type to build fixtures for"))
                .property(
                    "count",
                    PropertySchema::integer("Number of fixtures")
                        .with_range(Some(1.0), Some(100.0)),
                ),
        ),
        ToolDescriptor::new(
            "measure_coverage",
            TEST_GENERATOR,
            Frequency::Medium,
            ToolCategory::Testing,
            "Estimate which functions lack test coverage",
        )
        .keywords(["coverage", "untested", "test", "gap"])
        .aliases(["coverage", "커버리지측정"])
        .schema(InputSchema::strict().required_property("path", path_arg())),
    ]
}

fn code_generator() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "generate_component",
            CODE_GENERATOR,
            Frequency::Medium,
            ToolCategory::Generation,
            "Generate a UI component skeleton with props and styles",
        )
        .keywords(["component", "ui", "react", "vue", "generate", "scaffold"])
        .aliases(["component-gen", "컴포넌트생성"])
        .schema(
            InputSchema::strict()
                .required_property(
                    "name",
                    PropertySchema::string("Component name").with_pattern("^[A-Z][A-Za-z0-9]*$"),
                )
                .property(
                    "framework",
                    PropertySchema::one_of("Target framework", &["react", "vue", "svelte"]),
                )
                .property(
                    "props",
                    PropertySchema::array(
                        "Declared props",
                        PropertySchema::object("Prop")
                            .with_property("name", identifier_arg("Prop name"), true)
                            .with_property("type", PropertySchema::string("Prop type"), true)
                            .closed(),
                    ),
                ),
        ),
        ToolDescriptor::new(
            "generate_api_client",
            CODE_GENERATOR,
            Frequency::Low,
            ToolCategory::Generation,
            "Generate a typed HTTP client from an OpenAPI document",
        )
        .keywords(["api", "client", "openapi", "http", "generate"])
        .aliases(["api-client", "클라이언트생성"])
        .schema(
            InputSchema::strict()
                .required_property("spec_path", path_arg())
                .property(
                    "language",
                    PropertySchema::one_of("Output language", &["typescript", "python", "rust"]),
                ),
        ),
        ToolDescriptor::new(
            "scaffold_project",
            CODE_GENERATOR,
            Frequency::Low,
            ToolCategory::Generation,
            "Create a new project layout from a template",
        )
        .keywords(["scaffold", "template", "project", "bootstrap"])
        .aliases(["scaffold", "new-project", "프로젝트생성"])
        .schema(
            InputSchema::strict()
                .required_property("template", PropertySchema::string("Template name"))
                .required_property("destination", path_arg()),
        )
        .deferred(),
    ]
}

fn refactor_assistant() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "rename_symbol",
            REFACTOR_ASSISTANT,
            Frequency::High,
            ToolCategory::Refactoring,
            "Rename a symbol and update every reference to it",
        )
        .keywords(["rename", "symbol", "refactor", "identifier"])
        .aliases(["rename", "이름변경"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .required_property("from", identifier_arg("Current name"))
                .required_property("to", identifier_arg("New name")),
        ),
        ToolDescriptor::new(
            "extract_function",
            REFACTOR_ASSISTANT,
            Frequency::Medium,
            ToolCategory::Refactoring,
            "Extract a line range into a new function",
        )
        .keywords(["extract", "function", "method", "refactor"])
        .aliases(["extract-method", "함수추출"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .required_property(
                    "start_line",
                    PropertySchema::integer("First line").with_range(Some(1.0), None),
                )
                .required_property(
                    "end_line",
                    PropertySchema::integer("Last line").with_range(Some(1.0), None),
                )
                .required_property("name", identifier_arg("New function name")),
        ),
        ToolDescriptor::new(
            "inline_variable",
            REFACTOR_ASSISTANT,
            Frequency::Low,
            ToolCategory::Refactoring,
            "Replace a variable with its initializer at every use",
        )
        .keywords(["inline", "variable", "refactor"])
        .aliases(["inline", "변수인라인"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .required_property("name", identifier_arg("Variable name")),
        ),
        ToolDescriptor::new(
            "organize_imports",
            REFACTOR_ASSISTANT,
            Frequency::Medium,
            ToolCategory::Refactoring,
            "Sort, group and deduplicate import statements",
        )
        .keywords(["import", "sort", "organize", "cleanup"])
        .aliases(["sort-imports", "임포트정리"])
        .schema(InputSchema::strict().required_property("path", path_arg())),
    ]
}

fn code_analyzer() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "analyze_complexity",
            CODE_ANALYZER,
            Frequency::High,
            ToolCategory::Analysis,
            "Compute cyclomatic and cognitive complexity per function",
        )
        .keywords(["complexity", "cyclomatic", "cognitive", "metrics", "analyze"])
        .aliases(["complexity", "복잡도분석"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .property(
                    "threshold",
                    PropertySchema::integer("Report functions above this score")
                        .with_range(Some(1.0), Some(100.0))
                        .with_default(json!(10)),
                ),
        )
        .example(ToolExample::new(
            "complex functions",
            "List functions whose complexity exceeds fifteen",
            json!({"path": "src", "threshold": 15}),
            json!({"functions": [{"name": "parse_expr", "cyclomatic": 22}]}),
        )),
        ToolDescriptor::new(
            "find_dead_code",
            CODE_ANALYZER,
            Frequency::Medium,
            ToolCategory::Analysis,
            "Find unused functions, exports and variables",
        )
        .keywords(["dead", "unused", "unreachable", "analyze"])
        .aliases(["dead-code", "죽은코드찾기"])
        .schema(InputSchema::strict().required_property("path", path_arg())),
        ToolDescriptor::new(
            "detect_duplicates",
            CODE_ANALYZER,
            Frequency::Medium,
            ToolCategory::Analysis,
            "Detect duplicated code blocks across files",
        )
        .keywords(["duplicate", "clone", "copy", "similarity"])
        .aliases(["duplicates", "find-clones", "중복탐지"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .property(
                    "min_lines",
                    PropertySchema::integer("Smallest block to report").with_range(Some(2.0), None),
                ),
        ),
        ToolDescriptor::new(
            "map_dependencies",
            CODE_ANALYZER,
            Frequency::Low,
            ToolCategory::Analysis,
            "Build the module dependency graph and report cycles",
        )
        .keywords(["dependency", "graph", "module", "cycle", "import"])
        .aliases(["dependency-graph", "의존성맵"])
        .schema(InputSchema::strict().required_property("path", path_arg())),
    ]
}

fn health_diagnostics() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "check_server_health",
            HEALTH_DIAGNOSTICS,
            Frequency::Medium,
            ToolCategory::Diagnostics,
            "Report the status of every registered tool server",
        )
        .keywords(["health", "status", "server", "diagnostics"])
        .aliases(["health-check", "서버상태"]),
        ToolDescriptor::new(
            "diagnose_environment",
            HEALTH_DIAGNOSTICS,
            Frequency::Low,
            ToolCategory::Diagnostics,
            "Inspect the runtime environment, IDE and locale",
        )
        .keywords(["environment", "ide", "locale", "runtime", "diagnostics"])
        .aliases(["env-doctor", "환경진단"]),
    ]
}

fn telemetry() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "telemetry_report",
            TELEMETRY,
            Frequency::Low,
            ToolCategory::Telemetry,
            "Summarize tool usage counts and error rates",
        )
        .keywords(["usage", "report", "telemetry", "statistics"])
        .aliases(["usage-report", "사용통계"])
        .schema(
            InputSchema::strict().property(
                "since",
                PropertySchema::string("ISO-8601 start of the reporting window"),
            ),
        )
        .deferred(),
        ToolDescriptor::new(
            "record_usage_event",
            TELEMETRY,
            Frequency::Low,
            ToolCategory::Telemetry,
            "Record a custom usage event",
        )
        .keywords(["event", "usage", "telemetry", "track"])
        .aliases(["track-usage", "사용기록"])
        .schema(
            InputSchema::strict()
                .required_property(
                    "event",
                    PropertySchema::string("Event name").with_length(Some(1), Some(128)),
                )
                .property("properties", PropertySchema::object("Event attributes")),
        )
        .deferred(),
    ]
}

fn config_normalizer() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "normalize_config",
            CONFIG_NORMALIZER,
            Frequency::Medium,
            ToolCategory::Configuration,
            "Normalize configuration files to a canonical key order and format",
        )
        .keywords(["config", "format", "normalize", "json", "yaml"])
        .aliases(["format-config", "설정정규화"])
        .schema(InputSchema::strict().required_property("path", path_arg())),
        ToolDescriptor::new(
            "validate_config",
            CONFIG_NORMALIZER,
            Frequency::Medium,
            ToolCategory::Configuration,
            "Validate configuration files against their schema",
        )
        .keywords(["config", "validate", "schema", "lint"])
        .aliases(["check-config", "설정검증"])
        .schema(
            InputSchema::strict()
                .required_property("path", path_arg())
                .property("schema_path", path_arg()),
        ),
    ]
}

fn path_sanitizer() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::new(
        "sanitize_path",
        PATH_SANITIZER,
        Frequency::Medium,
        ToolCategory::Security,
        "Normalize a path and reject traversal outside the workspace",
    )
    .keywords(["path", "traversal", "sanitize", "security"])
    .aliases(["clean-path", "경로정리"])
    .schema(InputSchema::strict().required_property("path", path_arg()))]
}

fn discovery() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "search_tools",
            TOOLHUB,
            Frequency::High,
            ToolCategory::Discovery,
            "Search the tool catalog by keyword, category, frequency or server",
        )
        .keywords(["search", "find", "tool", "catalog", "discover"])
        .aliases(["find-tools", "tool-search", "도구검색"])
        .schema(
            InputSchema::strict()
                .property("query", PropertySchema::string("Free-text query"))
                .property("category", PropertySchema::one_of("Category filter", CATEGORY_NAMES))
                .property("frequency", PropertySchema::one_of("Frequency filter", FREQUENCY_NAMES))
                .property("server", PropertySchema::string("Owning server filter"))
                .property(
                    "limit",
                    PropertySchema::integer("Maximum results").with_range(Some(1.0), Some(100.0)),
                ),
        )
        .example(ToolExample::new(
            "find scanners",
            "Search the catalog for security scanning tools",
            json!({"query": "scan secrets", "category": "security", "limit": 3}),
            json!({"tools": [{"name": "scan_secrets", "relevance": 3}]}),
        )),
        ToolDescriptor::new(
            "suggest_tools",
            TOOLHUB,
            Frequency::Medium,
            ToolCategory::Discovery,
            "Suggest tools relevant to a free-form task description",
        )
        .keywords(["suggest", "recommend", "tool", "task"])
        .aliases(["recommend-tools", "도구추천"])
        .schema(
            InputSchema::strict()
                .required_property("context", non_empty("Task description")),
        ),
        ToolDescriptor::new(
            "resolve_tool_name",
            TOOLHUB,
            Frequency::Medium,
            ToolCategory::Discovery,
            "Resolve an alias, Korean name or misspelling to the canonical tool name",
        )
        .keywords(["resolve", "alias", "name", "tool"])
        .aliases(["resolve-name", "도구이름해석"])
        .schema(
            InputSchema::strict()
                .required_property("name", non_empty("Raw tool name")),
        )
        .example(ToolExample::new(
            "korean alias",
            "Resolve a Korean alias to its canonical name",
            json!({"name": "보안스캔"}),
            json!({"input": "보안스캔", "canonical": "scan_vulnerabilities", "match": "exact"}),
        )),
        ToolDescriptor::new(
            "get_tool_aliases",
            TOOLHUB,
            Frequency::Low,
            ToolCategory::Discovery,
            "List every alias of a tool",
        )
        .keywords(["alias", "name", "tool"])
        .aliases(["aliases", "도구별칭"])
        .schema(
            InputSchema::strict()
                .required_property("name", non_empty("Tool name or alias")),
        ),
        ToolDescriptor::new(
            "validate_tool_arguments",
            TOOLHUB,
            Frequency::Low,
            ToolCategory::Discovery,
            "Check an argument object against a tool's input schema without calling it",
        )
        .keywords(["validate", "arguments", "schema", "tool"])
        .aliases(["check-arguments", "인자검증"])
        .schema(
            InputSchema::strict()
                .required_property("name", non_empty("Tool name or alias"))
                .required_property("arguments", PropertySchema::object("Arguments to check")),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::resolver::normalize_name;
    use crate::tools::ToolRegistry;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_invariants_hold() {
        let registry = ToolRegistry::builtin().unwrap();
        assert_eq!(registry.tool_count(), descriptors().len());
        for descriptor in registry.iter() {
            assert_eq!(descriptor.aliases[0], descriptor.name);
            assert!(!descriptor.keywords.is_empty(), "{}", descriptor.name);
            if descriptor.defer_loading {
                assert_eq!(descriptor.frequency, Frequency::Low);
            }
        }
    }

    #[test]
    fn test_every_tool_has_a_korean_alias() {
        for descriptor in descriptors() {
            assert!(
                descriptor
                    .aliases
                    .iter()
                    .any(|a| a.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))),
                "{} has no Korean alias",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_normalized_aliases_are_unique() {
        let mut seen = HashSet::new();
        for descriptor in descriptors() {
            let own: HashSet<String> =
                descriptor.aliases.iter().map(|a| normalize_name(a)).collect();
            for alias in own {
                assert!(seen.insert(alias.clone()), "alias {alias} reused");
            }
        }
    }

    #[test]
    fn test_servers_in_declaration_order() {
        let registry = ToolRegistry::builtin().unwrap();
        assert_eq!(
            registry.servers(),
            vec![
                SECURITY_SCANNER,
                TEST_GENERATOR,
                CODE_GENERATOR,
                REFACTOR_ASSISTANT,
                CODE_ANALYZER,
                HEALTH_DIAGNOSTICS,
                TELEMETRY,
                CONFIG_NORMALIZER,
                PATH_SANITIZER,
                TOOLHUB,
            ]
        );
    }

    #[test]
    fn test_immediate_tier() {
        let registry = ToolRegistry::builtin().unwrap();
        let names: Vec<&str> = registry.immediate_tools().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "scan_secrets",
                "scan_vulnerabilities",
                "generate_tests",
                "rename_symbol",
                "analyze_complexity",
                "search_tools",
            ]
        );
    }
}
