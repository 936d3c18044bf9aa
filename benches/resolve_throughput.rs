//! Name resolution and catalog search throughput.
//!
//! Measures exact, alias, fuzzy and miss resolution against the builtin
//! catalog, plus keyword search, using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use toolhub_core::tools::{NameResolver, SearchQuery, ToolRegistry};
use toolhub_core::types::ResolverConfig;

fn bench_resolve(c: &mut Criterion) {
    let registry = ToolRegistry::builtin().unwrap();
    let resolver = NameResolver::new(&registry, &ResolverConfig::default());
    let inputs: &[(&str, &str)] = &[
        ("canonical", "scan_secrets"),
        ("alias", "secret-scan"),
        ("korean", "시크릿스캔"),
        ("fuzzy", "scan_secrts"),
        ("miss", "completely_unknown_tool"),
    ];

    let mut group = c.benchmark_group("resolve");
    for &(label, raw) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(label), raw, |b, raw| {
            b.iter(|| resolver.resolve(black_box(raw)))
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let registry = ToolRegistry::builtin().unwrap();
    let queries: &[&str] = &["secret", "generate unit tests", "rename symbol refactor"];

    let mut group = c.benchmark_group("search_tools");
    for &query in queries {
        let q = SearchQuery::text(query);
        group.bench_with_input(BenchmarkId::from_parameter(query), &q, |b, q| {
            b.iter(|| registry.search_tools(black_box(q)).len())
        });
    }
    group.finish();

    c.bench_function("suggest_tools", |b| {
        b.iter(|| {
            registry
                .suggest_tools(black_box("scan the repo for leaked secrets then write tests"))
                .len()
        })
    });
}

criterion_group!(benches, bench_resolve, bench_search);
criterion_main!(benches);
