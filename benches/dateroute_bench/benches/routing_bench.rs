//! Routing benchmarks
//!
//! Measures version parsing, resolution, pattern matching and full routing
//! across bundles of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dateroute_core::{
    dispatch, PathPattern, Route, RouteTableSet, Scope, Version, VersionBundle, VersionedApi,
};
use http::{HeaderMap, HeaderValue, Method};
use std::sync::Arc;

async fn ok() -> &'static str {
    "ok"
}

/// One version per month starting in 2020, each adding a route
fn build_tables(versions: usize) -> RouteTableSet {
    let dates: Vec<Version> = (0..versions)
        .map(|i| {
            Version::from_ymd(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1)
                .expect("valid bench date")
        })
        .collect();
    let bundle = Arc::new(VersionBundle::new(dates.clone()).expect("non-empty bundle"));

    let mut builder = RouteTableSet::builder(bundle);
    for (i, version) in dates.into_iter().enumerate() {
        builder = builder.add_at(
            version,
            Route::get(&format!("/v1/resource{i}/{{id:int}}"), ok).name(format!("resource{i}")),
        );
    }
    builder
        .add_at(
            Version::from_ymd(2020, 1, 1).expect("valid bench date"),
            Route::get("/v1/users/{username}/{page:int}", ok),
        )
        .build()
        .expect("bench tables build")
}

fn headers(version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-version", HeaderValue::from_str(version).expect("ascii"));
    headers
}

fn bench_version_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_parse");

    group.bench_function("valid", |b| {
        b.iter(|| black_box("2022-02-11").parse::<Version>())
    });

    group.bench_function("malformed", |b| {
        b.iter(|| black_box("2022-40-11").parse::<Version>())
    });

    group.finish();
}

fn bench_pattern_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_match");

    let simple = PathPattern::parse("/v1/users").expect("pattern");
    let params = PathPattern::parse("/v1/users/{username}/{page:int}").expect("pattern");
    let tail = PathPattern::parse("/files/{path:path}/{name}").expect("pattern");

    group.bench_function("static", |b| b.iter(|| simple.matches(black_box("/v1/users"))));
    group.bench_function("two_params", |b| {
        b.iter(|| params.matches(black_box("/v1/users/tom/83")))
    });
    group.bench_function("path_convertor", |b| {
        b.iter(|| tail.matches(black_box("/files/a/b/c/d/readme")))
    });

    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");

    for versions in [4usize, 16, 64] {
        let api = VersionedApi::new(build_tables(versions));
        let table = api
            .tables()
            .get(api.bundle().latest())
            .expect("latest table")
            .clone();
        let scope = Scope::http(Method::GET, "/v1/users/tom/83");
        let request_headers = headers("2030-06-15");

        group.bench_with_input(BenchmarkId::new("resolve", versions), &versions, |b, _| {
            b.iter(|| api.resolve(black_box(&request_headers)))
        });

        group.bench_with_input(BenchmarkId::new("dispatch", versions), &versions, |b, _| {
            b.iter(|| dispatch(&table, black_box(&scope)).is_found())
        });

        group.bench_with_input(BenchmarkId::new("route", versions), &versions, |b, _| {
            b.iter(|| api.matches(black_box(&scope), black_box(&request_headers)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_version_parse, bench_pattern_match, bench_routing);
criterion_main!(benches);
