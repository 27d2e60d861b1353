//! Benchmarks for tokenizing and parsing `.proto` sources.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use protoschema::parser::lexer;
use protoschema::{parse, parse_tokens, ParseOptions};

// ============================================================================
// Inputs
// ============================================================================

fn testdata(name: &str) -> String {
    let path = format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
}

/// A flat file with `messages` messages of eight fields each.
fn generated_schema(messages: usize) -> String {
    let mut src = String::from("syntax = \"proto3\";\npackage bench;\n\n");
    for i in 0..messages {
        src.push_str(&format!("// Message number {}.\nmessage M{} {{\n", i, i));
        for tag in 1..=8 {
            let ty = if tag % 2 == 0 { "string" } else { "int64" };
            src.push_str(&format!("  {} f{} = {};\n", ty, tag, tag));
        }
        src.push_str("}\n\n");
    }
    src
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for name in ["addressbook.proto", "service.proto"] {
        let src = testdata(name);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("fixture", name), &src, |b, src| {
            b.iter(|| lexer::tokenize(black_box(src)).unwrap())
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for name in ["addressbook.proto", "extensions.proto", "service.proto"] {
        let src = testdata(name);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("fixture", name), &src, |b, src| {
            b.iter(|| parse(black_box(src)).unwrap())
        });
    }

    for messages in [10, 100, 1000] {
        let src = generated_schema(messages);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("generated", messages), &src, |b, src| {
            b.iter(|| parse(black_box(src)).unwrap())
        });
    }

    group.finish();
}

fn bench_parse_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_tokens");

    let tokens = lexer::tokenize(&generated_schema(100)).unwrap();
    let options = ParseOptions::default();
    group.throughput(Throughput::Elements(tokens.len() as u64));
    group.bench_function("generated_100", |b| {
        b.iter(|| parse_tokens(black_box(tokens.iter().map(String::as_str)), &options).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_parse_tokens);
criterion_main!(benches);
