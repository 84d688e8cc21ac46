use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quarry_syntax::{parse_java, parse_java_diet, Parser, ParserOptions};

fn well_formed_source() -> String {
    let mut out = String::from("package bench;\n\npublic class Large {\n");
    for i in 0..500u32 {
        out.push_str(&format!(
            "  public int method{0}(int x) {{ int y = x + {0}; return y * 2; }}\n",
            i
        ));
    }
    out.push_str("}\n");
    out
}

fn nesting_stress_source() -> String {
    (0..1000u32).map(|i| format!("class AClass{i} {{ ")).collect()
}

fn unterminated_members_source() -> String {
    let mut out = String::from("public class Broken {\n");
    for i in 0..500u32 {
        out.push_str(&format!("  void method{i}() {{\n  public int field{i};\n"));
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let well_formed = well_formed_source();
    let nesting = nesting_stress_source();
    let unterminated = unterminated_members_source();

    let mut group = c.benchmark_group("parse_recovery");
    group.measurement_time(Duration::from_secs(2));
    group.warm_up_time(Duration::from_secs(1));
    group.sample_size(20);

    for (id, src) in [
        ("well_formed", well_formed.as_str()),
        ("nesting_stress", nesting.as_str()),
        ("unterminated_members", unterminated.as_str()),
    ] {
        group.bench_with_input(BenchmarkId::new("diet", id), src, |b, src| {
            b.iter(|| black_box(parse_java_diet(black_box(src))))
        });
        group.bench_with_input(BenchmarkId::new("full", id), src, |b, src| {
            b.iter(|| black_box(parse_java(black_box(src))))
        });
    }

    group.bench_with_input(
        BenchmarkId::new("statements_recovery", "unterminated_members"),
        unterminated.as_str(),
        |b, src| {
            let options = ParserOptions {
                statements_recovery: true,
                ..ParserOptions::default()
            };
            b.iter(|| black_box(Parser::new(black_box(src), options).parse()))
        },
    );

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
