//! Benchmarks for capture parsing and graph building

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use traffic_graph::{LogLine, build_graph};

/// Synthetic capture with `hosts` hosts talking in a ring plus random-ish chords
fn synthetic_capture(lines: usize, hosts: usize) -> Vec<String> {
    (0..lines)
        .map(|i| {
            let a = i % hosts;
            let b = (i * 7 + 3) % hosts;
            format!(
                "12:00:{:02}.{:06} IP 10.{}.{}.{}.{} > 10.{}.{}.{}.443: tcp {}",
                i % 60,
                i % 1_000_000,
                a / 65536 % 256,
                a / 256 % 256,
                a % 256,
                1024 + i % 60000,
                b / 65536 % 256,
                b / 256 % 256,
                b % 256,
                i % 1500
            )
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let capture = synthetic_capture(10_000, 500);

    c.bench_function("parse_10k_lines", |b| {
        b.iter(|| {
            for line in &capture {
                black_box(LogLine::parse(line));
            }
        })
    });
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_graph");

    for hosts in [100, 1_000, 10_000] {
        let capture = synthetic_capture(50_000, hosts);
        group.bench_with_input(BenchmarkId::from_parameter(hosts), &capture, |b, capture| {
            b.iter(|| black_box(build_graph(capture)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_build);
criterion_main!(benches);
