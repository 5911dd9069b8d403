use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use regext::extraction::{dedup_by_length, PatternExtractor};
use regext::message::{HttpMessage, Message};
use std::hint::black_box;

// Response bodies resembling what a proxy captures
fn get_test_responses() -> Vec<Vec<u8>> {
    vec![
        b"HTTP/1.1 200 OK\r\nSet-Cookie: JSESSIONID=8F3A2C91D0E4\r\n\r\n{\"user\":\"admin@example.org\"}"
            .to_vec(),
        b"HTTP/1.1 302 Found\r\nLocation: https://login.example.com/?token=abc123def456\r\n\r\n"
            .to_vec(),
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<a href=\"mailto:ops@example.com\">ops</a> id=42 id=7"
            .to_vec(),
        b"HTTP/1.1 500 Internal Server Error\r\n\r\nTrace: at com.example.Handler line 118".to_vec(),
        b"HTTP/1.1 200 OK\r\n\r\n{\"api_key\":\"AKIA0123456789ABCDEF\",\"region\":\"us-east-1\"}"
            .to_vec(),
    ]
}

// Varied-length bodies so deduplication keeps most of them
fn generate_responses(count: usize) -> Vec<HttpMessage> {
    let templates = get_test_responses();
    (0..count)
        .map(|i| {
            let mut body = templates[i % templates.len()].clone();
            body.extend(std::iter::repeat_n(b' ', i % 257));
            HttpMessage::new(body)
        })
        .collect()
}

fn bench_pattern_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_scan");

    let patterns = [
        ("whole_match", r"[\w.]+@[\w.]+\.\w+"),
        ("one_group", r"token=(\w+)"),
        ("two_groups", r#""(\w+)":"([^"]*)""#),
    ];
    let responses = generate_responses(1000);
    let total_bytes: usize = responses.iter().map(|m| m.response_len()).sum();

    for (label, source) in patterns {
        let extractor = PatternExtractor::compile(source).unwrap();
        group.throughput(Throughput::Bytes(total_bytes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &responses, |b, batch| {
            b.iter(|| {
                let result = extractor.scan(black_box(batch));
                black_box(result.matches.len());
            });
        });
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_by_length");

    for count in [100, 1000, 10000].iter() {
        let responses = generate_responses(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &responses, |b, batch| {
            b.iter(|| black_box(dedup_by_length(black_box(batch)).len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pattern_scan, bench_dedup);
criterion_main!(benches);
