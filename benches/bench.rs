use std::io;

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion,
    Throughput,
};
use delim::{Parser, ParserBuilder, Reader};

fn plain_data(rows: usize) -> String {
    let mut data = String::new();
    for i in 0..rows {
        data.push_str(&format!("{};Name_{};{}\n", i, i, i * 100));
    }
    data
}

/// Rows where the middle field holds a stray delimiter and every other
/// row has a quoted first field, so the parser has to backtrack.
fn messy_data(rows: usize) -> String {
    let mut data = String::new();
    for i in 0..rows {
        if i % 2 == 0 {
            data.push_str(&format!("\"{}\";Smith; John;{}\n", i, i * 100));
        } else {
            data.push_str(&format!("{};Doe; Jane;{}\n", i, i * 100));
        }
    }
    data
}

fn plain_parser() -> Parser {
    ParserBuilder::new(3).delimiter(';').build().unwrap()
}

fn messy_parser() -> Parser {
    ParserBuilder::new(3)
        .delimiter(';')
        .quote(Some('"'))
        .allow_unquoted_delimiter(1)
        .validate(2, |s| s.bytes().all(|b| b.is_ascii_digit()))
        .build()
        .unwrap()
}

fn count_records<R: io::Read>(rdr: &mut Reader<R>) -> u64 {
    let mut count = 0;
    while let Some(rec) = rdr.read_record().unwrap() {
        black_box(rec);
        count += 1;
    }
    count
}

fn bench_read(c: &mut Criterion) {
    let cases = [
        ("plain", plain_parser(), plain_data(10_000)),
        ("messy", messy_parser(), messy_data(10_000)),
    ];
    let mut group = c.benchmark_group("read");
    for (name, parser, data) in cases.iter() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            data,
            |b, data| {
                b.iter(|| {
                    let mut rdr = Reader::from_reader(parser, data.as_bytes());
                    assert_eq!(count_records(&mut rdr), 10_000);
                })
            },
        );
    }
    group.finish();
}

fn bench_long_quoted_field(c: &mut Criterion) {
    let p = ParserBuilder::new(2)
        .delimiter(';')
        .quote(Some('"'))
        .max_field_length(usize::MAX)
        .build()
        .unwrap();
    let mut group = c.benchmark_group("long_quoted_field");
    for &len in &[1_000usize, 100_000] {
        let data = format!("\"{}\";x\n", "y".repeat(len));
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| black_box(p.parse(data, 0, true).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_read, bench_long_quoted_field);
criterion_main!(benches);
