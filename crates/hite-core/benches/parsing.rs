use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hite_core::model::sample_question_set;
use hite_core::parser::{parse_question_set_str, render_question_set, validate_question_set};

fn large_set_toml(n: u32) -> String {
    let mut s = String::from("[question_set]\nid = \"large\"\nname = \"Large\"\n");
    for i in 1..=n {
        s.push_str(&format!(
            "\n[[questions]]\nid = {i}\nprompt = \"Question {i}\"\nscore_type = \"commitment\"\n\
             answers = [\"a\", \"b\", \"c\", \"d\"]\ncorrect_index = {}\n",
            i % 4
        ));
    }
    s
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_question_set");

    let sample = render_question_set(&sample_question_set()).unwrap_or_default();
    let large = large_set_toml(200);

    group.bench_function("sample", |b| {
        b.iter(|| parse_question_set_str(black_box(&sample), Path::new("sample.toml")))
    });

    group.bench_function("large", |b| {
        b.iter(|| parse_question_set_str(black_box(&large), Path::new("large.toml")))
    });

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let Ok(set) = parse_question_set_str(&large_set_toml(200), Path::new("large.toml")) else {
        return;
    };
    c.bench_function("validate_large", |b| {
        b.iter(|| validate_question_set(black_box(&set)))
    });
}

criterion_group!(benches, bench_parse, bench_validate);
criterion_main!(benches);
