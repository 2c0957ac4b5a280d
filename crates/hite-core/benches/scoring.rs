use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hite_core::engine::{AssessmentEngine, EngineConfig, Step};
use hite_core::model::{Aggregate, AnswerRecord, Category, Question};
use hite_core::scoring::{scaled_score, AssessmentResult};
use hite_core::store::MemoryStore;

fn make_questions(n: u32) -> Vec<Question> {
    (1..=n)
        .map(|id| {
            let category = Category::KNOWN[(id % 4) as usize].clone();
            Question::choice(id, format!("Question {id}"), category, ["a", "b", "c", "d", "e"])
                .with_correct((id % 5) as usize)
        })
        .collect()
}

fn make_log(questions: &[Question]) -> Vec<AnswerRecord> {
    questions
        .iter()
        .map(|q| AnswerRecord {
            question_id: q.id,
            category: q.category.clone(),
            points: q.id % 5,
            answer: Some("a".into()),
            gradable: true,
            is_correct: Some(q.id % 3 != 0),
        })
        .collect()
}

fn bench_scaled_score(c: &mut Criterion) {
    c.bench_function("scaled_score", |b| {
        b.iter(|| scaled_score(black_box(1234), black_box(4000)))
    });
}

fn bench_result_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("result_compute");

    for n in [10u32, 100, 1000] {
        let questions = make_questions(n);
        let log = make_log(&questions);
        group.bench_function(format!("questions={n}"), |b| {
            b.iter(|| {
                let aggregate =
                    Aggregate::from_records(Aggregate::seeded_for(&questions), black_box(&log));
                AssessmentResult::compute(black_box(&questions), &aggregate, black_box(&log))
            })
        });
    }

    group.finish();
}

fn bench_full_session(c: &mut Criterion) {
    let questions = make_questions(50);

    c.bench_function("session_50_questions", |b| {
        b.iter(|| {
            let mut engine = AssessmentEngine::start(
                Arc::new(MemoryStore::new()),
                EngineConfig::default(),
                questions.clone(),
            );
            loop {
                match engine.select_choice(0) {
                    Ok(Step::Revealing { pending, .. }) => {
                        if let Ok(Some(Step::Completed(result))) = engine.run_scheduled(pending.ticket)
                        {
                            break result;
                        }
                    }
                    _ => unreachable!("every question is a choice question"),
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_scaled_score,
    bench_result_compute,
    bench_full_session
);
criterion_main!(benches);
