use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gradebook_core::question::{Question, QuestionKind};
use gradebook_core::statistics::{compute_test_statistics, rank_students};
use gradebook_core::{Attempt, AttemptStatus, Student};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn make_attempts(count: u32) -> Vec<Attempt> {
    let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    (1..=count)
        .map(|id| {
            let mut attempt = Attempt::new(id, id % 50 + 1, id % 4 + 1, start);
            attempt.status = AttemptStatus::Evaluated;
            attempt.finished_at = Some(start + Duration::minutes(i64::from(id % 45)));
            attempt.percentage = f64::from(id % 101);
            attempt.is_passed = attempt.percentage >= 60.0;
            attempt
        })
        .collect()
}

fn bench_check_answer(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_answer");

    let single = Question::new(
        1,
        "2 + 2 * 2 = ?",
        QuestionKind::SingleChoice,
        strings(&["6", "8", "10"]),
        strings(&["6"]),
        1.0,
    );
    let answer = strings(&["6"]);
    group.bench_function("single_choice", |b| {
        b.iter(|| single.check_answer(black_box(&answer)))
    });

    let multiple = Question::new(
        2,
        "Which are prime?",
        QuestionKind::MultipleChoice,
        strings(&["2", "4", "7", "9", "11", "13", "15"]),
        strings(&["2", "7", "11", "13"]),
        1.0,
    );
    let answer = strings(&["13", "11", "7", "2"]);
    group.bench_function("multiple_choice", |b| {
        b.iter(|| multiple.check_answer(black_box(&answer)))
    });

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let attempts = make_attempts(10_000);
    let students: Vec<Student> = (1..=50)
        .map(|id| Student::new(id, format!("Student {id}"), "G1", ""))
        .collect();

    group.bench_function("test_statistics_10k", |b| {
        b.iter(|| compute_test_statistics(black_box(1), attempts.iter()))
    });

    group.bench_function("rank_students_10k", |b| {
        b.iter(|| {
            rank_students(
                students.iter(),
                |s| attempts.iter().filter(|a| a.student_id == s.id).collect(),
                black_box(5),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_check_answer, bench_statistics);
criterion_main!(benches);
