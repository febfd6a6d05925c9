//! Performance benchmarks for the Activity Reporting Engine.
//!
//! This benchmark suite covers the hot paths of event handling:
//! - Approving a filled period on an in-memory person
//! - Resolving the newest correction of a long chain
//! - Persisting a person through the repository
//! - Dispatching events over HTTP, singly and in batches
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use reporting_engine::api::{AppState, create_router};
use reporting_engine::config::ConfigLoader;
use reporting_engine::events::{DomainEvent, start_of_day};
use reporting_engine::models::{ActivityType, Actor, FinalizeStrategy};
use reporting_engine::person::Person;
use reporting_engine::store::{InMemoryRepository, PersonRepository};

use axum::{body::Body, http::Request};
use tower::ServiceExt;

const IDENT: &str = "12345678901";

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

/// Creates a test state with loaded configuration.
fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    AppState::new(config, Arc::new(InMemoryRepository::new()))
}

/// Creates a person whose first period has a Work activity on every weekday.
fn create_filled_person() -> (Person, Uuid) {
    let strategy = FinalizeStrategy::default();
    let mut person = Person::new(IDENT);
    let period_id = person
        .handle(
            DomainEvent::DecisionGranted {
                case_id: "case-bench".to_string(),
                effective_date: date(1, 1),
            },
            &strategy,
        )
        .unwrap()[0]
        .period_id()
        .unwrap();

    for offset in [1, 2, 3, 4, 7, 8, 9, 10, 11] {
        person
            .handle(
                DomainEvent::AddActivity {
                    period_id,
                    date: date(1, 1) + Duration::days(offset),
                    hours: Decimal::new(75, 1),
                    activity_type: ActivityType::Work,
                },
                &strategy,
            )
            .unwrap();
    }
    (person, period_id)
}

/// Creates a person whose first period has been submitted and corrected
/// `depth` times.
fn create_corrected_person(depth: usize) -> (Person, Uuid) {
    let strategy = FinalizeStrategy::default();
    let (mut person, period_id) = create_filled_person();
    let approve = || DomainEvent::Approve {
        period_id,
        actor: Actor::CaseWorker {
            id: "Z999".to_string(),
        },
        reference_date: date(1, 13),
        at: start_of_day(date(1, 13)),
        justification: None,
    };
    let submit = || DomainEvent::ManualSubmit {
        period_id,
        at: start_of_day(date(1, 14)),
    };

    person.handle(approve(), &strategy).unwrap();
    person.handle(submit(), &strategy).unwrap();
    for round in 0..depth {
        person
            .handle(DomainEvent::Correct { period_id }, &strategy)
            .unwrap();
        let previous = person
            .latest_correction(period_id)
            .unwrap()
            .timeline()
            .day(date(1, 13))
            .and_then(|day| day.live_activities().next().map(|a| a.id));
        if let Some(activity_id) = previous {
            person
                .handle(
                    DomainEvent::DeleteActivity {
                        period_id,
                        activity_id,
                    },
                    &strategy,
                )
                .unwrap();
        }
        person
            .handle(
                DomainEvent::AddActivity {
                    period_id,
                    date: date(1, 13),
                    hours: Decimal::from(round as i64 % 8 + 1),
                    activity_type: ActivityType::Sick,
                },
                &strategy,
            )
            .unwrap();
        person.handle(approve(), &strategy).unwrap();
        person.handle(submit(), &strategy).unwrap();
    }
    (person, period_id)
}

fn event_request(ident: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/persons/{}/events", ident))
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Benchmark: Approving a period with nine activities.
///
/// Target: < 50μs mean
fn bench_approve(c: &mut Criterion) {
    let strategy = FinalizeStrategy::default();
    let (person, period_id) = create_filled_person();
    let event = DomainEvent::Approve {
        period_id,
        actor: Actor::EndUser {
            ident: IDENT.to_string(),
        },
        reference_date: date(1, 13),
        at: start_of_day(date(1, 13)),
        justification: None,
    };

    c.bench_function("approve_filled_period", |b| {
        b.iter_batched(
            || person.clone(),
            |mut person| black_box(person.handle(event.clone(), &strategy).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark: Latest correction lookup against chain depth.
fn bench_latest_correction(c: &mut Criterion) {
    let mut group = c.benchmark_group("latest_correction");

    for depth in [1, 4, 16, 64].iter() {
        let (person, period_id) = create_corrected_person(*depth);
        group.bench_with_input(BenchmarkId::new("depth", depth), depth, |b, _| {
            b.iter(|| black_box(person.latest_correction(period_id).unwrap().id()))
        });
    }

    group.finish();
}

/// Benchmark: Saving and loading a person with a deep correction chain.
///
/// Target: < 1ms mean
fn bench_repository_round_trip(c: &mut Criterion) {
    let repository = InMemoryRepository::new();
    let (person, _) = create_corrected_person(16);

    c.bench_function("repository_round_trip", |b| {
        b.iter(|| {
            repository.save(&person).unwrap();
            black_box(repository.load(IDENT).unwrap())
        })
    });
}

/// Benchmark: One event dispatched over HTTP.
///
/// Target: < 500μs mean
fn bench_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(create_test_state());
    let body = serde_json::json!({
        "type": "decision_granted",
        "case_id": "case-bench",
        "effective_date": "2024-01-01"
    })
    .to_string();

    c.bench_function("single_event", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(event_request(IDENT, body.clone()))
                .await
                .unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: Batch of 100 persons receiving a decision.
///
/// Target: < 50ms mean
fn bench_batch_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let state = create_test_state();
    let body = serde_json::json!({
        "type": "decision_granted",
        "case_id": "case-bench",
        "effective_date": "2024-01-01"
    })
    .to_string();
    let idents: Vec<String> = (0..100).map(|i| format!("person_{:03}", i)).collect();

    let mut group = c.benchmark_group("batch_processing");
    group.throughput(Throughput::Elements(100));

    group.bench_function("batch_100", |b| {
        b.to_async(&rt).iter(|| async {
            let mut results = Vec::with_capacity(100);
            for ident in &idents {
                let router = create_router(state.clone());
                let response = router
                    .oneshot(event_request(ident, body.clone()))
                    .await
                    .unwrap();
                results.push(response);
            }
            black_box(results)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_approve,
    bench_latest_correction,
    bench_repository_round_trip,
    bench_single_event,
    bench_batch_100,
);
criterion_main!(benches);
