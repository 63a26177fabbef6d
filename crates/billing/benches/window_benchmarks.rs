use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{DateTime, NaiveDate, Utc};
use paytv_billing::{BillingPeriod, build_window, classify, reconcile, summarize};
use paytv_core::{BillingMonth, BranchId, PeriodId, SubscriberId};
use paytv_subscribers::{Branch, ContactInfo, Subscriber, SubscriberDirectory};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-10T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A directory of `subscribers` spread over four branches, each with a year of
/// history: paid up to three months ago, then pending.
fn ledger(subscribers: usize) -> (SubscriberDirectory, Vec<BillingPeriod>) {
    let branches: Vec<Branch> = (0..4)
        .map(|i| Branch::open(BranchId::new(), format!("Filial {i}"), 2000 + i * 500, now()).unwrap())
        .collect();
    let mut periods = Vec::with_capacity(subscribers * 12);
    let mut people = Vec::with_capacity(subscribers);
    let current = BillingMonth::containing(today());

    for n in 0..subscribers {
        let branch = &branches[n % branches.len()];
        let s = Subscriber::register(
            SubscriberId::new(),
            format!("Cliente {n}"),
            branch.id_typed().clone(),
            ContactInfo::default(),
            now(),
        )
        .unwrap();
        for back in 0..12 {
            let month = current.offset(-back);
            let mut p = BillingPeriod::issue(
                PeriodId::new(),
                s.id_typed().clone(),
                month,
                branch.monthly_price(),
                now(),
            );
            if back >= 3 {
                p.mark_paid(now());
            }
            periods.push(p);
        }
        people.push(s);
    }
    (SubscriberDirectory::from_parts(branches, people), periods)
}

fn bench_window_and_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_and_classify");

    for size in [10usize, 100, 1000] {
        let (directory, periods) = ledger(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build_window", size), &size, |b, _| {
            b.iter(|| {
                for s in directory.subscribers() {
                    black_box(build_window(s, directory.branch_of(s), &periods, today()));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("classify", size), &size, |b, _| {
            b.iter(|| {
                for s in directory.subscribers() {
                    black_box(classify(s, &periods, today()));
                }
            })
        });
    }

    group.finish();
}

fn bench_reconcile_and_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_and_summary");
    let (directory, periods) = ledger(500);
    let subscriber = directory.subscribers()[0].clone();

    group.bench_function("reconcile_advance_six", |b| {
        let window = build_window(&subscriber, directory.branch_of(&subscriber), &periods, today());
        let selection = window.buckets().apply(paytv_billing::Shortcut::Advance6);
        b.iter(|| black_box(reconcile(&selection, &directory, &periods, now()).unwrap()))
    });

    group.bench_function("dashboard_summary", |b| {
        b.iter(|| {
            black_box(summarize(
                &directory,
                &periods,
                BillingMonth::containing(today()),
                today(),
            ))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_window_and_classify,
    bench_reconcile_and_summary
);
criterion_main!(benches);
