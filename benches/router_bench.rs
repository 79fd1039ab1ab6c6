//! Benchmarks for the dashboard router and job store
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use microscope::dashboard::{BootstrapConfig, RouteParams, Router};
use microscope::jobs::{DeadJob, Job, JobBackend, MemoryJobStore};
use serde_json::Map;

fn bench_router(c: &mut Criterion) {
    let mut group = c.benchmark_group("router");
    let router = Router::new(&BootstrapConfig::new("UTC", "microscope", false)).unwrap();

    for fragment in ["/", "/queues", "/processes/worker-pool-42", "/no/such/page"] {
        group.bench_function(format!("resolve_{}", fragment), |b| {
            b.iter(|| router.resolve(black_box(fragment)).unwrap())
        });
    }

    let params = RouteParams::default().with("id", "pool 7");
    group.bench_function("href_preview", |b| {
        b.iter(|| router.href(black_box("processes-preview"), &params).unwrap())
    });

    group.bench_function("sync_full_location", |b| {
        let mut router = Router::new(&BootstrapConfig::new("UTC", "microscope", false)).unwrap();
        b.iter(|| {
            router
                .sync(black_box("/microscope/#/dead-jobs?page=3"))
                .map(|view| view.screen.clone())
                .unwrap()
        })
    });

    group.finish();
}

fn bench_dead_jobs(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("dead_jobs");

    for size in [100, 10000] {
        let store = MemoryJobStore::new();
        rt.block_on(async {
            for i in 0..size {
                let died_at = 1_600_000_000 + i as i64;
                let job = Job::new("send_email", Map::new()).failed("smtp timeout", died_at);
                store.add_dead(DeadJob { died_at, job }).await;
            }
        });

        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("last_page_of_{}", size), |b| {
            let last = (size as u32).div_ceil(20);
            b.iter(|| rt.block_on(store.dead_jobs(black_box(last))).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_router, bench_dead_jobs);
criterion_main!(benches);
