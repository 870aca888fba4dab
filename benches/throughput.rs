//! Throughput Benchmark for linekv
//!
//! Measures request parsing, command execution and the full trip
//! through the scheduler queue.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use linekv::protocol::parse_request;
use linekv::{CommandHandler, Scheduler};
use std::net::SocketAddr;
use std::time::Duration;

/// Benchmark request parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_get", |b| {
        b.iter(|| parse_request(black_box("GET;some:key")));
    });

    group.bench_function("parse_put_text", |b| {
        b.iter(|| parse_request(black_box("PUT;some:key;\"some value\"")));
    });

    let list = format!(
        "PUTLIST;some:key;\"{}\"",
        (0..256).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    );
    group.bench_function("parse_putlist_256", |b| {
        b.iter(|| parse_request(black_box(&list)));
    });

    group.finish();
}

/// Benchmark PUT and GET through the command handler
fn bench_put_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("handler");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put", |b| {
        let mut handler = CommandHandler::new();
        let mut i = 0u64;
        b.iter(|| {
            let request = format!("PUT;key:{};\"value\"", i % 10_000);
            black_box(handler.handle(request.as_bytes()));
            i += 1;
        });
    });

    group.bench_function("get", |b| {
        let mut handler = CommandHandler::new();
        for i in 0..10_000 {
            handler.handle(format!("PUT;key:{i};{i}").as_bytes());
        }
        let mut i = 0u64;
        b.iter(|| {
            let request = format!("GET;key:{}", i % 10_000);
            black_box(handler.handle(request.as_bytes()));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark the read-modify-write commands
fn bench_increment_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_modify_write");
    group.throughput(Throughput::Elements(1));

    group.bench_function("increment", |b| {
        let mut handler = CommandHandler::new();
        handler.handle(b"PUT;counter;0");
        b.iter(|| black_box(handler.handle(b"INCREMENT;counter")));
    });

    group.bench_function("append_64", |b| {
        let mut handler = CommandHandler::new();
        b.iter(|| {
            handler.handle(b"PUT;list;[]");
            for _ in 0..64 {
                black_box(handler.handle(b"APPEND;list;\"item\""));
            }
        });
    });

    group.finish();
}

/// Benchmark requests submitted through the scheduler
fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(1000));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let client: SocketAddr = "127.0.0.1:50000".parse().unwrap();

    group.bench_function("increment_1000_from_10_clients", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let (queue, scheduler) = Scheduler::spawn(CommandHandler::new());
                queue.submit(client, "PUT;n;0".into()).await.unwrap();

                let mut tasks = Vec::new();
                for _ in 0..10 {
                    let queue = queue.clone();
                    tasks.push(tokio::spawn(async move {
                        for _ in 0..100 {
                            queue.submit(client, "INCREMENT;n".into()).await.unwrap();
                        }
                    }));
                }
                for task in tasks {
                    task.await.unwrap();
                }

                drop(queue);
                black_box(scheduler.await.unwrap());
            });
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_put_get,
    bench_increment_append,
    bench_scheduler,
);

criterion_main!(benches);
