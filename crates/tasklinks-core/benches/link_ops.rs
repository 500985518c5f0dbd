use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rusqlite::{Connection, params};
use tasklinks_core::LinkStore;
use tasklinks_core::db::open_in_memory;
use tasklinks_core::event::NullSink;

const FAN_OUT: [i64; 3] = [10, 100, 1_000];

fn board(task_count: i64) -> Connection {
    let conn = open_in_memory().expect("open in-memory store");
    conn.execute_batch(
        "INSERT INTO projects (id, name) VALUES (1, 'Bench');
         INSERT INTO columns (id, project_id, title, position) VALUES
             (1, 1, 'Backlog', 1), (2, 1, 'Doing', 2), (3, 1, 'Done', 3);",
    )
    .expect("seed board");

    let mut stmt = conn
        .prepare(
            "INSERT INTO tasks (id, title, project_id, column_id, position, is_active)
             VALUES (?1, ?2, 1, ?3, ?4, ?5)",
        )
        .expect("prepare task insert");
    for id in 1..=task_count + 1 {
        stmt.execute(params![
            id,
            format!("task {id}"),
            id % 3 + 1,
            id % 17,
            id % 5 != 0
        ])
        .expect("insert task");
    }
    drop(stmt);
    conn
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("links.create");

    for fan_out in FAN_OUT {
        group.throughput(Throughput::Elements(u64::try_from(fan_out).unwrap_or(0)));
        group.bench_with_input(BenchmarkId::from_parameter(fan_out), &fan_out, |b, &n| {
            b.iter_with_setup(
                || board(n),
                |conn| {
                    let store = LinkStore::new(&conn, Arc::new(NullSink));
                    for target in 2..=n + 1 {
                        black_box(store.create(1, target, 1).expect("create"));
                    }
                },
            );
        });
    }

    group.finish();
}

fn bench_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("links.get_all_grouped");

    for fan_out in FAN_OUT {
        let conn = board(fan_out);
        let store = LinkStore::new(&conn, Arc::new(NullSink));
        for target in 2..=fan_out + 1 {
            let relation = if target % 2 == 0 { 1 } else { 3 };
            store.create(1, target, relation).expect("create");
        }

        group.throughput(Throughput::Elements(u64::try_from(fan_out).unwrap_or(0)));
        group.bench_with_input(BenchmarkId::from_parameter(fan_out), &store, |b, store| {
            b.iter(|| black_box(store.get_all_grouped_by_label(1).expect("list")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create, bench_listing);
criterion_main!(benches);
