//! Store benchmarks: validated inserts, scans and joins.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scdb_bench::fixtures::{
    generate_posts, generate_users, populated_db, post_fields, register_schema, user_fields,
    Scale,
};
use scdb_core::{Database, Value};

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/insert");

    for scale in [Scale::Tiny, Scale::Small] {
        let users = generate_users(scale.count());
        let posts = generate_posts(scale.count(), 25, scale.count());

        group.bench_with_input(BenchmarkId::new("users_posts", scale.count()), &scale, |b, _| {
            b.iter(|| {
                let mut db = Database::new();
                register_schema(&mut db).unwrap();
                db.insert_many("User", users.iter().map(user_fields)).unwrap();
                db.insert_many("Post", posts.iter().map(post_fields)).unwrap();
                black_box(db)
            });
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/scan");
    let db = populated_db(Scale::Small.count(), Scale::Small.count(), 25).unwrap();

    group.bench_function("by_primary_key", |b| {
        b.iter(|| black_box(db.scan("User", [("id", Value::Integer(500))]).unwrap()));
    });

    group.bench_function("by_foreign_key", |b| {
        b.iter(|| black_box(db.scan("Post", [("creator", Value::Integer(7))]).unwrap()));
    });

    group.bench_function("find", |b| {
        b.iter(|| black_box(db.find("User", black_box(500i64)).unwrap()));
    });

    group.finish();
}

fn bench_related(c: &mut Criterion) {
    let db = populated_db(Scale::Small.count(), 0, 0).unwrap();

    c.bench_function("store/related", |b| {
        b.iter(|| black_box(db.related("Group", black_box(42i64), "User").unwrap()));
    });
}

criterion_group!(benches, bench_insert, bench_scan, bench_related);
criterion_main!(benches);
