use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use guestbook_api::guestbook::comment::{
    CommentRecord, RootComment,
    tree::{build_comment_tree, get_comment_stats},
    validator::validate_nested_structure,
};

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("guest_book_tree");
    for p in [(10, 2), (100, 5), (1000, 10), (10000, 30), (100000, 100)].iter() {
        let records = generate_records(p.0, p.1);
        group.bench_function(BenchmarkId::new("build", p.0), |b| {
            b.iter(|| build_comment_tree(black_box(&records)))
        });

        let tree = build_comment_tree(&records);
        group.bench_function(BenchmarkId::new("validate", p.0), |b| {
            b.iter(|| validate_nested_structure(black_box(&tree)))
        });
        group.bench_function(BenchmarkId::new("stats", p.0), |b| {
            b.iter(|| get_comment_stats(black_box(&tree)))
        });
        group.bench_function(BenchmarkId::new("wire_view", p.0), |b| {
            b.iter(|| {
                tree.iter()
                    .cloned()
                    .map(RootComment::from)
                    .collect::<Vec<_>>()
            })
        });
    }
    group.finish();
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

// Every `thread_size`-th record opens a thread, the rest reply to it. Ids
// are shuffled by a fixed stride so the input is not already sorted.
fn generate_records(n: usize, thread_size: usize) -> Vec<CommentRecord> {
    let stride = 7919 % n.max(1);
    let base = base_time();

    (0..n)
        .map(|i| (i * stride.max(1)) % n)
        .map(|i| {
            let root = i - i % thread_size;
            let created_at = base + TimeDelta::seconds(i as i64);
            CommentRecord {
                id: format!("entry_{i}"),
                short_id: Some(format!("msg_{i}")),
                message: "message".to_string(),
                author_id: format!("user_{}", i % 17),
                author_name: "author".to_string(),
                author_image: None,
                created_at,
                updated_at: created_at,
                parent_id: (root != i).then(|| format!("entry_{root}")),
                replied_to_user_id: None,
                replied_to_user_name: None,
                is_deleted: i % 50 == 0,
            }
        })
        .collect()
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
