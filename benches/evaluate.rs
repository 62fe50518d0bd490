use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ledger_rules::catalog::{Domain, Vocabulary, transaction};
use ledger_rules::store::{MemoryCollection, OwnerId};
use ledger_rules::{Collection, Condition, Registry, Rule, Value, all, any, condition};

const MERCHANTS: &[&str] = &["grocer", "airline", "cafe", "utility"];

/// A registry over `n` transactions with cycling amounts, merchants and names.
fn build_registry(n: usize) -> Registry<MemoryCollection> {
    let store = transaction::memory_store();
    for i in 0..n {
        let merchant = MERCHANTS[i % MERCHANTS.len()];
        store.insert(
            OwnerId(1),
            vec![
                (transaction::AMOUNT, Value::Float((i % 500) as f64 - 100.0)),
                (transaction::MERCHANT, Value::from(merchant)),
                (transaction::NAME, Value::String(format!("{merchant} #{i}"))),
            ],
        );
    }
    let vocabulary = MERCHANTS
        .iter()
        .fold(Vocabulary::new().category("Misc", "misc"), |v, m| v.merchant(*m, *m));
    Registry::new(Domain::Transaction, store.collection(OwnerId(1)), &vocabulary)
}

/// `width` leaves on alternating columns.
fn leaves(width: usize) -> Vec<Condition> {
    (0..width)
        .map(|i| match i % 3 {
            0 => condition("transaction_amount").gt(i64::try_from(i).unwrap_or(0)),
            1 => condition("transaction_merchant").eq(MERCHANTS[i % MERCHANTS.len()]),
            _ => condition("transaction_name").like("#1"),
        })
        .collect()
}

fn rule(root: Condition) -> Rule {
    Rule::new(Domain::Transaction).when(root)
}

fn bench_matching_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_count");

    for &n in &[100, 1_000, 10_000] {
        let registry = build_registry(n);
        let and_rule = rule(all(leaves(6)));
        let or_rule = rule(any(leaves(6)));

        group.bench_with_input(BenchmarkId::new("and", n), &registry, |b, registry| {
            b.iter(|| and_rule.matching_count(black_box(registry)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("or", n), &registry, |b, registry| {
            b.iter(|| or_rule.matching_count(black_box(registry)).unwrap());
        });
    }

    group.finish();
}

fn bench_nested_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_tree");
    let registry = build_registry(1_000);

    for &depth in &[1_usize, 4, 7] {
        let mut root = any(leaves(3));
        for level in 1..depth {
            root = if level % 2 == 0 {
                any(vec![root, condition("transaction_amount").lt(0_i64)])
            } else {
                all(vec![root, condition("transaction_merchant").eq("cafe")])
            };
        }
        let nested = rule(root);
        group.bench_function(BenchmarkId::from_parameter(depth), |b| {
            b.iter(|| nested.matching(black_box(&registry)).unwrap().count().unwrap());
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let registry = build_registry(10);
    let wide = rule(any(leaves(32))).then("set_transaction_category", "misc");
    c.bench_function("validate_32_leaves", |b| {
        b.iter(|| wide.validate(black_box(&registry)).unwrap());
    });
}

criterion_group!(benches, bench_matching_count, bench_nested_tree, bench_validate);
criterion_main!(benches);
