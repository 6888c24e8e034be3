use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlcraft::{MySql, Postgres, Statement, Value};

/// SELECT col0, col1, ... FROM t WHERE (col0=0) AND (col1=1) ...
fn build_select(n: usize) -> Statement {
    let mut q = Statement::new(MySql);
    for i in 0..n {
        q.select(&format!("col{i}")).unwrap();
    }
    q.from("t").unwrap();
    for i in 0..n {
        q.where_col(&format!("col{i}")).unwrap().eq(i as i64).unwrap();
    }
    q
}

fn bench_build_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build_select");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).to_sql()));
        });
    }

    group.finish();
}

fn bench_to_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/to_count");

    for n in [1, 10, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_count().unwrap()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut q = Statement::new(Postgres);
                q.select("*").unwrap().from("t").unwrap();
                q.where_col("id").unwrap().in_list(values.iter().copied()).unwrap();
                black_box(q.to_sql());
            });
        });
    }

    group.finish();
}

fn bench_insert_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/insert_rows");

    for n in [10, 100, 1000] {
        let rows: Vec<Vec<Value>> = (0..n)
            .map(|i| vec![Value::Int(i), Value::Text(format!("name 'n{i}'"))])
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| {
                let mut q = Statement::new(MySql);
                q.insert("t", &["id", "name"]).unwrap();
                q.values_rows(rows).unwrap();
                black_box(q.to_sql());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build_select,
    bench_to_count,
    bench_in_list,
    bench_insert_rows
);
criterion_main!(benches);
