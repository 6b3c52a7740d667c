use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use storefront_core::{AxisId, ValueId};
use storefront_variations::{
    COMBINATION_CAP, SelectedAxis, VariationAxis, VariationValue, derive_sku, generate,
    generate_capped,
};

fn axes(count: u64, values_per_axis: u64) -> Vec<SelectedAxis> {
    (1..=count)
        .map(|a| SelectedAxis {
            axis: VariationAxis {
                id: AxisId::new(a),
                name: format!("Axis {a}"),
                usage_count: 0,
            },
            values: (1..=values_per_axis)
                .map(|v| VariationValue {
                    id: ValueId::new(a * 1_000 + v),
                    axis_id: AxisId::new(a),
                    name: format!("Value {v}"),
                })
                .collect(),
        })
        .collect()
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for (count, per_axis) in [(1u64, 10u64), (2, 10), (3, 5), (4, 10)] {
        let input = axes(count, per_axis);
        let expected = (per_axis.pow(count as u32) as usize).min(COMBINATION_CAP);
        group.throughput(Throughput::Elements(expected as u64));
        group.bench_with_input(
            BenchmarkId::new("capped", format!("{count}x{per_axis}")),
            &input,
            |b, input| b.iter(|| generate(black_box(input))),
        );
    }

    // Uncapped expansion of a 10^4 product.
    let wide = axes(4, 10);
    group.bench_function("uncapped_10000", |b| {
        b.iter(|| generate_capped(black_box(&wide), usize::MAX))
    });

    group.finish();
}

fn bench_sku(c: &mut Criterion) {
    c.bench_function("derive_sku", |b| {
        b.iter(|| derive_sku(black_box("MUG"), black_box("Red × Large × Ceramic"), 7))
    });
}

criterion_group!(benches, bench_generate, bench_sku);
criterion_main!(benches);
