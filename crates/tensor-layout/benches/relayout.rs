// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for layout transforms and relayout planning.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grid_linearize::CollapseIntervals;
use layout_types::{DataType, Shape, TileType};
use tensor_layout::{plan_data_movement, LayoutDescriptor};

fn layout(dims: &[usize], grid: &[usize]) -> LayoutDescriptor {
    LayoutDescriptor::builder(
        Shape::new(dims.to_vec()).unwrap(),
        Shape::new(grid.to_vec()).unwrap(),
    )
    .build()
    .unwrap()
}

fn bench_transforms(c: &mut Criterion) {
    let l = layout(&[2, 3, 64, 128], &[2, 4]);
    let tile = TileType::new(32, 32, DataType::BfpBFloat8).unwrap();
    let grid = Shape::new(vec![3, 2]).unwrap();
    let intervals = CollapseIntervals::default();

    c.bench_function("tilize", |b| b.iter(|| l.tilize(black_box(tile)).unwrap()));
    c.bench_function("parallelize", |b| {
        b.iter(|| l.parallelize(black_box(&grid), &intervals).unwrap())
    });
}

fn bench_plan_data_movement(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_data_movement");
    for &side in &[64usize, 128, 256] {
        let src = layout(&[side, side], &[2, 4]);
        let dst = layout(&[side, side], &[4, 2]);
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| plan_data_movement(black_box(&src), black_box(&dst)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transforms, bench_plan_data_movement);
criterion_main!(benches);
