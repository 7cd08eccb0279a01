use brickset::{
    catalog::{BrickShape, Color},
    label::enumerate_classes,
    lighting::RIGS,
    pose::PoseSampler,
    scene::{BrickCsgWriter, compose_scene},
};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_scene(c: &mut Criterion) {
    let shape = BrickShape::new("3007", "Brick2X8");
    let color = Color::first(5)[4];

    c.bench_function("compose_scene", |b| {
        let mut sampler = PoseSampler::new(1);
        b.iter_batched(
            || sampler.next_piece(shape, color),
            |piece| {
                let mut buf = Vec::with_capacity(4096);
                compose_scene(&BrickCsgWriter, &piece, &RIGS[0], &mut buf).unwrap();
                black_box(buf)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("enumerate_classes", |b| {
        b.iter(|| black_box(enumerate_classes(BrickShape::catalog(), Color::catalog())).unwrap())
    });
}

criterion_group!(benches, bench_scene);
criterion_main!(benches);
