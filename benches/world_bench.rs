//! Benchmarks for basalt2d
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use basalt2d::{Aabb, BodyDef, BodyType, FixtureDef, Shape, Vec2, World};

fn build_pyramid_world(rows: usize) -> World {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);

    let ground = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
    world.create_fixture(
        ground,
        FixtureDef::new(Shape::edge(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0))),
    );

    for row in 0..rows {
        let count = rows - row;
        let y = 0.55 + row as f32 * 1.1;
        let x0 = -(count as f32 - 1.0) * 0.55;
        for i in 0..count {
            let id = world
                .create_body(
                    &BodyDef::new(BodyType::Dynamic)
                        .with_position(Vec2::new(x0 + i as f32 * 1.1, y)),
                )
                .unwrap();
            world.create_fixture(
                id,
                FixtureDef::new(Shape::boxed(0.5, 0.5))
                    .with_density(1.0)
                    .with_friction(0.5),
            );
        }
    }
    world
}

// ============================================================================
// Stepping benchmarks
// ============================================================================

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    group.bench_function("falling_bodies_60_steps", |b| {
        b.iter(|| {
            let mut world = World::new(Vec2::new(0.0, -10.0), true);
            for i in 0..20 {
                let id = world
                    .create_body(
                        &BodyDef::new(BodyType::Dynamic)
                            .with_position(Vec2::new(i as f32 * 3.0, 50.0)),
                    )
                    .unwrap();
                world.create_fixture(id, FixtureDef::new(Shape::circle(0.5)).with_density(1.0));
            }
            for _ in 0..60 {
                world.step(black_box(1.0 / 60.0), 8, 3);
            }
            world.body_count()
        });
    });

    group.bench_function("pyramid_5_rows_60_steps", |b| {
        b.iter(|| {
            let mut world = build_pyramid_world(5);
            for _ in 0..60 {
                world.step(black_box(1.0 / 60.0), 8, 3);
            }
            world.contact_count()
        });
    });

    group.finish();
}

// ============================================================================
// Query benchmarks
// ============================================================================

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    let mut world = build_pyramid_world(8);
    for _ in 0..30 {
        world.step(1.0 / 60.0, 8, 3);
    }

    group.bench_function("query_aabb", |b| {
        b.iter(|| {
            let mut hits = 0;
            world.query_aabb(
                black_box(Aabb::new(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 4.0))),
                |_key| {
                    hits += 1;
                    true
                },
            );
            hits
        });
    });

    group.bench_function("ray_cast_across", |b| {
        b.iter(|| {
            let mut closest = 1.0_f32;
            world.ray_cast(
                black_box(Vec2::new(-20.0, 1.0)),
                black_box(Vec2::new(20.0, 1.0)),
                |_key, _point, _normal, fraction| {
                    closest = closest.min(fraction);
                    fraction
                },
            );
            closest
        });
    });

    group.finish();
}

criterion_group!(benches, bench_world_step, bench_queries);
criterion_main!(benches);
