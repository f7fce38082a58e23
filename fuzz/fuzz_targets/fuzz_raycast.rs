#![no_main]
use arbitrary::Arbitrary;
use basalt2d::{BodyDef, BodyType, FixtureDef, Shape, Vec2, World};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Shape positions (capped count)
    positions: Vec<(i16, i16)>,
    /// Ray endpoints
    rays: Vec<(i16, i16, i16, i16)>,
}

// Rays with arbitrary endpoints (including degenerate zero-length ones)
// against a scattering of shapes must never panic.
fuzz_target!(|input: FuzzInput| {
    let mut world = World::new(Vec2::ZERO, true);

    for (i, &(x, y)) in input.positions.iter().take(16).enumerate() {
        let id = world
            .create_body(
                &BodyDef::new(BodyType::Static)
                    .with_position(Vec2::new(f32::from(x), f32::from(y))),
            )
            .unwrap();
        let shape = if i % 2 == 0 {
            Shape::circle(1.0)
        } else {
            Shape::boxed(1.0, 0.5)
        };
        world.create_fixture(id, FixtureDef::new(shape));
    }
    world.step(1.0 / 60.0, 1, 1);

    for &(x1, y1, x2, y2) in input.rays.iter().take(16) {
        world.ray_cast(
            Vec2::new(f32::from(x1), f32::from(y1)),
            Vec2::new(f32::from(x2), f32::from(y2)),
            |_key, _point, _normal, fraction| fraction,
        );
    }
});
