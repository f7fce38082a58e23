#![no_main]
use arbitrary::Arbitrary;
use basalt2d::{BodyDef, BodyType, FixtureDef, Shape, Vec2, World};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Number of bodies to add (capped)
    body_count: u8,
    /// Position components (i16 to keep values reasonable)
    positions: Vec<(i16, i16)>,
    /// Velocity components
    velocities: Vec<(i8, i8)>,
    /// Per-body type selector and bullet flag
    kinds: Vec<(u8, bool)>,
    /// Number of simulation steps (capped)
    step_count: u8,
}

// Fuzz the stepping core: random bodies, shapes, and velocities must never
// panic, no matter how degenerate the configuration.
fuzz_target!(|input: FuzzInput| {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);

    let ground = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
    world.create_fixture(
        ground,
        FixtureDef::new(Shape::edge(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0))),
    );

    let body_count = (input.body_count as usize).min(16);
    for i in 0..body_count {
        let (px, py) = input.positions.get(i).copied().unwrap_or((0, 1));
        let (vx, vy) = input.velocities.get(i).copied().unwrap_or((0, 0));
        let (kind, bullet) = input.kinds.get(i).copied().unwrap_or((0, false));

        let body_type = match kind % 3 {
            0 => BodyType::Dynamic,
            1 => BodyType::Static,
            _ => BodyType::Kinematic,
        };
        let mut def = BodyDef::new(body_type)
            .with_position(Vec2::new(f32::from(px), f32::from(py)))
            .with_linear_velocity(Vec2::new(f32::from(vx), f32::from(vy)));
        if bullet {
            def = def.as_bullet();
        }
        let id = world.create_body(&def).unwrap();

        let shape = match kind % 2 {
            0 => Shape::circle(0.5),
            _ => Shape::boxed(0.5, 0.5),
        };
        world.create_fixture(id, FixtureDef::new(shape).with_density(1.0));
    }

    let steps = (input.step_count as usize).min(32);
    for _ in 0..steps {
        world.step(1.0 / 60.0, 8, 3);
    }
});
