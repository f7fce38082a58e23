//! Integration tests for the world stepping core.
//!
//! These exercise the public API end to end: discrete stepping, island
//! construction, sleeping, the continuous-collision sweep, sensors, joints,
//! and entity lifecycle.

use basalt2d::{
    BodyDef, BodyType, Contact, ContactListener, FixtureDef, JointDef, RevoluteJointDef, Shape,
    Vec2, World,
};

// ============================================================================
// Helpers
// ============================================================================

const DT: f32 = 1.0 / 60.0;

/// Run a world for `steps` frames with the standard iteration counts.
fn run_world(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.step(DT, 8, 3);
    }
}

fn create_dynamic_box(world: &mut World, x: f32, y: f32, hx: f32, hy: f32) -> usize {
    let id = world
        .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(x, y)))
        .expect("world is unlocked");
    world.create_fixture(
        id,
        FixtureDef::new(Shape::boxed(hx, hy))
            .with_density(1.0)
            .with_friction(0.3),
    );
    id
}

fn create_ground_edge(world: &mut World) -> usize {
    let id = world
        .create_body(&BodyDef::new(BodyType::Static))
        .expect("world is unlocked");
    world.create_fixture(
        id,
        FixtureDef::new(Shape::edge(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)))
            .with_friction(0.5),
    );
    id
}

// ============================================================================
// Test 1 — Free fall
// ============================================================================

/// One step of gravity on an isolated body: velocity and position follow
/// semi-implicit Euler exactly.
#[test]
fn test_free_fall_single_step() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    let id = world
        .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(0.0, 10.0)))
        .unwrap();
    world.create_fixture(id, FixtureDef::new(Shape::circle(0.5)).with_density(1.0));

    world.step(DT, 8, 3);

    let v = world.body(id).linear_velocity();
    let p = world.body(id).position();
    assert!((v.y + 0.1667).abs() < 1e-3, "vy = {}", v.y);
    assert!((p.y - (10.0 - 0.00278)).abs() < 1e-4, "y = {}", p.y);
}

// ============================================================================
// Test 2 — Box on ground comes to rest and sleeps
// ============================================================================

#[test]
fn test_box_rests_and_sleeps_on_ground() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    create_ground_edge(&mut world);
    let boxy = create_dynamic_box(&mut world, 0.0, 1.0, 0.5, 0.5);

    run_world(&mut world, 300);

    let b = world.body(boxy);
    assert!(
        b.linear_velocity().length() < 0.01,
        "box still moving: {:?}",
        b.linear_velocity()
    );
    assert!(!b.is_awake(), "box should be asleep");
    // Resting on the ground, not inside it.
    assert!(b.position().y > 0.45, "box sank: y = {}", b.position().y);
    assert!(b.position().y < 0.60, "box floats: y = {}", b.position().y);
}

// ============================================================================
// Test 3 — Continuous collision prevents tunneling
// ============================================================================

#[test]
fn test_bullet_does_not_tunnel_through_thin_wall() {
    let mut world = World::new(Vec2::ZERO, true);

    // 0.1 m thick static wall at x = 0.
    let wall = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
    world.create_fixture(wall, FixtureDef::new(Shape::boxed(0.05, 5.0)));

    // Fast box approaching at 300 m/s: it would cross the wall entirely in
    // one 1/60 s step.
    let bullet = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(-1.0, 0.0))
                .with_linear_velocity(Vec2::new(300.0, 0.0))
                .as_bullet(),
        )
        .unwrap();
    world.create_fixture(bullet, FixtureDef::new(Shape::boxed(0.25, 0.25)).with_density(1.0));

    world.step(DT, 8, 3);

    let x = world.body(bullet).position().x;
    assert!(x < 0.0, "bullet passed the wall: x = {x}");
    assert!(world.stats().toi_hits > 0, "no TOI event was recorded");
}

#[test]
fn test_tunneling_happens_without_continuous_physics() {
    let mut world = World::new(Vec2::ZERO, true);
    world.set_continuous_physics(false);

    let wall = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
    world.create_fixture(wall, FixtureDef::new(Shape::boxed(0.05, 5.0)));

    let bullet = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(-1.0, 0.0))
                .with_linear_velocity(Vec2::new(300.0, 0.0))
                .as_bullet(),
        )
        .unwrap();
    world.create_fixture(bullet, FixtureDef::new(Shape::boxed(0.25, 0.25)).with_density(1.0));

    world.step(DT, 8, 3);

    // The discrete step carries the box clear across the wall (per-step
    // translation is clamped to 2 m, still far past the 0.1 m wall).
    assert!(
        world.body(bullet).position().x > 0.5,
        "expected tunneling, x = {}",
        world.body(bullet).position().x
    );
}

// ============================================================================
// Test 4 — Pendulum energy with warm starting
// ============================================================================

#[test]
fn test_revolute_pendulum_conserves_energy() {
    let mut world = World::new(Vec2::ZERO, true);

    let anchor = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();

    // Disc circling the origin at the end of a rigid revolute arm: rigid
    // rotation at 1 rad/s, so the pivot constraint should do no work.
    let bob = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(2.0, 0.0))
                .with_linear_velocity(Vec2::new(0.0, 2.0))
                .with_angular_velocity(1.0),
        )
        .unwrap();
    world.create_fixture(bob, FixtureDef::new(Shape::circle(0.25)).with_density(1.0));
    // The bob must not fall asleep during the orbit measurement.
    world.body_mut(bob).set_sleeping_allowed(false);

    world
        .create_joint(&JointDef::Revolute(
            RevoluteJointDef::new(anchor, bob)
                .with_local_anchors(Vec2::ZERO, Vec2::new(-2.0, 0.0)),
        ))
        .unwrap();

    let energy = |world: &World| {
        let b = world.body(bob);
        0.5 * b.mass() * b.linear_velocity().length_squared()
            + 0.5 * b.inertia() * b.angular_velocity() * b.angular_velocity()
    };

    let e0 = energy(&world);
    run_world(&mut world, 60);
    let e1 = energy(&world);

    let ratio = e1 / e0;
    assert!(
        (0.95..=1.05).contains(&ratio),
        "energy drifted: {e0} -> {e1} (ratio {ratio})"
    );
    // The bob is still on its circle.
    let r = world.body(bob).world_center().length();
    assert!((r - 2.0).abs() < 0.05, "orbit radius drifted: {r}");
}

// ============================================================================
// Test 5 — Contact listener and the lock
// ============================================================================

#[test]
fn test_contact_listener_receives_begin_and_end() {
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        begins: usize,
        ends: usize,
    }
    struct Recorder(Rc<RefCell<Counts>>);
    impl ContactListener for Recorder {
        fn begin_contact(&mut self, _id: usize, _contact: &Contact) {
            self.0.borrow_mut().begins += 1;
        }
        fn end_contact(&mut self, _id: usize, _contact: &Contact) {
            self.0.borrow_mut().ends += 1;
        }
    }

    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut world = World::new(Vec2::ZERO, true);
    world.set_contact_listener(Box::new(Recorder(counts.clone())));

    // Two overlapping circles, one drifting away.
    let a = world
        .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(0.0, 0.0)))
        .unwrap();
    world.create_fixture(a, FixtureDef::new(Shape::circle(0.5)).with_density(1.0));
    let b = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(0.8, 0.0))
                .with_linear_velocity(Vec2::new(20.0, 0.0)),
        )
        .unwrap();
    world.create_fixture(b, FixtureDef::new(Shape::circle(0.5)).with_density(1.0));

    run_world(&mut world, 30);

    let counts = counts.borrow();
    assert!(counts.begins >= 1, "begin_contact never fired");
    assert!(counts.ends >= 1, "end_contact never fired");
    // Outside of step the world is unlocked again.
    assert!(!world.is_locked());
}

// ============================================================================
// Test 6 — Sensors
// ============================================================================

#[test]
fn test_sensors_report_contact_but_apply_no_forces() {
    let mut world = World::new(Vec2::ZERO, true);

    let a = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(-1.0, 0.0))
                .with_linear_velocity(Vec2::new(2.0, 0.0)),
        )
        .unwrap();
    world.create_fixture(a, FixtureDef::new(Shape::circle(0.5)).with_density(1.0).sensor());

    let b = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(1.0, 0.0))
                .with_linear_velocity(Vec2::new(-2.0, 0.0)),
        )
        .unwrap();
    world.create_fixture(b, FixtureDef::new(Shape::circle(0.5)).with_density(1.0).sensor());

    // Let them pass through each other.
    run_world(&mut world, 30);

    // Velocities are untouched: sensors never join an island.
    assert_eq!(world.body(a).linear_velocity(), Vec2::new(2.0, 0.0));
    assert_eq!(world.body(b).linear_velocity(), Vec2::new(-2.0, 0.0));
    assert_eq!(world.stats().island_contacts, 0);
}

#[test]
fn test_sensor_overlap_is_tracked_as_touching() {
    let mut world = World::new(Vec2::ZERO, true);

    let a = world
        .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(0.0, 0.0)))
        .unwrap();
    world.create_fixture(a, FixtureDef::new(Shape::circle(0.5)).with_density(1.0).sensor());
    let b = world
        .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(0.5, 0.0)))
        .unwrap();
    world.create_fixture(b, FixtureDef::new(Shape::circle(0.5)).with_density(1.0));

    world.step(DT, 8, 3);

    assert_eq!(world.contact_count(), 1);
    let cid = world.contact_ids().next().unwrap();
    assert!(world.contact(cid).is_touching());
    assert_eq!(world.contact(cid).manifold().count, 0);
}

// ============================================================================
// Zero-dt step
// ============================================================================

#[test]
fn test_zero_dt_refreshes_contacts_but_moves_nothing() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    let a = world
        .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(0.0, 0.0)))
        .unwrap();
    world.create_fixture(a, FixtureDef::new(Shape::circle(0.5)).with_density(1.0));
    let b = world
        .create_body(&BodyDef::new(BodyType::Static).with_position(Vec2::new(0.5, 0.0)))
        .unwrap();
    world.create_fixture(b, FixtureDef::new(Shape::circle(0.5)));

    world.step(0.0, 8, 3);

    // Collide ran: the overlapping pair is touching.
    assert_eq!(world.contact_count(), 1);
    let cid = world.contact_ids().next().unwrap();
    assert!(world.contact(cid).is_touching());

    // Nothing moved.
    assert_eq!(world.body(a).position(), Vec2::new(0.0, 0.0));
    assert_eq!(world.body(a).linear_velocity(), Vec2::ZERO);
}

// ============================================================================
// Lifecycle round trip
// ============================================================================

#[test]
fn test_destroy_everything_returns_to_empty() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    create_ground_edge(&mut world);
    let a = create_dynamic_box(&mut world, 0.0, 1.0, 0.5, 0.5);
    let b = create_dynamic_box(&mut world, 0.4, 2.0, 0.5, 0.5);
    world
        .create_joint(&JointDef::Revolute(RevoluteJointDef::new(a, b)))
        .unwrap();

    run_world(&mut world, 10);
    assert!(world.contact_count() > 0);

    let joints: Vec<usize> = world.joint_ids().collect();
    for j in joints {
        world.destroy_joint(j);
    }
    assert_eq!(world.joint_count(), 0);

    let bodies: Vec<usize> = world.body_ids().collect();
    for id in bodies {
        world.destroy_body(id);
    }
    assert_eq!(world.body_count(), 0);
    assert_eq!(world.contact_count(), 0);
    assert_eq!(world.proxy_count(), 0);
}

// ============================================================================
// Island structure
// ============================================================================

/// Two separated boxes resting on one ground body form two islands; the
/// static ground is a member of both.
#[test]
fn test_static_body_shared_between_islands() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    create_ground_edge(&mut world);
    create_dynamic_box(&mut world, -5.0, 0.51, 0.5, 0.5);
    create_dynamic_box(&mut world, 5.0, 0.51, 0.5, 0.5);

    // A few steps so both boxes touch the ground.
    run_world(&mut world, 5);

    assert_eq!(world.stats().islands, 2, "expected two separate islands");
    // Each island holds its box plus the shared ground body.
    assert_eq!(world.stats().island_bodies, 4);
    assert_eq!(world.stats().island_contacts, 2);
}

/// Every awake dynamic body lands in exactly one island per step.
#[test]
fn test_isolated_bodies_form_single_body_islands() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    for i in 0..4 {
        create_dynamic_box(&mut world, i as f32 * 10.0, 10.0, 0.5, 0.5);
    }
    world.step(DT, 8, 3);
    assert_eq!(world.stats().islands, 4);
    assert_eq!(world.stats().island_bodies, 4);
}

// ============================================================================
// TOI bookkeeping
// ============================================================================

#[test]
fn test_toi_count_stays_within_budget() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    create_ground_edge(&mut world);

    // A fast bouncing box that will produce TOI events.
    let id = world
        .create_body(
            &BodyDef::new(BodyType::Dynamic)
                .with_position(Vec2::new(0.0, 5.0))
                .with_linear_velocity(Vec2::new(0.0, -100.0))
                .as_bullet(),
        )
        .unwrap();
    world.create_fixture(
        id,
        FixtureDef::new(Shape::boxed(0.2, 0.2))
            .with_density(1.0)
            .with_restitution(0.5),
    );

    for _ in 0..60 {
        world.step(DT, 8, 3);
        for cid in world.contact_ids().collect::<Vec<_>>() {
            assert!(
                world.contact(cid).toi_count() <= 11,
                "toi budget exceeded: {}",
                world.contact(cid).toi_count()
            );
        }
    }

    // The fast box never fell through the ground.
    assert!(world.body(id).position().y > 0.0);
}

// ============================================================================
// Warm starting across variable steps
// ============================================================================

#[test]
fn test_variable_dt_stack_remains_stable() {
    let mut world = World::new(Vec2::new(0.0, -10.0), true);
    create_ground_edge(&mut world);
    let bottom = create_dynamic_box(&mut world, 0.0, 0.55, 0.5, 0.5);
    let top = create_dynamic_box(&mut world, 0.05, 1.65, 0.5, 0.5);

    // Alternate between two step sizes; dt_ratio rescaling keeps the cached
    // impulses meaningful.
    for i in 0..240 {
        let dt = if i % 2 == 0 { 1.0 / 60.0 } else { 1.0 / 120.0 };
        world.step(dt, 8, 3);
    }

    assert!(world.body(bottom).position().y > 0.4);
    assert!(
        world.body(top).position().y > 1.3,
        "stack collapsed: top y = {}",
        world.body(top).position().y
    );
}
