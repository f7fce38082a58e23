//! Rigid Bodies
//!
//! A body carries the kinematic state (transform, sweep, velocities), force
//! accumulators, mass data derived from its fixtures, and the intrusive
//! adjacency used by the stepping core: the world list links and the heads of
//! its contact-edge and joint-edge lists. Structural operations that involve
//! the broad phase (creating fixtures, destruction, activation) live on the
//! world.

use crate::fixture::Fixture;
use crate::math::{cross_sv, Rot, Sweep, Transform, Vec2};

// ============================================================================
// Body flags
// ============================================================================

/// Body is part of the island currently being built.
pub(crate) const FLAG_ISLAND: u16 = 0x0001;
/// Body is awake and participates in simulation.
pub(crate) const FLAG_AWAKE: u16 = 0x0002;
/// Body may be put to sleep by the island solver.
pub(crate) const FLAG_AUTO_SLEEP: u16 = 0x0004;
/// Body uses continuous collision against other dynamic bodies.
pub(crate) const FLAG_BULLET: u16 = 0x0008;
/// Body never rotates (infinite rotational inertia).
pub(crate) const FLAG_FIXED_ROTATION: u16 = 0x0010;
/// Body participates in collision and simulation at all.
pub(crate) const FLAG_ACTIVE: u16 = 0x0020;
/// Body's time-of-impact has been resolved this step.
pub(crate) const FLAG_TOI: u16 = 0x0040;

// ============================================================================
// BodyType
// ============================================================================

/// Type of a rigid body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves, infinite mass
    Static,
    /// Moved by its velocity only, infinite mass, unaffected by forces
    Kinematic,
    /// Fully simulated
    Dynamic,
}

// ============================================================================
// BodyDef
// ============================================================================

/// Parameters for creating a body.
#[derive(Clone, Copy, Debug)]
pub struct BodyDef {
    /// Body type
    pub body_type: BodyType,
    /// World position of the body origin
    pub position: Vec2,
    /// World angle in radians
    pub angle: f32,
    /// Initial linear velocity
    pub linear_velocity: Vec2,
    /// Initial angular velocity
    pub angular_velocity: f32,
    /// Linear velocity damping
    pub linear_damping: f32,
    /// Angular velocity damping
    pub angular_damping: f32,
    /// May the body fall asleep?
    pub allow_sleep: bool,
    /// Is the body initially awake?
    pub awake: bool,
    /// Prevent rotation?
    pub fixed_rotation: bool,
    /// Enable continuous collision against other dynamic bodies?
    pub bullet: bool,
    /// Does the body participate in simulation?
    pub active: bool,
    /// Gravity multiplier
    pub gravity_scale: f32,
}

impl BodyDef {
    /// A body definition of the given type at the origin.
    #[must_use]
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            active: true,
            gravity_scale: 1.0,
        }
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Set the angle.
    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Set the initial linear velocity.
    #[must_use]
    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set the initial angular velocity.
    #[must_use]
    pub fn with_angular_velocity(mut self, omega: f32) -> Self {
        self.angular_velocity = omega;
        self
    }

    /// Mark the body as a bullet.
    #[must_use]
    pub fn as_bullet(mut self) -> Self {
        self.bullet = true;
        self
    }

    /// Prevent rotation.
    #[must_use]
    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }
}

impl Default for BodyDef {
    fn default() -> Self {
        Self::new(BodyType::Static)
    }
}

// ============================================================================
// Body
// ============================================================================

/// A rigid body. Owned by the world arena; referenced by `usize` id.
#[derive(Clone, Debug)]
pub struct Body {
    pub(crate) body_type: BodyType,
    pub(crate) flags: u16,

    /// Body-origin transform
    pub(crate) xf: Transform,
    /// Swept motion of the center of mass over the current step
    pub(crate) sweep: Sweep,

    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f32,

    pub(crate) force: Vec2,
    pub(crate) torque: f32,

    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    /// Rotational inertia about the center of mass
    pub(crate) inertia: f32,
    pub(crate) inv_inertia: f32,

    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) gravity_scale: f32,

    pub(crate) sleep_time: f32,

    /// Fixtures attached to this body
    pub(crate) fixtures: Vec<Fixture>,

    /// Head of the contact-edge list (edge id = 2 * contact id + side)
    pub(crate) contact_list: Option<u32>,
    /// Head of the joint-edge list (edge id = 2 * joint id + side)
    pub(crate) joint_list: Option<u32>,

    /// World body list links
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,

    /// Index into the island scratch arrays during solving
    pub(crate) island_index: usize,
}

impl Body {
    pub(crate) fn new(def: &BodyDef) -> Self {
        let mut flags = 0;
        if def.awake {
            flags |= FLAG_AWAKE;
        }
        if def.allow_sleep {
            flags |= FLAG_AUTO_SLEEP;
        }
        if def.bullet {
            flags |= FLAG_BULLET;
        }
        if def.fixed_rotation {
            flags |= FLAG_FIXED_ROTATION;
        }
        if def.active {
            flags |= FLAG_ACTIVE;
        }

        let xf = Transform::new(def.position, def.angle);
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: def.position,
            c: def.position,
            a0: def.angle,
            a: def.angle,
            alpha0: 0.0,
        };

        let (mass, inv_mass) = if def.body_type == BodyType::Dynamic {
            (1.0, 1.0)
        } else {
            (0.0, 0.0)
        };

        Self {
            body_type: def.body_type,
            flags,
            xf,
            sweep,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2::ZERO,
            torque: 0.0,
            mass,
            inv_mass,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            sleep_time: 0.0,
            fixtures: Vec::new(),
            contact_list: None,
            joint_list: None,
            prev: None,
            next: None,
            island_index: 0,
        }
    }

    // ------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------

    /// Body type.
    #[inline]
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// World position of the body origin.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.xf.p
    }

    /// World angle in radians.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.sweep.a
    }

    /// Body-origin transform.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.xf
    }

    /// World position of the center of mass.
    #[inline]
    #[must_use]
    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    /// Center of mass in body coordinates.
    #[inline]
    #[must_use]
    pub fn local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    /// Linear velocity of the center of mass.
    #[inline]
    #[must_use]
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Angular velocity in radians per second.
    #[inline]
    #[must_use]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Accumulated force.
    #[inline]
    #[must_use]
    pub fn force(&self) -> Vec2 {
        self.force
    }

    /// Accumulated torque.
    #[inline]
    #[must_use]
    pub fn torque(&self) -> f32 {
        self.torque
    }

    /// Total mass in kilograms.
    #[inline]
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Rotational inertia about the center of mass.
    #[inline]
    #[must_use]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Is the body awake?
    #[inline]
    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.flags & FLAG_AWAKE != 0
    }

    /// Does the body participate in simulation?
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flags & FLAG_ACTIVE != 0
    }

    /// Is continuous collision against dynamic bodies enabled?
    #[inline]
    #[must_use]
    pub fn is_bullet(&self) -> bool {
        self.flags & FLAG_BULLET != 0
    }

    /// Is rotation suppressed?
    #[inline]
    #[must_use]
    pub fn is_fixed_rotation(&self) -> bool {
        self.flags & FLAG_FIXED_ROTATION != 0
    }

    /// May the island solver put this body to sleep?
    #[inline]
    #[must_use]
    pub fn is_sleeping_allowed(&self) -> bool {
        self.flags & FLAG_AUTO_SLEEP != 0
    }

    /// Fixtures attached to this body.
    #[inline]
    #[must_use]
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Mutable fixture access (material changes do not require the world).
    #[inline]
    pub fn fixtures_mut(&mut self) -> &mut [Fixture] {
        &mut self.fixtures
    }

    /// Change a fixture's density and recompute the body's mass data.
    /// Ignores an out-of-range index.
    pub fn set_fixture_density(&mut self, index: usize, density: f32) {
        if let Some(fixture) = self.fixtures.get_mut(index) {
            fixture.density = density;
            self.reset_mass_data();
        }
    }

    // ------------------------------------------------------------------
    // State changes
    // ------------------------------------------------------------------

    /// Wake the body up or put it to sleep. Sleeping zeroes the velocities
    /// and accumulators.
    pub fn set_awake(&mut self, awake: bool) {
        if awake {
            if self.flags & FLAG_AWAKE == 0 {
                self.flags |= FLAG_AWAKE;
                self.sleep_time = 0.0;
            }
        } else {
            self.flags &= !FLAG_AWAKE;
            self.sleep_time = 0.0;
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.force = Vec2::ZERO;
            self.torque = 0.0;
        }
    }

    /// Enable or disable continuous collision for this body.
    pub fn set_bullet(&mut self, bullet: bool) {
        if bullet {
            self.flags |= FLAG_BULLET;
        } else {
            self.flags &= !FLAG_BULLET;
        }
    }

    /// Allow or forbid sleeping. Forbidding wakes the body.
    pub fn set_sleeping_allowed(&mut self, allowed: bool) {
        if allowed {
            self.flags |= FLAG_AUTO_SLEEP;
        } else {
            self.flags &= !FLAG_AUTO_SLEEP;
            self.set_awake(true);
        }
    }

    /// Set the linear velocity. Wakes the body when set to a non-zero value.
    pub fn set_linear_velocity(&mut self, v: Vec2) {
        if self.body_type == BodyType::Static {
            return;
        }
        if v.length_squared() > 0.0 {
            self.set_awake(true);
        }
        self.linear_velocity = v;
    }

    /// Set the angular velocity. Wakes the body when set to a non-zero value.
    pub fn set_angular_velocity(&mut self, w: f32) {
        if self.body_type == BodyType::Static {
            return;
        }
        if w * w > 0.0 {
            self.set_awake(true);
        }
        self.angular_velocity = w;
    }

    /// Set the gravity scale multiplier.
    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    /// Apply a force at a world point. Non-center forces generate torque.
    pub fn apply_force(&mut self, force: Vec2, point: Vec2) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if self.is_awake() {
            self.force += force;
            self.torque += (point - self.sweep.c).cross(force);
        }
    }

    /// Apply a force at the center of mass.
    pub fn apply_force_to_center(&mut self, force: Vec2) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if self.is_awake() {
            self.force += force;
        }
    }

    /// Apply a torque.
    pub fn apply_torque(&mut self, torque: f32) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if self.is_awake() {
            self.torque += torque;
        }
    }

    /// Apply a linear impulse at a world point, changing velocity immediately.
    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if self.is_awake() {
            self.linear_velocity += impulse * self.inv_mass;
            self.angular_velocity += self.inv_inertia * (point - self.sweep.c).cross(impulse);
        }
    }

    /// Apply an angular impulse.
    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if self.is_awake() {
            self.angular_velocity += self.inv_inertia * impulse;
        }
    }

    // ------------------------------------------------------------------
    // Geometry helpers
    // ------------------------------------------------------------------

    /// Transform a local point to world coordinates.
    #[inline]
    #[must_use]
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.xf.apply(local)
    }

    /// Transform a world point to local coordinates.
    #[inline]
    #[must_use]
    pub fn local_point(&self, world: Vec2) -> Vec2 {
        self.xf.apply_inverse(world)
    }

    /// Velocity of a world point attached to this body.
    #[inline]
    #[must_use]
    pub fn velocity_at(&self, world_point: Vec2) -> Vec2 {
        self.linear_velocity + cross_sv(self.angular_velocity, world_point - self.sweep.c)
    }

    // ------------------------------------------------------------------
    // Internal stepping support
    // ------------------------------------------------------------------

    /// Rebuild the transform from the sweep's end pose.
    pub(crate) fn synchronize_transform(&mut self) {
        let q = Rot::new(self.sweep.a);
        self.xf = Transform {
            p: self.sweep.c - q.apply(self.sweep.local_center),
            q,
        };
    }

    /// Advance the body to a step fraction and adopt that pose as current.
    pub(crate) fn advance(&mut self, alpha: f32) {
        self.sweep.advance(alpha);
        self.sweep.c = self.sweep.c0;
        self.sweep.a = self.sweep.a0;
        self.synchronize_transform();
    }

    /// Should these two bodies generate contacts at all? At least one of
    /// them must be dynamic; joint suppression is checked by the contact
    /// manager.
    #[must_use]
    pub(crate) fn should_collide_type(&self, other: &Body) -> bool {
        self.body_type == BodyType::Dynamic || other.body_type == BodyType::Dynamic
    }

    /// Recompute mass, center of mass, and inertia from the fixtures.
    pub(crate) fn reset_mass_data(&mut self) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.sweep.local_center = Vec2::ZERO;

        // Static and kinematic bodies have no mass.
        if self.body_type != BodyType::Dynamic {
            self.sweep.c0 = self.xf.p;
            self.sweep.c = self.xf.p;
            self.sweep.a0 = self.sweep.a;
            return;
        }

        let mut local_center = Vec2::ZERO;
        for fixture in &self.fixtures {
            if fixture.density == 0.0 {
                continue;
            }
            let md = fixture.shape.compute_mass(fixture.density);
            self.mass += md.mass;
            local_center += md.center * md.mass;
            self.inertia += md.inertia;
        }

        if self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            local_center = local_center * self.inv_mass;
        } else {
            // Dynamic bodies always need some mass.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if self.inertia > 0.0 && self.flags & FLAG_FIXED_ROTATION == 0 {
            // Shift inertia to the center of mass.
            self.inertia -= self.mass * local_center.length_squared();
            debug_assert!(self.inertia > 0.0);
            self.inv_inertia = 1.0 / self.inertia;
        } else {
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }

        // Move the center of mass, preserving the velocity of the new center.
        let old_center = self.sweep.c;
        self.sweep.local_center = local_center;
        let c = self.xf.apply(local_center);
        self.sweep.c0 = c;
        self.sweep.c = c;
        self.linear_velocity += cross_sv(self.angular_velocity, c - old_center);
    }
}

// ============================================================================
// Tests
// ============================================================================
