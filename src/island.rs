//! Island Solver
//!
//! A reusable buffer of bodies, contacts, and joints forming one connected
//! component of the simulation graph, plus the sequential-impulse solver run
//! on it: velocity integration, warm-started contact and joint velocity
//! iterations, position integration with per-step motion clamps, iterative
//! position correction, and the island-wide sleep decision.
//!
//! Body state is copied into island-local position/velocity arrays indexed by
//! each body's island index, solved there, and copied back.

use crate::arena::Arena;
use crate::body::{Body, BodyType};
use crate::collide::{ManifoldKind, WorldManifold};
use crate::contact::Contact;
use crate::joint::Joint;
use crate::math::{cross_sv, Rot, Transform, Vec2};
use crate::settings::{
    ANGULAR_SLEEP_TOLERANCE, BAUMGARTE, LINEAR_SLEEP_TOLERANCE, LINEAR_SLOP, MAX_LINEAR_CORRECTION,
    MAX_MANIFOLD_POINTS, MAX_ROTATION, MAX_ROTATION_SQUARED, MAX_TRANSLATION,
    MAX_TRANSLATION_SQUARED, TIME_TO_SLEEP, VELOCITY_THRESHOLD,
};

// ============================================================================
// Step data
// ============================================================================

/// Per-step solver parameters.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TimeStep {
    /// Step duration in seconds
    pub(crate) dt: f32,
    /// `1 / dt`, or 0 for a zero step
    pub(crate) inv_dt: f32,
    /// `inv_dt0 * dt`: rescales cached impulses across variable steps
    pub(crate) dt_ratio: f32,
    /// Velocity solver iterations
    pub(crate) velocity_iterations: u32,
    /// Position solver iterations
    pub(crate) position_iterations: u32,
    /// Apply cached impulses before solving?
    pub(crate) warm_starting: bool,
}

/// Island-local position state.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Position {
    /// Center of mass
    pub(crate) c: Vec2,
    /// Angle
    pub(crate) a: f32,
}

/// Island-local velocity state.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Velocity {
    /// Linear velocity
    pub(crate) v: Vec2,
    /// Angular velocity
    pub(crate) w: f32,
}

impl Position {
    fn transform(&self, local_center: Vec2) -> Transform {
        let q = Rot::new(self.a);
        Transform {
            p: self.c - q.apply(local_center),
            q,
        }
    }
}

// ============================================================================
// Contact constraints
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f32,
    tangent_impulse: f32,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

#[derive(Clone, Debug)]
struct ContactVelocityConstraint {
    points: [VelocityConstraintPoint; MAX_MANIFOLD_POINTS],
    count: usize,
    normal: Vec2,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    friction: f32,
    contact_id: usize,
}

#[derive(Clone, Debug)]
struct ContactPositionConstraint {
    local_points: [Vec2; MAX_MANIFOLD_POINTS],
    count: usize,
    local_normal: Vec2,
    local_point: Vec2,
    kind: ManifoldKind,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    local_center_a: Vec2,
    local_center_b: Vec2,
    radius_a: f32,
    radius_b: f32,
}

/// World-space contact data for one position-solver point.
struct PositionSolverManifold {
    normal: Vec2,
    point: Vec2,
    separation: f32,
}

impl PositionSolverManifold {
    fn new(
        pc: &ContactPositionConstraint,
        xf_a: &Transform,
        xf_b: &Transform,
        index: usize,
    ) -> Self {
        debug_assert!(pc.count > 0);
        match pc.kind {
            ManifoldKind::Circles => {
                let point_a = xf_a.apply(pc.local_point);
                let point_b = xf_b.apply(pc.local_points[0]);
                let normal = (point_b - point_a).normalize();
                Self {
                    normal,
                    point: (point_a + point_b) * 0.5,
                    separation: (point_b - point_a).dot(normal) - pc.radius_a - pc.radius_b,
                }
            }
            ManifoldKind::FaceA => {
                let normal = xf_a.q.apply(pc.local_normal);
                let plane_point = xf_a.apply(pc.local_point);
                let clip_point = xf_b.apply(pc.local_points[index]);
                Self {
                    normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b,
                }
            }
            ManifoldKind::FaceB => {
                let normal = xf_b.q.apply(pc.local_normal);
                let plane_point = xf_b.apply(pc.local_point);
                let clip_point = xf_a.apply(pc.local_points[index]);
                Self {
                    // Flip so the normal points from A to B.
                    normal: -normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b,
                }
            }
        }
    }
}

// ============================================================================
// Island
// ============================================================================

/// Reusable island buffer. Capacity grows monotonically and is never freed
/// between steps.
pub(crate) struct Island {
    /// Body ids in this island
    pub(crate) bodies: Vec<usize>,
    /// Contact ids in this island
    pub(crate) contacts: Vec<usize>,
    /// Joint ids in this island
    pub(crate) joints: Vec<usize>,

    positions: Vec<Position>,
    velocities: Vec<Velocity>,
    velocity_constraints: Vec<ContactVelocityConstraint>,
    position_constraints: Vec<ContactPositionConstraint>,
}

impl Island {
    pub(crate) fn new() -> Self {
        Self {
            bodies: Vec::new(),
            contacts: Vec::new(),
            joints: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            velocity_constraints: Vec::new(),
            position_constraints: Vec::new(),
        }
    }

    /// Reset for a new island, keeping allocations.
    pub(crate) fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
        self.positions.clear();
        self.velocities.clear();
        self.velocity_constraints.clear();
        self.position_constraints.clear();
    }

    /// Add a body and assign its island index.
    pub(crate) fn add_body(&mut self, id: usize, bodies: &mut Arena<Body>) {
        bodies[id].island_index = self.bodies.len();
        self.bodies.push(id);
    }

    /// Add a contact.
    pub(crate) fn add_contact(&mut self, id: usize) {
        self.contacts.push(id);
    }

    /// Add a joint.
    pub(crate) fn add_joint(&mut self, id: usize) {
        self.joints.push(id);
    }

    /// Solve the island for one step.
    pub(crate) fn solve(
        &mut self,
        step: &TimeStep,
        gravity: Vec2,
        allow_sleep: bool,
        bodies: &mut Arena<Body>,
        contacts: &mut Arena<Contact>,
        joints: &mut Arena<Joint>,
    ) {
        let h = step.dt;

        // Integrate velocities and copy state into the scratch arrays. The
        // start-of-step pose is recorded for continuous collision.
        self.positions.clear();
        self.velocities.clear();
        for i in 0..self.bodies.len() {
            let b = &mut bodies[self.bodies[i]];
            debug_assert_eq!(b.island_index, i);

            b.sweep.c0 = b.sweep.c;
            b.sweep.a0 = b.sweep.a;
            b.sweep.alpha0 = 0.0;

            let c = b.sweep.c;
            let a = b.sweep.a;
            let mut v = b.linear_velocity;
            let mut w = b.angular_velocity;

            if b.body_type == BodyType::Dynamic {
                v += (gravity * b.gravity_scale + b.force * b.inv_mass) * h;
                w += h * b.inv_inertia * b.torque;

                // Solution of dv/dt = -damping * v with a one-step implicit
                // update; stable for any damping value.
                v = v * (1.0 / (1.0 + h * b.linear_damping));
                w *= 1.0 / (1.0 + h * b.angular_damping);
            }

            self.positions.push(Position { c, a });
            self.velocities.push(Velocity { v, w });
        }

        // Build contact constraints and warm start.
        self.init_contact_constraints(step, bodies, contacts);
        if step.warm_starting {
            self.warm_start_contacts();
        }
        for k in 0..self.joints.len() {
            let jid = self.joints[k];
            joints[jid].init_velocity_constraints(
                step,
                bodies,
                &self.positions,
                &mut self.velocities,
            );
        }

        // Velocity iterations.
        for _ in 0..step.velocity_iterations {
            for k in 0..self.joints.len() {
                let jid = self.joints[k];
                joints[jid].solve_velocity_constraints(step, &mut self.velocities);
            }
            self.solve_velocity_constraints();
        }
        self.store_impulses(contacts);

        // Integrate positions with per-step motion clamps.
        for i in 0..self.positions.len() {
            let mut v = self.velocities[i].v;
            let mut w = self.velocities[i].w;

            let translation = v * h;
            if translation.length_squared() > MAX_TRANSLATION_SQUARED {
                v = v * (MAX_TRANSLATION / translation.length());
            }
            let rotation = h * w;
            if rotation * rotation > MAX_ROTATION_SQUARED {
                w *= MAX_ROTATION / rotation.abs();
            }

            self.positions[i].c += v * h;
            self.positions[i].a += h * w;
            self.velocities[i].v = v;
            self.velocities[i].w = w;
        }

        // Position iterations; stop early once contacts and joints agree.
        let mut position_solved = false;
        for _ in 0..step.position_iterations {
            let contacts_okay = self.solve_position_constraints();
            let mut joints_okay = true;
            for k in 0..self.joints.len() {
                let jid = self.joints[k];
                joints_okay &= joints[jid].solve_position_constraints(&mut self.positions);
            }
            if contacts_okay && joints_okay {
                position_solved = true;
                break;
            }
        }

        // Copy state back.
        for i in 0..self.bodies.len() {
            let b = &mut bodies[self.bodies[i]];
            b.sweep.c = self.positions[i].c;
            b.sweep.a = self.positions[i].a;
            b.linear_velocity = self.velocities[i].v;
            b.angular_velocity = self.velocities[i].w;
            b.synchronize_transform();
        }

        // Sleep bookkeeping: an island sleeps only as a whole.
        if allow_sleep {
            let mut min_sleep_time = f32::MAX;
            let lin_tol_sqr = LINEAR_SLEEP_TOLERANCE * LINEAR_SLEEP_TOLERANCE;
            let ang_tol_sqr = ANGULAR_SLEEP_TOLERANCE * ANGULAR_SLEEP_TOLERANCE;

            for &id in &self.bodies {
                let b = &mut bodies[id];
                if b.body_type == BodyType::Static {
                    continue;
                }
                if !b.is_sleeping_allowed()
                    || b.angular_velocity * b.angular_velocity > ang_tol_sqr
                    || b.linear_velocity.length_squared() > lin_tol_sqr
                {
                    b.sleep_time = 0.0;
                    min_sleep_time = 0.0;
                } else {
                    b.sleep_time += h;
                    min_sleep_time = min_sleep_time.min(b.sleep_time);
                }
            }

            if min_sleep_time >= TIME_TO_SLEEP && position_solved {
                for &id in &self.bodies {
                    bodies[id].set_awake(false);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Contact solver
    // ------------------------------------------------------------------

    fn init_contact_constraints(
        &mut self,
        step: &TimeStep,
        bodies: &Arena<Body>,
        contacts: &Arena<Contact>,
    ) {
        self.velocity_constraints.clear();
        self.position_constraints.clear();

        for k in 0..self.contacts.len() {
            let contact = &contacts[self.contacts[k]];
            let manifold = &contact.manifold;
            debug_assert!(manifold.count > 0);

            let body_a = &bodies[contact.fixture_a.body];
            let body_b = &bodies[contact.fixture_b.body];
            let fixture_a = &body_a.fixtures[contact.fixture_a.fixture];
            let fixture_b = &body_b.fixtures[contact.fixture_b.fixture];
            let radius_a = fixture_a.shape.radius();
            let radius_b = fixture_b.shape.radius();

            let index_a = body_a.island_index;
            let index_b = body_b.island_index;

            let mut pc = ContactPositionConstraint {
                local_points: [Vec2::ZERO; MAX_MANIFOLD_POINTS],
                count: manifold.count,
                local_normal: manifold.local_normal,
                local_point: manifold.local_point,
                kind: manifold.kind,
                index_a,
                index_b,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                local_center_a: body_a.sweep.local_center,
                local_center_b: body_b.sweep.local_center,
                radius_a,
                radius_b,
            };
            for (dst, src) in pc
                .local_points
                .iter_mut()
                .zip(manifold.points.iter())
                .take(manifold.count)
            {
                *dst = src.local_point;
            }

            let mut vc = ContactVelocityConstraint {
                points: [VelocityConstraintPoint::default(); MAX_MANIFOLD_POINTS],
                count: manifold.count,
                normal: Vec2::ZERO,
                index_a,
                index_b,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                friction: contact.friction,
                contact_id: self.contacts[k],
            };

            // World-space manifold at the pre-integration poses.
            let xf_a = self.positions[index_a].transform(body_a.sweep.local_center);
            let xf_b = self.positions[index_b].transform(body_b.sweep.local_center);
            let wm = WorldManifold::new(manifold, &xf_a, radius_a, &xf_b, radius_b);
            vc.normal = wm.normal;
            let tangent = vc.normal.perpendicular();

            let c_a = self.positions[index_a].c;
            let c_b = self.positions[index_b].c;
            let v_a = self.velocities[index_a].v;
            let w_a = self.velocities[index_a].w;
            let v_b = self.velocities[index_b].v;
            let w_b = self.velocities[index_b].w;

            for j in 0..manifold.count {
                let vcp = &mut vc.points[j];
                vcp.r_a = wm.points[j] - c_a;
                vcp.r_b = wm.points[j] - c_b;

                let rn_a = vcp.r_a.cross(vc.normal);
                let rn_b = vcp.r_b.cross(vc.normal);
                let k_normal = vc.inv_mass_a
                    + vc.inv_mass_b
                    + vc.inv_i_a * rn_a * rn_a
                    + vc.inv_i_b * rn_b * rn_b;
                vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let rt_a = vcp.r_a.cross(tangent);
                let rt_b = vcp.r_b.cross(tangent);
                let k_tangent = vc.inv_mass_a
                    + vc.inv_mass_b
                    + vc.inv_i_a * rt_a * rt_a
                    + vc.inv_i_b * rt_b * rt_b;
                vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                // Restitution bias for fast approaches.
                vcp.velocity_bias = 0.0;
                let v_rel = vc
                    .normal
                    .dot(v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a));
                if v_rel < -VELOCITY_THRESHOLD {
                    vcp.velocity_bias = -contact.restitution * v_rel;
                }

                // Cached impulses, rescaled for a variable step.
                vcp.normal_impulse = step.dt_ratio * manifold.points[j].normal_impulse;
                vcp.tangent_impulse = step.dt_ratio * manifold.points[j].tangent_impulse;
            }

            self.velocity_constraints.push(vc);
            self.position_constraints.push(pc);
        }
    }

    /// Apply the cached impulses so the velocity iterations start from last
    /// step's solution.
    fn warm_start_contacts(&mut self) {
        for vc in &self.velocity_constraints {
            let tangent = vc.normal.perpendicular();
            for vcp in vc.points.iter().take(vc.count) {
                let p = vc.normal * vcp.normal_impulse + tangent * vcp.tangent_impulse;
                self.velocities[vc.index_a].v -= p * vc.inv_mass_a;
                self.velocities[vc.index_a].w -= vc.inv_i_a * vcp.r_a.cross(p);
                self.velocities[vc.index_b].v += p * vc.inv_mass_b;
                self.velocities[vc.index_b].w += vc.inv_i_b * vcp.r_b.cross(p);
            }
        }
    }

    fn solve_velocity_constraints(&mut self) {
        for vc in &mut self.velocity_constraints {
            let mut v_a = self.velocities[vc.index_a].v;
            let mut w_a = self.velocities[vc.index_a].w;
            let mut v_b = self.velocities[vc.index_b].v;
            let mut w_b = self.velocities[vc.index_b].w;

            let normal = vc.normal;
            let tangent = normal.perpendicular();

            for vcp in vc.points.iter_mut().take(vc.count) {
                // Friction first, clamped by the current normal impulse.
                let dv = v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a);
                let vt = dv.dot(tangent);
                let lambda = vcp.tangent_mass * -vt;

                let max_friction = vc.friction * vcp.normal_impulse;
                let new_impulse = (vcp.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let lambda = new_impulse - vcp.tangent_impulse;
                vcp.tangent_impulse = new_impulse;

                let p = tangent * lambda;
                v_a -= p * vc.inv_mass_a;
                w_a -= vc.inv_i_a * vcp.r_a.cross(p);
                v_b += p * vc.inv_mass_b;
                w_b += vc.inv_i_b * vcp.r_b.cross(p);

                // Normal impulse, accumulated and clamped to be repulsive.
                let dv = v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a);
                let vn = dv.dot(normal);
                let lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);

                let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
                let lambda = new_impulse - vcp.normal_impulse;
                vcp.normal_impulse = new_impulse;

                let p = normal * lambda;
                v_a -= p * vc.inv_mass_a;
                w_a -= vc.inv_i_a * vcp.r_a.cross(p);
                v_b += p * vc.inv_mass_b;
                w_b += vc.inv_i_b * vcp.r_b.cross(p);
            }

            self.velocities[vc.index_a].v = v_a;
            self.velocities[vc.index_a].w = w_a;
            self.velocities[vc.index_b].v = v_b;
            self.velocities[vc.index_b].w = w_b;
        }
    }

    /// Write accumulated impulses back into the manifolds for next step's
    /// warm start.
    fn store_impulses(&self, contacts: &mut Arena<Contact>) {
        for vc in &self.velocity_constraints {
            let manifold = &mut contacts[vc.contact_id].manifold;
            for j in 0..vc.count {
                manifold.points[j].normal_impulse = vc.points[j].normal_impulse;
                manifold.points[j].tangent_impulse = vc.points[j].tangent_impulse;
            }
        }
    }

    /// One pass of non-linear position correction. Returns `true` when the
    /// worst separation is within tolerance.
    fn solve_position_constraints(&mut self) -> bool {
        let mut min_separation = 0.0_f32;

        for pc in &self.position_constraints {
            let mut c_a = self.positions[pc.index_a].c;
            let mut a_a = self.positions[pc.index_a].a;
            let mut c_b = self.positions[pc.index_b].c;
            let mut a_b = self.positions[pc.index_b].a;

            for j in 0..pc.count {
                let xf_a = Position { c: c_a, a: a_a }.transform(pc.local_center_a);
                let xf_b = Position { c: c_b, a: a_b }.transform(pc.local_center_b);

                let psm = PositionSolverManifold::new(pc, &xf_a, &xf_b, j);
                min_separation = min_separation.min(psm.separation);

                // Push out a fraction of the error, capped to avoid overshoot.
                let correction = (BAUMGARTE * (psm.separation + LINEAR_SLOP))
                    .clamp(-MAX_LINEAR_CORRECTION, 0.0);

                let r_a = psm.point - c_a;
                let r_b = psm.point - c_b;
                let rn_a = r_a.cross(psm.normal);
                let rn_b = r_b.cross(psm.normal);
                let k = pc.inv_mass_a
                    + pc.inv_mass_b
                    + pc.inv_i_a * rn_a * rn_a
                    + pc.inv_i_b * rn_b * rn_b;

                let impulse = if k > 0.0 { -correction / k } else { 0.0 };
                let p = psm.normal * impulse;

                c_a -= p * pc.inv_mass_a;
                a_a -= pc.inv_i_a * r_a.cross(p);
                c_b += p * pc.inv_mass_b;
                a_b += pc.inv_i_b * r_b.cross(p);
            }

            self.positions[pc.index_a].c = c_a;
            self.positions[pc.index_a].a = a_a;
            self.positions[pc.index_b].c = c_b;
            self.positions[pc.index_b].a = a_b;
        }

        min_separation >= -3.0 * LINEAR_SLOP
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyDef;
    use crate::broad_phase::FixtureKey;
    use crate::contact::{mix_friction, mix_restitution};
    use crate::fixture::{Fixture, FixtureDef};
    use crate::shape::Shape;

    fn step(dt: f32) -> TimeStep {
        TimeStep {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            dt_ratio: 1.0,
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
        }
    }

    fn circle_body(x: f32, y: f32, body_type: BodyType) -> Body {
        let mut b = Body::new(&BodyDef::new(body_type).with_position(Vec2::new(x, y)));
        b.fixtures
            .push(Fixture::new(FixtureDef::new(Shape::circle(0.5)).with_density(1.0)));
        b.reset_mass_data();
        b
    }

    #[test]
    fn test_free_fall_integration() {
        let mut bodies = Arena::new();
        let mut contacts: Arena<Contact> = Arena::new();
        let mut joints: Arena<Joint> = Arena::new();
        let id = bodies.insert(circle_body(0.0, 10.0, BodyType::Dynamic));

        let mut island = Island::new();
        island.add_body(id, &mut bodies);

        let h = 1.0 / 60.0;
        island.solve(
            &step(h),
            Vec2::new(0.0, -10.0),
            true,
            &mut bodies,
            &mut contacts,
            &mut joints,
        );

        let b = &bodies[id];
        // v = g*h, x = x0 + v*h (semi-implicit Euler).
        assert!((b.linear_velocity().y + 10.0 * h).abs() < 1e-5);
        assert!((b.position().y - (10.0 - 10.0 * h * h)).abs() < 1e-5);
        // Start-of-step pose was recorded for the TOI pass.
        assert!((b.sweep.c0.y - 10.0).abs() < 1e-6);
        assert_eq!(b.sweep.alpha0, 0.0);
    }

    #[test]
    fn test_kinematic_body_ignores_gravity() {
        let mut bodies = Arena::new();
        let mut contacts: Arena<Contact> = Arena::new();
        let mut joints: Arena<Joint> = Arena::new();
        let mut body = circle_body(0.0, 0.0, BodyType::Kinematic);
        body.linear_velocity = Vec2::new(2.0, 0.0);
        let id = bodies.insert(body);

        let mut island = Island::new();
        island.add_body(id, &mut bodies);
        let h = 0.1;
        island.solve(
            &step(h),
            Vec2::new(0.0, -10.0),
            true,
            &mut bodies,
            &mut contacts,
            &mut joints,
        );

        let b = &bodies[id];
        assert_eq!(b.linear_velocity(), Vec2::new(2.0, 0.0));
        assert!((b.position().x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_island_sleeps_after_timeout() {
        let mut bodies = Arena::new();
        let mut contacts: Arena<Contact> = Arena::new();
        let mut joints: Arena<Joint> = Arena::new();
        let id = bodies.insert(circle_body(0.0, 0.0, BodyType::Dynamic));

        let mut island = Island::new();
        let h = 0.1;
        // No gravity, no velocity: accumulate sleep time past the timeout.
        for _ in 0..6 {
            island.clear();
            island.add_body(id, &mut bodies);
            island.solve(
                &step(h),
                Vec2::ZERO,
                true,
                &mut bodies,
                &mut contacts,
                &mut joints,
            );
        }
        assert!(!bodies[id].is_awake());
    }

    #[test]
    fn test_moving_body_does_not_sleep() {
        let mut bodies = Arena::new();
        let mut contacts: Arena<Contact> = Arena::new();
        let mut joints: Arena<Joint> = Arena::new();
        let mut body = circle_body(0.0, 0.0, BodyType::Dynamic);
        body.linear_velocity = Vec2::new(5.0, 0.0);
        let id = bodies.insert(body);

        let mut island = Island::new();
        for _ in 0..10 {
            island.clear();
            island.add_body(id, &mut bodies);
            island.solve(
                &step(0.1),
                Vec2::ZERO,
                true,
                &mut bodies,
                &mut contacts,
                &mut joints,
            );
        }
        assert!(bodies[id].is_awake());
    }

    #[test]
    fn test_contact_stops_approach() {
        let mut bodies = Arena::new();
        let mut contacts: Arena<Contact> = Arena::new();
        let mut joints: Arena<Joint> = Arena::new();

        // A dynamic circle overlapping a static one below it.
        let top = bodies.insert(circle_body(0.0, 0.9, BodyType::Dynamic));
        let bottom = bodies.insert(circle_body(0.0, 0.0, BodyType::Static));
        bodies[top].linear_velocity = Vec2::new(0.0, -2.0);

        let key_a = FixtureKey {
            body: top,
            fixture: 0,
        };
        let key_b = FixtureKey {
            body: bottom,
            fixture: 0,
        };
        let friction = mix_friction(0.2, 0.2);
        let restitution = mix_restitution(0.0, 0.0);
        let mut contact = Contact::new(key_a, key_b, top, bottom, friction, restitution);
        let (xf_a, xf_b) = (bodies[top].transform(), bodies[bottom].transform());
        contact.update(
            0,
            &bodies[top].fixtures[0].shape.clone(),
            &xf_a,
            &bodies[bottom].fixtures[0].shape.clone(),
            &xf_b,
            false,
            None,
        );
        assert!(contact.is_touching());
        let cid = contacts.insert(contact);

        let mut island = Island::new();
        island.add_body(top, &mut bodies);
        island.add_body(bottom, &mut bodies);
        island.add_contact(cid);

        island.solve(
            &step(1.0 / 60.0),
            Vec2::new(0.0, -10.0),
            true,
            &mut bodies,
            &mut contacts,
            &mut joints,
        );

        // The downward approach must be cancelled by the normal impulse.
        assert!(
            bodies[top].linear_velocity().y >= -0.05,
            "vy = {}",
            bodies[top].linear_velocity().y
        );
        // The accumulated impulse was stored for warm starting.
        assert!(contacts[cid].manifold.points[0].normal_impulse > 0.0);
    }
}
