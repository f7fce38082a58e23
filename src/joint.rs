//! Joints
//!
//! Bilateral constraints linking two bodies. Each joint embeds two adjacency
//! edges (one per endpoint body's joint list), a `collide_connected` flag
//! controlling contact suppression between its bodies, and the island flag
//! used by the step's graph traversal.
//!
//! # Joint Types
//!
//! - **Revolute**: pins two anchor points together (hinge)
//! - **Distance**: keeps two anchor points a fixed distance apart
//! - **Mouse**: soft-drags a body toward a world target point
//!
//! The solver methods operate on the island scratch arrays using each body's
//! island index, accumulate impulses across iterations, and warm-start from
//! the previous step scaled by the step-ratio.

use crate::arena::Arena;
use crate::body::Body;
use crate::island::{Position, TimeStep, Velocity};
use crate::math::{cross_sv, Mat22, Rot, Vec2};
use crate::settings::{LINEAR_SLOP, MAX_LINEAR_CORRECTION};

// ============================================================================
// Edges
// ============================================================================

/// Adjacency node embedded in a joint, linking it into one endpoint body's
/// joint list. Edge ids are `2 * joint_id + side`.
#[derive(Clone, Copy, Debug)]
pub struct JointEdge {
    /// The other endpoint body
    pub other: usize,
    /// Previous edge id in the body's list
    pub prev: Option<u32>,
    /// Next edge id in the body's list
    pub next: Option<u32>,
}

/// Joint id of an edge id.
#[inline]
#[must_use]
pub(crate) fn edge_joint(edge: u32) -> usize {
    (edge >> 1) as usize
}

/// Side (0 or 1) of an edge id.
#[inline]
#[must_use]
pub(crate) fn edge_side(edge: u32) -> usize {
    (edge & 1) as usize
}

/// Edge id from a joint id and side.
#[inline]
#[must_use]
pub(crate) fn edge_id(joint: usize, side: usize) -> u32 {
    (joint as u32) << 1 | side as u32
}

// ============================================================================
// Defs
// ============================================================================

/// Parameters for a revolute (hinge) joint.
#[derive(Clone, Copy, Debug)]
pub struct RevoluteJointDef {
    /// First body id
    pub body_a: usize,
    /// Second body id
    pub body_b: usize,
    /// Anchor in body A's local frame
    pub local_anchor_a: Vec2,
    /// Anchor in body B's local frame
    pub local_anchor_b: Vec2,
    /// Allow the connected bodies to collide?
    pub collide_connected: bool,
}

impl RevoluteJointDef {
    /// A hinge between two bodies with both anchors at their origins.
    #[must_use]
    pub fn new(body_a: usize, body_b: usize) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            collide_connected: false,
        }
    }

    /// Set both local anchors.
    #[must_use]
    pub fn with_local_anchors(mut self, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        self.local_anchor_a = anchor_a;
        self.local_anchor_b = anchor_b;
        self
    }

    /// Allow the connected bodies to collide.
    #[must_use]
    pub fn with_collide_connected(mut self) -> Self {
        self.collide_connected = true;
        self
    }
}

/// Parameters for a distance joint.
#[derive(Clone, Copy, Debug)]
pub struct DistanceJointDef {
    /// First body id
    pub body_a: usize,
    /// Second body id
    pub body_b: usize,
    /// Anchor in body A's local frame
    pub local_anchor_a: Vec2,
    /// Anchor in body B's local frame
    pub local_anchor_b: Vec2,
    /// Rest length between the anchors
    pub length: f32,
    /// Allow the connected bodies to collide?
    pub collide_connected: bool,
}

impl DistanceJointDef {
    /// A distance joint with anchors at the body origins.
    #[must_use]
    pub fn new(body_a: usize, body_b: usize, length: f32) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            length,
            collide_connected: false,
        }
    }

    /// Set both local anchors.
    #[must_use]
    pub fn with_local_anchors(mut self, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        self.local_anchor_a = anchor_a;
        self.local_anchor_b = anchor_b;
        self
    }

    /// Allow the connected bodies to collide.
    #[must_use]
    pub fn with_collide_connected(mut self) -> Self {
        self.collide_connected = true;
        self
    }
}

/// Parameters for a mouse (target) joint. `body_a` is a ground body; the
/// constraint pulls `body_b`'s anchor toward the target.
#[derive(Clone, Copy, Debug)]
pub struct MouseJointDef {
    /// Ground body id
    pub body_a: usize,
    /// Dragged body id
    pub body_b: usize,
    /// World target point
    pub target: Vec2,
    /// Maximum constraint force in newtons
    pub max_force: f32,
    /// Response frequency in hertz
    pub frequency_hz: f32,
    /// Damping ratio (1 = critically damped)
    pub damping_ratio: f32,
}

impl MouseJointDef {
    /// A mouse joint pulling `body_b` toward `target`.
    #[must_use]
    pub fn new(body_a: usize, body_b: usize, target: Vec2) -> Self {
        Self {
            body_a,
            body_b,
            target,
            max_force: 0.0,
            frequency_hz: 5.0,
            damping_ratio: 0.7,
        }
    }

    /// Set the maximum force.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f32) -> Self {
        self.max_force = max_force;
        self
    }
}

/// Parameters for creating any joint.
#[derive(Clone, Copy, Debug)]
pub enum JointDef {
    /// Revolute joint parameters
    Revolute(RevoluteJointDef),
    /// Distance joint parameters
    Distance(DistanceJointDef),
    /// Mouse joint parameters
    Mouse(MouseJointDef),
}

impl JointDef {
    pub(crate) fn body_a(&self) -> usize {
        match self {
            Self::Revolute(d) => d.body_a,
            Self::Distance(d) => d.body_a,
            Self::Mouse(d) => d.body_a,
        }
    }

    pub(crate) fn body_b(&self) -> usize {
        match self {
            Self::Revolute(d) => d.body_b,
            Self::Distance(d) => d.body_b,
            Self::Mouse(d) => d.body_b,
        }
    }

    pub(crate) fn collide_connected(&self) -> bool {
        match self {
            Self::Revolute(d) => d.collide_connected,
            Self::Distance(d) => d.collide_connected,
            Self::Mouse(_) => false,
        }
    }
}

// ============================================================================
// Joint kinds
// ============================================================================

/// Revolute joint runtime state.
#[derive(Clone, Copy, Debug)]
pub struct RevoluteJoint {
    /// Anchor in body A's local frame
    pub local_anchor_a: Vec2,
    /// Anchor in body B's local frame
    pub local_anchor_b: Vec2,
    impulse: Vec2,
    // Solver temporaries, valid between init and the last iteration.
    index_a: usize,
    index_b: usize,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    r_a: Vec2,
    r_b: Vec2,
    mass: Mat22,
}

/// Distance joint runtime state.
#[derive(Clone, Copy, Debug)]
pub struct DistanceJoint {
    /// Anchor in body A's local frame
    pub local_anchor_a: Vec2,
    /// Anchor in body B's local frame
    pub local_anchor_b: Vec2,
    /// Rest length
    pub length: f32,
    impulse: f32,
    index_a: usize,
    index_b: usize,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    mass: f32,
}

/// Mouse joint runtime state.
#[derive(Clone, Copy, Debug)]
pub struct MouseJoint {
    /// Anchor in body B's local frame
    pub local_anchor_b: Vec2,
    /// World target point
    pub target: Vec2,
    /// Maximum force
    pub max_force: f32,
    /// Response frequency in hertz
    pub frequency_hz: f32,
    /// Damping ratio
    pub damping_ratio: f32,
    impulse: Vec2,
    index_b: usize,
    local_center_b: Vec2,
    inv_mass_b: f32,
    inv_i_b: f32,
    r_b: Vec2,
    mass: Mat22,
    c: Vec2,
    gamma: f32,
    beta: f32,
}

impl MouseJoint {
    /// Move the drag target.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }
}

/// Kind-specific joint state.
#[derive(Clone, Copy, Debug)]
pub enum JointKind {
    /// Revolute joint
    Revolute(RevoluteJoint),
    /// Distance joint
    Distance(DistanceJoint),
    /// Mouse joint
    Mouse(MouseJoint),
}

// ============================================================================
// Joint
// ============================================================================

/// A bilateral constraint between two bodies. Owned by the world arena.
#[derive(Clone, Debug)]
pub struct Joint {
    /// Kind-specific state
    pub(crate) kind: JointKind,
    pub(crate) body_a: usize,
    pub(crate) body_b: usize,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,
    /// `edges[0]` lives in body A's joint list, `edges[1]` in B's
    pub(crate) edges: [JointEdge; 2],
    /// World joint list links
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl Joint {
    pub(crate) fn new(def: &JointDef) -> Self {
        let kind = match def {
            JointDef::Revolute(d) => JointKind::Revolute(RevoluteJoint {
                local_anchor_a: d.local_anchor_a,
                local_anchor_b: d.local_anchor_b,
                impulse: Vec2::ZERO,
                index_a: 0,
                index_b: 0,
                local_center_a: Vec2::ZERO,
                local_center_b: Vec2::ZERO,
                inv_mass_a: 0.0,
                inv_mass_b: 0.0,
                inv_i_a: 0.0,
                inv_i_b: 0.0,
                r_a: Vec2::ZERO,
                r_b: Vec2::ZERO,
                mass: Mat22::default(),
            }),
            JointDef::Distance(d) => JointKind::Distance(DistanceJoint {
                local_anchor_a: d.local_anchor_a,
                local_anchor_b: d.local_anchor_b,
                length: d.length,
                impulse: 0.0,
                index_a: 0,
                index_b: 0,
                local_center_a: Vec2::ZERO,
                local_center_b: Vec2::ZERO,
                inv_mass_a: 0.0,
                inv_mass_b: 0.0,
                inv_i_a: 0.0,
                inv_i_b: 0.0,
                u: Vec2::ZERO,
                r_a: Vec2::ZERO,
                r_b: Vec2::ZERO,
                mass: 0.0,
            }),
            JointDef::Mouse(d) => JointKind::Mouse(MouseJoint {
                local_anchor_b: Vec2::ZERO,
                target: d.target,
                max_force: d.max_force,
                frequency_hz: d.frequency_hz,
                damping_ratio: d.damping_ratio,
                impulse: Vec2::ZERO,
                index_b: 0,
                local_center_b: Vec2::ZERO,
                inv_mass_b: 0.0,
                inv_i_b: 0.0,
                r_b: Vec2::ZERO,
                mass: Mat22::default(),
                c: Vec2::ZERO,
                gamma: 0.0,
                beta: 0.0,
            }),
        };

        Self {
            kind,
            body_a: def.body_a(),
            body_b: def.body_b(),
            collide_connected: def.collide_connected(),
            island_flag: false,
            edges: [
                JointEdge {
                    other: def.body_b(),
                    prev: None,
                    next: None,
                },
                JointEdge {
                    other: def.body_a(),
                    prev: None,
                    next: None,
                },
            ],
            prev: None,
            next: None,
        }
    }

    /// First endpoint body id.
    #[inline]
    #[must_use]
    pub fn body_a(&self) -> usize {
        self.body_a
    }

    /// Second endpoint body id.
    #[inline]
    #[must_use]
    pub fn body_b(&self) -> usize {
        self.body_b
    }

    /// Do the connected bodies collide with each other?
    #[inline]
    #[must_use]
    pub fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    /// Kind-specific state.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    /// Mutable kind-specific state (e.g. to move a mouse joint's target).
    #[inline]
    pub fn kind_mut(&mut self) -> &mut JointKind {
        &mut self.kind
    }

    /// World anchor points on body A and body B.
    #[must_use]
    pub fn anchors(&self, body_a: &Body, body_b: &Body) -> (Vec2, Vec2) {
        match &self.kind {
            JointKind::Revolute(j) => (
                body_a.world_point(j.local_anchor_a),
                body_b.world_point(j.local_anchor_b),
            ),
            JointKind::Distance(j) => (
                body_a.world_point(j.local_anchor_a),
                body_b.world_point(j.local_anchor_b),
            ),
            JointKind::Mouse(j) => (j.target, body_b.world_point(j.local_anchor_b)),
        }
    }

    // ------------------------------------------------------------------
    // Solver
    // ------------------------------------------------------------------

    pub(crate) fn init_velocity_constraints(
        &mut self,
        step: &TimeStep,
        bodies: &Arena<Body>,
        positions: &[Position],
        velocities: &mut [Velocity],
    ) {
        let body_a = &bodies[self.body_a];
        let body_b = &bodies[self.body_b];

        match &mut self.kind {
            JointKind::Revolute(j) => {
                j.index_a = body_a.island_index;
                j.index_b = body_b.island_index;
                j.local_center_a = body_a.sweep.local_center;
                j.local_center_b = body_b.sweep.local_center;
                j.inv_mass_a = body_a.inv_mass;
                j.inv_mass_b = body_b.inv_mass;
                j.inv_i_a = body_a.inv_inertia;
                j.inv_i_b = body_b.inv_inertia;

                let q_a = Rot::new(positions[j.index_a].a);
                let q_b = Rot::new(positions[j.index_b].a);
                j.r_a = q_a.apply(j.local_anchor_a - j.local_center_a);
                j.r_b = q_b.apply(j.local_anchor_b - j.local_center_b);

                let (m_a, m_b, i_a, i_b) = (j.inv_mass_a, j.inv_mass_b, j.inv_i_a, j.inv_i_b);
                j.mass = Mat22::new(
                    Vec2::new(
                        m_a + m_b + i_a * j.r_a.y * j.r_a.y + i_b * j.r_b.y * j.r_b.y,
                        -i_a * j.r_a.x * j.r_a.y - i_b * j.r_b.x * j.r_b.y,
                    ),
                    Vec2::new(
                        -i_a * j.r_a.x * j.r_a.y - i_b * j.r_b.x * j.r_b.y,
                        m_a + m_b + i_a * j.r_a.x * j.r_a.x + i_b * j.r_b.x * j.r_b.x,
                    ),
                );

                if step.warm_starting {
                    j.impulse = j.impulse * step.dt_ratio;
                    let p = j.impulse;
                    velocities[j.index_a].v -= p * m_a;
                    velocities[j.index_a].w -= i_a * j.r_a.cross(p);
                    velocities[j.index_b].v += p * m_b;
                    velocities[j.index_b].w += i_b * j.r_b.cross(p);
                } else {
                    j.impulse = Vec2::ZERO;
                }
            }
            JointKind::Distance(j) => {
                j.index_a = body_a.island_index;
                j.index_b = body_b.island_index;
                j.local_center_a = body_a.sweep.local_center;
                j.local_center_b = body_b.sweep.local_center;
                j.inv_mass_a = body_a.inv_mass;
                j.inv_mass_b = body_b.inv_mass;
                j.inv_i_a = body_a.inv_inertia;
                j.inv_i_b = body_b.inv_inertia;

                let q_a = Rot::new(positions[j.index_a].a);
                let q_b = Rot::new(positions[j.index_b].a);
                j.r_a = q_a.apply(j.local_anchor_a - j.local_center_a);
                j.r_b = q_b.apply(j.local_anchor_b - j.local_center_b);
                j.u = positions[j.index_b].c + j.r_b - positions[j.index_a].c - j.r_a;

                let length = j.u.length();
                j.u = if length > LINEAR_SLOP {
                    j.u / length
                } else {
                    Vec2::ZERO
                };

                let cr_a = j.r_a.cross(j.u);
                let cr_b = j.r_b.cross(j.u);
                let inv_mass = j.inv_mass_a
                    + j.inv_i_a * cr_a * cr_a
                    + j.inv_mass_b
                    + j.inv_i_b * cr_b * cr_b;
                j.mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };

                if step.warm_starting {
                    j.impulse *= step.dt_ratio;
                    let p = j.u * j.impulse;
                    velocities[j.index_a].v -= p * j.inv_mass_a;
                    velocities[j.index_a].w -= j.inv_i_a * j.r_a.cross(p);
                    velocities[j.index_b].v += p * j.inv_mass_b;
                    velocities[j.index_b].w += j.inv_i_b * j.r_b.cross(p);
                } else {
                    j.impulse = 0.0;
                }
            }
            JointKind::Mouse(j) => {
                j.index_b = body_b.island_index;
                j.local_center_b = body_b.sweep.local_center;
                j.inv_mass_b = body_b.inv_mass;
                j.inv_i_b = body_b.inv_inertia;

                let mass = body_b.mass;
                let omega = 2.0 * core::f32::consts::PI * j.frequency_hz;
                let d = 2.0 * mass * j.damping_ratio * omega;
                let k = mass * omega * omega;

                let h = step.dt;
                let mut gamma = h * (d + h * k);
                if gamma != 0.0 {
                    gamma = 1.0 / gamma;
                }
                j.gamma = gamma;
                j.beta = h * k * gamma;

                let q_b = Rot::new(positions[j.index_b].a);
                j.r_b = q_b.apply(j.local_anchor_b - j.local_center_b);

                let (m_b, i_b) = (j.inv_mass_b, j.inv_i_b);
                j.mass = Mat22::new(
                    Vec2::new(m_b + i_b * j.r_b.y * j.r_b.y + j.gamma, -i_b * j.r_b.x * j.r_b.y),
                    Vec2::new(-i_b * j.r_b.x * j.r_b.y, m_b + i_b * j.r_b.x * j.r_b.x + j.gamma),
                );

                j.c = (positions[j.index_b].c + j.r_b - j.target) * j.beta;

                // Slow the body down a little while dragged.
                velocities[j.index_b].w *= 0.98;

                if step.warm_starting {
                    j.impulse = j.impulse * step.dt_ratio;
                    velocities[j.index_b].v += j.impulse * m_b;
                    velocities[j.index_b].w += i_b * j.r_b.cross(j.impulse);
                } else {
                    j.impulse = Vec2::ZERO;
                }
            }
        }
    }

    pub(crate) fn solve_velocity_constraints(
        &mut self,
        step: &TimeStep,
        velocities: &mut [Velocity],
    ) {
        match &mut self.kind {
            JointKind::Revolute(j) => {
                let v_a = velocities[j.index_a].v;
                let w_a = velocities[j.index_a].w;
                let v_b = velocities[j.index_b].v;
                let w_b = velocities[j.index_b].w;

                let cdot = v_b + cross_sv(w_b, j.r_b) - v_a - cross_sv(w_a, j.r_a);
                let impulse = j.mass.solve(-cdot);
                j.impulse += impulse;

                velocities[j.index_a].v = v_a - impulse * j.inv_mass_a;
                velocities[j.index_a].w = w_a - j.inv_i_a * j.r_a.cross(impulse);
                velocities[j.index_b].v = v_b + impulse * j.inv_mass_b;
                velocities[j.index_b].w = w_b + j.inv_i_b * j.r_b.cross(impulse);
            }
            JointKind::Distance(j) => {
                let v_a = velocities[j.index_a].v;
                let w_a = velocities[j.index_a].w;
                let v_b = velocities[j.index_b].v;
                let w_b = velocities[j.index_b].w;

                let vp_a = v_a + cross_sv(w_a, j.r_a);
                let vp_b = v_b + cross_sv(w_b, j.r_b);
                let cdot = j.u.dot(vp_b - vp_a);

                let impulse = -j.mass * cdot;
                j.impulse += impulse;
                let p = j.u * impulse;

                velocities[j.index_a].v = v_a - p * j.inv_mass_a;
                velocities[j.index_a].w = w_a - j.inv_i_a * j.r_a.cross(p);
                velocities[j.index_b].v = v_b + p * j.inv_mass_b;
                velocities[j.index_b].w = w_b + j.inv_i_b * j.r_b.cross(p);
            }
            JointKind::Mouse(j) => {
                let v_b = velocities[j.index_b].v;
                let w_b = velocities[j.index_b].w;

                let cdot = v_b + cross_sv(w_b, j.r_b);
                let mut impulse = j.mass.solve(-(cdot + j.c + j.impulse * j.gamma));

                let old_impulse = j.impulse;
                j.impulse += impulse;
                let max_impulse = step.dt * j.max_force;
                if j.impulse.length_squared() > max_impulse * max_impulse {
                    j.impulse = j.impulse * (max_impulse / j.impulse.length());
                }
                impulse = j.impulse - old_impulse;

                velocities[j.index_b].v = v_b + impulse * j.inv_mass_b;
                velocities[j.index_b].w = w_b + j.inv_i_b * j.r_b.cross(impulse);
            }
        }
    }

    /// Returns `true` when the position error is within tolerance.
    pub(crate) fn solve_position_constraints(&mut self, positions: &mut [Position]) -> bool {
        match &mut self.kind {
            JointKind::Revolute(j) => {
                let q_a = Rot::new(positions[j.index_a].a);
                let q_b = Rot::new(positions[j.index_b].a);
                let r_a = q_a.apply(j.local_anchor_a - j.local_center_a);
                let r_b = q_b.apply(j.local_anchor_b - j.local_center_b);

                let c = positions[j.index_b].c + r_b - positions[j.index_a].c - r_a;
                let position_error = c.length();

                let (m_a, m_b, i_a, i_b) = (j.inv_mass_a, j.inv_mass_b, j.inv_i_a, j.inv_i_b);
                let k = Mat22::new(
                    Vec2::new(
                        m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y,
                        -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y,
                    ),
                    Vec2::new(
                        -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y,
                        m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x,
                    ),
                );
                let impulse = -k.solve(c);

                positions[j.index_a].c -= impulse * m_a;
                positions[j.index_a].a -= i_a * r_a.cross(impulse);
                positions[j.index_b].c += impulse * m_b;
                positions[j.index_b].a += i_b * r_b.cross(impulse);

                position_error <= LINEAR_SLOP
            }
            JointKind::Distance(j) => {
                let q_a = Rot::new(positions[j.index_a].a);
                let q_b = Rot::new(positions[j.index_b].a);
                let r_a = q_a.apply(j.local_anchor_a - j.local_center_a);
                let r_b = q_b.apply(j.local_anchor_b - j.local_center_b);

                let mut u = positions[j.index_b].c + r_b - positions[j.index_a].c - r_a;
                let length = u.length();
                u = u.normalize();
                let c = (length - j.length).clamp(-MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);

                let impulse = -j.mass * c;
                let p = u * impulse;

                positions[j.index_a].c -= p * j.inv_mass_a;
                positions[j.index_a].a -= j.inv_i_a * r_a.cross(p);
                positions[j.index_b].c += p * j.inv_mass_b;
                positions[j.index_b].a += j.inv_i_b * r_b.cross(p);

                c.abs() < LINEAR_SLOP
            }
            // The mouse joint is a soft velocity constraint only.
            JointKind::Mouse(_) => true,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDef, BodyType};
    use crate::fixture::{Fixture, FixtureDef};
    use crate::shape::Shape;

    fn solver_setup() -> (Arena<Body>, Vec<Position>, Vec<Velocity>) {
        let mut bodies = Arena::new();
        for i in 0..2 {
            let def = BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(i as f32 * 2.0, 0.0));
            let mut body = Body::new(&def);
            body.fixtures
                .push(Fixture::new(FixtureDef::new(Shape::circle(0.5))));
            body.reset_mass_data();
            body.island_index = i;
            bodies.insert(body);
        }
        let positions = (0..2)
            .map(|i| Position {
                c: Vec2::new(i as f32 * 2.0, 0.0),
                a: 0.0,
            })
            .collect();
        let velocities = (0..2)
            .map(|_| Velocity {
                v: Vec2::ZERO,
                w: 0.0,
            })
            .collect();
        (bodies, positions, velocities)
    }

    fn step() -> TimeStep {
        TimeStep {
            dt: 1.0 / 60.0,
            inv_dt: 60.0,
            dt_ratio: 1.0,
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
        }
    }

    #[test]
    fn test_joint_edge_id_roundtrip() {
        let e = edge_id(42, 1);
        assert_eq!(edge_joint(e), 42);
        assert_eq!(edge_side(e), 1);
    }

    #[test]
    fn test_revolute_removes_relative_anchor_velocity() {
        let (bodies, positions, mut velocities) = solver_setup();
        // Bodies moving apart.
        velocities[0].v = Vec2::new(-1.0, 0.0);
        velocities[1].v = Vec2::new(1.0, 0.0);

        let def = JointDef::Revolute(
            RevoluteJointDef::new(0, 1)
                .with_local_anchors(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0)),
        );
        let mut joint = Joint::new(&def);
        let ts = step();
        joint.init_velocity_constraints(&ts, &bodies, &positions, &mut velocities);
        for _ in 0..8 {
            joint.solve_velocity_constraints(&ts, &mut velocities);
        }

        // The shared anchor point must move identically on both bodies.
        let (j, r_a, r_b) = match &joint.kind {
            JointKind::Revolute(j) => (j, j.r_a, j.r_b),
            _ => unreachable!(),
        };
        let vp_a = velocities[j.index_a].v + cross_sv(velocities[j.index_a].w, r_a);
        let vp_b = velocities[j.index_b].v + cross_sv(velocities[j.index_b].w, r_b);
        assert!((vp_b - vp_a).length() < 1e-3);
    }

    #[test]
    fn test_distance_position_correction() {
        let (bodies, mut positions, mut velocities) = solver_setup();
        // Anchors 2 apart, rest length 1: the joint must pull them together.
        let def = JointDef::Distance(DistanceJointDef::new(0, 1, 1.0));
        let mut joint = Joint::new(&def);
        let ts = step();
        joint.init_velocity_constraints(&ts, &bodies, &positions, &mut velocities);
        for _ in 0..20 {
            joint.solve_position_constraints(&mut positions);
        }
        let dist = positions[0].c.distance_to(positions[1].c);
        assert!((dist - 1.0).abs() < 0.02, "distance = {dist}");
    }

    #[test]
    fn test_mouse_joint_pulls_toward_target() {
        let (bodies, positions, mut velocities) = solver_setup();
        let def = JointDef::Mouse(
            MouseJointDef::new(0, 1, Vec2::new(10.0, 0.0)).with_max_force(1000.0),
        );
        let mut joint = Joint::new(&def);
        let ts = step();
        joint.init_velocity_constraints(&ts, &bodies, &positions, &mut velocities);
        for _ in 0..8 {
            joint.solve_velocity_constraints(&ts, &mut velocities);
        }
        // Body 1 should have gained velocity toward the target (+x).
        assert!(velocities[1].v.x > 0.0);
    }

    #[test]
    fn test_warm_start_scales_by_dt_ratio() {
        let (bodies, positions, mut velocities) = solver_setup();
        let def = JointDef::Distance(DistanceJointDef::new(0, 1, 2.0));
        let mut joint = Joint::new(&def);

        if let JointKind::Distance(j) = &mut joint.kind {
            j.impulse = 10.0;
        }
        let ts = TimeStep {
            dt_ratio: 0.5,
            ..step()
        };
        joint.init_velocity_constraints(&ts, &bodies, &positions, &mut velocities);
        if let JointKind::Distance(j) = &joint.kind {
            assert!((j.impulse - 5.0).abs() < 1e-6);
        }
    }
}
