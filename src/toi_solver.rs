//! Time-of-Impact Position Solver
//!
//! Position-only correction applied after a body has been advanced to its
//! time of impact: pushes the swept body out of its contact set so the next
//! discrete step starts from a non-penetrating pose. Velocities are left
//! untouched. Only the swept body moves; its counterparts are treated as
//! infinite mass regardless of type.

use crate::arena::Arena;
use crate::body::Body;
use crate::collide::ManifoldKind;
use crate::contact::Contact;
use crate::math::{Transform, Vec2};
use crate::settings::{LINEAR_SLOP, MAX_LINEAR_CORRECTION, MAX_MANIFOLD_POINTS};

#[derive(Clone, Debug)]
struct ToiConstraint {
    local_points: [Vec2; MAX_MANIFOLD_POINTS],
    count: usize,
    local_normal: Vec2,
    local_point: Vec2,
    kind: ManifoldKind,
    body_a: usize,
    body_b: usize,
    radius_a: f32,
    radius_b: f32,
}

/// World-space view of one constraint point at the current body poses.
struct ToiManifold {
    normal: Vec2,
    point: Vec2,
    separation: f32,
}

impl ToiManifold {
    fn new(c: &ToiConstraint, xf_a: &Transform, xf_b: &Transform, index: usize) -> Self {
        debug_assert!(c.count > 0);
        match c.kind {
            ManifoldKind::Circles => {
                let point_a = xf_a.apply(c.local_point);
                let point_b = xf_b.apply(c.local_points[0]);
                let normal = (point_b - point_a).normalize();
                Self {
                    normal,
                    point: (point_a + point_b) * 0.5,
                    separation: (point_b - point_a).dot(normal) - c.radius_a - c.radius_b,
                }
            }
            ManifoldKind::FaceA => {
                let normal = xf_a.q.apply(c.local_normal);
                let plane_point = xf_a.apply(c.local_point);
                let clip_point = xf_b.apply(c.local_points[index]);
                Self {
                    normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(normal) - c.radius_a - c.radius_b,
                }
            }
            ManifoldKind::FaceB => {
                let normal = xf_b.q.apply(c.local_normal);
                let plane_point = xf_b.apply(c.local_point);
                let clip_point = xf_a.apply(c.local_points[index]);
                Self {
                    normal: -normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(normal) - c.radius_a - c.radius_b,
                }
            }
        }
    }
}

/// Reusable position solver for one swept body against its contact set.
pub(crate) struct ToiSolver {
    constraints: Vec<ToiConstraint>,
    body: usize,
}

impl ToiSolver {
    pub(crate) fn new() -> Self {
        Self {
            constraints: Vec::new(),
            body: usize::MAX,
        }
    }

    /// Build constraints from a set of touching contacts incident to `body`.
    pub(crate) fn initialize(
        &mut self,
        contact_ids: &[usize],
        contacts: &Arena<Contact>,
        bodies: &Arena<Body>,
        body: usize,
    ) {
        self.constraints.clear();
        self.body = body;

        for &cid in contact_ids {
            let contact = &contacts[cid];
            let manifold = &contact.manifold;
            debug_assert!(manifold.count > 0);

            let body_a = &bodies[contact.fixture_a.body];
            let body_b = &bodies[contact.fixture_b.body];
            let fixture_a = &body_a.fixtures[contact.fixture_a.fixture];
            let fixture_b = &body_b.fixtures[contact.fixture_b.fixture];

            let mut constraint = ToiConstraint {
                local_points: [Vec2::ZERO; MAX_MANIFOLD_POINTS],
                count: manifold.count,
                local_normal: manifold.local_normal,
                local_point: manifold.local_point,
                kind: manifold.kind,
                body_a: contact.fixture_a.body,
                body_b: contact.fixture_b.body,
                radius_a: fixture_a.shape.radius(),
                radius_b: fixture_b.shape.radius(),
            };
            for (dst, src) in constraint
                .local_points
                .iter_mut()
                .zip(manifold.points.iter())
                .take(manifold.count)
            {
                *dst = src.local_point;
            }
            self.constraints.push(constraint);
        }
    }

    /// One correction pass. Returns `true` when the worst separation is
    /// within the time-of-impact tolerance.
    pub(crate) fn solve(&self, baumgarte: f32, bodies: &mut Arena<Body>) -> bool {
        let mut min_separation = 0.0_f32;

        for c in &self.constraints {
            // Only the swept body is allowed to move.
            let (inv_mass_a, inv_i_a) = if c.body_a == self.body {
                let b = &bodies[c.body_a];
                (b.inv_mass, b.inv_inertia)
            } else {
                (0.0, 0.0)
            };
            let (inv_mass_b, inv_i_b) = if c.body_b == self.body {
                let b = &bodies[c.body_b];
                (b.inv_mass, b.inv_inertia)
            } else {
                (0.0, 0.0)
            };

            for j in 0..c.count {
                let xf_a = bodies[c.body_a].transform();
                let xf_b = bodies[c.body_b].transform();
                let psm = ToiManifold::new(c, &xf_a, &xf_b, j);
                min_separation = min_separation.min(psm.separation);

                let correction = (baumgarte * (psm.separation + LINEAR_SLOP))
                    .clamp(-MAX_LINEAR_CORRECTION, 0.0);

                let r_a = psm.point - bodies[c.body_a].sweep.c;
                let r_b = psm.point - bodies[c.body_b].sweep.c;
                let rn_a = r_a.cross(psm.normal);
                let rn_b = r_b.cross(psm.normal);
                let k =
                    inv_mass_a + inv_mass_b + inv_i_a * rn_a * rn_a + inv_i_b * rn_b * rn_b;

                let impulse = if k > 0.0 { -correction / k } else { 0.0 };
                let p = psm.normal * impulse;

                if c.body_a == self.body {
                    let b = &mut bodies[c.body_a];
                    b.sweep.c -= p * inv_mass_a;
                    b.sweep.a -= inv_i_a * r_a.cross(p);
                    b.synchronize_transform();
                }
                if c.body_b == self.body {
                    let b = &mut bodies[c.body_b];
                    b.sweep.c += p * inv_mass_b;
                    b.sweep.a += inv_i_b * r_b.cross(p);
                    b.synchronize_transform();
                }
            }
        }

        min_separation >= -1.5 * LINEAR_SLOP
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDef, BodyType};
    use crate::broad_phase::FixtureKey;
    use crate::fixture::{Fixture, FixtureDef};
    use crate::settings::TOI_BAUMGARTE;
    use crate::shape::Shape;

    fn circle_body(x: f32, y: f32, body_type: BodyType) -> Body {
        let mut b = Body::new(&BodyDef::new(body_type).with_position(Vec2::new(x, y)));
        b.fixtures
            .push(Fixture::new(FixtureDef::new(Shape::circle(0.5)).with_density(1.0)));
        b.reset_mass_data();
        b
    }

    #[test]
    fn test_pushes_swept_body_out() {
        let mut bodies = Arena::new();
        let mut contacts: Arena<Contact> = Arena::new();

        // Dynamic circle overlapping a static circle by 0.2.
        let moving = bodies.insert(circle_body(0.0, 0.8, BodyType::Dynamic));
        let ground = bodies.insert(circle_body(0.0, 0.0, BodyType::Static));

        let mut contact = Contact::new(
            FixtureKey {
                body: moving,
                fixture: 0,
            },
            FixtureKey {
                body: ground,
                fixture: 0,
            },
            moving,
            ground,
            0.2,
            0.0,
        );
        let (xf_a, xf_b) = (bodies[moving].transform(), bodies[ground].transform());
        let shape_a = bodies[moving].fixtures[0].shape.clone();
        let shape_b = bodies[ground].fixtures[0].shape.clone();
        contact.update(0, &shape_a, &xf_a, &shape_b, &xf_b, false, None);
        assert!(contact.is_touching());
        let cid = contacts.insert(contact);

        let mut solver = ToiSolver::new();
        solver.initialize(&[cid], &contacts, &bodies, moving);

        let mut solved = false;
        for _ in 0..20 {
            if solver.solve(TOI_BAUMGARTE, &mut bodies) {
                solved = true;
                break;
            }
        }
        assert!(solved, "TOI solver did not converge");

        // The moving body was pushed up and out; the static body stayed put.
        assert!(bodies[moving].position().y > 0.9);
        assert_eq!(bodies[ground].position(), Vec2::ZERO);
        // Velocity is untouched by the position-only solver.
        assert_eq!(bodies[moving].linear_velocity(), Vec2::ZERO);
    }
}
