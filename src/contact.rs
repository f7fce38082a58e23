//! Contacts
//!
//! A contact exists for every fixture pair whose broad-phase proxies overlap.
//! It owns the persistent manifold, the touching/enabled/island flag state,
//! the per-step time-of-impact counter, and the two adjacency edges embedded
//! in the endpoint bodies' contact lists.
//!
//! Edges are addressed as `edge_id = 2 * contact_id + side`, which lets a
//! body's edge list be walked without any separate edge allocations.

use crate::broad_phase::FixtureKey;
use crate::callbacks::ContactListener;
use crate::collide::{
    collide_circles, collide_edge_circle, collide_edge_polygon, collide_polygon_circle,
    collide_polygons, Manifold,
};
use crate::math::Transform;
use crate::settings::MAX_TOI_COUNT;
use crate::shape::Shape;
use crate::toi::test_overlap;

// ============================================================================
// Contact flags
// ============================================================================

/// Contact participates in the solver (can be cleared by `pre_solve`).
pub(crate) const FLAG_ENABLED: u8 = 0x01;
/// The shapes are touching.
pub(crate) const FLAG_TOUCHING: u8 = 0x02;
/// Contact is part of the island currently being built.
pub(crate) const FLAG_ISLAND: u8 = 0x04;
/// Contact needs re-filtering at the next collide pass.
pub(crate) const FLAG_FILTER: u8 = 0x08;
/// A bullet already registered a time-of-impact hit on this contact.
pub(crate) const FLAG_BULLET_HIT: u8 = 0x10;

// ============================================================================
// Edge addressing
// ============================================================================

/// Contact id of an edge id.
#[inline]
#[must_use]
pub(crate) fn edge_contact(edge: u32) -> usize {
    (edge >> 1) as usize
}

/// Side (0 or 1) of an edge id.
#[inline]
#[must_use]
pub(crate) fn edge_side(edge: u32) -> usize {
    (edge & 1) as usize
}

/// Edge id from a contact id and side.
#[inline]
#[must_use]
pub(crate) fn edge_id(contact: usize, side: usize) -> u32 {
    (contact as u32) << 1 | side as u32
}

/// Adjacency node embedded in a contact, linking it into one endpoint body's
/// contact list.
#[derive(Clone, Copy, Debug)]
pub struct ContactEdge {
    /// The other endpoint body
    pub other: usize,
    /// Previous edge id in the body's list
    pub prev: Option<u32>,
    /// Next edge id in the body's list
    pub next: Option<u32>,
}

// ============================================================================
// Contact
// ============================================================================

/// A contact between two fixtures.
#[derive(Clone, Debug)]
pub struct Contact {
    pub(crate) flags: u8,

    /// First fixture (canonically ordered: edge before polygon before circle)
    pub(crate) fixture_a: FixtureKey,
    /// Second fixture
    pub(crate) fixture_b: FixtureKey,
    /// Child index on fixture A (shapes here are single-child; kept for the
    /// broad-phase contract)
    pub(crate) child_a: usize,
    /// Child index on fixture B
    pub(crate) child_b: usize,

    /// Persistent manifold
    pub(crate) manifold: Manifold,

    /// Adjacency edges: `edges[0]` lives in body A's list, `edges[1]` in B's
    pub(crate) edges: [ContactEdge; 2],

    /// World contact list links
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,

    /// Mixed friction of the two fixtures
    pub(crate) friction: f32,
    /// Mixed restitution of the two fixtures
    pub(crate) restitution: f32,

    /// Number of time-of-impact events this contact produced this step
    pub(crate) toi_count: u32,
}

/// Friction mixing: geometric mean, so one slippery surface wins.
#[inline]
#[must_use]
pub(crate) fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).sqrt()
}

/// Restitution mixing: the bouncier surface wins.
#[inline]
#[must_use]
pub(crate) fn mix_restitution(a: f32, b: f32) -> f32 {
    a.max(b)
}

impl Contact {
    pub(crate) fn new(
        fixture_a: FixtureKey,
        fixture_b: FixtureKey,
        body_a: usize,
        body_b: usize,
        friction: f32,
        restitution: f32,
    ) -> Self {
        Self {
            flags: FLAG_ENABLED,
            fixture_a,
            fixture_b,
            child_a: 0,
            child_b: 0,
            manifold: Manifold::default(),
            edges: [
                ContactEdge {
                    other: body_b,
                    prev: None,
                    next: None,
                },
                ContactEdge {
                    other: body_a,
                    prev: None,
                    next: None,
                },
            ],
            prev: None,
            next: None,
            friction,
            restitution,
            toi_count: 0,
        }
    }

    /// First fixture of the pair.
    #[inline]
    #[must_use]
    pub fn fixture_a(&self) -> FixtureKey {
        self.fixture_a
    }

    /// Second fixture of the pair.
    #[inline]
    #[must_use]
    pub fn fixture_b(&self) -> FixtureKey {
        self.fixture_b
    }

    /// Child index of the first fixture's shape.
    #[inline]
    #[must_use]
    pub fn child_a(&self) -> usize {
        self.child_a
    }

    /// Child index of the second fixture's shape.
    #[inline]
    #[must_use]
    pub fn child_b(&self) -> usize {
        self.child_b
    }

    /// The persistent manifold.
    #[inline]
    #[must_use]
    pub fn manifold(&self) -> &Manifold {
        &self.manifold
    }

    /// Are the shapes touching?
    #[inline]
    #[must_use]
    pub fn is_touching(&self) -> bool {
        self.flags & FLAG_TOUCHING != 0
    }

    /// Is the contact enabled for solving?
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.flags & FLAG_ENABLED != 0
    }

    /// Enable or disable the contact. Typically called from `pre_solve` to
    /// implement one-way behavior; the flag is re-set every collide pass.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.flags |= FLAG_ENABLED;
        } else {
            self.flags &= !FLAG_ENABLED;
        }
    }

    /// Mixed friction used by the solver.
    #[inline]
    #[must_use]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Override the mixed friction.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    /// Mixed restitution used by the solver.
    #[inline]
    #[must_use]
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Override the mixed restitution.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
    }

    /// Time-of-impact events this contact produced in the current step.
    #[inline]
    #[must_use]
    pub fn toi_count(&self) -> u32 {
        self.toi_count
    }

    /// Has the per-step time-of-impact budget been spent?
    #[inline]
    #[must_use]
    pub(crate) fn toi_budget_spent(&self) -> bool {
        self.toi_count > MAX_TOI_COUNT
    }

    /// Request a filter re-check at the next collide pass (used when joints
    /// that suppress collision are created or destroyed, or the user changed
    /// a filter).
    pub fn flag_for_filtering(&mut self) {
        self.flags |= FLAG_FILTER;
    }

    /// Evaluate the narrow phase for this pair at the given transforms.
    #[must_use]
    pub(crate) fn evaluate(
        &self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
    ) -> Manifold {
        match (shape_a, shape_b) {
            (Shape::Circle(a), Shape::Circle(b)) => collide_circles(a, xf_a, b, xf_b),
            (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_circle(a, xf_a, b, xf_b),
            (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
            (Shape::Edge(a), Shape::Circle(b)) => collide_edge_circle(a, xf_a, b, xf_b),
            (Shape::Edge(a), Shape::Polygon(b)) => collide_edge_polygon(a, xf_a, b, xf_b),
            // Remaining combinations are prevented by canonical ordering at
            // creation; edge vs edge never collides.
            _ => Manifold::default(),
        }
    }

    /// Update the manifold and touching state, preserving accumulated
    /// impulses for matching points, and dispatch listener callbacks.
    ///
    /// Sensor pairs get a boolean overlap test instead of a manifold.
    pub(crate) fn update(
        &mut self,
        contact_id: usize,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
        sensor: bool,
        mut listener: Option<&mut dyn ContactListener>,
    ) {
        let old_manifold = self.manifold;

        // Re-enable: the user can disable it again in pre_solve.
        self.flags |= FLAG_ENABLED;

        let was_touching = self.is_touching();
        let touching;

        if sensor {
            touching = test_overlap(
                &shape_a.distance_proxy(),
                xf_a,
                &shape_b.distance_proxy(),
                xf_b,
            );
            // Sensors never carry a manifold.
            self.manifold.count = 0;
        } else {
            self.manifold = self.evaluate(shape_a, xf_a, shape_b, xf_b);
            touching = self.manifold.count > 0;

            // Match point ids to carry impulses across steps (warm starting).
            for i in 0..self.manifold.count {
                let id = self.manifold.points[i].id;
                for j in 0..old_manifold.count {
                    if old_manifold.points[j].id == id {
                        self.manifold.points[i].normal_impulse =
                            old_manifold.points[j].normal_impulse;
                        self.manifold.points[i].tangent_impulse =
                            old_manifold.points[j].tangent_impulse;
                        break;
                    }
                }
            }
        }

        if touching {
            self.flags |= FLAG_TOUCHING;
        } else {
            self.flags &= !FLAG_TOUCHING;
        }

        if let Some(listener) = listener.as_deref_mut() {
            if !was_touching && touching {
                listener.begin_contact(contact_id, self);
            }
            if was_touching && !touching {
                listener.end_contact(contact_id, self);
            }
            if !sensor && touching {
                listener.pre_solve(contact_id, self, &old_manifold);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    fn key(body: usize) -> FixtureKey {
        FixtureKey { body, fixture: 0 }
    }

    fn test_contact() -> Contact {
        Contact::new(key(0), key(1), 0, 1, 0.5, 0.2)
    }

    #[test]
    fn test_edge_id_roundtrip() {
        for contact in [0usize, 1, 7, 1000] {
            for side in [0usize, 1] {
                let e = edge_id(contact, side);
                assert_eq!(edge_contact(e), contact);
                assert_eq!(edge_side(e), side);
            }
        }
    }

    #[test]
    fn test_mixing_rules() {
        assert!((mix_friction(0.5, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(mix_friction(0.0, 1.0), 0.0);
        assert_eq!(mix_restitution(0.2, 0.8), 0.8);
    }

    #[test]
    fn test_flags() {
        let mut c = test_contact();
        assert!(c.is_enabled());
        assert!(!c.is_touching());
        c.set_enabled(false);
        assert!(!c.is_enabled());
        c.flag_for_filtering();
        assert!(c.flags & FLAG_FILTER != 0);
    }

    #[test]
    fn test_update_touching_and_warm_start_carry() {
        let mut c = test_contact();
        let a = Shape::circle(1.0);
        let b = Shape::circle(1.0);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(1.5, 0.0), 0.0);

        c.update(0, &a, &xf_a, &b, &xf_b, false, None);
        assert!(c.is_touching());
        assert_eq!(c.manifold.count, 1);

        // Fake an accumulated impulse, then update again: it must survive.
        c.manifold.points[0].normal_impulse = 3.0;
        c.update(0, &a, &xf_a, &b, &xf_b, false, None);
        assert_eq!(c.manifold.points[0].normal_impulse, 3.0);

        // Separate: touching clears, manifold empties.
        let far = Transform::new(Vec2::new(10.0, 0.0), 0.0);
        c.update(0, &a, &xf_a, &b, &far, false, None);
        assert!(!c.is_touching());
        assert_eq!(c.manifold.count, 0);
    }

    #[test]
    fn test_update_reenables_contact() {
        let mut c = test_contact();
        c.set_enabled(false);
        let a = Shape::circle(1.0);
        let b = Shape::circle(1.0);
        c.update(
            0,
            &a,
            &Transform::IDENTITY,
            &b,
            &Transform::new(Vec2::new(5.0, 0.0), 0.0),
            false,
            None,
        );
        assert!(c.is_enabled());
    }

    #[test]
    fn test_sensor_update_has_no_manifold() {
        let mut c = test_contact();
        let a = Shape::circle(1.0);
        let b = Shape::circle(1.0);
        let xf_b = Transform::new(Vec2::new(1.0, 0.0), 0.0);
        c.update(0, &a, &Transform::IDENTITY, &b, &xf_b, true, None);
        assert!(c.is_touching());
        assert_eq!(c.manifold.count, 0);
    }

    #[test]
    fn test_update_dispatches_begin_end() {
        #[derive(Default)]
        struct Recorder {
            begins: usize,
            ends: usize,
            pre_solves: usize,
        }
        impl ContactListener for Recorder {
            fn begin_contact(&mut self, _id: usize, _c: &Contact) {
                self.begins += 1;
            }
            fn end_contact(&mut self, _id: usize, _c: &Contact) {
                self.ends += 1;
            }
            fn pre_solve(&mut self, _id: usize, _c: &mut Contact, _old: &Manifold) {
                self.pre_solves += 1;
            }
        }

        let mut rec = Recorder::default();
        let mut c = test_contact();
        let a = Shape::circle(1.0);
        let b = Shape::circle(1.0);
        let near = Transform::new(Vec2::new(1.5, 0.0), 0.0);
        let far = Transform::new(Vec2::new(9.0, 0.0), 0.0);

        c.update(0, &a, &Transform::IDENTITY, &b, &near, false, Some(&mut rec));
        c.update(0, &a, &Transform::IDENTITY, &b, &near, false, Some(&mut rec));
        c.update(0, &a, &Transform::IDENTITY, &b, &far, false, Some(&mut rec));

        assert_eq!(rec.begins, 1);
        assert_eq!(rec.ends, 1);
        assert_eq!(rec.pre_solves, 2);
    }
}
