//! Contact Manager
//!
//! Owns the contact arena and the broad phase, and keeps the contact graph
//! consistent with proxy overlaps: `find_new_contacts` turns new broad-phase
//! pairs into contacts, `collide` refreshes or culls existing contacts, and
//! `destroy` tears one down and unlinks its edges. A contact exists iff its
//! two fixtures' fat AABBs overlap (and filtering allows the pair).

use crate::arena::Arena;
use crate::body::{Body, BodyType};
use crate::broad_phase::{BroadPhase, FixtureKey};
use crate::callbacks::{ContactFilter, ContactListener, DefaultContactFilter};
use crate::contact::{
    edge_contact, edge_id, edge_side, mix_friction, mix_restitution, Contact, FLAG_FILTER,
};
use crate::joint::{self, Joint};
use crate::shape::Shape;

/// Collision priority of a shape: contacts are stored with the higher-ranked
/// shape as fixture A so the narrow phase only needs one collider per pair.
fn shape_rank(shape: &Shape) -> u8 {
    match shape {
        Shape::Circle(_) => 0,
        Shape::Polygon(_) => 1,
        Shape::Edge(_) => 2,
    }
}

/// Contact graph maintenance on top of the broad phase.
pub(crate) struct ContactManager {
    pub(crate) broad_phase: BroadPhase,
    pub(crate) contacts: Arena<Contact>,
    /// Head of the world contact list
    pub(crate) contact_list: Option<usize>,
    pub(crate) filter: Box<dyn ContactFilter>,
    pub(crate) listener: Option<Box<dyn ContactListener>>,
    pending_pairs: Vec<(FixtureKey, FixtureKey)>,
}

impl ContactManager {
    pub(crate) fn new() -> Self {
        Self {
            broad_phase: BroadPhase::new(),
            contacts: Arena::new(),
            contact_list: None,
            filter: Box::new(DefaultContactFilter),
            listener: None,
            pending_pairs: Vec::new(),
        }
    }

    /// Number of live contacts.
    #[inline]
    pub(crate) fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Create contacts for new broad-phase pairs.
    pub(crate) fn find_new_contacts(
        &mut self,
        bodies: &mut Arena<Body>,
        joints: &Arena<Joint>,
    ) {
        let mut pairs = core::mem::take(&mut self.pending_pairs);
        pairs.clear();
        self.broad_phase.update_pairs(|a, b| pairs.push((a, b)));
        for &(key_a, key_b) in &pairs {
            self.add_pair(key_a, key_b, bodies, joints);
        }
        self.pending_pairs = pairs;
    }

    /// Create a contact for a fixture pair unless one exists or the pair is
    /// filtered out.
    fn add_pair(
        &mut self,
        mut key_a: FixtureKey,
        mut key_b: FixtureKey,
        bodies: &mut Arena<Body>,
        joints: &Arena<Joint>,
    ) {
        // Fixtures on the same body never collide.
        if key_a.body == key_b.body {
            return;
        }

        // Does a contact already exist for this fixture pair? Walk the edge
        // list of the body with presumably fewer contacts.
        let mut edge = bodies[key_b.body].contact_list;
        while let Some(e) = edge {
            let contact = &self.contacts[edge_contact(e)];
            let ce = &contact.edges[edge_side(e)];
            if ce.other == key_a.body {
                let fa = contact.fixture_a;
                let fb = contact.fixture_b;
                if (fa == key_a && fb == key_b) || (fa == key_b && fb == key_a) {
                    return;
                }
            }
            edge = contact.edges[edge_side(e)].next;
        }

        // At least one body must be dynamic.
        if !bodies[key_a.body].should_collide_type(&bodies[key_b.body]) {
            return;
        }
        // Joints may suppress collision between their bodies.
        if !should_collide_connected(joints, bodies, key_a.body, key_b.body) {
            return;
        }
        // User filtering.
        if !self.filter.should_collide(
            &bodies[key_a.body].fixtures[key_a.fixture],
            &bodies[key_b.body].fixtures[key_b.fixture],
        ) {
            return;
        }

        // Canonical shape ordering so the narrow phase sees (edge|polygon,
        // circle) and never the reverse.
        let rank_a = shape_rank(&bodies[key_a.body].fixtures[key_a.fixture].shape);
        let rank_b = shape_rank(&bodies[key_b.body].fixtures[key_b.fixture].shape);
        if rank_a < rank_b {
            core::mem::swap(&mut key_a, &mut key_b);
        }

        let fixture_a = &bodies[key_a.body].fixtures[key_a.fixture];
        let fixture_b = &bodies[key_b.body].fixtures[key_b.fixture];
        let friction = mix_friction(fixture_a.friction, fixture_b.friction);
        let restitution = mix_restitution(fixture_a.restitution, fixture_b.restitution);

        let cid = self.contacts.insert(Contact::new(
            key_a,
            key_b,
            key_a.body,
            key_b.body,
            friction,
            restitution,
        ));

        // Push onto the world contact list.
        self.contacts[cid].prev = None;
        self.contacts[cid].next = self.contact_list;
        if let Some(head) = self.contact_list {
            self.contacts[head].prev = Some(cid);
        }
        self.contact_list = Some(cid);

        // Link the two edges into the bodies' contact lists.
        for side in 0..2 {
            let body_id = if side == 0 { key_a.body } else { key_b.body };
            let eid = edge_id(cid, side);
            let head = bodies[body_id].contact_list;
            self.contacts[cid].edges[side].prev = None;
            self.contacts[cid].edges[side].next = head;
            if let Some(h) = head {
                self.contacts[edge_contact(h)].edges[edge_side(h)].prev = Some(eid);
            }
            bodies[body_id].contact_list = Some(eid);
        }
    }

    /// Destroy a contact: report the end of touching, unlink all three lists,
    /// wake the bodies if the contact was doing work.
    pub(crate) fn destroy(&mut self, cid: usize, bodies: &mut Arena<Body>) {
        let (key_a, key_b, touching, manifold_count) = {
            let c = &self.contacts[cid];
            (c.fixture_a, c.fixture_b, c.is_touching(), c.manifold.count)
        };

        if touching {
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.end_contact(cid, &self.contacts[cid]);
            }
        }

        let sensor = bodies[key_a.body].fixtures[key_a.fixture].is_sensor
            || bodies[key_b.body].fixtures[key_b.fixture].is_sensor;
        if manifold_count > 0 && !sensor {
            bodies[key_a.body].set_awake(true);
            bodies[key_b.body].set_awake(true);
        }

        // Unlink from the world list.
        let (prev, next) = {
            let c = &self.contacts[cid];
            (c.prev, c.next)
        };
        if let Some(p) = prev {
            self.contacts[p].next = next;
        } else {
            self.contact_list = next;
        }
        if let Some(n) = next {
            self.contacts[n].prev = prev;
        }

        // Unlink both edges from the bodies' lists.
        for side in 0..2 {
            let body_id = if side == 0 { key_a.body } else { key_b.body };
            let (edge_prev, edge_next) = {
                let e = &self.contacts[cid].edges[side];
                (e.prev, e.next)
            };
            if let Some(p) = edge_prev {
                self.contacts[edge_contact(p)].edges[edge_side(p)].next = edge_next;
            } else {
                bodies[body_id].contact_list = edge_next;
            }
            if let Some(n) = edge_next {
                self.contacts[edge_contact(n)].edges[edge_side(n)].prev = edge_prev;
            }
        }

        self.contacts.remove(cid);
    }

    /// Refresh all contacts: re-filter flagged pairs, cull pairs whose fat
    /// AABBs stopped overlapping, and update the manifolds of the rest.
    pub(crate) fn collide(&mut self, bodies: &mut Arena<Body>, joints: &Arena<Joint>) {
        let mut cid_opt = self.contact_list;
        while let Some(cid) = cid_opt {
            let (key_a, key_b, next, flagged) = {
                let c = &self.contacts[cid];
                (c.fixture_a, c.fixture_b, c.next, c.flags & FLAG_FILTER != 0)
            };
            cid_opt = next;

            if flagged {
                let keep = bodies[key_a.body].should_collide_type(&bodies[key_b.body])
                    && should_collide_connected(joints, bodies, key_a.body, key_b.body)
                    && self.filter.should_collide(
                        &bodies[key_a.body].fixtures[key_a.fixture],
                        &bodies[key_b.body].fixtures[key_b.fixture],
                    );
                if !keep {
                    self.destroy(cid, bodies);
                    continue;
                }
                self.contacts[cid].flags &= !FLAG_FILTER;
            }

            // Skip pairs where neither body is an awake non-static body.
            let active_a = bodies[key_a.body].is_awake()
                && bodies[key_a.body].body_type() != BodyType::Static;
            let active_b = bodies[key_b.body].is_awake()
                && bodies[key_b.body].body_type() != BodyType::Static;
            if !active_a && !active_b {
                continue;
            }

            // Cull when the fat AABBs no longer overlap.
            let proxy_a = bodies[key_a.body].fixtures[key_a.fixture].proxy_id;
            let proxy_b = bodies[key_b.body].fixtures[key_b.fixture].proxy_id;
            if !self.broad_phase.test_overlap(proxy_a, proxy_b) {
                self.destroy(cid, bodies);
                continue;
            }

            self.update_contact(cid, bodies);
        }
    }

    /// Refresh a single contact's manifold and dispatch listener callbacks.
    pub(crate) fn update_contact(&mut self, cid: usize, bodies: &Arena<Body>) {
        let (key_a, key_b) = {
            let c = &self.contacts[cid];
            (c.fixture_a, c.fixture_b)
        };
        let body_a = &bodies[key_a.body];
        let body_b = &bodies[key_b.body];
        let fixture_a = &body_a.fixtures[key_a.fixture];
        let fixture_b = &body_b.fixtures[key_b.fixture];
        let sensor = fixture_a.is_sensor || fixture_b.is_sensor;

        let shape_a = fixture_a.shape.clone();
        let xf_a = body_a.transform();
        let shape_b = fixture_b.shape.clone();
        let xf_b = body_b.transform();
        let listener: Option<&mut dyn ContactListener> = match self.listener {
            Some(ref mut b) => Some(b.as_mut()),
            None => None,
        };
        self.contacts[cid].update(cid, &shape_a, &xf_a, &shape_b, &xf_b, sensor, listener);
    }
}

/// Joints with `collide_connected == false` suppress contacts between their
/// endpoint bodies.
pub(crate) fn should_collide_connected(
    joints: &Arena<Joint>,
    bodies: &Arena<Body>,
    body_a: usize,
    body_b: usize,
) -> bool {
    let mut edge = bodies[body_b].joint_list;
    while let Some(e) = edge {
        let j = &joints[joint::edge_joint(e)];
        let je = &j.edges[joint::edge_side(e)];
        if je.other == body_a && !j.collide_connected {
            return false;
        }
        edge = je.next;
    }
    true
}

// ============================================================================
// Tests
// ============================================================================
