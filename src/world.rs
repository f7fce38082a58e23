//! World — Stepping Core
//!
//! The world owns every entity (bodies, joints, contacts, broad-phase
//! proxies) and advances the simulation: `step` runs the phase sequence
//!
//! ```text
//! (new fixtures?) -> find_new_contacts
//!                 -> collide                 (refresh manifolds)
//!                 -> solve                   (islands, discrete solver)
//!                 -> solve_toi               (continuous collision sweep)
//!                 -> clear forces (if auto)
//! ```
//!
//! The world is locked while user callbacks run; structural mutation while
//! locked is a debug assertion and a silent no-op in release builds.

use crate::arena::Arena;
use crate::body::{Body, BodyDef, BodyType, FLAG_ISLAND as BODY_ISLAND, FLAG_TOI as BODY_TOI};
use crate::broad_phase::FixtureKey;
use crate::callbacks::{ContactFilter, ContactListener, DestructionListener};
use crate::contact::{
    self, Contact, FLAG_BULLET_HIT, FLAG_ENABLED, FLAG_ISLAND as CONTACT_ISLAND,
};
use crate::contact_manager::ContactManager;
use crate::debug_render::{
    DebugColor, DebugDraw, DRAW_AABBS, DRAW_CENTER_OF_MASS, DRAW_JOINTS, DRAW_PAIRS, DRAW_SHAPES,
};
use crate::fixture::{Fixture, FixtureDef};
use crate::island::{Island, TimeStep};
use crate::joint::{self, Joint, JointDef, JointKind};
use crate::math::{Aabb, Transform, Vec2};
use crate::profiling::StepStats;
use crate::settings::{
    MAX_TOI_CONTACTS, MAX_TOI_POSITION_ITERATIONS, MAX_TOI_SCANS, TOI_BAUMGARTE,
};
use crate::shape::{RayCastInput, Shape};
use crate::toi::{time_of_impact, ToiInput, ToiState};
use crate::toi_solver::ToiSolver;

// World flags.
const FLAG_NEW_FIXTURE: u8 = 0x01;
const FLAG_LOCKED: u8 = 0x02;
const FLAG_CLEAR_FORCES: u8 = 0x04;

/// The 2D physics world: entity registries plus the stepping orchestrator.
pub struct World {
    flags: u8,

    gravity: Vec2,
    allow_sleep: bool,
    warm_starting: bool,
    continuous_physics: bool,

    bodies: Arena<Body>,
    body_list: Option<usize>,
    joints: Arena<Joint>,
    joint_list: Option<usize>,
    contact_manager: ContactManager,

    /// Reusable island buffer
    island: Island,
    /// Reusable DFS stack for island building
    stack: Vec<usize>,
    /// Reusable time-of-impact correction set
    toi_contacts: Vec<usize>,
    toi_solver: ToiSolver,

    destruction_listener: Option<Box<dyn DestructionListener>>,
    debug_draw: Option<Box<dyn DebugDraw>>,
    draw_flags: u32,

    /// Inverse of the previous step's dt, for warm-starting across variable
    /// steps
    inv_dt0: f32,
    stats: StepStats,
}

impl World {
    /// Create a world with the given gravity.
    #[must_use]
    pub fn new(gravity: Vec2, allow_sleep: bool) -> Self {
        Self {
            flags: FLAG_CLEAR_FORCES,
            gravity,
            allow_sleep,
            warm_starting: true,
            continuous_physics: true,
            bodies: Arena::new(),
            body_list: None,
            joints: Arena::new(),
            joint_list: None,
            contact_manager: ContactManager::new(),
            island: Island::new(),
            stack: Vec::new(),
            toi_contacts: Vec::new(),
            toi_solver: ToiSolver::new(),
            destruction_listener: None,
            debug_draw: None,
            draw_flags: 0,
            inv_dt0: 0.0,
            stats: StepStats::default(),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Is a user callback currently executing?
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.flags & FLAG_LOCKED != 0
    }

    /// Global gravity vector.
    #[inline]
    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Change the gravity vector.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Is constraint warm starting enabled?
    #[inline]
    #[must_use]
    pub fn warm_starting(&self) -> bool {
        self.warm_starting
    }

    /// Enable or disable constraint warm starting (for testing).
    pub fn set_warm_starting(&mut self, enabled: bool) {
        self.warm_starting = enabled;
    }

    /// Is the continuous collision sweep enabled?
    #[inline]
    #[must_use]
    pub fn continuous_physics(&self) -> bool {
        self.continuous_physics
    }

    /// Enable or disable the continuous collision sweep.
    pub fn set_continuous_physics(&mut self, enabled: bool) {
        self.continuous_physics = enabled;
    }

    /// Are forces cleared automatically at the end of each step?
    #[inline]
    #[must_use]
    pub fn auto_clear_forces(&self) -> bool {
        self.flags & FLAG_CLEAR_FORCES != 0
    }

    /// Control automatic force clearing at the end of each step.
    pub fn set_auto_clear_forces(&mut self, enabled: bool) {
        if enabled {
            self.flags |= FLAG_CLEAR_FORCES;
        } else {
            self.flags &= !FLAG_CLEAR_FORCES;
        }
    }

    /// Install a contact event listener.
    pub fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.contact_manager.listener = Some(listener);
    }

    /// Install a contact filter.
    pub fn set_contact_filter(&mut self, filter: Box<dyn ContactFilter>) {
        self.contact_manager.filter = filter;
    }

    /// Install a destruction listener.
    pub fn set_destruction_listener(&mut self, listener: Box<dyn DestructionListener>) {
        self.destruction_listener = Some(listener);
    }

    /// Install a debug drawer.
    pub fn set_debug_draw(&mut self, draw: Box<dyn DebugDraw>) {
        self.debug_draw = Some(draw);
    }

    /// Set the debug draw flag word.
    pub fn set_draw_flags(&mut self, flags: u32) {
        self.draw_flags = flags;
    }

    /// Counters collected by the most recent `step`.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    // ------------------------------------------------------------------
    // Counts and iteration
    // ------------------------------------------------------------------

    /// Number of bodies.
    #[inline]
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of joints.
    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Number of contacts.
    #[inline]
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.contact_manager.contact_count()
    }

    /// Number of broad-phase proxies.
    #[inline]
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.contact_manager.broad_phase.proxy_count()
    }

    /// Iterate body ids, most recently created first.
    pub fn body_ids(&self) -> impl Iterator<Item = usize> + '_ {
        let mut current = self.body_list;
        core::iter::from_fn(move || {
            let id = current?;
            current = self.bodies[id].next;
            Some(id)
        })
    }

    /// Iterate joint ids.
    pub fn joint_ids(&self) -> impl Iterator<Item = usize> + '_ {
        let mut current = self.joint_list;
        core::iter::from_fn(move || {
            let id = current?;
            current = self.joints[id].next;
            Some(id)
        })
    }

    /// Iterate contact ids.
    pub fn contact_ids(&self) -> impl Iterator<Item = usize> + '_ {
        let mut current = self.contact_manager.contact_list;
        core::iter::from_fn(move || {
            let id = current?;
            current = self.contact_manager.contacts[id].next;
            Some(id)
        })
    }

    /// Borrow a body.
    #[inline]
    #[must_use]
    pub fn body(&self, id: usize) -> &Body {
        &self.bodies[id]
    }

    /// Mutably borrow a body.
    #[inline]
    pub fn body_mut(&mut self, id: usize) -> &mut Body {
        &mut self.bodies[id]
    }

    /// Borrow a joint.
    #[inline]
    #[must_use]
    pub fn joint(&self, id: usize) -> &Joint {
        &self.joints[id]
    }

    /// Mutably borrow a joint.
    #[inline]
    pub fn joint_mut(&mut self, id: usize) -> &mut Joint {
        &mut self.joints[id]
    }

    /// Borrow a contact.
    #[inline]
    #[must_use]
    pub fn contact(&self, id: usize) -> &Contact {
        &self.contact_manager.contacts[id]
    }

    // ------------------------------------------------------------------
    // Body lifecycle
    // ------------------------------------------------------------------

    /// Create a body. Returns `None` while the world is locked.
    pub fn create_body(&mut self, def: &BodyDef) -> Option<usize> {
        debug_assert!(!self.is_locked());
        if self.is_locked() {
            return None;
        }

        let id = self.bodies.insert(Body::new(def));

        // Push at the head of the world body list.
        self.bodies[id].prev = None;
        self.bodies[id].next = self.body_list;
        if let Some(head) = self.body_list {
            self.bodies[head].prev = Some(id);
        }
        self.body_list = Some(id);

        Some(id)
    }

    /// Destroy a body and everything attached to it: joints first (the
    /// destruction listener hears about each), then contacts, then fixtures
    /// with their proxies. No-op while locked.
    pub fn destroy_body(&mut self, id: usize) {
        debug_assert!(!self.is_locked());
        if self.is_locked() || !self.bodies.contains(id) {
            return;
        }

        // The destruction and contact listeners run during teardown.
        self.flags |= FLAG_LOCKED;

        // Joints first: destroying one needs the body's edge list intact.
        let mut je = self.bodies[id].joint_list;
        while let Some(e) = je {
            let jid = joint::edge_joint(e);
            je = self.joints[jid].edges[joint::edge_side(e)].next;
            if let Some(listener) = self.destruction_listener.as_deref_mut() {
                listener.say_goodbye_joint(jid);
            }
            self.destroy_joint_internal(jid);
        }
        debug_assert!(self.bodies[id].joint_list.is_none());

        // Contacts.
        let mut ce = self.bodies[id].contact_list;
        while let Some(e) = ce {
            let cid = contact::edge_contact(e);
            ce = self.contact_manager.contacts[cid].edges[contact::edge_side(e)].next;
            self.contact_manager.destroy(cid, &mut self.bodies);
        }
        debug_assert!(self.bodies[id].contact_list.is_none());

        // Fixtures and their broad-phase proxies.
        for index in 0..self.bodies[id].fixtures.len() {
            if let Some(listener) = self.destruction_listener.as_deref_mut() {
                listener.say_goodbye_fixture(FixtureKey {
                    body: id,
                    fixture: index,
                });
            }
            let proxy = self.bodies[id].fixtures[index].proxy_id;
            if proxy != crate::broad_phase::NULL_NODE {
                self.contact_manager.broad_phase.destroy_proxy(proxy);
            }
        }

        // Unlink from the world list and free the slot.
        let (prev, next) = (self.bodies[id].prev, self.bodies[id].next);
        if let Some(p) = prev {
            self.bodies[p].next = next;
        } else {
            self.body_list = next;
        }
        if let Some(n) = next {
            self.bodies[n].prev = prev;
        }
        self.bodies.remove(id);

        self.flags &= !FLAG_LOCKED;
    }

    /// Attach a fixture to a body. Returns the fixture index, or `None`
    /// while the world is locked.
    pub fn create_fixture(&mut self, body_id: usize, def: FixtureDef) -> Option<usize> {
        debug_assert!(!self.is_locked());
        if self.is_locked() {
            return None;
        }

        let density = def.density;
        let index = self.bodies[body_id].fixtures.len();
        self.bodies[body_id].fixtures.push(Fixture::new(def));

        if self.bodies[body_id].is_active() {
            let xf = self.bodies[body_id].transform();
            let aabb = self.bodies[body_id].fixtures[index].shape.compute_aabb(&xf);
            let proxy = self.contact_manager.broad_phase.create_proxy(
                aabb,
                FixtureKey {
                    body: body_id,
                    fixture: index,
                },
            );
            self.bodies[body_id].fixtures[index].proxy_id = proxy;
        }

        if density > 0.0 {
            self.bodies[body_id].reset_mass_data();
        }

        // Make sure contacts for the new fixture exist before the next solve.
        self.flags |= FLAG_NEW_FIXTURE;
        Some(index)
    }

    /// Move a body to a new pose, teleporting it. No-op while locked.
    pub fn set_body_transform(&mut self, id: usize, position: Vec2, angle: f32) {
        debug_assert!(!self.is_locked());
        if self.is_locked() {
            return;
        }

        let b = &mut self.bodies[id];
        b.xf = Transform::new(position, angle);
        b.sweep.c = b.xf.apply(b.sweep.local_center);
        b.sweep.a = angle;
        b.sweep.c0 = b.sweep.c;
        b.sweep.a0 = angle;
        b.sweep.alpha0 = 0.0;

        let xf = b.xf;
        for index in 0..self.bodies[id].fixtures.len() {
            let proxy = self.bodies[id].fixtures[index].proxy_id;
            if proxy == crate::broad_phase::NULL_NODE {
                continue;
            }
            let aabb = self.bodies[id].fixtures[index].shape.compute_aabb(&xf);
            self.contact_manager.broad_phase.move_proxy(proxy, aabb, Vec2::ZERO);
        }
    }

    /// Activate or deactivate a body. Deactivation destroys the body's
    /// proxies and contacts; activation recreates proxies. No-op while
    /// locked.
    pub fn set_body_active(&mut self, id: usize, active: bool) {
        debug_assert!(!self.is_locked());
        if self.is_locked() || active == self.bodies[id].is_active() {
            return;
        }

        if active {
            self.bodies[id].flags |= crate::body::FLAG_ACTIVE;
            let xf = self.bodies[id].transform();
            for index in 0..self.bodies[id].fixtures.len() {
                let aabb = self.bodies[id].fixtures[index].shape.compute_aabb(&xf);
                let proxy = self.contact_manager.broad_phase.create_proxy(
                    aabb,
                    FixtureKey {
                        body: id,
                        fixture: index,
                    },
                );
                self.bodies[id].fixtures[index].proxy_id = proxy;
            }
            self.flags |= FLAG_NEW_FIXTURE;
        } else {
            self.bodies[id].flags &= !crate::body::FLAG_ACTIVE;
            for index in 0..self.bodies[id].fixtures.len() {
                let proxy = self.bodies[id].fixtures[index].proxy_id;
                if proxy != crate::broad_phase::NULL_NODE {
                    self.contact_manager.broad_phase.destroy_proxy(proxy);
                    self.bodies[id].fixtures[index].proxy_id = crate::broad_phase::NULL_NODE;
                }
            }
            // The contact listener may hear end_contact during teardown.
            self.flags |= FLAG_LOCKED;
            let mut ce = self.bodies[id].contact_list;
            while let Some(e) = ce {
                let cid = contact::edge_contact(e);
                ce = self.contact_manager.contacts[cid].edges[contact::edge_side(e)].next;
                self.contact_manager.destroy(cid, &mut self.bodies);
            }
            self.flags &= !FLAG_LOCKED;
        }
    }

    // ------------------------------------------------------------------
    // Joint lifecycle
    // ------------------------------------------------------------------

    /// Create a joint. Returns `None` while the world is locked.
    pub fn create_joint(&mut self, def: &JointDef) -> Option<usize> {
        debug_assert!(!self.is_locked());
        if self.is_locked() {
            return None;
        }

        let id = self.joints.insert(Joint::new(def));

        // Push at the head of the world joint list.
        self.joints[id].prev = None;
        self.joints[id].next = self.joint_list;
        if let Some(head) = self.joint_list {
            self.joints[head].prev = Some(id);
        }
        self.joint_list = Some(id);

        // Link the edges into the endpoint bodies' joint lists.
        let (body_a, body_b) = (self.joints[id].body_a, self.joints[id].body_b);
        for side in 0..2 {
            let body_id = if side == 0 { body_a } else { body_b };
            let eid = joint::edge_id(id, side);
            let head = self.bodies[body_id].joint_list;
            self.joints[id].edges[side].prev = None;
            self.joints[id].edges[side].next = head;
            if let Some(h) = head {
                self.joints[joint::edge_joint(h)].edges[joint::edge_side(h)].prev = Some(eid);
            }
            self.bodies[body_id].joint_list = Some(eid);
        }

        // Existing contacts between the bodies must be re-filtered so the
        // suppression takes effect at the next collide pass.
        if !self.joints[id].collide_connected {
            self.flag_contacts_for_filtering(body_a, body_b);
        }

        Some(id)
    }

    /// Destroy a joint and wake its endpoint bodies. No-op while locked.
    pub fn destroy_joint(&mut self, id: usize) {
        debug_assert!(!self.is_locked());
        if self.is_locked() || !self.joints.contains(id) {
            return;
        }
        self.destroy_joint_internal(id);
    }

    fn destroy_joint_internal(&mut self, id: usize) {
        let (body_a, body_b, collide_connected) = {
            let j = &self.joints[id];
            (j.body_a, j.body_b, j.collide_connected)
        };

        // Unlink from the world list.
        let (prev, next) = (self.joints[id].prev, self.joints[id].next);
        if let Some(p) = prev {
            self.joints[p].next = next;
        } else {
            self.joint_list = next;
        }
        if let Some(n) = next {
            self.joints[n].prev = prev;
        }

        // Unlink both edges.
        for side in 0..2 {
            let body_id = if side == 0 { body_a } else { body_b };
            let (edge_prev, edge_next) = {
                let e = &self.joints[id].edges[side];
                (e.prev, e.next)
            };
            if let Some(p) = edge_prev {
                self.joints[joint::edge_joint(p)].edges[joint::edge_side(p)].next = edge_next;
            } else {
                self.bodies[body_id].joint_list = edge_next;
            }
            if let Some(n) = edge_next {
                self.joints[joint::edge_joint(n)].edges[joint::edge_side(n)].prev = edge_prev;
            }
        }

        self.joints.remove(id);

        self.bodies[body_a].set_awake(true);
        self.bodies[body_b].set_awake(true);

        // Collisions that were suppressed by this joint must be re-evaluated.
        if !collide_connected {
            self.flag_contacts_for_filtering(body_a, body_b);
        }
    }

    /// Flag every contact between two bodies for re-filtering.
    fn flag_contacts_for_filtering(&mut self, body_a: usize, body_b: usize) {
        let mut ce = self.bodies[body_b].contact_list;
        while let Some(e) = ce {
            let cid = contact::edge_contact(e);
            let side = contact::edge_side(e);
            let other = self.contact_manager.contacts[cid].edges[side].other;
            ce = self.contact_manager.contacts[cid].edges[side].next;
            if other == body_a {
                self.contact_manager.contacts[cid].flag_for_filtering();
            }
        }
    }

    // ------------------------------------------------------------------
    // Forces
    // ------------------------------------------------------------------

    /// Zero all force and torque accumulators. Called automatically at the
    /// end of `step` unless `set_auto_clear_forces(false)`.
    pub fn clear_forces(&mut self) {
        let mut bid = self.body_list;
        while let Some(id) = bid {
            let b = &mut self.bodies[id];
            b.force = Vec2::ZERO;
            b.torque = 0.0;
            bid = b.next;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Visit every fixture whose fat AABB overlaps the query box. The
    /// callback returns `false` to stop the query. Queries never mutate the
    /// world and are safe to issue from inside callbacks.
    pub fn query_aabb<F: FnMut(FixtureKey) -> bool>(&self, aabb: Aabb, mut callback: F) {
        let tree = &self.contact_manager.broad_phase.tree;
        tree.query(&aabb, |proxy| callback(tree.key(proxy)));
    }

    /// Cast a ray from `p1` to `p2` through the world. For every fixture
    /// actually hit, the callback receives `(fixture, point, normal,
    /// fraction)` and returns the new clipping fraction: `0` to stop, the
    /// given fraction to continue, or any smaller value to shorten the ray.
    pub fn ray_cast<F>(&self, p1: Vec2, p2: Vec2, mut callback: F)
    where
        F: FnMut(FixtureKey, Vec2, Vec2, f32) -> f32,
    {
        let input = RayCastInput {
            p1,
            p2,
            max_fraction: 1.0,
        };
        self.contact_manager.broad_phase.ray_cast(&input, |sub, key| {
            let body = &self.bodies[key.body];
            let fixture = &body.fixtures[key.fixture];
            match fixture.shape.ray_cast(sub, &body.transform()) {
                Some(out) => {
                    let point = sub.p1.lerp(sub.p2, out.fraction);
                    callback(key, point, out.normal, out.fraction)
                }
                // Proxy hit but shape missed: keep going, unclipped.
                None => sub.max_fraction,
            }
        });
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// `velocity_iterations` and `position_iterations` bound the constraint
    /// solver. A zero `dt` refreshes contacts but moves nothing and leaves
    /// the warm-starting state untouched.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        self.stats.reset();

        // Contacts for fixtures added since the last step must exist before
        // velocities are integrated.
        if self.flags & FLAG_NEW_FIXTURE != 0 {
            self.contact_manager
                .find_new_contacts(&mut self.bodies, &self.joints);
            self.flags &= !FLAG_NEW_FIXTURE;
        }

        self.flags |= FLAG_LOCKED;

        let step = TimeStep {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            dt_ratio: self.inv_dt0 * dt,
            velocity_iterations,
            position_iterations,
            warm_starting: self.warm_starting,
        };

        // Refresh manifolds (and cull stale pairs).
        self.contact_manager.collide(&mut self.bodies, &self.joints);
        self.stats.contacts_updated = self.contact_manager.contact_count() as u32;

        if step.dt > 0.0 {
            self.solve(&step);
        }

        if self.continuous_physics && step.dt > 0.0 {
            self.solve_toi();
        }

        if step.dt > 0.0 {
            self.inv_dt0 = step.inv_dt;
        }

        // Island membership is per-step state; hand it back clean. Static
        // bodies may keep a stale flag, the solve loop clears it at entry.
        let mut bid = self.body_list;
        while let Some(id) = bid {
            let b = &mut self.bodies[id];
            if b.body_type() != BodyType::Static {
                b.flags &= !BODY_ISLAND;
            }
            bid = b.next;
        }

        if self.flags & FLAG_CLEAR_FORCES != 0 {
            self.clear_forces();
        }

        self.flags &= !FLAG_LOCKED;
    }

    /// Build and solve islands: connected components of awake, active,
    /// non-static bodies linked by touching contacts and joints.
    fn solve(&mut self, step: &TimeStep) {
        // Clear island flags everywhere.
        let mut bid = self.body_list;
        while let Some(id) = bid {
            let b = &mut self.bodies[id];
            b.flags &= !BODY_ISLAND;
            bid = b.next;
        }
        let mut cid = self.contact_manager.contact_list;
        while let Some(id) = cid {
            let c = &mut self.contact_manager.contacts[id];
            c.flags &= !CONTACT_ISLAND;
            cid = c.next;
        }
        let mut jid = self.joint_list;
        while let Some(id) = jid {
            let j = &mut self.joints[id];
            j.island_flag = false;
            jid = j.next;
        }

        // Depth-first traversal from every eligible seed.
        let mut seed_opt = self.body_list;
        while let Some(seed) = seed_opt {
            seed_opt = self.bodies[seed].next;

            let b = &self.bodies[seed];
            if b.flags & BODY_ISLAND != 0
                || !b.is_awake()
                || !b.is_active()
                || b.body_type() == BodyType::Static
            {
                continue;
            }

            self.island.clear();
            self.stack.clear();
            self.stack.push(seed);
            self.bodies[seed].flags |= BODY_ISLAND;

            while let Some(body_id) = self.stack.pop() {
                debug_assert!(self.bodies[body_id].is_active());
                self.island.add_body(body_id, &mut self.bodies);

                // Everything in a moving island must be simulated.
                self.bodies[body_id].set_awake(true);

                // Static bodies bound the island: they may belong to many
                // islands this step, and propagation stops at them.
                if self.bodies[body_id].body_type() == BodyType::Static {
                    continue;
                }

                // Grow over touching contacts.
                let mut edge = self.bodies[body_id].contact_list;
                while let Some(e) = edge {
                    let cid = contact::edge_contact(e);
                    let side = contact::edge_side(e);
                    let (other, next) = {
                        let ce = &self.contact_manager.contacts[cid].edges[side];
                        (ce.other, ce.next)
                    };
                    edge = next;

                    let c = &self.contact_manager.contacts[cid];
                    if c.flags & CONTACT_ISLAND != 0 || !c.is_enabled() || !c.is_touching() {
                        continue;
                    }
                    // Sensors report contacts but never constrain anything.
                    let sensor_a =
                        self.bodies[c.fixture_a.body].fixtures[c.fixture_a.fixture].is_sensor;
                    let sensor_b =
                        self.bodies[c.fixture_b.body].fixtures[c.fixture_b.fixture].is_sensor;
                    if sensor_a || sensor_b {
                        continue;
                    }

                    self.contact_manager.contacts[cid].flags |= CONTACT_ISLAND;
                    self.island.add_contact(cid);

                    if self.bodies[other].flags & BODY_ISLAND == 0 {
                        self.stack.push(other);
                        self.bodies[other].flags |= BODY_ISLAND;
                    }
                }

                // Grow over joints.
                let mut edge = self.bodies[body_id].joint_list;
                while let Some(e) = edge {
                    let jid = joint::edge_joint(e);
                    let side = joint::edge_side(e);
                    let (other, next) = {
                        let je = &self.joints[jid].edges[side];
                        (je.other, je.next)
                    };
                    edge = next;

                    if self.joints[jid].island_flag {
                        continue;
                    }
                    // Joints to inactive bodies are not solved.
                    if !self.bodies[other].is_active() {
                        continue;
                    }

                    self.joints[jid].island_flag = true;
                    self.island.add_joint(jid);

                    if self.bodies[other].flags & BODY_ISLAND == 0 {
                        self.stack.push(other);
                        self.bodies[other].flags |= BODY_ISLAND;
                    }
                }
            }

            self.stats.islands += 1;
            self.stats.island_bodies += self.island.bodies.len() as u32;
            self.stats.island_contacts += self.island.contacts.len() as u32;
            self.stats.island_joints += self.island.joints.len() as u32;

            self.island.solve(
                step,
                self.gravity,
                self.allow_sleep,
                &mut self.bodies,
                &mut self.contact_manager.contacts,
                &mut self.joints,
            );

            // Allow static bodies to participate in other islands this step.
            for i in 0..self.island.bodies.len() {
                let id = self.island.bodies[i];
                if self.bodies[id].body_type() == BodyType::Static {
                    self.bodies[id].flags &= !BODY_ISLAND;
                }
            }
        }

        // Push moved AABBs into the broad phase.
        let mut bid = self.body_list;
        while let Some(id) = bid {
            bid = self.bodies[id].next;
            let b = &self.bodies[id];
            if b.flags & BODY_ISLAND == 0 || b.body_type() == BodyType::Static {
                continue;
            }
            self.synchronize_fixtures(id);
        }

        // Moved bodies may have produced new proxy overlaps.
        self.contact_manager
            .find_new_contacts(&mut self.bodies, &self.joints);
    }

    /// Update the broad-phase proxies of a body from its swept motion.
    fn synchronize_fixtures(&mut self, id: usize) {
        let (xf1, xf2, displacement) = {
            let b = &self.bodies[id];
            let q1 = crate::math::Rot::new(b.sweep.a0);
            let xf1 = Transform {
                p: b.sweep.c0 - q1.apply(b.sweep.local_center),
                q: q1,
            };
            (xf1, b.xf, b.sweep.c - b.sweep.c0)
        };

        for index in 0..self.bodies[id].fixtures.len() {
            let proxy = self.bodies[id].fixtures[index].proxy_id;
            if proxy == crate::broad_phase::NULL_NODE {
                continue;
            }
            let aabb = {
                let shape = &self.bodies[id].fixtures[index].shape;
                shape.compute_aabb(&xf1).union(&shape.compute_aabb(&xf2))
            };
            self.contact_manager
                .broad_phase
                .move_proxy(proxy, aabb, displacement);
        }
    }

    // ------------------------------------------------------------------
    // Continuous collision
    // ------------------------------------------------------------------

    /// The time-of-impact sweep: advance fast bodies to their earliest
    /// impact against already-resolved geometry. Non-bullets go first (they
    /// only collide against static/kinematic bodies), then bullets see the
    /// stable backdrop the first pass produced.
    fn solve_toi(&mut self) {
        // Reset the per-step contact budget.
        let mut cid = self.contact_manager.contact_list;
        while let Some(id) = cid {
            let c = &mut self.contact_manager.contacts[id];
            c.flags |= FLAG_ENABLED;
            c.toi_count = 0;
            cid = c.next;
        }

        // Bodies that did not move this step, and kinematic or static
        // bodies, are already resolved.
        let mut bid = self.body_list;
        while let Some(id) = bid {
            let b = &mut self.bodies[id];
            if b.flags & BODY_ISLAND == 0 || b.body_type() != BodyType::Dynamic {
                b.flags |= BODY_TOI;
            } else {
                b.flags &= !BODY_TOI;
            }
            if b.flags & BODY_ISLAND == 0 {
                // The body did not move: pin its sweep at the current pose so
                // queries against it see a stationary interval, not stale
                // motion from an earlier step.
                b.sweep.c0 = b.sweep.c;
                b.sweep.a0 = b.sweep.a;
                b.sweep.alpha0 = 0.0;
            }
            bid = b.next;
        }

        // First pass: non-bullets against static/kinematic geometry.
        let mut bid = self.body_list;
        while let Some(id) = bid {
            bid = self.bodies[id].next;
            if self.bodies[id].flags & BODY_TOI != 0 || self.bodies[id].is_bullet() {
                continue;
            }
            self.stats.toi_candidates += 1;
            self.solve_toi_body(id);
            self.bodies[id].flags |= BODY_TOI;
        }

        // Second pass: bullets, against everything already resolved.
        let mut bid = self.body_list;
        while let Some(id) = bid {
            bid = self.bodies[id].next;
            if self.bodies[id].flags & BODY_TOI != 0 || !self.bodies[id].is_bullet() {
                continue;
            }
            self.stats.toi_candidates += 1;
            self.solve_toi_body(id);
            self.bodies[id].flags |= BODY_TOI;
        }
    }

    /// Advance one body to its earliest time of impact and push it out of
    /// penetration there.
    fn solve_toi_body(&mut self, body_id: usize) {
        let bullet = self.bodies[body_id].is_bullet();

        // Fixed-point search for the minimum TOI over the body's contacts.
        // Iteration is required because the query may skip intermediate
        // collisions when shapes rotate through each other.
        let mut toi = 1.0_f32;
        let mut toi_contact: Option<usize> = None;
        let mut toi_other: Option<usize> = None;
        let mut iter = 0;

        loop {
            let mut count = 0;
            let mut found = false;

            let mut edge = self.bodies[body_id].contact_list;
            while let Some(e) = edge {
                let cid = contact::edge_contact(e);
                let side = contact::edge_side(e);
                let (other, next) = {
                    let ce = &self.contact_manager.contacts[cid].edges[side];
                    (ce.other, ce.next)
                };
                edge = next;

                if Some(cid) == toi_contact {
                    continue;
                }

                let other_type = self.bodies[other].body_type();
                if bullet {
                    // Bullets only collide against resolved bodies, and only
                    // once against each non-static one.
                    if self.bodies[other].flags & BODY_TOI == 0 {
                        continue;
                    }
                    if other_type != BodyType::Static
                        && self.contact_manager.contacts[cid].flags & FLAG_BULLET_HIT != 0
                    {
                        continue;
                    }
                } else if other_type == BodyType::Dynamic {
                    continue;
                }

                let c = &self.contact_manager.contacts[cid];
                if !c.is_enabled() || c.toi_budget_spent() {
                    continue;
                }
                let key_a = c.fixture_a;
                let key_b = c.fixture_b;
                if self.bodies[key_a.body].fixtures[key_a.fixture].is_sensor
                    || self.bodies[key_b.body].fixtures[key_b.fixture].is_sensor
                {
                    continue;
                }

                // Earliest impact within [0, current minimum].
                let input = ToiInput {
                    proxy_a: self.bodies[key_a.body].fixtures[key_a.fixture]
                        .shape
                        .distance_proxy(),
                    proxy_b: self.bodies[key_b.body].fixtures[key_b.fixture]
                        .shape
                        .distance_proxy(),
                    sweep_a: self.bodies[key_a.body].sweep,
                    sweep_b: self.bodies[key_b.body].sweep,
                    t_max: toi,
                };
                let output = time_of_impact(&input);
                if output.state == ToiState::Touching && output.t < toi {
                    toi_contact = Some(cid);
                    toi = output.t;
                    toi_other = Some(other);
                    found = true;
                }

                count += 1;
            }

            iter += 1;
            if !(found && count > 1 && iter < MAX_TOI_SCANS) {
                break;
            }
        }

        let Some(tc) = toi_contact else {
            // Nothing on the way: take the full step.
            self.bodies[body_id].advance(1.0);
            return;
        };

        // Advance to the impact time and refresh the contact there. The
        // listener may disable it; back up and look for the next candidate.
        let backup = self.bodies[body_id].sweep;
        self.bodies[body_id].advance(toi);
        self.contact_manager.update_contact(tc, &self.bodies);
        if !self.contact_manager.contacts[tc].is_enabled() {
            self.bodies[body_id].sweep = backup;
            self.bodies[body_id].synchronize_transform();
            self.solve_toi_body(body_id);
            return;
        }

        self.contact_manager.contacts[tc].toi_count += 1;
        self.stats.toi_hits += 1;

        // Collect the touching non-dynamic contact set around the body so
        // the correction cannot push it into something else.
        self.toi_contacts.clear();
        let mut edge = self.bodies[body_id].contact_list;
        while let Some(e) = edge {
            if self.toi_contacts.len() == MAX_TOI_CONTACTS {
                break;
            }
            let cid = contact::edge_contact(e);
            let side = contact::edge_side(e);
            let (other, next) = {
                let ce = &self.contact_manager.contacts[cid].edges[side];
                (ce.other, ce.next)
            };
            edge = next;

            if self.bodies[other].body_type() == BodyType::Dynamic {
                continue;
            }
            if !self.contact_manager.contacts[cid].is_enabled() {
                continue;
            }
            let (key_a, key_b) = {
                let c = &self.contact_manager.contacts[cid];
                (c.fixture_a, c.fixture_b)
            };
            if self.bodies[key_a.body].fixtures[key_a.fixture].is_sensor
                || self.bodies[key_b.body].fixtures[key_b.fixture].is_sensor
            {
                continue;
            }

            // Refresh at the advanced pose; the listener may disable here
            // too, which simply drops the contact from the set.
            if cid != tc {
                self.contact_manager.update_contact(cid, &self.bodies);
            }
            let c = &self.contact_manager.contacts[cid];
            if !c.is_enabled() || !c.is_touching() {
                continue;
            }

            self.toi_contacts.push(cid);
        }

        // Reduce the body's overlap with the contact set.
        self.toi_solver.initialize(
            &self.toi_contacts,
            &self.contact_manager.contacts,
            &self.bodies,
            body_id,
        );
        for _ in 0..MAX_TOI_POSITION_ITERATIONS {
            if self.toi_solver.solve(TOI_BAUMGARTE, &mut self.bodies) {
                break;
            }
        }

        // The correction moved the body; keep the broad phase current.
        self.synchronize_fixtures(body_id);

        // One impact per moving counterpart: repeated hits against the same
        // non-static body are culled in later scans.
        if let Some(other) = toi_other {
            if self.bodies[other].body_type() != BodyType::Static {
                self.contact_manager.contacts[tc].flags |= FLAG_BULLET_HIT;
            }
        }
    }

    // ------------------------------------------------------------------
    // Debug drawing
    // ------------------------------------------------------------------

    /// Render the world through the installed debug drawer.
    pub fn draw_debug_data(&mut self) {
        let Some(mut draw) = self.debug_draw.take() else {
            return;
        };
        let flags = self.draw_flags;

        if flags & DRAW_SHAPES != 0 {
            let mut bid = self.body_list;
            while let Some(id) = bid {
                let b = &self.bodies[id];
                bid = b.next;
                let color = if !b.is_active() {
                    DebugColor::new(0.5, 0.5, 0.3)
                } else if b.body_type() == BodyType::Static {
                    DebugColor::new(0.5, 0.9, 0.5)
                } else if b.body_type() == BodyType::Kinematic {
                    DebugColor::new(0.5, 0.5, 0.9)
                } else if !b.is_awake() {
                    DebugColor::new(0.6, 0.6, 0.6)
                } else {
                    DebugColor::new(0.9, 0.7, 0.7)
                };
                for fixture in &b.fixtures {
                    draw_shape(draw.as_mut(), &fixture.shape, &b.xf, color);
                }
            }
        }

        if flags & DRAW_JOINTS != 0 {
            let mut jid = self.joint_list;
            while let Some(id) = jid {
                let j = &self.joints[id];
                jid = j.next;
                self.draw_joint(draw.as_mut(), j);
            }
        }

        if flags & DRAW_PAIRS != 0 {
            // Broad-phase pair rendering was deferred; intentionally empty.
        }

        if flags & DRAW_AABBS != 0 {
            let color = DebugColor::new(0.9, 0.3, 0.9);
            let mut bid = self.body_list;
            while let Some(id) = bid {
                let b = &self.bodies[id];
                bid = b.next;
                if !b.is_active() {
                    continue;
                }
                for fixture in &b.fixtures {
                    if fixture.proxy_id == crate::broad_phase::NULL_NODE {
                        continue;
                    }
                    let aabb = self
                        .contact_manager
                        .broad_phase
                        .tree
                        .fat_aabb(fixture.proxy_id);
                    let vs = [
                        aabb.min,
                        Vec2::new(aabb.max.x, aabb.min.y),
                        aabb.max,
                        Vec2::new(aabb.min.x, aabb.max.y),
                    ];
                    draw.draw_polygon(&vs, color);
                }
            }
        }

        if flags & DRAW_CENTER_OF_MASS != 0 {
            let mut bid = self.body_list;
            while let Some(id) = bid {
                let b = &self.bodies[id];
                bid = b.next;
                let mut xf = b.xf;
                xf.p = b.world_center();
                draw.draw_transform(&xf);
            }
        }

        self.debug_draw = Some(draw);
    }

    fn draw_joint(&self, draw: &mut dyn DebugDraw, joint: &Joint) {
        let body_a = &self.bodies[joint.body_a];
        let body_b = &self.bodies[joint.body_b];
        let (anchor_a, anchor_b) = joint.anchors(body_a, body_b);
        let color = DebugColor::new(0.5, 0.8, 0.8);

        match joint.kind() {
            JointKind::Distance(_) => {
                draw.draw_segment(anchor_a, anchor_b, color);
            }
            JointKind::Mouse(j) => {
                draw.draw_segment(j.target, anchor_b, color);
            }
            JointKind::Revolute(_) => {
                draw.draw_segment(body_a.transform().p, anchor_a, color);
                draw.draw_segment(anchor_a, anchor_b, color);
                draw.draw_segment(body_b.transform().p, anchor_b, color);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_for_testing(&mut self) {
        self.flags |= FLAG_LOCKED;
    }
}

/// Draw one shape under a body transform.
fn draw_shape(draw: &mut dyn DebugDraw, shape: &Shape, xf: &Transform, color: DebugColor) {
    match shape {
        Shape::Circle(c) => {
            let center = xf.apply(c.center);
            draw.draw_solid_circle(center, c.radius, xf.q.x_axis(), color);
        }
        Shape::Polygon(p) => {
            let vertices: Vec<Vec2> = p.vertices.iter().map(|v| xf.apply(*v)).collect();
            draw.draw_solid_polygon(&vertices, color);
        }
        Shape::Edge(e) => {
            draw.draw_segment(xf.apply(e.v1), xf.apply(e.v2), color);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureDef;

    fn dynamic_circle(world: &mut World, x: f32, y: f32, radius: f32) -> usize {
        let id = world
            .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(x, y)))
            .expect("world is unlocked");
        world.create_fixture(id, FixtureDef::new(Shape::circle(radius)).with_density(1.0));
        id
    }

    #[test]
    fn test_new_world_defaults() {
        let world = World::new(Vec2::new(0.0, -10.0), true);
        assert!(world.warm_starting());
        assert!(world.continuous_physics());
        assert!(world.auto_clear_forces());
        assert!(!world.is_locked());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_create_body_pushes_list_head() {
        let mut world = World::new(Vec2::ZERO, true);
        let a = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
        let b = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
        let ids: Vec<usize> = world.body_ids().collect();
        assert_eq!(ids, vec![b, a]);
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_locked_world_rejects_mutation() {
        let mut world = World::new(Vec2::ZERO, true);
        let existing = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();

        world.lock_for_testing();
        assert!(world.is_locked());

        // Creation returns None; destruction is a no-op.
        // (Release-mode contract; these paths debug_assert first.)
        #[cfg(not(debug_assertions))]
        {
            assert!(world.create_body(&BodyDef::new(BodyType::Static)).is_none());
            world.destroy_body(existing);
            assert_eq!(world.body_count(), 1);
        }
        let _ = existing;
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_locked_world_asserts_in_debug() {
        let mut world = World::new(Vec2::ZERO, true);
        world.lock_for_testing();
        let _ = world.create_body(&BodyDef::new(BodyType::Static));
    }

    #[test]
    fn test_destroy_body_tears_down_everything() {
        let mut world = World::new(Vec2::new(0.0, -10.0), true);
        let a = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        let b = dynamic_circle(&mut world, 0.6, 0.0, 0.5);
        let j = world
            .create_joint(&JointDef::Revolute(joint::RevoluteJointDef::new(a, b)))
            .unwrap();

        // One step to build contacts.
        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.proxy_count(), 2);

        world.destroy_body(a);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.contact_count(), 0);
        assert_eq!(world.proxy_count(), 1);
        assert!(world.body(b).joint_list.is_none());
        assert!(world.body(b).contact_list.is_none());
        let _ = j;
    }

    #[test]
    fn test_destruction_listener_hears_joint_and_fixtures() {
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Default)]
        struct Log {
            joints: Vec<usize>,
            fixtures: Vec<FixtureKey>,
        }
        struct Recorder(Rc<RefCell<Log>>);
        impl DestructionListener for Recorder {
            fn say_goodbye_joint(&mut self, joint_id: usize) {
                self.0.borrow_mut().joints.push(joint_id);
            }
            fn say_goodbye_fixture(&mut self, fixture: FixtureKey) {
                self.0.borrow_mut().fixtures.push(fixture);
            }
        }

        let log = Rc::new(RefCell::new(Log::default()));
        let mut world = World::new(Vec2::ZERO, true);
        world.set_destruction_listener(Box::new(Recorder(log.clone())));

        let a = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        let b = dynamic_circle(&mut world, 5.0, 0.0, 0.5);
        let j = world
            .create_joint(&JointDef::Distance(joint::DistanceJointDef::new(a, b, 5.0)))
            .unwrap();

        world.destroy_body(a);
        let log = log.borrow();
        assert_eq!(log.joints, vec![j]);
        assert_eq!(
            log.fixtures,
            vec![FixtureKey {
                body: a,
                fixture: 0
            }]
        );
    }

    #[test]
    fn test_joint_edges_mirrored() {
        let mut world = World::new(Vec2::ZERO, true);
        let a = world.create_body(&BodyDef::new(BodyType::Dynamic)).unwrap();
        let b = world.create_body(&BodyDef::new(BodyType::Dynamic)).unwrap();
        let j = world
            .create_joint(&JointDef::Revolute(joint::RevoluteJointDef::new(a, b)))
            .unwrap();

        let ea = world.body(a).joint_list.expect("edge on body a");
        let eb = world.body(b).joint_list.expect("edge on body b");
        assert_eq!(joint::edge_joint(ea), j);
        assert_eq!(joint::edge_joint(eb), j);
        assert_eq!(world.joint(j).edges[joint::edge_side(ea)].other, b);
        assert_eq!(world.joint(j).edges[joint::edge_side(eb)].other, a);

        world.destroy_joint(j);
        assert!(world.body(a).joint_list.is_none());
        assert!(world.body(b).joint_list.is_none());
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn test_joint_suppresses_contact() {
        let mut world = World::new(Vec2::ZERO, true);
        let a = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        let b = dynamic_circle(&mut world, 0.6, 0.0, 0.5);

        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.contact_count(), 1);

        // A joint with collide_connected == false culls the contact at the
        // next collide pass.
        world
            .create_joint(&JointDef::Revolute(joint::RevoluteJointDef::new(a, b)))
            .unwrap();
        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn test_step_zero_dt_preserves_state() {
        let mut world = World::new(Vec2::new(0.0, -10.0), true);
        let id = dynamic_circle(&mut world, 0.0, 10.0, 0.5);
        let before_pos = world.body(id).position();
        let before_vel = world.body(id).linear_velocity();

        world.step(0.0, 8, 3);

        assert_eq!(world.body(id).position(), before_pos);
        assert_eq!(world.body(id).linear_velocity(), before_vel);
    }

    #[test]
    fn test_inv_dt0_updates_only_on_nonzero_step() {
        let mut world = World::new(Vec2::ZERO, true);
        assert_eq!(world.inv_dt0, 0.0);
        world.step(0.0, 8, 3);
        assert_eq!(world.inv_dt0, 0.0);
        world.step(0.5, 8, 3);
        assert_eq!(world.inv_dt0, 2.0);
        world.step(0.0, 8, 3);
        assert_eq!(world.inv_dt0, 2.0);
    }

    #[test]
    fn test_auto_clear_forces() {
        let mut world = World::new(Vec2::ZERO, true);
        let id = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        world.body_mut(id).apply_force_to_center(Vec2::new(5.0, 0.0));
        world.body_mut(id).apply_torque(2.0);
        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.body(id).force(), Vec2::ZERO);
        assert_eq!(world.body(id).torque(), 0.0);

        // With auto-clear off the accumulators survive the step.
        world.set_auto_clear_forces(false);
        world.body_mut(id).apply_force_to_center(Vec2::new(5.0, 0.0));
        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.body(id).force(), Vec2::new(5.0, 0.0));
        world.clear_forces();
        assert_eq!(world.body(id).force(), Vec2::ZERO);
    }

    #[test]
    fn test_query_aabb_finds_fixture() {
        let mut world = World::new(Vec2::ZERO, true);
        let id = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        dynamic_circle(&mut world, 100.0, 0.0, 0.5);

        let mut hits = Vec::new();
        world.query_aabb(
            Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)),
            |key| {
                hits.push(key.body);
                true
            },
        );
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn test_query_aabb_early_exit() {
        let mut world = World::new(Vec2::ZERO, true);
        dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        dynamic_circle(&mut world, 0.2, 0.0, 0.5);

        let mut count = 0;
        world.query_aabb(
            Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)),
            |_key| {
                count += 1;
                false
            },
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_ray_cast_reports_hit() {
        let mut world = World::new(Vec2::ZERO, true);
        let id = dynamic_circle(&mut world, 5.0, 0.0, 1.0);

        let mut hit = None;
        world.ray_cast(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            |key, point, normal, fraction| {
                hit = Some((key.body, point, normal, fraction));
                fraction
            },
        );
        let (body, point, normal, fraction) = hit.expect("ray should hit the circle");
        assert_eq!(body, id);
        assert!((fraction - 0.4).abs() < 1e-3);
        assert!((point.x - 4.0).abs() < 1e-3);
        assert!(normal.x < -0.99);
    }

    #[test]
    fn test_ray_cast_miss_reports_nothing() {
        let mut world = World::new(Vec2::ZERO, true);
        dynamic_circle(&mut world, 5.0, 10.0, 1.0);

        let mut count = 0;
        world.ray_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), |_k, _p, _n, f| {
            count += 1;
            f
        });
        assert_eq!(count, 0);
    }

    #[test]
    fn test_island_flags_cleared_for_moving_bodies_after_step() {
        let mut world = World::new(Vec2::new(0.0, -10.0), true);
        let id = dynamic_circle(&mut world, 0.0, 10.0, 0.5);
        world.step(1.0 / 60.0, 8, 3);
        // The body was in an island (flag still set is allowed only for
        // statics); the next step's solve relies on clearing at entry, so
        // just verify the step ran and the body moved.
        assert!(world.body(id).position().y < 10.0);
        assert_eq!(world.stats().islands, 1);
        assert_eq!(world.stats().island_bodies, 1);
    }

    #[test]
    fn test_set_body_transform_moves_proxies() {
        let mut world = World::new(Vec2::ZERO, true);
        let id = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        world.set_body_transform(id, Vec2::new(50.0, 0.0), 0.0);

        let mut hits = Vec::new();
        world.query_aabb(
            Aabb::new(Vec2::new(49.0, -1.0), Vec2::new(51.0, 1.0)),
            |key| {
                hits.push(key.body);
                true
            },
        );
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn test_set_body_active_toggles_proxies_and_contacts() {
        let mut world = World::new(Vec2::ZERO, true);
        let a = dynamic_circle(&mut world, 0.0, 0.0, 0.5);
        dynamic_circle(&mut world, 0.6, 0.0, 0.5);
        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.contact_count(), 1);

        world.set_body_active(a, false);
        assert!(!world.body(a).is_active());
        assert_eq!(world.contact_count(), 0);
        assert_eq!(world.proxy_count(), 1);

        world.set_body_active(a, true);
        world.step(1.0 / 60.0, 8, 3);
        assert_eq!(world.contact_count(), 1);
    }
}
