//! World Callbacks
//!
//! Trait objects the host installs on the world: contact filtering, contact
//! events, and destruction notifications. Callbacks receive entity ids and
//! data references — never the world itself — so structural mutation from
//! inside a callback is impossible by construction; the world additionally
//! holds its lock flag for the duration of a dispatch.

use crate::broad_phase::FixtureKey;
use crate::collide::Manifold;
use crate::contact::Contact;
use crate::fixture::{Filter, Fixture};

/// Receives contact lifecycle events during stepping.
///
/// All methods are called while the world is locked.
pub trait ContactListener {
    /// Two fixtures began touching.
    fn begin_contact(&mut self, _contact_id: usize, _contact: &Contact) {}

    /// Two fixtures stopped touching.
    fn end_contact(&mut self, _contact_id: usize, _contact: &Contact) {}

    /// The manifold was refreshed and the contact is about to be solved.
    /// Disable the contact here (`contact.set_enabled(false)`) for one-way
    /// behavior; the flag is restored on the next refresh.
    fn pre_solve(&mut self, _contact_id: usize, _contact: &mut Contact, _old_manifold: &Manifold) {}
}

/// Decides whether two fixtures should generate a contact at all.
pub trait ContactFilter {
    /// Return `false` to suppress collision for this fixture pair.
    fn should_collide(&self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool {
        Filter::can_collide(&fixture_a.filter, &fixture_b.filter)
    }
}

/// The bitmask-based default filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultContactFilter;

impl ContactFilter for DefaultContactFilter {}

/// Notified just before the world implicitly destroys attached objects
/// (joints and fixtures torn down by `destroy_body`).
pub trait DestructionListener {
    /// A joint is about to be destroyed because one of its bodies is.
    fn say_goodbye_joint(&mut self, _joint_id: usize) {}

    /// A fixture is about to be destroyed because its body is.
    fn say_goodbye_fixture(&mut self, _fixture: FixtureKey) {}
}
