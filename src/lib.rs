//! basalt2d: 2D Rigid-Body Physics World
//!
//! An impulse-based 2D physics engine built around a stepping core: bodies
//! carrying fixtures, joints linking them, a contact graph maintained over a
//! dynamic AABB tree, and a per-step pipeline that integrates forces, groups
//! the awake world into islands, solves velocity and position constraints per
//! island, and runs a continuous-collision sweep so fast bodies cannot tunnel
//! through thin geometry.
//!
//! # Features
//!
//! - **Islands**: connected components of awake bodies solved independently
//! - **Warm starting**: impulses persist across (variable) steps
//! - **Continuous collision**: conservative-advancement time of impact with
//!   a two-pass bullet protocol
//! - **Sleeping**: islands at rest drop out of the solver
//! - **Queries**: AABB overlap and ray casts over the broad phase
//!
//! # Example
//!
//! ```rust
//! use basalt2d::{BodyDef, BodyType, FixtureDef, Shape, Vec2, World};
//!
//! // A world with gravity, a ground edge, and a falling box.
//! let mut world = World::new(Vec2::new(0.0, -10.0), true);
//!
//! let ground = world.create_body(&BodyDef::new(BodyType::Static)).unwrap();
//! world.create_fixture(
//!     ground,
//!     FixtureDef::new(Shape::edge(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0))),
//! );
//!
//! let body = world
//!     .create_body(&BodyDef::new(BodyType::Dynamic).with_position(Vec2::new(0.0, 4.0)))
//!     .unwrap();
//! world.create_fixture(body, FixtureDef::new(Shape::boxed(0.5, 0.5)).with_density(1.0));
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0, 8, 3);
//! }
//! assert!(world.body(body).position().y < 4.0);
//! ```
//!
//! # Modules
//!
//! - [`math`]: vectors, rotations, transforms, swept poses, AABBs
//! - [`shape`]: circle, convex polygon, and edge shapes
//! - [`collide`]: narrow phase and persistent manifolds
//! - [`toi`]: GJK distance and time-of-impact queries
//! - [`broad_phase`]: dynamic AABB tree and pair management
//! - [`body`], [`fixture`], [`joint`], [`contact`]: the entity model
//! - [`world`]: registries and the stepping orchestrator
//! - [`callbacks`]: listener and filter traits
//! - [`debug_render`]: wireframe debug drawing interface
//! - [`profiling`]: per-step counters
//! - [`settings`]: shared tuning constants

#![warn(missing_docs)]

mod arena;
pub mod body;
pub mod broad_phase;
pub mod callbacks;
pub mod collide;
pub mod contact;
mod contact_manager;
pub mod debug_render;
pub mod fixture;
mod island;
pub mod joint;
pub mod math;
pub mod profiling;
pub mod settings;
pub mod shape;
pub mod toi;
mod toi_solver;
pub mod world;

// Re-export commonly used types
pub use body::{Body, BodyDef, BodyType};
pub use broad_phase::FixtureKey;
pub use callbacks::{ContactFilter, ContactListener, DefaultContactFilter, DestructionListener};
pub use collide::{Manifold, ManifoldKind, ManifoldPoint, WorldManifold};
pub use contact::Contact;
pub use debug_render::{
    DebugColor, DebugDraw, DRAW_AABBS, DRAW_CENTER_OF_MASS, DRAW_JOINTS, DRAW_PAIRS, DRAW_SHAPES,
};
pub use fixture::{Filter, Fixture, FixtureDef};
pub use joint::{
    DistanceJointDef, Joint, JointDef, JointKind, MouseJointDef, RevoluteJointDef,
};
pub use math::{Aabb, Mat22, Rot, Sweep, Transform, Vec2};
pub use profiling::StepStats;
pub use shape::{
    CircleShape, DistanceProxy, EdgeShape, MassData, PolygonShape, RayCastInput, RayCastOutput,
    Shape,
};
pub use toi::{time_of_impact, DistanceOutput, ToiInput, ToiOutput, ToiState};
pub use world::World;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::body::{Body, BodyDef, BodyType};
    pub use crate::broad_phase::FixtureKey;
    pub use crate::callbacks::{
        ContactFilter, ContactListener, DefaultContactFilter, DestructionListener,
    };
    pub use crate::collide::{Manifold, ManifoldKind, WorldManifold};
    pub use crate::contact::Contact;
    pub use crate::debug_render::{DebugColor, DebugDraw};
    pub use crate::fixture::{Filter, Fixture, FixtureDef};
    pub use crate::joint::{
        DistanceJointDef, Joint, JointDef, JointKind, MouseJointDef, RevoluteJointDef,
    };
    pub use crate::math::{Aabb, Rot, Sweep, Transform, Vec2};
    pub use crate::profiling::StepStats;
    pub use crate::shape::Shape;
    pub use crate::toi::{ToiInput, ToiOutput, ToiState};
    pub use crate::world::World;
}

#[cfg(test)]
mod compile_smoke_tests {
    //! Verify that core types from the prelude and key modules are
    //! accessible. These tests catch accidental breakage of public
    //! re-exports.

    use super::prelude::*;

    #[test]
    fn test_prelude_types_accessible() {
        let _ = Vec2::ZERO;
        let _ = Rot::IDENTITY;
        let _ = Transform::IDENTITY;
        let _ = Filter::DEFAULT;
        let _ = BodyDef::new(BodyType::Dynamic);
        let _ = FixtureDef::new(Shape::circle(1.0));
        let _ = StepStats::default();
    }

    #[test]
    fn test_world_construction() {
        let world = World::new(Vec2::new(0.0, -9.8), true);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.contact_count(), 0);
        assert_eq!(world.proxy_count(), 0);
    }
}
