//! Global Tuning Constants
//!
//! Shared numeric constants used across the collision, solver, and stepping
//! modules. These are the usual knobs of an impulse-based 2D engine; they are
//! dimensioned in meters, radians, and seconds.

use core::f32::consts::PI;

/// A small length used as a collision and constraint tolerance. Chosen to be
/// numerically significant but visually insignificant.
pub const LINEAR_SLOP: f32 = 0.005;

/// A small angle used as a constraint tolerance.
pub const ANGULAR_SLOP: f32 = 2.0 / 180.0 * PI;

/// Radius of the polygon/edge shape skin. Polygons keep this buffer around
/// their hull so continuous collision has a non-zero separation target.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Maximum number of vertices on a convex polygon shape.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Maximum number of contact points in a manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of contacts handled by one time-of-impact correction pass.
pub const MAX_TOI_CONTACTS: usize = 32;

/// How much a fat AABB in the broad-phase tree is extended beyond the tight
/// shape AABB.
pub const AABB_EXTENSION: f32 = 0.1;

/// Multiplier applied to a proxy's predicted displacement when fattening its
/// AABB, so fast bodies do not trigger a tree re-insertion every step.
pub const AABB_MULTIPLIER: f32 = 2.0;

/// A velocity threshold for elastic collisions. Collisions with a relative
/// normal speed below this are treated as inelastic.
pub const VELOCITY_THRESHOLD: f32 = 1.0;

/// Maximum linear position correction used by the position solvers.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Maximum translation of a body per step.
pub const MAX_TRANSLATION: f32 = 2.0;

/// Squared form of [`MAX_TRANSLATION`].
pub const MAX_TRANSLATION_SQUARED: f32 = MAX_TRANSLATION * MAX_TRANSLATION;

/// Maximum rotation of a body per step.
pub const MAX_ROTATION: f32 = 0.5 * PI;

/// Squared form of [`MAX_ROTATION`].
pub const MAX_ROTATION_SQUARED: f32 = MAX_ROTATION * MAX_ROTATION;

/// Scale factor of the discrete position solver: how much of the penetration
/// error is resolved per iteration. 1 would fully resolve it but causes
/// overshoot.
pub const BAUMGARTE: f32 = 0.2;

/// Scale factor of the time-of-impact position solver.
pub const TOI_BAUMGARTE: f32 = 0.75;

/// Time a body must be below the sleep tolerances before it is put to sleep.
pub const TIME_TO_SLEEP: f32 = 0.5;

/// Linear speed below which a body can fall asleep.
pub const LINEAR_SLEEP_TOLERANCE: f32 = 0.01;

/// Angular speed below which a body can fall asleep.
pub const ANGULAR_SLEEP_TOLERANCE: f32 = 2.0 / 180.0 * PI;

/// Number of times a single contact may trigger a time-of-impact event per
/// step before it is ignored.
pub const MAX_TOI_COUNT: u32 = 10;

/// Iteration bound for the per-body minimum time-of-impact search.
pub const MAX_TOI_SCANS: u32 = 50;

/// Iteration bound for the time-of-impact position solver.
pub const MAX_TOI_POSITION_ITERATIONS: u32 = 20;
