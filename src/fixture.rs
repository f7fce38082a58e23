//! Fixtures and Collision Filtering
//!
//! A fixture binds a shape to a body and carries the surface material
//! (density, friction, restitution), the sensor flag, and the collision
//! filter. Fixtures are created through the world so the broad-phase proxy
//! and the body's mass data stay consistent.

use crate::broad_phase::NULL_NODE;
use crate::shape::Shape;

// ============================================================================
// Filter
// ============================================================================

/// Collision filter using category/mask bitmasks.
///
/// Two fixtures can collide iff:
///   `(a.category & b.mask) != 0 && (b.category & a.mask) != 0`
///
/// Fixtures sharing the same non-zero group never collide regardless of the
/// masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter {
    /// Which category bit(s) this fixture belongs to
    pub category: u32,
    /// Which categories this fixture collides with
    pub mask: u32,
    /// Collision group id (same non-zero group never collides)
    pub group: u32,
}

impl Filter {
    /// Default filter: category 1, collides with everything.
    pub const DEFAULT: Self = Self {
        category: 1,
        mask: u32::MAX,
        group: 0,
    };

    /// Create a new filter.
    #[inline]
    #[must_use]
    pub const fn new(category: u32, mask: u32) -> Self {
        Self {
            category,
            mask,
            group: 0,
        }
    }

    /// Set the collision group.
    #[inline]
    #[must_use]
    pub const fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// Check whether two filters allow collision.
    #[inline]
    #[must_use]
    pub fn can_collide(a: &Self, b: &Self) -> bool {
        if a.group != 0 && a.group == b.group {
            return false;
        }
        (a.category & b.mask) != 0 && (b.category & a.mask) != 0
    }
}

impl Default for Filter {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// FixtureDef
// ============================================================================

/// Parameters for creating a fixture.
#[derive(Clone, Debug)]
pub struct FixtureDef {
    /// The shape, in body-local coordinates
    pub shape: Shape,
    /// Density in kg/m²
    pub density: f32,
    /// Friction coefficient, usually in `[0, 1]`
    pub friction: f32,
    /// Restitution (bounciness), usually in `[0, 1]`
    pub restitution: f32,
    /// Sensors detect overlap but never generate a collision response
    pub is_sensor: bool,
    /// Collision filter
    pub filter: Filter,
}

impl FixtureDef {
    /// A fixture definition with default material values.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            is_sensor: false,
            filter: Filter::DEFAULT,
        }
    }

    /// Set the density.
    #[must_use]
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Set the friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set the restitution.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Mark the fixture as a sensor.
    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    /// Set the collision filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// A shape attached to a body.
#[derive(Clone, Debug)]
pub struct Fixture {
    /// The shape, in body-local coordinates
    pub shape: Shape,
    /// Density in kg/m²
    pub density: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Restitution
    pub restitution: f32,
    /// Sensor flag
    pub is_sensor: bool,
    /// Collision filter
    pub filter: Filter,
    /// Broad-phase proxy id, [`NULL_NODE`](crate::broad_phase::NULL_NODE)
    /// while the body is inactive
    pub(crate) proxy_id: u32,
}

impl Fixture {
    pub(crate) fn new(def: FixtureDef) -> Self {
        Self {
            shape: def.shape,
            density: def.density,
            friction: def.friction,
            restitution: def.restitution,
            is_sensor: def.is_sensor,
            filter: def.filter,
            proxy_id: NULL_NODE,
        }
    }

    /// Broad-phase proxy id, if the fixture currently has one.
    #[inline]
    #[must_use]
    pub fn proxy_id(&self) -> Option<u32> {
        (self.proxy_id != NULL_NODE).then_some(self.proxy_id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    #[test]
    fn test_filter_default_collides() {
        let a = Filter::DEFAULT;
        let b = Filter::DEFAULT;
        assert!(Filter::can_collide(&a, &b));
    }

    #[test]
    fn test_filter_masks() {
        // Layer 0 = player, layer 1 = enemy, layer 2 = projectile.
        let player = Filter::new(1 << 0, (1 << 1) | (1 << 2));
        let enemy = Filter::new(1 << 1, (1 << 0) | (1 << 2));
        let ghost = Filter::new(1 << 3, 0);
        assert!(Filter::can_collide(&player, &enemy));
        assert!(!Filter::can_collide(&player, &ghost));
        assert!(!Filter::can_collide(&player, &player));
    }

    #[test]
    fn test_filter_group_suppression() {
        let a = Filter::DEFAULT.with_group(7);
        let b = Filter::DEFAULT.with_group(7);
        let c = Filter::DEFAULT.with_group(8);
        assert!(!Filter::can_collide(&a, &b));
        assert!(Filter::can_collide(&a, &c));
    }

    #[test]
    fn test_fixture_def_builder() {
        let def = FixtureDef::new(Shape::circle(1.0))
            .with_density(2.0)
            .with_friction(0.5)
            .with_restitution(0.3)
            .sensor();
        assert_eq!(def.density, 2.0);
        assert_eq!(def.friction, 0.5);
        assert_eq!(def.restitution, 0.3);
        assert!(def.is_sensor);

        let fixture = Fixture::new(def);
        assert!(fixture.proxy_id().is_none());
        assert!(fixture.shape.test_point(&crate::math::Transform::IDENTITY, Vec2::ZERO));
    }
}
