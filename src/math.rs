//! 2D Math Primitives
//!
//! Vectors, rotations, transforms, swept poses, and axis-aligned boxes used
//! throughout the engine. Rotations are stored as a sine/cosine pair so that
//! transforming a point never re-evaluates trigonometric functions.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// ============================================================================
// Vec2
// ============================================================================

/// 2D column vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector (0, 0)
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit X vector (1, 0)
    pub const UNIT_X: Self = Self { x: 1.0, y: 0.0 };

    /// Unit Y vector (0, 1)
    pub const UNIT_Y: Self = Self { x: 0.0, y: 1.0 };

    /// Create a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared length (avoids sqrt).
    #[inline]
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Length (magnitude).
    #[inline]
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Normalize to unit length. Returns `ZERO` for near-zero vectors.
    #[inline]
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len < f32::EPSILON {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// 2D cross product (returns a scalar: `a.x * b.y - a.y * b.x`).
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Cross a vector with a scalar: `v × s = (s*y, -s*x)`.
    #[inline]
    #[must_use]
    pub fn cross_scalar(self, s: f32) -> Self {
        Self {
            x: s * self.y,
            y: -s * self.x,
        }
    }

    /// Return the perpendicular vector (90 degrees counter-clockwise): `(-y, x)`.
    #[inline]
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Distance to another point.
    #[inline]
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Linear interpolation: `self + (other - self) * t`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
        }
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }

    /// Component-wise absolute value.
    #[inline]
    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            x: self.x.abs(),
            y: self.y.abs(),
        }
    }

    /// Returns `true` if both components are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Cross a scalar with a vector: `s × v = (-s*y, s*x)`.
#[inline]
#[must_use]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2 {
        x: -s * v.y,
        y: s * v.x,
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

// ============================================================================
// Rot — rotation as a sine/cosine pair
// ============================================================================

/// 2D rotation stored as `(sin, cos)` of the angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rot {
    /// Sine of the angle
    pub s: f32,
    /// Cosine of the angle
    pub c: f32,
}

impl Rot {
    /// Identity rotation (angle 0).
    pub const IDENTITY: Self = Self { s: 0.0, c: 1.0 };

    /// Create from an angle in radians.
    #[inline]
    #[must_use]
    pub fn new(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    /// The angle in radians.
    #[inline]
    #[must_use]
    pub fn angle(self) -> f32 {
        self.s.atan2(self.c)
    }

    /// Rotate a vector.
    #[inline]
    #[must_use]
    pub fn apply(self, v: Vec2) -> Vec2 {
        Vec2 {
            x: self.c * v.x - self.s * v.y,
            y: self.s * v.x + self.c * v.y,
        }
    }

    /// Inverse-rotate a vector.
    #[inline]
    #[must_use]
    pub fn apply_inverse(self, v: Vec2) -> Vec2 {
        Vec2 {
            x: self.c * v.x + self.s * v.y,
            y: -self.s * v.x + self.c * v.y,
        }
    }

    /// The local X axis in world coordinates.
    #[inline]
    #[must_use]
    pub fn x_axis(self) -> Vec2 {
        Vec2 {
            x: self.c,
            y: self.s,
        }
    }

    /// The local Y axis in world coordinates.
    #[inline]
    #[must_use]
    pub fn y_axis(self) -> Vec2 {
        Vec2 {
            x: -self.s,
            y: self.c,
        }
    }
}

impl Default for Rot {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Rigid transform: rotation followed by translation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    /// Translation
    pub p: Vec2,
    /// Rotation
    pub q: Rot,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    /// Create from a position and an angle.
    #[inline]
    #[must_use]
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            p: position,
            q: Rot::new(angle),
        }
    }

    /// Transform a local point to world space.
    #[inline]
    #[must_use]
    pub fn apply(self, v: Vec2) -> Vec2 {
        self.q.apply(v) + self.p
    }

    /// Transform a world point to local space.
    #[inline]
    #[must_use]
    pub fn apply_inverse(self, v: Vec2) -> Vec2 {
        self.q.apply_inverse(v - self.p)
    }
}

// ============================================================================
// Sweep — motion of a body over a step
// ============================================================================

/// Describes the motion of a body's center of mass over a time step, used to
/// interpolate poses for continuous collision.
///
/// `alpha0` is the step fraction at which `(c0, a0)` is sampled; `(c, a)` is
/// the pose at the end of the step. The local center is the center of mass in
/// body coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sweep {
    /// Center of mass in local (body) coordinates
    pub local_center: Vec2,
    /// World center of mass at fraction `alpha0`
    pub c0: Vec2,
    /// World center of mass at the end of the step
    pub c: Vec2,
    /// Angle at fraction `alpha0`
    pub a0: f32,
    /// Angle at the end of the step
    pub a: f32,
    /// Step fraction of the `(c0, a0)` sample, in `[0, 1)`
    pub alpha0: f32,
}

impl Sweep {
    /// Interpolated body transform at step fraction `alpha` in `[alpha0, 1]`.
    #[must_use]
    pub fn transform_at(&self, alpha: f32) -> Transform {
        let denom = 1.0 - self.alpha0;
        let beta = if denom > f32::EPSILON {
            ((alpha - self.alpha0) / denom).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let c = self.c0.lerp(self.c, beta);
        let a = self.a0 + beta * (self.a - self.a0);
        let q = Rot::new(a);
        // Shift from center of mass to body origin.
        Transform {
            p: c - q.apply(self.local_center),
            q,
        }
    }

    /// Advance the sweep so that `(c0, a0)` is sampled at `alpha`.
    pub fn advance(&mut self, alpha: f32) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += (self.c - self.c0) * beta;
        self.a0 += beta * (self.a - self.a0);
        self.alpha0 = alpha;
    }

    /// Normalize the angles to avoid precision loss over long simulations.
    pub fn normalize(&mut self) {
        let two_pi = 2.0 * core::f32::consts::PI;
        let d = two_pi * (self.a0 / two_pi).floor();
        self.a0 -= d;
        self.a -= d;
    }
}

// ============================================================================
// Aabb
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Lower bound
    pub min: Vec2,
    /// Upper bound
    pub max: Vec2,
}

impl Aabb {
    /// Create from bounds.
    #[inline]
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Center point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half extents.
    #[inline]
    #[must_use]
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Perimeter (the 2D analogue of surface area, used as the tree cost
    /// metric).
    #[inline]
    #[must_use]
    pub fn perimeter(&self) -> f32 {
        let w = self.max.x - self.min.x;
        let h = self.max.y - self.min.y;
        2.0 * (w + h)
    }

    /// Smallest box containing both boxes.
    #[inline]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns `true` if `other` is fully inside this box.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Returns `true` if the boxes overlap.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        other.min.x <= self.max.x
            && other.min.y <= self.max.y
            && self.min.x <= other.max.x
            && self.min.y <= other.max.y
    }
}

// ============================================================================
// Mat22
// ============================================================================

/// 2×2 matrix stored in column-major order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mat22 {
    /// First column
    pub ex: Vec2,
    /// Second column
    pub ey: Vec2,
}

impl Mat22 {
    /// Create from columns.
    #[inline]
    #[must_use]
    pub const fn new(ex: Vec2, ey: Vec2) -> Self {
        Self { ex, ey }
    }

    /// Multiply by a vector.
    #[inline]
    #[must_use]
    pub fn mul(&self, v: Vec2) -> Vec2 {
        Vec2 {
            x: self.ex.x * v.x + self.ey.x * v.y,
            y: self.ex.y * v.x + self.ey.y * v.y,
        }
    }

    /// Solve `A * x = b` without inverting the whole matrix. Returns `ZERO`
    /// when the matrix is singular.
    #[must_use]
    pub fn solve(&self, b: Vec2) -> Vec2 {
        let a11 = self.ex.x;
        let a12 = self.ey.x;
        let a21 = self.ex.y;
        let a22 = self.ey.y;
        let mut det = a11 * a22 - a12 * a21;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec2 {
            x: det * (a22 * b.x - a12 * b.y),
            y: det * (a11 * b.y - a21 * b.x),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_vec2_arithmetic() {
        let a = Vec2::new(3.0, 5.0);
        let b = Vec2::new(1.0, 2.0);
        assert_eq!(a + b, Vec2::new(4.0, 7.0));
        assert_eq!(a - b, Vec2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 10.0));
        assert_eq!(-a, Vec2::new(-3.0, -5.0));
        assert!(approx(a.dot(b), 13.0));
        assert!(approx(a.cross(b), 1.0));
    }

    #[test]
    fn test_vec2_length_normalize() {
        let v = Vec2::new(3.0, 4.0);
        assert!(approx(v.length(), 5.0));
        let n = v.normalize();
        assert!(approx(n.length(), 1.0));
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_vec2_perpendicular() {
        let v = Vec2::new(3.0, 4.0);
        let p = v.perpendicular();
        assert!(approx(v.dot(p), 0.0));
    }

    #[test]
    fn test_cross_scalar_identities() {
        let v = Vec2::new(2.0, -1.0);
        assert!(approx(cross_sv(3.0, v).dot(v), 0.0));
        assert!(approx(v.cross_scalar(3.0).dot(v), 0.0));
    }

    #[test]
    fn test_rot_apply_inverse_roundtrip() {
        let q = Rot::new(0.7);
        let v = Vec2::new(1.5, -2.5);
        let w = q.apply_inverse(q.apply(v));
        assert!(approx(w.x, v.x) && approx(w.y, v.y));
        assert!(approx(q.angle(), 0.7));
    }

    #[test]
    fn test_transform_roundtrip() {
        let xf = Transform::new(Vec2::new(2.0, 3.0), 1.2);
        let v = Vec2::new(-1.0, 4.0);
        let w = xf.apply_inverse(xf.apply(v));
        assert!(approx(w.x, v.x) && approx(w.y, v.y));
    }

    #[test]
    fn test_sweep_interpolation() {
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: Vec2::new(0.0, 0.0),
            c: Vec2::new(10.0, 0.0),
            a0: 0.0,
            a: 1.0,
            alpha0: 0.0,
        };
        let xf = sweep.transform_at(0.5);
        assert!(approx(xf.p.x, 5.0));
        assert!(approx(xf.q.angle(), 0.5));
    }

    #[test]
    fn test_sweep_advance() {
        let mut sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: Vec2::new(0.0, 0.0),
            c: Vec2::new(10.0, 0.0),
            a0: 0.0,
            a: 0.0,
            alpha0: 0.0,
        };
        sweep.advance(0.25);
        assert!(approx(sweep.c0.x, 2.5));
        assert!(approx(sweep.alpha0, 0.25));
        // Interpolating at the new alpha0 lands on c0.
        let xf = sweep.transform_at(0.25);
        assert!(approx(xf.p.x, 2.5));
    }

    #[test]
    fn test_aabb_union_overlap() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        let b = Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0));
        let c = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let u = a.union(&b);
        assert_eq!(u.min, Vec2::ZERO);
        assert_eq!(u.max, Vec2::new(3.0, 3.0));
        assert!(u.contains(&a) && u.contains(&b));
        assert!(approx(a.perimeter(), 8.0));
    }

    #[test]
    fn test_mat22_solve() {
        let m = Mat22::new(Vec2::new(2.0, 1.0), Vec2::new(1.0, 3.0));
        let b = Vec2::new(5.0, 10.0);
        let x = m.solve(b);
        let back = m.mul(x);
        assert!(approx(back.x, b.x) && approx(back.y, b.y));
    }
}
