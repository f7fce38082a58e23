//! Collision Shapes
//!
//! Circle, convex polygon, and edge (line segment) shapes. Shapes are defined
//! in body-local coordinates and are immutable once attached to a fixture.
//! Each shape can compute its mass properties, its world-space AABB under a
//! transform, and ray intersections, and can be reduced to a point cloud
//! ([`DistanceProxy`]) for distance and time-of-impact queries.

use crate::math::{Aabb, Transform, Vec2};
use crate::settings::POLYGON_RADIUS;

// ============================================================================
// Ray casting input/output
// ============================================================================

/// Input for a ray (segment) cast: from `p1` toward `p2`, clipped to
/// `max_fraction` of the segment.
#[derive(Clone, Copy, Debug)]
pub struct RayCastInput {
    /// Segment start point
    pub p1: Vec2,
    /// Segment end point
    pub p2: Vec2,
    /// Fraction of the segment to consider, in `[0, 1]`
    pub max_fraction: f32,
}

/// Result of a successful ray cast. The hit point is
/// `p1 + fraction * (p2 - p1)`.
#[derive(Clone, Copy, Debug)]
pub struct RayCastOutput {
    /// Surface normal at the hit point
    pub normal: Vec2,
    /// Fraction along the input segment
    pub fraction: f32,
}

/// Mass properties of a shape at a given density.
#[derive(Clone, Copy, Debug, Default)]
pub struct MassData {
    /// Total mass in kilograms
    pub mass: f32,
    /// Center of mass in local coordinates
    pub center: Vec2,
    /// Rotational inertia about the local origin
    pub inertia: f32,
}

// ============================================================================
// Circle
// ============================================================================

/// Circle shape with a local-space center offset.
#[derive(Clone, Copy, Debug)]
pub struct CircleShape {
    /// Center in local coordinates
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl CircleShape {
    /// Create a circle centered on the body origin.
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self {
            center: Vec2::ZERO,
            radius,
        }
    }

    fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let p = xf.apply(self.center);
        let r = Vec2::new(self.radius, self.radius);
        Aabb::new(p - r, p + r)
    }

    fn compute_mass(&self, density: f32) -> MassData {
        let mass = density * core::f32::consts::PI * self.radius * self.radius;
        MassData {
            mass,
            center: self.center,
            // I = m * (r^2 / 2 + |c|^2) about the body origin
            inertia: mass * (0.5 * self.radius * self.radius + self.center.length_squared()),
        }
    }

    fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        let center = xf.apply(self.center);
        (p - center).length_squared() <= self.radius * self.radius
    }

    fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let position = xf.apply(self.center);
        let s = input.p1 - position;
        let b = s.length_squared() - self.radius * self.radius;

        let r = input.p2 - input.p1;
        let c = s.dot(r);
        let rr = r.length_squared();
        let sigma = c * c - rr * b;
        if sigma < 0.0 || rr < f32::EPSILON {
            return None;
        }

        // Earliest intersection of the quadratic.
        let t = -(c + sigma.sqrt());
        if 0.0 <= t && t <= input.max_fraction * rr {
            let fraction = t / rr;
            Some(RayCastOutput {
                normal: (s + r * fraction).normalize(),
                fraction,
            })
        } else {
            None
        }
    }
}

// ============================================================================
// Polygon
// ============================================================================

/// Convex polygon shape with counter-clockwise winding.
#[derive(Clone, Debug)]
pub struct PolygonShape {
    /// Vertices in counter-clockwise order
    pub vertices: Vec<Vec2>,
    /// Outward edge normals, `normals[i]` belongs to edge `(i, i+1)`
    pub normals: Vec<Vec2>,
    /// Centroid in local coordinates
    pub centroid: Vec2,
}

impl PolygonShape {
    /// Create from vertices in counter-clockwise order. The caller must
    /// supply a convex hull; winding and convexity are checked only in debug
    /// builds.
    #[must_use]
    pub fn new(vertices: Vec<Vec2>) -> Self {
        debug_assert!(vertices.len() >= 3);
        debug_assert!(vertices.len() <= crate::settings::MAX_POLYGON_VERTICES);
        let n = vertices.len();
        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            debug_assert!(edge.length_squared() > f32::EPSILON);
            normals.push(Vec2::new(edge.y, -edge.x).normalize());
        }
        let centroid = compute_centroid(&vertices);
        Self {
            vertices,
            normals,
            centroid,
        }
    }

    /// Axis-aligned box with half extents `hx`, `hy` centered on the origin.
    #[must_use]
    pub fn new_box(hx: f32, hy: f32) -> Self {
        Self::new(vec![
            Vec2::new(-hx, -hy),
            Vec2::new(hx, -hy),
            Vec2::new(hx, hy),
            Vec2::new(-hx, hy),
        ])
    }

    /// Box with half extents `hx`, `hy` at a local offset and rotation.
    #[must_use]
    pub fn new_box_at(hx: f32, hy: f32, center: Vec2, angle: f32) -> Self {
        let xf = Transform::new(center, angle);
        let base = [
            Vec2::new(-hx, -hy),
            Vec2::new(hx, -hy),
            Vec2::new(hx, hy),
            Vec2::new(-hx, hy),
        ];
        Self::new(base.iter().map(|v| xf.apply(*v)).collect())
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let mut lower = xf.apply(self.vertices[0]);
        let mut upper = lower;
        for v in self.vertices.iter().skip(1) {
            let p = xf.apply(*v);
            lower = lower.min(p);
            upper = upper.max(p);
        }
        let r = Vec2::new(POLYGON_RADIUS, POLYGON_RADIUS);
        Aabb::new(lower - r, upper + r)
    }

    fn compute_mass(&self, density: f32) -> MassData {
        // Accumulate over triangles fanned from a reference point; see any
        // standard polygon inertia derivation.
        let n = self.vertices.len();
        let mut center = Vec2::ZERO;
        let mut area = 0.0;
        let mut inertia = 0.0;

        // Reference point inside the hull keeps the triangle areas positive.
        let mut reference = Vec2::ZERO;
        for v in &self.vertices {
            reference += *v;
        }
        reference = reference / n as f32;

        let inv3 = 1.0 / 3.0;
        for i in 0..n {
            let e1 = self.vertices[i] - reference;
            let e2 = self.vertices[(i + 1) % n] - reference;

            let d = e1.cross(e2);
            let triangle_area = 0.5 * d;
            area += triangle_area;

            center += (e1 + e2) * (triangle_area * inv3);

            let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            inertia += (0.25 * inv3 * d) * (intx2 + inty2);
        }

        let mass = density * area;
        center = center / area;
        let world_center = center + reference;

        // Shift inertia from the reference point to the local origin.
        let inertia = density * inertia
            + mass * (world_center.length_squared() - center.length_squared());

        MassData {
            mass,
            center: world_center,
            inertia,
        }
    }

    fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        let local = xf.apply_inverse(p);
        for (v, normal) in self.vertices.iter().zip(self.normals.iter()) {
            if normal.dot(local - *v) > 0.0 {
                return false;
            }
        }
        true
    }

    fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        // Work in the polygon's frame.
        let p1 = xf.apply_inverse(input.p1);
        let p2 = xf.apply_inverse(input.p2);
        let d = p2 - p1;

        let mut lower = 0.0_f32;
        let mut upper = input.max_fraction;
        let mut index = None;

        for i in 0..self.vertices.len() {
            // p = p1 + t * d; dot(normal, p - v) = 0
            let numerator = self.normals[i].dot(self.vertices[i] - p1);
            let denominator = self.normals[i].dot(d);

            if denominator == 0.0 {
                if numerator < 0.0 {
                    return None;
                }
            } else {
                let t = numerator / denominator;
                if denominator < 0.0 && t > lower {
                    // The segment enters this half-space.
                    lower = t;
                    index = Some(i);
                } else if denominator > 0.0 && t < upper {
                    // The segment exits this half-space.
                    upper = t;
                }
            }

            if upper < lower {
                return None;
            }
        }

        index.map(|i| RayCastOutput {
            normal: xf.q.apply(self.normals[i]),
            fraction: lower,
        })
    }
}

/// Centroid of a convex polygon.
fn compute_centroid(vertices: &[Vec2]) -> Vec2 {
    let n = vertices.len();
    let mut c = Vec2::ZERO;
    let mut area = 0.0;
    let inv3 = 1.0 / 3.0;
    for i in 0..n {
        let p1 = vertices[0];
        let p2 = vertices[i];
        let p3 = vertices[(i + 1) % n];
        let triangle_area = 0.5 * (p2 - p1).cross(p3 - p1);
        area += triangle_area;
        c += (p1 + p2 + p3) * (triangle_area * inv3);
    }
    c / area
}

// ============================================================================
// Edge
// ============================================================================

/// Line-segment shape, typically used for static terrain.
#[derive(Clone, Copy, Debug)]
pub struct EdgeShape {
    /// Start vertex
    pub v1: Vec2,
    /// End vertex
    pub v2: Vec2,
}

impl EdgeShape {
    /// Create an edge between two local points.
    #[must_use]
    pub const fn new(v1: Vec2, v2: Vec2) -> Self {
        Self { v1, v2 }
    }

    fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let p1 = xf.apply(self.v1);
        let p2 = xf.apply(self.v2);
        let r = Vec2::new(POLYGON_RADIUS, POLYGON_RADIUS);
        Aabb::new(p1.min(p2) - r, p1.max(p2) + r)
    }

    fn compute_mass(&self) -> MassData {
        // Edges are one-dimensional and carry no mass.
        MassData {
            mass: 0.0,
            center: (self.v1 + self.v2) * 0.5,
            inertia: 0.0,
        }
    }

    fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let p1 = xf.apply_inverse(input.p1);
        let p2 = xf.apply_inverse(input.p2);
        let d = p2 - p1;

        let e = self.v2 - self.v1;
        let normal = Vec2::new(e.y, -e.x).normalize();

        // p = p1 + t * d crosses the edge plane dot(normal, p - v1) = 0.
        let numerator = normal.dot(self.v1 - p1);
        let denominator = normal.dot(d);
        if denominator == 0.0 {
            return None;
        }
        let t = numerator / denominator;
        if t < 0.0 || t > input.max_fraction {
            return None;
        }

        // The crossing point must lie within the segment.
        let q = p1 + d * t;
        let ee = e.length_squared();
        if ee == 0.0 {
            return None;
        }
        let s = (q - self.v1).dot(e) / ee;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        // Face the normal against the ray.
        let world_normal = xf.q.apply(normal);
        Some(RayCastOutput {
            normal: if numerator > 0.0 {
                -world_normal
            } else {
                world_normal
            },
            fraction: t,
        })
    }
}

// ============================================================================
// Shape
// ============================================================================

/// A collision shape attached to a fixture.
#[derive(Clone, Debug)]
pub enum Shape {
    /// Circle shape
    Circle(CircleShape),
    /// Convex polygon shape
    Polygon(PolygonShape),
    /// Line segment shape
    Edge(EdgeShape),
}

impl Shape {
    /// Circle centered on the body origin.
    #[must_use]
    pub fn circle(radius: f32) -> Self {
        Self::Circle(CircleShape::new(radius))
    }

    /// Axis-aligned box with the given half extents.
    #[must_use]
    pub fn boxed(hx: f32, hy: f32) -> Self {
        Self::Polygon(PolygonShape::new_box(hx, hy))
    }

    /// Convex polygon from counter-clockwise vertices.
    #[must_use]
    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Self::Polygon(PolygonShape::new(vertices))
    }

    /// Edge between two local points.
    #[must_use]
    pub fn edge(v1: Vec2, v2: Vec2) -> Self {
        Self::Edge(EdgeShape::new(v1, v2))
    }

    /// Shape skin radius used by the distance and TOI queries.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        match self {
            Self::Circle(c) => c.radius,
            Self::Polygon(_) | Self::Edge(_) => POLYGON_RADIUS,
        }
    }

    /// World-space AABB of the shape under a transform.
    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        match self {
            Self::Circle(c) => c.compute_aabb(xf),
            Self::Polygon(p) => p.compute_aabb(xf),
            Self::Edge(e) => e.compute_aabb(xf),
        }
    }

    /// Mass properties at the given density.
    #[must_use]
    pub fn compute_mass(&self, density: f32) -> MassData {
        match self {
            Self::Circle(c) => c.compute_mass(density),
            Self::Polygon(p) => p.compute_mass(density),
            Self::Edge(e) => e.compute_mass(),
        }
    }

    /// Test whether a world point is inside the shape. Edges are
    /// one-dimensional and never contain a point.
    #[must_use]
    pub fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        match self {
            Self::Circle(c) => c.test_point(xf, p),
            Self::Polygon(poly) => poly.test_point(xf, p),
            Self::Edge(_) => false,
        }
    }

    /// Cast a ray against the shape under a transform.
    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        match self {
            Self::Circle(c) => c.ray_cast(input, xf),
            Self::Polygon(p) => p.ray_cast(input, xf),
            Self::Edge(e) => e.ray_cast(input, xf),
        }
    }

    /// Point cloud + radius reduction used by distance and TOI queries.
    #[must_use]
    pub fn distance_proxy(&self) -> DistanceProxy {
        match self {
            Self::Circle(c) => DistanceProxy {
                vertices: vec![c.center],
                radius: c.radius,
            },
            Self::Polygon(p) => DistanceProxy {
                vertices: p.vertices.clone(),
                radius: POLYGON_RADIUS,
            },
            Self::Edge(e) => DistanceProxy {
                vertices: vec![e.v1, e.v2],
                radius: POLYGON_RADIUS,
            },
        }
    }
}

// ============================================================================
// DistanceProxy
// ============================================================================

/// A shape reduced to a convex point cloud with a skin radius, the form
/// consumed by the GJK distance and time-of-impact routines.
#[derive(Clone, Debug)]
pub struct DistanceProxy {
    /// Hull vertices in local coordinates
    pub vertices: Vec<Vec2>,
    /// Skin radius around the hull
    pub radius: f32,
}

impl DistanceProxy {
    /// Index of the support vertex in direction `d`.
    #[must_use]
    pub fn support(&self, d: Vec2) -> usize {
        let mut best = 0;
        let mut best_value = self.vertices[0].dot(d);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let value = v.dot(d);
            if value > best_value {
                best = i;
                best_value = value;
            }
        }
        best
    }

    /// Vertex by index.
    #[inline]
    #[must_use]
    pub fn vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }
}

// ============================================================================
// Tests
// ============================================================================
