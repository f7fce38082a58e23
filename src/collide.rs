//! Narrow Phase — Contact Manifolds
//!
//! Computes persistent contact manifolds between shape pairs. Manifolds are
//! stored in local coordinates so they stay valid while bodies move between
//! collision updates, and every point carries a feature id so accumulated
//! impulses survive from one step to the next (warm starting).
//!
//! # Colliders
//!
//! - circle vs circle
//! - polygon vs circle, edge vs circle
//! - polygon vs polygon (SAT + incident edge clipping), edge vs polygon

use crate::math::{Transform, Vec2};
use crate::settings::{LINEAR_SLOP, MAX_MANIFOLD_POINTS, POLYGON_RADIUS};
use crate::shape::{CircleShape, EdgeShape, PolygonShape};

// ============================================================================
// Feature ids
// ============================================================================

/// Contact feature type: the id byte marking a hull vertex.
pub const FEATURE_VERTEX: u8 = 0;
/// Contact feature type: the id byte marking a hull face.
pub const FEATURE_FACE: u8 = 1;

/// Pack a contact feature (vertex/face indices on both shapes) into a single
/// id used to match manifold points across steps.
#[inline]
#[must_use]
pub fn feature_id(index_a: u8, index_b: u8, type_a: u8, type_b: u8) -> u32 {
    u32::from(index_a) | u32::from(index_b) << 8 | u32::from(type_a) << 16 | u32::from(type_b) << 24
}

// ============================================================================
// Manifold
// ============================================================================

/// How the manifold's local data is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManifoldKind {
    /// Circle vs circle: `local_point` is circle A's center, the point's
    /// `local_point` is circle B's center.
    Circles,
    /// Reference face on shape A: `local_normal`/`local_point` in A's frame,
    /// clip points in B's frame.
    FaceA,
    /// Reference face on shape B, clip points in A's frame.
    FaceB,
}

/// One contact point of a manifold. The accumulated impulses are the warm
/// starting state carried across steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManifoldPoint {
    /// Contact point in the incident shape's local frame (see [`ManifoldKind`])
    pub local_point: Vec2,
    /// Accumulated normal impulse
    pub normal_impulse: f32,
    /// Accumulated friction impulse
    pub tangent_impulse: f32,
    /// Feature id used to match this point across steps
    pub id: u32,
}

/// A contact manifold: up to two contact points sharing one normal.
#[derive(Clone, Copy, Debug)]
pub struct Manifold {
    /// Interpretation of the local data
    pub kind: ManifoldKind,
    /// Reference normal in the reference shape's local frame (unused for circles)
    pub local_normal: Vec2,
    /// Reference point in the reference shape's local frame
    pub local_point: Vec2,
    /// Contact points
    pub points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    /// Number of valid contact points
    pub count: usize,
}

impl Default for Manifold {
    fn default() -> Self {
        Self {
            kind: ManifoldKind::Circles,
            local_normal: Vec2::ZERO,
            local_point: Vec2::ZERO,
            points: [ManifoldPoint::default(); MAX_MANIFOLD_POINTS],
            count: 0,
        }
    }
}

/// World-space view of a manifold: shared normal, mid-points, and per-point
/// separations, reconstructed from the local data and the two current body
/// transforms.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldManifold {
    /// World normal, pointing from shape A to shape B
    pub normal: Vec2,
    /// World contact points (midway between the two surfaces)
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    /// Signed separations (negative means overlap)
    pub separations: [f32; MAX_MANIFOLD_POINTS],
}

impl WorldManifold {
    /// Reconstruct world-space contact data from a manifold.
    #[must_use]
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut wm = Self::default();
        if manifold.count == 0 {
            return wm;
        }

        match manifold.kind {
            ManifoldKind::Circles => {
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                let d = point_b - point_a;
                wm.normal = if d.length_squared() > f32::EPSILON * f32::EPSILON {
                    d.normalize()
                } else {
                    Vec2::UNIT_X
                };
                let c_a = point_a + wm.normal * radius_a;
                let c_b = point_b - wm.normal * radius_b;
                wm.points[0] = (c_a + c_b) * 0.5;
                wm.separations[0] = (c_b - c_a).dot(wm.normal);
            }
            ManifoldKind::FaceA => {
                wm.normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for i in 0..manifold.count {
                    let clip_point = xf_b.apply(manifold.points[i].local_point);
                    let c_a = clip_point
                        + wm.normal * (radius_a - (clip_point - plane_point).dot(wm.normal));
                    let c_b = clip_point - wm.normal * radius_b;
                    wm.points[i] = (c_a + c_b) * 0.5;
                    wm.separations[i] = (c_b - c_a).dot(wm.normal);
                }
            }
            ManifoldKind::FaceB => {
                let normal = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for i in 0..manifold.count {
                    let clip_point = xf_a.apply(manifold.points[i].local_point);
                    let c_b = clip_point
                        + normal * (radius_b - (clip_point - plane_point).dot(normal));
                    let c_a = clip_point - normal * radius_a;
                    wm.points[i] = (c_a + c_b) * 0.5;
                    wm.separations[i] = (c_a - c_b).dot(normal);
                }
                // Keep the convention: normal points from A to B.
                wm.normal = -normal;
            }
        }
        wm
    }
}

// ============================================================================
// Circle vs circle
// ============================================================================

/// Collide two circles.
#[must_use]
pub fn collide_circles(
    circle_a: &CircleShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    let p_a = xf_a.apply(circle_a.center);
    let p_b = xf_b.apply(circle_b.center);
    let d = p_b - p_a;
    let r = circle_a.radius + circle_b.radius;
    if d.length_squared() > r * r {
        return manifold;
    }

    manifold.kind = ManifoldKind::Circles;
    manifold.local_point = circle_a.center;
    manifold.local_normal = Vec2::ZERO;
    manifold.count = 1;
    manifold.points[0].local_point = circle_b.center;
    manifold.points[0].id = 0;
    manifold
}

// ============================================================================
// Polygon vs circle
// ============================================================================

/// Collide a polygon (shape A) with a circle (shape B).
#[must_use]
pub fn collide_polygon_circle(
    polygon: &PolygonShape,
    xf_a: &Transform,
    circle: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle center in the polygon's frame.
    let c = xf_b.apply(circle.center);
    let c_local = xf_a.apply_inverse(c);

    let radius = POLYGON_RADIUS + circle.radius;
    let n = polygon.count();

    // Face of maximum separation.
    let mut normal_index = 0;
    let mut separation = f32::MIN;
    for i in 0..n {
        let s = polygon.normals[i].dot(c_local - polygon.vertices[i]);
        if s > radius {
            return manifold;
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = polygon.vertices[normal_index];
    let v2 = polygon.vertices[(normal_index + 1) % n];

    if separation < f32::EPSILON {
        // Center is inside the polygon.
        manifold.kind = ManifoldKind::FaceA;
        manifold.local_normal = polygon.normals[normal_index];
        manifold.local_point = (v1 + v2) * 0.5;
        manifold.points[0].local_point = circle.center;
        manifold.points[0].id = 0;
        manifold.count = 1;
        return manifold;
    }

    // Voronoi regions of the reference edge.
    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    if u1 <= 0.0 {
        if c_local.distance_to(v1) > radius {
            return manifold;
        }
        manifold.local_normal = (c_local - v1).normalize();
        manifold.local_point = v1;
    } else if u2 <= 0.0 {
        if c_local.distance_to(v2) > radius {
            return manifold;
        }
        manifold.local_normal = (c_local - v2).normalize();
        manifold.local_point = v2;
    } else {
        let face_center = (v1 + v2) * 0.5;
        if (c_local - face_center).dot(polygon.normals[normal_index]) > radius {
            return manifold;
        }
        manifold.local_normal = polygon.normals[normal_index];
        manifold.local_point = face_center;
    }

    manifold.kind = ManifoldKind::FaceA;
    manifold.points[0].local_point = circle.center;
    manifold.points[0].id = 0;
    manifold.count = 1;
    manifold
}

// ============================================================================
// Edge vs circle
// ============================================================================

/// Collide an edge (shape A) with a circle (shape B).
#[must_use]
pub fn collide_edge_circle(
    edge: &EdgeShape,
    xf_a: &Transform,
    circle: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    let q = xf_a.apply_inverse(xf_b.apply(circle.center));
    let a = edge.v1;
    let b = edge.v2;
    let e = b - a;

    // Barycentric coordinates of the closest point on the segment.
    let u = e.dot(b - q);
    let v = e.dot(q - a);
    let radius = POLYGON_RADIUS + circle.radius;

    if v <= 0.0 {
        // Closest to vertex A.
        let d = q - a;
        if d.length_squared() > radius * radius {
            return manifold;
        }
        manifold.kind = ManifoldKind::Circles;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = a;
        manifold.points[0].local_point = circle.center;
        manifold.points[0].id = feature_id(0, 0, FEATURE_VERTEX, FEATURE_VERTEX);
        manifold.count = 1;
        return manifold;
    }

    if u <= 0.0 {
        // Closest to vertex B.
        let d = q - b;
        if d.length_squared() > radius * radius {
            return manifold;
        }
        manifold.kind = ManifoldKind::Circles;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = b;
        manifold.points[0].local_point = circle.center;
        manifold.points[0].id = feature_id(1, 0, FEATURE_VERTEX, FEATURE_VERTEX);
        manifold.count = 1;
        return manifold;
    }

    // Interior of the segment.
    let den = e.length_squared();
    debug_assert!(den > 0.0);
    let p = (a * u + b * v) / den;
    let d = q - p;
    if d.length_squared() > radius * radius {
        return manifold;
    }

    let mut normal = Vec2::new(-e.y, e.x);
    if normal.dot(q - a) < 0.0 {
        normal = -normal;
    }
    manifold.kind = ManifoldKind::FaceA;
    manifold.local_normal = normal.normalize();
    manifold.local_point = a;
    manifold.points[0].local_point = circle.center;
    manifold.points[0].id = feature_id(0, 0, FEATURE_FACE, FEATURE_VERTEX);
    manifold.count = 1;
    manifold
}

// ============================================================================
// Polygon vs polygon
// ============================================================================

/// A vertex produced by clipping, with the feature id of its origin.
#[derive(Clone, Copy, Debug, Default)]
struct ClipVertex {
    v: Vec2,
    index_a: u8,
    index_b: u8,
    type_a: u8,
    type_b: u8,
}

impl ClipVertex {
    fn id(&self) -> u32 {
        feature_id(self.index_a, self.index_b, self.type_a, self.type_b)
    }

    fn flipped_id(&self) -> u32 {
        feature_id(self.index_b, self.index_a, self.type_b, self.type_a)
    }
}

/// Maximum separation of `poly2`'s hull from `poly1`'s faces. Returns the
/// separation and the face index achieving it.
fn find_max_separation(
    poly1: &PolygonShape,
    xf1: &Transform,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> (f32, usize) {
    let mut best_separation = f32::MIN;
    let mut best_index = 0;

    for i in 0..poly1.count() {
        let n = xf1.q.apply(poly1.normals[i]);
        let v1 = xf1.apply(poly1.vertices[i]);

        let mut si = f32::MAX;
        for v2 in &poly2.vertices {
            let s = n.dot(xf2.apply(*v2) - v1);
            if s < si {
                si = s;
            }
        }

        if si > best_separation {
            best_separation = si;
            best_index = i;
        }
    }

    (best_separation, best_index)
}

/// The edge of `poly2` most anti-parallel to face `edge1` of `poly1`.
fn find_incident_edge(
    poly1: &PolygonShape,
    xf1: &Transform,
    edge1: usize,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    // Reference normal in poly2's frame.
    let normal1 = xf2.q.apply_inverse(xf1.q.apply(poly1.normals[edge1]));

    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in poly2.normals.iter().enumerate() {
        let dot = normal1.dot(*n);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (i1 + 1) % poly2.count();
    [
        ClipVertex {
            v: xf2.apply(poly2.vertices[i1]),
            index_a: edge1 as u8,
            index_b: i1 as u8,
            type_a: FEATURE_FACE,
            type_b: FEATURE_VERTEX,
        },
        ClipVertex {
            v: xf2.apply(poly2.vertices[i2]),
            index_a: edge1 as u8,
            index_b: i2 as u8,
            type_a: FEATURE_FACE,
            type_b: FEATURE_VERTEX,
        },
    ]
}

/// Sutherland-Hodgman clip of a two-point segment against a half-plane.
/// Returns the number of points kept.
fn clip_segment_to_line(
    v_in: &[ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    vertex_index_a: usize,
) -> ([ClipVertex; 2], usize) {
    let mut v_out = [ClipVertex::default(); 2];
    let mut count = 0;

    let distance0 = normal.dot(v_in[0].v) - offset;
    let distance1 = normal.dot(v_in[1].v) - offset;

    if distance0 <= 0.0 {
        v_out[count] = v_in[0];
        count += 1;
    }
    if distance1 <= 0.0 {
        v_out[count] = v_in[1];
        count += 1;
    }

    // The segment crosses the plane: emit the intersection vertex.
    if distance0 * distance1 < 0.0 {
        let interp = distance0 / (distance0 - distance1);
        v_out[count] = ClipVertex {
            v: v_in[0].v + (v_in[1].v - v_in[0].v) * interp,
            index_a: vertex_index_a as u8,
            index_b: v_in[0].index_b,
            type_a: FEATURE_VERTEX,
            type_b: FEATURE_FACE,
        };
        count += 1;
    }

    (v_out, count)
}

/// Collide two convex polygons using SAT with incident edge clipping.
#[must_use]
pub fn collide_polygons(
    poly_a: &PolygonShape,
    xf_a: &Transform,
    poly_b: &PolygonShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();
    let total_radius = 2.0 * POLYGON_RADIUS;

    let (separation_a, edge_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return manifold;
    }

    let (separation_b, edge_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return manifold;
    }

    let k_tol = 0.1 * LINEAR_SLOP;
    let (poly1, xf1, poly2, xf2, edge1, flip);
    if separation_b > separation_a + k_tol {
        poly1 = poly_b;
        xf1 = xf_b;
        poly2 = poly_a;
        xf2 = xf_a;
        edge1 = edge_b;
        manifold.kind = ManifoldKind::FaceB;
        flip = true;
    } else {
        poly1 = poly_a;
        xf1 = xf_a;
        poly2 = poly_b;
        xf2 = xf_b;
        edge1 = edge_a;
        manifold.kind = ManifoldKind::FaceA;
        flip = false;
    }

    let incident_edge = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let iv1 = edge1;
    let iv2 = (edge1 + 1) % poly1.count();
    let v11 = poly1.vertices[iv1];
    let v12 = poly1.vertices[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = Vec2::new(local_tangent.y, -local_tangent.x);
    let plane_point = (v11 + v12) * 0.5;

    let tangent = xf1.q.apply(local_tangent);
    let normal = Vec2::new(tangent.y, -tangent.x);

    let v11w = xf1.apply(v11);
    let v12w = xf1.apply(v12);

    let front_offset = normal.dot(v11w);
    let side_offset1 = -tangent.dot(v11w) + total_radius;
    let side_offset2 = tangent.dot(v12w) + total_radius;

    // Clip the incident edge to the side planes of the reference face.
    let (clip1, np1) = clip_segment_to_line(&incident_edge, -tangent, side_offset1, iv1);
    if np1 < 2 {
        return manifold;
    }
    let (clip2, np2) = clip_segment_to_line(&clip1, tangent, side_offset2, iv2);
    if np2 < 2 {
        return manifold;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    let mut count = 0;
    for cv in &clip2 {
        let separation = normal.dot(cv.v) - front_offset;
        if separation <= total_radius {
            let point = &mut manifold.points[count];
            point.local_point = xf2.apply_inverse(cv.v);
            point.id = if flip { cv.flipped_id() } else { cv.id() };
            count += 1;
            if count == MAX_MANIFOLD_POINTS {
                break;
            }
        }
    }
    manifold.count = count;
    manifold
}

// ============================================================================
// Edge vs polygon
// ============================================================================

/// Collide an edge (shape A) with a polygon (shape B) by lifting the edge to
/// a two-vertex hull and reusing the polygon SAT path. One-sided edge
/// semantics are not modeled.
#[must_use]
pub fn collide_edge_polygon(
    edge: &EdgeShape,
    xf_a: &Transform,
    polygon: &PolygonShape,
    xf_b: &Transform,
) -> Manifold {
    let e = edge.v2 - edge.v1;
    let n = Vec2::new(e.y, -e.x).normalize();
    let hull = PolygonShape {
        vertices: vec![edge.v1, edge.v2],
        normals: vec![n, -n],
        centroid: (edge.v1 + edge.v2) * 0.5,
    };
    collide_polygons(&hull, xf_a, polygon, xf_b)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_circles_overlapping() {
        let a = CircleShape::new(1.0);
        let b = CircleShape::new(1.0);
        let xf_a = Transform::new(Vec2::new(0.0, 0.0), 0.0);
        let xf_b = Transform::new(Vec2::new(1.5, 0.0), 0.0);

        let m = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.count, 1);

        let wm = WorldManifold::new(&m, &xf_a, a.radius, &xf_b, b.radius);
        assert!(approx(wm.normal.x, 1.0));
        assert!(approx(wm.separations[0], -0.5));
    }

    #[test]
    fn test_circles_separated() {
        let a = CircleShape::new(1.0);
        let b = CircleShape::new(1.0);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(3.0, 0.0), 0.0);
        let m = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.count, 0);
    }

    #[test]
    fn test_polygon_circle_face_contact() {
        let poly = PolygonShape::new_box(1.0, 1.0);
        let circle = CircleShape::new(0.5);
        let xf_a = Transform::IDENTITY;
        // Circle resting on top of the box, slightly overlapping.
        let xf_b = Transform::new(Vec2::new(0.0, 1.4), 0.0);

        let m = collide_polygon_circle(&poly, &xf_a, &circle, &xf_b);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::FaceA);

        let wm = WorldManifold::new(&m, &xf_a, POLYGON_RADIUS, &xf_b, circle.radius);
        assert!(approx(wm.normal.y, 1.0));
        assert!(wm.separations[0] < 0.0);
    }

    #[test]
    fn test_polygon_circle_vertex_region() {
        let poly = PolygonShape::new_box(1.0, 1.0);
        let circle = CircleShape::new(0.5);
        let xf_a = Transform::IDENTITY;
        // Circle near the top-right corner, diagonal contact.
        let xf_b = Transform::new(Vec2::new(1.2, 1.2), 0.0);

        let m = collide_polygon_circle(&poly, &xf_a, &circle, &xf_b);
        assert_eq!(m.count, 1);
        let wm = WorldManifold::new(&m, &xf_a, POLYGON_RADIUS, &xf_b, circle.radius);
        assert!(wm.normal.x > 0.0 && wm.normal.y > 0.0);
    }

    #[test]
    fn test_boxes_face_contact_two_points() {
        let a = PolygonShape::new_box(1.0, 1.0);
        let b = PolygonShape::new_box(1.0, 1.0);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.0, 1.9), 0.0);

        let m = collide_polygons(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.count, 2, "stacked boxes should have a two-point manifold");

        let wm = WorldManifold::new(&m, &xf_a, POLYGON_RADIUS, &xf_b, POLYGON_RADIUS);
        assert!(approx(wm.normal.y.abs(), 1.0));
        assert!(wm.separations[0] < 0.0 && wm.separations[1] < 0.0);
    }

    #[test]
    fn test_boxes_separated() {
        let a = PolygonShape::new_box(1.0, 1.0);
        let b = PolygonShape::new_box(1.0, 1.0);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(5.0, 0.0), 0.0);
        let m = collide_polygons(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.count, 0);
    }

    #[test]
    fn test_manifold_ids_stable_across_small_motion() {
        let a = PolygonShape::new_box(1.0, 1.0);
        let b = PolygonShape::new_box(1.0, 1.0);
        let xf_a = Transform::IDENTITY;

        let m1 = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(0.0, 1.90), 0.0));
        let m2 = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(0.01, 1.89), 0.0));
        assert_eq!(m1.count, 2);
        assert_eq!(m2.count, 2);
        assert_eq!(m1.points[0].id, m2.points[0].id);
        assert_eq!(m1.points[1].id, m2.points[1].id);
    }

    #[test]
    fn test_edge_circle_face_contact() {
        let edge = EdgeShape::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        let circle = CircleShape::new(0.5);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.0, 0.4), 0.0);

        let m = collide_edge_circle(&edge, &xf_a, &circle, &xf_b);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::FaceA);

        let wm = WorldManifold::new(&m, &xf_a, POLYGON_RADIUS, &xf_b, circle.radius);
        assert!(approx(wm.normal.y, 1.0));
    }

    #[test]
    fn test_edge_circle_vertex_region() {
        let edge = EdgeShape::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        let circle = CircleShape::new(0.5);
        let xf_a = Transform::IDENTITY;
        // Beyond vertex B, within the combined radius.
        let xf_b = Transform::new(Vec2::new(1.3, 0.0), 0.0);

        let m = collide_edge_circle(&edge, &xf_a, &circle, &xf_b);
        assert_eq!(m.count, 1);
        assert_eq!(m.kind, ManifoldKind::Circles);
    }

    #[test]
    fn test_edge_polygon_contact() {
        let edge = EdgeShape::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        let poly = PolygonShape::new_box(0.5, 0.5);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.0, 0.49), 0.0);

        let m = collide_edge_polygon(&edge, &xf_a, &poly, &xf_b);
        assert!(m.count > 0, "box resting on edge should collide");

        let wm = WorldManifold::new(&m, &xf_a, POLYGON_RADIUS, &xf_b, POLYGON_RADIUS);
        assert!(approx(wm.normal.y.abs(), 1.0));
    }
}
