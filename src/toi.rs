//! Distance and Time of Impact
//!
//! GJK closest-point queries between convex point clouds, and a conservative
//! advancement search for the earliest time two swept shapes touch within a
//! step. The advancement loop walks the step fraction forward by the current
//! surface gap divided by a bound on the approach speed, so it can never step
//! past the first contact.

use crate::math::{Sweep, Transform, Vec2};
use crate::settings::LINEAR_SLOP;
use crate::shape::DistanceProxy;

/// Iteration bound for the GJK refinement loop.
const MAX_GJK_ITERATIONS: u32 = 20;

/// Iteration bound for conservative advancement.
const MAX_ADVANCE_ITERATIONS: u32 = 32;

// ============================================================================
// GJK distance
// ============================================================================

/// Result of a closest-point query.
#[derive(Clone, Copy, Debug)]
pub struct DistanceOutput {
    /// Closest point on shape A (world space)
    pub point_a: Vec2,
    /// Closest point on shape B (world space)
    pub point_b: Vec2,
    /// Distance between the closest points
    pub distance: f32,
    /// GJK iterations used
    pub iterations: u32,
}

#[derive(Clone, Copy, Debug, Default)]
struct SimplexVertex {
    /// Support point on proxy A (world)
    wa: Vec2,
    /// Support point on proxy B (world)
    wb: Vec2,
    /// `wb - wa`
    w: Vec2,
    /// Barycentric coordinate
    a: f32,
    index_a: usize,
    index_b: usize,
}

struct Simplex {
    v: [SimplexVertex; 3],
    count: usize,
}

impl Simplex {
    fn search_direction(&self) -> Vec2 {
        match self.count {
            1 => -self.v[0].w,
            2 => {
                let e12 = self.v[1].w - self.v[0].w;
                let sgn = e12.cross(-self.v[0].w);
                if sgn > 0.0 {
                    // Origin is left of e12.
                    Vec2::new(-e12.y, e12.x)
                } else {
                    Vec2::new(e12.y, -e12.x)
                }
            }
            _ => Vec2::ZERO,
        }
    }

    fn witness_points(&self) -> (Vec2, Vec2) {
        match self.count {
            1 => (self.v[0].wa, self.v[0].wb),
            2 => (
                self.v[0].wa * self.v[0].a + self.v[1].wa * self.v[1].a,
                self.v[0].wb * self.v[0].a + self.v[1].wb * self.v[1].a,
            ),
            3 => {
                let p = self.v[0].wa * self.v[0].a
                    + self.v[1].wa * self.v[1].a
                    + self.v[2].wa * self.v[2].a;
                (p, p)
            }
            _ => (Vec2::ZERO, Vec2::ZERO),
        }
    }

    /// Closest point on a segment to the origin.
    fn solve2(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let e12 = w2 - w1;

        let d12_2 = -w1.dot(e12);
        if d12_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        let d12_1 = w2.dot(e12);
        if d12_1 <= 0.0 {
            self.v[0] = self.v[1];
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.v[0].a = d12_1 * inv_d12;
        self.v[1].a = d12_2 * inv_d12;
        self.count = 2;
    }

    /// Closest point on a triangle to the origin, by Voronoi region.
    fn solve3(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let w3 = self.v[2].w;

        let e12 = w2 - w1;
        let d12_1 = w2.dot(e12);
        let d12_2 = -w1.dot(e12);

        let e13 = w3 - w1;
        let d13_1 = w3.dot(e13);
        let d13_2 = -w1.dot(e13);

        let e23 = w3 - w2;
        let d23_1 = w3.dot(e23);
        let d23_2 = -w2.dot(e23);

        let n123 = e12.cross(e13);
        let d123_1 = n123 * w2.cross(w3);
        let d123_2 = n123 * w3.cross(w1);
        let d123_3 = n123 * w1.cross(w2);

        // Vertex regions.
        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }
        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.v[0] = self.v[1];
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }
        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.v[0] = self.v[2];
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // Edge regions.
        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv = 1.0 / (d12_1 + d12_2);
            self.v[0].a = d12_1 * inv;
            self.v[1].a = d12_2 * inv;
            self.count = 2;
            return;
        }
        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv = 1.0 / (d13_1 + d13_2);
            self.v[0].a = d13_1 * inv;
            self.v[2].a = d13_2 * inv;
            self.v[1] = self.v[2];
            self.count = 2;
            return;
        }
        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv = 1.0 / (d23_1 + d23_2);
            self.v[1].a = d23_1 * inv;
            self.v[2].a = d23_2 * inv;
            self.v[0] = self.v[2];
            self.count = 2;
            return;
        }

        // Interior.
        let inv = 1.0 / (d123_1 + d123_2 + d123_3);
        self.v[0].a = d123_1 * inv;
        self.v[1].a = d123_2 * inv;
        self.v[2].a = d123_3 * inv;
        self.count = 3;
    }
}

/// Closest points between two transformed proxies (hulls without their skin
/// radii).
#[must_use]
pub fn hull_distance(
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
) -> DistanceOutput {
    let mut simplex = Simplex {
        v: [SimplexVertex::default(); 3],
        count: 1,
    };
    {
        let v = &mut simplex.v[0];
        v.index_a = 0;
        v.index_b = 0;
        v.wa = xf_a.apply(proxy_a.vertex(0));
        v.wb = xf_b.apply(proxy_b.vertex(0));
        v.w = v.wb - v.wa;
        v.a = 1.0;
    }

    let mut saved_a = [0usize; 3];
    let mut saved_b = [0usize; 3];
    let mut iterations = 0;

    while iterations < MAX_GJK_ITERATIONS {
        let saved_count = simplex.count;
        for i in 0..saved_count {
            saved_a[i] = simplex.v[i].index_a;
            saved_b[i] = simplex.v[i].index_b;
        }

        match simplex.count {
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => {}
        }

        // The origin is inside the hull difference: overlap.
        if simplex.count == 3 {
            break;
        }

        let d = simplex.search_direction();
        if d.length_squared() < f32::EPSILON * f32::EPSILON {
            // The origin sits exactly on the simplex boundary; witness points
            // are still valid.
            break;
        }

        let index_a = proxy_a.support(xf_a.q.apply_inverse(-d));
        let index_b = proxy_b.support(xf_b.q.apply_inverse(d));
        let wa = xf_a.apply(proxy_a.vertex(index_a));
        let wb = xf_b.apply(proxy_b.vertex(index_b));
        let vertex = SimplexVertex {
            wa,
            wb,
            w: wb - wa,
            a: 0.0,
            index_a,
            index_b,
        };

        iterations += 1;

        // No progress: the new support repeats a simplex vertex.
        let mut duplicate = false;
        for i in 0..saved_count {
            if vertex.index_a == saved_a[i] && vertex.index_b == saved_b[i] {
                duplicate = true;
                break;
            }
        }
        if duplicate {
            break;
        }

        simplex.v[simplex.count] = vertex;
        simplex.count += 1;
    }

    let (point_a, point_b) = simplex.witness_points();
    DistanceOutput {
        point_a,
        point_b,
        distance: point_a.distance_to(point_b),
        iterations,
    }
}

/// Closest points between two transformed shapes, accounting for their skin
/// radii. Overlapping shapes report a distance of zero with coincident
/// points.
#[must_use]
pub fn shape_distance(
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
) -> DistanceOutput {
    let mut out = hull_distance(proxy_a, xf_a, proxy_b, xf_b);
    let r_a = proxy_a.radius;
    let r_b = proxy_b.radius;
    if out.distance > r_a + r_b && out.distance > f32::EPSILON {
        out.distance -= r_a + r_b;
        let normal = (out.point_b - out.point_a).normalize();
        out.point_a += normal * r_a;
        out.point_b -= normal * r_b;
    } else {
        let p = (out.point_a + out.point_b) * 0.5;
        out.point_a = p;
        out.point_b = p;
        out.distance = 0.0;
    }
    out
}

/// Returns `true` if two transformed shapes overlap (skin radii included).
#[must_use]
pub fn test_overlap(
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
) -> bool {
    let out = hull_distance(proxy_a, xf_a, proxy_b, xf_b);
    out.distance < proxy_a.radius + proxy_b.radius + 10.0 * f32::EPSILON
}

// ============================================================================
// Time of impact
// ============================================================================

/// Outcome of a time-of-impact query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToiState {
    /// Shapes already overlap at the start of the interval
    Overlapped,
    /// Shapes first touch at the reported fraction
    Touching,
    /// Shapes do not touch within the interval
    Separated,
    /// The search did not converge within its iteration bound
    Failed,
}

/// Input for a time-of-impact query over the step fraction interval
/// `[max(alpha0), t_max]`.
#[derive(Clone, Debug)]
pub struct ToiInput {
    /// Proxy of the first shape
    pub proxy_a: DistanceProxy,
    /// Proxy of the second shape
    pub proxy_b: DistanceProxy,
    /// Motion of the first body
    pub sweep_a: Sweep,
    /// Motion of the second body
    pub sweep_b: Sweep,
    /// Upper bound of the search interval
    pub t_max: f32,
}

/// Result of a time-of-impact query.
#[derive(Clone, Copy, Debug)]
pub struct ToiOutput {
    /// Classification of the result
    pub state: ToiState,
    /// Step fraction of first contact (meaningful for `Touching`)
    pub t: f32,
}

/// Largest distance of any proxy point from the rotation center, including
/// the skin radius. Bounds the displacement a rotation can produce.
fn rotation_bound(proxy: &DistanceProxy, local_center: Vec2) -> f32 {
    let mut r: f32 = 0.0;
    for v in &proxy.vertices {
        r = r.max((*v - local_center).length());
    }
    r + proxy.radius
}

/// Earliest time two swept shapes come within the collision target distance,
/// found by conservative advancement.
#[must_use]
pub fn time_of_impact(input: &ToiInput) -> ToiOutput {
    let mut sweep_a = input.sweep_a;
    let mut sweep_b = input.sweep_b;
    sweep_a.normalize();
    sweep_b.normalize();

    let t_max = input.t_max;
    let t0 = sweep_a.alpha0.max(sweep_b.alpha0);
    if t0 >= t_max {
        return ToiOutput {
            state: ToiState::Separated,
            t: t_max,
        };
    }

    let total_radius = input.proxy_a.radius + input.proxy_b.radius;
    let target = LINEAR_SLOP.max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;
    debug_assert!(target > tolerance);

    // Per-unit-fraction displacement bounds of both bodies.
    let inv_span_a = 1.0 / (1.0 - sweep_a.alpha0);
    let inv_span_b = 1.0 / (1.0 - sweep_b.alpha0);
    let lin_a = (sweep_a.c - sweep_a.c0) * inv_span_a;
    let lin_b = (sweep_b.c - sweep_b.c0) * inv_span_b;
    let ang_a = ((sweep_a.a - sweep_a.a0) * inv_span_a).abs();
    let ang_b = ((sweep_b.a - sweep_b.a0) * inv_span_b).abs();
    let max_speed = (lin_b - lin_a).length()
        + ang_a * rotation_bound(&input.proxy_a, sweep_a.local_center)
        + ang_b * rotation_bound(&input.proxy_b, sweep_b.local_center);

    let mut t = t0;
    for _ in 0..MAX_ADVANCE_ITERATIONS {
        let xf_a = sweep_a.transform_at(t);
        let xf_b = sweep_b.transform_at(t);
        let out = hull_distance(&input.proxy_a, &xf_a, &input.proxy_b, &xf_b);
        // The skin radii are folded into `target`, so the hull distance is
        // compared directly.
        let separation = out.distance;

        if separation < target - tolerance {
            // Deep overlap; let the discrete solver resolve it.
            return ToiOutput {
                state: ToiState::Overlapped,
                t,
            };
        }
        if separation < target + tolerance {
            return ToiOutput {
                state: ToiState::Touching,
                t,
            };
        }

        if max_speed <= f32::EPSILON {
            // No relative motion; the gap cannot close.
            return ToiOutput {
                state: ToiState::Separated,
                t: t_max,
            };
        }

        // The gap cannot close faster than max_speed per unit fraction.
        t += (separation - target) / max_speed;
        if t >= t_max {
            return ToiOutput {
                state: ToiState::Separated,
                t: t_max,
            };
        }
    }

    ToiOutput {
        state: ToiState::Failed,
        t,
    }
}

// ============================================================================
// Tests
// ============================================================================
