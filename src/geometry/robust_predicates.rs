// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Robust geometric predicates
//! Floating-point filter with a double-double fallback for near-degenerate cases

use nalgebra::{Point2, Point3, Vector3};

/// Relative error bound of the plain f64 orientation determinants
const ORIENT3D_ERR: f64 = 8.0 * f64::EPSILON;
const ORIENT2D_ERR: f64 = 4.0 * f64::EPSILON;

/// Oriented volume of tetrahedron (a, b, c, d), six times the signed volume.
///
/// Positive when `d` lies on the side the normal of (a, b, c) points to
/// (right-hand rule), negative on the other side, zero when coplanar. Falls
/// back to double-double arithmetic when the fast result is within its
/// error bound.
pub fn oriented_volume(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let result = ab.dot(&ac.cross(&ad));

    let permanent = ab.abs().dot(&(ac.abs().cross_abs(&ad.abs())));
    if result.abs() > ORIENT3D_ERR * permanent {
        result
    } else {
        adaptive_precision_volume(a, b, c, d)
    }
}

/// Twice the signed area of the 2D triangle (a, b, c); positive when
/// counter-clockwise.
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let left = (b.x - a.x) * (c.y - a.y);
    let right = (b.y - a.y) * (c.x - a.x);
    let result = left - right;

    if result.abs() > ORIENT2D_ERR * (left.abs() + right.abs()) {
        result
    } else {
        let abx = DoubleDouble::diff(b.x, a.x);
        let aby = DoubleDouble::diff(b.y, a.y);
        let acx = DoubleDouble::diff(c.x, a.x);
        let acy = DoubleDouble::diff(c.y, a.y);
        abx.mul(acy).sub(aby.mul(acx)).value()
    }
}

fn adaptive_precision_volume(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let ab = [
        DoubleDouble::diff(b.x, a.x),
        DoubleDouble::diff(b.y, a.y),
        DoubleDouble::diff(b.z, a.z),
    ];
    let ac = [
        DoubleDouble::diff(c.x, a.x),
        DoubleDouble::diff(c.y, a.y),
        DoubleDouble::diff(c.z, a.z),
    ];
    let ad = [
        DoubleDouble::diff(d.x, a.x),
        DoubleDouble::diff(d.y, a.y),
        DoubleDouble::diff(d.z, a.z),
    ];

    // ac x ad
    let cx = ac[1].mul(ad[2]).sub(ac[2].mul(ad[1]));
    let cy = ac[2].mul(ad[0]).sub(ac[0].mul(ad[2]));
    let cz = ac[0].mul(ad[1]).sub(ac[1].mul(ad[0]));

    ab[0].mul(cx).add(ab[1].mul(cy)).add(ab[2].mul(cz)).value()
}

/// Unevaluated sum `hi + lo` carrying about 106 bits of precision
#[derive(Debug, Clone, Copy)]
struct DoubleDouble {
    hi: f64,
    lo: f64,
}

impl DoubleDouble {
    /// Exact difference of two doubles
    fn diff(a: f64, b: f64) -> Self {
        let (hi, lo) = two_sum(a, -b);
        Self { hi, lo }
    }

    fn add(self, other: Self) -> Self {
        let (s, e) = two_sum(self.hi, other.hi);
        let e = e + self.lo + other.lo;
        let (hi, lo) = two_sum(s, e);
        Self { hi, lo }
    }

    fn sub(self, other: Self) -> Self {
        self.add(Self {
            hi: -other.hi,
            lo: -other.lo,
        })
    }

    fn mul(self, other: Self) -> Self {
        let (p, e) = two_product(self.hi, other.hi);
        let e = e + (self.hi * other.lo + self.lo * other.hi);
        let (hi, lo) = two_sum(p, e);
        Self { hi, lo }
    }

    fn value(self) -> f64 {
        self.hi + self.lo
    }
}

/// Error-free transformation: a + b = s + e exactly
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// Error-free transformation: a * b = p + e exactly
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

trait CrossAbs {
    fn cross_abs(&self, other: &Self) -> Self;
}

impl CrossAbs for Vector3<f64> {
    /// Component-wise magnitude bound of the cross product
    fn cross_abs(&self, other: &Self) -> Self {
        Vector3::new(
            self.y * other.z + self.z * other.y,
            self.z * other.x + self.x * other.z,
            self.x * other.y + self.y * other.x,
        )
    }
}

/// Sign of a predicate value as -1, 0 or 1
pub fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Classify point relative to plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneClassification {
    /// Strictly on the side the normal points to
    Front,
    /// Strictly on the side opposite the normal
    Back,
    /// Within tolerance of the plane
    OnPlane,
}

/// Classify a signed distance against a tolerance
pub fn classify_distance(distance: f64, tolerance: f64) -> PlaneClassification {
    if distance > tolerance {
        PlaneClassification::Front
    } else if distance < -tolerance {
        PlaneClassification::Back
    } else {
        PlaneClassification::OnPlane
    }
}

/// Signed distance from `point` to the plane through the three points of
/// `triangle` (unit normal by right-hand rule). The sign is exact; the
/// magnitude is accurate to rounding.
pub fn signed_distance_to_triangle_plane(triangle: &[Point3<f64>; 3], point: &Point3<f64>) -> f64 {
    let normal = (triangle[1] - triangle[0]).cross(&(triangle[2] - triangle[0]));
    let norm = normal.norm();
    if norm == 0.0 {
        return 0.0;
    }
    oriented_volume(&triangle[0], &triangle[1], &triangle[2], point) / norm
}

/// Compute triangle area
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oriented_volume() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        assert!(oriented_volume(&a, &b, &c, &Point3::new(0.0, 0.0, 1.0)) > 0.0);
        assert!(oriented_volume(&a, &b, &c, &Point3::new(0.0, 0.0, -1.0)) < 0.0);
        assert_eq!(oriented_volume(&a, &b, &c, &Point3::new(0.3, 0.3, 0.0)), 0.0);
    }

    #[test]
    fn test_near_degenerate_sign_is_stable() {
        // d sits a hair above the plane of a large, offset triangle
        let a = Point3::new(1e6, 1e6, 0.0);
        let b = Point3::new(1e6 + 1.0, 1e6, 0.0);
        let c = Point3::new(1e6, 1e6 + 1.0, 0.0);
        let d = Point3::new(1e6 + 0.25, 1e6 + 0.25, 1e-12);
        assert!(oriented_volume(&a, &b, &c, &d) > 0.0);
        let d = Point3::new(1e6 + 0.25, 1e6 + 0.25, -1e-12);
        assert!(oriented_volume(&a, &b, &c, &d) < 0.0);
    }

    #[test]
    fn test_orient2d() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(orient2d(&a, &b, &Point2::new(0.5, 1.0)) > 0.0);
        assert!(orient2d(&a, &b, &Point2::new(0.5, -1.0)) < 0.0);
        assert_eq!(orient2d(&a, &b, &Point2::new(3.0, 0.0)), 0.0);
    }

    #[test]
    fn test_classify_distance() {
        assert_eq!(classify_distance(1.0, 1e-9), PlaneClassification::Front);
        assert_eq!(classify_distance(-1.0, 1e-9), PlaneClassification::Back);
        assert_eq!(classify_distance(1e-12, 1e-9), PlaneClassification::OnPlane);
    }

    #[test]
    fn test_signed_distance_to_triangle_plane() {
        let tri = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(3.0, 0.0, 2.0),
            Point3::new(0.0, 3.0, 2.0),
        ];
        let d = signed_distance_to_triangle_plane(&tri, &Point3::new(5.0, -4.0, 3.5));
        assert!((d - 1.5).abs() < 1e-12);
    }
}
