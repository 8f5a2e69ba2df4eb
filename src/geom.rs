use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use geo_types::{Coord, LineString, Polygon};

use crate::settings;

#[cfg(test)]
mod tests {

    use super::*;

    fn unit_square() -> Vec<Point3<f32>> {
        vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ]
    }

    #[test]
    fn square_midpoint_and_area() {
        let verts = unit_square();
        let mid = calculate_center_of_mass(verts.iter());
        assert!(mid.coords.norm() < 1e-6);

        let area = area_vector(verts.iter());
        assert!((area.z - 1.0).abs() < 1e-6);
        assert!(area.x.abs() < 1e-6 && area.y.abs() < 1e-6);
    }

    #[test]
    fn reversed_winding_flips_area_vector() {
        let mut verts = unit_square();
        verts.reverse();
        let area = area_vector(verts.iter());
        assert!((area.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn area_is_translation_invariant() {
        let shift = Vector3::new(100.0, -40.0, 7.0);
        let verts: Vec<_> = unit_square().into_iter().map(|p| p + shift).collect();
        let area = area_vector(verts.iter());
        assert!((area.norm() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn dominant_axis() {
        assert_eq!(Axis::dominant(&Vector3::new(0.1, -0.9, 0.2)), Axis::Y);
        assert_eq!(Axis::dominant(&Vector3::new(0.0, 0.0, -1.0)), Axis::Z);
        assert_eq!(Axis::dominant(&Vector3::new(2.0, 1.0, 1.0)), Axis::X);
    }

    #[test]
    fn project_out_is_cyclic() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(Axis::X.project_out(&p), Coord { x: 2.0, y: 3.0 });
        assert_eq!(Axis::Y.project_out(&p), Coord { x: 3.0, y: 1.0 });
        assert_eq!(Axis::Z.project_out(&p), Coord { x: 1.0, y: 2.0 });
    }

    #[test]
    fn spherical_of_axes() {
        let z = SphericalCoord::from_vector(&Vector3::z());
        assert!((z.radius - 1.0).abs() < 1e-6);
        assert!(z.theta.abs() < 1e-6);

        let minus_y = SphericalCoord::from_vector(&(-Vector3::y() * 2.0));
        assert!((minus_y.radius - 2.0).abs() < 1e-6);
        assert!((minus_y.theta - PI / 2.0).abs() < 1e-6);
        assert!((minus_y.phi - 1.5 * PI).abs() < 1e-5);

        let zero = SphericalCoord::from_vector(&Vector3::zeros());
        assert_eq!(zero, SphericalCoord::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn fallback_perpendicular() {
        for v in [Vector3::x(), Vector3::y(), Vector3::new(0.3, -0.2, 0.9)] {
            let v = v.normalize();
            let p = perpendicular_to(&v);
            assert!(p.dot(&v).abs() < settings::COLINEAR_THRESHOLD);
            assert!((p.norm() - 1.0).abs() < 1e-5);
        }
    }
}

/// Represents a plane, defined by a normal and an offset value.
/// Each component of the normal corresponds to a, b, c, respectively.
/// The offset value corresponds to d.
/// The plane is then defined by `ax + by + cz + d = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub offset: f32,
}

impl Plane {
    /// Builds a plane from the coefficients `[a, b, c, d]`.
    pub fn from_coefficients(coefficients: [f32; 4]) -> Self {
        let [a, b, c, d] = coefficients;
        Self {
            normal: Vector3::new(a, b, c),
            offset: d,
        }
    }

    /// Returns `ax + by + cz + d` at a point.
    pub fn evaluate(&self, point: &Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) + self.offset
    }
}

/// A coordinate axis, used to name the coordinate dropped by a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// The axis along which `normal` has its largest absolute component.
    pub fn dominant(normal: &Vector3<f32>) -> Self {
        let (x, y, z) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
        if x >= y && x >= z {
            Axis::X
        } else if y >= z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Drops this coordinate, keeping the other two in cyclic order.
    pub fn project_out(&self, point: &Point3<f32>) -> Coord<f32> {
        match self {
            Axis::X => Coord {
                x: point.y,
                y: point.z,
            },
            Axis::Y => Coord {
                x: point.z,
                y: point.x,
            },
            Axis::Z => Coord {
                x: point.x,
                y: point.y,
            },
        }
    }
}

/// Spherical coordinates: radius, polar angle from +z in `[0, pi]`, and
/// azimuth from +x in `[0, 2pi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalCoord {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl SphericalCoord {
    pub fn new(radius: f32, theta: f32, phi: f32) -> Self {
        Self { radius, theta, phi }
    }

    pub fn from_vector(v: &Vector3<f32>) -> Self {
        let radius = v.norm();
        if radius < settings::VEC_LENGTH_THRESHOLD {
            return Self::new(0.0, 0.0, 0.0);
        }

        let theta = (v.z / radius).clamp(-1.0, 1.0).acos();
        let mut phi = v.y.atan2(v.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }

        Self { radius, theta, phi }
    }
}

/// Arithmetic mean of a set of points. The caller guarantees at least one point.
pub fn calculate_center_of_mass<'a>(
    vertices: impl ExactSizeIterator<Item = &'a Point3<f32>>,
) -> Point3<f32> {
    let len = vertices.len() as f32;
    let sum = vertices.fold(Point3::origin(), |acc, point| acc + point.coords);

    sum / len
}

/// Newell area vector of a closed polygon: its norm is the polygon area and its
/// direction the winding normal. Zero for fewer than 3 vertices.
pub fn area_vector<'a>(
    vertices: impl ExactSizeIterator<Item = &'a Point3<f32>> + Clone,
) -> Vector3<f32> {
    if vertices.len() < 3 {
        return Vector3::zeros();
    }

    // relative to the first vertex to limit cancellation far from the origin
    let origin = match vertices.clone().next() {
        Some(p) => *p,
        None => return Vector3::zeros(),
    };

    let sum = vertices
        .circular_tuple_windows::<(_, _)>()
        .fold(Vector3::zeros(), |acc, (a, b)| {
            acc + (a - origin).cross(&(b - origin))
        });

    sum * 0.5
}

/// A unit vector perpendicular to `dir`, built from whichever of y or x is not
/// colinear with it.
pub fn perpendicular_to(dir: &Vector3<f32>) -> Vector3<f32> {
    let up: Vector3<f32> = if dir.cross(&Vector3::y()).norm() < 0.01 {
        Vector3::x()
    } else {
        Vector3::y()
    };

    (up - up.dot(dir) * dir).normalize()
}

/// Closes a ring of 2D coordinates into a polygon without interiors.
pub fn to_polygon(exterior: Vec<Coord<f32>>) -> Polygon<f32> {
    Polygon::new(LineString(exterior), vec![])
}
