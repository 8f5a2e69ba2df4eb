use std::collections::vec_deque;
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Index, IndexMut};

use geo::Area;
use geo_types::{Coord, Polygon};
use nalgebra::{Complex, Matrix2, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{BeamError, Result};
use crate::field::{self, Jones};
use crate::geom::{self, Axis, Plane, SphericalCoord};
use crate::settings;


/// A beam: a planar wavefront polygon with a propagation direction, a
/// polarization basis, an accumulated Jones matrix and optical path, and the
/// facets it has crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    vertices: VecDeque<Point3<f32>>, // wavefront polygon, in winding order
    path: VecDeque<usize>,           // facet ids, oldest first
    jones: Jones,                    // accumulated amplitude matrix
    optical_path: f32,               // index-weighted travel distance
    front: f32,                      // phase front offset, prop.x + front = 0
    e_perp: Vector3<f32>,            // perpendicular polarization basis
    prop: Vector3<f32>,              // propagation direction
    t: Vector3<f32>,                 // perpendicular axis of the last rotation
    f: Vector3<f32>,                 // parallel axis of the last rotation
    n: Vector3<f32>,                 // direction before the last rotation
    is_internal: bool,               // inside the particle
}

impl Default for Beam {
    fn default() -> Self {
        Self::new()
    }
}

impl Beam {
    /// An empty beam with an identity Jones matrix and no direction or basis.
    pub fn new() -> Self {
        Self {
            vertices: VecDeque::new(),
            path: VecDeque::new(),
            jones: Matrix2::identity(),
            optical_path: 0.0,
            front: 0.0,
            e_perp: Vector3::zeros(),
            prop: Vector3::zeros(),
            t: Vector3::zeros(),
            f: Vector3::zeros(),
            n: Vector3::zeros(),
            is_internal: true,
        }
    }

    pub fn from_vertices(
        vertices: impl IntoIterator<Item = Point3<f32>>,
        optical_path: f32,
    ) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
            optical_path,
            ..Self::new()
        }
    }

    pub fn jones(&self) -> &Jones {
        &self.jones
    }

    pub fn set_jones(&mut self, jones: Jones) {
        self.jones = jones;
    }

    /// Panics if `row` or `col` is not 0 or 1.
    pub fn jones_element(&self, row: usize, col: usize) -> Complex<f32> {
        self.jones[(row, col)]
    }

    /// Panics if `row` or `col` is not 0 or 1.
    pub fn set_jones_element(&mut self, row: usize, col: usize, value: Complex<f32>) {
        self.jones[(row, col)] = value;
    }

    /// Left-multiplies an interface matrix, e.g. a Fresnel matrix, onto the
    /// accumulated amplitude matrix.
    pub fn apply(&mut self, interface: &Jones) {
        self.jones = interface * self.jones;
    }

    pub fn vertices(&self) -> vec_deque::Iter<'_, Point3<f32>> {
        self.vertices.iter()
    }

    pub fn path(&self) -> vec_deque::Iter<'_, usize> {
        self.path.iter()
    }

    /// Drops the vertex polygon. Path, Jones matrix and scalars are kept.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn push_front_vertex(&mut self, vertex: Point3<f32>) {
        self.vertices.push_front(vertex);
    }

    pub fn push_back_vertex(&mut self, vertex: Point3<f32>) {
        self.vertices.push_back(vertex);
    }

    pub fn push_front_path(&mut self, facet: usize) {
        self.path.push_front(facet);
    }

    pub fn push_back_path(&mut self, facet: usize) {
        self.path.push_back(facet);
    }

    pub fn optical_path(&self) -> f32 {
        self.optical_path
    }

    pub fn add_optical_path(&mut self, delta: f32) {
        self.optical_path += delta;
    }

    pub fn front(&self) -> f32 {
        self.front
    }

    pub fn set_front(&mut self, front: f32) {
        self.front = front;
    }

    /// Moves the phase front so that it contains `point`.
    pub fn set_front_through(&mut self, point: &Point3<f32>) {
        self.front = -self.prop.dot(&point.coords);
    }

    /// Signed distance of `point` ahead of the phase front.
    pub fn front_distance(&self, point: &Point3<f32>) -> f32 {
        self.prop.dot(&point.coords) + self.front
    }

    pub fn prop(&self) -> Vector3<f32> {
        self.prop
    }

    pub fn e_perp(&self) -> Vector3<f32> {
        self.e_perp
    }

    /// The parallel polarization basis, `prop x e_perp`.
    pub fn e_par(&self) -> Vector3<f32> {
        self.prop.cross(&self.e_perp)
    }

    /// Sets the propagation direction and polarization basis, which must be
    /// perpendicular unit vectors. The Jones matrix is not touched.
    pub fn set_frame(&mut self, prop: Vector3<f32>, e_perp: Vector3<f32>) -> Result<()> {
        field::validate_frame(&prop, &e_perp)?;
        self.prop = prop;
        self.e_perp = e_perp;
        Ok(())
    }

    /// The `(t, f, n)` frame recorded by the last rotation.
    pub fn local_frame(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        (self.t, self.f, self.n)
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    pub fn set_internal(&mut self, is_internal: bool) {
        self.is_internal = is_internal;
    }

    /// Turns the beam to the new propagation direction `k`, re-expressing the
    /// Jones matrix in the basis normal to the plane containing the old and new
    /// directions.
    ///
    /// If the direction is unchanged or reversed the basis is kept, projected
    /// normal to `k`, and the Jones matrix is left as is. A beam without a basis
    /// takes it from the reference axis `ey`, projected normal to `k`.
    pub fn rotate(&mut self, k: &Vector3<f32>, ey: &Vector3<f32>) -> Result<&mut Self> {
        let k_norm = k.norm();
        if k_norm < settings::VEC_LENGTH_THRESHOLD {
            return Err(BeamError::DegenerateVector(format!(
                "new propagation direction {:?}",
                k
            )));
        }
        let k = k / k_norm;

        let old_prop = self.prop;
        let e_perp = match self.current_basis() {
            Some(e_in) => {
                let t = old_prop.cross(&k);
                let t_norm = t.norm();
                if t_norm < settings::VEC_LENGTH_THRESHOLD {
                    log::debug!("direction unchanged or reversed, keeping basis");
                    // k is within the threshold of +-old_prop, so e_in is far from k
                    orthogonalise(&e_in, &k).unwrap_or(e_in)
                } else {
                    let t = t / t_norm;
                    let rot = field::rotation_matrix(e_in, t, old_prop);
                    self.jones = field::rotate_ampl(&rot, &self.jones);
                    t
                }
            }
            None => {
                log::debug!("beam has no basis, taking it from the reference axis");
                reference_basis(&k, ey)
            }
        };

        self.n = old_prop;
        self.prop = k;
        self.e_perp = e_perp;
        self.t = e_perp;
        self.f = k.cross(&e_perp);

        Ok(self)
    }

    /// Returns a copy of this beam with its Jones matrix re-expressed in the
    /// basis `new_e`, projected normal to the propagation direction.
    pub fn rotate_plane(&self, new_e: &Vector3<f32>) -> Result<Beam> {
        if (self.prop.norm() - 1.0).abs() >= settings::COLINEAR_THRESHOLD {
            return Err(BeamError::InvalidFrame(format!(
                "propagation direction is not set: {:?}",
                self.prop
            )));
        }

        let target = orthogonalise(new_e, &self.prop).ok_or_else(|| {
            BeamError::DegenerateVector(format!(
                "basis {:?} is parallel to the propagation direction",
                new_e
            ))
        })?;

        let mut beam = self.clone();
        if let Some(e_in) = self.current_basis() {
            let rot = field::rotation_matrix(e_in, target, self.prop);
            beam.jones = field::rotate_ampl(&rot, &self.jones);
        }
        beam.e_perp = target;
        beam.t = target;
        beam.f = self.prop.cross(&target);
        beam.n = self.prop;

        Ok(beam)
    }

    /// Projects the polygon along the propagation direction onto the plane
    /// `ax + by + cz + d = 0` and drops the coordinate `axis`.
    pub fn projection(&self, coefficients: [f32; 4], axis: Axis) -> Result<Polygon<f32>> {
        if self.vertices.is_empty() {
            return Err(BeamError::EmptyBeam);
        }

        let plane = Plane::from_coefficients(coefficients);
        let cos = plane.normal.dot(&self.prop);
        if cos.abs() < settings::COLINEAR_THRESHOLD {
            return Err(BeamError::ParallelPlane(cos));
        }

        let exterior = self
            .vertices
            .iter()
            .map(|vertex| {
                let dist = plane.evaluate(vertex) / cos;
                axis.project_out(&(vertex - dist * self.prop))
            })
            .collect();

        Ok(geom::to_polygon(exterior))
    }

    pub fn spherical(&self) -> SphericalCoord {
        SphericalCoord::from_vector(&self.prop)
    }

    pub fn center(&self) -> Result<Point3<f32>> {
        if self.vertices.is_empty() {
            return Err(BeamError::EmptyBeam);
        }
        Ok(geom::calculate_center_of_mass(self.vertices.iter()))
    }

    /// Area of the polygon in its own plane.
    pub fn area(&self) -> Result<f32> {
        if self.vertices.is_empty() {
            return Err(BeamError::EmptyBeam);
        }
        Ok(geom::area_vector(self.vertices.iter()).norm())
    }

    /// Area of the polygon projected normal to the propagation direction.
    pub fn cross_section(&self) -> Result<f32> {
        if self.vertices.is_empty() {
            return Err(BeamError::EmptyBeam);
        }
        if self.vertices.len() < 3 {
            return Ok(0.0);
        }
        Ok(self.transverse_polygon()?.unsigned_area())
    }

    /// Orthogonal projection of `point` onto the beam plane, in the transverse
    /// frame `(e_perp, prop x e_perp)`.
    pub fn project_vertex(&self, point: &Point3<f32>) -> Result<Coord<f32>> {
        if self.vertices.is_empty() {
            return Err(BeamError::EmptyBeam);
        }
        let (u, v) = self.transverse_frame()?;
        Ok(Coord {
            x: point.coords.dot(&u),
            y: point.coords.dot(&v),
        })
    }

    /// The polygon in the same 2D frame as [`Beam::project_vertex`].
    pub fn transverse_polygon(&self) -> Result<Polygon<f32>> {
        if self.vertices.is_empty() {
            return Err(BeamError::EmptyBeam);
        }
        let (u, v) = self.transverse_frame()?;
        let exterior = self
            .vertices
            .iter()
            .map(|vertex| Coord {
                x: vertex.coords.dot(&u),
                y: vertex.coords.dot(&v),
            })
            .collect();

        Ok(geom::to_polygon(exterior))
    }

    pub fn intensity(&self) -> f32 {
        field::ampl_intensity(&self.jones)
    }

    /// Intensity weighted by the cross section.
    pub fn power(&self) -> Result<f32> {
        Ok(self.intensity() * self.cross_section()?)
    }

    /// The polarization basis made exactly normal to `prop`, or `None` if
    /// either vector is unset.
    fn current_basis(&self) -> Option<Vector3<f32>> {
        if (self.prop.norm() - 1.0).abs() >= settings::COLINEAR_THRESHOLD {
            return None;
        }
        if self.e_perp.norm() < settings::VEC_LENGTH_THRESHOLD {
            return None;
        }
        orthogonalise(&self.e_perp, &self.prop.normalize())
    }

    fn transverse_frame(&self) -> Result<(Vector3<f32>, Vector3<f32>)> {
        if field::validate_frame(&self.prop, &self.e_perp).is_ok() {
            return Ok((self.e_perp, self.e_par()));
        }
        if (self.prop.norm() - 1.0).abs() >= settings::COLINEAR_THRESHOLD {
            return Err(BeamError::InvalidFrame(format!(
                "propagation direction is not set: {:?}",
                self.prop
            )));
        }
        let u = geom::perpendicular_to(&self.prop);
        Ok((u, self.prop.cross(&u)))
    }
}

/// A unit basis normal to `k`, from `ey` if it is not colinear with `k`.
fn reference_basis(k: &Vector3<f32>, ey: &Vector3<f32>) -> Vector3<f32> {
    orthogonalise(ey, k).unwrap_or_else(|| geom::perpendicular_to(k))
}

/// `e` with its component along the unit vector `axis` removed, normalised.
fn orthogonalise(e: &Vector3<f32>, axis: &Vector3<f32>) -> Option<Vector3<f32>> {
    let projected = e - e.dot(axis) * axis;
    let len = projected.norm();
    if len < settings::VEC_LENGTH_THRESHOLD {
        None
    } else {
        Some(projected / len)
    }
}

impl Index<(usize, usize)> for Beam {
    type Output = Complex<f32>;

    fn index(&self, (row, col): (usize, usize)) -> &Complex<f32> {
        &self.jones[(row, col)]
    }
}

impl IndexMut<(usize, usize)> for Beam {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Complex<f32> {
        &mut self.jones[(row, col)]
    }
}

impl fmt::Display for Beam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Beam:")?;
        writeln!(f, "  Vertices:       {}", self.vertices.len())?;
        writeln!(f, "  Path:           {:?}", self.path)?;
        writeln!(f, "  Optical Path:   {:.6}", self.optical_path)?;
        writeln!(
            f,
            "  Direction:      ({:.6}, {:.6}, {:.6})",
            self.prop.x, self.prop.y, self.prop.z
        )?;
        writeln!(
            f,
            "  E-perp:         ({:.6}, {:.6}, {:.6})",
            self.e_perp.x, self.e_perp.y, self.e_perp.z
        )?;
        writeln!(f, "  Internal:       {}", self.is_internal)?;
        writeln!(f, "  Intensity:      {:.6}", self.intensity())
    }
}
