//! Beam value type for geometric optics beam-splitting codes.
//!
//! A [`beam::Beam`] carries a planar wavefront polygon, its propagation
//! direction and polarization basis, the accumulated Jones matrix and optical
//! path, and the facets it has crossed. Splitting engines clip and extend the
//! polygon, push facet ids, and call [`beam::Beam::rotate`] at every change of
//! direction so that the Jones matrix stays expressed in a consistent frame.

pub mod beam;
pub mod error;
pub mod field;
pub mod geom;
pub mod output;
pub mod settings;

pub use beam::Beam;
pub use error::BeamError;
