use nalgebra::{Complex, Matrix2, Vector3};

use crate::error::{BeamError, Result};
use crate::settings;


/// A 2x2 complex amplitude (Jones) matrix. Rows index the beam's current
/// transverse basis `(e_perp, prop x e_perp)`, columns the incident basis.
pub type Jones = Matrix2<Complex<f32>>;

/// Returns the 2x2 rotation matrix re-expressing amplitudes about the
/// propagation vector `prop`, from the basis `e_perp_in` to `e_perp_out`.
///
/// With `c = e_out . e_in` and `s = e_out . (prop x e_in)` the result is
/// `[[c, s], [-s, c]]`, scaled to unit determinant. If either basis vector is
/// degenerate the identity is returned.
pub fn rotation_matrix(
    e_perp_in: Vector3<f32>,
    e_perp_out: Vector3<f32>,
    prop: Vector3<f32>,
) -> Matrix2<f32> {
    let dot1 = e_perp_out.dot(&e_perp_in);
    let evo2 = prop.cross(&e_perp_in);
    let dot2 = e_perp_out.dot(&evo2);

    let result = Matrix2::new(dot1, dot2, -dot2, dot1);
    let det = result.determinant();

    if det.abs() < settings::ROTATION_DET_THRESHOLD {
        log::debug!(
            "degenerate basis rotation (det = {}), using identity",
            det
        );
        return Matrix2::identity();
    }

    result / det.abs().sqrt()
}

/// Rotation matrix for a basis turned by `angle` from `e_perp` towards
/// `prop x e_perp`.
pub fn rotation_from_angle(angle: f32) -> Matrix2<f32> {
    let (sin, cos) = angle.sin_cos();
    Matrix2::new(cos, sin, -sin, cos)
}

/// Rotates an amplitude matrix in its output basis.
pub fn rotate_ampl(rot: &Matrix2<f32>, ampl: &Jones) -> Jones {
    rot.map(Complex::from) * ampl
}

pub fn ampl_intensity(ampl: &Jones) -> f32 {
    0.5 * ampl.norm_squared()
}

/// Checks that `prop` and `e_perp` are unit vectors and perpendicular.
pub fn validate_frame(prop: &Vector3<f32>, e_perp: &Vector3<f32>) -> Result<()> {
    let norm_e_perp_diff = e_perp.norm() - 1.0;
    if norm_e_perp_diff.abs() >= settings::COLINEAR_THRESHOLD {
        return Err(BeamError::InvalidFrame(format!(
            "e-perp is not normalised: {:?}",
            e_perp
        )));
    }

    let norm_prop_diff = prop.norm() - 1.0;
    if norm_prop_diff.abs() >= settings::COLINEAR_THRESHOLD {
        return Err(BeamError::InvalidFrame(format!(
            "propagation vector is not normalised: {:?}",
            prop
        )));
    }

    let dot_product = e_perp.dot(prop);
    if dot_product.abs() >= settings::COLINEAR_THRESHOLD {
        return Err(BeamError::InvalidFrame(format!(
            "e-perp and propagation vector are not perpendicular, e_perp is: {:?}, prop is: {:?}, dot product is: {:?}",
            e_perp, prop, dot_product
        )));
    }

    Ok(())
}
