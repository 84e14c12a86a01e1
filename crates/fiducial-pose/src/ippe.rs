//! Infinitesimal Plane-based Pose Estimation (IPPE)
//!
//! This module estimates the two candidate poses of a square planar marker from
//! its four image corners, following the IPPE method.
//!
//! The homography between the marker plane and the normalized image is
//! linearised at the marker centre. Its Jacobian there fixes the rotation up to
//! a two-fold reflection ambiguity, which IPPE resolves in closed form. Each
//! rotation's translation is then recovered by linear least squares and the
//! candidates are ranked by reprojection error.
//!
//! References:
//! - T. Collins and A. Bartoli, "Infinitesimal Plane-based Pose Estimation",
//!   IJCV 2014.
//! - OpenCV implementation reference: modules/calib3d/src/ippe.hpp/.cpp

use crate::ops::{
    check_quad, homography_from_square, mat3_to_rows, rmse_normalized, rotation_to_rvec,
    square_object_points, translation_for_rotation,
};
use crate::pnp::{PnPError, PnPResult};
use glam::{DMat3, DQuat, DVec3};

/// Result holding the two IPPE pose solutions sorted by reprojection error (best first).
#[derive(Debug, Clone)]
pub struct IPPEResult {
    /// Lowest-error pose solution.
    pub first: PnPResult,
    /// Second pose solution, if it places the marker in front of the camera.
    pub second: Option<PnPResult>,
}

/// Marker type for the IPPE solver.
pub struct IPPE;

impl IPPE {
    /// Estimate the candidate poses of a square planar object from its four image corners.
    ///
    /// The four object points are implicitly defined as a square of side length `square_length`
    /// on the plane z=0 with the following order (object coordinates):
    ///  - p0 = [-L/2,  L/2, 0]
    ///  - p1 = [ L/2,  L/2, 0]
    ///  - p2 = [ L/2, -L/2, 0]
    ///  - p3 = [-L/2, -L/2, 0]
    ///
    /// The `image_points_norm` are the corresponding undistorted, normalized image coordinates
    /// (i.e. pixel coordinates premultiplied by K^{-1}).
    pub fn solve_square(
        image_points_norm: &[[f64; 2]; 4],
        square_length: f64,
    ) -> Result<IPPEResult, PnPError> {
        if !(square_length.is_finite() && square_length > 0.0) {
            return Err(PnPError::InvalidMarkerSize(square_length));
        }
        check_quad(image_points_norm)?;

        let h = homography_from_square(image_points_norm, square_length)?;

        // Jacobian of the homography at the model origin and the image of the origin.
        let jac = [
            [h[0][0] - h[2][0] * h[0][2], h[0][1] - h[2][1] * h[0][2]],
            [h[1][0] - h[2][0] * h[1][2], h[1][1] - h[2][1] * h[1][2]],
        ];
        let (r1, r2) = rotations_from_jacobian(&jac, h[0][2], h[1][2])?;

        let object = square_object_points(square_length);
        let mut candidates = [r1, r2]
            .iter()
            .filter_map(|r| pose_for_rotation(&object, image_points_norm, r).ok())
            .collect::<Vec<_>>();
        candidates.sort_by(|a, b| a.reproj_rmse.total_cmp(&b.reproj_rmse));

        let mut candidates = candidates.into_iter();
        let first = candidates.next().ok_or(PnPError::InvalidPose(
            "no candidate places the marker in front of the camera",
        ))?;

        Ok(IPPEResult {
            first,
            second: candidates.next(),
        })
    }
}

/// Closed-form IPPE rotations from the 2x2 Jacobian `jac` at the point `(p, q)`.
fn rotations_from_jacobian(
    jac: &[[f64; 2]; 2],
    p: f64,
    q: f64,
) -> Result<(DMat3, DMat3), PnPError> {
    // rotation taking the optical axis onto the ray through (p, q)
    let ray = DVec3::new(p, q, 1.0).normalize();
    let rv_mat = DMat3::from_quat(DQuat::from_rotation_arc(DVec3::Z, ray));
    let rv = mat3_to_rows(&rv_mat);

    let b00 = rv[0][0] - p * rv[2][0];
    let b01 = rv[0][1] - p * rv[2][1];
    let b10 = rv[1][0] - q * rv[2][0];
    let b11 = rv[1][1] - q * rv[2][1];

    let det = b00 * b11 - b01 * b10;
    if det.abs() < f64::EPSILON {
        return Err(PnPError::SolveFailed("IPPE ray basis is singular"));
    }
    let dt_inv = 1.0 / det;
    let (binv00, binv01) = (dt_inv * b11, -dt_inv * b01);
    let (binv10, binv11) = (-dt_inv * b10, dt_inv * b00);

    let a00 = binv00 * jac[0][0] + binv01 * jac[1][0];
    let a01 = binv00 * jac[0][1] + binv01 * jac[1][1];
    let a10 = binv10 * jac[0][0] + binv11 * jac[1][0];
    let a11 = binv10 * jac[0][1] + binv11 * jac[1][1];

    // largest singular value of A
    let ata00 = a00 * a00 + a01 * a01;
    let ata01 = a00 * a10 + a01 * a11;
    let ata11 = a10 * a10 + a11 * a11;
    let gamma2 = 0.5
        * (ata00 + ata11 + ((ata00 - ata11) * (ata00 - ata11) + 4.0 * ata01 * ata01).sqrt());
    let gamma = gamma2.max(0.0).sqrt();
    if !gamma.is_finite() || gamma < f64::from(f32::EPSILON) {
        return Err(PnPError::SolveFailed("IPPE Jacobian has no scale"));
    }

    let (rt00, rt01) = (a00 / gamma, a01 / gamma);
    let (rt10, rt11) = (a10 / gamma, a11 / gamma);

    let b0 = (1.0 - rt00 * rt00 - rt10 * rt10).max(0.0).sqrt();
    let mut b1 = (1.0 - rt01 * rt01 - rt11 * rt11).max(0.0).sqrt();
    if -rt00 * rt01 - rt10 * rt11 < 0.0 {
        b1 = -b1;
    }

    let complete = |b0: f64, b1: f64| {
        let c0 = DVec3::new(rt00, rt10, b0);
        let c1 = DVec3::new(rt01, rt11, b1);
        rv_mat * DMat3::from_cols(c0, c1, c0.cross(c1))
    };

    Ok((complete(b0, b1), complete(-b0, -b1)))
}

fn pose_for_rotation(
    object: &[[f64; 3]; 4],
    norm: &[[f64; 2]; 4],
    rotation: &DMat3,
) -> Result<PnPResult, PnPError> {
    let translation = translation_for_rotation(object, norm, rotation)?;
    let reproj_rmse = rmse_normalized(object, norm, rotation, &translation)?;

    let rotation = mat3_to_rows(rotation);
    Ok(PnPResult {
        rvec: rotation_to_rvec(&rotation),
        rotation,
        translation: translation.to_array(),
        reproj_rmse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{mat3_from_rows, rvec_to_rotation};
    use approx::assert_relative_eq;

    fn project_norm(
        rotation: &[[f64; 3]; 3],
        translation: &[f64; 3],
        side: f64,
    ) -> [[f64; 2]; 4] {
        let r = mat3_from_rows(rotation);
        let t = DVec3::from_array(*translation);
        let mut out = [[0.0; 2]; 4];
        for (o, p) in out.iter_mut().zip(square_object_points(side).iter()) {
            let pc = r * DVec3::from_array(*p) + t;
            *o = [pc.x / pc.z, pc.y / pc.z];
        }
        out
    }

    #[test]
    fn test_solve_square_frontal() -> Result<(), PnPError> {
        // facing the camera: marker y up maps to camera y down
        let rotation = [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];
        let translation = [0.0, 0.0, 0.5];
        let norm = project_norm(&rotation, &translation, 0.1);

        let res = IPPE::solve_square(&norm, 0.1)?;
        for i in 0..3 {
            assert_relative_eq!(res.first.translation[i], translation[i], epsilon = 1e-9);
            for j in 0..3 {
                assert_relative_eq!(res.first.rotation[i][j], rotation[i][j], epsilon = 1e-9);
            }
        }
        assert!(res.first.reproj_rmse < 1e-9);
        Ok(())
    }

    #[test]
    fn test_solve_square_oblique_returns_both_candidates() -> Result<(), PnPError> {
        let tilt = rvec_to_rotation(&[0.5, 0.3, 0.1]);
        let flip = mat3_from_rows(&[[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]);
        let rotation = mat3_to_rows(&(mat3_from_rows(&tilt) * flip));
        let translation = [0.02, -0.01, 0.3];
        let norm = project_norm(&rotation, &translation, 0.05);

        let res = IPPE::solve_square(&norm, 0.05)?;
        for i in 0..3 {
            assert_relative_eq!(res.first.translation[i], translation[i], epsilon = 1e-7);
        }
        let second = res.second.expect("oblique view has a second candidate");
        assert!(second.reproj_rmse >= res.first.reproj_rmse);
        Ok(())
    }

    #[test]
    fn test_solve_square_rejects_bad_size() {
        let norm = [[-0.5, 0.5], [0.5, 0.5], [0.5, -0.5], [-0.5, -0.5]];
        assert!(matches!(
            IPPE::solve_square(&norm, 0.0),
            Err(PnPError::InvalidMarkerSize(_))
        ));
        assert!(matches!(
            IPPE::solve_square(&norm, f64::NAN),
            Err(PnPError::InvalidMarkerSize(_))
        ));
    }

    #[test]
    fn test_solve_square_rejects_collinear() {
        let norm = [[0.0, 0.0], [0.1, 0.0], [0.2, 0.0], [0.3, 0.0]];
        assert!(matches!(
            IPPE::solve_square(&norm, 0.1),
            Err(PnPError::DegenerateCorners(_))
        ));
    }
}
