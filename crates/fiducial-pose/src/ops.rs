use glam::{DMat3, DQuat, DVec3};
use nalgebra::{SMatrix, SVector};

use crate::pnp::PnPError;

/// Minimum |sin| of the angle between consecutive quad edges.
const MIN_CORNER_SINE: f64 = 1e-6;

/// Smallest determinant accepted for the small linear systems below.
const DET_EPS: f64 = 1e-15;

/// Unit square corners in marker order (TL, TR, BR, BL), y pointing up.
const UNIT_SQUARE: [[f64; 2]; 4] = [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]];

/// Generate the 3D object points of a square in the canonical order and z=0 plane.
pub fn square_object_points(square_length: f64) -> [[f64; 3]; 4] {
    let h = square_length / 2.0;
    [[-h, h, 0.0], [h, h, 0.0], [h, -h, 0.0], [-h, -h, 0.0]]
}

/// Build a glam matrix from row-major arrays.
#[inline]
pub(crate) fn mat3_from_rows(rows: &[[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(rows).transpose()
}

/// Convert a glam matrix to row-major arrays.
#[inline]
pub(crate) fn mat3_to_rows(m: &DMat3) -> [[f64; 3]; 3] {
    m.transpose().to_cols_array_2d()
}

/// Rodrigues vector (log map) of a rotation matrix.
pub fn rotation_to_rvec(rotation: &[[f64; 3]; 3]) -> [f64; 3] {
    let q = DQuat::from_mat3(&mat3_from_rows(rotation)).normalize();
    // keep the angle in [0, pi]
    let q = if q.w < 0.0 { -q } else { q };
    q.to_scaled_axis().to_array()
}

/// Rotation matrix (exp map) of a Rodrigues vector.
pub fn rvec_to_rotation(rvec: &[f64; 3]) -> [[f64; 3]; 3] {
    let q = DQuat::from_scaled_axis(DVec3::from_array(*rvec));
    mat3_to_rows(&DMat3::from_quat(q))
}

/// Reject corner sets that cannot come from a square seen in front of the camera.
///
/// The four points must be finite and form a strictly convex quadrilateral.
pub(crate) fn check_quad(points: &[[f64; 2]; 4]) -> Result<(), PnPError> {
    if points.iter().flatten().any(|v| !v.is_finite()) {
        return Err(PnPError::DegenerateCorners("corner is not finite"));
    }

    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = points[i];
        let b = points[(i + 1) % 4];
        let c = points[(i + 2) % 4];
        let e1 = [b[0] - a[0], b[1] - a[1]];
        let e2 = [c[0] - b[0], c[1] - b[1]];
        let n1 = e1[0].hypot(e1[1]);
        let n2 = e2[0].hypot(e2[1]);
        if n1 == 0.0 || n2 == 0.0 {
            return Err(PnPError::DegenerateCorners("coincident corners"));
        }
        let sine = (e1[0] * e2[1] - e1[1] * e2[0]) / (n1 * n2);
        if sine.abs() < MIN_CORNER_SINE {
            return Err(PnPError::DegenerateCorners("collinear corners"));
        }
        if sign != 0.0 && sine.signum() != sign {
            return Err(PnPError::DegenerateCorners(
                "corners do not form a convex quadrilateral",
            ));
        }
        sign = sine.signum();
    }
    Ok(())
}

/// Homography mapping the square of side `square_length` (z=0 plane, marker order)
/// onto the four destination points, normalized so that `H[2][2] == 1`.
///
/// The system is solved on the unit square and rescaled afterwards, which keeps it
/// well conditioned for markers of any physical size.
pub(crate) fn homography_from_square(
    dst: &[[f64; 2]; 4],
    square_length: f64,
) -> Result<[[f64; 3]; 3], PnPError> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (i, (src, dst)) in UNIT_SQUARE.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (src[0], src[1]);
        let (u, v) = (dst[0], dst[1]);

        let r = 2 * i;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -u * x;
        a[(r, 7)] = -u * y;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -v * x;
        a[(r + 1, 7)] = -v * y;
        b[r + 1] = v;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or(PnPError::SolveFailed("homography system is singular"))?;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(PnPError::SolveFailed("homography is not finite"));
    }

    // unit square -> model plane scale
    let s = 2.0 / square_length;
    let homo = [
        [h[0] * s, h[1] * s, h[2]],
        [h[3] * s, h[4] * s, h[5]],
        [h[6] * s, h[7] * s, 1.0],
    ];

    if mat3_from_rows(&homo).determinant().abs() < DET_EPS {
        return Err(PnPError::SolveFailed("homography is rank deficient"));
    }

    Ok(homo)
}

/// Least-squares translation for a known rotation, in normalized image coordinates.
///
/// Each correspondence contributes `t_x - u t_z = u (Rp)_z - (Rp)_x` and
/// `t_y - v t_z = v (Rp)_z - (Rp)_y`.
pub(crate) fn translation_for_rotation(
    object: &[[f64; 3]; 4],
    norm: &[[f64; 2]; 4],
    rotation: &DMat3,
) -> Result<DVec3, PnPError> {
    let mut ata = DMat3::ZERO;
    let mut atb = DVec3::ZERO;
    for (p, uv) in object.iter().zip(norm.iter()) {
        let rp = *rotation * DVec3::from_array(*p);
        let (u, v) = (uv[0], uv[1]);

        let rows = [
            (DVec3::new(1.0, 0.0, -u), u * rp.z - rp.x),
            (DVec3::new(0.0, 1.0, -v), v * rp.z - rp.y),
        ];
        for (row, rhs) in rows {
            ata += DMat3::from_cols(row * row.x, row * row.y, row * row.z);
            atb += row * rhs;
        }
    }

    if ata.determinant().abs() < DET_EPS {
        return Err(PnPError::SolveFailed("translation system is singular"));
    }
    Ok(ata.inverse() * atb)
}

/// Root-mean-square reprojection error for normalized image coordinates (K = I).
pub(crate) fn rmse_normalized(
    object: &[[f64; 3]; 4],
    norm: &[[f64; 2]; 4],
    rotation: &DMat3,
    translation: &DVec3,
) -> Result<f64, PnPError> {
    let mut sum_sq = 0.0f64;
    for (p, uv) in object.iter().zip(norm.iter()) {
        let pc = *rotation * DVec3::from_array(*p) + *translation;
        if pc.z <= 1e-12 {
            return Err(PnPError::InvalidPose("marker corner lies behind the camera"));
        }
        let du = pc.x / pc.z - uv[0];
        let dv = pc.y / pc.z - uv[1];
        sum_sq += du.mul_add(du, dv * dv);
    }
    Ok((sum_sq / object.len() as f64).sqrt())
}
