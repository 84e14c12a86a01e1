use bincode::{Decode, Encode};
use fiducial_pose::CameraIntrinsics;

use crate::error::{CalibrationError, CalibrationResult};

/// Output of an offline camera calibration.
///
/// The field order is part of the file format: camera matrix, distortion
/// coefficients, then the per-image rotation and translation vectors. Only the
/// first two are needed at runtime.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct CalibrationRecord {
    /// 3x3 camera matrix, row-major.
    pub camera_matrix: [[f64; 3]; 3],
    /// OpenCV-ordered distortion coefficients.
    pub dist_coeffs: Vec<f64>,
    /// Axis-angle rotation of the board in each calibration image.
    pub rvecs: Vec<[f64; 3]>,
    /// Translation of the board in each calibration image.
    pub tvecs: Vec<[f64; 3]>,
}

impl CalibrationRecord {
    /// A record holding intrinsics only, with no per-image extrinsics.
    pub fn from_intrinsics(intrinsics: &CameraIntrinsics) -> Self {
        Self {
            camera_matrix: *intrinsics.camera_matrix(),
            dist_coeffs: intrinsics.distortion_coeffs().to_vec(),
            rvecs: Vec::new(),
            tvecs: Vec::new(),
        }
    }

    /// Number of calibration images the extrinsics describe.
    pub fn num_views(&self) -> usize {
        self.rvecs.len()
    }

    /// Check the record for internal consistency.
    pub fn validate(&self) -> CalibrationResult<()> {
        if self.rvecs.len() != self.tvecs.len() {
            return Err(CalibrationError::Corrupt(format!(
                "{} rotation vectors but {} translation vectors",
                self.rvecs.len(),
                self.tvecs.len()
            )));
        }
        if self
            .rvecs
            .iter()
            .chain(self.tvecs.iter())
            .flatten()
            .any(|v| !v.is_finite())
        {
            return Err(CalibrationError::Corrupt("non-finite extrinsic parameter".into()));
        }
        Ok(())
    }

    /// Build validated camera intrinsics from the first two fields.
    pub fn to_intrinsics(&self) -> CalibrationResult<CameraIntrinsics> {
        Ok(CameraIntrinsics::new(self.camera_matrix, self.dist_coeffs.clone())?)
    }
}

/// Board-frame corner positions of a `rows` x `cols` checkerboard.
///
/// Points lie on z = 0, row-major with x varying fastest, spaced `square_size` apart.
pub fn checkerboard_points(rows: usize, cols: usize, square_size: f64) -> Vec<[f64; 3]> {
    (0..cols)
        .flat_map(|j| {
            (0..rows).map(move |i| [i as f64 * square_size, j as f64 * square_size, 0.0])
        })
        .collect()
}
