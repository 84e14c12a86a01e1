//! Camera intrinsics and lens distortion handling for the pose solvers.
use thiserror::Error;

/// Error types for camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Invalid camera intrinsics matrix
    #[error("Invalid camera intrinsics matrix: {0}")]
    InvalidIntrinsics(String),

    /// Invalid distortion parameters
    #[error("Invalid distortion parameters: {0}")]
    InvalidDistortion(String),

    /// The point lies on or behind the camera plane and cannot be projected.
    #[error("Point has non-positive depth {0}")]
    BehindCamera(f64),
}

/// Result type for camera operations.
pub type CameraResult<T> = Result<T, CameraError>;

/// Represents polynomial distortion parameters using the Brown-Conrady model.
///
/// The rational radial part is `(1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[allow(missing_docs)]
pub struct PolynomialDistortion {
    /// Radial distortion coefficients
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
    pub k5: f64,
    pub k6: f64,
    /// Tangential distortion coefficients
    pub p1: f64,
    pub p2: f64,
}

impl PolynomialDistortion {
    /// Build the model from a coefficient vector in calibration order.
    ///
    /// Accepted lengths are 0, 4, 5 and 8, laid out as
    /// `k1, k2, p1, p2[, k3[, k4, k5, k6]]`.
    pub fn from_coeffs(coeffs: &[f64]) -> CameraResult<Self> {
        if let Some(bad) = coeffs.iter().find(|c| !c.is_finite()) {
            return Err(CameraError::InvalidDistortion(format!(
                "coefficient {bad} is not finite"
            )));
        }

        let at = |i: usize| coeffs.get(i).copied().unwrap_or(0.0);
        match coeffs.len() {
            0 | 4 | 5 | 8 => Ok(Self {
                k1: at(0),
                k2: at(1),
                p1: at(2),
                p2: at(3),
                k3: at(4),
                k4: at(5),
                k5: at(6),
                k6: at(7),
            }),
            n => Err(CameraError::InvalidDistortion(format!(
                "expected 0, 4, 5 or 8 coefficients, got {n}"
            ))),
        }
    }

    /// Check if there is any distortion.
    pub fn has_distortion(&self) -> bool {
        [
            self.k1, self.k2, self.k3, self.k4, self.k5, self.k6, self.p1, self.p2,
        ]
        .iter()
        .any(|&c| c != 0.0)
    }

    /// Apply the model to a point in normalized image coordinates.
    pub fn distort_normalized(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let kr = (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
            / (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6);

        let xd = x * kr + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * kr + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (xd, yd)
    }

    /// Invert the model by fixed-point iteration, in normalized image coordinates.
    pub fn undistort_normalized(&self, xd: f64, yd: f64) -> (f64, f64) {
        const MAX_ITERATIONS: usize = 20;
        const EPSILON: f64 = 1e-12;

        let (mut x, mut y) = (xd, yd);
        for _ in 0..MAX_ITERATIONS {
            let r2 = x * x + y * y;
            let r4 = r2 * r2;
            let r6 = r4 * r2;

            let icdist = (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6)
                / (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6);
            let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

            let x_next = (xd - dx) * icdist;
            let y_next = (yd - dy) * icdist;
            let step = (x_next - x).abs().max((y_next - y).abs());
            x = x_next;
            y = y_next;

            if step < EPSILON {
                break;
            }
        }
        (x, y)
    }
}

/// Intrinsic parameters of a calibrated pinhole camera.
///
/// Holds the 3x3 camera matrix and the distortion coefficient vector exactly as
/// produced by calibration. Immutable once built; share it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraIntrinsics {
    camera_matrix: [[f64; 3]; 3],
    distortion_coeffs: Vec<f64>,
    distortion: PolynomialDistortion,
}

impl CameraIntrinsics {
    /// Create intrinsics from a camera matrix and a distortion coefficient vector.
    ///
    /// The matrix must have the form `[[fx, s, cx], [0, fy, cy], [0, 0, 1]]`
    /// with positive focal lengths.
    pub fn new(camera_matrix: [[f64; 3]; 3], distortion_coeffs: Vec<f64>) -> CameraResult<Self> {
        let k = &camera_matrix;
        if k.iter().flatten().any(|v| !v.is_finite()) {
            return Err(CameraError::InvalidIntrinsics(
                "matrix contains non-finite values".to_string(),
            ));
        }
        if k[1][0] != 0.0 || k[2][0] != 0.0 || k[2][1] != 0.0 || k[2][2] != 1.0 {
            return Err(CameraError::InvalidIntrinsics(
                "Intrinsics matrix must have form [[fx, s, cx], [0, fy, cy], [0, 0, 1]]"
                    .to_string(),
            ));
        }
        if k[0][0] <= 0.0 || k[1][1] <= 0.0 {
            return Err(CameraError::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={} fy={}",
                k[0][0], k[1][1]
            )));
        }

        let distortion = PolynomialDistortion::from_coeffs(&distortion_coeffs)?;

        Ok(Self {
            camera_matrix,
            distortion_coeffs,
            distortion,
        })
    }

    /// Undistorted pinhole camera from focal lengths and principal point.
    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> CameraResult<Self> {
        Self::new([[fx, 0.0, cx], [0.0, fy, cy], [0.0, 0.0, 1.0]], Vec::new())
    }

    /// The 3x3 camera matrix.
    pub fn camera_matrix(&self) -> &[[f64; 3]; 3] {
        &self.camera_matrix
    }

    /// The raw distortion coefficients.
    pub fn distortion_coeffs(&self) -> &[f64] {
        &self.distortion_coeffs
    }

    /// The parsed distortion model.
    pub fn distortion(&self) -> &PolynomialDistortion {
        &self.distortion
    }

    /// Focal length in x direction
    #[inline]
    pub fn fx(&self) -> f64 {
        self.camera_matrix[0][0]
    }

    /// Focal length in y direction
    #[inline]
    pub fn fy(&self) -> f64 {
        self.camera_matrix[1][1]
    }

    /// Principal point x coordinate
    #[inline]
    pub fn cx(&self) -> f64 {
        self.camera_matrix[0][2]
    }

    /// Principal point y coordinate
    #[inline]
    pub fn cy(&self) -> f64 {
        self.camera_matrix[1][2]
    }

    #[inline]
    fn skew(&self) -> f64 {
        self.camera_matrix[0][1]
    }

    /// Map a pixel to undistorted normalized image coordinates (`K^-1`, then undistort).
    pub fn normalize_pixel(&self, pixel: [f64; 2]) -> [f64; 2] {
        let yd = (pixel[1] - self.cy()) / self.fy();
        let xd = (pixel[0] - self.cx() - self.skew() * yd) / self.fx();
        if self.distortion.has_distortion() {
            let (x, y) = self.distortion.undistort_normalized(xd, yd);
            [x, y]
        } else {
            [xd, yd]
        }
    }

    /// Project a camera-frame point to pixels, applying lens distortion.
    pub fn project(&self, point: [f64; 3]) -> CameraResult<[f64; 2]> {
        let [x, y, z] = point;
        if z <= 0.0 {
            return Err(CameraError::BehindCamera(z));
        }
        let (xd, yd) = self.distortion.distort_normalized(x / z, y / z);
        Ok([
            self.fx() * xd + self.skew() * yd + self.cx(),
            self.fy() * yd + self.cy(),
        ])
    }
}
