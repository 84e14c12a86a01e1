//! Common data types shared by the pose solvers.

use crate::camera::CameraError;
use thiserror::Error;

/// Error types for the pose solvers.
#[derive(Debug, Error)]
pub enum PnPError {
    /// Invalid input data - the square solver takes exactly four corners.
    #[error("square marker solver requires exactly {required} corners, got {actual}")]
    InvalidCornerCount {
        /// Number of corners required by the solver
        required: usize,
        /// Actual number of corners provided
        actual: usize,
    },

    /// The square side length must be strictly positive and finite.
    #[error("marker size must be positive and finite, got {0}")]
    InvalidMarkerSize(f64),

    /// The corners are collinear, coincident or otherwise span no area.
    #[error("degenerate marker corners: {0}")]
    DegenerateCorners(&'static str),

    /// A linear system in the solver had no unique solution.
    #[error("linear solve failed: {0}")]
    SolveFailed(&'static str),

    /// The recovered pose is not physically valid.
    #[error("invalid pose: {0}")]
    InvalidPose(&'static str),

    /// Camera model error
    #[error(transparent)]
    CameraError(#[from] CameraError),
}

/// Result returned by the pose solvers.
///
/// The rotation matrix maps coordinates from the **marker** frame to the
/// **camera** frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PnPResult {
    /// Estimated rotation matrix (row-major).
    pub rotation: [[f64; 3]; 3],
    /// Estimated translation vector.
    pub translation: [f64; 3],
    /// Rodrigues axis-angle representation of the rotation.
    pub rvec: [f64; 3],
    /// Root-mean-square reprojection error in normalized image units.
    pub reproj_rmse: f64,
}
