#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Fiducial Pose
//!
//! Pose of square fiducial markers from their four detected image corners.
//!
//! ## Key Features
//!
//! - **IPPE square solver**: closed-form, non-iterative pose for planar square markers
//! - **Distortion Handling**: corners are undistorted with the Brown-Conrady model first
//! - **Per-marker failures**: a degenerate marker never aborts the rest of the batch
//!
//! ## Example
//!
//! ```rust
//! use fiducial_pose::{CameraIntrinsics, PoseEstimator};
//!
//! let intrinsics = CameraIntrinsics::new(
//!     [[800.0, 0.0, 320.0], [0.0, 800.0, 240.0], [0.0, 0.0, 1.0]],
//!     vec![0.0; 5],
//! )?;
//! let estimator = PoseEstimator::new(intrinsics);
//!
//! // a 1 cm marker seen 10 cm in front of the camera
//! let corners = [[280.0, 200.0], [360.0, 200.0], [360.0, 280.0], [280.0, 280.0]];
//! let pose = estimator.estimate(&corners, 0.01)?;
//!
//! println!("rvec: {:?}", pose.rvec);
//! println!("tvec: {:?}", pose.tvec);
//! println!("distance: {:.1} cm", pose.scaled_range(100.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Camera intrinsics and lens distortion.
pub mod camera;

/// Batch pose estimation from marker pixel corners.
pub mod estimator;

/// Infinitesimal Plane-based Pose Estimation for square markers.
pub mod ippe;

/// Common data types shared by the pose solvers.
pub mod pnp;

mod ops;

pub use camera::{CameraError, CameraIntrinsics, CameraResult, PolynomialDistortion};
pub use estimator::{
    corners_from_slice, estimate_pose_single_markers, project_points, MarkerCorners, MarkerPose,
    PoseEstimator,
};
pub use ippe::{IPPEResult, IPPE};
pub use ops::{rotation_to_rvec, rvec_to_rotation, square_object_points};
pub use pnp::{PnPError, PnPResult};
