use crate::camera::{CameraIntrinsics, CameraResult};
use crate::ippe::IPPE;
use crate::ops::{mat3_from_rows, square_object_points};
use crate::pnp::PnPError;
use glam::DVec3;

/// Four pixel corners of a square marker in TL, TR, BR, BL order.
pub type MarkerCorners = [[f64; 2]; 4];

/// Pose of a marker relative to the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPose {
    /// Axis-angle rotation from the marker frame to the camera frame.
    pub rvec: [f64; 3],
    /// Marker centre in camera coordinates, in the units of the marker size.
    pub tvec: [f64; 3],
    /// Rotation matrix equivalent of `rvec` (row-major).
    pub rotation: [[f64; 3]; 3],
    /// Root-mean-square reprojection error in normalized image units.
    pub reproj_rmse: f64,
}

impl MarkerPose {
    /// Euclidean norm of the translation: camera-to-marker-centre range.
    pub fn range(&self) -> f64 {
        DVec3::from_array(self.tvec).length()
    }

    /// Range converted by `scale`, e.g. `100.0` for metres to centimetres.
    pub fn scaled_range(&self, scale: f64) -> f64 {
        self.range() * scale
    }

    /// Transform a marker-frame point into the camera frame.
    pub fn transform(&self, point: [f64; 3]) -> [f64; 3] {
        let pc = mat3_from_rows(&self.rotation) * DVec3::from_array(point)
            + DVec3::from_array(self.tvec);
        pc.to_array()
    }
}

/// Estimates square marker poses against a fixed set of camera intrinsics.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    intrinsics: CameraIntrinsics,
}

impl PoseEstimator {
    /// Create an estimator for the given camera.
    pub fn new(intrinsics: CameraIntrinsics) -> Self {
        Self { intrinsics }
    }

    /// The camera intrinsics used by this estimator.
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Estimate the pose of a single marker of edge length `marker_size`.
    ///
    /// The translation comes out in the same units as `marker_size`.
    pub fn estimate(
        &self,
        corners: &MarkerCorners,
        marker_size: f64,
    ) -> Result<MarkerPose, PnPError> {
        let mut norm = [[0.0; 2]; 4];
        for (n, c) in norm.iter_mut().zip(corners.iter()) {
            *n = self.intrinsics.normalize_pixel(*c);
        }

        let best = IPPE::solve_square(&norm, marker_size)?.first;
        Ok(MarkerPose {
            rvec: best.rvec,
            tvec: best.translation,
            rotation: best.rotation,
            reproj_rmse: best.reproj_rmse,
        })
    }

    /// Estimate the pose of every marker; a failure only affects its own entry.
    pub fn estimate_all(
        &self,
        corners: &[MarkerCorners],
        marker_size: f64,
    ) -> Vec<Result<MarkerPose, PnPError>> {
        corners
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let pose = self.estimate(c, marker_size);
                if let Err(e) = &pose {
                    log::warn!("no pose for marker #{i}: {e}");
                }
                pose
            })
            .collect()
    }

    /// Project the marker model placed at `pose` into pixel coordinates.
    pub fn project_marker(
        &self,
        pose: &MarkerPose,
        marker_size: f64,
    ) -> CameraResult<MarkerCorners> {
        let mut out = [[0.0; 2]; 4];
        for (o, p) in out.iter_mut().zip(square_object_points(marker_size).iter()) {
            *o = self.intrinsics.project(pose.transform(*p))?;
        }
        Ok(out)
    }
}

/// Project marker-frame points placed at `pose` into distorted pixel coordinates.
pub fn project_points(
    points: &[[f64; 3]],
    pose: &MarkerPose,
    intrinsics: &CameraIntrinsics,
) -> CameraResult<Vec<[f64; 2]>> {
    points
        .iter()
        .map(|p| intrinsics.project(pose.transform(*p)))
        .collect()
}

/// Estimate rotation and translation for each detected marker.
///
/// `corners` holds one entry per marker, each with its four corners in TL, TR,
/// BR, BL order. Results are returned in the same order; an `Err` entry means
/// no pose is available for that marker.
pub fn estimate_pose_single_markers(
    corners: &[MarkerCorners],
    marker_size: f64,
    intrinsics: &CameraIntrinsics,
) -> Vec<Result<MarkerPose, PnPError>> {
    PoseEstimator::new(intrinsics.clone()).estimate_all(corners, marker_size)
}

/// Convert a variable-length corner list into the fixed four-corner form.
pub fn corners_from_slice(points: &[[f64; 2]]) -> Result<MarkerCorners, PnPError> {
    <MarkerCorners>::try_from(points).map_err(|_| PnPError::InvalidCornerCount {
        required: 4,
        actual: points.len(),
    })
}
