use fiducial_pose::{project_points, CameraIntrinsics, CameraResult, MarkerPose};
use serde::{Deserialize, Serialize};

use crate::geometry::FrameSize;
use crate::observation::MarkerObservation;
use crate::planner::NavigationDecision;

/// RGB colour of an overlay primitive.
pub type Color = [u8; 3];

/// Colour of marker bounding boxes.
pub const BOX_COLOR: Color = [0, 255, 0];
/// Colour of the steering band lines.
pub const BAND_COLOR: Color = [255, 0, 0];
/// Colour of text labels.
pub const TEXT_COLOR: Color = [0, 0, 255];
/// Colours of the x, y and z pose axes.
pub const AXIS_COLORS: [Color; 3] = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];

const LINE_HEIGHT: f64 = 20.0;

/// Drawing instruction for a frame sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Straight segment between two pixel positions.
    Line {
        /// Start point.
        from: [f64; 2],
        /// End point.
        to: [f64; 2],
        /// Stroke colour.
        color: Color,
    },
    /// Label anchored at its bottom-left corner.
    Text {
        /// Anchor point.
        at: [f64; 2],
        /// Label contents.
        text: String,
        /// Text colour.
        color: Color,
    },
}

/// Closed outline through the four corners of a marker.
pub fn bounding_box(observation: &MarkerObservation) -> Vec<Overlay> {
    let c = &observation.corners;
    (0..4)
        .map(|i| Overlay::Line {
            from: c[i],
            to: c[(i + 1) % 4],
            color: BOX_COLOR,
        })
        .collect()
}

/// Build the overlays for a planned frame.
///
/// Every observation gets its bounding box. When a decision exists, the
/// selected marker is labelled with its id and distance, the direction is
/// written below, and the steering band is drawn over the full frame height.
pub fn annotate(
    observations: &[MarkerObservation],
    decision: Option<&NavigationDecision>,
    frame: FrameSize,
) -> Vec<Overlay> {
    let mut overlays: Vec<Overlay> = observations.iter().flat_map(bounding_box).collect();

    let Some(decision) = decision else {
        return overlays;
    };

    if let Some(band) = decision.band {
        let bottom = frame.height as f64;
        for x in [band.left_x, band.right_x] {
            overlays.push(Overlay::Line {
                from: [x, 0.0],
                to: [x, bottom],
                color: BAND_COLOR,
            });
        }
    }

    let anchor = observations
        .iter()
        .find(|o| o.id == decision.marker_id && o.center() == decision.center)
        .map(|o| o.corners[0])
        .unwrap_or(decision.center);

    let direction = decision
        .direction
        .map_or_else(|| "idle".to_string(), |d| d.to_string());
    let labels = [
        format!("id: {}", decision.marker_id),
        format!("distance: {:.1} cm", decision.distance_cm),
        direction,
    ];
    let rows = labels.len();
    for (i, text) in labels.into_iter().enumerate() {
        overlays.push(Overlay::Text {
            at: [anchor[0], anchor[1] - LINE_HEIGHT * (rows - i) as f64],
            text,
            color: TEXT_COLOR,
        });
    }

    overlays
}

/// Pose axes of a marker, each `length` long in marker units.
pub fn pose_axes(
    pose: &MarkerPose,
    intrinsics: &CameraIntrinsics,
    length: f64,
) -> CameraResult<Vec<Overlay>> {
    let points = [
        [0.0, 0.0, 0.0],
        [length, 0.0, 0.0],
        [0.0, length, 0.0],
        [0.0, 0.0, length],
    ];
    let px = project_points(&points, pose, intrinsics)?;
    Ok(AXIS_COLORS
        .iter()
        .enumerate()
        .map(|(i, color)| Overlay::Line {
            from: px[0],
            to: px[i + 1],
            color: *color,
        })
        .collect())
}
