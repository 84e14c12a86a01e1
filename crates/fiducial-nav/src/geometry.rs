use fiducial_pose::MarkerCorners;
use serde::{Deserialize, Serialize};

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl FrameSize {
    /// Create a frame size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Geometric centre, using integer division like pixel indices do.
    pub fn center(&self) -> [f64; 2] {
        [(self.width / 2) as f64, (self.height / 2) as f64]
    }
}

/// Pixel centre of a marker: midpoint of its top-left and bottom-right corners.
pub fn marker_center(corners: &MarkerCorners) -> [f64; 2] {
    let [tl, _, br, _] = corners;
    [(tl[0] + br[0]) / 2.0, (tl[1] + br[1]) / 2.0]
}

/// Euclidean distance from `point` to the centre of the frame.
pub fn distance_from_center(point: [f64; 2], frame: FrameSize) -> f64 {
    let [cx, cy] = frame.center();
    (point[0] - cx).hypot(point[1] - cy)
}

/// Right steering border: `(max_dist / dist) * band_ratio * frame_width`.
pub fn compute_right_border(dist: f64, frame_width: f64, max_dist: f64, band_ratio: f64) -> f64 {
    (max_dist / dist) * band_ratio * frame_width
}

/// Left steering border, the mirror image of the right one.
pub fn compute_left_border(dist: f64, frame_width: f64, max_dist: f64, band_ratio: f64) -> f64 {
    frame_width - compute_right_border(dist, frame_width, max_dist, band_ratio)
}

/// Both borders as `(left, right)`, unordered.
///
/// For distances below `band_ratio * 2 * max_dist` the left border is the
/// smaller one; past that point the two cross. Use [`SteeringBand::from_borders`]
/// to obtain an ordered interval.
pub fn compute_x_borders(
    dist: f64,
    frame_width: f64,
    max_dist: f64,
    band_ratio: f64,
) -> (f64, f64) {
    (
        compute_left_border(dist, frame_width, max_dist, band_ratio),
        compute_right_border(dist, frame_width, max_dist, band_ratio),
    )
}

/// Where a marker sits with respect to a steering band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralOffset {
    /// Left of the band.
    Left,
    /// Inside the band.
    Centered,
    /// Right of the band.
    Right,
}

/// Horizontal pixel interval considered centred enough, always `left_x <= right_x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringBand {
    /// Lower x bound in pixels.
    pub left_x: f64,
    /// Upper x bound in pixels.
    pub right_x: f64,
}

impl SteeringBand {
    /// Build a band from two borders in either order.
    pub fn from_borders(a: f64, b: f64) -> Self {
        Self {
            left_x: a.min(b),
            right_x: a.max(b),
        }
    }

    /// Band for a marker `dist` away in a frame `frame_width` pixels wide.
    pub fn for_distance(dist: f64, frame_width: f64, max_dist: f64, band_ratio: f64) -> Self {
        let (left, right) = compute_x_borders(dist, frame_width, max_dist, band_ratio);
        Self::from_borders(left, right)
    }

    /// Width of the band in pixels.
    pub fn width(&self) -> f64 {
        self.right_x - self.left_x
    }

    /// Classify `x` against the band widened by `margin` pixels on both sides.
    pub fn classify(&self, x: f64, margin: f64) -> LateralOffset {
        if x < self.left_x - margin {
            LateralOffset::Left
        } else if self.right_x + margin < x {
            LateralOffset::Right
        } else {
            LateralOffset::Centered
        }
    }
}
