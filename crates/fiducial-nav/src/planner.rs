use std::fmt;

use fiducial_pose::{CameraIntrinsics, MarkerPose, PoseEstimator};
use serde::{Deserialize, Serialize};

use crate::config::{FarPolicy, PlannerConfig};
use crate::error::NavError;
use crate::geometry::{distance_from_center, FrameSize, LateralOffset, SteeringBand};
use crate::observation::{normalize_observations, MarkerId, MarkerObservation, RawMarkerObservation};

/// Steering directive for the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Turn towards the left of the frame.
    GoLeft,
    /// Turn towards the right of the frame.
    GoRight,
    /// Keep heading.
    GoStraight,
    /// Halt.
    Stop,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::GoLeft => "go left",
            Direction::GoRight => "go right",
            Direction::GoStraight => "go straight",
            Direction::Stop => "stop",
        };
        f.write_str(s)
    }
}

/// Direction and band for one distance and horizontal position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// The directive, `None` when the policy says idle.
    pub direction: Option<Direction>,
    /// The band, only computed inside the steering range.
    pub band: Option<SteeringBand>,
}

/// Apply the distance-banded decision policy.
///
/// `distance` is in the units of the config thresholds and `cx` is the marker
/// centre column in pixels. A non-finite distance yields no direction.
pub fn steer(config: &PlannerConfig, distance: f64, cx: f64, frame_width: usize) -> Steering {
    let idle = Steering {
        direction: None,
        band: None,
    };
    if !distance.is_finite() {
        return idle;
    }

    if distance < config.stop_distance {
        Steering {
            direction: Some(Direction::Stop),
            band: None,
        }
    } else if distance < config.steer_distance {
        let band = SteeringBand::for_distance(
            distance,
            frame_width as f64,
            config.max_dist,
            config.band_ratio,
        );
        let direction = match band.classify(cx, config.margin_px) {
            LateralOffset::Left => Direction::GoLeft,
            LateralOffset::Right => Direction::GoRight,
            LateralOffset::Centered => Direction::GoStraight,
        };
        Steering {
            direction: Some(direction),
            band: Some(band),
        }
    } else if distance < config.approach_distance {
        Steering {
            direction: Some(Direction::GoStraight),
            band: None,
        }
    } else {
        match config.far_policy {
            FarPolicy::Idle => idle,
            FarPolicy::GoStraight => Steering {
                direction: Some(Direction::GoStraight),
                band: None,
            },
        }
    }
}

/// Outcome of planning a frame with a selected marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationDecision {
    /// Id of the selected marker.
    pub marker_id: MarkerId,
    /// Pixel centre of the selected marker.
    pub center: [f64; 2],
    /// Camera-to-marker distance in decision units.
    pub distance_cm: f64,
    /// The directive, `None` when the marker is too far under [`FarPolicy::Idle`].
    pub direction: Option<Direction>,
    /// Steering band, present only inside the steering range.
    pub band: Option<SteeringBand>,
}

/// Turns marker observations into a steering decision, one frame at a time.
///
/// The planner holds no per-frame state: the same observations and frame size
/// always give the same decision.
#[derive(Debug, Clone)]
pub struct NavigationPlanner {
    config: PlannerConfig,
    estimator: PoseEstimator,
}

impl NavigationPlanner {
    /// Create a planner. Fails when `config` does not validate.
    pub fn new(config: PlannerConfig, intrinsics: CameraIntrinsics) -> Result<Self, NavError> {
        config.validate()?;
        Ok(Self {
            config,
            estimator: PoseEstimator::new(intrinsics),
        })
    }

    /// The planner configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The pose estimator used for the selected marker.
    pub fn estimator(&self) -> &PoseEstimator {
        &self.estimator
    }

    /// Pick the allowed marker closest to the frame centre.
    ///
    /// Ties go to the earliest observation.
    pub fn select_target<'a>(
        &self,
        observations: &'a [MarkerObservation],
        frame: FrameSize,
    ) -> Option<&'a MarkerObservation> {
        observations
            .iter()
            .filter(|o| self.config.allowed_ids.contains(&o.id))
            .map(|o| (o, distance_from_center(o.center(), frame)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o)
    }

    /// Pose of `observation`, `None` if the solver rejects its corners.
    pub fn estimate_pose(&self, observation: &MarkerObservation) -> Option<MarkerPose> {
        match self
            .estimator
            .estimate(&observation.corners, self.config.marker_size)
        {
            Ok(pose) => Some(pose),
            Err(e) => {
                log::warn!("no pose for marker {}: {e}", observation.id);
                None
            }
        }
    }

    /// Plan a frame. Returns `None` when no allowed marker has a pose.
    pub fn plan(
        &self,
        observations: &[MarkerObservation],
        frame: FrameSize,
    ) -> Option<NavigationDecision> {
        let target = self.select_target(observations, frame)?;
        let pose = self.estimate_pose(target)?;
        Some(self.decide(target, &pose, frame))
    }

    /// Plan a frame from unvalidated detector output.
    pub fn plan_raw(
        &self,
        raw: &[RawMarkerObservation],
        frame: FrameSize,
    ) -> Option<NavigationDecision> {
        self.plan(&normalize_observations(raw), frame)
    }

    /// Decision for a selected marker with a known pose.
    pub fn decide(
        &self,
        target: &MarkerObservation,
        pose: &MarkerPose,
        frame: FrameSize,
    ) -> NavigationDecision {
        let center = target.center();
        let distance_cm = pose.scaled_range(self.config.distance_scale);
        let steering = steer(&self.config, distance_cm, center[0], frame.width);

        log::debug!(
            "marker {} at {center:?}, {distance_cm:.1} cm: {:?}",
            target.id,
            steering.direction
        );

        NavigationDecision {
            marker_id: target.id,
            center,
            distance_cm,
            direction: steering.direction,
            band: steering.band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FRAME: FrameSize = FrameSize {
        width: 640,
        height: 480,
    };

    fn square_at(cx: f64, cy: f64, half: f64) -> [[f64; 2]; 4] {
        [
            [cx - half, cy - half],
            [cx + half, cy - half],
            [cx + half, cy + half],
            [cx - half, cy + half],
        ]
    }

    fn planner(allowed: Vec<MarkerId>) -> Result<NavigationPlanner, NavError> {
        NavigationPlanner::new(
            PlannerConfig::new(allowed),
            CameraIntrinsics::pinhole(800.0, 800.0, 320.0, 240.0).expect("valid intrinsics"),
        )
    }

    #[test]
    fn test_steer_stop_ignores_position() {
        let config = PlannerConfig::default();
        for cx in [0.0, 100.0, 320.0, 639.0] {
            let s = steer(&config, 5.0, cx, 640);
            assert_eq!(s.direction, Some(Direction::Stop));
            assert_eq!(s.band, None);
        }
    }

    #[test]
    fn test_steer_band_at_fifteen() {
        let config = PlannerConfig::default();
        assert_eq!(
            steer(&config, 15.0, 100.0, 640).direction,
            Some(Direction::GoLeft)
        );
        assert_eq!(
            steer(&config, 15.0, 600.0, 640).direction,
            Some(Direction::GoRight)
        );

        let centered = steer(&config, 15.0, 320.0, 640);
        assert_eq!(centered.direction, Some(Direction::GoStraight));
        let band = centered.band.expect("band inside steering range");
        assert_relative_eq!(band.left_x, 256.0, epsilon = 1e-9);
        assert_relative_eq!(band.right_x, 384.0, epsilon = 1e-9);
    }

    #[test]
    fn test_steer_ranges() {
        let config = PlannerConfig::default();
        assert!(steer(&config, 10.0, 0.0, 640).band.is_some());
        assert_eq!(
            steer(&config, 20.0, 0.0, 640).direction,
            Some(Direction::GoStraight)
        );
        assert_eq!(
            steer(&config, 49.9, 0.0, 640).direction,
            Some(Direction::GoStraight)
        );
        assert_eq!(steer(&config, 50.0, 320.0, 640).direction, None);
        assert_eq!(steer(&config, f64::NAN, 320.0, 640).direction, None);

        let far = PlannerConfig {
            far_policy: FarPolicy::GoStraight,
            ..Default::default()
        };
        assert_eq!(
            steer(&far, 120.0, 320.0, 640).direction,
            Some(Direction::GoStraight)
        );
    }

    #[test]
    fn test_select_closest_to_center() -> Result<(), NavError> {
        let planner = planner(vec![1, 2])?;
        let obs = vec![
            MarkerObservation::new(1, square_at(100.0, 240.0, 40.0)),
            MarkerObservation::new(2, square_at(320.0, 240.0, 40.0)),
        ];
        let target = planner.select_target(&obs, FRAME).expect("target");
        assert_eq!(target.id, 2);
        assert_eq!(target.center(), [320.0, 240.0]);
        Ok(())
    }

    #[test]
    fn test_select_tie_goes_to_first() -> Result<(), NavError> {
        let planner = planner(vec![1, 2])?;
        let obs = vec![
            MarkerObservation::new(2, square_at(300.0, 240.0, 20.0)),
            MarkerObservation::new(1, square_at(340.0, 240.0, 20.0)),
        ];
        assert_eq!(planner.select_target(&obs, FRAME).map(|o| o.id), Some(2));
        Ok(())
    }

    #[test]
    fn test_disallowed_ids_are_idle() -> Result<(), NavError> {
        let planner = planner(vec![7])?;
        let obs = vec![MarkerObservation::new(3, square_at(320.0, 240.0, 40.0))];
        assert!(planner.select_target(&obs, FRAME).is_none());
        assert!(planner.plan(&obs, FRAME).is_none());
        assert!(planner.plan(&[], FRAME).is_none());
        Ok(())
    }

    #[test]
    fn test_plan_frontal_marker_stops() -> Result<(), NavError> {
        // 1 cm marker spanning 80 px at f = 800 sits 10 cm away; 160 px is 5 cm
        let planner = planner(vec![0])?;
        let obs = vec![MarkerObservation::new(0, square_at(320.0, 240.0, 80.0))];
        let decision = planner.plan(&obs, FRAME).expect("decision");
        assert_eq!(decision.marker_id, 0);
        assert_relative_eq!(decision.distance_cm, 5.0, epsilon = 1e-6);
        assert_eq!(decision.direction, Some(Direction::Stop));
        Ok(())
    }

    #[test]
    fn test_plan_is_idempotent() -> Result<(), NavError> {
        let planner = planner(vec![0, 1])?;
        let obs = vec![
            MarkerObservation::new(1, square_at(500.0, 260.0, 25.0)),
            MarkerObservation::new(0, square_at(200.0, 230.0, 30.0)),
        ];
        let first = planner.plan(&obs, FRAME);
        assert!(first.is_some());
        assert_eq!(first, planner.plan(&obs, FRAME));
        Ok(())
    }

    #[test]
    fn test_degenerate_target_yields_nothing() -> Result<(), NavError> {
        let planner = planner(vec![0])?;
        let obs = vec![MarkerObservation::new(0, [[320.0, 240.0]; 4])];
        assert!(planner.plan(&obs, FRAME).is_none());
        Ok(())
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(planner(vec![]), Err(NavError::InvalidConfig(_))));
    }
}
