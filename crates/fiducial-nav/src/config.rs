use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::observation::MarkerId;

/// What to do when the selected marker is beyond `approach_distance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarPolicy {
    /// Report the marker but emit no direction.
    #[default]
    Idle,
    /// Keep driving straight towards it.
    GoStraight,
}

/// Tunable parameters of the navigation planner.
///
/// Distances are in the unit produced by `distance_scale`, centimetres with the
/// defaults. Missing fields in a deserialized config take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Marker ids the planner may select. Anything else is ignored.
    pub allowed_ids: Vec<MarkerId>,
    /// Physical edge length of the markers, in metres.
    pub marker_size: f64,
    /// Factor from pose units to decision units.
    pub distance_scale: f64,
    /// Below this distance the decision is always stop.
    pub stop_distance: f64,
    /// Below this distance the steering band is applied.
    pub steer_distance: f64,
    /// Below this distance the planner drives straight; above it `far_policy` applies.
    pub approach_distance: f64,
    /// Distance scale of the steering band.
    pub max_dist: f64,
    /// Fraction of the frame width the band spans at `max_dist`.
    pub band_ratio: f64,
    /// Slack on each side of the band, in pixels.
    pub margin_px: f64,
    /// Behaviour for markers beyond `approach_distance`.
    pub far_policy: FarPolicy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            allowed_ids: vec![0],
            marker_size: 0.01,
            distance_scale: 100.0,
            stop_distance: 10.0,
            steer_distance: 20.0,
            approach_distance: 50.0,
            max_dist: 10.0,
            band_ratio: 0.9,
            margin_px: 20.0,
            far_policy: FarPolicy::Idle,
        }
    }
}

impl PlannerConfig {
    /// Default configuration restricted to `allowed_ids`.
    pub fn new(allowed_ids: Vec<MarkerId>) -> Self {
        Self {
            allowed_ids,
            ..Default::default()
        }
    }

    /// Check that the parameters describe a usable policy.
    pub fn validate(&self) -> Result<(), NavError> {
        if self.allowed_ids.is_empty() {
            return Err(NavError::InvalidConfig("allowed_ids is empty".into()));
        }

        let positive = [
            ("marker_size", self.marker_size),
            ("distance_scale", self.distance_scale),
            ("max_dist", self.max_dist),
            ("band_ratio", self.band_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(NavError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        if !(self.margin_px.is_finite() && self.margin_px >= 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "margin_px must be non-negative, got {}",
                self.margin_px
            )));
        }

        let thresholds = [
            self.stop_distance,
            self.steer_distance,
            self.approach_distance,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0)
            || thresholds.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(NavError::InvalidConfig(format!(
                "thresholds must satisfy 0 <= stop < steer < approach, got {thresholds:?}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PlannerConfig::default().validate().is_ok());
        assert!(PlannerConfig::new(vec![3, 7]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let empty = PlannerConfig::new(vec![]);
        assert!(matches!(empty.validate(), Err(NavError::InvalidConfig(_))));

        let size = PlannerConfig {
            marker_size: 0.0,
            ..Default::default()
        };
        assert!(size.validate().is_err());

        let order = PlannerConfig {
            steer_distance: 60.0,
            ..Default::default()
        };
        assert!(order.validate().is_err());

        let margin = PlannerConfig {
            margin_px: -1.0,
            ..Default::default()
        };
        assert!(margin.validate().is_err());
    }

    #[test]
    fn test_partial_json_takes_defaults() -> Result<(), serde_json::Error> {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"allowed_ids": [4, 5], "far_policy": "go_straight"}"#)?;
        assert_eq!(config.allowed_ids, vec![4, 5]);
        assert_eq!(config.far_policy, FarPolicy::GoStraight);
        assert_eq!(config.marker_size, 0.01);
        assert_eq!(config.margin_px, 20.0);
        Ok(())
    }
}
