use fiducial_pose::{corners_from_slice, MarkerCorners};
use serde::{Deserialize, Serialize};

use crate::error::ObservationError;
use crate::geometry::marker_center;

/// Integer identifier of a fiducial marker.
pub type MarkerId = i32;

/// Marker id exactly as a detector reports it.
///
/// Some detectors hand back ids as one-element arrays instead of scalars; both
/// shapes are accepted here and normalized by [`RawMarkerId::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMarkerId {
    /// A plain integer id.
    Scalar(MarkerId),
    /// An id wrapped in a collection.
    Many(Vec<MarkerId>),
}

impl RawMarkerId {
    /// Reduce to a single id. Collections must hold exactly one value.
    pub fn normalize(&self) -> Result<MarkerId, ObservationError> {
        match self {
            RawMarkerId::Scalar(id) => Ok(*id),
            RawMarkerId::Many(ids) => match ids.as_slice() {
                [id] => Ok(*id),
                other => Err(ObservationError::MalformedId(other.len())),
            },
        }
    }
}

impl From<MarkerId> for RawMarkerId {
    fn from(id: MarkerId) -> Self {
        RawMarkerId::Scalar(id)
    }
}

/// One detector result before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMarkerObservation {
    /// The id, scalar or wrapped.
    pub id: RawMarkerId,
    /// Pixel corners, expected as TL, TR, BR, BL.
    pub corners: Vec<[f64; 2]>,
}

/// A validated marker seen in the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    /// Marker identifier.
    pub id: MarkerId,
    /// Pixel corners in TL, TR, BR, BL order.
    pub corners: MarkerCorners,
}

impl MarkerObservation {
    /// Create an observation from an id and its four corners.
    pub fn new(id: MarkerId, corners: MarkerCorners) -> Self {
        Self { id, corners }
    }

    /// Pixel centre: midpoint of the top-left and bottom-right corners.
    pub fn center(&self) -> [f64; 2] {
        marker_center(&self.corners)
    }
}

impl TryFrom<&RawMarkerObservation> for MarkerObservation {
    type Error = ObservationError;

    fn try_from(raw: &RawMarkerObservation) -> Result<Self, Self::Error> {
        let id = raw.id.normalize()?;
        let corners = corners_from_slice(&raw.corners)
            .map_err(|_| ObservationError::CornerCount(raw.corners.len()))?;
        if corners.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ObservationError::NonFiniteCorner);
        }
        Ok(Self { id, corners })
    }
}

/// Validate detector output, dropping anything that is not a well-formed marker.
///
/// Rejected observations are logged at debug level and never raised; the
/// relative order of the accepted ones is preserved.
pub fn normalize_observations(raw: &[RawMarkerObservation]) -> Vec<MarkerObservation> {
    raw.iter()
        .filter_map(|r| match MarkerObservation::try_from(r) {
            Ok(obs) => Some(obs),
            Err(e) => {
                log::debug!("ignoring observation {:?}: {e}", r.id);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]
    }

    #[test]
    fn test_normalize_scalar_and_singleton() {
        assert_eq!(RawMarkerId::Scalar(7).normalize(), Ok(7));
        assert_eq!(RawMarkerId::Many(vec![7]).normalize(), Ok(7));
    }

    #[test]
    fn test_normalize_rejects_collections() {
        assert_eq!(
            RawMarkerId::Many(vec![1, 2]).normalize(),
            Err(ObservationError::MalformedId(2))
        );
        assert_eq!(
            RawMarkerId::Many(vec![]).normalize(),
            Err(ObservationError::MalformedId(0))
        );
    }

    #[test]
    fn test_raw_id_deserializes_both_shapes() -> Result<(), serde_json::Error> {
        let scalar: RawMarkerId = serde_json::from_str("3")?;
        let wrapped: RawMarkerId = serde_json::from_str("[3]")?;
        let many: RawMarkerId = serde_json::from_str("[3, 4]")?;
        assert_eq!(scalar, RawMarkerId::Scalar(3));
        assert_eq!(wrapped, RawMarkerId::Many(vec![3]));
        assert_eq!(many, RawMarkerId::Many(vec![3, 4]));
        Ok(())
    }

    #[test]
    fn test_try_from_checks_corners() {
        let three = RawMarkerObservation {
            id: 1.into(),
            corners: square()[..3].to_vec(),
        };
        assert_eq!(
            MarkerObservation::try_from(&three),
            Err(ObservationError::CornerCount(3))
        );

        let mut corners = square();
        corners[2] = [f64::NAN, 1.0];
        let nan = RawMarkerObservation {
            id: 1.into(),
            corners,
        };
        assert_eq!(
            MarkerObservation::try_from(&nan),
            Err(ObservationError::NonFiniteCorner)
        );
    }

    #[test]
    fn test_normalize_observations_keeps_order() {
        let raw = vec![
            RawMarkerObservation {
                id: 5.into(),
                corners: square(),
            },
            RawMarkerObservation {
                id: RawMarkerId::Many(vec![1, 2]),
                corners: square(),
            },
            RawMarkerObservation {
                id: RawMarkerId::Many(vec![9]),
                corners: square(),
            },
        ];
        let ids: Vec<_> = normalize_observations(&raw).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![5, 9]);
    }

    #[test]
    fn test_center_is_tl_br_midpoint() {
        let corners = [[10.0, 20.0], [30.0, 22.0], [34.0, 40.0], [12.0, 38.0]];
        let obs = MarkerObservation::new(0, corners);
        assert_eq!(obs.center(), [22.0, 30.0]);
    }
}
