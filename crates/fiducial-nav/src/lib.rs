#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Fiducial Nav
//!
//! Turns the markers seen in a frame into a steering directive: select the
//! allowed marker closest to the frame centre, estimate its distance, and
//! classify its horizontal position against a distance-dependent band.
//!
//! ## Example
//!
//! ```rust
//! use fiducial_nav::{FrameSize, MarkerObservation, NavigationPlanner, PlannerConfig};
//! use fiducial_pose::CameraIntrinsics;
//!
//! let intrinsics = CameraIntrinsics::pinhole(800.0, 800.0, 320.0, 240.0)?;
//! let planner = NavigationPlanner::new(PlannerConfig::new(vec![7]), intrinsics)?;
//!
//! let marker = MarkerObservation::new(
//!     7,
//!     [[300.0, 220.0], [340.0, 220.0], [340.0, 260.0], [300.0, 260.0]],
//! );
//! if let Some(decision) = planner.plan(&[marker], FrameSize::new(640, 480)) {
//!     println!("{:.1} cm: {:?}", decision.distance_cm, decision.direction);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Planner configuration.
pub mod config;

/// Error types for the navigation crate.
pub mod error;

/// Frame-centre distance and steering band geometry.
pub mod geometry;

/// Detector output and id normalization.
pub mod observation;

/// Drawing instructions for frame sinks.
pub mod overlay;

/// The per-frame loop and its collaborators.
pub mod pipeline;

/// Target selection and the decision policy.
pub mod planner;

pub use config::{FarPolicy, PlannerConfig};
pub use error::{NavError, ObservationError};
pub use geometry::{
    compute_left_border, compute_right_border, compute_x_borders, distance_from_center,
    marker_center, FrameSize, LateralOffset, SteeringBand,
};
pub use observation::{
    normalize_observations, MarkerId, MarkerObservation, RawMarkerId, RawMarkerObservation,
};
pub use overlay::{annotate, Overlay};
pub use pipeline::{
    run_frames, Frame, FrameReport, FrameSink, FrameSource, MarkerDetector, RunSummary,
};
pub use planner::{steer, Direction, NavigationDecision, NavigationPlanner, Steering};
