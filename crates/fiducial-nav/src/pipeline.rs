use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geometry::FrameSize;
use crate::observation::{normalize_observations, MarkerObservation, RawMarkerObservation};
use crate::overlay::{annotate, pose_axes, Overlay};
use crate::planner::{NavigationDecision, NavigationPlanner};

/// A captured image, or anything that knows its pixel dimensions.
pub trait Frame {
    /// Frame dimensions in pixels.
    fn size(&self) -> FrameSize;
}

/// Produces frames in capture order.
pub trait FrameSource {
    /// Frame type handed to the detector and the sink.
    type Frame: Frame;
    /// Error raised when reading fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Block until the next frame is available. `Ok(None)` ends the stream.
    fn read(&mut self) -> Result<Option<Self::Frame>, Self::Error>;
}

/// Finds fiducial markers in a frame.
///
/// Detectors are built once, before the frame loop, and reused for every frame.
pub trait MarkerDetector<F> {
    /// Error raised when detection fails on a frame.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Detect markers, returning ids and corners as the detector reports them.
    fn detect(&mut self, frame: &F) -> Result<Vec<RawMarkerObservation>, Self::Error>;
}

/// Presents a frame together with its planning result.
pub trait FrameSink<F> {
    /// Error raised when presenting fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Render or record one frame.
    fn show(&mut self, frame: &F, report: &FrameReport) -> Result<(), Self::Error>;
}

/// Everything the planner produced for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Validated markers seen in the frame.
    pub observations: Vec<MarkerObservation>,
    /// The decision, if an allowed marker had a pose.
    pub decision: Option<NavigationDecision>,
    /// Drawing instructions for the sink.
    pub overlays: Vec<Overlay>,
}

impl NavigationPlanner {
    /// Plan one frame of detector output and build its overlays.
    pub fn process(&self, raw: &[RawMarkerObservation], frame: FrameSize) -> FrameReport {
        let observations = normalize_observations(raw);

        let mut axes = Vec::new();
        let decision = self
            .select_target(&observations, frame)
            .and_then(|target| {
                let pose = self.estimate_pose(target)?;
                let half = self.config().marker_size / 2.0;
                match pose_axes(&pose, self.estimator().intrinsics(), half) {
                    Ok(lines) => axes = lines,
                    Err(e) => log::debug!("pose axes of marker {} not drawn: {e}", target.id),
                }
                Some(self.decide(target, &pose, frame))
            });

        let mut overlays = annotate(&observations, decision.as_ref(), frame);
        overlays.append(&mut axes);

        FrameReport {
            observations,
            decision,
            overlays,
        }
    }
}

/// Counters collected by [`run_frames`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Frames read from the source.
    pub frames: usize,
    /// Frames that produced a direction.
    pub decisions: usize,
    /// Frames planned without a direction, including targets too far away under
    /// [`FarPolicy::Idle`](crate::config::FarPolicy::Idle).
    pub idle: usize,
    /// Frames dropped because detection failed.
    pub skipped: usize,
}

/// Drive the read, detect, plan and show loop until the source ends or `stop` is set.
///
/// The stop flag is checked between frames, so the frame in flight always
/// completes. A detector failure skips that frame; source and sink failures
/// end the run with an error.
pub fn run_frames<S, D, K>(
    source: &mut S,
    detector: &mut D,
    planner: &NavigationPlanner,
    sink: &mut K,
    stop: &AtomicBool,
    max_frames: Option<usize>,
) -> Result<RunSummary, NavError>
where
    S: FrameSource,
    D: MarkerDetector<S::Frame>,
    K: FrameSink<S::Frame>,
{
    let mut summary = RunSummary::default();

    while !stop.load(Ordering::SeqCst) {
        if max_frames.is_some_and(|max| summary.frames >= max) {
            log::info!("reached the frame limit");
            break;
        }

        let Some(frame) = source.read().map_err(|e| NavError::Source(Box::new(e)))? else {
            log::info!("frame source exhausted");
            break;
        };
        summary.frames += 1;

        let raw = match detector.detect(&frame) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("skipping frame {}: {e}", summary.frames);
                summary.skipped += 1;
                continue;
            }
        };

        let report = planner.process(&raw, frame.size());
        if report.decision.as_ref().is_some_and(|d| d.direction.is_some()) {
            summary.decisions += 1;
        } else {
            summary.idle += 1;
        }

        sink.show(&frame, &report).map_err(|e| NavError::Sink(Box::new(e)))?;
    }

    Ok(summary)
}
