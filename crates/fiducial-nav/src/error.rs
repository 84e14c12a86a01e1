/// Errors that can occur while planning or driving the frame loop.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// The planner configuration is not usable.
    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),

    /// The frame source failed to deliver a frame.
    #[error("frame source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The marker detector failed on a frame.
    #[error("marker detector failed: {0}")]
    Detector(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The frame sink failed to present a frame.
    #[error("frame sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Reasons a detector observation is not accepted as a marker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObservationError {
    /// The id came as a collection that does not hold exactly one value.
    #[error("marker id must be a single integer, got a collection of {0}")]
    MalformedId(usize),

    /// The detector reported a corner count other than four.
    #[error("marker must have exactly 4 corners, got {0}")]
    CornerCount(usize),

    /// A corner coordinate is NaN or infinite.
    #[error("marker corner is not finite")]
    NonFiniteCorner,
}
