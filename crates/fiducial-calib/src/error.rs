use fiducial_pose::CameraError;

/// Errors that can occur while reading or writing calibration data.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// Opening, reading or writing the file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The record could not be encoded.
    #[error("failed to encode calibration record: {0}")]
    Encode(String),

    /// The file is not a bincode calibration record.
    #[error("failed to decode calibration record: {0}")]
    Decode(String),

    /// The file decoded but its contents are inconsistent.
    #[error("corrupt calibration record: {0}")]
    Corrupt(String),

    /// The camera matrix or distortion coefficients are not usable.
    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Convenience alias for calibration results.
pub type CalibrationResult<T> = Result<T, CalibrationError>;
