#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Fiducial Calib
//!
//! Binary persistence of camera calibration output and the one-time loading
//! of [`fiducial_pose::CameraIntrinsics`] before a frame loop starts.
//!
//! ```no_run
//! let intrinsics = fiducial_calib::load_intrinsics("calibration.bin")?;
//! println!("fx = {}", intrinsics.fx());
//! # Ok::<(), fiducial_calib::CalibrationError>(())
//! ```

/// Error types for calibration I/O.
pub mod error;

/// Reading and writing calibration files.
pub mod io;

/// The calibration record.
pub mod record;

pub use error::{CalibrationError, CalibrationResult};
pub use io::{load_calibration, load_intrinsics, save_calibration};
pub use record::{checkerboard_points, CalibrationRecord};
