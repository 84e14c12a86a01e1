use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fiducial_pose::CameraIntrinsics;

use crate::error::{CalibrationError, CalibrationResult};
use crate::record::CalibrationRecord;

/// Write a calibration record to `path`, replacing any existing file.
pub fn save_calibration(
    path: impl AsRef<Path>,
    record: &CalibrationRecord,
) -> CalibrationResult<()> {
    record.validate()?;

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    bincode::encode_into_std_write(record, &mut writer, bincode::config::standard())
        .map_err(|e| CalibrationError::Encode(e.to_string()))?;
    writer.flush()?;

    log::debug!(
        "saved calibration with {} views to {}",
        record.num_views(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read a calibration record from `path`.
///
/// The whole file must be a single record; trailing bytes are treated as
/// corruption.
pub fn load_calibration(path: impl AsRef<Path>) -> CalibrationResult<CalibrationRecord> {
    let bytes = std::fs::read(path.as_ref())?;
    let (record, read): (CalibrationRecord, usize) =
        bincode::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| CalibrationError::Decode(e.to_string()))?;

    if read != bytes.len() {
        return Err(CalibrationError::Corrupt(format!(
            "{} trailing bytes after the record",
            bytes.len() - read
        )));
    }
    record.validate()?;

    Ok(record)
}

/// Load the camera intrinsics stored in the calibration file at `path`.
pub fn load_intrinsics(path: impl AsRef<Path>) -> CalibrationResult<CameraIntrinsics> {
    let path = path.as_ref();
    let intrinsics = load_calibration(path)?.to_intrinsics()?;
    log::info!(
        "loaded intrinsics from {}: fx={} fy={} cx={} cy={}, {} distortion coefficients",
        path.display(),
        intrinsics.fx(),
        intrinsics.fy(),
        intrinsics.cx(),
        intrinsics.cy(),
        intrinsics.distortion_coeffs().len()
    );
    Ok(intrinsics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record() -> CalibrationRecord {
        CalibrationRecord {
            camera_matrix: [[612.3, 0.0, 318.9], [0.0, 611.7, 243.2], [0.0, 0.0, 1.0]],
            dist_coeffs: vec![-0.21, 0.07, 4e-4, -3e-4, -0.01],
            rvecs: vec![[0.1, -0.2, 0.05], [0.3, 0.1, -0.1]],
            tvecs: vec![[-0.1, 0.05, 0.6], [0.02, -0.03, 0.45]],
        }
    }

    #[test]
    fn test_save_and_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("calibration.bin");

        save_calibration(&path, &record())?;
        let loaded = load_calibration(&path)?;
        assert_eq!(loaded, record());

        let intrinsics = load_intrinsics(&path)?;
        assert_relative_eq!(intrinsics.fx(), 612.3);
        assert_relative_eq!(intrinsics.cx(), 318.9);
        assert_eq!(intrinsics.distortion_coeffs(), record().dist_coeffs.as_slice());
        Ok(())
    }

    #[test]
    fn test_load_missing_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let res = load_intrinsics(dir.path().join("missing.bin"));
        assert!(matches!(res, Err(CalibrationError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_load_truncated_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("calibration.bin");
        save_calibration(&path, &record())?;

        let bytes = std::fs::read(&path)?;
        std::fs::write(&path, &bytes[..bytes.len() / 2])?;
        assert!(matches!(load_calibration(&path), Err(CalibrationError::Decode(_))));
        Ok(())
    }

    #[test]
    fn test_load_trailing_bytes() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("calibration.bin");
        save_calibration(&path, &record())?;

        let mut bytes = std::fs::read(&path)?;
        bytes.extend_from_slice(&[0, 1, 2]);
        std::fs::write(&path, &bytes)?;
        assert!(matches!(load_calibration(&path), Err(CalibrationError::Corrupt(_))));
        Ok(())
    }

    #[test]
    fn test_load_rejects_bad_camera_matrix() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("calibration.bin");
        let mut rec = record();
        rec.camera_matrix[0][0] = -1.0;
        save_calibration(&path, &rec)?;

        assert!(matches!(load_intrinsics(&path), Err(CalibrationError::Camera(_))));
        Ok(())
    }

    #[test]
    fn test_save_invalid_path() {
        let res = save_calibration("/path/to/non/existent/directory/calib.bin", &record());
        assert!(matches!(res, Err(CalibrationError::Io(_))));
    }
}
