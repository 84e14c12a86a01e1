use std::path::Path;

use fiducial_nav::{MarkerId, PlannerConfig};

/// Errors raised while loading the planner configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid JSON planner configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read the planner configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<PlannerConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&contents)?;
    log::info!("loaded planner config from {}", path.display());
    Ok(config)
}

/// Apply command-line overrides on top of a loaded configuration.
pub fn apply_overrides(
    mut config: PlannerConfig,
    allowed_ids: &[MarkerId],
    marker_size: Option<f64>,
) -> PlannerConfig {
    if !allowed_ids.is_empty() {
        config.allowed_ids = allowed_ids.to_vec();
    }
    if let Some(size) = marker_size {
        config.marker_size = size;
    }
    config
}
