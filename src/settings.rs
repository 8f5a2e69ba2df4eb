use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_file_loads() {
        let settings = load_default_config().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn output_format_from_lowercase() {
        let settings: Settings = Config::builder()
            .set_override("output_format", "json")
            .unwrap()
            .set_override("precision", 3)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert_eq!(settings.precision, 3);
    }

    #[test]
    #[should_panic]
    fn zero_precision_rejected() {
        validate_config(&Settings {
            output_format: OutputFormat::Text,
            precision: 0,
        });
    }
}

/// Minimum absolute value of the dot product of two vectors to be considered colinear.
pub const COLINEAR_THRESHOLD: f32 = 0.001;
/// Minimum vector length to be considered non-degenerate.
pub const VEC_LENGTH_THRESHOLD: f32 = 1e-4;
/// Minimum determinant magnitude for a basis rotation to be renormalised.
pub const ROTATION_DET_THRESHOLD: f32 = 1e-6;

/// Layout used by the beam serialization hook.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub output_format: OutputFormat,
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_precision() -> usize {
    6
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Text,
            precision: default_precision(),
        }
    }
}

/// Loads `config/default.toml` only.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()?;

    let config: Settings = settings.try_deserialize()?;
    validate_config(&config);

    Ok(config)
}

/// Loads `config/local.toml` if present, else `config/default.toml`, then
/// applies any `BEAMCORE_*` environment overrides.
pub fn load_config() -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        log::info!("using local configuration: {:?}", local_config);
        local_config
    } else {
        log::info!("using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("beamcore"))
        .build()?;

    let config: Settings = settings.try_deserialize()?;
    validate_config(&config);

    log::debug!("{:#?}", config);

    Ok(config)
}

/// Finds the directory holding `config/`:
/// 1. `CARGO_MANIFEST_DIR` when run through cargo,
/// 2. `BEAMCORE_ROOT_DIR` if set,
/// 3. the nearest ancestor of the executable with a `config` subdirectory.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("BEAMCORE_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe()?;
    let mut current_dir = exe_path.parent().map(|p| p.to_path_buf());
    while let Some(dir) = current_dir {
        if dir.join("config").is_dir() {
            return Ok(dir);
        }
        current_dir = dir.parent().map(|p| p.to_path_buf());
    }

    Err(anyhow::anyhow!("could not find project root directory"))
}

fn validate_config(config: &Settings) {
    assert!(config.precision > 0, "Output precision must be at least 1");
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Output Format: {:?}
  - Precision: {}
  ",
            self.output_format, self.precision,
        )
    }
}
