use crate::config::Config;
use crate::model::{DeviceStore, ParsedRecords};
use color_eyre::eyre::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Load and validate a run configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open config file {}", config_path.display()))?;
    let config: Config = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

    config.validate()?;
    Ok(config)
}

/// Load the configuration if a path is given, defaults otherwise
pub fn load_config_or_default(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using defaults");
            Ok(Config::default())
        }
    }
}

/// Errors reading parsed device records
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON records in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML records in {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load parsed device records into a store.
///
/// Files ending in `.json` are read as JSON, everything else as YAML.
pub fn load_records(path: &Path) -> std::result::Result<DeviceStore, LoadError> {
    info!("Loading device records from: {:?}", path);

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let records: ParsedRecords = if is_json {
        serde_json::from_reader(reader).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::from_reader(reader).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    let store = DeviceStore::from_records(records);
    if store.is_empty() {
        warn!("No devices found in {:?}", path);
    } else {
        info!("Loaded {} devices", store.device_count());
    }
    Ok(store)
}
