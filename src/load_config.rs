//! Loads the static YAML run configuration into [`Config`].
//!
//! The only place where untrusted YAML is parsed. Credentials never live in
//! the file: the `profile` key merely names an AWS profile, and resolution
//! happens in the storage layer. All failures carry enough context to
//! diagnose from CLI output alone.

use crate::config::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Load and validate a YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: Config = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.cutoff_minute > 59 {
        error!(
            cutoff_minute = config.cutoff_minute,
            "cutoff_minute must be between 0 and 59"
        );
        anyhow::bail!(
            "cutoff_minute must be between 0 and 59, got {}",
            config.cutoff_minute
        );
    }

    Ok(config)
}
