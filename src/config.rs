use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Run configuration for one synchronisation batch.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for recorder files.
    pub source_dir: PathBuf,
    /// Glob-style filename pattern. The default requires both group markers.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Target bucket name.
    pub bucket: String,
    /// Delete local files after a successful upload.
    #[serde(default)]
    pub cleanup_source: bool,
    /// Named AWS profile; falls back to the default credential chain.
    #[serde(default)]
    pub profile: Option<String>,
    /// Minute past UTC midnight at which today's files count as ready.
    #[serde(default = "default_cutoff_minute")]
    pub cutoff_minute: u32,
}

fn default_pattern() -> String {
    "*%*%*".to_owned()
}

fn default_cutoff_minute() -> u32 {
    10
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            source_dir = %self.source_dir.display(),
            bucket = %self.bucket,
            pattern = %self.pattern,
            cleanup_source = self.cleanup_source,
            cutoff_minute = self.cutoff_minute,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
