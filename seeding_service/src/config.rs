// seeding_service/src/config.rs
//! `Snomed` configuration section: import layout, dialect, batching knobs.

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_yaml2 as serde_yaml;

use crate::checkpoint::SeedOptions;

pub const DEFAULT_IMPORT_DIRECTORY: &str = "snomed-data/import";
pub const DEFAULT_DIALECT_REFSET_ID: &str = "900000000000509007";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_PROGRESS_LOG_INTERVAL: u64 = 10_000;
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Environment variable naming a YAML file to load the config from.
pub const CONFIG_PATH_ENV: &str = "SNOMED_CONFIG";
/// Environment variable overriding `importDirectory`.
pub const IMPORT_DIR_ENV: &str = "SNOMED_IMPORT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnomedConfig {
    pub import_directory: PathBuf,
    /// Informational only; echoed in status responses.
    pub terminology_version: String,
    pub dialect_refset_id: String,
    pub active_only: bool,
    pub batch_size: usize,
    /// Accepted for compatibility; the ingestion core does not consume it.
    pub enable_semantic_normalization: bool,
    pub progress_log_interval: u64,
    pub strict_edge_dedup: bool,
    pub http_port: u16,
}

impl Default for SnomedConfig {
    fn default() -> Self {
        Self {
            import_directory: PathBuf::from(DEFAULT_IMPORT_DIRECTORY),
            terminology_version: String::new(),
            dialect_refset_id: DEFAULT_DIALECT_REFSET_ID.to_string(),
            active_only: true,
            batch_size: DEFAULT_BATCH_SIZE,
            enable_semantic_normalization: false,
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
            strict_edge_dedup: false,
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl SnomedConfig {
    /// Load from the YAML file named by `SNOMED_CONFIG`, falling back to
    /// defaults. `SNOMED_IMPORT_DIR` overrides the import directory either way.
    pub fn load() -> Self {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_yaml_file(Path::new(&path)).unwrap_or_else(|e| {
                warn!("Failed to load config from {}: {}; using defaults", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        if let Ok(dir) = std::env::var(IMPORT_DIR_ENV) {
            config.import_directory = PathBuf::from(dir);
        }
        config
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_yaml::from_str(&raw).map_err(|e| e.to_string())
    }

    /// The RF2 Snapshot directory the seeder reads.
    pub fn snapshot_directory(&self) -> PathBuf {
        self.import_directory.join("Snapshot")
    }

    pub fn seed_options(&self) -> SeedOptions {
        SeedOptions {
            active_only: self.active_only,
            batch_size: self.batch_size,
            dialect_refset_id: self.dialect_refset_id.clone(),
            progress_log_interval: self.progress_log_interval,
            verify_after_seed: true,
            strict_edge_dedup: self.strict_edge_dedup,
        }
    }
}
