//! Application configuration: collaborator endpoints, the filter name →
//! expression mapping, and action defaults. Grounded on
//! `src/config/mod.rs`'s `AppConfig`/`from_env`/`validate` shape.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::time::Duration;

use librarian_core::error::LibraryError;
use serde::{Deserialize, Serialize};

/// Base URL + timeout for one of the four collaborator services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Defaults for action executors, overridable per invocation by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefaults {
    pub delete_concurrency: usize,
    pub upgrade_batch_size: usize,
    pub upgrade_pace_secs: u64,
    pub upgrade_target_formats: Vec<String>,
    pub upgrade_min_score: i32,
    pub min_watch_percent: f64,
}

impl Default for ActionDefaults {
    fn default() -> Self {
        Self {
            delete_concurrency: 5,
            upgrade_batch_size: 20,
            upgrade_pace_secs: 2,
            upgrade_target_formats: Vec::new(),
            upgrade_min_score: 0,
            min_watch_percent: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Complete runtime configuration (spec §2 ambient config note).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LibrarianConfig {
    pub catalog: CollaboratorConfig,
    pub watch_tracker: CollaboratorConfig,
    pub request_tracker: CollaboratorConfig,
    pub torrent_client: CollaboratorConfig,
    pub actions: ActionDefaults,
    pub logging: LoggingConfig,
    pub worker_count: usize,
    /// Filter name → expression source, loaded separately from a YAML file
    /// (see [`load_filters`]) and folded in here once read.
    #[serde(skip)]
    pub filters: HashMap<String, String>,
}

impl LibrarianConfig {
    pub fn from_env() -> librarian_core::Result<Self> {
        let mut config = Self {
            worker_count: 4,
            ..Default::default()
        };

        if let Ok(url) = env::var("LIBRARIAN_CATALOG_URL") {
            config.catalog.base_url = url;
        }
        if let Ok(url) = env::var("LIBRARIAN_WATCH_TRACKER_URL") {
            config.watch_tracker.base_url = url;
        }
        if let Ok(url) = env::var("LIBRARIAN_REQUEST_TRACKER_URL") {
            config.request_tracker.base_url = url;
        }
        if let Ok(url) = env::var("LIBRARIAN_TORRENT_CLIENT_URL") {
            config.torrent_client.base_url = url;
        }
        if let Ok(workers) = env::var("LIBRARIAN_WORKERS") {
            config.worker_count = workers.parse().map_err(|e| LibraryError::Config {
                field: "LIBRARIAN_WORKERS".to_string(),
                message: format!("invalid worker count: {e}"),
            })?;
        }
        if let Ok(percent) = env::var("LIBRARIAN_MIN_WATCH_PERCENT") {
            config.actions.min_watch_percent = percent.parse().map_err(|e| LibraryError::Config {
                field: "LIBRARIAN_MIN_WATCH_PERCENT".to_string(),
                message: format!("invalid percentage: {e}"),
            })?;
        }
        if let Ok(level) = env::var("LIBRARIAN_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(path) = env::var("LIBRARIAN_FILTERS_FILE") {
            config.filters = load_filters(&path)?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> librarian_core::Result<()> {
        if self.catalog.base_url.is_empty() {
            return Err(LibraryError::Config {
                field: "catalog.base_url".to_string(),
                message: "catalog base URL must be set".to_string(),
            });
        }
        if self.worker_count == 0 {
            return Err(LibraryError::Config {
                field: "worker_count".to_string(),
                message: "worker count must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.actions.min_watch_percent) {
            return Err(LibraryError::Config {
                field: "actions.min_watch_percent".to_string(),
                message: "min_watch_percent must be between 0.0 and 1.0".to_string(),
            });
        }
        Ok(())
    }

    pub fn upgrade_pace(&self) -> Duration {
        Duration::from_secs(self.actions.upgrade_pace_secs)
    }
}

/// Loads the filter name → expression mapping from a YAML file (spec §6
/// supplement).
pub fn load_filters(path: &str) -> librarian_core::Result<HashMap<String, String>> {
    let raw = fs::read_to_string(path).map_err(|e| LibraryError::FileSystem {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    serde_yaml::from_str(&raw).map_err(|e| LibraryError::Config {
        field: "filters_file".to_string(),
        message: format!("invalid filter YAML: {e}"),
    })
}
