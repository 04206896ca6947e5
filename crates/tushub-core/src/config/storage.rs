//! Local upload storage configuration.

use serde::{Deserialize, Serialize};

/// Where the upload pipeline keeps its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding upload data and `.info` files.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Remove the local files of an upload once `post-finish` fires.
    #[serde(default = "default_true")]
    pub remove_finished: bool,
    /// Suffix appended to the upload id to form the data file name.
    #[serde(default)]
    pub data_suffix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            remove_finished: true,
            data_suffix: String::new(),
        }
    }
}

fn default_upload_dir() -> String {
    "./data".to_string()
}

fn default_true() -> bool {
    true
}
