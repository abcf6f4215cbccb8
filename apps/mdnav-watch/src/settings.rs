use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use mdnav_rs::TransformConfig;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::WatchError;

pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Persisted service settings. The transform fields sit at the top level of
/// the JSON object next to the service-only ones.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub transform: TransformConfig,
    pub debounce_ms: u64,
    #[serde(rename = "excludedFolders")]
    pub excluded_folders: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transform: TransformConfig::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            excluded_folders: Vec::new(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`. No path, or a path that does not exist,
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, WatchError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        match fs::read_to_string(path) {
            Ok(raw) => {
                let settings: Settings = serde_json::from_str(&raw)?;
                info!(path = %path.display(), "loaded settings");
                Ok(settings)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings file missing, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(WatchError::io(path, err)),
        }
    }

    pub fn transform_config(&self) -> TransformConfig {
        self.transform.normalized()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        is_excluded_path(path, &self.excluded_folders)
    }
}

/// True when the vault-relative `path` is one of `folders` or lies beneath
/// one of them. Matching is on whole path segments.
pub fn is_excluded_path(path: &str, folders: &[String]) -> bool {
    let path = normalize_folder(path);
    folders
        .iter()
        .map(|folder| normalize_folder(folder))
        .filter(|folder| !folder.is_empty())
        .any(|folder| {
            path == folder
                || path
                    .strip_prefix(folder.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
}

fn normalize_folder(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.trim_matches('/').to_string()
}
