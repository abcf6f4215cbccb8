use std::path::{Path, PathBuf};

use mdnav_rs::TransformConfig;
use tracing::{debug, info};

use crate::error::WatchError;
use crate::guard::WriteGuard;
use crate::settings::Settings;
use crate::store::DocumentStore;

const MARKDOWN_EXTENSION: &str = "md";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotMarkdown,
    Excluded,
    Guarded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Unchanged,
    Rewritten,
}

/// Runs the transform over single notes of one vault.
pub struct Processor<S> {
    store: S,
    settings: Settings,
    config: TransformConfig,
    guard: WriteGuard,
}

impl<S: DocumentStore> Processor<S> {
    pub fn new(store: S, settings: Settings, guard: WriteGuard) -> Self {
        let config = settings.transform_config();
        Self {
            store,
            settings,
            config,
            guard,
        }
    }

    pub fn guard(&self) -> &WriteGuard {
        &self.guard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Normalizes the note at the vault-relative `path`. The note is written
    /// back only when the transform changed it.
    pub fn process(&self, path: &Path) -> Result<Outcome, WatchError> {
        if let Some(reason) = self.skip_reason(path) {
            debug!(path = %path.display(), ?reason, "skipping");
            return Ok(Outcome::Skipped(reason));
        }

        let raw = self
            .store
            .read(path)
            .map_err(|err| WatchError::io(path, err))?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out = mdnav_rs::transform(&raw, &stem, &self.config);
        if out == raw {
            debug!(path = %path.display(), "already normalized");
            return Ok(Outcome::Unchanged);
        }

        self.guard.hold(path);
        if let Err(err) = self.store.write(path, &out) {
            self.guard.release(path);
            return Err(WatchError::io(path, err));
        }
        info!(path = %path.display(), "rewrote note");
        Ok(Outcome::Rewritten)
    }

    fn skip_reason(&self, path: &Path) -> Option<SkipReason> {
        let is_markdown = path
            .extension()
            .is_some_and(|ext| ext == MARKDOWN_EXTENSION);
        if !is_markdown {
            return Some(SkipReason::NotMarkdown);
        }
        if self.settings.is_excluded(&vault_path_string(path)) {
            return Some(SkipReason::Excluded);
        }
        if self.guard.is_held(path) {
            return Some(SkipReason::Guarded);
        }
        None
    }
}

/// `/`-separated form of a vault-relative path, as used by exclusion rules.
pub fn vault_path_string(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Maps an absolute event path to a vault-relative one; `None` when the path
/// lies outside `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
