use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where notes are read from and written back to. Paths are relative to the
/// vault root.
pub trait DocumentStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// Plain filesystem vault.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::write(self.resolve(path), text)
    }
}
