pub mod error;
pub mod guard;
pub mod logs;
pub mod processor;
pub mod settings;
pub mod store;
pub mod watcher;

pub use error::WatchError;
pub use guard::WriteGuard;
pub use processor::{Outcome, Processor, SkipReason};
pub use settings::{is_excluded_path, Settings};
pub use store::{DocumentStore, FsStore};
