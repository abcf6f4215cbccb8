use notify::{
    event::{EventKind, ModifyKind, RenameMode},
    Event, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{error, info, warn};

use crate::error::WatchError;
use crate::processor::{relative_to, Processor};
use crate::store::DocumentStore;

/// A running vault watch. Dropping it stops event delivery, after which the
/// worker drains what is left and exits.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    worker: JoinHandle<()>,
}

impl VaultWatcher {
    /// Blocks until the worker exits.
    pub fn join(self) {
        let VaultWatcher { _watcher, worker } = self;
        if worker.join().is_err() {
            error!("watch worker panicked");
        }
    }
}

pub fn watch_vault<S>(
    root: &Path,
    processor: Arc<Processor<S>>,
    debounce: Duration,
) -> Result<VaultWatcher, WatchError>
where
    S: DocumentStore + 'static,
{
    let root = root
        .canonicalize()
        .map_err(|err| WatchError::io(root, err))?;

    let (sender, receiver) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = sender.send(res);
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "watching vault");

    let worker = thread::spawn(move || {
        drain_batches(&receiver, debounce, |batch| {
            for event_path in batch {
                let Some(rel) = relative_to(&root, &event_path) else {
                    continue;
                };
                if let Err(err) = processor.process(&rel) {
                    warn!(path = %rel.display(), error = %err, "failed to process note");
                }
            }
        });
    });

    Ok(VaultWatcher {
        _watcher: watcher,
        worker,
    })
}

/// Receives events until the channel closes. Events arriving within
/// `debounce` of the first one are coalesced, and every distinct created or
/// modified path in that window is handed to `on_batch` once.
pub fn drain_batches<F>(
    receiver: &mpsc::Receiver<notify::Result<Event>>,
    debounce: Duration,
    mut on_batch: F,
) where
    F: FnMut(Vec<PathBuf>),
{
    let mut buffer: BTreeSet<PathBuf> = BTreeSet::new();

    loop {
        let event = match receiver.recv() {
            Ok(event) => event,
            Err(_) => break,
        };

        collect_paths(event, &mut buffer);
        let start = Instant::now();

        while start.elapsed() < debounce {
            let timeout = debounce.saturating_sub(start.elapsed());
            match receiver.recv_timeout(timeout) {
                Ok(event) => collect_paths(event, &mut buffer),
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        while let Ok(event) = receiver.try_recv() {
            collect_paths(event, &mut buffer);
        }

        if buffer.is_empty() {
            continue;
        }
        on_batch(std::mem::take(&mut buffer).into_iter().collect());
    }
}

fn collect_paths(event: notify::Result<Event>, buffer: &mut BTreeSet<PathBuf>) {
    match event {
        Ok(event) => {
            if is_content_change(&event.kind) {
                buffer.extend(event.paths);
            }
        }
        Err(err) => warn!(error = %err, "watch error"),
    }
}

/// Editors that save through a temp file show up as a rename onto the note.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => true,
        EventKind::Modify(ModifyKind::Name(_)) => false,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Remove(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => false,
    }
}
