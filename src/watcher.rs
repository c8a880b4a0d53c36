//! Filesystem watch adapter for the status files.
//!
//! The watcher observes the status directory and normalizes raw filesystem
//! notifications into [`ChangeEvent`]s carrying the changed file's name and
//! full content. The directory is watched rather than the individual files:
//! per-file watches follow the inode and go quiet when a file is deleted and
//! recreated, while a directory watch surfaces the recreation as an ordinary
//! create event.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::MisterConfig;
use crate::error::{BridgeError, Result};
use crate::sensor::Sensor;

/// Capacity of the change event channel handed to the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A normalized change observed on a watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Base name of the file that changed, e.g. `CORENAME`.
    pub file_name: String,
    /// Raw file content, untrimmed.
    pub content: String,
}

/// Watches the fixed status file set and emits [`ChangeEvent`]s.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl FileWatcher {
    /// Start watching the status files under `config.status_dir`.
    ///
    /// Missing status files are created empty so consumers see a defined
    /// initial value; creation failures are logged and skipped. Once the
    /// watch is registered, the first events on the returned channel are an
    /// initial snapshot of every readable file, in registry order, ahead of
    /// any notification-driven event.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &MisterConfig) -> Result<(Self, mpsc::Receiver<ChangeEvent>)> {
        let paths: Vec<PathBuf> = Sensor::ALL
            .iter()
            .map(|sensor| config.status_dir.join(sensor.file_name()))
            .collect();

        for path in &paths {
            if !path.exists() {
                if let Err(e) = std::fs::write(path, b"") {
                    tracing::warn!(path = %path.display(), error = %e, "Could not create status file");
                }
            }
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();

        // The callback runs on the notify thread; the unbounded channel keeps
        // it from ever blocking there.
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                if raw_tx.send(result).is_err() {
                    tracing::debug!("Watch task stopped, dropping notification");
                }
            },
            notify::Config::default(),
        )
        .map_err(|e| BridgeError::WatchSetup(format!("Failed to create watcher: {}", e)))?;

        if let Err(e) = watcher.watch(&config.status_dir, RecursiveMode::NonRecursive) {
            tracing::warn!(
                dir = %config.status_dir.display(),
                error = %e,
                "Could not register watch; file changes will not be observed"
            );
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let task = tokio::spawn(watch_loop(paths, raw_rx, event_tx));

        tracing::info!(dir = %config.status_dir.display(), "Watching status files");

        Ok((Self { watcher, task }, event_rx))
    }

    /// Stop watching and wait for in-flight events to drain.
    ///
    /// After this returns no further events are delivered and the event
    /// channel is closed.
    pub async fn stop(self) {
        // Dropping the watcher ends notification delivery and closes the raw
        // channel; the watch task exits once it has drained.
        drop(self.watcher);

        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "Watch task ended abnormally");
            }
        }

        tracing::debug!("File watcher stopped");
    }
}

/// Drain raw notifications into normalized change events.
///
/// Emits the initial snapshot first, then one event per content-changing
/// notification on a watched file. Exits when the raw channel closes or the
/// consumer goes away.
async fn watch_loop(
    paths: Vec<PathBuf>,
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    event_tx: mpsc::Sender<ChangeEvent>,
) {
    for path in &paths {
        if let Some(event) = read_change(path) {
            if event_tx.send(event).await.is_err() {
                return;
            }
        }
    }

    while let Some(result) = raw_rx.recv().await {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                // A notification error does not invalidate the watch.
                tracing::warn!(error = %e, "Watch notification error");
                continue;
            }
        };

        if !is_content_change(&event.kind) {
            continue;
        }

        for path in event.paths.iter().filter(|path| is_watched(path)) {
            if let Some(change) = read_change(path) {
                if event_tx.send(change).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Whether a notification kind can mean new file content.
///
/// Creates cover recreation after deletion, renames onto a watched name
/// cover atomic replacement, and data modifications cover in-place writes.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(
                ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Name(RenameMode::To)
            )
    )
}

/// Whether a notification path belongs to the watched file set.
///
/// The directory watch reports every child, so unrelated files are filtered
/// here by base name.
fn is_watched(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(Sensor::from_file_name)
        .is_some()
}

/// Read a watched file into a change event.
///
/// Read failures are logged and yield no event; one unreadable file must not
/// stop the others from being observed.
fn read_change(path: &Path) -> Option<ChangeEvent> {
    let file_name = path.file_name()?.to_string_lossy().into_owned();

    match std::fs::read_to_string(path) {
        Ok(content) => Some(ChangeEvent { file_name, content }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read status file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};

    #[test]
    fn test_content_change_kinds() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Create(CreateKind::Any)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
            DataChange::Any
        ))));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Name(
            RenameMode::To
        ))));
    }

    #[test]
    fn test_non_content_kinds_ignored() {
        assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Any
        ))));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Name(
            RenameMode::From
        ))));
        assert!(!is_content_change(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_is_watched_filters_by_base_name() {
        assert!(is_watched(Path::new("/tmp/CORENAME")));
        assert!(is_watched(Path::new("/tmp/ACTIVEGAME")));
        assert!(is_watched(Path::new("/tmp/RBFNAME")));
        assert!(!is_watched(Path::new("/tmp/VIDEOMODE")));
        assert!(!is_watched(Path::new("/tmp")));
    }

    #[test]
    fn test_read_change_carries_raw_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CORENAME");
        std::fs::write(&path, "SuperFamicom\n").unwrap();

        let event = read_change(&path).unwrap();
        assert_eq!(event.file_name, "CORENAME");
        assert_eq!(event.content, "SuperFamicom\n");
    }

    #[test]
    fn test_read_change_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_change(&dir.path().join("CORENAME")).is_none());
    }
}
