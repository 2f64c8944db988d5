// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::Result;
use crate::watch::controller::ControllerEvent;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    root: PathBuf,
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    /// The directory actually being watched (canonicalized when possible).
    ///
    /// Event paths are reported under this directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and forwards
/// every notify event into `tx`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    tx: mpsc::UnboundedSender<ControllerEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = tx.send(ControllerEvent::Fs(event)) {
                    // The controller is gone; nothing left to notify.
                    eprintln!("stylepipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("stylepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    Ok(WatcherHandle {
        root,
        _inner: watcher,
    })
}
