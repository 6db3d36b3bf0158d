//! File watching for rebuilds.

use std::collections::HashMap;
use std::mem::{discriminant, Discriminant};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A template changed
    Template(PathBuf),

    /// A data file changed
    Data(PathBuf),

    /// A static asset changed
    Static(PathBuf),
}

/// Directories whose changes trigger a rebuild.
#[derive(Debug, Clone)]
pub struct WatchRoots {
    pub templates: PathBuf,
    pub data: PathBuf,
    pub static_dir: PathBuf,
}

impl WatchRoots {
    fn paths(&self) -> [&Path; 3] {
        [&self.templates, &self.data, &self.static_dir]
    }

    /// Classify a changed path by the root it lives under.
    pub fn classify(&self, path: &Path) -> Option<WatchEvent> {
        if path.starts_with(&self.templates) {
            Some(WatchEvent::Template(path.to_path_buf()))
        } else if path.starts_with(&self.data) {
            Some(WatchEvent::Data(path.to_path_buf()))
        } else if path.starts_with(&self.static_dir) {
            Some(WatchEvent::Static(path.to_path_buf()))
        } else {
            None
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: notify::RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given roots.
    ///
    /// Returns the watcher and a channel to receive events. Roots are canonicalized
    /// so that they match the absolute paths notify reports.
    pub fn new(
        roots: &WatchRoots,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        let resolved = WatchRoots {
            templates: resolve(&roots.templates),
            data: resolve(&roots.data),
            static_dir: resolve(&roots.static_dir),
        };

        for path in resolved.paths() {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::debug!("Not watching missing directory {}", path.display());
            }
        }

        std::thread::spawn(move || {
            let mut debouncer = Debouncer::default();

            while let Ok(event) = sync_rx.recv() {
                if !is_change(&event.kind) {
                    continue;
                }

                let Some(e) = event.paths.iter().find_map(|p| resolved.classify(p)) else {
                    continue;
                };

                if !debouncer.accept(&e, Instant::now()) {
                    continue;
                }

                if async_tx.blocking_send(e).is_err() {
                    break;
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Drops repeats of the same kind of event that arrive within [`DEBOUNCE`].
/// Each kind has its own window, so a static change right after a template
/// change still triggers its own rebuild.
#[derive(Debug, Default)]
struct Debouncer {
    last: HashMap<Discriminant<WatchEvent>, Instant>,
}

impl Debouncer {
    fn accept(&mut self, event: &WatchEvent, now: Instant) -> bool {
        let kind = discriminant(event);
        if self
            .last
            .get(&kind)
            .is_some_and(|last| now.duration_since(*last) < DEBOUNCE)
        {
            return false;
        }
        self.last.insert(kind, now);
        true
    }
}

fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn is_change(kind: &notify::EventKind) -> bool {
    use notify::EventKind;

    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
