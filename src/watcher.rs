//! Mapping source reload: explicit (`reload_mapping`) or by polling the
//! file's modification time (`MappingWatcher`). Both deliver the new table
//! through the engine queue, so a swap never lands in the middle of a key.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use fidel_core::mapping::{MappingError, MappingTable};
use tracing::{debug, info, warn};

use crate::worker::EngineHandle;

/// Load `path` and swap it into the engine. Returns the entry count.
///
/// A missing or unreadable file keeps the current table and returns the
/// error. A readable file with no valid rows still swaps in the empty table.
pub fn reload_mapping(path: &Path, handle: &EngineHandle) -> Result<usize, MappingError> {
    let outcome = MappingTable::load(path)?;
    match outcome.warning {
        Some(err @ MappingError::NotFound(_)) => return Err(err),
        Some(warning) => warn!(%warning, "reloaded mapping is degraded"),
        None => {}
    }
    let entries = outcome.table.len();
    if !handle.swap_table(Arc::new(outcome.table)) {
        warn!("engine worker is gone, mapping not applied");
    }
    info!(path = %path.display(), entries, "mapping reloaded");
    Ok(entries)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Polls a mapping file and reloads it whenever its mtime changes.
pub struct MappingWatcher {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MappingWatcher {
    pub fn spawn(path: PathBuf, interval: Duration, handle: EngineHandle) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("fidel-mapping-watch".into())
            .spawn(move || watch(&path, interval, &handle, &flag))
            .expect("failed to spawn mapping watcher");
        Self {
            stop,
            thread: Some(thread),
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            let _ = thread.join();
        }
    }
}

impl Drop for MappingWatcher {
    fn drop(&mut self) {
        self.halt();
    }
}

fn watch(path: &Path, interval: Duration, handle: &EngineHandle, stop: &AtomicBool) {
    debug!(path = %path.display(), ?interval, "mapping watcher started");
    let mut last = modified(path);
    while !stop.load(Ordering::SeqCst) {
        thread::park_timeout(interval);
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let current = modified(path);
        if current == last {
            continue;
        }
        last = current;
        // Deleted files keep the table in place until they come back.
        if current.is_some() {
            if let Err(err) = reload_mapping(path, handle) {
                warn!(error = %err, "mapping reload failed, keeping current table");
            }
        }
    }
    debug!("mapping watcher stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use fidel_session::SubstitutionSession;

    use super::*;
    use crate::inject::{InjectionError, Injector};
    use crate::worker::EngineWorker;

    struct Discard;

    impl Injector for Discard {
        fn delete_backward(&mut self, _count: usize) -> Result<(), InjectionError> {
            Ok(())
        }
        fn insert_text(&mut self, _text: &str) -> Result<(), InjectionError> {
            Ok(())
        }
    }

    fn spawn_worker() -> EngineWorker {
        let session = SubstitutionSession::new(Arc::new(MappingTable::builtin()));
        EngineWorker::spawn(session, |_| Box::new(Discard), None)
    }

    #[test]
    fn test_reload_swaps_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.csv");
        fs::write(&path, "h,ሀ\nl,ለ\n").unwrap();

        let worker = spawn_worker();
        let handle = worker.handle();
        assert_eq!(reload_mapping(&path, &handle).unwrap(), 2);
        assert_eq!(handle.snapshot().unwrap().entries, 2);
    }

    #[test]
    fn test_reload_missing_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let worker = spawn_worker();
        let handle = worker.handle();
        let before = handle.snapshot().unwrap().entries;

        let err = reload_mapping(&dir.path().join("absent.csv"), &handle).unwrap_err();
        assert!(matches!(err, MappingError::NotFound(_)));
        assert_eq!(handle.snapshot().unwrap().entries, before);
    }

    #[test]
    fn test_reload_empty_source_swaps_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.csv");
        fs::write(&path, "only-one-column\n").unwrap();

        let worker = spawn_worker();
        let handle = worker.handle();
        assert_eq!(reload_mapping(&path, &handle).unwrap(), 0);
        assert_eq!(handle.snapshot().unwrap().entries, 0);
    }

    #[test]
    fn test_watcher_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.csv");
        fs::write(&path, "h,ሀ\n").unwrap();

        let worker = spawn_worker();
        let handle = worker.handle();
        let watcher = MappingWatcher::spawn(path.clone(), Duration::from_millis(10), handle.clone());

        fs::write(&path, "h,ሀ\nl,ለ\nT,ጠ\n").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.snapshot().unwrap().entries != 3 {
            assert!(Instant::now() < deadline, "watcher did not reload");
            thread::sleep(Duration::from_millis(10));
        }
        watcher.stop();
    }
}
