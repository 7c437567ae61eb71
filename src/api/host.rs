use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fidel_core::mapping::{ensure_source, MappingError, MappingTable};
use fidel_session::SubstitutionSession;
use tracing::warn;

use super::types::{FidelError, FidelKeyEvent, FidelKeyResponse};
use crate::inject::{InjectionError, Injector};
use crate::watcher::{reload_mapping, MappingWatcher};
use crate::worker::{EngineHandle, EngineWorker, ToggleObserver};

// ---------------------------------------------------------------------------
// Foreign traits (implemented by the host application)
// ---------------------------------------------------------------------------

/// Synthesizes keystrokes in the focused application.
#[uniffi::export(with_foreign)]
pub trait FidelInjector: Send + Sync {
    fn delete_backward(&self, count: u32) -> Result<(), FidelError>;
    fn insert_text(&self, text: String) -> Result<(), FidelError>;
}

/// Told about every active-state change, e.g. to update a tray indicator.
#[uniffi::export(with_foreign)]
pub trait FidelToggleObserver: Send + Sync {
    fn on_toggled(&self, active: bool);
}

struct ForeignInjector(Arc<dyn FidelInjector>);

impl Injector for ForeignInjector {
    fn delete_backward(&mut self, count: usize) -> Result<(), InjectionError> {
        let requested = u32::try_from(count).unwrap_or(u32::MAX);
        self.0.delete_backward(requested).map_err(|err| match err {
            FidelError::Injection { delivered, msg } => InjectionError::PartialDelete {
                delivered: delivered as usize,
                requested: count,
                message: msg,
            },
            other => InjectionError::PartialDelete {
                delivered: 0,
                requested: count,
                message: other.to_string(),
            },
        })
    }

    fn insert_text(&mut self, text: &str) -> Result<(), InjectionError> {
        self.0
            .insert_text(text.to_string())
            .map_err(|err| InjectionError::Insert(err.to_string()))
    }
}

struct ForeignObserver(Arc<dyn FidelToggleObserver>);

impl ToggleObserver for ForeignObserver {
    fn on_toggled(&self, active: bool) {
        self.0.on_toggled(active);
    }
}

// ---------------------------------------------------------------------------
// FidelHost
// ---------------------------------------------------------------------------

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Load the startup table. A missing user file is bootstrapped from the
/// built-in table first; a degraded load still starts with what it got.
fn initial_table(path: Option<&Path>) -> Result<MappingTable, MappingError> {
    let Some(path) = path else {
        return Ok(MappingTable::builtin());
    };
    ensure_source(path)?;
    let outcome = MappingTable::load(path)?;
    if let Some(warning) = outcome.warning {
        warn!(%warning, "starting with a degraded mapping table");
    }
    Ok(outcome.table)
}

#[derive(uniffi::Object)]
pub struct FidelHost {
    handle: EngineHandle,
    worker: Mutex<Option<EngineWorker>>,
    watcher: Mutex<Option<MappingWatcher>>,
    mapping_path: Mutex<Option<PathBuf>>,
}

#[uniffi::export]
impl FidelHost {
    #[uniffi::constructor]
    pub fn new(
        injector: Arc<dyn FidelInjector>,
        observer: Option<Arc<dyn FidelToggleObserver>>,
        mapping_path: Option<String>,
        start_active: bool,
    ) -> Result<Arc<Self>, FidelError> {
        let mapping_path = mapping_path.map(PathBuf::from);
        let table = initial_table(mapping_path.as_deref())?;
        let session = SubstitutionSession::with_active(Arc::new(table), start_active);
        let observer = observer.map(|o| Arc::new(ForeignObserver(o)) as Arc<dyn ToggleObserver>);
        let worker = EngineWorker::spawn(
            session,
            move |_| Box::new(ForeignInjector(injector)),
            observer,
        );
        Ok(Arc::new(Self {
            handle: worker.handle(),
            worker: Mutex::new(Some(worker)),
            watcher: Mutex::new(None),
            mapping_path: Mutex::new(mapping_path),
        }))
    }

    /// Current active state; false once shut down.
    pub fn is_active(&self) -> bool {
        self.handle.is_active().unwrap_or(false)
    }

    /// Flip the active state and return the new one.
    pub fn toggle(&self) -> bool {
        self.handle.toggle().unwrap_or(false)
    }

    /// Load `path` and make it the live table. Returns the entry count.
    pub fn reload_mapping(&self, path: String) -> Result<u32, FidelError> {
        let path = PathBuf::from(path);
        let entries = reload_mapping(&path, &self.handle)?;
        *lock(&self.mapping_path) = Some(path);
        Ok(u32::try_from(entries).unwrap_or(u32::MAX))
    }

    /// Process one key and wait for its correction to be injected.
    pub fn handle_key(&self, event: FidelKeyEvent) -> FidelKeyResponse {
        self.handle
            .handle(event.into())
            .map(FidelKeyResponse::from)
            .unwrap_or_else(FidelKeyResponse::pass_through)
    }

    /// Queue a key without waiting, for hook callbacks that must return fast.
    pub fn submit_key(&self, event: FidelKeyEvent) -> bool {
        self.handle.submit(event.into())
    }

    /// Poll the current mapping file and reload it when it changes.
    pub fn watch_mapping(&self, poll_interval_ms: u64) -> Result<(), FidelError> {
        if poll_interval_ms == 0 {
            return Err(FidelError::InvalidData {
                msg: "poll interval must be positive".into(),
            });
        }
        let path = lock(&self.mapping_path).clone().ok_or_else(|| FidelError::InvalidData {
            msg: "no mapping file to watch".into(),
        })?;
        let watcher = MappingWatcher::spawn(
            path,
            Duration::from_millis(poll_interval_ms),
            self.handle.clone(),
        );
        // Replacing stops the previous watcher.
        *lock(&self.watcher) = Some(watcher);
        Ok(())
    }

    pub fn shutdown(&self) {
        if let Some(watcher) = lock(&self.watcher).take() {
            watcher.stop();
        }
        if let Some(worker) = lock(&self.worker).take() {
            worker.shutdown();
        }
    }
}
