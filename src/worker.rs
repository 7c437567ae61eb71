use std::sync::{mpsc, Arc};
use std::thread;

use fidel_core::mapping::MappingTable;
use fidel_session::{Correction, KeyEvent, KeyResponse, SubstitutionSession};
use tracing::{debug, warn};

use crate::inject::{InjectionError, Injector};

// ---------------------------------------------------------------------------
// Commands / results
// ---------------------------------------------------------------------------

enum Command {
    Key {
        event: KeyEvent,
        reply: Option<mpsc::Sender<KeyOutcome>>,
    },
    SwapTable(Arc<MappingTable>),
    Snapshot(mpsc::Sender<SessionSnapshot>),
    Shutdown,
}

/// Result of one key event after its correction (if any) was injected.
#[derive(Debug, Clone)]
pub struct KeyOutcome {
    pub response: KeyResponse,
    pub injection_error: Option<InjectionError>,
}

/// Point-in-time view of the session owned by the worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub active: bool,
    pub buffer: String,
    pub pending_echo_backspaces: usize,
    pub entries: usize,
}

impl SessionSnapshot {
    fn of(session: &SubstitutionSession) -> Self {
        Self {
            active: session.is_active(),
            buffer: session.buffer().to_string(),
            pending_echo_backspaces: session.pending_echo_backspaces(),
            entries: session.table().len(),
        }
    }
}

/// Notified on the worker thread whenever the active flag flips.
pub trait ToggleObserver: Send + Sync {
    fn on_toggled(&self, active: bool);
}

// ---------------------------------------------------------------------------
// EngineHandle
// ---------------------------------------------------------------------------

/// Sender side of the engine queue. Cheap to clone; every clone feeds the
/// same worker, so events from the hook, the UI and the watcher are applied
/// in arrival order.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Queue a key event without waiting. Returns false once the worker is gone.
    pub fn submit(&self, event: KeyEvent) -> bool {
        self.tx.send(Command::Key { event, reply: None }).is_ok()
    }

    /// Queue a key event and wait until it has been processed and injected.
    ///
    /// Must not be called from inside an [`Injector`]: the worker would wait
    /// on itself.
    pub fn handle(&self, event: KeyEvent) -> Option<KeyOutcome> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(Command::Key {
                event,
                reply: Some(reply_tx),
            })
            .ok()?;
        reply_rx.recv().ok()
    }

    /// Flip the active flag. Returns the new state.
    pub fn toggle(&self) -> Option<bool> {
        self.handle(KeyEvent::Toggle)
            .and_then(|outcome| outcome.response.side_effects.toggled)
    }

    pub fn swap_table(&self, table: Arc<MappingTable>) -> bool {
        self.tx.send(Command::SwapTable(table)).is_ok()
    }

    /// Waits for every command queued before this call, then reports state.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx.send(Command::Snapshot(reply_tx)).ok()?;
        reply_rx.recv().ok()
    }

    pub fn is_active(&self) -> Option<bool> {
        self.snapshot().map(|s| s.active)
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

// ---------------------------------------------------------------------------
// EngineWorker
// ---------------------------------------------------------------------------

/// Owns the worker thread. Dropping it stops the thread and waits for it.
pub struct EngineWorker {
    handle: EngineHandle,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineWorker {
    /// Start the worker. `make_injector` runs on the worker thread, so the
    /// injector itself need not be `Send`; it receives a handle for hosts
    /// that feed synthesized input back into the queue.
    pub fn spawn<F>(
        session: SubstitutionSession,
        make_injector: F,
        observer: Option<Arc<dyn ToggleObserver>>,
    ) -> Self
    where
        F: FnOnce(EngineHandle) -> Box<dyn Injector> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Command>();
        let handle = EngineHandle { tx };
        let worker_handle = handle.clone();
        let thread = thread::Builder::new()
            .name("fidel-engine".into())
            .spawn(move || {
                let injector = make_injector(worker_handle);
                run(rx, session, injector, observer);
            })
            .expect("failed to spawn engine worker");

        Self {
            handle,
            thread: Some(thread),
        }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the worker after the commands already queued.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.handle.shutdown();
            if thread.join().is_err() {
                warn!("engine worker panicked");
            }
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Worker thread
// ---------------------------------------------------------------------------

fn run(
    rx: mpsc::Receiver<Command>,
    mut session: SubstitutionSession,
    mut injector: Box<dyn Injector>,
    observer: Option<Arc<dyn ToggleObserver>>,
) {
    debug!(active = session.is_active(), "engine worker started");
    while let Ok(command) = rx.recv() {
        match command {
            Command::Key { event, reply } => {
                let outcome = process_key(&mut session, injector.as_mut(), event);
                if let (Some(active), Some(observer)) =
                    (outcome.response.side_effects.toggled, observer.as_ref())
                {
                    observer.on_toggled(active);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            Command::SwapTable(table) => session.set_table(table),
            Command::Snapshot(reply) => {
                let _ = reply.send(SessionSnapshot::of(&session));
            }
            Command::Shutdown => break,
        }
    }
    debug!("engine worker stopped");
}

fn process_key(
    session: &mut SubstitutionSession,
    injector: &mut dyn Injector,
    event: KeyEvent,
) -> KeyOutcome {
    let response = session.handle_key(event);
    let mut injection_error = None;
    if let Some(correction) = &response.correction {
        if let Err((err, delivered)) = apply(injector, correction) {
            // No retry: the keystrokes already went through.
            warn!(commit = %correction.commit, delivered, error = %err, "injection failed");
            session.injection_failed(correction.commit, delivered);
            injection_error = Some(err);
        }
    }
    KeyOutcome {
        response,
        injection_error,
    }
}

/// On failure, also reports how many backspaces reached the input pipeline.
fn apply(
    injector: &mut dyn Injector,
    correction: &Correction,
) -> Result<(), (InjectionError, usize)> {
    injector
        .delete_backward(correction.delete_count)
        .map_err(|err| {
            let delivered = err.delivered_backspaces();
            (err, delivered)
        })?;
    // Every backspace went out; they will echo even though the glyph did not.
    injector
        .insert_text(&correction.insert)
        .map_err(|err| (err, correction.delete_count))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Delete(usize),
        Insert(String),
    }

    struct Recorder(Arc<Mutex<Vec<Op>>>);

    impl Injector for Recorder {
        fn delete_backward(&mut self, count: usize) -> Result<(), InjectionError> {
            self.0.lock().unwrap().push(Op::Delete(count));
            Ok(())
        }
        fn insert_text(&mut self, text: &str) -> Result<(), InjectionError> {
            self.0.lock().unwrap().push(Op::Insert(text.to_string()));
            Ok(())
        }
    }

    /// Delivers one backspace of every batch, then fails.
    struct Flaky;

    impl Injector for Flaky {
        fn delete_backward(&mut self, count: usize) -> Result<(), InjectionError> {
            Err(InjectionError::PartialDelete {
                delivered: 1,
                requested: count,
                message: "queue full".into(),
            })
        }
        fn insert_text(&mut self, _text: &str) -> Result<(), InjectionError> {
            Ok(())
        }
    }

    /// Backspaces go out, the glyph never does.
    struct InsertFails;

    impl Injector for InsertFails {
        fn delete_backward(&mut self, _count: usize) -> Result<(), InjectionError> {
            Ok(())
        }
        fn insert_text(&mut self, _text: &str) -> Result<(), InjectionError> {
            Err(InjectionError::Insert("text input rejected".into()))
        }
    }

    struct Toggles(Mutex<Vec<bool>>);

    impl ToggleObserver for Toggles {
        fn on_toggled(&self, active: bool) {
            self.0.lock().unwrap().push(active);
        }
    }

    fn hu_session() -> SubstitutionSession {
        let table = MappingTable::from_entries([("h", "ሀ"), ("hu", "ሁ")]);
        SubstitutionSession::new(Arc::new(table))
    }

    #[test]
    fn test_corrections_are_injected_in_order() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ops);
        let worker = EngineWorker::spawn(hu_session(), move |_| Box::new(Recorder(sink)), None);
        let handle = worker.handle();

        handle.handle(KeyEvent::Character('h')).unwrap();
        let outcome = handle.handle(KeyEvent::Character('u')).unwrap();
        assert!(outcome.injection_error.is_none());
        assert_eq!(outcome.response.correction.unwrap().delete_count, 2);

        assert_eq!(
            *ops.lock().unwrap(),
            vec![
                Op::Delete(1),
                Op::Insert("ሀ".into()),
                Op::Delete(2),
                Op::Insert("ሁ".into()),
            ]
        );
        worker.shutdown();
    }

    #[test]
    fn test_injection_failure_retracts_echoes() {
        let worker = EngineWorker::spawn(hu_session(), |_| Box::new(Flaky), None);
        let handle = worker.handle();

        handle.handle(KeyEvent::Character('h')).unwrap();
        let outcome = handle.handle(KeyEvent::Character('u')).unwrap();
        assert!(matches!(
            outcome.injection_error,
            Some(InjectionError::PartialDelete { delivered: 1, .. })
        ));
        let snap = handle.snapshot().unwrap();
        assert_eq!(snap.pending_echo_backspaces, 2);
        assert_eq!(snap.buffer, "hu");
    }

    #[test]
    fn test_insert_failure_keeps_delivered_echoes() {
        let worker = EngineWorker::spawn(hu_session(), |_| Box::new(InsertFails), None);
        let handle = worker.handle();

        let outcome = handle.handle(KeyEvent::Character('h')).unwrap();
        assert!(matches!(outcome.injection_error, Some(InjectionError::Insert(_))));
        assert_eq!(handle.snapshot().unwrap().pending_echo_backspaces, 1);

        // The synthesized backspace still comes back and is swallowed.
        assert!(handle.handle(KeyEvent::Backspace).unwrap().response.consumed);
        let snap = handle.snapshot().unwrap();
        assert_eq!(snap.buffer, "h");
        assert_eq!(snap.pending_echo_backspaces, 0);

        let outcome = handle.handle(KeyEvent::Character('u')).unwrap();
        assert!(outcome.injection_error.is_some());
        assert_eq!(handle.snapshot().unwrap().pending_echo_backspaces, 2);
    }

    #[test]
    fn test_toggle_notifies_observer() {
        let toggles = Arc::new(Toggles(Mutex::new(Vec::new())));
        let observer: Arc<dyn ToggleObserver> = toggles.clone();
        let ops = Arc::new(Mutex::new(Vec::new()));
        let worker = EngineWorker::spawn(
            hu_session(),
            move |_| Box::new(Recorder(ops)),
            Some(observer),
        );
        let handle = worker.handle();

        assert_eq!(handle.toggle(), Some(false));
        assert_eq!(handle.is_active(), Some(false));
        assert!(handle.handle(KeyEvent::Character('h')).unwrap().response.correction.is_none());
        assert_eq!(handle.toggle(), Some(true));
        assert_eq!(*toggles.0.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn test_swap_table_is_ordered_with_keys() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let worker = EngineWorker::spawn(hu_session(), move |_| Box::new(Recorder(ops)), None);
        let handle = worker.handle();

        handle.submit(KeyEvent::Character('h'));
        handle.swap_table(Arc::new(MappingTable::from_entries([("l", "ለ")])));
        let snap = handle.snapshot().unwrap();
        assert_eq!(snap.buffer, "");
        assert_eq!(snap.entries, 1);

        let outcome = handle.handle(KeyEvent::Character('l')).unwrap();
        assert_eq!(outcome.response.correction.unwrap().insert, "ለ");
    }

    #[test]
    fn test_handle_after_shutdown_returns_none() {
        let worker = EngineWorker::spawn(hu_session(), |_| Box::new(Flaky), None);
        let handle = worker.handle();
        worker.shutdown();
        assert!(handle.handle(KeyEvent::Character('h')).is_none());
        assert!(!handle.submit(KeyEvent::Other));
    }
}
