//! Headless replay: types into a virtual text field through the real worker.
//!
//! The field behaves like an application behind a global hook: every user
//! keystroke lands in it, and every synthesized backspace or glyph both edits
//! it and comes back through the engine queue as an ordinary key event.

use std::sync::{Arc, Mutex, MutexGuard};

use fidel_core::mapping::MappingTable;
use fidel_session::{KeyEvent, SubstitutionSession};

use crate::inject::{InjectionError, Injector};
use crate::worker::{EngineHandle, EngineWorker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayCorrection {
    pub delete_count: usize,
    pub insert: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Final contents of the virtual field.
    pub text: String,
    pub corrections: Vec<ReplayCorrection>,
    pub active: bool,
    pub buffer: String,
    pub pending_echo_backspaces: usize,
}

type Screen = Arc<Mutex<Vec<char>>>;

fn lock(screen: &Screen) -> MutexGuard<'_, Vec<char>> {
    screen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn apply_keystroke(field: &mut Vec<char>, event: KeyEvent) {
    match event {
        KeyEvent::Character(c) => field.push(c),
        KeyEvent::WhitespaceOrEnter => field.push(' '),
        KeyEvent::Backspace => {
            field.pop();
        }
        KeyEvent::Toggle | KeyEvent::Other => {}
    }
}

struct ScreenInjector {
    screen: Screen,
    handle: EngineHandle,
}

impl Injector for ScreenInjector {
    fn delete_backward(&mut self, count: usize) -> Result<(), InjectionError> {
        for delivered in 0..count {
            if !self.handle.submit(KeyEvent::Backspace) {
                return Err(InjectionError::PartialDelete {
                    delivered,
                    requested: count,
                    message: "engine queue closed".into(),
                });
            }
            lock(&self.screen).pop();
        }
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> Result<(), InjectionError> {
        for c in text.chars() {
            if !self.handle.submit(KeyEvent::Character(c)) {
                return Err(InjectionError::Insert("engine queue closed".into()));
            }
            lock(&self.screen).push(c);
        }
        Ok(())
    }
}

/// Type `input` character by character.
pub fn replay(table: Arc<MappingTable>, input: &str) -> ReplayReport {
    let events: Vec<KeyEvent> = input.chars().map(KeyEvent::from_char).collect();
    replay_events(table, &events)
}

/// Feed raw key events, starting in the active state.
pub fn replay_events(table: Arc<MappingTable>, events: &[KeyEvent]) -> ReplayReport {
    let screen: Screen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&screen);
    let worker = EngineWorker::spawn(
        SubstitutionSession::new(table),
        move |handle| Box::new(ScreenInjector { screen: sink, handle }),
        None,
    );
    let handle = worker.handle();

    let mut corrections = Vec::new();
    for &event in events {
        apply_keystroke(&mut lock(&screen), event);
        let Some(outcome) = handle.handle(event) else {
            break;
        };
        if let Some(correction) = outcome.response.correction {
            corrections.push(ReplayCorrection {
                delete_count: correction.delete_count,
                insert: correction.insert,
            });
        }
    }

    // Drains the echo events still queued behind the last key.
    let snapshot = handle.snapshot().unwrap_or_default();
    worker.shutdown();

    let text = lock(&screen).iter().collect();
    ReplayReport {
        text,
        corrections,
        active: snapshot.active,
        buffer: snapshot.buffer,
        pending_echo_backspaces: snapshot.pending_echo_backspaces,
    }
}
