//! OS keyboard hook (`rdev`) and keystroke synthesis (`enigo`).

use enigo::{Direction, Enigo, Keyboard, Settings};
use fidel_core::settings::ToggleKey;
use fidel_session::KeyEvent;
use rdev::{Event, EventType, Key};
use tracing::{info, warn};

use crate::inject::{InjectionError, Injector};
use crate::worker::EngineHandle;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("cannot install keyboard hook: {0}")]
    Listen(String),
}

pub fn toggle_key_to_rdev(key: ToggleKey) -> Key {
    match key {
        ToggleKey::PageUp => Key::PageUp,
        ToggleKey::PageDown => Key::PageDown,
        ToggleKey::ScrollLock => Key::ScrollLock,
        ToggleKey::Pause => Key::Pause,
        ToggleKey::Insert => Key::Insert,
        ToggleKey::Function(n) => match n {
            1 => Key::F1,
            2 => Key::F2,
            3 => Key::F3,
            4 => Key::F4,
            5 => Key::F5,
            6 => Key::F6,
            7 => Key::F7,
            8 => Key::F8,
            9 => Key::F9,
            10 => Key::F10,
            11 => Key::F11,
            _ => Key::F12,
        },
    }
}

/// Map a key-down to the engine's taxonomy. `name` is the character the OS
/// layout produced for it, if any.
pub fn classify_press(key: Key, name: Option<&str>, toggle: Key) -> KeyEvent {
    if key == toggle {
        return KeyEvent::Toggle;
    }
    match key {
        Key::Backspace => KeyEvent::Backspace,
        Key::Space | Key::Return | Key::KpReturn | Key::Tab => KeyEvent::WhitespaceOrEnter,
        _ => {
            let mut chars = name.unwrap_or_default().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => KeyEvent::Character(c),
                _ => KeyEvent::Other,
            }
        }
    }
}

/// Key releases and pointer events are not part of the taxonomy.
pub fn classify(event: &Event, toggle: Key) -> Option<KeyEvent> {
    match event.event_type {
        EventType::KeyPress(key) => Some(classify_press(key, event.name.as_deref(), toggle)),
        _ => None,
    }
}

/// Install the global hook and feed every key-down into the engine queue.
/// Blocks for the life of the process.
pub fn listen(handle: EngineHandle, toggle: ToggleKey) -> Result<(), HookError> {
    let toggle = toggle_key_to_rdev(toggle);
    info!(?toggle, "installing keyboard hook");
    rdev::listen(move |event| {
        if let Some(key) = classify(&event, toggle) {
            handle.submit(key);
        }
    })
    .map_err(|e| HookError::Listen(format!("{e:?}")))
}

// ---------------------------------------------------------------------------
// Injection
// ---------------------------------------------------------------------------

pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    pub fn connect() -> Result<Self, InjectionError> {
        Enigo::new(&Settings::default())
            .map(|enigo| Self { enigo })
            .map_err(|e| InjectionError::Unavailable(e.to_string()))
    }
}

impl Injector for EnigoInjector {
    fn delete_backward(&mut self, count: usize) -> Result<(), InjectionError> {
        for delivered in 0..count {
            self.enigo
                .key(enigo::Key::Backspace, Direction::Click)
                .map_err(|e| InjectionError::PartialDelete {
                    delivered,
                    requested: count,
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> Result<(), InjectionError> {
        self.enigo
            .text(text)
            .map_err(|e| InjectionError::Insert(e.to_string()))
    }
}

struct UnavailableInjector(String);

impl Injector for UnavailableInjector {
    fn delete_backward(&mut self, _count: usize) -> Result<(), InjectionError> {
        Err(InjectionError::Unavailable(self.0.clone()))
    }

    fn insert_text(&mut self, _text: &str) -> Result<(), InjectionError> {
        Err(InjectionError::Unavailable(self.0.clone()))
    }
}

/// Connect to the platform input backend. Without one, every correction
/// fails and is reported, but the hook keeps running.
pub fn enigo_injector() -> Box<dyn Injector> {
    match EnigoInjector::connect() {
        Ok(injector) => Box::new(injector),
        Err(err) => {
            warn!(error = %err, "keystroke synthesis unavailable");
            Box::new(UnavailableInjector(err.to_string()))
        }
    }
}
