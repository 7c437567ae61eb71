use fidel_core::mapping::MappingError;
use fidel_session::KeyEvent;

use crate::worker::KeyOutcome;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FidelError {
    #[error("IO error: {msg}")]
    Io { msg: String },
    #[error("invalid data: {msg}")]
    InvalidData { msg: String },
    /// Returned by a host injector that gave up after `delivered` keystrokes.
    #[error("injection failed after {delivered} keystrokes: {msg}")]
    Injection { delivered: u32, msg: String },
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

impl From<MappingError> for FidelError {
    fn from(err: MappingError) -> Self {
        let msg = err.to_string();
        match err {
            MappingError::NotFound(_) | MappingError::Io { .. } => FidelError::Io { msg },
            MappingError::Decode { .. } | MappingError::Empty(_) => FidelError::InvalidData { msg },
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for FidelError {
    fn from(err: uniffi::UnexpectedUniFFICallbackError) -> Self {
        FidelError::Internal { msg: err.reason }
    }
}

// ---------------------------------------------------------------------------
// Records / enums
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, uniffi::Enum)]
pub enum FidelKeyEvent {
    /// A printable key. Anything but exactly one character counts as `Other`.
    Character { text: String },
    Backspace,
    WhitespaceOrEnter,
    Toggle,
    Other,
}

impl From<FidelKeyEvent> for KeyEvent {
    fn from(event: FidelKeyEvent) -> Self {
        match event {
            FidelKeyEvent::Character { text } => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyEvent::from_char(c),
                    _ => KeyEvent::Other,
                }
            }
            FidelKeyEvent::Backspace => KeyEvent::Backspace,
            FidelKeyEvent::WhitespaceOrEnter => KeyEvent::WhitespaceOrEnter,
            FidelKeyEvent::Toggle => KeyEvent::Toggle,
            FidelKeyEvent::Other => KeyEvent::Other,
        }
    }
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct FidelCorrection {
    pub delete_count: u32,
    pub insert: String,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct FidelKeyResponse {
    pub consumed: bool,
    pub correction: Option<FidelCorrection>,
    pub toggled: Option<bool>,
    pub injection_error: Option<String>,
}

impl FidelKeyResponse {
    pub(super) fn pass_through() -> Self {
        Self {
            consumed: false,
            correction: None,
            toggled: None,
            injection_error: None,
        }
    }
}

impl From<KeyOutcome> for FidelKeyResponse {
    fn from(outcome: KeyOutcome) -> Self {
        let response = outcome.response;
        Self {
            consumed: response.consumed,
            correction: response.correction.map(|c| FidelCorrection {
                delete_count: u32::try_from(c.delete_count).unwrap_or(u32::MAX),
                insert: c.insert,
            }),
            toggled: response.side_effects.toggled,
            injection_error: outcome.injection_error.map(|e| e.to_string()),
        }
    }
}
