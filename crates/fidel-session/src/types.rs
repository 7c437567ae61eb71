use super::echo::CommitId;

/// Key event as classified by the platform hook adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A printable character (trigger character or echoed output glyph).
    Character(char),
    Backspace,
    /// Space, Enter and other sequence-breaking whitespace.
    WhitespaceOrEnter,
    /// The substitution on/off hotkey, or a UI toggle funneled through the queue.
    Toggle,
    /// Modifiers, navigation and anything else the engine does not track.
    Other,
}

impl KeyEvent {
    /// Classify a typed character the way the hook adapters do.
    pub fn from_char(c: char) -> Self {
        match c {
            ' ' | '\t' | '\n' | '\r' => Self::WhitespaceOrEnter,
            '\u{8}' => Self::Backspace,
            c if c.is_control() => Self::Other,
            c => Self::Character(c),
        }
    }
}

/// Delete `delete_count` characters before the cursor, then insert `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub commit: CommitId,
    pub delete_count: usize,
    pub insert: String,
}

/// Orthogonal side-effects that accompany a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffects {
    /// New active state after a toggle, for transient UI feedback.
    pub toggled: Option<bool>,
}

/// Response from `handle_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyResponse {
    /// The engine swallowed the event: its own echo, or the toggle key.
    pub consumed: bool,
    pub correction: Option<Correction>,
    pub side_effects: SideEffects,
}

impl KeyResponse {
    pub(crate) fn pass_through() -> Self {
        Self {
            consumed: false,
            correction: None,
            side_effects: SideEffects::default(),
        }
    }

    pub(crate) fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::pass_through()
        }
    }

    pub(crate) fn with_correction(correction: Correction) -> Self {
        Self {
            correction: Some(correction),
            ..Self::pass_through()
        }
    }
}
