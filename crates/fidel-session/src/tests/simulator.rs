use std::sync::Arc;

use fidel_core::mapping::MappingTable;

use super::make_test_table;
use crate::{KeyEvent, SubstitutionSession};

/// Headless text field for integration tests.
///
/// Every key reaches the field (a global hook cannot block them), and every
/// correction is replayed as real backspace and character events that flow
/// back through the session, exactly like synthesized input does.
pub(super) struct HeadlessField {
    pub session: SubstitutionSession,
    text: Vec<char>,
}

impl HeadlessField {
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self {
            session: SubstitutionSession::new(table),
            text: Vec::new(),
        }
    }

    pub fn key(&mut self, event: KeyEvent) {
        let resp = self.session.handle_key(event);
        match event {
            KeyEvent::Character(c) => self.text.push(c),
            KeyEvent::WhitespaceOrEnter => self.text.push(' '),
            KeyEvent::Backspace => {
                self.text.pop();
            }
            KeyEvent::Toggle | KeyEvent::Other => {}
        }
        if let Some(c) = resp.correction {
            for _ in 0..c.delete_count {
                self.key(KeyEvent::Backspace);
            }
            for ch in c.insert.chars() {
                self.key(KeyEvent::Character(ch));
            }
        }
    }

    pub fn type_str(&mut self, s: &str) -> String {
        for c in s.chars() {
            self.key(KeyEvent::from_char(c));
        }
        self.text()
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }
}

#[test]
fn test_headless_single_sequences() {
    let mut field = HeadlessField::new(make_test_table());
    assert_eq!(field.type_str("h"), "ሀ");
    assert_eq!(field.type_str("u"), "ሁ");
    assert_eq!(field.session.pending_echo_backspaces(), 0);
}

#[test]
fn test_headless_sentence() {
    let mut field = HeadlessField::new(make_test_table());
    assert_eq!(field.type_str("hu T[u hh lx"), "ሁ ጠፁ ሀሀ ለx");
    assert_eq!(field.session.pending_echo_backspaces(), 0);
}

#[test]
fn test_headless_user_backspace_after_commit() {
    let mut field = HeadlessField::new(make_test_table());
    field.type_str("hu");
    field.key(KeyEvent::Backspace);
    assert_eq!(field.text(), "");
    assert_eq!(field.session.buffer(), "");
    // Fresh sequence after the user erased the glyph.
    assert_eq!(field.type_str("l"), "ለ");
}

#[test]
fn test_headless_toggle_passes_latin() {
    let mut field = HeadlessField::new(make_test_table());
    field.type_str("h");
    field.key(KeyEvent::Toggle);
    assert_eq!(field.type_str("hu"), "ሀhu");
    field.key(KeyEvent::Toggle);
    assert_eq!(field.type_str(" lu"), "ሀhu ሉ");
}

#[test]
fn test_headless_builtin_table() {
    let mut field = HeadlessField::new(Arc::new(MappingTable::builtin()));
    assert_eq!(field.type_str("selam"), "ስላm");
    field.key(KeyEvent::WhitespaceOrEnter);
    assert_eq!(field.type_str("T[o"), "ስላm ፆ");
}
