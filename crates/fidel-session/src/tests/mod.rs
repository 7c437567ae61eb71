mod echo;
mod simulator;

use std::sync::Arc;

use fidel_core::mapping::MappingTable;

use super::{KeyEvent, KeyResponse, SubstitutionSession};

pub(super) fn make_test_table() -> Arc<MappingTable> {
    Arc::new(MappingTable::from_entries([
        ("h", "ሀ"),
        ("hu", "ሁ"),
        ("hi", "ሂ"),
        ("ha", "ሃ"),
        ("hW", "ኋ"),
        ("l", "ለ"),
        ("lu", "ሉ"),
        ("T", "ጠ"),
        ("Tu", "ጡ"),
        ("T[u", "ፁ"),
        ("T[o", "ፆ"),
        ("qW", "ቈ"),
    ]))
}

/// Table from the two-entry examples: `h → ሀ`, `hu → ሁ`.
pub(super) fn make_hu_table() -> Arc<MappingTable> {
    Arc::new(MappingTable::from_entries([("h", "ሀ"), ("hu", "ሁ")]))
}

// Helper: feed a string one character at a time, with no echo feedback.
pub(super) fn type_string(session: &mut SubstitutionSession, s: &str) -> Vec<KeyResponse> {
    s.chars()
        .map(|c| session.handle_key(KeyEvent::from_char(c)))
        .collect()
}

/// `(delete_count, insert)` pairs of every correction in `responses`.
pub(super) fn corrections(responses: &[KeyResponse]) -> Vec<(usize, String)> {
    responses
        .iter()
        .filter_map(|r| r.correction.as_ref())
        .map(|c| (c.delete_count, c.insert.clone()))
        .collect()
}
