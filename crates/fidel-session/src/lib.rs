//! Keystroke substitution session.
//!
//! `SubstitutionSession` owns the matching buffer, the echo ledger and the
//! active flag. It consumes classified key events one at a time and answers
//! with the correction (delete N characters, then insert a glyph) the caller
//! must synthesize into the focused application.

mod commit;
mod echo;
mod key_handlers;
mod types;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use fidel_core::mapping::MappingTable;
use tracing::info;

pub use echo::CommitId;
pub use types::{Correction, KeyEvent, KeyResponse, SideEffects};

use echo::EchoLedger;

/// Stateful substitution engine for a single key-event stream.
///
/// Every event must be fully processed, correction included, before the next
/// one arrives; callers serialize access (see the engine worker).
pub struct SubstitutionSession {
    table: Arc<MappingTable>,

    active: bool,
    /// Trigger characters typed since the last reset; empty or a prefix of
    /// at least one stored sequence.
    buffer: String,
    echo: EchoLedger,
}

impl SubstitutionSession {
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self::with_active(table, true)
    }

    /// Start with a toggle state restored by the host.
    pub fn with_active(table: Arc<MappingTable>, active: bool) -> Self {
        Self {
            table,
            active,
            buffer: String::new(),
            echo: EchoLedger::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Synthesized backspaces still expected back from the input pipeline.
    pub fn pending_echo_backspaces(&self) -> usize {
        self.echo.pending()
    }

    pub fn table(&self) -> &Arc<MappingTable> {
        &self.table
    }

    /// Flip substitution on or off. Same as feeding `KeyEvent::Toggle`.
    pub fn toggle(&mut self) -> KeyResponse {
        self.handle_key(KeyEvent::Toggle)
    }

    /// Replace the mapping table. The open sequence is dropped because it was
    /// matched against the old table; outstanding echoes are kept.
    pub fn set_table(&mut self, table: Arc<MappingTable>) {
        info!(entries = table.len(), "mapping table swapped");
        self.table = table;
        self.clear_buffer();
    }

    /// The injector failed part-way through `commit`: only `delivered`
    /// backspaces reached the input pipeline, so only those will echo back.
    /// The buffer is left alone; the on-screen edit cannot be un-inferred.
    pub fn injection_failed(&mut self, commit: CommitId, delivered: usize) {
        self.echo.settle(commit, delivered);
    }

    /// Drop the open sequence and every outstanding echo.
    pub fn reset(&mut self) {
        self.clear_buffer();
        self.echo.clear();
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
    }
}
