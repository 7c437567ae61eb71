use tracing::debug;

use super::types::{Correction, KeyResponse};
use super::SubstitutionSession;

impl SubstitutionSession {
    /// Replace the last `delete_count` characters before the cursor with `glyph`.
    ///
    /// The echo ledger is charged before the correction leaves the engine so
    /// the synthesized backspaces are recognized however soon they arrive.
    pub(super) fn commit(
        &mut self,
        sequence: String,
        glyph: String,
        delete_count: usize,
    ) -> KeyResponse {
        let commit = self.echo.expect(delete_count);
        debug!(%commit, %sequence, %glyph, delete_count, "commit");

        self.buffer = sequence;
        KeyResponse::with_correction(Correction {
            commit,
            delete_count,
            insert: glyph,
        })
    }
}
