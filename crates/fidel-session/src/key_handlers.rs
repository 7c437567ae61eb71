use tracing::{debug, debug_span, info};

use fidel_core::mapping::Probe;

use super::types::{KeyEvent, KeyResponse};
use super::SubstitutionSession;

impl SubstitutionSession {
    /// Process one classified key event and describe what the caller must do.
    pub fn handle_key(&mut self, event: KeyEvent) -> KeyResponse {
        let _span = debug_span!("handle_key", ?event, buffer = %self.buffer).entered();

        match event {
            KeyEvent::Toggle => {
                self.active = !self.active;
                self.clear_buffer();
                info!(active = self.active, "substitution toggled");
                let mut r = KeyResponse::consumed();
                r.side_effects.toggled = Some(self.active);
                r
            }

            // Bypass: nothing is tracked while inactive.
            _ if !self.active => KeyResponse::pass_through(),

            KeyEvent::Backspace => match self.echo.try_consume() {
                Some(commit) => {
                    debug!(%commit, left = self.echo.pending(), "echo backspace swallowed");
                    KeyResponse::consumed()
                }
                None => {
                    // Cannot tell which buffered character was erased; forget them all.
                    self.clear_buffer();
                    KeyResponse::pass_through()
                }
            },

            KeyEvent::WhitespaceOrEnter => {
                self.clear_buffer();
                KeyResponse::pass_through()
            }

            KeyEvent::Character(c) => self.handle_char(c),

            KeyEvent::Other => KeyResponse::pass_through(),
        }
    }

    fn handle_char(&mut self, c: char) -> KeyResponse {
        let mut utf8 = [0u8; 4];
        let text: &str = c.encode_utf8(&mut utf8);

        // Trailing glyph of our own insertion coming back through the pipeline.
        if self.table.is_output_glyph(text) {
            return KeyResponse::pass_through();
        }

        let candidate = format!("{}{}", self.buffer, c);
        match self.table.probe(&candidate) {
            Probe::Exact(glyph) | Probe::ExactAndPrefix(glyph) => {
                // Replace the previous glyph too when this extends a sequence.
                let delete = if self.buffer.is_empty() { 1 } else { 2 };
                self.commit(candidate, glyph, delete)
            }
            Probe::Prefix => {
                self.buffer = candidate;
                KeyResponse::pass_through()
            }
            Probe::None => self.reseed(c, text),
        }
    }

    /// The open sequence is broken: whatever it left on screen stays final,
    /// and `c` is tried as the start of a new sequence.
    fn reseed(&mut self, c: char, text: &str) -> KeyResponse {
        if !self.buffer.is_empty() {
            debug!(abandoned = %self.buffer, "sequence broken");
        }
        self.clear_buffer();
        match self.table.probe(text) {
            Probe::Exact(glyph) | Probe::ExactAndPrefix(glyph) => {
                self.commit(c.to_string(), glyph, 1)
            }
            Probe::Prefix => {
                self.buffer.push(c);
                KeyResponse::pass_through()
            }
            Probe::None => KeyResponse::pass_through(),
        }
    }
}
