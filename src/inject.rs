/// Error reported by a platform injector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectionError {
    #[error("synthesized {delivered} of {requested} backspaces: {message}")]
    PartialDelete {
        delivered: usize,
        requested: usize,
        message: String,
    },
    #[error("text insertion failed: {0}")]
    Insert(String),
    #[error("injector unavailable: {0}")]
    Unavailable(String),
}

impl InjectionError {
    /// Backspaces that reached the input pipeline before a failed
    /// `delete_backward`. Insert failures happen after the delete step.
    pub fn delivered_backspaces(&self) -> usize {
        match self {
            Self::PartialDelete { delivered, .. } => *delivered,
            Self::Insert(_) | Self::Unavailable(_) => 0,
        }
    }
}

/// Synthesizes corrective input into the focused application.
///
/// Called only from the engine worker thread, `delete_backward` then
/// `insert_text`, one correction at a time.
pub trait Injector {
    fn delete_backward(&mut self, count: usize) -> Result<(), InjectionError>;
    fn insert_text(&mut self, text: &str) -> Result<(), InjectionError>;
}
