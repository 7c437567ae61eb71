//! Fidel input method engine.
//!
//! Ties the mapping table and the substitution session to the outside world:
//! a single worker thread serializes every key event, toggle and table swap,
//! executes corrections through an [`Injector`], and reports toggles to an
//! observer. The `api` module exposes the host surface over UniFFI.

uniffi::setup_scaffolding!();

pub mod api;
#[cfg(feature = "hook")]
pub mod hook;
mod inject;
pub mod replay;
pub mod trace_init;
pub mod watcher;
mod worker;

pub use fidel_core::mapping::{MappingError, MappingTable};
pub use fidel_session::{Correction, KeyEvent, KeyResponse, SubstitutionSession};
pub use inject::{InjectionError, Injector};
pub use watcher::{reload_mapping, MappingWatcher};
pub use worker::{EngineHandle, EngineWorker, KeyOutcome, SessionSnapshot, ToggleObserver};
