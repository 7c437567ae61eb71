//! UniFFI export layer: the surface a native host (tray app, hook daemon)
//! links against.

mod host;
mod types;

pub use host::{FidelHost, FidelInjector, FidelToggleObserver};
pub use types::{FidelCorrection, FidelError, FidelKeyEvent, FidelKeyResponse};

use std::path::Path;

// ---------------------------------------------------------------------------
// Top-level functions
// ---------------------------------------------------------------------------

#[uniffi::export]
fn engine_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[uniffi::export]
fn default_mapping_csv() -> String {
    fidel_core::mapping::DEFAULT_MAPPING_CSV.to_string()
}

#[uniffi::export]
fn settings_default_config() -> String {
    fidel_core::settings::default_toml().to_string()
}

#[uniffi::export]
fn settings_load_config(path: String) -> Result<(), FidelError> {
    let content = std::fs::read_to_string(&path).map_err(|e| FidelError::Io {
        msg: format!("{path}: {e}"),
    })?;
    fidel_core::settings::init_custom(content)
        .map_err(|e| FidelError::InvalidData { msg: e.to_string() })?;
    Ok(())
}

#[uniffi::export]
fn trace_init(log_dir: String) {
    crate::trace_init::init_tracing(Path::new(&log_dir));
}
