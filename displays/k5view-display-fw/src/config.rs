//! Embedded configuration
//!
//! `build.rs` validates `mirror.toml` and stores it as postcard binary in
//! `OUT_DIR`; it is decoded once at boot.

use defmt::*;

use k5view_core::MirrorConfig;

/// Postcard-encoded mirror.toml
static CONFIG_BLOB: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/mirror.bin"));

/// Decode the embedded configuration, falling back to defaults
pub fn load() -> MirrorConfig {
    let config = match postcard::from_bytes::<MirrorConfig>(CONFIG_BLOB) {
        Ok(config) => config,
        Err(_) => {
            warn!("Embedded config unreadable, using defaults");
            return MirrorConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("Embedded config rejected ({:?}), using defaults", e);
            MirrorConfig::default()
        }
    }
}
