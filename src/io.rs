//! Ambient I/O-adjacent surface retained from the original `lz4io` layer.
//!
//! File- and CLI-oriented submodules (`compress_frame`, `compress_legacy`,
//! `compress_mt`, `decompress_*`, `file_info`, `file_io`, `sparse`) have no
//! counterpart in this crate and were dropped; the multi-threaded driver
//! that superseded `compress_mt` lives in [`crate::mt`]. What remains is the
//! unit constants and leveled notification facility used as this crate's
//! ambient logging mechanism.

pub mod prefs;

pub use prefs::{default_nb_workers, display_level, set_notification_level, DISPLAY_LEVEL, GB, KB, MB};
