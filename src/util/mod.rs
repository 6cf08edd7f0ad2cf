//! Cross-cutting utility functions.
//!
//! Submodules:
//! - [`cores`] — CPU core counting via [`std::thread::available_parallelism`]
//!
//! File-path and directory-expansion helpers (`file_list`, `file_size`,
//! `file_status`) were CLI-only concerns and have no counterpart in this
//! crate.

pub mod cores;

pub use cores::count_cores;
