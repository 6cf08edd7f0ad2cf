// config.rs — Compile-time configuration constants.
// Migrated from lz4conf.h (lz4-1.10.0/programs).
//
// Trimmed: CLI-facing constants (`LZ4_CLEVEL_DEFAULT`, `LZ4IO_MULTITHREAD`,
// `LZ4_NBWORKERS_DEFAULT`, `LZ4_BLOCKSIZEID_DEFAULT`) governed command-line
// defaults with no counterpart in this crate. `NB_WORKERS_MAX` survives as
// the crate-wide worker cap `mt::config::NB_THREADS_MAX` reuses.

// Maximum number of compression worker threads selectable at runtime.
// Corresponds to LZ4_NBWORKERS_MAX in lz4conf.h.
pub const NB_WORKERS_MAX: usize = 200;
