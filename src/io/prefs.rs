// prefs.rs — shared unit constants and the leveled display/notification facility.
// Migrated from lz4io.c lines 1–345 and lz4io.h (lz4-1.10.0/programs).
//
// Trimmed: the original `Prefs` struct (CLI-facing: pass-through/overwrite/
// dictionary-filename/remove-src-file/etc.) and the CPU-load timing helpers
// were file- and CLI-only concerns and have no counterpart in this crate.
// What survives — the `KB`/`MB`/`GB` unit constants and the leveled
// `eprintln!`-based notification facility — is this crate's ambient logging
// mechanism, used the same way by `mt::` as the teacher used it in
// `io/compress_mt.rs`.

use std::sync::atomic::{AtomicI32, Ordering};

// ---------------------------------------------------------------------------
// Numeric constants (C: KB/MB/GB macros, lz4io.c lines 69–71)
// ---------------------------------------------------------------------------
pub const KB: usize = 1 << 10;
pub const MB: usize = 1 << 20;
pub const GB: usize = 1 << 30;

// ---------------------------------------------------------------------------
// Display / notification globals (lz4io.c lines 100, 109)
// ---------------------------------------------------------------------------

/// Global notification level. 0 = silent, 1 = errors only, 2 = results +
/// warnings, 3 = progress, 4+ = verbose. Equivalent to `g_displayLevel`.
pub static DISPLAY_LEVEL: AtomicI32 = AtomicI32::new(0);

/// Write `msg` to stderr if the current notification level is ≥ `level`.
/// Flushes stderr when level ≥ 4 (matches the C `DISPLAYLEVEL` macro).
#[inline]
pub fn display_level(level: i32, msg: &str) {
    if DISPLAY_LEVEL.load(Ordering::Relaxed) >= level {
        eprint!("{}", msg);
        if DISPLAY_LEVEL.load(Ordering::Relaxed) >= 4 {
            use std::io::Write;
            let _ = std::io::stderr().flush();
        }
    }
}

/// Sets the global notification level. Returns the value stored.
/// Equivalent to `int LZ4IO_setNotificationLevel(int level)`.
pub fn set_notification_level(level: i32) -> i32 {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
    level
}

// ---------------------------------------------------------------------------
// Default worker-count calculation (lz4io.c lines 167–177)
// ---------------------------------------------------------------------------

/// Returns the default number of compression worker threads.
///
/// Uses the physical core count and reserves a fraction for other work,
/// matching `LZ4IO_defaultNbWorkers()`.
pub fn default_nb_workers() -> i32 {
    let nb_cores = crate::util::count_cores() as i32;
    let spared = 1 + ((nb_cores as u32) >> 3) as i32;
    if nb_cores <= spared {
        1
    } else {
        nb_cores - spared
    }
}
