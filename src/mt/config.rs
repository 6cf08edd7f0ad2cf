//! Configuration surface for the multi-threaded driver.
//!
//! Mirrors the style of the top-level `config.rs` (compile-time constants
//! migrated from `lz4conf.h`): plain `pub const`s plus one settings struct,
//! rather than a builder. Parameter ranges below are this crate's own
//! invention for the multi-threaded protocol described in `mt`'s module
//! documentation — there is no upstream `lz4mtconf.h` to migrate from.

use crate::config::NB_WORKERS_MAX;
use crate::frame::types::Preferences;
use crate::io::prefs::{default_nb_workers, KB, MB};

/// Maximum number of compression worker threads selectable at runtime.
/// Reuses the single-threaded crate's own worker cap.
pub const NB_THREADS_MAX: usize = NB_WORKERS_MAX;

/// `0` requests automatic job sizing from [`crate::mt::oneshot`]'s
/// partitioning formula; any other value is clamped into
/// `[JOBSIZE_MIN, JOBSIZE_MAX]`.
pub const JOBSIZE_MIN: usize = 512 * KB;
pub const JOBSIZE_MAX: usize = 1024 * MB;

/// Default overlap window, expressed as `overlap_size = src_window >> (9 -
/// overlap_log)` per spec §4.1's overlap-sizing formula.
pub const OVERLAPLOG_DEFAULT: u32 = 6;
pub const OVERLAPLOG_MAX: u32 = 9;

/// User-tunable parameters for [`crate::mt::MtContext`].
///
/// Binds spec §6.1's abstract parameter set onto this crate's existing
/// `Preferences` type (see `SPEC_FULL.md`'s Configuration module).
#[derive(Debug, Clone, Copy)]
pub struct MtParams {
    /// Worker thread count. `0` resolves to [`default_nb_workers`] at
    /// [`crate::mt::MtContext::create`] time.
    pub nb_threads: usize,
    /// Target job (segment) size in bytes; `0` = auto-computed per spec §4.1.
    pub job_size: usize,
    /// `overlapLog`: `0..=9`, clamped. `9` requests the full window as
    /// overlap; `0` disables overlap carry-over entirely.
    pub overlap_log: u32,
    /// LZ4 frame preferences applied to every job's collaborator call.
    pub prefs: Preferences,
}

impl Default for MtParams {
    fn default() -> Self {
        MtParams {
            nb_threads: 0,
            job_size: 0,
            overlap_log: OVERLAPLOG_DEFAULT,
            prefs: Preferences::default(),
        }
    }
}

/// `overlap_size = job_size >> (OVERLAPLOG_MAX - overlap_log)`; `0` disables
/// overlap carry-over entirely regardless of `job_size`. Shared by
/// `mt::oneshot` and `mt::streaming` so both partitioning strategies agree
/// on the same overlap window for a given `(job_size, overlap_log)` pair.
pub fn overlap_size(job_size: usize, overlap_log: u32) -> usize {
    if overlap_log == 0 {
        return 0;
    }
    let shift = OVERLAPLOG_MAX - overlap_log.min(OVERLAPLOG_MAX);
    (job_size >> shift).min(job_size)
}

impl MtParams {
    /// Clamp every field into its valid range, resolving `nb_threads == 0`
    /// to the platform default. Called once by `MtContext::create`/
    /// `set_mt_param`, mirroring spec §6.1's "parameters are validated and
    /// clamped at the point they take effect" invariant.
    pub fn normalize(&mut self) {
        if self.nb_threads == 0 {
            self.nb_threads = default_nb_workers().max(1) as usize;
        }
        self.nb_threads = self.nb_threads.clamp(1, NB_THREADS_MAX);
        if self.job_size != 0 {
            self.job_size = self.job_size.clamp(JOBSIZE_MIN, JOBSIZE_MAX);
        }
        self.overlap_log = self.overlap_log.min(OVERLAPLOG_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_zero_threads() {
        let mut p = MtParams::default();
        p.normalize();
        assert!(p.nb_threads >= 1);
    }

    #[test]
    fn normalize_clamps_thread_count() {
        let mut p = MtParams { nb_threads: 10_000, ..Default::default() };
        p.normalize();
        assert_eq!(p.nb_threads, NB_THREADS_MAX);
    }

    #[test]
    fn normalize_clamps_job_size() {
        let mut p = MtParams { job_size: 1, ..Default::default() };
        p.normalize();
        assert_eq!(p.job_size, JOBSIZE_MIN);

        let mut p2 = MtParams { job_size: usize::MAX, ..Default::default() };
        p2.normalize();
        assert_eq!(p2.job_size, JOBSIZE_MAX);
    }

    #[test]
    fn normalize_leaves_auto_job_size_alone() {
        let mut p = MtParams::default();
        p.normalize();
        assert_eq!(p.job_size, 0);
    }

    #[test]
    fn normalize_clamps_overlap_log() {
        let mut p = MtParams { overlap_log: 99, ..Default::default() };
        p.normalize();
        assert_eq!(p.overlap_log, OVERLAPLOG_MAX);
    }

    #[test]
    fn overlap_size_zero_log_disables_overlap() {
        assert_eq!(overlap_size(4 * MB, 0), 0);
    }

    #[test]
    fn overlap_size_max_log_uses_the_whole_job() {
        assert_eq!(overlap_size(4 * MB, OVERLAPLOG_MAX), 4 * MB);
    }

    #[test]
    fn overlap_size_never_exceeds_job_size() {
        assert!(overlap_size(1024, 99) <= 1024);
    }
}
