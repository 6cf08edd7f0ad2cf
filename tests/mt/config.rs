// Black-box integration tests for `lz4::mt::config` — parameter normalization
// and the overlap-sizing formula, exercised via the public `mt::config` path.

use lz4::mt::config::{overlap_size, MtParams, JOBSIZE_MAX, JOBSIZE_MIN, NB_THREADS_MAX, OVERLAPLOG_MAX};

#[test]
fn default_params_normalize_to_at_least_one_thread() {
    let mut p = MtParams::default();
    p.normalize();
    assert!(p.nb_threads >= 1);
    assert_eq!(p.job_size, 0, "auto job size is left alone by normalize");
}

#[test]
fn thread_count_is_clamped_to_the_crate_wide_maximum() {
    let mut p = MtParams { nb_threads: usize::MAX, ..MtParams::default() };
    p.normalize();
    assert_eq!(p.nb_threads, NB_THREADS_MAX);
}

#[test]
fn job_size_is_clamped_into_its_valid_range() {
    let mut too_small = MtParams { job_size: 1, ..MtParams::default() };
    too_small.normalize();
    assert_eq!(too_small.job_size, JOBSIZE_MIN);

    let mut too_big = MtParams { job_size: usize::MAX, ..MtParams::default() };
    too_big.normalize();
    assert_eq!(too_big.job_size, JOBSIZE_MAX);
}

#[test]
fn overlap_log_zero_disables_overlap_regardless_of_job_size() {
    assert_eq!(overlap_size(4 * 1024 * 1024, 0), 0);
    assert_eq!(overlap_size(1, 0), 0);
}

#[test]
fn overlap_log_at_max_uses_the_entire_job_as_overlap() {
    assert_eq!(overlap_size(1024 * 1024, OVERLAPLOG_MAX), 1024 * 1024);
}

#[test]
fn overlap_size_is_never_larger_than_the_job_itself() {
    for job_size in [0usize, 1, 512, 4096, 1024 * 1024] {
        for log in 0..=12u32 {
            assert!(overlap_size(job_size, log) <= job_size);
        }
    }
}
