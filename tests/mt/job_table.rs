// Black-box integration tests for `lz4::mt::job_table::JobTable` — the ring
// buffer / condvar coordination core shared by every driver.

use lz4::mt::job_table::{Drained, JobTable};

#[test]
fn job_ids_assigned_in_strict_ascending_order() {
    let table = JobTable::new(8);
    let ids: Vec<u64> = (0..10).map(|_| table.begin_job(16).unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted, "job ids must be assigned in ascending order");
    assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn progression_consumed_total_is_monotonic_across_a_frames_whole_life() {
    let table = JobTable::new(4);
    let mut previous = 0usize;
    for i in 0..8u64 {
        let id = table.begin_job(100 + i as usize).unwrap();
        table.push_chunk(id, &[0u8; 10], 100 + i as usize);
        table.complete_job(id);
        let mut out = vec![0u8; 16];
        let _ = table.try_drain(id, &mut out).unwrap();
        let now = table.progression().consumed_total;
        assert!(now >= previous, "consumed_total must never decrease");
        previous = now;
    }
}

#[test]
fn a_failed_job_is_still_drainable_and_reports_its_error() {
    let table = JobTable::new(4);
    let id = table.begin_job(32).unwrap();
    table.fail_job(id, lz4::MtError::DictionaryWrong);
    let mut out = vec![0u8; 4];
    let err = table.try_drain(id, &mut out).unwrap_err();
    assert_eq!(err, lz4::MtError::DictionaryWrong);
}

#[test]
fn reset_brings_every_counter_back_to_its_initial_state() {
    let table = JobTable::new(4);
    for _ in 0..3 {
        let id = table.begin_job(64).unwrap();
        table.push_chunk(id, &[0u8; 8], 64);
        table.complete_job(id);
        let mut out = vec![0u8; 8];
        let _ = table.try_drain(id, &mut out).unwrap();
    }
    table.reset();

    let p = table.progression();
    assert_eq!(p.flushed, 0);
    assert_eq!(p.consumed_total, 0);
    assert_eq!(p.nb_active_jobs, 0);
    assert_eq!(table.begin_job(1), Some(0), "job ids restart from zero after reset");
}

#[test]
fn try_drain_never_blocks_on_a_pending_job() {
    let table = JobTable::new(4);
    let id = table.begin_job(16).unwrap();
    let mut out = vec![0u8; 16];
    assert_eq!(table.try_drain(id, &mut out).unwrap(), Drained::NotReady);
    table.push_chunk(id, &[1, 2, 3, 4], 16);
    table.complete_job(id);
    assert_eq!(table.try_drain(id, &mut out).unwrap(), Drained::Done(4));
}

#[test]
fn begin_job_refuses_once_the_ring_is_full() {
    let table = JobTable::new(2);
    let a = table.begin_job(8).unwrap();
    let _b = table.begin_job(8).unwrap();
    assert_eq!(table.begin_job(8), None, "ring has no free slot until a job drains");

    table.push_chunk(a, &[0u8; 8], 8);
    table.complete_job(a);
    let mut out = vec![0u8; 8];
    assert_eq!(table.try_drain(a, &mut out).unwrap(), Drained::Done(8));

    assert!(table.begin_job(8).is_some(), "draining a slot frees it for reuse");
}
