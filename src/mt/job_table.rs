//! Ring-buffered job table: the shared coordination core between the
//! dispatching thread and the worker pool.
//!
//! A job's lifecycle is `begin_job` (reserves a ring slot and a monotonic
//! id) → dispatched to a worker → zero or more `push_chunk` calls as the
//! worker's block loop (`worker::compress_segment`) produces output, each
//! advancing the slot's `c_size`/`consumed` under the table's one mutex and
//! signalling the condvar → `complete_job`/`fail_job` once the whole segment
//! is done → drained (`try_drain`/`blocking_drain`) in job-id order. Progress
//! is tracked at block granularity, not job granularity: a slot's `c_size`
//! grows with every `push_chunk`, so a concurrent drainer can observe (and
//! copy out) a job's output while it is still being produced, matching the
//! "wait on the condvar while `dst_flushed == c_size ∧ ¬job_completed`"
//! drain discipline.

use std::sync::{Condvar, Mutex};

use crate::mt::error::MtError;

/// One ring slot's worth of job state.
struct JobSlot {
    src_size: usize,
    /// Total bytes produced so far (`dst.len()`).
    c_size: usize,
    /// Source bytes consumed so far, as reported by the worker's block loop.
    consumed: usize,
    completed: bool,
    error: Option<MtError>,
    dst: Vec<u8>,
    /// How much of `dst` has already been copied out by a drain call.
    drained: usize,
}

impl JobSlot {
    fn pending(src_size: usize) -> Self {
        JobSlot { src_size, c_size: 0, consumed: 0, completed: false, error: None, dst: Vec::new(), drained: 0 }
    }
}

/// A snapshot of in-flight progress, mirroring the shape of a
/// `get_frame_progression` query.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameProgression {
    pub consumed: usize,
    /// Cumulative bytes of every job ever drained successfully, across the
    /// whole frame. Unlike `consumed` (which only sums currently in-flight
    /// slots and shrinks as jobs drain), this never decreases — the
    /// monotonic "consumed" half of `MtContext::get_frame_progression`'s
    /// `(consumed, ingested, produced)` tuple.
    pub consumed_total: usize,
    pub produced: usize,
    pub flushed: usize,
    pub nb_active_jobs: usize,
}

/// Outcome of a single [`JobTable::try_drain`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// No new output is available yet and the job hasn't failed or finished.
    NotReady,
    /// `n` bytes were copied into the caller's buffer; more may follow once
    /// the job produces (or finishes producing) further output.
    Partial(usize),
    /// `n` bytes were copied and this was the job's last output — the slot
    /// has been removed from the ring and its id can never be drained again.
    Done(usize),
}

struct Inner {
    ring: Vec<Option<JobSlot>>,
    mask: usize,
    next_job_id: u64,
    flushed_size: usize,
    consumed_total: usize,
}

/// The shared `Mutex`+`Condvar` coordination core. One instance per
/// `MtContext`, reset between frames.
pub struct JobTable {
    inner: Mutex<Inner>,
    cvar: Condvar,
}

impl JobTable {
    /// `capacity_hint` is typically `2 * nb_threads` or so; rounded up to the
    /// next power of two so slot lookup is a mask instead of a modulo.
    pub fn new(capacity_hint: usize) -> Self {
        let cap = capacity_hint.max(2).next_power_of_two();
        let mut ring = Vec::with_capacity(cap);
        ring.resize_with(cap, || None);
        JobTable {
            inner: Mutex::new(Inner { ring, mask: cap - 1, next_job_id: 0, flushed_size: 0, consumed_total: 0 }),
            cvar: Condvar::new(),
        }
    }

    /// Reserves the next job id and ring slot, or refuses (returns `None`)
    /// if the ring is full — spec §4.6: "Refuses (returns 0) if the ring is
    /// full (`next_job_id − done_job_id == |table|`)". A slot is occupied
    /// from `begin_job` until it has been fully drained via
    /// [`JobTable::try_drain`]/[`JobTable::blocking_drain`]; refusing here
    /// instead of overwriting it is what keeps a still-undrained job's
    /// output from being silently clobbered. Callers that get `None` back
    /// must park the segment they meant to dispatch and retry later, the
    /// same way `mt::streaming`'s pool-submission mailbox parks a job the
    /// worker pool couldn't accept immediately.
    pub fn begin_job(&self, src_size: usize) -> Option<u64> {
        let mut inner = self.inner.lock().unwrap();
        let mask = inner.mask;
        let id = inner.next_job_id;
        let idx = (id as usize) & mask;
        if inner.ring[idx].is_some() {
            return None;
        }
        inner.next_job_id += 1;
        inner.ring[idx] = Some(JobSlot::pending(src_size));
        Some(id)
    }

    /// Appends one block's worth of compressed output to `job_id`'s slot and
    /// records the worker's cumulative consumed-source count, then wakes any
    /// thread waiting on this job. Called once per block from the worker's
    /// block loop (see `worker::compress_segment`), not once per job.
    pub fn push_chunk(&self, job_id: u64, chunk: &[u8], consumed: usize) {
        let mut inner = self.inner.lock().unwrap();
        let mask = inner.mask;
        if let Some(slot) = inner.ring[(job_id as usize) & mask].as_mut() {
            slot.dst.extend_from_slice(chunk);
            slot.c_size = slot.dst.len();
            slot.consumed = consumed;
        }
        self.cvar.notify_all();
    }

    /// Marks `job_id` as finished: every byte it will ever produce has
    /// already been handed to [`JobTable::push_chunk`].
    pub fn complete_job(&self, job_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        let mask = inner.mask;
        if let Some(slot) = inner.ring[(job_id as usize) & mask].as_mut() {
            slot.completed = true;
        }
        self.cvar.notify_all();
    }

    pub fn fail_job(&self, job_id: u64, err: MtError) {
        let mut inner = self.inner.lock().unwrap();
        let mask = inner.mask;
        if let Some(slot) = inner.ring[(job_id as usize) & mask].as_mut() {
            slot.error = Some(err);
            slot.completed = true;
        }
        self.cvar.notify_all();
    }

    /// Copies as much of `job_id`'s undrained output as fits in `out`,
    /// without blocking. Returns `Ok(Drained::NotReady)` if the job hasn't
    /// produced anything new and hasn't finished; `Ok(Drained::Partial(n))`
    /// if `n` bytes were copied but more may follow; `Ok(Drained::Done(n))`
    /// once the job is fully drained (its slot is then freed for reuse).
    /// Returns `Err` once, the first time the job's failure is observed,
    /// after which the slot is gone and further calls return `NotReady`.
    pub fn try_drain(&self, job_id: u64, out: &mut [u8]) -> Result<Drained, MtError> {
        let mut inner = self.inner.lock().unwrap();
        self.drain_locked(&mut inner, job_id, out)
    }

    /// Blocks until `job_id` has new output or has finished/failed, then
    /// behaves like [`JobTable::try_drain`]. Used where the caller has
    /// nothing better to do than wait for this specific job (draining the
    /// tail of a frame in `end_stream`).
    pub fn blocking_drain(&self, job_id: u64, out: &mut [u8]) -> Result<Drained, MtError> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            let mask = inner.mask;
            let idx = (job_id as usize) & mask;
            let has_progress = inner.ring[idx]
                .as_ref()
                .map(|s| s.c_size > s.drained || s.completed)
                .unwrap_or(true); // slot already gone: let drain_locked report NotReady/removed
            if has_progress {
                return self.drain_locked(&mut inner, job_id, out);
            }
            inner = self.cvar.wait(inner).unwrap();
        }
    }

    fn drain_locked(&self, inner: &mut Inner, job_id: u64, out: &mut [u8]) -> Result<Drained, MtError> {
        let mask = inner.mask;
        let idx = (job_id as usize) & mask;
        let slot = match inner.ring[idx].as_mut() {
            Some(s) => s,
            None => return Ok(Drained::NotReady),
        };

        if let Some(e) = slot.error.clone() {
            inner.ring[idx] = None;
            return Err(e);
        }

        let avail = slot.c_size - slot.drained;
        if avail == 0 && !slot.completed {
            return Ok(Drained::NotReady);
        }

        let take = avail.min(out.len());
        out[..take].copy_from_slice(&slot.dst[slot.drained..slot.drained + take]);
        slot.drained += take;

        if slot.completed && slot.drained == slot.c_size {
            inner.flushed_size += slot.c_size;
            inner.consumed_total += slot.src_size;
            inner.ring[idx] = None;
            Ok(Drained::Done(take))
        } else {
            Ok(Drained::Partial(take))
        }
    }

    pub fn progression(&self) -> FrameProgression {
        let inner = self.inner.lock().unwrap();
        let active: Vec<&JobSlot> = inner.ring.iter().flatten().collect();
        let consumed: usize =
            active.iter().map(|s| if s.completed { s.src_size } else { s.consumed }).sum::<usize>();
        let produced: usize = active.iter().map(|s| s.c_size).sum::<usize>() + inner.flushed_size;
        FrameProgression {
            consumed,
            consumed_total: inner.consumed_total,
            produced,
            flushed: inner.flushed_size,
            nb_active_jobs: active.len(),
        }
    }

    /// Clears all ring state for reuse on the next frame. The caller must
    /// ensure every dispatched job has already been drained via
    /// [`JobTable::try_drain`]/[`JobTable::blocking_drain`] before calling
    /// this.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        for slot in inner.ring.iter_mut() {
            *slot = None;
        }
        inner.next_job_id = 0;
        inner.flushed_size = 0;
        inner.consumed_total = 0;
    }
}
