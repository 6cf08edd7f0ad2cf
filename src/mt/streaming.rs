//! Streaming (incremental) multi-threaded compression.
//!
//! Unlike `mt::oneshot`, which knows every segment up front and can borrow
//! destination sub-slices via a scoped fan-out, the streaming driver learns
//! its input a chunk at a time: `compress_stream` accumulates bytes into a
//! job-sized staging buffer and dispatches a job as soon as it fills,
//! without waiting for a frame boundary. Dispatched jobs must outlive the
//! `compress_stream` call that creates them, so every job owns its segment
//! bytes outright rather than borrowing the caller's buffers; its
//! destination bytes live in the shared job table, grown block by block as
//! the worker produces them (see `mt::job_table`'s module docs). Dispatch
//! goes through `threadpool::TPool`'s `'static`-closure
//! `submit_job`/`try_submit_job` instead of a scoped fan-out.
//!
//! # The job_ready mailbox
//!
//! `try_submit_job` is attempted first; when the pool's slot semaphore is
//! saturated the job is parked in a one-slot mailbox instead of blocking
//! the caller immediately. The mailbox is retried opportunistically on
//! every subsequent call. If a second job would need to occupy an
//! already-full mailbox, the driver blocks just long enough to force the
//! stale mailboxed job through the pool's blocking `submit_job`, preserving
//! the "at most one job waits outside the pool" invariant while still
//! making forward progress.
//!
//! # Ring backpressure
//!
//! Dispatch needs a ring slot (`JobTable::begin_job`) before it ever needs a
//! worker, and `begin_job` refuses once every slot belongs to a job that
//! hasn't fully drained yet. A full `staged` segment that gets refused stays
//! parked in place rather than overwriting an undrained slot; any further
//! input that arrives before a slot frees up is held in `pending_input`
//! instead, so `compress_stream` keeps consuming everything it's handed
//! without ever blocking the caller. `drain_parked_input` retries the
//! parked segment — and folds `pending_input` back into `staged` once it
//! goes through — opportunistically, the same places the pool mailbox is
//! retried. `end_stream` is the one caller that cannot simply park and
//! return: it blocks on the oldest undrained job (`force_ring_slot`) to
//! force a slot free whenever it finds the ring still saturated.
//!
//! # Draining mid-job
//!
//! `drain_ready` pulls from the job table's [`Drained`] API rather than
//! waiting for a whole job to finish: a job still being produced can hand
//! over whatever it's written so far, which is what lets `compress_stream`
//! keep `dst` usage bounded even when one job is much larger than the
//! caller's destination buffer and is still only partway compressed.
//!
//! # Checksum
//!
//! A driver-owned `Xxh32State` is fed every byte handed to `compress_stream`
//! regardless of job boundaries. If more than one job was dispatched by the
//! time `end_stream` runs, its digest is appended as the frame's content
//! checksum (see `mt::worker`'s module docs for why this is safe); a
//! single-job frame instead carries a checksum its own collaborator session
//! already appended.

use std::sync::{Arc, Mutex};

use crate::frame::cdict::Lz4FCDict;
use crate::frame::types::{ContentChecksum, Preferences};
use crate::mt::context_pool::ContextPool;
use crate::mt::error::{MtError, MtResult};
use crate::mt::job_table::{Drained, FrameProgression, JobTable};
use crate::mt::worker::{compress_segment, job_dst_bound};
use crate::threadpool::TPool;
use crate::xxhash::Xxh32State;

type JobFn = Box<dyn FnOnce() + Send + 'static>;

pub struct StreamDriver {
    ctx_pool: Arc<ContextPool>,
    pool: Arc<TPool>,
    job_table: Arc<JobTable>,

    header_prefs: Preferences,
    cdict: Option<Arc<Lz4FCDict>>,
    job_size: usize,
    overlap: usize,

    staged: Vec<u8>,
    /// Raw bytes already accepted from the caller (charged to `xxh`/
    /// `bytes_fed`) but not yet folded into `staged`, because `staged` was
    /// already a full `job_size` segment that couldn't get a ring slot.
    /// Non-empty only while `staged.len() == job_size`.
    pending_input: Vec<u8>,
    prev_tail: Vec<u8>,
    job_count: u64,
    next_drain_id: u64,
    xxh: Xxh32State,
    mailbox: Mutex<Option<JobFn>>,
    ended: bool,
    bytes_fed: usize,
}

impl StreamDriver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        header_prefs: Preferences,
        cdict: Option<Arc<Lz4FCDict>>,
        job_size: usize,
        overlap_log: u32,
        ctx_pool: Arc<ContextPool>,
        pool: Arc<TPool>,
        job_table: Arc<JobTable>,
    ) -> Self {
        let overlap = crate::mt::config::overlap_size(job_size, overlap_log);
        job_table.reset();
        StreamDriver {
            ctx_pool,
            pool,
            job_table,
            header_prefs,
            cdict,
            job_size: job_size.max(1),
            overlap,
            staged: Vec::new(),
            pending_input: Vec::new(),
            prev_tail: Vec::new(),
            job_count: 0,
            next_drain_id: 0,
            xxh: Xxh32State::new(0),
            mailbox: Mutex::new(None),
            ended: false,
            bytes_fed: 0,
        }
    }

    /// Stages `src` into job-sized segments, dispatching each as it fills,
    /// and opportunistically drains completed jobs' output into `dst` in
    /// order. Returns the number of bytes written to `dst`.
    pub fn compress_stream(&mut self, dst: &mut [u8], src: &[u8]) -> MtResult<usize> {
        if self.ended {
            return Err(MtError::StageWrong);
        }
        self.drain_parked_input();
        self.retry_mailbox();
        let mut written = self.drain_ready(dst)?;

        let mut remaining = src;
        while !remaining.is_empty() {
            let space = self.job_size - self.staged.len();
            if space == 0 {
                // `staged` is a full segment still waiting on a ring slot —
                // hold the rest of this call's input rather than block or
                // drop it; `drain_parked_input` folds it back in once a
                // slot frees.
                self.xxh.update(remaining);
                self.bytes_fed += remaining.len();
                self.pending_input.extend_from_slice(remaining);
                break;
            }
            let take = space.min(remaining.len());
            self.staged.extend_from_slice(&remaining[..take]);
            self.xxh.update(&remaining[..take]);
            self.bytes_fed += take;
            remaining = &remaining[take..];

            if self.staged.len() == self.job_size && self.dispatch_staged(false) {
                self.retry_mailbox();
                written += self.drain_ready(&mut dst[written..])?;
            }
        }

        Ok(written)
    }

    /// Best-effort flush: retries the ring-capacity park and the pool
    /// mailbox, and drains whatever output is already in order and ready,
    /// without forcing any in-progress job to completion early.
    pub fn flush_stream(&mut self, dst: &mut [u8]) -> MtResult<usize> {
        if self.ended {
            return Err(MtError::StageWrong);
        }
        self.drain_parked_input();
        self.retry_mailbox();
        self.drain_ready(dst)
    }

    /// Dispatches the final (possibly empty) job, blocks until every
    /// dispatched job has finished, and drains all remaining output —
    /// appending the driver-owned content checksum if the frame spanned
    /// more than one job. The stream cannot be used again afterwards.
    pub fn end_stream(&mut self, dst: &mut [u8]) -> MtResult<usize> {
        if self.ended {
            return Err(MtError::StageWrong);
        }
        self.ended = true;
        let mut written = 0usize;

        // Unlike `compress_stream`/`flush_stream`, which park and return on
        // a saturated ring, `end_stream` must fully resolve every byte it
        // was ever handed. A still-full `staged` (or non-empty
        // `pending_input`) means a prior call parked here; force the ring
        // to free a slot by blocking on the oldest undrained job.
        loop {
            self.drain_parked_input();
            if self.staged.len() < self.job_size {
                break;
            }
            self.force_ring_slot(dst, &mut written)?;
        }

        while !self.dispatch_staged(true) {
            self.force_ring_slot(dst, &mut written)?;
        }

        {
            let mut mailbox = self.mailbox.lock().unwrap();
            if let Some(stale) = mailbox.take() {
                self.pool.submit_job(stale);
            }
        }
        self.pool.jobs_completed();

        written += self.drain_ready(&mut dst[written..])?;
        while self.job_table.progression().nb_active_jobs > 0 {
            if written >= dst.len() {
                return Err(MtError::DstSizeTooSmall);
            }
            let n = self.drain_ready(&mut dst[written..])?;
            if n == 0 {
                return Err(MtError::DstSizeTooSmall);
            }
            written += n;
        }

        if self.job_count > 1 && self.header_prefs.frame_info.content_checksum_flag == ContentChecksum::Enabled {
            if written + 4 > dst.len() {
                return Err(MtError::DstSizeTooSmall);
            }
            let checksum = self.xxh.digest();
            dst[written..written + 4].copy_from_slice(&checksum.to_le_bytes());
            written += 4;
        }

        Ok(written)
    }

    pub fn get_frame_progression(&self) -> FrameProgression {
        self.job_table.progression()
    }

    /// Cumulative bytes handed to [`StreamDriver::compress_stream`] so far,
    /// the "ingested" half of `MtContext::get_frame_progression`'s tuple.
    pub fn bytes_fed(&self) -> usize {
        self.bytes_fed
    }

    /// `true` once [`StreamDriver::end_stream`] has run and every dispatched
    /// job has drained — i.e. the frame is fully closed and the driver's
    /// shared pools/job table are safe to reuse for the next one.
    pub fn is_finished(&self) -> bool {
        self.ended && self.job_table.progression().nb_active_jobs == 0
    }

    /// Worst-case number of bytes a single [`StreamDriver::end_stream`] call
    /// could still need to write: every job not yet drained, plus whatever
    /// is staged or parked but not yet dispatched, plus the trailing
    /// checksum. `MtContext::reset_c_stream` uses this to force-quiesce an
    /// unfinished stream in exactly one `end_stream` call, since a second
    /// call would only ever return `StageWrong`.
    pub fn pending_output_bound(&self) -> usize {
        let active = self.job_table.progression().nb_active_jobs;
        let per_job = job_dst_bound(self.job_size, &self.header_prefs);
        let parked = job_dst_bound(self.staged.len() + self.pending_input.len(), &self.header_prefs);
        per_job * active + parked + 4
    }

    pub fn size_of(&self) -> usize {
        self.staged.capacity() + self.pending_input.capacity() + self.prev_tail.capacity()
    }

    /// Attempts to dispatch a full `staged` segment (or, with `last_chunk`,
    /// whatever is left in it, possibly empty). Returns `false` without
    /// touching `staged` if the ring has no free slot — the caller is
    /// expected to park and retry, exactly as `submit_or_mailbox` already
    /// does when the worker pool itself is saturated.
    fn dispatch_staged(&mut self, last_chunk: bool) -> bool {
        let job_id = match self.job_table.begin_job(self.staged.len()) {
            Some(id) => id,
            None => return false,
        };

        let first_chunk = self.job_count == 0;
        let seg = std::mem::take(&mut self.staged);

        let prefix = if first_chunk || self.overlap == 0 { None } else { Some(self.prev_tail.clone()) };

        if self.overlap > 0 {
            let tail_len = self.overlap.min(seg.len());
            self.prev_tail = seg[seg.len() - tail_len..].to_vec();
        }

        self.job_count += 1;

        let ctx_pool = Arc::clone(&self.ctx_pool);
        let job_table = Arc::clone(&self.job_table);
        let header_prefs = self.header_prefs;
        let cdict = self.cdict.clone();

        let run: JobFn = Box::new(move || {
            let mut ctx = ctx_pool.acquire();
            let cdict_ptr = cdict.as_ref().map(|a| Arc::as_ptr(a));
            let result = compress_segment(
                &mut ctx,
                &seg,
                prefix.as_deref(),
                &header_prefs,
                cdict_ptr,
                first_chunk,
                last_chunk,
                |chunk, consumed| job_table.push_chunk(job_id, chunk, consumed),
            );
            ctx_pool.release(ctx);
            match result {
                Ok(_) => job_table.complete_job(job_id),
                Err(e) => job_table.fail_job(job_id, e),
            }
        });

        self.submit_or_mailbox(run);
        true
    }

    /// Non-blocking: tries to dispatch a full `staged` segment that was
    /// previously parked by a saturated ring, then folds `pending_input`
    /// back into `staged` as room allows, dispatching again whenever it
    /// refills. Stops the moment `staged` isn't full (nothing left parked)
    /// or the ring is still refusing.
    fn drain_parked_input(&mut self) {
        loop {
            if self.staged.len() == self.job_size && !self.dispatch_staged(false) {
                return;
            }
            if self.pending_input.is_empty() {
                return;
            }
            let space = self.job_size - self.staged.len();
            let take = space.min(self.pending_input.len());
            let tail: Vec<u8> = self.pending_input.drain(..take).collect();
            self.staged.extend_from_slice(&tail);
        }
    }

    /// Blocks on the oldest undrained job until it finishes, folding its
    /// output into `dst[*written..]` as it goes, so that its ring slot is
    /// freed for reuse. Only called from `end_stream`, which must make
    /// forward progress unconditionally rather than park and return.
    fn force_ring_slot(&mut self, dst: &mut [u8], written: &mut usize) -> MtResult<()> {
        loop {
            if *written >= dst.len() {
                return Err(MtError::DstSizeTooSmall);
            }
            match self.job_table.blocking_drain(self.next_drain_id, &mut dst[*written..])? {
                Drained::Done(n) => {
                    *written += n;
                    self.next_drain_id += 1;
                    return Ok(());
                }
                Drained::Partial(n) => {
                    *written += n;
                    if n == 0 {
                        return Err(MtError::DstSizeTooSmall);
                    }
                }
                Drained::NotReady => {
                    // blocking_drain only returns once it has observed
                    // progress or completion; nothing to do but retry.
                }
            }
        }
    }

    fn submit_or_mailbox(&self, run: JobFn) {
        match self.pool.try_submit_job(run) {
            Ok(()) => {}
            Err(rejected) => {
                let mut mailbox = self.mailbox.lock().unwrap();
                if let Some(stale) = mailbox.take() {
                    self.pool.submit_job(stale);
                }
                *mailbox = Some(rejected);
            }
        }
    }

    fn retry_mailbox(&self) {
        let mut mailbox = self.mailbox.lock().unwrap();
        if let Some(pending) = mailbox.take() {
            match self.pool.try_submit_job(pending) {
                Ok(()) => {}
                Err(rejected) => *mailbox = Some(rejected),
            }
        }
    }

    /// Drains output in source order into `dst`, stopping as soon as `dst`
    /// is full or the next in-order job has nothing further ready. Unlike a
    /// whole-job drain, this can pull partial output out of a job that is
    /// still being produced — `next_drain_id` only advances past a job once
    /// it reports [`Drained::Done`]. Returns bytes written. Once a job
    /// fails, its id is already gone from the table, so every later call
    /// observes no further progress on this stream — the driver is expected
    /// to be reset/recreated after an error.
    fn drain_ready(&mut self, dst: &mut [u8]) -> MtResult<usize> {
        let mut written = 0usize;

        while written < dst.len() {
            match self.job_table.try_drain(self.next_drain_id, &mut dst[written..])? {
                Drained::NotReady => break,
                Drained::Partial(n) => {
                    written += n;
                    if n == 0 {
                        break;
                    }
                }
                Drained::Done(n) => {
                    written += n;
                    self.next_drain_id += 1;
                }
            }
        }

        Ok(written)
    }
}
