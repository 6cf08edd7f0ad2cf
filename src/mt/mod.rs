//! Multi-threaded LZ4 frame compression driver.
//!
//! Parallelizes `frame::compress` across a fixed pool of worker threads by
//! partitioning the input into overlapping segments ("jobs"), compressing
//! them concurrently, and reassembling their outputs into a single valid
//! LZ4 frame. See `SPEC_FULL.md` for the full design; in short:
//!
//! - [`buffer_pool`] / [`context_pool`]: bounded recyclable-resource pools
//!   shared by the driver and every worker.
//! - [`job_table`]: the ring of in-flight job descriptors plus the single
//!   mutex/condvar coordination core.
//! - [`worker`]: the per-job compression routine run on a worker thread.
//! - [`oneshot`]: the blocking, whole-buffer entry point.
//! - [`streaming`]: the non-blocking, incremental entry point.
//! - [`config`]: the tunable parameter surface (`MtParams`).
//! - [`error`]: `MtError`/`MtResult`.
//!
//! [`MtContext`] is the facade that binds all of the above into the
//! abstract API surface this module's spec calls out: one-shot
//! (`compress_cctx`/`compress_advanced`), streaming
//! (`init_c_stream`/`compress_stream`/`flush_stream`/`end_stream`), and
//! introspection (`size_of`/`get_frame_progression`).

pub mod buffer_pool;
pub mod config;
pub mod context_pool;
pub mod error;
pub mod job_table;
pub mod oneshot;
pub mod streaming;
pub mod worker;

use std::sync::Arc;

use crate::frame::cdict::Lz4FCDict;
use crate::frame::types::Preferences;
use crate::threadpool::TPool;

pub use config::MtParams;
pub use error::{MtError, MtResult};
pub use job_table::FrameProgression;
pub use streaming::StreamDriver;

use buffer_pool::BufferPool;
use context_pool::ContextPool;
use job_table::JobTable;

/// Resolves the spec §4.1/§6.1 "job_size == 0 means auto" rule against a
/// concrete source size, mirroring `mt::oneshot::plan_jobs`'s auto-sizing
/// branch but exposed here for the streaming driver, which must fix its
/// segment size once per frame rather than per `compress_stream` call.
fn resolved_job_size(params: &MtParams, hint_len: usize) -> usize {
    if params.job_size != 0 {
        return params.job_size;
    }
    use config::{JOBSIZE_MAX, JOBSIZE_MIN};
    let avg = (hint_len / params.nb_threads.max(1)).max(1);
    avg.clamp(JOBSIZE_MIN, JOBSIZE_MAX)
}

/// Facade binding spec §6.2's abstract API surface onto this crate's
/// concrete pools, job table, worker-pool, and LZ4 frame collaborator.
///
/// One `MtContext` owns one worker pool and one pair of resource pools,
/// shared across every frame compressed through it (one-shot or streaming,
/// sequentially — the pools and job table are reset between frames, not
/// duplicated). `nb_threads` is fixed at [`MtContext::create`] time; the
/// spec's Non-goals explicitly exclude resizing the pool afterward.
pub struct MtContext {
    params: MtParams,
    ctx_pool: Arc<ContextPool>,
    buffer_pool: Arc<BufferPool>,
    pool: Arc<TPool>,
    job_table: Arc<JobTable>,
    stream: Option<StreamDriver>,
}

impl MtContext {
    /// Spec's `create(W, allocator)`. `allocator` has no counterpart here:
    /// this crate's pools always use the global Rust allocator (spec §1
    /// lists "memory allocator customization" as an external collaborator
    /// concern, out of scope for this driver).
    pub fn create(mut params: MtParams) -> MtResult<Self> {
        params.normalize();
        let nb_threads = params.nb_threads;
        let pool = TPool::new(nb_threads, 2 * nb_threads).ok_or(MtError::MemoryAllocation)?;
        Ok(MtContext {
            ctx_pool: Arc::new(ContextPool::new(nb_threads)),
            buffer_pool: Arc::new(BufferPool::new(nb_threads)),
            pool: Arc::new(pool),
            job_table: Arc::new(JobTable::new(4 * nb_threads)),
            params,
            stream: None,
        })
    }

    /// Convenience constructor for the common case of just picking a
    /// thread count and taking every other default.
    pub fn new(nb_threads: usize) -> MtResult<Self> {
        Self::create(MtParams { nb_threads, ..MtParams::default() })
    }

    /// Spec's `size_of(ctx)`: sums pool sizes (plus the staging buffers of
    /// an active stream, if any).
    pub fn size_of(&self) -> usize {
        self.ctx_pool.size_of() + self.buffer_pool.size_of() + self.stream.as_ref().map_or(0, StreamDriver::size_of)
    }

    pub fn get_nb_threads(&self) -> usize {
        self.params.nb_threads
    }

    /// `nb_threads` cannot change after [`MtContext::create`] (spec
    /// Non-goals: "dynamic resizing of the worker pool"); every other
    /// `MtParams` field may be updated between frames.
    pub fn set_mt_param(&mut self, job_size: usize, overlap_log: u32, prefs: Preferences) -> MtResult<()> {
        self.params.job_size = job_size;
        self.params.overlap_log = overlap_log;
        self.params.prefs = prefs;
        self.params.normalize();
        Ok(())
    }

    // ── One-shot (blocking) ────────────────────────────────────────────

    /// Spec's `compress_cctx(dst, src, level)`: one-shot compression using
    /// this context's stored preferences, overridden with `level`.
    pub fn compress_cctx(&self, dst: &mut [u8], src: &[u8], level: i32) -> MtResult<usize> {
        let prefs = Preferences { compression_level: level, ..self.params.prefs };
        self.compress_advanced(dst, src, None, &prefs, self.params.overlap_log)
    }

    /// Spec's `compress_advanced(dst, src, cdict, params, overlap_log)`.
    pub fn compress_advanced(
        &self,
        dst: &mut [u8],
        src: &[u8],
        cdict: Option<&Lz4FCDict>,
        prefs: &Preferences,
        overlap_log: u32,
    ) -> MtResult<usize> {
        oneshot::compress(
            dst,
            src,
            prefs,
            cdict,
            self.params.nb_threads,
            self.params.job_size,
            overlap_log,
            &self.ctx_pool,
            &self.buffer_pool,
            &self.pool,
        )
    }

    // ── Streaming (non-blocking) ───────────────────────────────────────

    /// Spec's `init_c_stream_*`: begins a new frame with no dictionary.
    pub fn init_c_stream(&mut self, prefs: Preferences) -> MtResult<()> {
        self.reset_c_stream(prefs, None)
    }

    /// Begins a new frame seeded with a pre-digested dictionary.
    pub fn init_c_stream_using_cdict(&mut self, prefs: Preferences, cdict: Arc<Lz4FCDict>) -> MtResult<()> {
        self.reset_c_stream(prefs, Some(cdict))
    }

    /// Spec's `reset_c_stream(pledged)`. `pledged` is carried inside
    /// `prefs.frame_info.content_size` (this crate's binding of the
    /// abstract "pledged size" parameter, see `SPEC_FULL.md`).
    ///
    /// Per spec §7: re-initializing while a previous frame has not fully
    /// drained forces a synchronous wait-and-release first.
    pub fn reset_c_stream(&mut self, prefs: Preferences, cdict: Option<Arc<Lz4FCDict>>) -> MtResult<()> {
        if let Some(mut old) = self.stream.take() {
            if !old.is_finished() {
                quiesce(&mut old)?;
            }
        }
        let job_size = resolved_job_size(&self.params, self.params.job_size.max(config::JOBSIZE_MIN));
        self.buffer_pool.set_target_size(worker::job_dst_bound(job_size, &prefs));
        self.params.prefs = prefs;
        self.stream = Some(StreamDriver::new(
            prefs,
            cdict,
            job_size,
            self.params.overlap_log,
            Arc::clone(&self.ctx_pool),
            Arc::clone(&self.pool),
            Arc::clone(&self.job_table),
        ));
        Ok(())
    }

    /// Spec's `compress_stream(output, input)`.
    pub fn compress_stream(&mut self, dst: &mut [u8], src: &[u8]) -> MtResult<usize> {
        self.stream_mut()?.compress_stream(dst, src)
    }

    /// Spec's `flush_stream(output)`.
    pub fn flush_stream(&mut self, dst: &mut [u8]) -> MtResult<usize> {
        self.stream_mut()?.flush_stream(dst)
    }

    /// Spec's `end_stream(output)`.
    pub fn end_stream(&mut self, dst: &mut [u8]) -> MtResult<usize> {
        self.stream_mut()?.end_stream(dst)
    }

    /// Spec's `get_frame_progression(ctx) -> (consumed, ingested, produced)`.
    pub fn get_frame_progression(&self) -> (usize, usize, usize) {
        match &self.stream {
            Some(s) => {
                let p = s.get_frame_progression();
                (p.consumed_total, s.bytes_fed(), p.produced)
            }
            None => (0, 0, 0),
        }
    }

    fn stream_mut(&mut self) -> MtResult<&mut StreamDriver> {
        self.stream.as_mut().ok_or(MtError::StageWrong)
    }
}

/// Forces a still-active stream to its end, discarding the output, so a
/// new frame can safely reuse the shared pools/job table. The scratch
/// buffer is sized generously (every in-flight job's worst-case bound,
/// plus the not-yet-dispatched staged segment and the trailing checksum)
/// since `end_stream` only gets one call before the driver is unusable.
fn quiesce(old: &mut StreamDriver) -> MtResult<()> {
    let bound = old.pending_output_bound();
    let mut scratch = vec![0u8; bound];
    old.end_stream(&mut scratch)?;
    Ok(())
}
