//! One-shot (blocking, whole-buffer) multi-threaded compression.
//!
//! Partitions `src` into a fixed number of contiguous segments ("jobs"),
//! compresses them concurrently via a scoped `rayon` fan-out, and
//! reassembles the result in `dst` in source order. Falls back to the
//! single-threaded collaborator entirely when there is nothing to
//! parallelize (`nb_threads <= 1` or the source fits in one job).

use std::sync::Mutex;

use crate::frame::cdict::Lz4FCDict;
use crate::frame::compress::lz4f_compress_frame_using_cdict;
use crate::frame::types::{ContentChecksum, Preferences};
use crate::mt::buffer_pool::BufferPool;
use crate::mt::context_pool::ContextPool;
use crate::mt::error::{MtError, MtResult};
use crate::mt::worker::{compress_segment, job_dst_bound};
use crate::threadpool::TPool;
use crate::xxhash::xxh32_oneshot;

/// A `*const Lz4FCDict` threaded into every job closure. `Lz4FCDict` is
/// itself `Sync` (read-only after construction, see `frame::cdict`); only
/// the raw pointer type needs this narrow unsafe wrapper to cross the
/// closure boundary, mirroring the teacher's own `SyncCDictPtr` in
/// `io/compress_mt.rs`.
#[derive(Clone, Copy)]
struct SyncCDictPtr(*const Lz4FCDict);
unsafe impl Send for SyncCDictPtr {}
unsafe impl Sync for SyncCDictPtr {}

/// Computes `(job_size, nb_jobs)` for a source of `src_len` bytes.
///
/// `job_size_param == 0` requests automatic sizing: aim for roughly one job
/// per worker thread, clamped into `[JOBSIZE_MIN, JOBSIZE_MAX]`.
fn plan_jobs(src_len: usize, nb_threads: usize, job_size_param: usize) -> (usize, usize) {
    use crate::mt::config::{JOBSIZE_MAX, JOBSIZE_MIN};

    let job_size = if job_size_param != 0 {
        job_size_param
    } else {
        let avg = (src_len / nb_threads.max(1)).max(1);
        avg.clamp(JOBSIZE_MIN, JOBSIZE_MAX)
    };
    let nb_jobs = if src_len == 0 { 1 } else { src_len.div_ceil(job_size) };
    (job_size, nb_jobs.max(1))
}

#[allow(clippy::too_many_arguments)]
pub fn compress(
    dst: &mut [u8],
    src: &[u8],
    header_prefs: &Preferences,
    cdict: Option<&Lz4FCDict>,
    nb_threads: usize,
    job_size_param: usize,
    overlap_log: u32,
    ctx_pool: &ContextPool,
    buffer_pool: &BufferPool,
    pool: &TPool,
) -> MtResult<usize> {
    let (job_size, nb_jobs) = plan_jobs(src.len(), nb_threads, job_size_param);

    if nb_threads <= 1 || nb_jobs <= 1 {
        return compress_single_threaded(dst, src, header_prefs, cdict, ctx_pool);
    }

    let overlap = crate::mt::config::overlap_size(job_size, overlap_log);

    let mut starts = Vec::with_capacity(nb_jobs);
    let mut lens = Vec::with_capacity(nb_jobs);
    let mut pos = 0usize;
    for u in 0..nb_jobs {
        let len = if u + 1 == nb_jobs { src.len() - pos } else { job_size.min(src.len() - pos) };
        starts.push(pos);
        lens.push(len);
        pos += len;
    }

    let bounds: Vec<usize> = lens.iter().map(|&len| job_dst_bound(len, header_prefs)).collect();

    let mut within = 0usize;
    let mut cursor = 0usize;
    for &bound in &bounds {
        if cursor + bound <= dst.len() {
            cursor += bound;
            within += 1;
        } else {
            break;
        }
    }
    let direct_region_len = cursor;

    let results: Vec<Mutex<Result<usize, MtError>>> =
        (0..nb_jobs).map(|_| Mutex::new(Ok(0usize))).collect();
    let pooled_bufs: Vec<Mutex<Option<Vec<u8>>>> = (0..nb_jobs).map(|_| Mutex::new(None)).collect();

    let cdict_ptr = cdict.map(|c| SyncCDictPtr(c as *const Lz4FCDict));

    let (direct_dst, _rest) = dst.split_at_mut(direct_region_len);
    let mut dst_slices: Vec<&mut [u8]> = Vec::with_capacity(within);
    let mut remaining = direct_dst;
    for &bound in bounds.iter().take(within) {
        let (a, b) = remaining.split_at_mut(bound);
        dst_slices.push(a);
        remaining = b;
    }

    pool.scope(|scope| {
        let mut dst_slices = dst_slices;
        for u in 0..nb_jobs {
            let src_seg = &src[starts[u]..starts[u] + lens[u]];
            let prefix = if u > 0 && overlap > 0 {
                let prev_end = starts[u];
                let prev_start = prev_end.saturating_sub(overlap.min(starts[u]));
                Some(&src[prev_start..prev_end])
            } else {
                None
            };
            let first_chunk = u == 0;
            let last_chunk = u == nb_jobs - 1;

            let direct_slice = if u < within { Some(dst_slices.remove(0)) } else { None };
            let bound_u = bounds[u];
            let results = &results;
            let pooled_bufs = &pooled_bufs;
            let cdict_ptr = cdict_ptr;

            scope.spawn(move |_| {
                let mut ctx = ctx_pool.acquire();
                let outcome = if let Some(slice) = direct_slice {
                    let mut pos = 0usize;
                    let mut slice = slice;
                    compress_segment(
                        &mut ctx,
                        src_seg,
                        prefix,
                        header_prefs,
                        cdict_ptr.map(|p| p.0),
                        first_chunk,
                        last_chunk,
                        |chunk, _consumed| {
                            slice[pos..pos + chunk.len()].copy_from_slice(chunk);
                            pos += chunk.len();
                        },
                    )
                } else {
                    let mut buf = buffer_pool.acquire(bound_u);
                    let mut pos = 0usize;
                    let n = compress_segment(
                        &mut ctx,
                        src_seg,
                        prefix,
                        header_prefs,
                        cdict_ptr.map(|p| p.0),
                        first_chunk,
                        last_chunk,
                        |chunk, _consumed| {
                            buf[pos..pos + chunk.len()].copy_from_slice(chunk);
                            pos += chunk.len();
                        },
                    );
                    *pooled_bufs[u].lock().unwrap() = Some(buf);
                    n
                };
                ctx_pool.release(ctx);
                *results[u].lock().unwrap() = outcome;
            });
        }
    });

    let release_pooled = |pooled_bufs: &[Mutex<Option<Vec<u8>>>]| {
        for buf_slot in pooled_bufs {
            if let Some(buf) = buf_slot.lock().unwrap().take() {
                buffer_pool.release(buf);
            }
        }
    };

    for r in &results {
        if let Err(e) = &*r.lock().unwrap() {
            let e = e.clone();
            release_pooled(&pooled_bufs);
            return Err(e);
        }
    }

    let mut write_pos = 0usize;
    for u in 0..nb_jobs {
        let len = *results[u].lock().unwrap().as_ref().unwrap();
        if u < within {
            let offset: usize = bounds[..u].iter().sum();
            if write_pos + len > dst.len() {
                release_pooled(&pooled_bufs);
                return Err(MtError::DstSizeTooSmall);
            }
            if write_pos != offset {
                dst.copy_within(offset..offset + len, write_pos);
            }
        } else {
            if write_pos + len > dst.len() {
                release_pooled(&pooled_bufs);
                return Err(MtError::DstSizeTooSmall);
            }
            let buf = pooled_bufs[u].lock().unwrap().take().expect("pooled job produced a buffer");
            dst[write_pos..write_pos + len].copy_from_slice(&buf[..len]);
            buffer_pool.release(buf);
        }
        write_pos += len;
    }

    if header_prefs.frame_info.content_checksum_flag == ContentChecksum::Enabled {
        if write_pos + 4 > dst.len() {
            return Err(MtError::DstSizeTooSmall);
        }
        let checksum = xxh32_oneshot(src, 0);
        dst[write_pos..write_pos + 4].copy_from_slice(&checksum.to_le_bytes());
        write_pos += 4;
    }

    Ok(write_pos)
}

fn compress_single_threaded(
    dst: &mut [u8],
    src: &[u8],
    prefs: &Preferences,
    cdict: Option<&Lz4FCDict>,
    ctx_pool: &ContextPool,
) -> MtResult<usize> {
    let mut ctx = ctx_pool.acquire();
    let cdict_ptr = cdict.map(|c| c as *const Lz4FCDict).unwrap_or(core::ptr::null());
    let n = lz4f_compress_frame_using_cdict(&mut ctx, dst, src, cdict_ptr, Some(prefs));
    ctx_pool.release(ctx);
    Ok(n?)
}
