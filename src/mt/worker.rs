//! Per-job compression routine shared by the one-shot and streaming drivers.
//!
//! Binds spec §4.4's worker routine onto this crate's LZ4 frame collaborator
//! (`frame::compress`). A "job" here is one segment of the source: job 0
//! emits the frame's real header into the destination; every other job
//! forces a throwaway header (to put the collaborator into a ready-to-update
//! state with its dictionary/prefix attached) into scratch space and
//! discards it, matching spec §4.4 step 4 ("emit then overwrite").
//!
//! # Block loop and progress reporting
//!
//! Spec §4.4 steps 4-6 call for the segment to be compressed one block
//! (`BLOCKSIZE_MAX`) at a time, with the destination's `c_size` and the
//! source's `consumed` count advanced under the shared mutex after every
//! block, signalling the condvar each time so a concurrent drainer can
//! observe partial progress. [`compress_segment`] implements this literally:
//! it loops over `src` in chunks of `lz4f_get_block_size`-many bytes,
//! compressing each chunk into a small reusable scratch buffer (no lock
//! needed — this is where the parallel work actually happens), then hands
//! the chunk to the caller-supplied `emit` callback along with the
//! cumulative number of source bytes consumed so far. `emit` is where the
//! lock/lock-and-signal discipline lives: `mt::streaming` wires it to
//! `JobTable::push_chunk` (extend the job's shared `dst` under the table's
//! one mutex, then notify its condvar); `mt::oneshot`, which has no
//! concurrent reader of a job's output mid-flight (the one-shot driver only
//! ever waits for the whole `rayon::Scope` to finish before harvesting),
//! wires it to a plain position-tracking append with no locking at all.
//!
//! LZ4F's `compress_end` takes no source bytes of its own — unlike a
//! generic collaborator that might fold a final block into its end call,
//! this one only ever flushes whatever got buffered by the preceding
//! `compress_update` calls. So the block loop always finishes by calling
//! `compress_update` on every block, including the last, and only then —
//! once, after the loop, for `last_chunk` jobs — calls `compress_end` to
//! flush anything still buffered and write the end-mark/checksum.
//!
//! # Checksum ownership
//!
//! Every job's `Preferences` copy used for its own collaborator session has
//! `content_size` and `content_checksum_flag` cleared, regardless of what
//! the caller requested: a single job's [`Lz4FCCtx`] only ever sees that
//! job's bytes, so neither field means anything at job granularity (a
//! pledged size check or checksum computed over one segment would be wrong).
//! The real values the caller asked for are written into the wire header by
//! job 0 directly (the header only *declares* these fields; it does not
//! enforce them). When the frame is split across more than one job, the
//! driver recomputes the XXH32 content checksum itself in one pass over the
//! reassembled content after harvesting every job, and appends it — see
//! `mt::oneshot` and `mt::streaming`. A single-job frame instead lets its
//! one collaborator session compute and append the checksum incrementally,
//! exactly as the single-threaded fast path already does.
//!
//! # cdict gating
//!
//! A `cdict` is only legal for `first_chunk` (spec §4.4 step 3: "only legal
//! for first_chunk"). Every other job must use its overlap prefix as a
//! raw-content dictionary instead, even when the driver was handed a cdict
//! for the frame as a whole — a non-first job has no use for the frame's
//! cdict, since its continuity with the previous segment comes entirely
//! from the prefix. [`compress_segment`] enforces this itself rather than
//! trusting every call site to remember, by ignoring `cdict` whenever
//! `first_chunk` is false.

use crate::frame::cdict::Lz4FCDict;
use crate::frame::compress::{
    lz4f_compress_begin_internal, lz4f_compress_bound, lz4f_compress_end, lz4f_compress_update, CompressOptions,
};
use crate::frame::header::{lz4f_compress_frame_bound, lz4f_get_block_size};
use crate::frame::types::{ContentChecksum, Lz4FCCtx, Preferences, MAX_FH_SIZE};
use crate::mt::error::MtResult;

/// Worst-case destination size for one job's compressed output, including
/// its (possibly-discarded) header and, if `last_chunk`, the end-mark.
/// Deliberately conservative: reuses the one-shot frame bound formula rather
/// than a tighter per-job accounting, which is safe because jobs never
/// write the driver-appended trailing checksum themselves.
pub fn job_dst_bound(src_len: usize, prefs: &Preferences) -> usize {
    lz4f_compress_frame_bound(src_len, Some(prefs))
}

/// Resolves this job's block size: the collaborator's `BLOCKSIZE_MAX` for
/// the frame's configured block-size id (spec §6.3).
fn block_size_for(prefs: &Preferences) -> usize {
    lz4f_get_block_size(prefs.frame_info.block_size_id).unwrap_or(64 * 1024).max(1)
}

/// Compresses one job's segment, handing every produced chunk of bytes to
/// `emit(bytes, consumed_so_far)` as soon as it's ready, and returns the
/// total number of bytes produced.
///
/// `prefix` supplies the raw-content dictionary (the tail of the previous
/// segment, per spec's overlap/prefix mechanism) for any job that isn't
/// `first_chunk`. `cdict`, when present, is only honored for `first_chunk`
/// (see module docs); a non-first job always falls back to `prefix`.
pub fn compress_segment(
    ctx: &mut Lz4FCCtx,
    src: &[u8],
    prefix: Option<&[u8]>,
    header_prefs: &Preferences,
    cdict: Option<*const Lz4FCDict>,
    first_chunk: bool,
    last_chunk: bool,
    mut emit: impl FnMut(&[u8], usize),
) -> MtResult<usize> {
    let mut sanitized = *header_prefs;
    sanitized.frame_info.content_size = 0;
    sanitized.frame_info.content_checksum_flag = ContentChecksum::Disabled;

    let effective_cdict = cdict.filter(|_| first_chunk);
    let dict_buffer = prefix.filter(|_| effective_cdict.is_none());

    let mut total = 0usize;

    if first_chunk {
        let mut header_buf = [0u8; MAX_FH_SIZE];
        let hn = lz4f_compress_begin_internal(ctx, &mut header_buf, dict_buffer, effective_cdict, Some(header_prefs))?;
        emit(&header_buf[..hn], 0);
        total += hn;
    } else {
        let mut scratch = [0u8; MAX_FH_SIZE];
        lz4f_compress_begin_internal(ctx, &mut scratch, dict_buffer, effective_cdict, Some(&sanitized))?;
    }

    let opts = CompressOptions { stable_src: true };
    let block_size = block_size_for(header_prefs);
    let mut block_buf = vec![0u8; lz4f_compress_bound(block_size, Some(header_prefs)) + 64];

    let mut src_pos = 0usize;
    while src_pos < src.len() {
        let take = (src.len() - src_pos).min(block_size);
        let chunk = &src[src_pos..src_pos + take];
        let w = lz4f_compress_update(ctx, &mut block_buf, chunk, Some(&opts))?;
        src_pos += take;
        emit(&block_buf[..w], src_pos);
        total += w;
    }

    if last_chunk {
        let w = lz4f_compress_end(ctx, &mut block_buf, Some(&opts))?;
        emit(&block_buf[..w], src_pos);
        total += w;
    }

    Ok(total)
}
