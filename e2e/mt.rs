//! E2E Test Suite: Multi-threaded Frame Compression
//!
//! Validates the multi-threaded driver end to end through the public
//! `MtContext` facade:
//! - one-shot compression across several worker threads, decoded with the
//!   single-threaded frame decompressor
//! - incremental streaming compression fed in small, irregularly-sized
//!   chunks, decoded the same way
//! - parity between the multi-threaded and single-threaded paths on
//!   identical input
//! - the `(consumed, ingested, produced)` progression contract
//!
//! These are scenario-level tests: they drive the crate the way an external
//! caller would, not the internal pool/job-table mechanics (see
//! tests/mt/*.rs for those).

extern crate lz4;

use lz4::frame::{
    lz4f_compress_frame, lz4f_compress_frame_bound, lz4f_create_decompression_context, lz4f_decompress,
    ContentChecksum, FrameInfo, Preferences,
};
use lz4::{MtContext, MtError};

fn repetitive(n: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. ".iter().cycle().take(n).copied().collect()
}

fn incompressible(n: usize) -> Vec<u8> {
    (0u32..).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).take(n).collect()
}

fn decompress_all(compressed: &[u8], expected_len: usize) -> Vec<u8> {
    let mut dctx = lz4f_create_decompression_context(100).expect("create decompression context");
    let mut out = vec![0u8; expected_len.max(1)];
    let mut src_pos = 0usize;
    let mut dst_pos = 0usize;
    loop {
        let (consumed, produced, hint) =
            lz4f_decompress(&mut dctx, Some(&mut out[dst_pos..]), &compressed[src_pos..], None)
                .expect("decompress step");
        src_pos += consumed;
        dst_pos += produced;
        if hint == 0 {
            break;
        }
    }
    out.truncate(dst_pos);
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: one-shot compression, repetitive data, several worker threads
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_one_shot_repetitive_data_round_trips_with_four_workers() {
    let original = repetitive(6 * 1024 * 1024);
    let ctx = MtContext::new(4).expect("create MtContext");
    let prefs = Preferences {
        frame_info: FrameInfo { content_checksum_flag: ContentChecksum::Enabled, ..Default::default() },
        auto_flush: true,
        ..Default::default()
    };

    let bound = lz4f_compress_frame_bound(original.len(), Some(&prefs)) + 64 * 1024;
    let mut compressed = vec![0u8; bound];
    let n = ctx.compress_advanced(&mut compressed, &original, None, &prefs, 6).expect("one-shot compress");

    assert!(n < original.len(), "repetitive data should compress well");
    let decompressed = decompress_all(&compressed[..n], original.len());
    assert_eq!(decompressed, original);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: one-shot compression, incompressible data, several worker threads
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_one_shot_incompressible_data_round_trips() {
    let original = incompressible(3 * 1024 * 1024);
    let ctx = MtContext::new(3).expect("create MtContext");
    let prefs = Preferences { auto_flush: true, ..Default::default() };

    let bound = lz4f_compress_frame_bound(original.len(), Some(&prefs));
    let mut compressed = vec![0u8; bound];
    let n = ctx.compress_advanced(&mut compressed, &original, None, &prefs, 6).expect("one-shot compress");

    let decompressed = decompress_all(&compressed[..n], original.len());
    assert_eq!(decompressed, original);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: multi-threaded output decodes identically to single-threaded output
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_multithreaded_and_singlethreaded_paths_decode_to_the_same_content() {
    let original = repetitive(2 * 1024 * 1024);
    let prefs = Preferences { auto_flush: true, ..Default::default() };

    let ctx = MtContext::new(4).expect("create MtContext");
    let bound = lz4f_compress_frame_bound(original.len(), Some(&prefs)) + 16 * 1024;
    let mut via_mt = vec![0u8; bound];
    let n_mt = ctx.compress_advanced(&mut via_mt, &original, None, &prefs, 6).expect("mt compress");

    let mut via_single = vec![0u8; bound];
    let n_single = lz4f_compress_frame(&mut via_single, &original, Some(&prefs)).expect("single-threaded compress");

    assert_eq!(decompress_all(&via_mt[..n_mt], original.len()), original);
    assert_eq!(decompress_all(&via_single[..n_single], original.len()), original);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: streaming compression fed in small, irregular chunks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_streaming_compression_fed_in_irregular_chunks_round_trips() {
    let original = repetitive(3 * 1024 * 1024);
    let mut ctx = MtContext::new(3).expect("create MtContext");
    let prefs = Preferences {
        frame_info: FrameInfo { content_checksum_flag: ContentChecksum::Enabled, ..Default::default() },
        auto_flush: true,
        ..Default::default()
    };
    ctx.set_mt_param(128 * 1024, 6, prefs).expect("set_mt_param");
    ctx.init_c_stream(prefs).expect("init_c_stream");

    let mut compressed = vec![0u8; original.len() + 512 * 1024];
    let mut written = 0usize;
    let chunk_sizes = [97usize, 4096, 1, 65_537, 2048];
    let mut pos = 0usize;
    let mut i = 0usize;
    while pos < original.len() {
        let take = chunk_sizes[i % chunk_sizes.len()].min(original.len() - pos);
        written += ctx.compress_stream(&mut compressed[written..], &original[pos..pos + take]).expect("compress_stream");
        pos += take;
        i += 1;
    }
    written += ctx.end_stream(&mut compressed[written..]).expect("end_stream");

    let decompressed = decompress_all(&compressed[..written], original.len());
    assert_eq!(decompressed, original);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: streaming through a tiny destination buffer, draining incrementally
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_streaming_drains_correctly_through_a_tiny_destination_buffer() {
    let original = repetitive(1024 * 1024);
    let mut ctx = MtContext::new(2).expect("create MtContext");
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.set_mt_param(64 * 1024, 6, prefs).expect("set_mt_param");
    ctx.init_c_stream(prefs).expect("init_c_stream");

    let mut full = Vec::new();
    let mut small = [0u8; 211];
    for chunk in original.chunks(3000) {
        let n = ctx.compress_stream(&mut small, chunk).expect("compress_stream");
        full.extend_from_slice(&small[..n]);
    }
    loop {
        let n = ctx.flush_stream(&mut small).expect("flush_stream");
        full.extend_from_slice(&small[..n]);
        if n == 0 {
            break;
        }
    }
    loop {
        let n = ctx.end_stream(&mut small).expect("end_stream");
        full.extend_from_slice(&small[..n]);
        if n < small.len() {
            break;
        }
    }

    assert_eq!(decompress_all(&full, original.len()), original);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: frame progression is monotonic and reaches the input length
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_frame_progression_is_monotonic_and_completes() {
    let original = repetitive(2 * 1024 * 1024);
    let mut ctx = MtContext::new(2).expect("create MtContext");
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.set_mt_param(96 * 1024, 6, prefs).expect("set_mt_param");
    ctx.init_c_stream(prefs).expect("init_c_stream");

    assert_eq!(ctx.get_frame_progression(), (0, 0, 0));

    let mut dst = vec![0u8; original.len() + 512 * 1024];
    let mut written = 0usize;
    let mut last = (0usize, 0usize, 0usize);
    for chunk in original.chunks(16 * 1024) {
        written += ctx.compress_stream(&mut dst[written..], chunk).expect("compress_stream");
        let now = ctx.get_frame_progression();
        assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2, "progression must be monotonic");
        last = now;
    }
    written += ctx.end_stream(&mut dst[written..]).expect("end_stream");
    let _ = written;

    let (consumed, ingested, _produced) = ctx.get_frame_progression();
    assert_eq!(consumed, original.len());
    assert_eq!(ingested, original.len());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 7: calling streaming methods out of order is rejected, not a panic
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_streaming_before_init_returns_stage_wrong_not_a_panic() {
    let mut ctx = MtContext::new(2).expect("create MtContext");
    let mut dst = vec![0u8; 64];
    assert_eq!(ctx.compress_stream(&mut dst, b"data").unwrap_err(), MtError::StageWrong);
    assert_eq!(ctx.flush_stream(&mut dst).unwrap_err(), MtError::StageWrong);
    assert_eq!(ctx.end_stream(&mut dst).unwrap_err(), MtError::StageWrong);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 8: re-initializing mid-frame quiesces the previous frame automatically
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_reinitializing_mid_frame_quiesces_and_starts_a_fresh_frame() {
    let mut ctx = MtContext::new(2).expect("create MtContext");
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.set_mt_param(64 * 1024, 6, prefs).expect("set_mt_param");
    ctx.init_c_stream(prefs).expect("init_c_stream first frame");

    let mut scratch = vec![0u8; 512 * 1024];
    let _ = ctx.compress_stream(&mut scratch, &repetitive(200 * 1024)).expect("feed first frame");

    ctx.init_c_stream(prefs).expect("reinit should quiesce, not error");

    let second = repetitive(8192);
    let mut dst = vec![0u8; 32 * 1024];
    let mut written = ctx.compress_stream(&mut dst, &second).expect("compress_stream on fresh frame");
    written += ctx.end_stream(&mut dst[written..]).expect("end_stream on fresh frame");
    assert_eq!(decompress_all(&dst[..written], second.len()), second);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 10: disabling overlap carry-over strictly hurts the compression ratio
// on data that repeats across a job boundary (spec §8 Scenario 4)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_disabling_overlap_increases_compressed_size_on_data_repeating_across_job_boundaries() {
    // A short, exactly-repeating pattern spanning many job boundaries: with
    // overlap carry-over, every job after the first can still match against
    // the tail of the previous job's source; with overlap disabled, each
    // non-first job starts from a blank dictionary and must re-encode every
    // match that crosses its boundary from scratch.
    let original = repetitive(2 * 1024 * 1024);
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    let job_size = 96 * 1024;

    let compress_with = |overlap_log: u32| -> usize {
        let mut ctx = MtContext::new(4).expect("create MtContext");
        ctx.set_mt_param(job_size, overlap_log, prefs).expect("set_mt_param");
        let bound = lz4f_compress_frame_bound(original.len(), Some(&prefs)) + 64 * 1024;
        let mut dst = vec![0u8; bound];
        ctx.compress_advanced(&mut dst, &original, None, &prefs, overlap_log).expect("compress_advanced")
    };

    let with_overlap = compress_with(6);
    let without_overlap = compress_with(0);

    assert!(
        without_overlap > with_overlap,
        "disabling overlap ({without_overlap} bytes) should compress worse than \
         carrying overlap across job boundaries ({with_overlap} bytes) on data \
         that repeats within the overlap window"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 9: empty streaming frame is still a valid, decodable frame
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_streaming_frame_round_trips() {
    let mut ctx = MtContext::new(2).expect("create MtContext");
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.init_c_stream(prefs).expect("init_c_stream");

    let mut dst = vec![0u8; 256];
    let n = ctx.end_stream(&mut dst).expect("end_stream on empty frame");
    assert!(decompress_all(&dst[..n], 0).is_empty());
}
