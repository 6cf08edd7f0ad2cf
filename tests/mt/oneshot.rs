// Black-box integration tests for `lz4::mt::oneshot::compress` — the blocking,
// whole-buffer multi-threaded driver, exercised directly against its own pools
// rather than through `MtContext` (see tests/mt/facade.rs for the facade view).

use lz4::frame::{lz4f_compress_frame_bound, lz4f_create_decompression_context, lz4f_decompress};
use lz4::frame::{ContentChecksum, FrameInfo, Preferences};
use lz4::mt::buffer_pool::BufferPool;
use lz4::mt::context_pool::ContextPool;
use lz4::mt::oneshot::compress;
use lz4::mt::MtError;
use lz4::threadpool::TPool;

fn sample(n: usize) -> Vec<u8> {
    (0u8..=255).cycle().take(n).collect()
}

fn decompress_all(compressed: &[u8], expected_len: usize) -> Vec<u8> {
    let mut dctx = lz4f_create_decompression_context(100).unwrap();
    let mut out = vec![0u8; expected_len.max(1)];
    let mut src_pos = 0usize;
    let mut dst_pos = 0usize;
    loop {
        let (consumed, produced, hint) =
            lz4f_decompress(&mut dctx, Some(&mut out[dst_pos..]), &compressed[src_pos..], None).expect("decompress");
        src_pos += consumed;
        dst_pos += produced;
        if hint == 0 {
            break;
        }
    }
    out.truncate(dst_pos);
    out
}

fn pools(nb_threads: usize) -> (ContextPool, BufferPool, TPool) {
    (ContextPool::new(nb_threads), BufferPool::new(nb_threads), TPool::new(nb_threads, nb_threads * 2).unwrap())
}

#[test]
fn multi_job_frame_round_trips_with_a_driver_owned_checksum() {
    let src = sample(4 * 1024 * 1024);
    let prefs = Preferences {
        frame_info: FrameInfo { content_checksum_flag: ContentChecksum::Enabled, ..Default::default() },
        auto_flush: true,
        ..Default::default()
    };
    let (ctx_pool, buffer_pool, pool) = pools(4);
    let mut dst = vec![0u8; lz4f_compress_frame_bound(src.len(), Some(&prefs)) + 32 * 1024];
    let n = compress(&mut dst, &src, &prefs, None, 4, 256 * 1024, 6, &ctx_pool, &buffer_pool, &pool)
        .expect("multi-job compress");
    assert_eq!(decompress_all(&dst[..n], src.len()), src);
}

#[test]
fn a_single_worker_falls_back_to_the_single_threaded_path_exactly() {
    let src = sample(256 * 1024);
    let prefs = Preferences::default();
    let (ctx_pool, buffer_pool, pool) = pools(1);
    let mut dst = vec![0u8; lz4f_compress_frame_bound(src.len(), Some(&prefs))];
    let n = compress(&mut dst, &src, &prefs, None, 1, 0, 6, &ctx_pool, &buffer_pool, &pool).unwrap();
    assert_eq!(decompress_all(&dst[..n], src.len()), src);
}

#[test]
fn empty_input_still_produces_a_decodable_empty_frame() {
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    let (ctx_pool, buffer_pool, pool) = pools(3);
    let mut dst = vec![0u8; 256];
    let n = compress(&mut dst, &[], &prefs, None, 3, 64 * 1024, 6, &ctx_pool, &buffer_pool, &pool).unwrap();
    assert!(decompress_all(&dst[..n], 0).is_empty());
}

/// Roughly incompressible bytes: a simple LCG, deliberately not periodic at
/// any short stride, so LZ4 finds few matches and the compressed size sits
/// close to its worst-case bound instead of far below it.
fn incompressible(n: usize) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

/// Spec §8 Scenario 5: a destination one byte short of what multi-job
/// compression actually needs must surface `DstSizeTooSmall` rather than
/// panic on an out-of-bounds write into the pooled-job harvest path, and a
/// buffer sized to exactly what's needed must then succeed and round-trip.
#[test]
fn undersized_destination_returns_dst_size_too_small_instead_of_panicking() {
    let src = incompressible(3 * 1024 * 1024);
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    let (ctx_pool, buffer_pool, pool) = pools(4);
    let job_size = 256 * 1024;

    let bound = lz4f_compress_frame_bound(src.len(), Some(&prefs));
    let mut generous = vec![0u8; bound];
    let n = compress(&mut generous, &src, &prefs, None, 4, job_size, 6, &ctx_pool, &buffer_pool, &pool)
        .expect("generous destination must succeed");

    let mut too_small = vec![0u8; n - 1];
    let err = compress(&mut too_small, &src, &prefs, None, 4, job_size, 6, &ctx_pool, &buffer_pool, &pool)
        .expect_err("a destination one byte short of the real total must fail, not panic");
    assert_eq!(err, MtError::DstSizeTooSmall);

    let mut exact = vec![0u8; n];
    let n2 = compress(&mut exact, &src, &prefs, None, 4, job_size, 6, &ctx_pool, &buffer_pool, &pool)
        .expect("exactly-sized destination must still succeed after the earlier failure");
    assert_eq!(n2, n);
    assert_eq!(decompress_all(&exact[..n2], src.len()), src);
}
