// Black-box integration tests for the `MtContext` facade (src/mt/mod.rs).
//
// Exercises the public one-shot and streaming entry points the way a caller
// outside this crate would: through `lz4::MtContext` only, never reaching
// into `lz4::mt::*` internals.

use lz4::frame::{lz4f_create_decompression_context, lz4f_decompress, ContentChecksum, FrameInfo, Preferences};
use lz4::{MtContext, MtError};

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

#[test]
fn one_shot_round_trips_across_several_jobs() {
    let ctx = MtContext::new(4).expect("MtContext::new");
    let src = sample(8 * 1024 * 1024);
    let prefs = Preferences {
        frame_info: FrameInfo { content_checksum_flag: ContentChecksum::Enabled, ..Default::default() },
        auto_flush: true,
        ..Default::default()
    };
    let mut dst = vec![0u8; lz4::frame::lz4f_compress_frame_bound(src.len(), Some(&prefs)) + 64 * 1024];
    let n = ctx.compress_advanced(&mut dst, &src, None, &prefs, 6).expect("compress_advanced");
    assert_eq!(decompress_all(&dst[..n], src.len()), src);
}

#[test]
fn streaming_round_trips_across_several_jobs() {
    let mut ctx = MtContext::new(4).expect("MtContext::new");
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.set_mt_param(256 * 1024, 6, prefs).unwrap();
    ctx.init_c_stream(prefs).unwrap();

    let src = sample(4 * 1024 * 1024);
    let mut dst = vec![0u8; src.len() + 1024 * 1024];
    let mut written = 0usize;
    for chunk in src.chunks(65_536) {
        written += ctx.compress_stream(&mut dst[written..], chunk).expect("compress_stream");
    }
    written += ctx.end_stream(&mut dst[written..]).expect("end_stream");
    assert_eq!(decompress_all(&dst[..written], src.len()), src);
}

#[test]
fn single_threaded_fallback_matches_the_frame_oneshot_collaborator() {
    let ctx = MtContext::new(1).expect("MtContext::new");
    let src = sample(512 * 1024);
    let prefs = Preferences::default();
    let mut via_mt = vec![0u8; lz4::frame::lz4f_compress_frame_bound(src.len(), Some(&prefs))];
    let n = ctx.compress_advanced(&mut via_mt, &src, None, &prefs, 6).unwrap();

    let mut via_collaborator = vec![0u8; lz4::frame::lz4f_compress_frame_bound(src.len(), Some(&prefs))];
    let n2 = lz4::frame::lz4f_compress_frame(&mut via_collaborator, &src, Some(&prefs)).unwrap();

    assert_eq!(&via_mt[..n], &via_collaborator[..n2]);
}

#[test]
fn compress_stream_without_init_is_rejected() {
    let mut ctx = MtContext::new(2).unwrap();
    let mut dst = vec![0u8; 16];
    assert_eq!(ctx.compress_stream(&mut dst, b"x").unwrap_err(), MtError::StageWrong);
}

#[test]
fn frame_progression_is_monotonic_and_reaches_the_full_length() {
    let mut ctx = MtContext::new(3).unwrap();
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.set_mt_param(128 * 1024, 6, prefs).unwrap();
    ctx.init_c_stream(prefs).unwrap();

    let src = sample(2 * 1024 * 1024);
    let mut dst = vec![0u8; src.len() + 512 * 1024];
    let mut written = 0usize;
    let mut last = (0usize, 0usize, 0usize);
    for chunk in src.chunks(32 * 1024) {
        written += ctx.compress_stream(&mut dst[written..], chunk).unwrap();
        let now = ctx.get_frame_progression();
        assert!(now.0 >= last.0, "consumed must never decrease");
        assert!(now.1 >= last.1, "ingested must never decrease");
        assert!(now.2 >= last.2, "produced must never decrease");
        last = now;
    }
    written += ctx.end_stream(&mut dst[written..]).unwrap();
    let _ = written;

    let (consumed, ingested, _produced) = ctx.get_frame_progression();
    assert_eq!(consumed, src.len());
    assert_eq!(ingested, src.len());
}

#[test]
fn reinitializing_mid_frame_quiesces_instead_of_failing() {
    let mut ctx = MtContext::new(2).unwrap();
    let prefs = Preferences { auto_flush: true, ..Default::default() };
    ctx.set_mt_param(64 * 1024, 6, prefs).unwrap();
    ctx.init_c_stream(prefs).unwrap();

    let mut scratch = vec![0u8; 256 * 1024];
    let _ = ctx.compress_stream(&mut scratch, &sample(128 * 1024)).unwrap();

    // A second frame can begin even though the first was never end_stream'd.
    ctx.init_c_stream(prefs).expect("reinit must quiesce the unfinished frame");

    let src = sample(4096);
    let mut dst = vec![0u8; 16 * 1024];
    let mut written = ctx.compress_stream(&mut dst, &src).unwrap();
    written += ctx.end_stream(&mut dst[written..]).unwrap();
    assert_eq!(decompress_all(&dst[..written], src.len()), src);
}
