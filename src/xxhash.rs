//! Thin wrapper around the `xxhash-rust` crate providing the hash APIs used
//! by the rest of this crate (mirrors `xxhash.c` / `xxhash.h` from LZ4 v1.10.0).
//!
//! XXH32 is the in-frame content checksum that `lz4frame` writes to the
//! wire. It is also what `mt::`'s multi-job driver uses for its own
//! driver-owned checksum (see `mt::worker`'s module docs): XXH32 of the full
//! content is the same value whether it is computed incrementally, block by
//! block, as a single collaborator session would, or in one pass over the
//! reassembled buffer after every job has finished, since it is a pure
//! function of the byte sequence and not of how that sequence was chunked
//! during hashing. That equivalence is what lets the driver recompute the
//! frame's content checksum itself, in one call, after harvesting jobs whose
//! individual contexts each only ever saw their own slice of the content.

pub use xxhash_rust::xxh32::Xxh32 as Xxh32State;

/// One-shot XXH32 hash â€” equivalent to the C `XXH32(data, len, seed)` function.
///
/// # Parity vectors
/// * `xxh32_oneshot(b"", 0)` == `0x02CC5D05`
/// * `xxh32_oneshot(b"lz4", 0)` == reference XXH32 output for the same input
#[inline]
pub fn xxh32_oneshot(data: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(data, seed)
}
