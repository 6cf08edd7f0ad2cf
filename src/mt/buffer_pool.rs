//! Recyclable byte-buffer pool.
//!
//! A "buffer" in this pool is a plain `Vec<u8>`; the nil buffer is simply
//! absent (never allocated). Recycling avoids re-allocating one segment's
//! worth of scratch space (job destination, staged overlap prefix, …) on
//! every job when the driver is fed a steady stream of similarly-sized work.

use std::sync::Mutex;

/// A pool of recyclable `Vec<u8>` buffers, capped at `2 * nb_workers + 3`
/// resident buffers (one per in-flight job, plus slack for the overlap
/// prefix and the job just about to be dispatched).
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    target_size: Mutex<usize>,
    capacity: usize,
}

impl BufferPool {
    pub fn new(nb_workers: usize) -> Self {
        BufferPool {
            free: Mutex::new(Vec::new()),
            target_size: Mutex::new(0),
            capacity: 2 * nb_workers.max(1) + 3,
        }
    }

    /// Sets the buffer size this pool should hand out going forward and
    /// evicts any free buffer now undersized for it.
    ///
    /// Must be called before any job referencing this pool is dispatched —
    /// `MtContext::reset`/`init_c_stream` enforce that ordering; a buffer
    /// already lent out is unaffected by a later call.
    pub fn set_target_size(&self, size: usize) {
        *self.target_size.lock().unwrap() = size;
        let mut free = self.free.lock().unwrap();
        let before = free.len();
        free.retain(|b| b.capacity() >= size);
        if free.len() < before {
            crate::io::prefs::display_level(
                4,
                &format!("mt: buffer pool evicted {} undersized buffer(s)\n", before - free.len()),
            );
        }
    }

    /// Returns a zero-filled buffer of exactly `requested` bytes, reusing a
    /// free buffer whose capacity is in `[requested, 8*requested]` when one
    /// is available. A buffer outside that window — either too small or
    /// wastefully large for this request — is dropped rather than kept, so
    /// one big job doesn't pin an oversized allocation onto every later,
    /// much smaller one.
    pub fn acquire(&self, requested: usize) -> Vec<u8> {
        let upper = requested.saturating_mul(8);
        let mut free = self.free.lock().unwrap();
        while let Some(buf) = free.pop() {
            let cap = buf.capacity();
            if cap >= requested && cap <= upper {
                let mut buf = buf;
                buf.clear();
                buf.resize(requested, 0);
                return buf;
            }
            // outside the reuse window: drop it and keep looking
        }
        drop(free);
        crate::io::prefs::display_level(4, "mt: buffer pool miss, allocating fresh buffer\n");
        vec![0u8; requested]
    }

    /// Returns `buf` to the free list, dropping it instead if the pool is
    /// already at capacity.
    pub fn release(&self, buf: Vec<u8>) {
        let mut free = self.free.lock().unwrap();
        if free.len() < self.capacity {
            free.push(buf);
        }
    }

    /// Approximate resident byte count, for [`crate::mt::MtContext::size_of`].
    pub fn size_of(&self) -> usize {
        self.free.lock().unwrap().iter().map(Vec::capacity).sum()
    }
}
