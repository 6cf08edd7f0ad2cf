//! Recyclable LZ4 frame compression context pool.
//!
//! A "context" here is a boxed [`Lz4FCCtx`] — the teacher's existing
//! streaming compression context, which already owns its inner LZ4/LZ4HC
//! state and staging buffer. That is exactly the granularity this crate's
//! Context Pool recycles: one context equals one worker's worth of
//! in-progress collaborator state.

use std::sync::Mutex;

use crate::frame::compress::{lz4f_create_compression_context, LZ4F_VERSION};
use crate::frame::types::Lz4FCCtx;

pub struct ContextPool {
    free: Mutex<Vec<Box<Lz4FCCtx>>>,
    capacity: usize,
}

impl ContextPool {
    /// Eagerly creates one context (for the degenerate single-thread fast
    /// path) and reserves room for up to `nb_workers` more, allocated lazily
    /// on demand.
    pub fn new(nb_workers: usize) -> Self {
        let mut free = Vec::with_capacity(1);
        free.push(Lz4FCCtx::new(LZ4F_VERSION));
        ContextPool {
            free: Mutex::new(free),
            capacity: nb_workers.max(1),
        }
    }

    pub fn acquire(&self) -> Box<Lz4FCCtx> {
        let mut free = self.free.lock().unwrap();
        if let Some(ctx) = free.pop() {
            return ctx;
        }
        drop(free);
        crate::io::prefs::display_level(4, "mt: context pool miss, allocating fresh context\n");
        lz4f_create_compression_context(LZ4F_VERSION).unwrap_or_else(|_| Lz4FCCtx::new(LZ4F_VERSION))
    }

    pub fn release(&self, ctx: Box<Lz4FCCtx>) {
        let mut free = self.free.lock().unwrap();
        if free.len() < self.capacity {
            free.push(ctx);
        }
    }

    /// Approximate resident byte count, for [`crate::mt::MtContext::size_of`].
    pub fn size_of(&self) -> usize {
        self.free
            .lock()
            .unwrap()
            .iter()
            .map(|c| core::mem::size_of::<Lz4FCCtx>() + c.tmp_buf.capacity())
            .sum()
    }
}
