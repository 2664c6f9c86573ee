use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use zeroize::Zeroize;

/// Thread-safe cache of scratch buffers.
///
/// Buffers handed out by [`MemoryPool::allocate`] come back to the pool when
/// the [`ScopedBuffer`] guard is dropped, wiped first because decode scratch
/// holds plaintext-domain data.
#[derive(Debug, Default)]
pub struct MemoryPool {
    free: Mutex<Vec<Vec<u64>>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a zero-filled buffer of `len` words.
    pub fn allocate(&self, len: usize) -> ScopedBuffer<'_> {
        let cached = match self.free.lock() {
            Ok(mut free) => free
                .iter()
                .position(|b| b.capacity() >= len)
                .map(|idx| free.swap_remove(idx)),
            // A poisoned lock only means another guard panicked; fall back to a fresh buffer.
            Err(_) => None,
        };
        let mut buf = cached.unwrap_or_else(|| Vec::with_capacity(len));
        buf.resize(len, 0);
        ScopedBuffer { buf, pool: self }
    }

    /// Number of buffers currently parked in the pool.
    pub fn cached_buffers(&self) -> usize {
        self.free.lock().map_or(0, |free| free.len())
    }
}

/// Scratch allocation that returns to its [`MemoryPool`] on drop.
#[derive(Debug)]
pub struct ScopedBuffer<'a> {
    buf: Vec<u64>,
    pool: &'a MemoryPool,
}

impl Deref for ScopedBuffer<'_> {
    type Target = [u64];

    fn deref(&self) -> &[u64] {
        &self.buf
    }
}

impl DerefMut for ScopedBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u64] {
        &mut self.buf
    }
}

impl Drop for ScopedBuffer<'_> {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        // Vec::zeroize also truncates to length 0, keeping the capacity.
        buf.zeroize();
        if let Ok(mut free) = self.pool.free.lock() {
            free.push(buf);
        }
    }
}
