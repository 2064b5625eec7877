//! Reusable byte buffers for per-request log-line construction.
//!
//! Formatting a log line for every request would otherwise allocate on every
//! request. The pool hands out [`PooledBuffer`] guards: a buffer is always
//! observed empty on acquisition, privately owned while held, and returned
//! on every exit path because release lives in `Drop`.

use parking_lot::Mutex;

/// Capacity of freshly allocated buffers.
const INITIAL_CAPACITY: usize = 512;

/// Buffers that grew beyond this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Upper bound on idle buffers kept in the pool.
const MAX_POOLED: usize = 64;

/// Concurrent pool of reusable byte buffers.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
        }
    }

    /// Takes a buffer from the pool, or allocates one if the pool is empty.
    ///
    /// The buffer is cleared before it is handed out, so previous content is
    /// never visible to the acquirer.
    #[must_use]
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buf = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        buf.clear();
        PooledBuffer { buf, pool: self }
    }

    fn release(&self, buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        let mut buffers = self.buffers.lock();
        if buffers.len() < MAX_POOLED {
            buffers.push(buf);
        }
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.buffers.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard over a pooled buffer. Returns the buffer to the pool on drop,
/// including when the holder panics mid-format.
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl std::ops::Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl std::ops::DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl std::io::Write for PooledBuffer<'_> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
